// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of dynamically allocated kernel objects.
//!
//! Dynamic objects are found by the payload address userspace holds, so the
//! registry is an ordered map keyed by that address. An arbitrary pointer
//! from userspace is only ever used as a lookup key; descriptors are
//! reached exclusively through registered entries.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use abi::ObjectKind;

use crate::descs::KObject;

/// A dynamically allocated kernel object: the descriptor plus the payload
/// the rest of the kernel sees.
///
/// The payload is its own heap block, so its address is stable while the
/// map rebalances; that address doubles as the registry key and the
/// descriptor's name.
pub(crate) struct DynObject {
    kobj: KObject,
    payload: Box<[u64]>,
}

impl DynObject {
    /// Allocates a payload of `size` bytes (rounded up to whole words, so
    /// the address is aligned for any object kind) and a descriptor for
    /// it. `None` if the heap cannot satisfy the request.
    pub(crate) fn new(kind: ObjectKind, size: usize) -> Option<Self> {
        let words = size.div_ceil(8);
        let mut backing = Vec::new();
        backing.try_reserve_exact(words).ok()?;
        backing.resize(words, 0u64);
        let payload = backing.into_boxed_slice();
        let addr = payload.as_ptr() as usize;
        Some(Self { kobj: KObject::new(addr, kind), payload })
    }

    pub(crate) fn kobj(&self) -> &KObject {
        &self.kobj
    }

    pub(crate) fn payload_addr(&self) -> usize {
        self.payload.as_ptr() as usize
    }
}

/// The dynamic objects currently alive, ordered by payload address.
pub(crate) struct DynamicRegistry {
    objects: BTreeMap<usize, DynObject>,
}

impl DynamicRegistry {
    pub(crate) const fn new() -> Self {
        Self { objects: BTreeMap::new() }
    }

    /// Registers `obj` under its payload address and returns that address.
    pub(crate) fn insert(&mut self, obj: DynObject) -> usize {
        let addr = obj.payload_addr();
        self.objects.insert(addr, obj);
        addr
    }

    /// Unregisters and returns the object whose payload is at `addr`;
    /// `None` if the address names no registered payload.
    pub(crate) fn remove(&mut self, addr: usize) -> Option<DynObject> {
        self.objects.remove(&addr)
    }

    /// Looks up the descriptor for the payload at `addr`.
    pub(crate) fn find_by_payload(&self, addr: usize) -> Option<&KObject> {
        self.objects.get(&addr).map(DynObject::kobj)
    }

    /// In-order traversal of the registered descriptors.
    pub(crate) fn walk(&self, mut f: impl FnMut(&KObject)) {
        for obj in self.objects.values() {
            f(&obj.kobj);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.objects.len()
    }
}
