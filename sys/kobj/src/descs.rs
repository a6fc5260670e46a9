// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Descriptor types for kernel objects.

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use abi::{ObjectKind, ThreadId, MAX_THREAD_BITS, MAX_THREAD_BYTES};

bitflags::bitflags! {
    /// State bits on a kernel object descriptor.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    #[repr(transparent)]
    pub struct ObjectFlags: u32 {
        /// The kind-specific constructor has completed. This bit is the
        /// sole source of truth for "already initialized" checks.
        const INITIALIZED = 1 << 0;
        /// Permission tests pass for every caller, regardless of the
        /// bitmap. Nothing clears this bit once set.
        const PUBLIC = 1 << 1;
    }
}

/// Per-object permission bitmap, one bit per thread id.
///
/// Grants use release stores and tests use acquire loads, so a grant that
/// happened-before a test is observed by it; interrupt handlers may test
/// concurrently with thread-context grants.
pub struct PermSet {
    bits: [AtomicU8; MAX_THREAD_BYTES],
}

impl PermSet {
    pub const fn new() -> Self {
        const ZERO: AtomicU8 = AtomicU8::new(0);
        Self { bits: [ZERO; MAX_THREAD_BYTES] }
    }

    fn slot(id: ThreadId) -> (usize, u8) {
        let index = id.index();
        debug_assert!(index < MAX_THREAD_BITS, "thread id out of range");
        (index / 8, 1 << (index % 8))
    }

    /// Sets the bit for `id`.
    pub fn set(&self, id: ThreadId) {
        let (byte, mask) = Self::slot(id);
        if let Some(b) = self.bits.get(byte) {
            b.fetch_or(mask, Ordering::Release);
        }
    }

    /// Clears the bit for `id`. Clearing a clear bit is fine.
    pub fn clear(&self, id: ThreadId) {
        let (byte, mask) = Self::slot(id);
        if let Some(b) = self.bits.get(byte) {
            b.fetch_and(!mask, Ordering::Release);
        }
    }

    /// Tests the bit for `id`.
    pub fn test(&self, id: ThreadId) -> bool {
        let (byte, mask) = Self::slot(id);
        match self.bits.get(byte) {
            Some(b) => b.load(Ordering::Acquire) & mask != 0,
            None => false,
        }
    }

    /// Copies the bitmap, low byte first, for diagnostics.
    pub fn snapshot(&self) -> [u8; MAX_THREAD_BYTES] {
        let mut out = [0; MAX_THREAD_BYTES];
        for (dst, src) in out.iter_mut().zip(&self.bits) {
            *dst = src.load(Ordering::Acquire);
        }
        out
    }
}

impl Default for PermSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Sentinel in a thread descriptor's metadata word while the thread
/// subsystem has not assigned an id yet.
const THREAD_ID_NONE: u32 = u32::MAX;

/// Metadata record for one kernel object.
///
/// For statically declared objects the record is emitted into the image by
/// the directory generator; for dynamic objects it lives in the registry
/// entry next to the payload it describes. The kind is fixed at creation;
/// flags, permissions, and the metadata word are atomics so they can be
/// updated through a shared reference.
pub struct KObject {
    name: usize,
    kind: ObjectKind,
    flags: AtomicU32,
    perms: PermSet,
    data: AtomicU32,
}

impl KObject {
    /// Makes a fresh descriptor for the object at `addr`: no flags set, no
    /// grants, no metadata.
    pub const fn new(addr: usize, kind: ObjectKind) -> Self {
        Self {
            name: addr,
            kind,
            flags: AtomicU32::new(0),
            perms: PermSet::new(),
            data: AtomicU32::new(THREAD_ID_NONE),
        }
    }

    /// Address identity of the object: for static objects the object's own
    /// address, for dynamic objects the payload address.
    pub fn name(&self) -> usize {
        self.name
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn flags(&self) -> ObjectFlags {
        ObjectFlags::from_bits_truncate(self.flags.load(Ordering::Acquire))
    }

    pub(crate) fn insert_flags(&self, f: ObjectFlags) {
        self.flags.fetch_or(f.bits(), Ordering::Release);
    }

    pub(crate) fn remove_flags(&self, f: ObjectFlags) {
        self.flags.fetch_and(!f.bits(), Ordering::Release);
    }

    pub fn is_initialized(&self) -> bool {
        self.flags().contains(ObjectFlags::INITIALIZED)
    }

    pub fn is_public(&self) -> bool {
        self.flags().contains(ObjectFlags::PUBLIC)
    }

    pub fn perms(&self) -> &PermSet {
        &self.perms
    }

    /// Permission-bitmap id recorded in this descriptor, present only for
    /// `Thread` objects whose id has been assigned.
    pub fn thread_id(&self) -> Option<ThreadId> {
        if !matches!(self.kind, ObjectKind::Thread) {
            return None;
        }
        match self.data.load(Ordering::Acquire) {
            THREAD_ID_NONE => None,
            raw => Some(ThreadId(raw as u16)),
        }
    }

    /// Records the id the thread subsystem assigned to this thread.
    pub fn set_thread_id(&self, id: ThreadId) {
        debug_assert!(matches!(self.kind, ObjectKind::Thread));
        self.data.store(id.index() as u32, Ordering::Release);
    }
}
