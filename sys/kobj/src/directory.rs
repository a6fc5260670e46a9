// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Directory of the statically declared kernel objects.
//!
//! The table is generated at build time from the linked image's symbol
//! table and linked into the kernel as a `static`. It is read-only from
//! then on, so lookups need no locking and are safe from any context.

use abi::ObjAddr;
use phash::PerfectHashMap;

use crate::descs::KObject;

/// Perfect-hash lookup from object address to descriptor, covering every
/// kernel object declared at link time.
pub struct StaticObjects<'a> {
    table: PerfectHashMap<'a, ObjAddr, Option<&'a KObject>>,
}

impl StaticObjects<'static> {
    /// Directory with no entries, for images that declare no static
    /// objects.
    pub const EMPTY: Self =
        Self::new(PerfectHashMap { m: 0, values: &[] });
}

impl<'a> StaticObjects<'a> {
    pub const fn new(
        table: PerfectHashMap<'a, ObjAddr, Option<&'a KObject>>,
    ) -> Self {
        Self { table }
    }

    /// O(1) lookup of the descriptor for the static object at `addr`.
    ///
    /// Addresses outside the generated set land on some slot like any
    /// other input; the stored-key comparison rejects them, so there are
    /// no false positives.
    pub fn find(&self, addr: usize) -> Option<&'a KObject> {
        self.table.get(ObjAddr(addr)).copied().flatten()
    }

    /// Visits every static descriptor exactly once, in table order.
    pub fn for_each(&self, mut f: impl FnMut(&'a KObject)) {
        for (_, slot) in self.table.iter() {
            if let Some(ko) = *slot {
                f(ko);
            }
        }
    }
}
