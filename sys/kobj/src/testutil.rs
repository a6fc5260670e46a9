// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared scaffolding for the crate's tests: a small "image" of static
//! objects with two live threads, built through the real generator search.

use abi::{ObjAddr, ObjectKind, ThreadId};
use phash::PerfectHashMap;

use crate::descs::KObject;
use crate::directory::StaticObjects;
use crate::table::ObjectTable;

pub(crate) const ID_A: u16 = 3;
pub(crate) const ID_B: u16 = 4;

/// Builds a static directory over the given descriptors, the way the
/// build-time generator would, and leaks it for the test's lifetime.
pub(crate) fn build_statics(
    objs: Vec<KObject>,
) -> &'static StaticObjects<'static> {
    let objs: &'static [KObject] = Box::leak(objs.into_boxed_slice());
    let owned = kobjgen::OwnedPerfectHashMap::build(
        objs.iter()
            .enumerate()
            .map(|(i, ko)| (ObjAddr(ko.name()), i))
            .collect(),
    )
    .expect("perfect hash search must succeed");
    let values: Vec<(ObjAddr, Option<&'static KObject>)> = owned
        .values
        .iter()
        .map(|slot| match slot {
            Some((addr, index)) => (*addr, Some(&objs[*index])),
            None => (ObjAddr(0), None),
        })
        .collect();
    Box::leak(Box::new(StaticObjects::new(PerfectHashMap {
        m: owned.m,
        values: Box::leak(values.into_boxed_slice()),
    })))
}

/// A fixed little system: threads A (id 3) and B (id 4), one thread that
/// never got an id, a static semaphore, and a static mutex.
pub(crate) struct Fixture {
    statics: &'static StaticObjects<'static>,
    pub(crate) thread_a: usize,
    pub(crate) thread_b: usize,
    pub(crate) idless_thread: usize,
    pub(crate) sem_x: usize,
    pub(crate) mutex_y: usize,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        const THREAD_A: usize = 0x2000_0000;
        const THREAD_B: usize = 0x2000_0080;
        const IDLESS: usize = 0x2000_0160;
        const SEM_X: usize = 0x2000_0100;
        const MUTEX_Y: usize = 0x2000_0140;

        let a = KObject::new(THREAD_A, ObjectKind::Thread);
        a.set_thread_id(ThreadId(ID_A));
        let b = KObject::new(THREAD_B, ObjectKind::Thread);
        b.set_thread_id(ThreadId(ID_B));

        let statics = build_statics(vec![
            a,
            b,
            KObject::new(IDLESS, ObjectKind::Thread),
            KObject::new(SEM_X, ObjectKind::Semaphore),
            KObject::new(MUTEX_Y, ObjectKind::Mutex),
        ]);
        Self {
            statics,
            thread_a: THREAD_A,
            thread_b: THREAD_B,
            idless_thread: IDLESS,
            sem_x: SEM_X,
            mutex_y: MUTEX_Y,
        }
    }

    pub(crate) fn table(&self) -> ObjectTable<'static> {
        ObjectTable::new(self.statics)
    }

    pub(crate) fn is_fixture_object(&self, addr: usize) -> bool {
        [
            self.thread_a,
            self.thread_b,
            self.idless_thread,
            self.sem_x,
            self.mutex_y,
        ]
        .contains(&addr)
    }
}
