// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The unified view of every kernel object in the system.

#[cfg(feature = "dynamic-objects")]
use abi::ObjectKind;

use crate::descs::KObject;
use crate::directory::StaticObjects;
#[cfg(feature = "dynamic-objects")]
use crate::registry::{DynObject, DynamicRegistry};

/// All kernel objects the kernel knows about: the generated static
/// directory plus, when dynamic objects are enabled, the runtime registry.
///
/// The trap entry owns the table and enters syscall handling with
/// interrupts masked. Registry mutation (`allocate`, `free`) takes
/// `&mut self` and is therefore serialized by that entry; everything else
/// takes `&self`, and a live shared borrow keeps registry entries from
/// being freed out from under a lookup or walk.
pub struct ObjectTable<'s> {
    statics: &'s StaticObjects<'s>,
    #[cfg(feature = "dynamic-objects")]
    dynamics: DynamicRegistry,
}

impl<'s> ObjectTable<'s> {
    pub const fn new(statics: &'s StaticObjects<'s>) -> Self {
        Self {
            statics,
            #[cfg(feature = "dynamic-objects")]
            dynamics: DynamicRegistry::new(),
        }
    }

    /// Resolves a pointer to the descriptor it names, if it names one.
    ///
    /// Statically declared objects are checked first; most objects are
    /// static, and that path is a single hash probe.
    pub fn find(&self, addr: usize) -> Option<&KObject> {
        let ko = self.statics.find(addr);
        #[cfg(feature = "dynamic-objects")]
        let ko = ko.or_else(|| self.dynamics.find_by_payload(addr));
        ko
    }

    /// Visits every descriptor in the system, statics first, each exactly
    /// once.
    pub fn for_each(&self, mut f: impl FnMut(&KObject)) {
        self.statics.for_each(&mut f);
        #[cfg(feature = "dynamic-objects")]
        self.dynamics.walk(f);
    }

    /// Allocates a dynamic object of `kind` and registers it.
    ///
    /// The thread whose object is at `creator` implicitly gets a grant on
    /// the new object; if `creator` does not resolve to a thread with an
    /// assigned id, the object starts with no grants at all. Returns the
    /// payload address, or `None` when the kind cannot be allocated or the
    /// heap is exhausted.
    #[cfg(feature = "dynamic-objects")]
    pub fn allocate(
        &mut self,
        kind: ObjectKind,
        creator: usize,
    ) -> Option<usize> {
        debug_assert!(
            !matches!(kind, ObjectKind::Any),
            "cannot allocate the wildcard kind"
        );
        let Some(size) = kind.payload_size() else {
            // Stacks and stack elements need alignment the general
            // allocator cannot provide; they come from a specialized
            // allocator, not from here.
            log::warn!("kernel object kind {:?} is not allocatable", kind);
            return None;
        };

        let Some(obj) = DynObject::new(kind, size) else {
            log::warn!("could not allocate kernel object");
            return None;
        };
        if let Some(id) = crate::perms::thread_index(self, creator) {
            obj.kobj().perms().set(id);
        }
        Some(self.dynamics.insert(obj))
    }

    /// Releases the dynamic object whose payload is at `addr`.
    ///
    /// Not exposed to user mode: there is no robust way to prove the
    /// object is unreferenced, so only the supervisor may call this.
    /// Addresses that name no dynamic object are ignored.
    #[cfg(feature = "dynamic-objects")]
    pub fn free(&mut self, addr: usize) {
        self.dynamics.remove(addr);
    }
}

#[cfg(all(test, feature = "dynamic-objects"))]
mod tests {
    use super::*;
    use crate::testutil;
    use crate::validate::{self, ValidateError};
    use abi::{InitCheck, ThreadId};

    const ALLOCATABLE: [ObjectKind; 8] = [
        ObjectKind::Alert,
        ObjectKind::MsgQueue,
        ObjectKind::Mutex,
        ObjectKind::Pipe,
        ObjectKind::Semaphore,
        ObjectKind::Thread,
        ObjectKind::Timer,
        ObjectKind::Device,
    ];

    #[test]
    fn resolver_is_complete_for_allocated_objects() {
        let fix = testutil::Fixture::new();
        let mut table = fix.table();

        let mut ptrs = Vec::new();
        for kind in ALLOCATABLE {
            let p = table.allocate(kind, fix.thread_a).unwrap();
            ptrs.push((p, kind));
        }
        for (p, kind) in &ptrs {
            let ko = table.find(*p).expect("allocated object must resolve");
            assert_eq!(ko.kind(), *kind);
            assert_eq!(ko.name(), *p);
        }
        for (p, _) in &ptrs {
            table.free(*p);
            assert!(table.find(*p).is_none());
        }
    }

    #[test]
    fn resolver_is_sound_for_arbitrary_addresses() {
        let fix = testutil::Fixture::new();
        let mut table = fix.table();
        let p = table.allocate(ObjectKind::Semaphore, fix.thread_a).unwrap();

        // Interior and near-miss addresses around real objects.
        for bad in [p + 1, p + 8, p - 8, fix.sem_x + 4, fix.sem_x - 4] {
            assert!(table.find(bad).is_none(), "{bad:#x} must not resolve");
        }

        // A spray of pseudo-random addresses, skipping the real ones.
        let mut x = 0x9e37_79b9_usize;
        for _ in 0..1000 {
            x = x.wrapping_mul(0x2545_f491_4f6c_dd1d).wrapping_add(1);
            if table.find(x).is_some() {
                assert!(x == p || fix.is_fixture_object(x));
            }
        }
    }

    #[test]
    fn allocate_grants_the_creator() {
        let fix = testutil::Fixture::new();
        let mut table = fix.table();
        let p = table.allocate(ObjectKind::MsgQueue, fix.thread_a).unwrap();

        assert_eq!(
            validate::validate(
                &table,
                p,
                ObjectKind::MsgQueue,
                InitCheck::Any,
                fix.thread_a,
            ),
            Ok(())
        );
        let ko = table.find(p).unwrap();
        assert!(ko.perms().test(ThreadId(testutil::ID_A)));
        assert!(!ko.perms().test(ThreadId(testutil::ID_B)));
    }

    #[test]
    fn allocate_by_idless_creator_grants_nobody() {
        let fix = testutil::Fixture::new();
        let mut table = fix.table();
        // A pointer that resolves to no thread object at all.
        let p = table.allocate(ObjectKind::Semaphore, 0x5555_5550).unwrap();
        let ko = table.find(p).unwrap();
        for id in 0..abi::MAX_THREAD_BITS {
            assert!(!ko.perms().test(ThreadId(id as u16)));
        }
    }

    #[test]
    fn stack_kinds_are_rejected() {
        let fix = testutil::Fixture::new();
        let mut table = fix.table();
        assert!(table.allocate(ObjectKind::Stack, fix.thread_a).is_none());
        assert!(table
            .allocate(ObjectKind::StackElement, fix.thread_a)
            .is_none());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "wildcard")]
    fn wildcard_allocation_asserts() {
        let fix = testutil::Fixture::new();
        let mut table = fix.table();
        let _ = table.allocate(ObjectKind::Any, fix.thread_a);
    }

    #[test]
    fn free_of_static_objects_is_ignored() {
        let fix = testutil::Fixture::new();
        let mut table = fix.table();
        table.free(fix.sem_x);
        assert!(table.find(fix.sem_x).is_some());
    }

    #[test]
    fn freed_objects_fail_validation() {
        let fix = testutil::Fixture::new();
        let mut table = fix.table();
        let p = table.allocate(ObjectKind::Timer, fix.thread_a).unwrap();
        table.free(p);
        assert_eq!(
            validate::validate(
                &table,
                p,
                ObjectKind::Timer,
                InitCheck::Any,
                fix.thread_a,
            ),
            Err(ValidateError::NotAnObject)
        );
    }

    #[test]
    fn for_each_covers_both_populations() {
        let fix = testutil::Fixture::new();
        let mut table = fix.table();
        let p = table.allocate(ObjectKind::Alert, fix.thread_a).unwrap();

        let mut names = Vec::new();
        table.for_each(|ko| names.push(ko.name()));
        assert!(names.contains(&fix.sem_x));
        assert!(names.contains(&fix.thread_a));
        assert!(names.contains(&p));
    }
}
