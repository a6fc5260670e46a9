// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-thread permissions on kernel objects.
//!
//! Thread identity in this module is always the small integer id stored in
//! the thread's own object descriptor, never the thread's address. A thread
//! whose address doesn't resolve, or whose id hasn't been assigned yet, has
//! the sentinel identity: operations on its behalf silently do nothing, and
//! permission tests for it fail.
//!
//! The walking operations ([`inherit`], [`purge_thread`]) see a consistent
//! object population because they hold a shared borrow of the table for the
//! duration, which excludes registry mutation. An object allocated after a
//! walk completes gets its grants from its allocator, so missing it is
//! harmless.

use abi::ThreadId;

use crate::descs::{KObject, ObjectFlags};
use crate::table::ObjectTable;

/// Permission-bitmap id of the thread whose object is at `thread`.
pub(crate) fn thread_index(
    objects: &ObjectTable<'_>,
    thread: usize,
) -> Option<ThreadId> {
    objects.find(thread)?.thread_id()
}

/// Grants the thread at `thread` access to the object described by `ko`.
pub fn set(objects: &ObjectTable<'_>, ko: &KObject, thread: usize) {
    if let Some(id) = thread_index(objects, thread) {
        ko.perms().set(id);
    }
}

/// Revokes the grant of the thread at `thread` on the object described by
/// `ko`.
pub fn clear(objects: &ObjectTable<'_>, ko: &KObject, thread: usize) {
    if let Some(id) = thread_index(objects, thread) {
        ko.perms().clear(id);
    }
}

/// Tests whether the thread at `caller` may operate on `ko`: public
/// objects pass for everyone, otherwise the caller needs an assigned id
/// with the matching bit set.
pub fn test(
    objects: &ObjectTable<'_>,
    ko: &KObject,
    caller: usize,
) -> bool {
    if ko.is_public() {
        return true;
    }
    match thread_index(objects, caller) {
        Some(id) => ko.perms().test(id),
        None => false,
    }
}

/// Syscall surface: resolve `object` and grant the thread at `thread`
/// access to it. Unresolvable objects are ignored.
pub fn grant(objects: &ObjectTable<'_>, object: usize, thread: usize) {
    if let Some(ko) = objects.find(object) {
        set(objects, ko, thread);
    }
}

/// Syscall surface: resolve `object` and revoke the grant of the thread at
/// `thread`. Threads already blocked inside a syscall on the object are
/// the supervisor's problem, not this function's.
pub fn revoke(objects: &ObjectTable<'_>, object: usize, thread: usize) {
    if let Some(ko) = objects.find(object) {
        clear(objects, ko, thread);
    }
}

/// Marks the object at `object` public: permission tests pass for every
/// caller from here on. There is no interface to undo this.
pub fn grant_public(objects: &ObjectTable<'_>, object: usize) {
    if let Some(ko) = objects.find(object) {
        ko.insert_flags(ObjectFlags::PUBLIC);
    }
}

/// Thread-creation hook: copies the parent's grants to the child.
///
/// The child does not inherit access to the parent's own thread object;
/// everything else the parent can reach, the child now can too. Does
/// nothing unless both threads have assigned ids.
pub fn inherit(objects: &ObjectTable<'_>, parent: usize, child: usize) {
    let (Some(parent_id), Some(child_id)) =
        (thread_index(objects, parent), thread_index(objects, child))
    else {
        return;
    };
    objects.for_each(|ko| {
        if ko.perms().test(parent_id) && ko.name() != parent {
            ko.perms().set(child_id);
        }
    });
}

/// Thread-exit hook: clears the thread's bit on every descriptor in the
/// system. Must complete before the id can be handed to a new thread.
pub fn purge_thread(objects: &ObjectTable<'_>, thread: usize) {
    if let Some(id) = thread_index(objects, thread) {
        objects.for_each(|ko| ko.perms().clear(id));
    }
}
