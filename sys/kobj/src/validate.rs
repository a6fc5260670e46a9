// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Syscall argument validation and object lifecycle gating.

pub use abi::{InitCheck, ValidateError};
use abi::ObjectKind;

use crate::descs::{KObject, ObjectFlags};
use crate::perms;
use crate::table::ObjectTable;

/// Checks that `object` names a kernel object of `expected_kind` that the
/// thread at `caller` may use, in the initialization state the handler
/// requires.
///
/// This is the gate every object-typed syscall argument passes through.
/// Checks run in a fixed order and the first failure wins, so the error
/// the dispatcher surfaces is the most fundamental one.
pub fn validate(
    objects: &ObjectTable<'_>,
    object: usize,
    expected_kind: ObjectKind,
    init: InitCheck,
    caller: usize,
) -> Result<(), ValidateError> {
    validate_descriptor(
        objects,
        objects.find(object),
        expected_kind,
        init,
        caller,
    )
}

/// [`validate`] for a descriptor the handler has already resolved (or
/// failed to resolve: `None` reports `NotAnObject`).
pub fn validate_descriptor(
    objects: &ObjectTable<'_>,
    desc: Option<&KObject>,
    expected_kind: ObjectKind,
    init: InitCheck,
    caller: usize,
) -> Result<(), ValidateError> {
    let Some(ko) = desc else {
        return Err(ValidateError::NotAnObject);
    };
    if !matches!(expected_kind, ObjectKind::Any)
        && ko.kind() != expected_kind
    {
        return Err(ValidateError::NotAnObject);
    }

    // Any use of an object by a user thread requires a grant first, even
    // on objects that have not been initialized yet.
    if !perms::test(objects, ko, caller) {
        return Err(ValidateError::NoPermission);
    }

    match init {
        InitCheck::Any => Ok(()),
        InitCheck::Initialized if !ko.is_initialized() => {
            Err(ValidateError::NotInitialized)
        }
        InitCheck::Uninitialized if ko.is_initialized() => {
            Err(ValidateError::AlreadyInitialized)
        }
        _ => Ok(()),
    }
}

/// Records that the kind-specific constructor for the object at `addr` has
/// completed, enabling non-initialization syscalls on it.
///
/// Supervisor code may construct objects the resolver has never heard of,
/// on its own stack for instance; those are silently left alone. Such
/// objects are simply never usable from userspace.
pub fn mark_initialized(objects: &ObjectTable<'_>, addr: usize) {
    if let Some(ko) = objects.find(addr) {
        ko.insert_flags(ObjectFlags::INITIALIZED);
    }
}

/// Inverse of [`mark_initialized`], called after the kind-specific
/// destructor has run.
pub fn mark_uninitialized(objects: &ObjectTable<'_>, addr: usize) {
    if let Some(ko) = objects.find(addr) {
        ko.remove_flags(ObjectFlags::INITIALIZED);
    }
}
