// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Kernel object access control.
//!
//! This is the part of the kernel that decides whether a pointer handed in
//! from userspace names a kernel object at all, whether the calling thread
//! has been granted access to that object, and whether the object is in the
//! right initialization state for the requested operation. Supervisor code
//! is trusted and never routed through these checks.
//!
//! Objects come from two populations. Statically declared objects are known
//! at link time; a build-time generator turns the image's symbol table into
//! a perfect-hash directory ([`directory`]), so identifying one costs a
//! multiply and a compare. Dynamically allocated objects live in an ordered
//! registry keyed by payload address ([`registry`]). [`table::ObjectTable`]
//! fronts both populations with a single resolver.
//!
//! # Design notes
//!
//! 1. A strong preference for safe code: user-supplied pointers are only
//!    ever used as lookup keys, never dereferenced.
//! 2. The trap entry owns the table. Registry mutation takes
//!    `&mut ObjectTable` and is therefore serialized by the entry's
//!    interrupt masking; lookups and permission walks take `&ObjectTable`,
//!    which pins registry entries for the duration.
//! 3. Permission and flag words on descriptors are atomics, so a grant can
//!    be tested from interrupt context without touching the registry.

#![cfg_attr(not(test), no_std)]

#[cfg(feature = "dynamic-objects")]
extern crate alloc;

pub mod badcall;
pub mod descs;
#[cfg(feature = "diagnostics")]
pub mod diag;
pub mod directory;
pub mod perms;
#[cfg(feature = "dynamic-objects")]
mod registry;
pub mod table;
pub mod validate;

#[cfg(test)]
mod testutil;
