// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rendering of validation failures for the console.
//!
//! One line per failure, assembled through `Display` so the text lands
//! wherever the kernel's logger points. Compiled out entirely (module and
//! label strings both) when the `diagnostics` feature is off.

use core::fmt;

use abi::{kind_name, ObjectKind, ThreadId, ValidateError};

use crate::descs::KObject;
use crate::perms;
use crate::table::ObjectTable;

fn label(kind: ObjectKind) -> &'static str {
    kind_name(kind).unwrap_or("?")
}

/// One diagnostic line describing a failed validation.
pub struct ObjectError<'a> {
    pub error: ValidateError,
    /// The pointer the caller passed.
    pub object: usize,
    /// Descriptor the pointer resolved to, when it resolved.
    pub descriptor: Option<&'a KObject>,
    /// Kind the syscall handler expected.
    pub expected: ObjectKind,
    /// Current thread's object address and id.
    pub caller: usize,
    pub caller_id: Option<ThreadId>,
}

impl fmt::Display for ObjectError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error {
            ValidateError::NotAnObject => write!(
                f,
                "{:#x} is not a valid {}",
                self.object,
                label(self.expected)
            ),
            ValidateError::NoPermission => {
                let id = match self.caller_id {
                    Some(id) => id.index() as i32,
                    None => -1,
                };
                write!(
                    f,
                    "thread {:#x} ({}) does not have permission on ",
                    self.caller, id
                )?;
                match self.descriptor {
                    Some(ko) => {
                        write!(
                            f,
                            "{} {:#x} [",
                            label(ko.kind()),
                            ko.name()
                        )?;
                        // High byte first, so thread id 0 is the last
                        // visible nibble.
                        for byte in ko.perms().snapshot().iter().rev() {
                            write!(f, "{byte:02x}")?;
                        }
                        write!(f, "]")
                    }
                    None => write!(f, "{:#x}", self.object),
                }
            }
            ValidateError::NotInitialized => {
                write!(f, "{:#x} used before initialization", self.object)
            }
            ValidateError::AlreadyInitialized => write!(
                f,
                "{:#x} {} in use",
                self.object,
                label(self.expected)
            ),
        }
    }
}

/// Resolves the context for a failed validation and logs the diagnostic
/// line. Called by the syscall dispatcher just before it raises the
/// architecture trap against the offending thread.
pub fn report(
    objects: &ObjectTable<'_>,
    error: ValidateError,
    object: usize,
    expected: ObjectKind,
    caller: usize,
) {
    let line = ObjectError {
        error,
        object,
        descriptor: objects.find(object),
        expected,
        caller,
        caller_id: perms::thread_index(objects, caller),
    };
    log::error!("{line}");
}
