// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Kernel object ABI definitions, shared between the kernel, the syscall
//! layer, and the build-time directory generator.

#![no_std]

use serde::{Deserialize, Serialize};

/// Width of the per-object permission bitmap, in bytes.
///
/// This bounds the number of simultaneously live threads; raising it costs
/// `MAX_THREAD_BYTES` of RAM or Flash per kernel object.
pub const MAX_THREAD_BYTES: usize = 2;

/// Number of usable thread ids; ids run `0..MAX_THREAD_BITS`.
pub const MAX_THREAD_BITS: usize = 8 * MAX_THREAD_BYTES;

/// A live thread's slot in permission bitmaps.
///
/// This is distinct from the thread's pointer identity: the id is a dense
/// small integer handed out by the thread subsystem at creation time, and
/// must not be reused until the exiting thread's bits have been purged from
/// every object in the system.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ThreadId(pub u16);

impl ThreadId {
    /// The id as a bitmap index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Address identity of a kernel object, as keyed in the static directory.
#[derive(
    Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd,
)]
#[repr(transparent)]
pub struct ObjAddr(pub usize);

impl phash::PerfectHash for ObjAddr {
    fn phash(&self, m: u32) -> usize {
        self.0.wrapping_mul(m as usize)
    }
}

/// The closed set of kernel object kinds, plus the `Any` wildcard accepted
/// by syscalls that operate on any kind.
///
/// Discriminants are part of the syscall ABI; append, don't reorder.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize,
)]
#[repr(u32)]
pub enum ObjectKind {
    Any = 0,
    Alert = 1,
    MsgQueue = 2,
    Mutex = 3,
    Pipe = 4,
    Semaphore = 5,
    Stack = 6,
    StackElement = 7,
    Thread = 8,
    Timer = 9,
    Device = 10,
}

impl ObjectKind {
    /// Payload size for a dynamically allocated object of this kind,
    /// mirroring the kernel's object structure sizes.
    ///
    /// `None` for the wildcard and for stack-like kinds: stacks have
    /// alignment requirements the general allocator cannot satisfy, so they
    /// come from a specialized allocator instead.
    pub const fn payload_size(self) -> Option<usize> {
        match self {
            ObjectKind::Alert => Some(24),
            ObjectKind::MsgQueue => Some(48),
            ObjectKind::Mutex => Some(20),
            ObjectKind::Pipe => Some(56),
            ObjectKind::Semaphore => Some(16),
            ObjectKind::Thread => Some(128),
            ObjectKind::Timer => Some(40),
            ObjectKind::Device => Some(24),
            ObjectKind::Any
            | ObjectKind::Stack
            | ObjectKind::StackElement => None,
        }
    }

    /// True for the kinds `allocate` accepts.
    pub const fn is_allocatable(self) -> bool {
        self.payload_size().is_some()
    }
}

/// Human label for `kind`, for diagnostics.
///
/// When diagnostic support is compiled out this returns `None`, and the
/// label strings do not appear in the image at all.
#[cfg(feature = "diagnostics")]
pub const fn kind_name(kind: ObjectKind) -> Option<&'static str> {
    Some(match kind {
        ObjectKind::Any => "any object",
        ObjectKind::Alert => "alert",
        ObjectKind::MsgQueue => "message queue",
        ObjectKind::Mutex => "mutex",
        ObjectKind::Pipe => "pipe",
        ObjectKind::Semaphore => "semaphore",
        ObjectKind::Stack => "stack",
        ObjectKind::StackElement => "stack element",
        ObjectKind::Thread => "thread",
        ObjectKind::Timer => "timer",
        ObjectKind::Device => "device",
    })
}

/// Human label for `kind`, for diagnostics.
///
/// When diagnostic support is compiled out this returns `None`, and the
/// label strings do not appear in the image at all.
#[cfg(not(feature = "diagnostics"))]
pub const fn kind_name(_kind: ObjectKind) -> Option<&'static str> {
    None
}

/// What a syscall handler requires of an object's initialization state.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum InitCheck {
    /// Initialization state is irrelevant to the operation.
    Any,
    /// The object must already have been through its constructor.
    Initialized,
    /// The object must not have been initialized yet.
    Uninitialized,
}

/// Ways a syscall argument can fail object validation.
///
/// This is the complete taxonomy the validation gate reports to the syscall
/// dispatcher; the dispatcher surfaces the code to the caller and then
/// raises the architecture trap against the offending thread.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ValidateError {
    /// The pointer does not resolve to a kernel object, or resolves to an
    /// object of a different kind than the handler expected.
    NotAnObject,
    /// The object exists but the calling thread has no grant on it.
    NoPermission,
    /// The handler required an initialized object and this one isn't.
    NotInitialized,
    /// The handler required an uninitialized object and this one has
    /// already been through its constructor.
    AlreadyInitialized,
}

impl ValidateError {
    /// Stable numeric code for the syscall return path.
    pub const fn code(self) -> u32 {
        match self {
            ValidateError::NotAnObject => 1,
            ValidateError::NoPermission => 2,
            ValidateError::NotInitialized => 3,
            ValidateError::AlreadyInitialized => 4,
        }
    }
}
