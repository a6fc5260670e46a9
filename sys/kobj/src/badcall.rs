// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sentinel handlers for the syscall dispatch table.
//!
//! The dispatcher installs these in slots that carry no real handler: ids
//! past the end of the table, and ids reserved but not implemented. Both
//! report the event and then hand the thread to the architecture's trap;
//! neither returns.

/// Architecture hook for terminating a thread that made an unservable
/// system call.
pub trait SyscallOops {
    /// Raises the architecture trap against the calling thread. Control
    /// does not come back.
    fn syscall_oops(&mut self) -> !;
}

/// Handler for syscall ids outside the dispatch table.
pub fn bad_syscall_id(arch: &mut impl SyscallOops, id: u32) -> ! {
    log::error!("Bad system call id {id} invoked");
    arch.syscall_oops()
}

/// Handler for syscall ids that are reserved but unimplemented.
pub fn no_syscall(arch: &mut impl SyscallOops) -> ! {
    log::error!("Unimplemented system call");
    arch.syscall_oops()
}
