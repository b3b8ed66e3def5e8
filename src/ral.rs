//! A RAL-like module for the DW AHB DMA controller registers
//!
//! The register map follows the controller data book: eight channel
//! register files, then the interrupt bank, then the software handshake
//! and miscellaneous banks. Registers sit on 64-bit boundaries even
//! though only the low words are implemented, so every block carries
//! reservation padding.
//!
//! Field-heavy channel registers get field modules for the RAL macros.
//! Bit-per-channel registers (interrupt status, channel enable) are
//! plain words handled with shifts, since the interesting bit is just
//! the channel number.

#![allow(
    non_snake_case, // Compatibility with RAL
    non_upper_case_globals, // RAL field constants
    unused, // Not every register is touched by this driver
)]

pub mod chan;
pub mod int;
pub mod misc;

pub use ral_registers::{modify_reg, read_reg, write_reg};
use ral_registers::RWRegister;

//
// Helper types for static memory
//
// Similar to the RAL's `Instance` type, but more copy.
//

pub(crate) struct Static<T>(pub(crate) *const T);
impl<T> core::ops::Deref for Static<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        // Safety: pointer points to static memory (peripheral memory)
        unsafe { &*self.0 }
    }
}
impl<T> Clone for Static<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Static<T> {}

/// DW AHB DMA controller register map.
#[repr(C)]
pub struct RegisterBlock {
    /// Channel register files, 0x58 bytes apiece.
    pub CH: [chan::RegisterBlock; 8],
    /// Interrupt registers.
    pub INT: int::RegisterBlock,
    /// Software handshake registers. This driver only uses hardware
    /// handshaking, so these stay untouched.
    _reserved0: [u32; 12],
    /// Miscellaneous registers: controller enable, channel enable, ID.
    pub MISC: misc::RegisterBlock,
}

// Reservation arithmetic, checked against the data book offsets.
const _: () = assert!(core::mem::size_of::<chan::RegisterBlock>() == 0x58);
const _: () = assert!(core::mem::offset_of!(RegisterBlock, INT) == 0x2c0);
const _: () = assert!(core::mem::offset_of!(RegisterBlock, MISC) == 0x398);
