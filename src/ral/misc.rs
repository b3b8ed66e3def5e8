//! Miscellaneous registers
//!
//! Controller enable, channel enable, and identification. The channel
//! enable register follows the same write-enable discipline as the
//! interrupt mask registers: bits \[7:0\] are the enables, and a bit
//! only latches when its write-enable in \[15:8\] is set.

use super::RWRegister;

/// DMA miscellaneous registers.
#[repr(C)]
pub struct RegisterBlock {
    /// DMA Configuration Register
    pub CFG: RWRegister<u32>,
    _reserved0: [u32; 1],
    /// DMA Channel Enable Register
    pub CH_EN: RWRegister<u32>,
    _reserved1: [u32; 1],
    /// DMA ID Register
    pub ID: RWRegister<u32>,
    _reserved2: [u32; 1],
    /// DMA Test Register
    pub TEST: RWRegister<u32>,
    _reserved3: [u32; 1],
}

impl RegisterBlock {
    /// Global controller enable (DmaCfgReg bit 0).
    pub const DMA_EN: u32 = 1;
    /// Write-enable bits of the channel enable register start here.
    pub const CH_EN_WE_SHIFT: u32 = 8;
}
