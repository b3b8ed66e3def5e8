//! Interrupt registers
//!
//! Five interrupt kinds, each with raw status, masked status, mask, and
//! clear registers carrying one bit per channel. This driver cares about
//! the transfer-complete and error kinds; block and per-transaction
//! interrupts stay masked.
//!
//! Mask registers latch a channel's bit only when the matching
//! write-enable bit in \[15:8\] is set, so masking one channel never
//! disturbs the others.

use super::RWRegister;

/// DMA interrupt registers.
#[repr(C)]
pub struct RegisterBlock {
    /// Raw Status for IntTfr
    pub RAW_TFR: RWRegister<u32>,
    _reserved0: [u32; 1],
    /// Raw Status for IntBlock
    pub RAW_BLOCK: RWRegister<u32>,
    _reserved1: [u32; 1],
    /// Raw Status for IntSrcTran
    pub RAW_SRC_TRAN: RWRegister<u32>,
    _reserved2: [u32; 1],
    /// Raw Status for IntDstTran
    pub RAW_DST_TRAN: RWRegister<u32>,
    _reserved3: [u32; 1],
    /// Raw Status for IntErr
    pub RAW_ERR: RWRegister<u32>,
    _reserved4: [u32; 1],
    /// Status for IntTfr
    pub STATUS_TFR: RWRegister<u32>,
    _reserved5: [u32; 1],
    /// Status for IntBlock
    pub STATUS_BLOCK: RWRegister<u32>,
    _reserved6: [u32; 1],
    /// Status for IntSrcTran
    pub STATUS_SRC_TRAN: RWRegister<u32>,
    _reserved7: [u32; 1],
    /// Status for IntDstTran
    pub STATUS_DST_TRAN: RWRegister<u32>,
    _reserved8: [u32; 1],
    /// Status for IntErr
    pub STATUS_ERR: RWRegister<u32>,
    _reserved9: [u32; 1],
    /// Mask for IntTfr
    pub MASK_TFR: RWRegister<u32>,
    _reserved10: [u32; 1],
    /// Mask for IntBlock
    pub MASK_BLOCK: RWRegister<u32>,
    _reserved11: [u32; 1],
    /// Mask for IntSrcTran
    pub MASK_SRC_TRAN: RWRegister<u32>,
    _reserved12: [u32; 1],
    /// Mask for IntDstTran
    pub MASK_DST_TRAN: RWRegister<u32>,
    _reserved13: [u32; 1],
    /// Mask for IntErr
    pub MASK_ERR: RWRegister<u32>,
    _reserved14: [u32; 1],
    /// Clear for IntTfr
    pub CLEAR_TFR: RWRegister<u32>,
    _reserved15: [u32; 1],
    /// Clear for IntBlock
    pub CLEAR_BLOCK: RWRegister<u32>,
    _reserved16: [u32; 1],
    /// Clear for IntSrcTran
    pub CLEAR_SRC_TRAN: RWRegister<u32>,
    _reserved17: [u32; 1],
    /// Clear for IntDstTran
    pub CLEAR_DST_TRAN: RWRegister<u32>,
    _reserved18: [u32; 1],
    /// Clear for IntErr
    pub CLEAR_ERR: RWRegister<u32>,
    _reserved19: [u32; 1],
    /// Combined Interrupt Status
    pub STATUS_INT: RWRegister<u32>,
    _reserved20: [u32; 1],
}

impl RegisterBlock {
    /// Write-enable bits of the mask registers start here.
    pub const MASK_WE_SHIFT: u32 = 8;
    /// Every channel bit.
    pub const ALL_CHANNELS: u32 = 0xff;
}

// One raw/status/mask/clear register per interrupt kind, plus the
// combined status word.
const _: () = assert!(core::mem::size_of::<RegisterBlock>() == 0xa8);
