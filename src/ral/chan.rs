//! Per-channel register file
//!
//! Each channel owns one of these, spaced 0x58 bytes apart from the
//! controller base. The upper 32 bits of every 64-bit register are
//! unimplemented on Quark parts and appear here as reservations.

use super::RWRegister;

/// DMA channel registers.
#[repr(C)]
pub struct RegisterBlock {
    /// Source Address Register
    pub SAR: RWRegister<u32>,
    _reserved0: [u32; 1],
    /// Destination Address Register
    pub DAR: RWRegister<u32>,
    _reserved1: [u32; 1],
    /// Linked List Pointer Register
    pub LLP: RWRegister<u32>,
    _reserved2: [u32; 1],
    /// Control Register, low word
    pub CTL_L: RWRegister<u32>,
    /// Control Register, high word
    pub CTL_H: RWRegister<u32>,
    /// Source Status Register
    pub SSTAT: RWRegister<u32>,
    _reserved3: [u32; 1],
    /// Destination Status Register
    pub DSTAT: RWRegister<u32>,
    _reserved4: [u32; 1],
    /// Source Status Address Register
    pub SSTATAR: RWRegister<u32>,
    _reserved5: [u32; 1],
    /// Destination Status Address Register
    pub DSTATAR: RWRegister<u32>,
    _reserved6: [u32; 1],
    /// Configuration Register, low word
    pub CFG_L: RWRegister<u32>,
    /// Configuration Register, high word
    pub CFG_H: RWRegister<u32>,
    /// Source Gather Register
    pub SGR: RWRegister<u32>,
    _reserved7: [u32; 1],
    /// Destination Scatter Register
    pub DSR: RWRegister<u32>,
    _reserved8: [u32; 1],
}

pub mod CTL_L {
    /// Interrupt enable
    pub mod INT_EN {
        pub const offset: u32 = 0;
        pub const mask: u32 = 0x1 << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
    /// Destination transfer width
    pub mod DST_TR_WIDTH {
        pub const offset: u32 = 1;
        pub const mask: u32 = 0x7 << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
    /// Source transfer width
    pub mod SRC_TR_WIDTH {
        pub const offset: u32 = 4;
        pub const mask: u32 = 0x7 << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
    /// Destination address increment mode
    pub mod DINC {
        pub const offset: u32 = 7;
        pub const mask: u32 = 0x3 << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
    /// Source address increment mode
    pub mod SINC {
        pub const offset: u32 = 9;
        pub const mask: u32 = 0x3 << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
    /// Destination burst transaction length
    pub mod DEST_MSIZE {
        pub const offset: u32 = 11;
        pub const mask: u32 = 0x7 << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
    /// Source burst transaction length
    pub mod SRC_MSIZE {
        pub const offset: u32 = 14;
        pub const mask: u32 = 0x7 << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
    /// Transfer type and flow control
    pub mod TT_FC {
        pub const offset: u32 = 20;
        pub const mask: u32 = 0x7 << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
    /// Destination block chaining enable
    pub mod LLP_DST_EN {
        pub const offset: u32 = 27;
        pub const mask: u32 = 0x1 << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
    /// Source block chaining enable
    pub mod LLP_SRC_EN {
        pub const offset: u32 = 28;
        pub const mask: u32 = 0x1 << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
}

pub mod CTL_H {
    /// Block transfer size, in items of the source width
    ///
    /// Hardware writes the completed item count back to this field
    /// while the channel runs.
    pub mod BLOCK_TS {
        pub const offset: u32 = 0;
        pub const mask: u32 = 0xfff << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
    /// Block transfer done
    pub mod DONE {
        pub const offset: u32 = 12;
        pub const mask: u32 = 0x1 << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
}

pub mod CFG_L {
    /// Channel suspend
    pub mod CH_SUSP {
        pub const offset: u32 = 8;
        pub const mask: u32 = 0x1 << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
    /// Channel FIFO empty indication
    pub mod FIFO_EMPTY {
        pub const offset: u32 = 9;
        pub const mask: u32 = 0x1 << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
    /// Destination handshake select, 0 = hardware
    pub mod HS_SEL_DST {
        pub const offset: u32 = 10;
        pub const mask: u32 = 0x1 << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
    /// Source handshake select, 0 = hardware
    pub mod HS_SEL_SRC {
        pub const offset: u32 = 11;
        pub const mask: u32 = 0x1 << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
    /// Destination handshake polarity
    pub mod DST_HS_POL {
        pub const offset: u32 = 18;
        pub const mask: u32 = 0x1 << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
    /// Source handshake polarity
    pub mod SRC_HS_POL {
        pub const offset: u32 = 19;
        pub const mask: u32 = 0x1 << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
    /// Automatic source reload
    pub mod RELOAD_SRC {
        pub const offset: u32 = 30;
        pub const mask: u32 = 0x1 << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
    /// Automatic destination reload
    pub mod RELOAD_DST {
        pub const offset: u32 = 31;
        pub const mask: u32 = 0x1 << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
}

pub mod CFG_H {
    /// Flow control mode
    pub mod FCMODE {
        pub const offset: u32 = 0;
        pub const mask: u32 = 0x1 << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
    /// FIFO mode
    pub mod FIFO_MODE {
        pub const offset: u32 = 1;
        pub const mask: u32 = 0x1 << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
    /// Protection control
    pub mod PROTCTL {
        pub const offset: u32 = 2;
        pub const mask: u32 = 0x7 << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
    /// Source hardware handshake interface
    pub mod SRC_PER {
        pub const offset: u32 = 7;
        pub const mask: u32 = 0xf << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
    /// Destination hardware handshake interface
    pub mod DEST_PER {
        pub const offset: u32 = 11;
        pub const mask: u32 = 0xf << offset;
        pub mod R {}
        pub mod W {}
        pub mod RW {}
    }
}
