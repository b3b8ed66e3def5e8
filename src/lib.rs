//! Direct Memory Access (DMA) driver for Intel Quark microcontrollers.
//!
//! `quark-dma` drives the DW AHB DMA controller found on Quark parts. It
//! provides
//!
//! - channel configuration: direction, transfer widths, burst lengths,
//!   and hardware handshaking for the peripheral side.
//! - single-block transfers with completion, error, and termination
//!   outcomes delivered through a per-channel [`Client`].
//!
//! This driver may be re-exported from a hardware abstraction layer
//! (HAL). If it is, you should use the safer APIs provided by your HAL.
//!
//! # Getting started
//!
//! To allocate a [`Dma`] driver, you'll need to know
//!
//! 1. the location of the DMA controller registers.
//! 2. the number of DMA channels supported by your chip: 2 on the Quark
//!    D2000, 8 on the Quark SE C1000.
//!
//! Assign a `Dma` to a static, wire the per-channel interrupt vectors to
//! [`on_interrupt`](Dma::on_interrupt) and the shared error vector to
//! [`on_error`](Dma::on_error), and call [`init`](Dma::init) once at
//! startup. After that, channels are configured and transfers staged and
//! started through the `Dma` methods:
//!
//! ```no_run
//! use quark_dma::{
//!     BurstLength, ChannelConfig, Direction, Dma, HandshakePolarity, TransferConfig,
//!     TransferWidth,
//! };
//! # struct Pic;
//! # impl quark_dma::InterruptController for Pic {
//! #     fn unmask(&mut self, _: quark_dma::InterruptLine) {}
//! #     fn mask(&mut self, _: quark_dma::InterruptLine) {}
//! # }
//! # const DMA_BASE: *const () = core::ptr::null() as _;
//!
//! // Safety: base address and channel count fit the target part.
//! static DMA: Dma<2> = unsafe { Dma::new(DMA_BASE) };
//!
//! static DONE: fn(u32, quark_dma::Result<()>) = |_length, _outcome| {
//!     // hand the outcome to the application
//! };
//!
//! fn setup(pic: &mut Pic) -> quark_dma::Result<()> {
//!     DMA.init(pic)?;
//!     DMA.configure_channel(
//!         0,
//!         &ChannelConfig {
//!             handshake_interface: 0,
//!             handshake_polarity: HandshakePolarity::High,
//!             direction: Direction::MemoryToMemory,
//!             source_width: TransferWidth::Bits32,
//!             destination_width: TransferWidth::Bits32,
//!             source_burst: BurstLength::Items4,
//!             destination_burst: BurstLength::Items4,
//!             client: &DONE,
//!         },
//!     )
//! }
//!
//! /// `destination` must hold `source.len()` words and stay untouched
//! /// until `DONE` reports the outcome.
//! fn start_copy(source: &'static [u32; 64], destination: *mut u32) -> quark_dma::Result<()> {
//!     let transfer = TransferConfig {
//!         block_size: source.len() as u32,
//!         source_address: source.as_ptr().cast(),
//!         destination_address: destination.cast(),
//!     };
//!     // Safety: caller keeps both regions valid until the outcome
//!     // arrives.
//!     unsafe { DMA.transfer_mem_to_mem(0, &transfer) }
//! }
//! ```
//!
//! Peripheral transfers work the same way, with the channel configured
//! for [`MemoryToPeripheral`](Direction::MemoryToPeripheral) or
//! [`PeripheralToMemory`](Direction::PeripheralToMemory) and the
//! peripheral's handshake interface number. The peripheral driver owns
//! the other half of that contract: its request signal must be routed
//! to the same interface.
//!
//! ### License
//!
//! Licensed under either of
//!
//! - [Apache License, Version 2.0](http://www.apache.org/licenses/LICENSE-2.0) ([LICENSE-APACHE](./LICENSE-APACHE))
//! - [MIT License](http://opensource.org/licenses/MIT) ([LICENSE-MIT](./LICENSE-MIT))
//!
//! at your option.
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted
//! for inclusion in the work by you, as defined in the Apache-2.0 license, shall be
//! dual licensed as above, without any additional terms or conditions.

#![cfg_attr(not(test), no_std)]

mod channel;
mod error;
mod interrupt;
mod ral;
#[cfg(test)]
mod tests;

pub use channel::{
    BurstLength, ChannelConfig, Direction, HandshakePolarity, TransferConfig, TransferWidth,
};
pub use error::Error;
pub use interrupt::{Client, InterruptController, InterruptLine};

/// A DMA result
pub type Result<T> = core::result::Result<T, Error>;

use core::sync::atomic::{AtomicBool, Ordering};

/// A DMA controller driver with `CHANNELS` channels.
///
/// One `Dma` owns one physical controller: its registers, and the
/// lifecycle bookkeeping for every channel. Allocate it in a static so
/// interrupt handlers can reach it, then share it freely; all methods
/// take `&self`.
///
/// `CHANNELS` is the channel count of the target part. Operations
/// validate channel numbers against it, so an oversized value defeats
/// that check and an undersized one strands working channels.
pub struct Dma<const CHANNELS: usize> {
    registers: ral::Static<ral::RegisterBlock>,
    states: [SharedState; CHANNELS],
    initialized: AtomicBool,
}

// Safety: OK to allocate a DMA driver in a static context. Channel
// bookkeeping lives behind critical-section mutexes, and register
// access is volatile.
unsafe impl<const CHANNELS: usize> Sync for Dma<CHANNELS> {}

use interrupt::{SharedState, UNCONFIGURED};

impl<const CHANNELS: usize> Dma<CHANNELS> {
    /// Create the DMA driver.
    ///
    /// Note that this can evaluate at compile time, so the driver can
    /// live in a static.
    ///
    /// # Safety
    ///
    /// Caller must make sure that `registers` is a pointer to the start
    /// of the DMA controller register block, and that nothing else
    /// drives that controller.
    ///
    /// # Panics
    ///
    /// Panics at compile time if `CHANNELS` exceeds the eight channels
    /// the controller register map provides.
    pub const unsafe fn new(registers: *const ()) -> Self {
        assert!(CHANNELS <= 8);
        Self {
            registers: ral::Static(registers.cast()),
            states: [UNCONFIGURED; CHANNELS],
            initialized: AtomicBool::new(false),
        }
    }

    /// Bring the controller to a known state and enable it.
    ///
    /// The controller is disabled, every channel halted and masked, and
    /// stale interrupt status dropped. The per-channel complete lines
    /// and the shared error line are then unmasked through `intc`, and
    /// the controller enabled. Call this once at startup, before any
    /// channel operation.
    ///
    /// A second call returns [`InvalidState`](Error::InvalidState): the
    /// reset would tear the rug out from under configured channels. If
    /// a channel refuses to halt the call returns
    /// [`Hardware`](Error::Hardware) and may be retried.
    pub fn init(&self, intc: &mut impl InterruptController) -> Result<()> {
        if self.initialized.swap(true, Ordering::AcqRel) {
            return Err(Error::InvalidState);
        }
        if let Err(reset) = self.reset() {
            self.initialized.store(false, Ordering::Release);
            return Err(reset);
        }
        for channel in 0..CHANNELS {
            intc.unmask(InterruptLine::Channel(channel));
        }
        intc.unmask(InterruptLine::Error);
        self.registers
            .MISC
            .CFG
            .write(ral::misc::RegisterBlock::DMA_EN);
        Ok(())
    }

    /// Disable the controller, quiet every channel, and drop whatever
    /// interrupt status survived the last reset.
    fn reset(&self) -> Result<()> {
        self.registers.MISC.CFG.write(0);
        for channel in 0..CHANNELS {
            self.channel(channel).halt()?;
        }
        // Mask every interrupt kind for every channel, then acknowledge
        // anything still latched.
        let all = ral::int::RegisterBlock::ALL_CHANNELS;
        let we = all << ral::int::RegisterBlock::MASK_WE_SHIFT;
        self.registers.INT.MASK_TFR.write(we);
        self.registers.INT.MASK_BLOCK.write(we);
        self.registers.INT.MASK_SRC_TRAN.write(we);
        self.registers.INT.MASK_DST_TRAN.write(we);
        self.registers.INT.MASK_ERR.write(we);
        self.registers.INT.CLEAR_TFR.write(all);
        self.registers.INT.CLEAR_BLOCK.write(all);
        self.registers.INT.CLEAR_SRC_TRAN.write(all);
        self.registers.INT.CLEAR_DST_TRAN.write(all);
        self.registers.INT.CLEAR_ERR.write(all);
        Ok(())
    }

    /// Register handle for `channel`.
    pub(crate) fn channel(&self, channel: usize) -> channel::Channel {
        channel::Channel::new(self.registers, channel)
    }

    /// Lifecycle bookkeeping for `channel`.
    pub(crate) fn state(&self, channel: usize) -> &SharedState {
        &self.states[channel]
    }
}
