//! DMA channel configuration and transfer staging

use crate::{
    interrupt::Lifecycle,
    ral::{self, int, misc, Static},
    Client, Dma, Error, Result,
};
use core::sync::atomic::{self, Ordering};
use critical_section::CriticalSection;

/// Hardware handshake interfaces are numbered by a 4-bit field.
pub(crate) const HANDSHAKE_INTERFACE_COUNT: u8 = 16;

/// Bounds the drain and disable waits in [`Channel::halt`].
const HALT_RETRIES: usize = 10_000;

// SINC/DINC encodings.
const ADDRESS_INCREMENT: u32 = 0x0;
const ADDRESS_NO_CHANGE: u32 = 0x2;

// HS_SEL_SRC/HS_SEL_DST encodings. Sides that don't talk to a
// peripheral stay on software handshaking so a stray hardware request
// can't drive them.
const HS_SELECT_HARDWARE: u32 = 0;
const HS_SELECT_SOFTWARE: u32 = 1;

/// Register handle for one DMA channel.
///
/// `Channel` only touches registers; lifecycle decisions belong to the
/// [`Dma`] operations that create these handles.
pub(crate) struct Channel {
    /// Our channel number, expected to be between 0 and (CHANNELS - 1)
    index: usize,
    /// Reference to the controller registers
    registers: Static<ral::RegisterBlock>,
}

impl Channel {
    pub(crate) fn new(registers: Static<ral::RegisterBlock>, index: usize) -> Self {
        Channel { index, registers }
    }

    /// Returns a handle to this channel's register file
    fn chan(&self) -> &ral::chan::RegisterBlock {
        &self.registers.CH[self.index]
    }

    /// This channel's bit in the bit-per-channel registers
    fn bit(&self) -> u32 {
        1 << self.index
    }

    /// Program the one-shot transfer shape: no chaining, no reload.
    pub(crate) fn set_single_block(&self) {
        let chan = self.chan();
        ral::write_reg!(crate::ral::chan, chan, LLP, 0);
        ral::modify_reg!(crate::ral::chan, chan, CTL_L, LLP_SRC_EN: 0, LLP_DST_EN: 0);
        ral::modify_reg!(crate::ral::chan, chan, CFG_L, RELOAD_SRC: 0, RELOAD_DST: 0);
    }

    pub(crate) fn set_interrupt_on_completion(&self, intr: bool) {
        let chan = self.chan();
        ral::modify_reg!(crate::ral::chan, chan, CTL_L, INT_EN: intr as u32);
    }

    pub(crate) fn set_transfer_widths(&self, source: TransferWidth, destination: TransferWidth) {
        let chan = self.chan();
        ral::modify_reg!(
            crate::ral::chan,
            chan,
            CTL_L,
            SRC_TR_WIDTH: source as u32,
            DST_TR_WIDTH: destination as u32
        );
    }

    pub(crate) fn set_burst_lengths(&self, source: BurstLength, destination: BurstLength) {
        let chan = self.chan();
        ral::modify_reg!(
            crate::ral::chan,
            chan,
            CTL_L,
            SRC_MSIZE: source as u32,
            DEST_MSIZE: destination as u32
        );
    }

    /// Program the transfer type along with the increment modes and
    /// handshake selects it implies.
    pub(crate) fn set_direction(&self, direction: Direction) {
        let chan = self.chan();
        let (sinc, dinc) = match direction {
            Direction::MemoryToMemory => (ADDRESS_INCREMENT, ADDRESS_INCREMENT),
            Direction::MemoryToPeripheral => (ADDRESS_INCREMENT, ADDRESS_NO_CHANGE),
            Direction::PeripheralToMemory => (ADDRESS_NO_CHANGE, ADDRESS_INCREMENT),
        };
        ral::modify_reg!(
            crate::ral::chan,
            chan,
            CTL_L,
            TT_FC: direction as u32,
            SINC: sinc,
            DINC: dinc
        );
        let (hs_src, hs_dst) = match direction {
            Direction::MemoryToMemory => (HS_SELECT_SOFTWARE, HS_SELECT_SOFTWARE),
            Direction::MemoryToPeripheral => (HS_SELECT_SOFTWARE, HS_SELECT_HARDWARE),
            Direction::PeripheralToMemory => (HS_SELECT_HARDWARE, HS_SELECT_SOFTWARE),
        };
        ral::modify_reg!(crate::ral::chan, chan, CFG_L, HS_SEL_SRC: hs_src, HS_SEL_DST: hs_dst);
    }

    /// Route the peripheral side of the transfer to its handshake
    /// interface. Memory-to-memory transfers have no peripheral side,
    /// so there is nothing to program.
    pub(crate) fn set_handshake(
        &self,
        direction: Direction,
        interface: u8,
        polarity: HandshakePolarity,
    ) {
        let chan = self.chan();
        match direction {
            Direction::MemoryToMemory => {}
            Direction::MemoryToPeripheral => {
                ral::modify_reg!(crate::ral::chan, chan, CFG_H, DEST_PER: interface as u32);
                ral::modify_reg!(crate::ral::chan, chan, CFG_L, DST_HS_POL: polarity as u32);
            }
            Direction::PeripheralToMemory => {
                ral::modify_reg!(crate::ral::chan, chan, CFG_H, SRC_PER: interface as u32);
                ral::modify_reg!(crate::ral::chan, chan, CFG_L, SRC_HS_POL: polarity as u32);
            }
        }
    }

    pub(crate) fn is_memory_to_memory(&self) -> bool {
        let chan = self.chan();
        ral::read_reg!(crate::ral::chan, chan, CTL_L, TT_FC == Direction::MemoryToMemory as u32)
    }

    pub(crate) fn set_source_address(&self, saddr: *const u8) {
        // Immutable write OK. 32-bit store on SAR.
        let chan = self.chan();
        ral::write_reg!(crate::ral::chan, chan, SAR, saddr as u32);
    }

    pub(crate) fn set_destination_address(&self, daddr: *mut u8) {
        // Immutable write OK. 32-bit store on DAR.
        let chan = self.chan();
        ral::write_reg!(crate::ral::chan, chan, DAR, daddr as u32);
    }

    pub(crate) fn set_block_size(&self, items: u32) {
        let chan = self.chan();
        ral::modify_reg!(crate::ral::chan, chan, CTL_H, BLOCK_TS: items);
    }

    /// Items moved so far. Hardware writes the running count back into
    /// the block size field; after completion it holds the full block.
    pub(crate) fn transferred(&self) -> u32 {
        let chan = self.chan();
        ral::read_reg!(crate::ral::chan, chan, CTL_H, BLOCK_TS)
    }

    pub(crate) fn enable(&self) {
        // Immutable write OK. Only the write-enabled bit latches.
        let we = self.bit() << misc::RegisterBlock::CH_EN_WE_SHIFT;
        self.registers.MISC.CH_EN.write(we | self.bit());
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.registers.MISC.CH_EN.read() & self.bit() != 0
    }

    /// Halt the channel: suspend, let the FIFO drain, then drop the
    /// channel enable.
    ///
    /// Dropping enable mid-flight would throw away FIFO contents, so
    /// the drain comes first. On a timeout the channel is left
    /// suspended with enable still set; a retry picks up the drain
    /// where it stopped.
    pub(crate) fn halt(&self) -> Result<()> {
        // A channel that is not enabled is already halted.
        if !self.is_enabled() {
            return Ok(());
        }
        let chan = self.chan();
        ral::modify_reg!(crate::ral::chan, chan, CFG_L, CH_SUSP: 1);
        wait(|| ral::read_reg!(crate::ral::chan, chan, CFG_L, FIFO_EMPTY == 1))?;
        let we = self.bit() << misc::RegisterBlock::CH_EN_WE_SHIFT;
        self.registers.MISC.CH_EN.write(we);
        wait(|| !self.is_enabled())?;
        ral::modify_reg!(crate::ral::chan, chan, CFG_L, CH_SUSP: 0);
        Ok(())
    }

    /// Let this channel's transfer-complete and error interrupts
    /// through the controller mask.
    pub(crate) fn unmask_interrupts(&self) {
        // Immutable write OK. Only the write-enabled bit latches.
        let we = self.bit() << int::RegisterBlock::MASK_WE_SHIFT;
        self.registers.INT.MASK_TFR.write(we | self.bit());
        self.registers.INT.MASK_ERR.write(we | self.bit());
    }

    pub(crate) fn mask_interrupts(&self) {
        // Immutable write OK. Only the write-enabled bit latches.
        let we = self.bit() << int::RegisterBlock::MASK_WE_SHIFT;
        self.registers.INT.MASK_TFR.write(we);
        self.registers.INT.MASK_ERR.write(we);
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.registers.INT.STATUS_TFR.read() & self.bit() != 0
    }

    pub(crate) fn clear_complete(&self) {
        // Immutable write OK. Write-one-to-clear.
        self.registers.INT.CLEAR_TFR.write(self.bit());
    }

    pub(crate) fn is_error(&self) -> bool {
        self.registers.INT.STATUS_ERR.read() & self.bit() != 0
    }

    pub(crate) fn clear_error(&self) {
        // Immutable write OK. Write-one-to-clear.
        self.registers.INT.CLEAR_ERR.write(self.bit());
    }

    /// Acknowledge transfer-complete and error status left over from an
    /// earlier run of this channel.
    pub(crate) fn clear_pending(&self) {
        self.clear_complete();
        self.clear_error();
    }
}

/// Spin until `ready` reports true.
fn wait(mut ready: impl FnMut() -> bool) -> Result<()> {
    for _ in 0..HALT_RETRIES {
        if ready() {
            return Ok(());
        }
    }
    Err(Error::Hardware)
}

impl<const CHANNELS: usize> Dma<CHANNELS> {
    /// Apply `config` to a channel and register its client.
    ///
    /// This needs to happen once before staging transfers on the
    /// channel, and again only to repurpose the channel. Repurposing
    /// replaces the whole configuration, client included; outcomes of
    /// transfers started afterwards go to the new client.
    ///
    /// Returns [`InvalidArgument`](Error::InvalidArgument) if `channel`
    /// is out of range, or if a peripheral direction names a handshake
    /// interface the controller doesn't have. The handshake fields are
    /// ignored for memory-to-memory transfers. Returns
    /// [`InvalidState`](Error::InvalidState) while a transfer is
    /// running; nothing is written to the hardware on any error.
    pub fn configure_channel(&self, channel: usize, config: &ChannelConfig) -> Result<()> {
        if channel >= CHANNELS {
            return Err(Error::InvalidArgument);
        }
        let peripheral = !matches!(config.direction, Direction::MemoryToMemory);
        if peripheral && config.handshake_interface >= HANDSHAKE_INTERFACE_COUNT {
            return Err(Error::InvalidArgument);
        }
        critical_section::with(|cs| {
            let mut state = self.state(channel).borrow_ref_mut(cs);
            if state.lifecycle == Lifecycle::Running {
                return Err(Error::InvalidState);
            }
            let chan = self.channel(channel);
            chan.set_single_block();
            chan.set_interrupt_on_completion(true);
            chan.set_transfer_widths(config.source_width, config.destination_width);
            chan.set_burst_lengths(config.source_burst, config.destination_burst);
            chan.set_direction(config.direction);
            chan.set_handshake(
                config.direction,
                config.handshake_interface,
                config.handshake_polarity,
            );
            state.lifecycle = Lifecycle::Configured;
            state.client = Some(config.client);
            Ok(())
        })
    }

    /// Stage a transfer on a configured channel.
    ///
    /// Programs the source address, destination address, and block
    /// size. A transfer must be staged before every start, even when
    /// all three values are unchanged from the previous transfer.
    ///
    /// Returns [`InvalidArgument`](Error::InvalidArgument) for an
    /// out-of-range channel or block size or a null address, and
    /// [`InvalidState`](Error::InvalidState) if the channel is
    /// unconfigured or running; nothing is written to the hardware on
    /// any error.
    pub fn configure_transfer(&self, channel: usize, transfer: &TransferConfig) -> Result<()> {
        if channel >= CHANNELS {
            return Err(Error::InvalidArgument);
        }
        check_transfer(transfer)?;
        critical_section::with(|cs| self.configure_transfer_in(cs, channel, transfer))
    }

    fn configure_transfer_in(
        &self,
        cs: CriticalSection<'_>,
        channel: usize,
        transfer: &TransferConfig,
    ) -> Result<()> {
        let mut state = self.state(channel).borrow_ref_mut(cs);
        match state.lifecycle {
            Lifecycle::Configured | Lifecycle::TransferReady => {}
            _ => return Err(Error::InvalidState),
        }
        let chan = self.channel(channel);
        chan.set_source_address(transfer.source_address);
        chan.set_destination_address(transfer.destination_address);
        chan.set_block_size(transfer.block_size);
        state.lifecycle = Lifecycle::TransferReady;
        Ok(())
    }

    /// Start the staged transfer.
    ///
    /// Returns as soon as the channel is enabled. The outcome arrives
    /// at the channel's client, exactly once per start: `Ok` from the
    /// completion interrupt, [`Hardware`](Error::Hardware) from the
    /// error interrupt, or [`Terminated`](Error::Terminated) from
    /// [`terminate`](Self::terminate).
    ///
    /// Returns [`InvalidState`](Error::InvalidState) unless a staged
    /// transfer is waiting, so a start without a fresh
    /// [`configure_transfer`](Self::configure_transfer) cannot silently
    /// reuse the previous one.
    ///
    /// # Safety
    ///
    /// The staged source and destination memory must stay valid, and
    /// the destination must not be read or written from this side,
    /// until the client learns that the transfer concluded.
    pub unsafe fn start(&self, channel: usize) -> Result<()> {
        if channel >= CHANNELS {
            return Err(Error::InvalidArgument);
        }
        critical_section::with(|cs| self.start_in(cs, channel))
    }

    fn start_in(&self, cs: CriticalSection<'_>, channel: usize) -> Result<()> {
        let mut state = self.state(channel).borrow_ref_mut(cs);
        if state.lifecycle != Lifecycle::TransferReady {
            return Err(Error::InvalidState);
        }
        let chan = self.channel(channel);
        chan.clear_pending();
        chan.unmask_interrupts();
        atomic::fence(Ordering::SeqCst);
        chan.enable();
        state.lifecycle = Lifecycle::Running;
        Ok(())
    }

    /// Stage and start a memory-to-memory transfer in one call.
    ///
    /// The two steps run in a single critical section, so nothing can
    /// slip a different transfer onto the channel in between.
    ///
    /// Returns [`InvalidState`](Error::InvalidState) if the channel
    /// isn't configured for memory-to-memory, plus everything
    /// [`configure_transfer`](Self::configure_transfer) and
    /// [`start`](Self::start) can return.
    ///
    /// # Safety
    ///
    /// Same contract as [`start`](Self::start).
    pub unsafe fn transfer_mem_to_mem(
        &self,
        channel: usize,
        transfer: &TransferConfig,
    ) -> Result<()> {
        if channel >= CHANNELS {
            return Err(Error::InvalidArgument);
        }
        check_transfer(transfer)?;
        critical_section::with(|cs| {
            if !self.channel(channel).is_memory_to_memory() {
                return Err(Error::InvalidState);
            }
            self.configure_transfer_in(cs, channel, transfer)?;
            self.start_in(cs, channel)
        })
    }
}

fn check_transfer(transfer: &TransferConfig) -> Result<()> {
    if transfer.block_size == 0 || transfer.block_size > TransferConfig::MAX_BLOCK_SIZE {
        return Err(Error::InvalidArgument);
    }
    if transfer.source_address.is_null() || transfer.destination_address.is_null() {
        return Err(Error::InvalidArgument);
    }
    Ok(())
}

/// DMA channel configuration.
///
/// Everything about a channel that outlives a single transfer: the
/// direction, the shape of the bus accesses, the handshake interface
/// for the peripheral side, and the client that hears about outcomes.
#[derive(Clone, Copy)]
pub struct ChannelConfig {
    /// Hardware handshake interface of the peripheral, below 16.
    ///
    /// Ignored for memory-to-memory transfers.
    pub handshake_interface: u8,
    /// Active level of the handshake interface.
    ///
    /// Ignored for memory-to-memory transfers.
    pub handshake_polarity: HandshakePolarity,
    /// Transfer direction.
    pub direction: Direction,
    /// Width of a single source read.
    pub source_width: TransferWidth,
    /// Width of a single destination write.
    pub destination_width: TransferWidth,
    /// Items per source burst transaction.
    pub source_burst: BurstLength,
    /// Items per destination burst transaction.
    pub destination_burst: BurstLength,
    /// Receives the outcome of every transfer started on this channel.
    pub client: &'static dyn Client,
}

/// One staged transfer: a single block, source to destination.
///
/// Transfers are consumed by [`start`](crate::Dma::start); the driver
/// keeps no copy. The addresses are only ever handed to the controller,
/// never dereferenced by the driver.
#[derive(Debug, Clone, Copy)]
pub struct TransferConfig {
    /// Items to move, counted in the source transfer width.
    ///
    /// At least 1, at most [`MAX_BLOCK_SIZE`](Self::MAX_BLOCK_SIZE).
    pub block_size: u32,
    /// Where the controller reads from.
    pub source_address: *const u8,
    /// Where the controller writes to.
    pub destination_address: *mut u8,
}

impl TransferConfig {
    /// Largest block the controller moves in one transfer, limited by
    /// the 12-bit block size field.
    pub const MAX_BLOCK_SIZE: u32 = 4095;
}

/// Transfer direction, as the controller sees it.
///
/// The discriminants are the TT_FC register encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Memory to memory.
    MemoryToMemory = 0,
    /// Memory to peripheral.
    MemoryToPeripheral = 1,
    /// Peripheral to memory.
    PeripheralToMemory = 2,
}

/// Width of a single data item on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferWidth {
    /// 8-bit items.
    Bits8 = 0,
    /// 16-bit items.
    Bits16 = 1,
    /// 32-bit items.
    Bits32 = 2,
    /// 64-bit items.
    Bits64 = 3,
    /// 128-bit items.
    Bits128 = 4,
    /// 256-bit items.
    Bits256 = 5,
}

/// Data items moved per burst transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BurstLength {
    /// 1 item per burst.
    Items1 = 0,
    /// 4 items per burst.
    Items4 = 1,
    /// 8 items per burst.
    Items8 = 2,
    /// 16 items per burst.
    Items16 = 3,
    /// 32 items per burst.
    Items32 = 4,
    /// 64 items per burst.
    Items64 = 5,
    /// 128 items per burst.
    Items128 = 6,
    /// 256 items per burst.
    Items256 = 7,
}

/// Active level of a hardware handshake interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandshakePolarity {
    /// Active high.
    High = 0,
    /// Active low.
    Low = 1,
}
