//! Driver tests against a controller image in plain memory.
//!
//! The driver reaches its registers through a pointer, so a zeroed
//! block of heap memory stands in for the controller: reads return
//! whatever was last written, and tests poke status bits and progress
//! counts the way hardware would. The `critical-section` std
//! implementation (dev-dependency feature) supplies the locking.

use crate::ral::{self, Static};
use crate::*;

use core::mem::MaybeUninit;
use core::ptr;
use std::sync::Mutex;
use std::vec::Vec;

/// Controller image in plain memory, leaked for the test's lifetime.
fn controller() -> Static<ral::RegisterBlock> {
    // Safety: every register is a plain integer cell, and all-zeroes
    // matches the reset image.
    let image: Box<ral::RegisterBlock> = unsafe { Box::new(MaybeUninit::zeroed().assume_init()) };
    Static(Box::into_raw(image) as *const _)
}

fn harness<const CHANNELS: usize>() -> (Static<ral::RegisterBlock>, Dma<CHANNELS>) {
    let registers = controller();
    // Safety: the image outlives the driver.
    let dma = unsafe { Dma::new(registers.0 as *const ()) };
    (registers, dma)
}

/// Records every outcome it hears.
struct RecordingClient {
    calls: Mutex<Vec<(u32, Result<()>)>>,
}

impl RecordingClient {
    fn leaked() -> &'static RecordingClient {
        Box::leak(Box::new(RecordingClient {
            calls: Mutex::new(Vec::new()),
        }))
    }

    fn calls(&self) -> Vec<(u32, Result<()>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Client for RecordingClient {
    fn transfer_done(&self, length: u32, outcome: Result<()>) {
        self.calls.lock().unwrap().push((length, outcome));
    }
}

#[derive(Default)]
struct RecordingIntc {
    unmasked: Vec<InterruptLine>,
}

impl InterruptController for RecordingIntc {
    fn unmask(&mut self, line: InterruptLine) {
        self.unmasked.push(line);
    }
    fn mask(&mut self, _: InterruptLine) {}
}

fn memory_config(client: &'static dyn Client) -> ChannelConfig {
    ChannelConfig {
        handshake_interface: 0,
        handshake_polarity: HandshakePolarity::High,
        direction: Direction::MemoryToMemory,
        source_width: TransferWidth::Bits32,
        destination_width: TransferWidth::Bits32,
        source_burst: BurstLength::Items4,
        destination_burst: BurstLength::Items4,
        client,
    }
}

fn block_of(block_size: u32) -> TransferConfig {
    TransferConfig {
        block_size,
        source_address: 0x1000 as *const u8,
        destination_address: 0x2000 as *mut u8,
    }
}

/// Raise the channel's transfer-complete status, raw and masked, the
/// way hardware does when the block finishes.
fn raise_complete(registers: Static<ral::RegisterBlock>, channel: usize) {
    let bit = 1u32 << channel;
    registers.INT.RAW_TFR.write(registers.INT.RAW_TFR.read() | bit);
    registers
        .INT
        .STATUS_TFR
        .write(registers.INT.STATUS_TFR.read() | bit);
}

/// Raise the channel's error status, raw and masked.
fn raise_error(registers: Static<ral::RegisterBlock>, channel: usize) {
    let bit = 1u32 << channel;
    registers.INT.RAW_ERR.write(registers.INT.RAW_ERR.read() | bit);
    registers
        .INT
        .STATUS_ERR
        .write(registers.INT.STATUS_ERR.read() | bit);
}

/// Mark the channel's FIFO drained so a halt can finish.
fn drain_fifo(registers: Static<ral::RegisterBlock>, channel: usize) {
    let chan = &registers.CH[channel];
    ral::modify_reg!(crate::ral::chan, chan, CFG_L, FIFO_EMPTY: 1);
}

/// Set the hardware's progress count for the channel.
fn report_progress(registers: Static<ral::RegisterBlock>, channel: usize, items: u32) {
    let chan = &registers.CH[channel];
    ral::modify_reg!(crate::ral::chan, chan, CTL_H, BLOCK_TS: items);
}

#[test]
fn init_resets_controller_and_unmasks_lines() {
    let (registers, dma) = harness::<2>();
    let mut intc = RecordingIntc::default();

    dma.init(&mut intc).unwrap();

    assert_eq!(
        intc.unmasked,
        vec![
            InterruptLine::Channel(0),
            InterruptLine::Channel(1),
            InterruptLine::Error,
        ]
    );
    assert_eq!(
        registers.MISC.CFG.read(),
        ral::misc::RegisterBlock::DMA_EN
    );
    // All five interrupt kinds acknowledged for every channel.
    assert_eq!(registers.INT.CLEAR_TFR.read(), 0xff);
    assert_eq!(registers.INT.CLEAR_BLOCK.read(), 0xff);
    assert_eq!(registers.INT.CLEAR_SRC_TRAN.read(), 0xff);
    assert_eq!(registers.INT.CLEAR_DST_TRAN.read(), 0xff);
    assert_eq!(registers.INT.CLEAR_ERR.read(), 0xff);
}

#[test]
fn init_runs_once() {
    let (_registers, dma) = harness::<2>();
    let mut intc = RecordingIntc::default();

    dma.init(&mut intc).unwrap();
    assert_eq!(dma.init(&mut intc), Err(Error::InvalidState));
    // The rejected call didn't unmask anything twice.
    assert_eq!(intc.unmasked.len(), 3);
}

#[test]
fn channel_number_is_validated_everywhere() {
    let (_registers, dma) = harness::<2>();
    let client = RecordingClient::leaked();

    assert_eq!(
        dma.configure_channel(2, &memory_config(client)),
        Err(Error::InvalidArgument)
    );
    assert_eq!(
        dma.configure_transfer(2, &block_of(1)),
        Err(Error::InvalidArgument)
    );
    assert_eq!(unsafe { dma.start(2) }, Err(Error::InvalidArgument));
    assert_eq!(dma.terminate(2), Err(Error::InvalidArgument));
    assert_eq!(
        unsafe { dma.transfer_mem_to_mem(2, &block_of(1)) },
        Err(Error::InvalidArgument)
    );
}

#[test]
fn staging_requires_configuration() {
    let (_registers, dma) = harness::<2>();

    assert_eq!(
        dma.configure_transfer(0, &block_of(64)),
        Err(Error::InvalidState)
    );
}

#[test]
fn start_requires_a_staged_transfer() {
    let (registers, dma) = harness::<2>();
    let client = RecordingClient::leaked();

    dma.configure_channel(0, &memory_config(client)).unwrap();
    assert_eq!(unsafe { dma.start(0) }, Err(Error::InvalidState));
    // The channel was never enabled.
    assert_eq!(registers.MISC.CH_EN.read(), 0);
}

#[test]
fn start_consumes_the_staged_transfer() {
    let (registers, dma) = harness::<2>();
    let client = RecordingClient::leaked();

    dma.configure_channel(0, &memory_config(client)).unwrap();
    dma.configure_transfer(0, &block_of(100)).unwrap();
    unsafe { dma.start(0) }.unwrap();
    raise_complete(registers, 0);
    dma.on_interrupt(0);
    assert_eq!(client.calls(), vec![(100, Ok(()))]);

    // The old staging is spent; a second start needs a fresh one.
    assert_eq!(unsafe { dma.start(0) }, Err(Error::InvalidState));
    dma.configure_transfer(0, &block_of(100)).unwrap();
    unsafe { dma.start(0) }.unwrap();
}

#[test]
fn block_size_limits() {
    let (registers, dma) = harness::<2>();
    let client = RecordingClient::leaked();

    dma.configure_channel(0, &memory_config(client)).unwrap();
    assert_eq!(
        dma.configure_transfer(0, &block_of(0)),
        Err(Error::InvalidArgument)
    );
    assert_eq!(
        dma.configure_transfer(0, &block_of(4096)),
        Err(Error::InvalidArgument)
    );
    // Rejected stagings wrote nothing.
    assert_eq!(registers.CH[0].SAR.read(), 0);
    assert_eq!(registers.CH[0].DAR.read(), 0);

    dma.configure_transfer(0, &block_of(1)).unwrap();
    dma.configure_transfer(0, &block_of(4095)).unwrap();
    let chan = &registers.CH[0];
    assert_eq!(
        ral::read_reg!(crate::ral::chan, chan, CTL_H, BLOCK_TS),
        4095
    );
}

#[test]
fn null_addresses_are_rejected() {
    let (_registers, dma) = harness::<2>();
    let client = RecordingClient::leaked();

    dma.configure_channel(0, &memory_config(client)).unwrap();

    let mut transfer = block_of(64);
    transfer.source_address = ptr::null();
    assert_eq!(
        dma.configure_transfer(0, &transfer),
        Err(Error::InvalidArgument)
    );

    let mut transfer = block_of(64);
    transfer.destination_address = ptr::null_mut();
    assert_eq!(
        dma.configure_transfer(0, &transfer),
        Err(Error::InvalidArgument)
    );
}

#[test]
fn mem_to_mem_programs_the_channel() {
    let (registers, dma) = harness::<2>();
    let client = RecordingClient::leaked();

    dma.configure_channel(0, &memory_config(client)).unwrap();
    unsafe { dma.transfer_mem_to_mem(0, &block_of(100)) }.unwrap();

    let chan = &registers.CH[0];
    assert_eq!(ral::read_reg!(crate::ral::chan, chan, SAR), 0x1000);
    assert_eq!(ral::read_reg!(crate::ral::chan, chan, DAR), 0x2000);
    assert_eq!(ral::read_reg!(crate::ral::chan, chan, LLP), 0);
    assert_eq!(ral::read_reg!(crate::ral::chan, chan, CTL_H, BLOCK_TS), 100);

    let (int_en, src_width, dst_width, src_burst, dst_burst) = ral::read_reg!(
        crate::ral::chan,
        chan,
        CTL_L,
        INT_EN,
        SRC_TR_WIDTH,
        DST_TR_WIDTH,
        SRC_MSIZE,
        DEST_MSIZE
    );
    assert_eq!(int_en, 1);
    assert_eq!(src_width, TransferWidth::Bits32 as u32);
    assert_eq!(dst_width, TransferWidth::Bits32 as u32);
    assert_eq!(src_burst, BurstLength::Items4 as u32);
    assert_eq!(dst_burst, BurstLength::Items4 as u32);

    let (tt_fc, sinc, dinc) =
        ral::read_reg!(crate::ral::chan, chan, CTL_L, TT_FC, SINC, DINC);
    assert_eq!(tt_fc, 0);
    // Both sides increment through memory.
    assert_eq!(sinc, 0);
    assert_eq!(dinc, 0);

    // Neither side uses hardware handshaking.
    let (hs_src, hs_dst) =
        ral::read_reg!(crate::ral::chan, chan, CFG_L, HS_SEL_SRC, HS_SEL_DST);
    assert_eq!(hs_src, 1);
    assert_eq!(hs_dst, 1);

    // Channel 0 enabled through its write-enable bit.
    assert_eq!(registers.MISC.CH_EN.read(), 0x101);
    // Complete and error interrupts unmasked for channel 0.
    assert_eq!(registers.INT.MASK_TFR.read(), 0x101);
    assert_eq!(registers.INT.MASK_ERR.read(), 0x101);

    raise_complete(registers, 0);
    dma.on_interrupt(0);
    assert_eq!(client.calls(), vec![(100, Ok(()))]);
}

#[test]
fn mem_to_mem_requires_a_memory_direction() {
    let (registers, dma) = harness::<2>();
    let client = RecordingClient::leaked();

    let mut config = memory_config(client);
    config.direction = Direction::PeripheralToMemory;
    config.handshake_interface = 1;
    dma.configure_channel(0, &config).unwrap();

    assert_eq!(
        unsafe { dma.transfer_mem_to_mem(0, &block_of(64)) },
        Err(Error::InvalidState)
    );
    assert_eq!(registers.MISC.CH_EN.read(), 0);
}

#[test]
fn completion_callback_fires_exactly_once() {
    let (registers, dma) = harness::<2>();
    let client = RecordingClient::leaked();

    dma.configure_channel(0, &memory_config(client)).unwrap();
    unsafe { dma.transfer_mem_to_mem(0, &block_of(100)) }.unwrap();
    raise_complete(registers, 0);
    dma.on_interrupt(0);
    assert_eq!(client.calls(), vec![(100, Ok(()))]);

    // A replayed interrupt with status still latched in the image is
    // ignored: the transfer was already claimed.
    dma.on_interrupt(0);
    assert_eq!(client.calls().len(), 1);

    // So is a terminate arriving after the fact.
    assert_eq!(dma.terminate(0), Err(Error::InvalidState));
    assert_eq!(client.calls().len(), 1);
}

#[test]
fn spurious_interrupt_is_ignored() {
    let (registers, dma) = harness::<2>();
    let client = RecordingClient::leaked();

    dma.configure_channel(0, &memory_config(client)).unwrap();
    unsafe { dma.transfer_mem_to_mem(0, &block_of(100)) }.unwrap();

    // No pending status: the handler leaves the running transfer alone.
    dma.on_interrupt(0);
    assert!(client.calls().is_empty());

    // The transfer is still claimable by a real completion.
    raise_complete(registers, 0);
    dma.on_interrupt(0);
    assert_eq!(client.calls(), vec![(100, Ok(()))]);
}

#[test]
fn terminate_reports_progress_at_the_stop() {
    let (registers, dma) = harness::<2>();
    let client = RecordingClient::leaked();

    dma.configure_channel(0, &memory_config(client)).unwrap();
    unsafe { dma.transfer_mem_to_mem(0, &block_of(100)) }.unwrap();

    // 40 of 100 items moved when the caller pulls the plug.
    report_progress(registers, 0, 40);
    drain_fifo(registers, 0);
    dma.terminate(0).unwrap();

    assert_eq!(client.calls(), vec![(40, Err(Error::Terminated))]);
    // Halted and unsuspended.
    assert_eq!(registers.MISC.CH_EN.read() & 1, 0);
    let chan = &registers.CH[0];
    assert_eq!(ral::read_reg!(crate::ral::chan, chan, CFG_L, CH_SUSP), 0);

    // Late completion status is ignored; the channel stages anew.
    raise_complete(registers, 0);
    dma.on_interrupt(0);
    assert_eq!(client.calls().len(), 1);
    dma.configure_transfer(0, &block_of(10)).unwrap();
    unsafe { dma.start(0) }.unwrap();
}

#[test]
fn terminate_requires_a_running_transfer() {
    let (_registers, dma) = harness::<2>();
    let client = RecordingClient::leaked();

    assert_eq!(dma.terminate(0), Err(Error::InvalidState));
    dma.configure_channel(0, &memory_config(client)).unwrap();
    assert_eq!(dma.terminate(0), Err(Error::InvalidState));
    dma.configure_transfer(0, &block_of(64)).unwrap();
    assert_eq!(dma.terminate(0), Err(Error::InvalidState));
    assert!(client.calls().is_empty());
}

#[test]
fn terminate_backs_off_when_the_channel_will_not_halt() {
    let (registers, dma) = harness::<2>();
    let client = RecordingClient::leaked();

    dma.configure_channel(0, &memory_config(client)).unwrap();
    unsafe { dma.transfer_mem_to_mem(0, &block_of(100)) }.unwrap();

    // The FIFO never drains, so the halt times out.
    assert_eq!(dma.terminate(0), Err(Error::Hardware));
    assert!(client.calls().is_empty());

    // The transfer still counts as running: its completion is
    // delivered as usual.
    raise_complete(registers, 0);
    dma.on_interrupt(0);
    assert_eq!(client.calls(), vec![(100, Ok(()))]);
}

#[test]
fn error_interrupt_reports_hardware_failure() {
    let (registers, dma) = harness::<2>();
    let client = RecordingClient::leaked();

    dma.configure_channel(0, &memory_config(client)).unwrap();
    unsafe { dma.transfer_mem_to_mem(0, &block_of(100)) }.unwrap();

    // Fault after 25 items.
    report_progress(registers, 0, 25);
    drain_fifo(registers, 0);
    raise_error(registers, 0);
    dma.on_error();

    assert_eq!(client.calls(), vec![(25, Err(Error::Hardware))]);
    // The faulted channel was halted.
    assert_eq!(registers.MISC.CH_EN.read() & 1, 0);

    // Replay delivers nothing more.
    dma.on_error();
    assert_eq!(client.calls().len(), 1);

    // The channel is configured and usable again.
    dma.configure_transfer(0, &block_of(10)).unwrap();
    unsafe { dma.start(0) }.unwrap();
}

#[test]
fn reconfiguring_replaces_the_client() {
    let (registers, dma) = harness::<2>();
    let first = RecordingClient::leaked();
    let second = RecordingClient::leaked();

    dma.configure_channel(0, &memory_config(first)).unwrap();
    dma.configure_channel(0, &memory_config(second)).unwrap();
    unsafe { dma.transfer_mem_to_mem(0, &block_of(100)) }.unwrap();
    raise_complete(registers, 0);
    dma.on_interrupt(0);

    assert!(first.calls().is_empty());
    assert_eq!(second.calls(), vec![(100, Ok(()))]);
}

#[test]
fn reconfiguring_a_running_channel_is_refused() {
    let (_registers, dma) = harness::<2>();
    let client = RecordingClient::leaked();

    dma.configure_channel(0, &memory_config(client)).unwrap();
    unsafe { dma.transfer_mem_to_mem(0, &block_of(100)) }.unwrap();
    assert_eq!(
        dma.configure_channel(0, &memory_config(client)),
        Err(Error::InvalidState)
    );
}

#[test]
fn reconfiguring_discards_a_staged_transfer() {
    let (_registers, dma) = harness::<2>();
    let client = RecordingClient::leaked();

    dma.configure_channel(0, &memory_config(client)).unwrap();
    dma.configure_transfer(0, &block_of(64)).unwrap();
    // Repurposing from the staged state is allowed, and costs the
    // staging.
    dma.configure_channel(0, &memory_config(client)).unwrap();
    assert_eq!(unsafe { dma.start(0) }, Err(Error::InvalidState));
}

#[test]
fn handshake_interface_is_validated_for_peripheral_directions() {
    let (_registers, dma) = harness::<2>();
    let client = RecordingClient::leaked();

    let mut config = memory_config(client);
    config.direction = Direction::MemoryToPeripheral;
    config.handshake_interface = 16;
    assert_eq!(
        dma.configure_channel(0, &config),
        Err(Error::InvalidArgument)
    );

    // The same number is ignored for memory-to-memory.
    config.direction = Direction::MemoryToMemory;
    dma.configure_channel(0, &config).unwrap();
}

#[test]
fn peripheral_to_memory_programs_the_handshake() {
    let (registers, dma) = harness::<2>();
    let client = RecordingClient::leaked();

    let mut config = memory_config(client);
    config.direction = Direction::PeripheralToMemory;
    config.handshake_interface = 3;
    config.handshake_polarity = HandshakePolarity::Low;
    dma.configure_channel(0, &config).unwrap();

    let chan = &registers.CH[0];
    let (tt_fc, sinc, dinc) =
        ral::read_reg!(crate::ral::chan, chan, CTL_L, TT_FC, SINC, DINC);
    assert_eq!(tt_fc, 2);
    // The peripheral side holds its address; memory increments.
    assert_eq!(sinc, 2);
    assert_eq!(dinc, 0);

    let (hs_src, hs_dst, src_pol) =
        ral::read_reg!(crate::ral::chan, chan, CFG_L, HS_SEL_SRC, HS_SEL_DST, SRC_HS_POL);
    assert_eq!(hs_src, 0);
    assert_eq!(hs_dst, 1);
    assert_eq!(src_pol, 1);
    assert_eq!(ral::read_reg!(crate::ral::chan, chan, CFG_H, SRC_PER), 3);
}

#[test]
fn memory_to_peripheral_programs_the_handshake() {
    let (registers, dma) = harness::<2>();
    let client = RecordingClient::leaked();

    let mut config = memory_config(client);
    config.direction = Direction::MemoryToPeripheral;
    config.handshake_interface = 5;
    dma.configure_channel(1, &config).unwrap();

    let chan = &registers.CH[1];
    let (tt_fc, sinc, dinc) =
        ral::read_reg!(crate::ral::chan, chan, CTL_L, TT_FC, SINC, DINC);
    assert_eq!(tt_fc, 1);
    assert_eq!(sinc, 0);
    assert_eq!(dinc, 2);

    let (hs_src, hs_dst, dst_pol) =
        ral::read_reg!(crate::ral::chan, chan, CFG_L, HS_SEL_SRC, HS_SEL_DST, DST_HS_POL);
    assert_eq!(hs_src, 1);
    assert_eq!(hs_dst, 0);
    assert_eq!(dst_pol, 0);
    assert_eq!(ral::read_reg!(crate::ral::chan, chan, CFG_H, DEST_PER), 5);
}

#[test]
fn channels_keep_separate_lifecycles() {
    let (registers, dma) = harness::<2>();
    let zero = RecordingClient::leaked();
    let one = RecordingClient::leaked();

    dma.configure_channel(0, &memory_config(zero)).unwrap();
    dma.configure_channel(1, &memory_config(one)).unwrap();
    unsafe { dma.transfer_mem_to_mem(0, &block_of(100)) }.unwrap();

    // Channel 1 has nothing staged, running or not.
    assert_eq!(unsafe { dma.start(1) }, Err(Error::InvalidState));
    assert_eq!(dma.terminate(1), Err(Error::InvalidState));

    raise_complete(registers, 0);
    dma.on_interrupt(0);
    assert_eq!(zero.calls(), vec![(100, Ok(()))]);
    assert!(one.calls().is_empty());
}
