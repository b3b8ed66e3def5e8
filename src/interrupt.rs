//! DMA interrupt support
//!
//! A started transfer concludes exactly once: through the completion
//! interrupt, the shared error interrupt, or a manual terminate.
//! Whichever path runs first claims the transfer by moving the channel
//! lifecycle out of `Running` inside a critical section; the losers see
//! the moved lifecycle and back off. Client callbacks always run
//! outside the critical section.

use crate::{Dma, Error, Result};
use core::cell::RefCell;
use critical_section::Mutex;

/// Receives the outcomes of DMA transfers.
///
/// One client is registered per channel as part of
/// [`configure_channel`](crate::Dma::configure_channel), and hears
/// about every transfer started on that channel afterwards. The trait
/// object carries whatever context the client needs; the driver never
/// inspects it.
///
/// Closures implement `Client`, so simple consumers don't need a type:
///
/// ```
/// use quark_dma::Client;
///
/// static DONE: fn(u32, quark_dma::Result<()>) = |_length, _outcome| {
///     // hand the outcome to the application
/// };
/// let client: &'static dyn Client = &DONE;
/// ```
pub trait Client: Sync {
    /// Called exactly once per started transfer.
    ///
    /// `length` is the number of items the controller moved, in units
    /// of the source transfer width. `outcome` is `Ok(())` for a
    /// completed transfer, [`Hardware`](Error::Hardware) when the
    /// controller flagged an error, or
    /// [`Terminated`](Error::Terminated) when the transfer was stopped
    /// by hand.
    ///
    /// Runs in interrupt context for the first two outcomes, and in the
    /// caller of [`terminate`](crate::Dma::terminate) for the third.
    /// Keep it short.
    fn transfer_done(&self, length: u32, outcome: Result<()>);
}

impl<F> Client for F
where
    F: Fn(u32, Result<()>) + Sync,
{
    fn transfer_done(&self, length: u32, outcome: Result<()>) {
        self(length, outcome)
    }
}

/// System interrupt lines raised by the DMA controller.
///
/// Quark parts route one transfer-complete line per channel, plus a
/// single error line shared by all channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptLine {
    /// Transfer complete on one channel.
    Channel(usize),
    /// Error on any channel.
    Error,
}

/// Masks and unmasks DMA interrupt lines at the system level.
///
/// Implemented by the platform's interrupt controller glue and handed
/// to [`init`](crate::Dma::init), which unmasks every line the driver
/// services. Routing each line's vector to
/// [`on_interrupt`](crate::Dma::on_interrupt) or
/// [`on_error`](crate::Dma::on_error) stays the platform's job.
pub trait InterruptController {
    /// Let `line` reach its service routine.
    fn unmask(&mut self, line: InterruptLine);
    /// Keep `line` from reaching its service routine.
    fn mask(&mut self, line: InterruptLine);
}

/// Where a channel sits between configuration and completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lifecycle {
    /// Never configured.
    Unconfigured,
    /// Configured, no transfer staged.
    Configured,
    /// A staged transfer is waiting for start.
    TransferReady,
    /// A started transfer has not concluded yet.
    Running,
}

/// Per-channel bookkeeping shared with interrupt context.
pub(crate) struct ChannelState {
    pub(crate) lifecycle: Lifecycle,
    pub(crate) client: Option<&'static dyn Client>,
}

pub(crate) type SharedState = Mutex<RefCell<ChannelState>>;
pub(crate) const UNCONFIGURED: SharedState = Mutex::new(RefCell::new(ChannelState {
    lifecycle: Lifecycle::Unconfigured,
    client: None,
}));

impl<const CHANNELS: usize> Dma<CHANNELS> {
    /// Handle a channel's transfer-complete interrupt.
    ///
    /// Call this from the service routine of the channel's
    /// transfer-complete line:
    ///
    /// ```
    /// use quark_dma::Dma;
    /// # const DMA_BASE: *const () = core::ptr::null();
    ///
    /// // Safety: base address and channel count fit the target part.
    /// static DMA: Dma<2> = unsafe { Dma::new(DMA_BASE) };
    ///
    /// // Wired to the channel 0 complete vector by the platform.
    /// fn dma_0_isr_0() {
    ///     DMA.on_interrupt(0);
    /// }
    /// ```
    ///
    /// A call with no pending completion status returns without any
    /// effect, so spurious and replayed interrupts are harmless.
    ///
    /// # Panics
    ///
    /// Panics if `channel` is out of range: an interrupt vector wired
    /// to a channel the instance doesn't have is a build mistake, not
    /// a runtime condition.
    pub fn on_interrupt(&self, channel: usize) {
        assert!(channel < CHANNELS);
        let chan = self.channel(channel);
        if !chan.is_complete() {
            return;
        }
        let transferred = chan.transferred();
        let client = critical_section::with(|cs| {
            let mut state = self.state(channel).borrow_ref_mut(cs);
            chan.clear_complete();
            chan.mask_interrupts();
            if state.lifecycle != Lifecycle::Running {
                // Terminate or the error path already claimed this
                // transfer.
                return None;
            }
            state.lifecycle = Lifecycle::Configured;
            state.client
        });
        if let Some(client) = client {
            client.transfer_done(transferred, Ok(()));
        }
    }

    /// Handle the controller's shared error interrupt.
    ///
    /// Every channel with pending error status is halted, claimed, and
    /// reported to its client as [`Hardware`](Error::Hardware), with
    /// the item count the controller managed before the fault. Call
    /// this from the error line's service routine:
    ///
    /// ```
    /// use quark_dma::Dma;
    /// # const DMA_BASE: *const () = core::ptr::null();
    ///
    /// // Safety: base address and channel count fit the target part.
    /// static DMA: Dma<2> = unsafe { Dma::new(DMA_BASE) };
    ///
    /// // Wired to the dma error vector by the platform.
    /// fn dma_0_error_isr() {
    ///     DMA.on_error();
    /// }
    /// ```
    pub fn on_error(&self) {
        for channel in 0..CHANNELS {
            let chan = self.channel(channel);
            if !chan.is_error() {
                continue;
            }
            // The channel faulted mid-transfer; stop it before telling
            // anyone. If it refuses to halt there is nothing more this
            // handler can do, and the client hears about the fault
            // either way.
            let _ = chan.halt();
            let transferred = chan.transferred();
            let client = critical_section::with(|cs| {
                let mut state = self.state(channel).borrow_ref_mut(cs);
                chan.clear_error();
                chan.mask_interrupts();
                if state.lifecycle != Lifecycle::Running {
                    return None;
                }
                state.lifecycle = Lifecycle::Configured;
                state.client
            });
            if let Some(client) = client {
                client.transfer_done(transferred, Err(Error::Hardware));
            }
        }
    }

    /// Stop a running transfer by hand.
    ///
    /// Meant for transfers whose completion callback never arrived.
    /// The channel is suspended, drained, and disabled, then the client
    /// receives [`Terminated`](Error::Terminated) with the item count
    /// at the moment of the stop. That callback is the one callback for
    /// the start, and it runs in this caller's context, before
    /// `terminate` returns. Afterwards the channel keeps its
    /// configuration and can stage new transfers.
    ///
    /// Returns [`InvalidState`](Error::InvalidState) if no transfer is
    /// running, with no callback. Returns
    /// [`Hardware`](Error::Hardware) if the channel refuses to halt; in
    /// that case the transfer still counts as running, no callback
    /// fires, and the call may be retried.
    pub fn terminate(&self, channel: usize) -> Result<()> {
        if channel >= CHANNELS {
            return Err(Error::InvalidArgument);
        }
        let chan = self.channel(channel);
        // Claim the transfer and mute the channel's interrupts first,
        // so a completion racing this call can't reach the client too.
        let client = critical_section::with(|cs| {
            let mut state = self.state(channel).borrow_ref_mut(cs);
            if state.lifecycle != Lifecycle::Running {
                return Err(Error::InvalidState);
            }
            chan.mask_interrupts();
            state.lifecycle = Lifecycle::Configured;
            Ok(state.client)
        })?;

        // The halt spins on the FIFO drain, so it stays outside the
        // critical section.
        if let Err(halt) = chan.halt() {
            // The channel would not stop; the transfer is still live.
            // Hand the claim back so the interrupt paths work again and
            // the caller can retry.
            critical_section::with(|cs| {
                let mut state = self.state(channel).borrow_ref_mut(cs);
                state.lifecycle = Lifecycle::Running;
                chan.unmask_interrupts();
            });
            return Err(halt);
        }

        let transferred = chan.transferred();
        chan.clear_pending();
        if let Some(client) = client {
            client.transfer_done(transferred, Err(Error::Terminated));
        }
        Ok(())
    }
}
