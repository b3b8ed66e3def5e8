//! DMA error reporting

use core::fmt::{self, Display};

/// Ways a DMA operation can go wrong.
///
/// Operations return these synchronously for caller mistakes, and the
/// channel's [`Client`](crate::Client) receives them asynchronously for
/// outcomes the hardware decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// An argument is outside what the controller supports: a channel
    /// number this instance does not have, a block size beyond the
    /// 12-bit limit, a null address, or a handshake interface beyond
    /// the 4-bit limit.
    InvalidArgument,
    /// The operation does not fit the channel's position in its
    /// configure / stage / start lifecycle. Starting without a staged
    /// transfer and terminating an idle channel both land here.
    InvalidState,
    /// The controller reported a transfer error, or a channel refused
    /// to halt when asked.
    Hardware,
    /// The transfer was stopped by [`terminate`](crate::Dma::terminate)
    /// before it ran to completion.
    Terminated,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument => f.write_str("invalid argument"),
            Error::InvalidState => f.write_str("invalid channel state"),
            Error::Hardware => f.write_str("hardware error"),
            Error::Terminated => f.write_str("transfer terminated"),
        }
    }
}
