use core::fmt;

/// Errors surfaced by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// A byte is already waiting for the transmitter. Wait for `on_ready_to_send`.
    Busy,
    /// Receive buffer was full, the incoming byte has been dropped
    BufferOverrun,
    /// Rejected configuration value
    InvalidConfig(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Busy => write!(f, "transmission already in flight"),
            Error::BufferOverrun => write!(f, "receive buffer overrun"),
            Error::InvalidConfig(what) => write!(f, "invalid configuration: {}", what),
        }
    }
}
