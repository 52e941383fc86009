use std::fmt;

use thiserror::Error;

pub const SUCCESS: u32 = 0x0000_0000;

/// Failure kinds a boundary crossing can report, with their wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TeeError {
    #[error("generic error")]
    Generic,
    #[error("bad parameters")]
    BadParameters,
    #[error("bad state")]
    BadState,
    #[error("item not found")]
    ItemNotFound,
    #[error("not supported")]
    NotSupported,
    #[error("out of memory")]
    OutOfMemory,
    #[error("communication error")]
    Communication,
    #[error("unrecognized status")]
    Other(u32),
}

impl TeeError {
    pub const fn code(self) -> u32 {
        match self {
            TeeError::Generic => 0xFFFF_0000,
            TeeError::BadParameters => 0xFFFF_0006,
            TeeError::BadState => 0xFFFF_0007,
            TeeError::ItemNotFound => 0xFFFF_0008,
            TeeError::NotSupported => 0xFFFF_000A,
            TeeError::OutOfMemory => 0xFFFF_000C,
            TeeError::Communication => 0xFFFF_000E,
            TeeError::Other(code) => code,
        }
    }

    /// Maps a non-success status code back to its kind.
    pub const fn from_code(code: u32) -> Self {
        match code {
            0xFFFF_0000 => TeeError::Generic,
            0xFFFF_0006 => TeeError::BadParameters,
            0xFFFF_0007 => TeeError::BadState,
            0xFFFF_0008 => TeeError::ItemNotFound,
            0xFFFF_000A => TeeError::NotSupported,
            0xFFFF_000C => TeeError::OutOfMemory,
            0xFFFF_000E => TeeError::Communication,
            other => TeeError::Other(other),
        }
    }
}

/// Layer that detected a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOrigin {
    /// Normal-world client API
    Api,
    /// Transport between the worlds
    Comms,
    /// Secure-world core (session routing, TA lookup)
    Tee,
    /// The trusted application itself
    TrustedApp,
    Other(u32),
}

impl ErrorOrigin {
    pub const fn raw(self) -> u32 {
        match self {
            ErrorOrigin::Api => 1,
            ErrorOrigin::Comms => 2,
            ErrorOrigin::Tee => 3,
            ErrorOrigin::TrustedApp => 4,
            ErrorOrigin::Other(raw) => raw,
        }
    }

    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            1 => ErrorOrigin::Api,
            2 => ErrorOrigin::Comms,
            3 => ErrorOrigin::Tee,
            4 => ErrorOrigin::TrustedApp,
            other => ErrorOrigin::Other(other),
        }
    }
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorOrigin::Api => f.write_str("client API"),
            ErrorOrigin::Comms => f.write_str("transport"),
            ErrorOrigin::Tee => f.write_str("TEE core"),
            ErrorOrigin::TrustedApp => f.write_str("trusted application"),
            ErrorOrigin::Other(_) => f.write_str("unknown layer"),
        }
    }
}

/// Status plus origin, as returned by a failed session open or invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvokeError {
    pub error: TeeError,
    pub origin: ErrorOrigin,
}

impl InvokeError {
    pub const fn new(error: TeeError, origin: ErrorOrigin) -> Self {
        Self { error, origin }
    }
}

impl fmt::Display for InvokeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: 0x{:x} origin 0x{:x} ({})",
            self.error,
            self.error.code(),
            self.origin.raw(),
            self.origin
        )
    }
}

impl std::error::Error for InvokeError {}
