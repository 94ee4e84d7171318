//! Error types for the Galaxy3D visibility subsystem
//!
//! Scene-build errors (`CapacityExceeded`, `ColorCollision`, `UnmappedInstance`)
//! are fatal to the build that raised them. Per-cycle errors
//! (`OutOfOrderDecode`, `WorkerDisconnected`) only drop the cycle in flight.

use std::fmt;
use crate::color::ColorCode;
use crate::decode::PassKind;
use crate::fragment::FragmentId;

/// Result type for visibility operations
pub type Result<T> = std::result::Result<T, Error>;

/// Visibility subsystem errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Failure reported by the rendering engine backend
    BackendError(String),

    /// Invalid input resource (zero-sized target, mis-sized pixel buffer, ...)
    InvalidResource(String),

    /// Initialization failed (bad configuration, worker thread spawn)
    InitializationFailed(String),

    /// The color code space is exhausted
    CapacityExceeded {
        /// Number of usable codes in the color space
        capacity: u32,
    },

    /// A color code was registered twice, or the background code was registered
    ColorCollision {
        /// The offending code
        code: ColorCode,
        /// Fragment already owning the code (None for the background code)
        existing: Option<FragmentId>,
    },

    /// An instance key has no fragment in the scene-build mapping
    UnmappedInstance(u32),

    /// A decode result arrived for a pass the tracker was not waiting for
    OutOfOrderDecode {
        /// Pass the tracker expected next
        expected: PassKind,
        /// Pass that actually arrived
        received: PassKind,
    },

    /// The pixel decoder worker is gone
    WorkerDisconnected,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::CapacityExceeded { capacity } => {
                write!(f, "Color capacity exceeded: {} codes available", capacity)
            }
            Error::ColorCollision { code, existing: Some(existing) } => {
                write!(f, "Color collision: {} already mapped to fragment {}", code, existing)
            }
            Error::ColorCollision { code, existing: None } => {
                write!(f, "Color collision: {} is the background code", code)
            }
            Error::UnmappedInstance(key) => {
                write!(f, "Instance {} has no fragment mapping", key)
            }
            Error::OutOfOrderDecode { expected, received } => {
                write!(f, "Out of order decode: expected {:?} pass, received {:?} pass", expected, received)
            }
            Error::WorkerDisconnected => write!(f, "Pixel decoder worker disconnected"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
