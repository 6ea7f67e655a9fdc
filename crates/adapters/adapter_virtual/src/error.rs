//! Errors raised by the virtual backend.

use stepwise_domain::error::DomainError;

#[derive(Debug, thiserror::Error)]
pub enum VirtualBackendError {
    /// The pointer was sent outside the virtual screen.
    #[error("position ({x}, {y}) is outside the {width}x{height} screen")]
    OutOfBounds {
        x: u64,
        y: u64,
        width: u64,
        height: u64,
    },

    /// The backend was switched offline.
    #[error("virtual backend is offline")]
    Offline,
}

impl From<VirtualBackendError> for DomainError {
    fn from(err: VirtualBackendError) -> Self {
        Self::Backend(Box::new(err))
    }
}
