use thiserror::Error;

/// Voicegate's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Voicegate's crate-wide error type.
///
/// The detector only fails on *configuration* problems: an unsupported
/// rate/mode at setup, or a frame whose length doesn't match the configured
/// rate at call time. Audio content is never an error: noisy, clipped, or
/// silent frames produce a (possibly wrong) decision, not a failure.
///
/// This is intentionally decoupled from `anyhow` so downstream libraries
/// aren't forced to adopt `anyhow` in their own public APIs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The requested sample rate or aggressiveness mode is outside the
    /// supported enumerated set. Raised at configuration time only.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// The supplied frame is not 10, 20, or 30 ms long at the configured
    /// sample rate. The detector's internal state is left untouched.
    #[error("frame of {got} samples is not 10, 20 or 30 ms at {rate} Hz")]
    FrameSizeMismatch { got: usize, rate: u32 },
}

impl Error {
    pub(crate) fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}
