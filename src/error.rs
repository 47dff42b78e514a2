use std::fmt;

/// Errors raised by the signal subsystem.
///
/// Redundant transitions (starting an already-running timer, ringing an
/// already-active alarm, toggling noise mid-fade) are benign no-ops and
/// never surface here.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalError {
    /// The audio capability could not be instantiated (denied permission,
    /// unsupported platform). Reported once; later sound calls degrade to
    /// silent no-ops.
    EnvironmentUnavailable { reason: String },
    /// A caller-supplied configuration value was rejected. State unchanged.
    InvalidConfiguration { message: String },
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalError::EnvironmentUnavailable { reason } => {
                write!(f, "Audio environment unavailable: {reason}")
            }
            SignalError::InvalidConfiguration { message } => {
                write!(f, "Invalid configuration: {message}")
            }
        }
    }
}

impl std::error::Error for SignalError {}

impl SignalError {
    /// Shorthand for an `InvalidConfiguration` with a message.
    pub fn invalid(message: impl Into<String>) -> Self {
        SignalError::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Shorthand for an `EnvironmentUnavailable` with a reason.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        SignalError::EnvironmentUnavailable {
            reason: reason.into(),
        }
    }
}
