//! Application-level error type.
//!
//! Library modules return their own error enums (`StatsError`, `NumericError`);
//! at the binary boundary everything is folded into [`AppError`], which carries
//! the process exit code:
//!
//! - `2`: invalid input, configuration, or I/O failure
//! - `3`: not enough data for the requested computation
//! - `4`: numerical failure (solver did not converge, singular system, ...)

use crate::math::NumericError;
use crate::stats::StatsError;

pub const EXIT_INVALID_INPUT: u8 = 2;
pub const EXIT_INSUFFICIENT_DATA: u8 = 3;
pub const EXIT_NUMERICAL: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(EXIT_INVALID_INPUT, message)
    }

    /// File or terminal I/O failure; shares the invalid-input exit code.
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(EXIT_INVALID_INPUT, message)
    }

    pub fn insufficient_data(message: impl Into<String>) -> Self {
        Self::new(EXIT_INSUFFICIENT_DATA, message)
    }

    pub fn numerical(message: impl Into<String>) -> Self {
        Self::new(EXIT_NUMERICAL, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<StatsError> for AppError {
    fn from(err: StatsError) -> Self {
        let code = match err {
            StatsError::InsufficientData { .. } | StatsError::TooFewObservations { .. } => {
                EXIT_INSUFFICIENT_DATA
            }
            StatsError::Distribution(_) => EXIT_NUMERICAL,
            _ => EXIT_INVALID_INPUT,
        };
        AppError::new(code, err.to_string())
    }
}

impl From<NumericError> for AppError {
    fn from(err: NumericError) -> Self {
        let code = match err {
            NumericError::InvalidBracket { .. }
            | NumericError::InvalidKnots(_)
            | NumericError::LengthMismatch { .. } => EXIT_INVALID_INPUT,
            NumericError::TooFewPoints { .. } => EXIT_INSUFFICIENT_DATA,
            _ => EXIT_NUMERICAL,
        };
        AppError::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_errors_map_to_exit_codes() {
        let nesting: AppError = StatsError::InvalidNesting {
            dof_simple: 2,
            dof_rich: 2,
        }
        .into();
        assert_eq!(nesting.exit_code(), EXIT_INVALID_INPUT);

        let data: AppError = StatsError::InsufficientData {
            n_observations: 3,
            dof_rich: 3,
        }
        .into();
        assert_eq!(data.exit_code(), EXIT_INSUFFICIENT_DATA);
        assert!(data.message().contains("n_observations=3"));
    }

    #[test]
    fn io_failures_are_not_numerical() {
        let err = AppError::io("Event read error: broken pipe");
        assert_eq!(err.exit_code(), EXIT_INVALID_INPUT);
        assert_ne!(err.exit_code(), AppError::numerical("x").exit_code());
    }

    #[test]
    fn numeric_errors_map_to_exit_codes() {
        let err: AppError = NumericError::MaxIterations { iterations: 10 }.into();
        assert_eq!(err.exit_code(), EXIT_NUMERICAL);
        let err: AppError = NumericError::InvalidBracket { a: 1.0, b: 0.0 }.into();
        assert_eq!(err.exit_code(), EXIT_INVALID_INPUT);
    }
}
