//! Failure modes of the numerical solvers.

pub type NumericResult<T> = Result<T, NumericError>;

#[derive(Debug, Clone, PartialEq)]
pub enum NumericError {
    /// Bracket endpoints are not finite or not ordered (`a < b`).
    InvalidBracket { a: f64, b: f64 },
    /// `f(a)` and `f(b)` have the same sign.
    NoSignChange { fa: f64, fb: f64 },
    /// Iteration budget exhausted before reaching the tolerance.
    MaxIterations { iterations: usize },
    /// Newton step with a vanishing derivative.
    ZeroDerivative { x: f64 },
    /// The objective returned NaN or an infinite value.
    NonFinite { x: f64 },
    /// Interpolation knots are unusable (too few, unsorted, non-finite).
    InvalidKnots(String),
    LengthMismatch { left: usize, right: usize },
    TooFewPoints { n: usize, min: usize },
    /// Linear system could not be solved.
    Singular,
}

impl std::error::Error for NumericError {}

impl std::fmt::Display for NumericError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumericError::InvalidBracket { a, b } => {
                write!(f, "Invalid bracket [{a}, {b}] (need finite a < b).")
            }
            NumericError::NoSignChange { fa, fb } => {
                write!(f, "No sign change in bracket: f(a)={fa}, f(b)={fb}.")
            }
            NumericError::MaxIterations { iterations } => {
                write!(f, "No convergence after {iterations} iterations.")
            }
            NumericError::ZeroDerivative { x } => write!(f, "Zero derivative at x={x}."),
            NumericError::NonFinite { x } => write!(f, "Non-finite function value at x={x}."),
            NumericError::InvalidKnots(msg) => write!(f, "Invalid interpolation knots: {msg}"),
            NumericError::LengthMismatch { left, right } => {
                write!(f, "Length mismatch: {left} vs {right}.")
            }
            NumericError::TooFewPoints { n, min } => {
                write!(f, "Too few points: n={n} (need at least {min}).")
            }
            NumericError::Singular => write!(f, "Singular or ill-conditioned linear system."),
        }
    }
}
