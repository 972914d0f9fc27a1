use thiserror::Error;

/// Failure taxonomy for the scoring/allocation/projection core.
///
/// `Configuration` and `InputOutOfRange` abort the current computation and
/// surface to the caller. `Optimization` is recovered internally by falling
/// back to the risk band's default allocation. `OracleUnavailable` is
/// recovered by the caller with a fallback score plus an advisory message.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("no scoring entry for {field} = {value:?}")]
    Configuration { field: &'static str, value: String },

    #[error("optimizer failed: {0}")]
    Optimization(String),

    #[error("risk-assessment service unavailable: {0}")]
    OracleUnavailable(String),

    #[error("input out of range: {0}")]
    InputOutOfRange(String),
}
