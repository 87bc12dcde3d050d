use thiserror::Error;

/// Errors raised when building agents.
#[derive(Error, Debug, PartialEq)]
pub enum CandleAgentError {
    /// A required part of a configuration was not given.
    #[error("{0} is not set")]
    MissingConfig(&'static str),
}
