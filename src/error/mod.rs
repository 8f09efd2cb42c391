// Error types for the frame feature pipeline
//
// This module defines custom error types for analysis configuration and the
// outbound message transport, providing structured error handling with
// numeric error codes suitable for forwarding to a control surface.

mod analysis;
mod transport;

pub use analysis::{log_analysis_error, AnalysisError, AnalysisErrorCodes};
pub(crate) use analysis::{check_positive, check_threshold};
pub use transport::{log_transport_error, TransportError, TransportErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the library boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
