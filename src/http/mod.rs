//! HTTP protocol layer module
//!
//! Response builders and the extension to mimetype table, independent of the
//! endpoint dispatch logic.

pub mod mime;
pub mod response;

// Re-export commonly used types
pub use response::{build_501_response, build_error_response, build_ok_response};
