//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from specific business logic.

pub mod cache;
pub mod encoding;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{parse_range, RangeOutcome};
pub use response::{build_304_response, build_404_response, build_413_response, build_416_response, HttpResponse};
