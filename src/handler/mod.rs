//! Request handler module
//!
//! Responsible for request routing dispatch: static assets first, the
//! function backend for everything else.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
