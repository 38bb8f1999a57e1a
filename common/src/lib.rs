//! Shared plumbing for the tango-rpc workspace.
//!
//! Every error type in the workspace carries an [`ErrorLocation`] so a
//! failure reported far from its origin (for example, rendered into a log
//! line by the demo binary) still points at the line that produced it.

pub mod error;

pub use error::error_location::ErrorLocation;
