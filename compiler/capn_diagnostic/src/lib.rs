//! Diagnostic system for schema compiler errors.
//!
//! Every compile failure is reported with:
//! - An error code for searchability
//! - A clear message (what went wrong)
//! - A primary location (file, line, column)
//! - Optional secondary locations (the other site of a duplicate id)
//! - Notes (the import cycle, the arms of a union)

mod diagnostic;
pub mod emitter;
mod error_code;
pub mod span_utils;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use span_utils::{LineOffsetTable, SourceLocation};
