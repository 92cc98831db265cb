//! Parser tests.
//!
//! - `parser`: declarations, members and file-level items
//! - `values`: value expressions and annotation arguments
//! - `errors`: rejected input and error positions

mod errors;
mod values;
