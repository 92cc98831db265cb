//! Grammar Modules
//!
//! Each module extends `Parser` with methods for specific grammar productions:
//!
//! - [`decl`]: File structure and declarations (struct, enum, interface,
//!   const, annotation, using)
//! - [`member`]: Struct, group, union and interface bodies
//! - [`ty`]: Paths and type expressions
//! - [`value`]: Literal and reference values
//! - [`annotation`]: `$annotation(value)` applications
//!
//! The parser is plain recursive descent with one token of lookahead and no
//! error recovery: the first error aborts the file.

mod annotation;
mod decl;
mod member;
mod ty;
mod value;
