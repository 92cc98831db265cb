//! capn IR - syntax-level types for the schema compiler.
//!
//! This crate contains the data structures shared by the front end:
//! - Spans for source locations
//! - Tokens and `TokenList` for lexer output
//! - The `SyntaxTree` produced by the parser
//!
//! # Design Philosophy
//!
//! - **Declaration order is data**: every `Vec` in the syntax tree keeps
//!   source order, because child enumeration downstream depends on it.
//! - **No resolution here**: paths are kept exactly as written; binding them
//!   to declarations is the resolver's job.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

pub mod ast;
mod span;
mod token;

pub use ast::{
    AnnotationApp, AnnotationDecl, AnnotationTarget, ConstDecl, Decl, DeclKind, EnumDecl,
    EnumerantDecl, FieldDecl, GroupDecl, Ident, IdLiteral, InterfaceDecl, Member, MethodDecl,
    MethodParams, Ordinal, ParamDecl, Path, PathBase, PathSegment, StructDecl, SyntaxTree,
    TypeExpr, UnionDecl, UsingDecl, ValueExpr, ValueExprKind,
};
pub use span::Span;
pub use token::{Token, TokenKind, TokenList};
