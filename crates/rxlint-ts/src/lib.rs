//! # rxlint-ts
//!
//! Tree-sitter TypeScript host for rxlint rules.
//!
//! This crate provides everything a rule needs to inspect a TypeScript file
//! and reuses `rxlint-core` types (`Violation`, `Severity`, `Location`):
//!
//! - [`SourceFile`] and [`Dialect`] for parsing `.ts`/`.tsx` sources
//! - [`SyntaxVisitor`] and [`walk`] for per-kind traversal with an end-of-file hook
//! - [`TypeResolver`] and [`SourceTypeChecker`] for declared-type lookups
//! - [`Rule`] for defining lint rules
//! - [`Analyzer`] for discovering files and running rules over them

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod analyzer;
pub mod checker;
pub mod rule;
pub mod syntax;
pub mod walker;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError};
pub use checker::{AmbientTypes, NoTypeInfo, SourceTypeChecker, TypeDescriptor, TypeResolver};
pub use rule::{Rule, RuleBox};
pub use syntax::{node_location, unquote, Dialect, ParseError, SourceFile};
pub use walker::{walk, SyntaxVisitor};

/// Re-export of the Tree-sitter node type rules work with.
pub use tree_sitter::Node;
