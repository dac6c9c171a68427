//! # rxlint-rules
//!
//! Built-in lint rules for rxlint.
//!
//! ## Available Rules
//!
//! | Code | Name | Description |
//! |------|------|-------------|
//! | RX001 | `rxjs-ban-operators` | Disallows configured RxJS operators in imports and stream method calls |
//!
//! ## Usage
//!
//! ```ignore
//! use rxlint_ts::Analyzer;
//! use rxlint_rules::RxjsBanOperators;
//!
//! let analyzer = Analyzer::builder()
//!     .root("./src")
//!     .rule(RxjsBanOperators::new().ban("do", Some("use tap instead")))
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ban_operators;
mod registry;

pub use ban_operators::{BanMatcher, BanOptions, BanSetting, BanTable, RxjsBanOperators};
pub use registry::{all_rules, rule_by_name};

/// Re-export core types for convenience.
pub use rxlint_core::{Severity, Violation};
pub use rxlint_ts::Rule;
