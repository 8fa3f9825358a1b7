//! # Field Spec Core
//!
//! Declarative constraints for dataframe schema fields.
//!
//! This crate turns keyword constraints attached to a column or index into an
//! ordered list of check objects, and resolves the field's identity into a
//! plain name or a column selector for a lazy query engine.
//!
//! ## Key Concepts
//!
//! - **Constraint**: a built-in keyword (`gt`, `isin`, `str_matches`, ...) mapped to a check constructor
//! - **CheckRegistry**: custom checks registered under caller-chosen names
//! - **FieldBuilder**: collects constraints and properties, compiles them into a `FieldInfo`
//! - **FieldName**: either a plain name or a `ColumnSelector`
//!
//! ## Example
//!
//! ```rust
//! use fieldspec_core::{CheckRegistry, FieldBuilder, FieldName};
//!
//! let registry = CheckRegistry::new();
//!
//! let field = FieldBuilder::new()
//!     .gt(0)
//!     .isin([1, 2, 3])
//!     .alias("score_.*")
//!     .regex(true)
//!     .emit_as_expression(true)
//!     .build(&registry)
//!     .unwrap()
//!     .with_original_name("score");
//!
//! assert_eq!(field.checks().unwrap().len(), 2);
//!
//! match field.name().unwrap() {
//!     FieldName::Expr(selector) => assert_eq!(selector.as_str(), "^score_.*$"),
//!     FieldName::Plain(_) => unreachable!(),
//! }
//! ```

pub mod check;
pub mod error;
pub mod field;
pub mod registry;
pub mod selector;
pub mod value;

pub use check::*;
pub use error::*;
pub use field::*;
pub use registry::*;
pub use selector::*;
pub use value::*;
