//! Filter expression trees and their algebra.
//!
//! This module provides:
//! - Expression types (AND/OR/NOT operators, field terms, tri-state enablement)
//! - The closed condition catalogue
//! - Simplification, filtered deep copy and parameter substitution
//! - Term/field extraction, validation and tree printing

mod condition;
mod display;
mod extract;
mod item;
mod query;
mod rewrite;
mod simplify;
mod validate;

pub use condition::Condition;
pub use extract::{combine, fields, is_empty, term_count, terms, values};
pub use item::{DocRef, Enablement, ExpressionItem, ExpressionOperator, ExpressionTerm, Op};
pub use query::{Query, TimeRange};
pub use rewrite::{copy_operator, copy_operator_with, replace_expression_parameters};
pub use simplify::simplify;
pub use validate::validate;
