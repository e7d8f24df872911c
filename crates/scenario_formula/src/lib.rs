//! # scenario_formula: Restricted Arithmetic Formulas
//!
//! Formulas attached to OUTPUT variables are plain arithmetic over
//! identifiers and numeric literals:
//!
//! ```text
//! PARAM_BASELINE_VOORRAAD * (OUTPUT_A/100) * (OUTPUT_B/100) * (OUTPUT_C/100)
//! ```
//!
//! Only `+ - * / ( )` and unary signs are accepted. There are no functions,
//! comparisons or assignments, and formula text is never executed as code:
//! it is tokenised, parsed into an [`Expr`] tree and the tree is walked.
//!
//! ## Pipeline
//!
//! ```text
//! &str ──► Lexer ──► Parser (recursive descent) ──► Expr ──► evaluate(env)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use scenario_formula::{evaluate, Formula};
//!
//! let mut env = HashMap::new();
//! env.insert("INPUT_OMZET".to_string(), 1_000_000.0);
//! env.insert("PARAM_BASELINE_OMZET".to_string(), 1_000_000.0);
//!
//! let pct = evaluate("(INPUT_OMZET / PARAM_BASELINE_OMZET) * 100", &env).unwrap();
//! assert_eq!(pct, 100.0);
//!
//! let formula = Formula::parse("a + b * 2").unwrap();
//! assert_eq!(formula.identifiers(), vec!["a", "b"]);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod ast;
mod error;
pub mod eval;
pub mod lexer;
mod parser;

pub use ast::{BinaryOp, Expr, Loc, UnaryOp};
pub use error::FormulaError;
pub use eval::{evaluate, Environment, Formula};
pub use parser::{parse, MAX_HEIGHT, MAX_NESTING};
