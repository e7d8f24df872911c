//! Tree-walking evaluator.
//!
//! Evaluation is a pure function of the expression and the environment:
//! the same inputs always produce the same `f64`, which is what makes
//! recomputing a scenario idempotent.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::FormulaError;
use crate::parser::parse;

/// Source of identifier values during evaluation.
pub trait Environment {
    /// Value bound to `name`, if any.
    fn lookup(&self, name: &str) -> Option<f64>;
}

impl<S: BuildHasher> Environment for HashMap<String, f64, S> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl Environment for BTreeMap<String, f64> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl<E: Environment + ?Sized> Environment for &E {
    fn lookup(&self, name: &str) -> Option<f64> {
        (**self).lookup(name)
    }
}

/// A parsed formula, ready to be evaluated repeatedly.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use scenario_formula::Formula;
///
/// let formula = Formula::parse("PARAM_BASELINE_VOORRAAD * (OUTPUT_A / 100)").unwrap();
///
/// let mut env = BTreeMap::new();
/// env.insert("PARAM_BASELINE_VOORRAAD".to_string(), 10_000.0);
/// env.insert("OUTPUT_A".to_string(), 105.0);
///
/// let value = formula.evaluate(&env).unwrap();
/// assert!((value - 10_500.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parses formula text.
    pub fn parse(source: impl Into<String>) -> Result<Self, FormulaError> {
        let source = source.into();
        let expr = parse(&source)?;
        Ok(Formula { source, expr })
    }

    /// Original formula text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parsed expression tree.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Free identifiers, sorted and deduplicated.
    pub fn identifiers(&self) -> Vec<&str> {
        self.expr.identifiers().into_iter().collect()
    }

    /// Evaluates against `env`.
    pub fn evaluate<E: Environment + ?Sized>(&self, env: &E) -> Result<f64, FormulaError> {
        Evaluator {
            source: &self.source,
            env,
        }
        .eval(&self.expr)
    }

    /// Evaluates on behalf of the OUTPUT variable `variable`, tagging
    /// division and overflow errors with its name.
    pub fn evaluate_for<E: Environment + ?Sized>(
        &self,
        variable: &str,
        env: &E,
    ) -> Result<f64, FormulaError> {
        self.evaluate(env).map_err(|e| e.for_variable(variable))
    }
}

/// Parses and evaluates `formula` in one step.
///
/// # Errors
///
/// - `FormulaError::Parse` for malformed text
/// - `FormulaError::UnknownIdentifier` for names missing from `env`
/// - `FormulaError::DivisionByZero` when a divisor evaluates to zero
/// - `FormulaError::NonFinite` when the arithmetic overflows
pub fn evaluate<E: Environment + ?Sized>(formula: &str, env: &E) -> Result<f64, FormulaError> {
    Formula::parse(formula)?.evaluate(env)
}

struct Evaluator<'a, E: ?Sized> {
    source: &'a str,
    env: &'a E,
}

impl<E: Environment + ?Sized> Evaluator<'_, E> {
    fn eval(&self, expr: &Expr) -> Result<f64, FormulaError> {
        let value = match expr {
            Expr::Const(n, _) => *n,
            Expr::Var(name, _) => {
                self.env
                    .lookup(name)
                    .ok_or_else(|| FormulaError::UnknownIdentifier {
                        name: name.clone(),
                        formula: self.source.to_string(),
                    })?
            }
            Expr::Op1(op, inner, _) => {
                let v = self.eval(inner)?;
                match op {
                    UnaryOp::Positive => v,
                    UnaryOp::Negative => -v,
                }
            }
            Expr::Op2(op, lhs, rhs, _) => {
                let l = self.eval(lhs)?;
                let r = self.eval(rhs)?;
                match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => {
                        if r == 0.0 {
                            return Err(FormulaError::DivisionByZero {
                                formula: self.source.to_string(),
                                variable: None,
                            });
                        }
                        l / r
                    }
                }
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(FormulaError::NonFinite {
                formula: self.source.to_string(),
                variable: None,
            })
        }
    }
}
