//! Expression tree for parsed formulas.

use std::collections::BTreeSet;
use std::fmt;

/// Byte span of an expression within its formula text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Loc {
    /// Start offset (inclusive)
    pub start: usize,
    /// End offset (exclusive)
    pub end: usize,
}

impl Loc {
    /// Creates a span.
    pub fn new(start: usize, end: usize) -> Self {
        Loc { start, end }
    }

    /// Smallest span covering both.
    pub fn union(&self, other: &Loc) -> Loc {
        Loc {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Unary sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `+x`
    Positive,
    /// `-x`
    Negative,
}

/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

impl BinaryOp {
    /// Binding strength; higher binds tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

/// A parsed arithmetic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal
    Const(f64, Loc),
    /// Reference to a variable or parameter
    Var(String, Loc),
    /// Signed sub-expression
    Op1(UnaryOp, Box<Expr>, Loc),
    /// Binary operation
    Op2(BinaryOp, Box<Expr>, Box<Expr>, Loc),
}

impl Expr {
    /// Source span of this node.
    pub fn loc(&self) -> Loc {
        match self {
            Expr::Const(_, loc) | Expr::Var(_, loc) | Expr::Op1(_, _, loc) => *loc,
            Expr::Op2(_, _, _, loc) => *loc,
        }
    }

    /// Free identifiers, sorted and deduplicated.
    pub fn identifiers(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Expr::Const(..) => {}
            Expr::Var(name, _) => {
                out.insert(name.as_str());
            }
            Expr::Op1(_, inner, _) => inner.collect_identifiers(out),
            Expr::Op2(_, lhs, rhs, _) => {
                lhs.collect_identifiers(out);
                rhs.collect_identifiers(out);
            }
        }
    }
}

/// Renders the expression fully parenthesised, which makes the parsed
/// grouping visible in logs and tests.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(n, _) => write!(f, "{}", n),
            Expr::Var(name, _) => write!(f, "{}", name),
            Expr::Op1(UnaryOp::Positive, inner, _) => write!(f, "(+{})", inner),
            Expr::Op1(UnaryOp::Negative, inner, _) => write!(f, "(-{})", inner),
            Expr::Op2(op, lhs, rhs, _) => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
        }
    }
}
