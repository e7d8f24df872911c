//! Hand-written recursive descent parser.
//!
//! Grammar, lowest to highest precedence:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := NUMBER | IDENT | '(' expr ')'
//! ```
//!
//! Loops in `expr` and `term` give left associativity.

use crate::ast::{BinaryOp, Expr, Loc, UnaryOp};
use crate::error::FormulaError;
use crate::lexer::{Lexer, Spanned, Token};

/// Parses formula text into an expression tree.
///
/// # Errors
///
/// `FormulaError::Parse` with the byte offset of the first problem.
///
/// # Examples
///
/// ```
/// use scenario_formula::parse;
///
/// let expr = parse("a - b - c").unwrap();
/// assert_eq!(expr.to_string(), "((a - b) - c)");
///
/// let err = parse("a * (b + c").unwrap_err();
/// assert!(err.to_string().contains("offset 10"));
/// ```
pub fn parse(text: &str) -> Result<Expr, FormulaError> {
    let mut parser = Parser::new(text)?;
    let (expr, _) = parser.expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(&(start, tok, _)) => Err(parser.error(start, format!("unexpected {}", describe(&tok)))),
    }
}

/// Deepest run of nested parentheses and unary signs the parser accepts.
pub const MAX_NESTING: usize = 256;

/// Tallest expression tree the parser accepts.
///
/// Evaluation and identifier collection recurse once per level, so this
/// bounds their stack use as well.
pub const MAX_HEIGHT: usize = 1024;

/// An expression together with its tree height.
type Node = (Expr, usize);

fn describe(tok: &Token<'_>) -> String {
    match tok {
        Token::Num(n) => format!("number {}", n),
        Token::Ident(name) => format!("identifier '{}'", name),
        Token::Plus => "'+'".to_string(),
        Token::Minus => "'-'".to_string(),
        Token::Mul => "'*'".to_string(),
        Token::Div => "'/'".to_string(),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
    }
}

struct Parser<'input> {
    text: &'input str,
    tokens: Vec<Spanned<Token<'input>>>,
    pos: usize,
    nesting: usize,
}

impl<'input> Parser<'input> {
    /// Tokenises up front; the first lexer error aborts parsing.
    fn new(text: &'input str) -> Result<Self, FormulaError> {
        let tokens = Lexer::new(text).collect::<Result<Vec<_>, _>>()?;
        Ok(Parser {
            text,
            tokens,
            pos: 0,
            nesting: 0,
        })
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> FormulaError {
        FormulaError::Parse {
            formula: self.text.to_string(),
            offset,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<&Spanned<Token<'input>>> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Spanned<Token<'input>>> {
        let tok = self.tokens.get(self.pos).copied();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn binary_op(&self, allowed: &[BinaryOp]) -> Option<BinaryOp> {
        let op = match self.peek()? {
            (_, Token::Plus, _) => BinaryOp::Add,
            (_, Token::Minus, _) => BinaryOp::Sub,
            (_, Token::Mul, _) => BinaryOp::Mul,
            (_, Token::Div, _) => BinaryOp::Div,
            _ => return None,
        };
        allowed.contains(&op).then_some(op)
    }

    fn enter(&mut self, offset: usize) -> Result<(), FormulaError> {
        if self.nesting >= MAX_NESTING {
            return Err(self.error(offset, "formula nested too deeply"));
        }
        self.nesting += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.nesting -= 1;
    }

    fn check_height(&self, height: usize, offset: usize) -> Result<usize, FormulaError> {
        if height > MAX_HEIGHT {
            return Err(self.error(offset, "formula nested too deeply"));
        }
        Ok(height)
    }

    fn expr(&mut self) -> Result<Node, FormulaError> {
        self.binary_level(&[BinaryOp::Add, BinaryOp::Sub], Self::term)
    }

    fn term(&mut self) -> Result<Node, FormulaError> {
        self.binary_level(&[BinaryOp::Mul, BinaryOp::Div], Self::unary)
    }

    fn binary_level(
        &mut self,
        ops: &[BinaryOp],
        operand: fn(&mut Self) -> Result<Node, FormulaError>,
    ) -> Result<Node, FormulaError> {
        let (mut lhs, mut height) = operand(self)?;
        while let Some(op) = self.binary_op(ops) {
            self.advance();
            let (rhs, rhs_height) = operand(self)?;
            let loc = lhs.loc().union(&rhs.loc());
            height = self.check_height(height.max(rhs_height) + 1, loc.start)?;
            lhs = Expr::Op2(op, Box::new(lhs), Box::new(rhs), loc);
        }
        Ok((lhs, height))
    }

    fn unary(&mut self) -> Result<Node, FormulaError> {
        let (start, op) = match self.peek() {
            Some(&(start, Token::Plus, _)) => (start, UnaryOp::Positive),
            Some(&(start, Token::Minus, _)) => (start, UnaryOp::Negative),
            _ => return self.primary(),
        };
        self.advance();
        self.enter(start)?;
        let inner = self.unary();
        self.leave();
        let (inner, inner_height) = inner?;
        let height = self.check_height(inner_height + 1, start)?;
        let loc = Loc::new(start, inner.loc().end);
        Ok((Expr::Op1(op, Box::new(inner), loc), height))
    }

    fn primary(&mut self) -> Result<Node, FormulaError> {
        match self.advance() {
            Some((start, Token::Num(n), end)) => Ok((Expr::Const(n, Loc::new(start, end)), 1)),
            Some((start, Token::Ident(name), end)) => {
                Ok((Expr::Var(name.to_string(), Loc::new(start, end)), 1))
            }
            Some((start, Token::LParen, _)) => {
                self.enter(start)?;
                let inner = self.expr();
                self.leave();
                let (inner, height) = inner?;
                match self.advance() {
                    Some((_, Token::RParen, end)) => {
                        // keep the inner node, widening its span over the parens
                        Ok((with_loc(inner, Loc::new(start, end)), height))
                    }
                    Some((offset, tok, _)) => {
                        Err(self.error(offset, format!("expected ')', found {}", describe(&tok))))
                    }
                    None => Err(self.error(self.text.len(), "expected ')' before end of formula")),
                }
            }
            Some((offset, tok, _)) => {
                Err(self.error(offset, format!("expected operand, found {}", describe(&tok))))
            }
            None => Err(self.error(self.text.len(), "unexpected end of formula")),
        }
    }
}

fn with_loc(expr: Expr, loc: Loc) -> Expr {
    match expr {
        Expr::Const(n, _) => Expr::Const(n, loc),
        Expr::Var(name, _) => Expr::Var(name, loc),
        Expr::Op1(op, inner, _) => Expr::Op1(op, inner, loc),
        Expr::Op2(op, lhs, rhs, _) => Expr::Op2(op, lhs, rhs, loc),
    }
}
