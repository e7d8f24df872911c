//! Formula tokeniser.
//!
//! Produces `(start, token, end)` triples with byte offsets into the source,
//! so parse errors can point at the offending character.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::FormulaError;

/// A lexical token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'input> {
    /// Numeric literal
    Num(f64),
    /// Variable or parameter name
    Ident(&'input str),
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `(`
    LParen,
    /// `)`
    RParen,
}

/// A token with its byte span.
pub type Spanned<T> = (usize, T, usize);

/// Iterator over the tokens of one formula.
pub struct Lexer<'input> {
    text: &'input str,
    chars: Peekable<CharIndices<'input>>,
}

impl<'input> Lexer<'input> {
    /// Creates a lexer over `text`.
    pub fn new(text: &'input str) -> Self {
        Lexer {
            text,
            chars: text.char_indices().peekable(),
        }
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> FormulaError {
        FormulaError::Parse {
            formula: self.text.to_string(),
            offset,
            message: message.into(),
        }
    }

    /// Consumes characters while `keep` holds, returning the new end offset.
    fn take_while<F>(&mut self, mut end: usize, mut keep: F) -> usize
    where
        F: FnMut(char) -> bool,
    {
        while let Some(&(idx, c)) = self.chars.peek() {
            if !keep(c) {
                break;
            }
            end = idx + c.len_utf8();
            self.chars.next();
        }
        end
    }

    fn identifier(&mut self, start: usize, first: char) -> Spanned<Token<'input>> {
        let end = self.take_while(start + first.len_utf8(), is_ident_continue);
        (start, Token::Ident(&self.text[start..end]), end)
    }

    fn number(&mut self, start: usize) -> Result<Spanned<Token<'input>>, FormulaError> {
        // the first character is an ASCII digit or '.', already consumed
        let mut end = self.take_while(start + 1, |c| c.is_ascii_digit() || c == '.');

        // optional exponent: e[+-]digits
        if let Some(&(idx, 'e' | 'E')) = self.chars.peek() {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            let has_digits = match lookahead.peek() {
                Some(&(_, '+' | '-')) => {
                    lookahead.next();
                    matches!(lookahead.peek(), Some(&(_, c)) if c.is_ascii_digit())
                }
                Some(&(_, c)) => c.is_ascii_digit(),
                None => false,
            };
            if has_digits {
                self.chars.next();
                end = idx + 1;
                if let Some(&(sign_idx, '+' | '-')) = self.chars.peek() {
                    self.chars.next();
                    end = sign_idx + 1;
                }
                end = self.take_while(end, |c| c.is_ascii_digit());
            }
        }

        let literal = &self.text[start..end];
        literal
            .parse::<f64>()
            .map(|n| (start, Token::Num(n), end))
            .map_err(|_| self.error(start, format!("invalid number '{}'", literal)))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl<'input> Iterator for Lexer<'input> {
    type Item = Result<Spanned<Token<'input>>, FormulaError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (idx, c) = self.chars.next()?;
            let single = |tok| Some(Ok((idx, tok, idx + 1)));
            return match c {
                c if c.is_whitespace() => continue,
                '+' => single(Token::Plus),
                '-' => single(Token::Minus),
                '*' => single(Token::Mul),
                '/' => single(Token::Div),
                '(' => single(Token::LParen),
                ')' => single(Token::RParen),
                c if c.is_ascii_digit() || c == '.' => Some(self.number(idx)),
                c if is_ident_start(c) => Some(Ok(self.identifier(idx, c))),
                other => Some(Err(self.error(idx, format!("unexpected character '{}'", other)))),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<Token<'_>> {
        Lexer::new(text)
            .map(|r| r.map(|(_, tok, _)| tok))
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_operators_and_parens() {
        assert_eq!(
            tokens("(a+b)*c/d-e"),
            vec![
                Token::LParen,
                Token::Ident("a"),
                Token::Plus,
                Token::Ident("b"),
                Token::RParen,
                Token::Mul,
                Token::Ident("c"),
                Token::Div,
                Token::Ident("d"),
                Token::Minus,
                Token::Ident("e"),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokens("100 0.5 .25 1e3 2.5E-2"),
            vec![
                Token::Num(100.0),
                Token::Num(0.5),
                Token::Num(0.25),
                Token::Num(1000.0),
                Token::Num(0.025),
            ]
        );
    }

    #[test]
    fn test_exponent_requires_digits() {
        // `2e` is a number followed by the identifier `e`
        assert_eq!(tokens("2e"), vec![Token::Num(2.0), Token::Ident("e")]);
    }

    #[test]
    fn test_identifier_spans() {
        let spanned: Vec<_> = Lexer::new("  PARAM_BASELINE_VOORRAAD * 2")
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(spanned[0], (2, Token::Ident("PARAM_BASELINE_VOORRAAD"), 25));
    }

    #[test]
    fn test_rejects_unknown_characters() {
        let err = Lexer::new("a > b").find_map(|r| r.err()).unwrap();
        assert_eq!(
            err,
            FormulaError::Parse {
                formula: "a > b".to_string(),
                offset: 2,
                message: "unexpected character '>'".to_string(),
            }
        );
    }

    #[test]
    fn test_rejects_malformed_number() {
        let err = Lexer::new("1.2.3").find_map(|r| r.err()).unwrap();
        assert!(matches!(err, FormulaError::Parse { offset: 0, .. }));
    }
}
