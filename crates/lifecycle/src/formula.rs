//! Arithmetic quantity formulas.
//!
//! Material-order quantities can be derived from offered quantities by
//! configured rules like `quantity * 1.1`. Rules are parsed into a small
//! expression AST and interpreted over a fixed variable map, never through
//! host-language code construction.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billcraft_core::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(Decimal),
    Var(String),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
}

/// A parsed, evaluatable arithmetic formula.
///
/// Supports `+ - * /`, unary minus, parentheses, decimal literals, and
/// identifiers resolved from the variable map at evaluation time.
/// Serialized as its source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Formula {
    source: String,
    ast: Expr,
}

impl Formula {
    pub fn parse(source: &str) -> DomainResult<Self> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0 };
        let ast = parser.expression()?;
        if parser.pos != parser.tokens.len() {
            return Err(DomainError::validation(format!(
                "unexpected trailing input in formula '{source}'"
            )));
        }
        Ok(Self {
            source: source.to_string(),
            ast,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against a variable map. Unknown identifiers and division by
    /// zero are errors.
    pub fn eval(&self, vars: &HashMap<String, Decimal>) -> DomainResult<Decimal> {
        eval_expr(&self.ast, vars)
    }
}

impl TryFrom<String> for Formula {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Formula::parse(&value)
    }
}

impl From<Formula> for String {
    fn from(value: Formula) -> Self {
        value.source
    }
}

impl core::fmt::Display for Formula {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.source)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Number(Decimal),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Open,
    Close,
}

fn tokenize(input: &str) -> DomainResult<Vec<Tok>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Tok::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Tok::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Tok::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Tok::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Tok::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Tok::Close);
            }
            c if c.is_ascii_digit() => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let text = &input[start..end];
                let value = text.parse::<Decimal>().map_err(|_| {
                    DomainError::validation(format!("malformed number '{text}' in formula"))
                })?;
                tokens.push(Tok::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Tok::Ident(input[start..end].to_string()));
            }
            other => {
                return Err(DomainError::validation(format!(
                    "unexpected character '{other}' in formula"
                )));
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Tok>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expression(&mut self) -> DomainResult<Expr> {
        let mut left = self.term()?;
        while let Some(tok) = self.peek() {
            match tok {
                Tok::Plus => {
                    self.next();
                    left = Expr::Add(Box::new(left), Box::new(self.term()?));
                }
                Tok::Minus => {
                    self.next();
                    left = Expr::Sub(Box::new(left), Box::new(self.term()?));
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn term(&mut self) -> DomainResult<Expr> {
        let mut left = self.factor()?;
        while let Some(tok) = self.peek() {
            match tok {
                Tok::Star => {
                    self.next();
                    left = Expr::Mul(Box::new(left), Box::new(self.factor()?));
                }
                Tok::Slash => {
                    self.next();
                    left = Expr::Div(Box::new(left), Box::new(self.factor()?));
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn factor(&mut self) -> DomainResult<Expr> {
        match self.next() {
            Some(Tok::Number(value)) => Ok(Expr::Number(value)),
            Some(Tok::Ident(name)) => Ok(Expr::Var(name)),
            Some(Tok::Minus) => Ok(Expr::Neg(Box::new(self.factor()?))),
            Some(Tok::Open) => {
                let inner = self.expression()?;
                match self.next() {
                    Some(Tok::Close) => Ok(inner),
                    _ => Err(DomainError::validation("missing ')' in formula")),
                }
            }
            other => Err(DomainError::validation(format!(
                "unexpected token {other:?} in formula"
            ))),
        }
    }
}

fn eval_expr(expr: &Expr, vars: &HashMap<String, Decimal>) -> DomainResult<Decimal> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Var(name) => vars.get(name).copied().ok_or_else(|| {
            DomainError::validation(format!("unknown variable '{name}' in formula"))
        }),
        Expr::Neg(inner) => Ok(-eval_expr(inner, vars)?),
        Expr::Add(a, b) => Ok(eval_expr(a, vars)? + eval_expr(b, vars)?),
        Expr::Sub(a, b) => Ok(eval_expr(a, vars)? - eval_expr(b, vars)?),
        Expr::Mul(a, b) => Ok(eval_expr(a, vars)? * eval_expr(b, vars)?),
        Expr::Div(a, b) => {
            let divisor = eval_expr(b, vars)?;
            if divisor == Decimal::ZERO {
                return Err(DomainError::validation("division by zero in formula"));
            }
            Ok(eval_expr(a, vars)? / divisor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn vars(quantity: Decimal) -> HashMap<String, Decimal> {
        HashMap::from([("quantity".to_string(), quantity)])
    }

    #[test]
    fn evaluates_precedence_and_parentheses() {
        let f = Formula::parse("1 + 2 * 3").unwrap();
        assert_eq!(f.eval(&HashMap::new()).unwrap(), dec!(7));

        let f = Formula::parse("(1 + 2) * 3").unwrap();
        assert_eq!(f.eval(&HashMap::new()).unwrap(), dec!(9));
    }

    #[test]
    fn resolves_variables() {
        let f = Formula::parse("quantity * 1.1").unwrap();
        assert_eq!(f.eval(&vars(dec!(20))).unwrap(), dec!(22.0));
    }

    #[test]
    fn unary_minus_binds_to_factor() {
        let f = Formula::parse("-quantity + 5").unwrap();
        assert_eq!(f.eval(&vars(dec!(2))).unwrap(), dec!(3));
    }

    #[test]
    fn unknown_variable_is_an_error() {
        let f = Formula::parse("area * 2").unwrap();
        assert!(f.eval(&vars(dec!(1))).is_err());
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let f = Formula::parse("quantity / 0").unwrap();
        assert!(f.eval(&vars(dec!(1))).is_err());
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(Formula::parse("1 +").is_err());
        assert!(Formula::parse("(1 + 2").is_err());
        assert!(Formula::parse("1 ; 2").is_err());
        assert!(Formula::parse("1 2").is_err());
        assert!(Formula::parse("1.2.3").is_err());
    }

    #[test]
    fn round_trips_through_serde_as_source_text() {
        let f = Formula::parse("quantity * 1.15").unwrap();
        let json = serde_json::to_string(&f).unwrap();
        assert_eq!(json, "\"quantity * 1.15\"");
        let back: Formula = serde_json::from_str(&json).unwrap();
        assert_eq!(back.eval(&vars(dec!(10))).unwrap(), dec!(11.50));
    }
}
