//! Text syntax.
//!
//! Atoms are lowercase identifiers (`[a-z][a-z0-9_]*`) and the constants `true`
//! and `false`. Operators, from the tightest binding:
//!
//! | operators              | kind                     |
//! |------------------------|--------------------------|
//! | `! O H Y F G X`        | prefix                   |
//! | `S U W`                | binary, left-associative |
//! | `&`                    | left-associative         |
//! | `\|`                   | left-associative         |
//! | `->`                   | right-associative        |
//! | `<->`                  | left-associative         |
//!
//! Uppercase letters are always operators, so `aSb` reads as `a S b`.
//! Whitespace is insignificant.

use std::str::FromStr;

use thiserror::Error;

use crate::formula::Formula;
use crate::operator::Operator;
use crate::reference::NodeId;

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected character '{found}' at position {position}")]
    UnexpectedChar { position: usize, found: char },
    #[error("expected {expected} at position {position}, found '{found}'")]
    UnexpectedToken {
        position: usize,
        expected: &'static str,
        found: String,
    },
    #[error("expected {expected} at position {position}, found end of input")]
    UnexpectedEnd { position: usize, expected: &'static str },
}

impl ParseError {
    /// Byte offset of the error in the input.
    pub fn position(&self) -> usize {
        match *self {
            ParseError::UnexpectedChar { position, .. }
            | ParseError::UnexpectedToken { position, .. }
            | ParseError::UnexpectedEnd { position, .. } => position,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
enum Token {
    Ident(String),
    Const(bool),
    Op(Operator),
    LParen,
    RParen,
}

impl Token {
    fn text(&self) -> String {
        match self {
            Token::Ident(name) => name.clone(),
            Token::Const(value) => value.to_string(),
            Token::Op(op) => op.to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '(' => Token::LParen,
            ')' => Token::RParen,
            'a'..='z' => {
                let mut end = i + 1;
                while let Some(&(j, d)) = chars.peek() {
                    if !matches!(d, 'a'..='z' | '0'..='9' | '_') {
                        break;
                    }
                    end = j + d.len_utf8();
                    chars.next();
                }
                match &input[i..end] {
                    "true" => Token::Const(true),
                    "false" => Token::Const(false),
                    name => Token::Ident(name.to_string()),
                }
            }
            '-' => match chars.next() {
                Some((_, '>')) => Token::Op(Operator::Impl),
                Some((j, d)) => return Err(ParseError::UnexpectedChar { position: j, found: d }),
                None => return Err(ParseError::UnexpectedEnd { position: input.len(), expected: "'>'" }),
            },
            '<' => match (chars.next(), chars.next()) {
                (Some((_, '-')), Some((_, '>'))) => Token::Op(Operator::Equiv),
                (Some((j, d)), _) if d != '-' => return Err(ParseError::UnexpectedChar { position: j, found: d }),
                (_, Some((j, d))) => return Err(ParseError::UnexpectedChar { position: j, found: d }),
                _ => return Err(ParseError::UnexpectedEnd { position: input.len(), expected: "'<->'" }),
            },
            _ => match Operator::from_image(&c.to_string()) {
                Some(op) if !matches!(op, Operator::Impl | Operator::Equiv) => Token::Op(op),
                _ => return Err(ParseError::UnexpectedChar { position: i, found: c }),
            },
        };
        tokens.push((i, token));
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
    formula: &'a mut Formula,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |&(i, _)| i)
    }

    fn peek_operator(&self) -> Option<Operator> {
        match self.peek() {
            Some(&Token::Op(op)) => Some(op),
            _ => None,
        }
    }

    fn error(&self, expected: &'static str) -> ParseError {
        match self.peek() {
            Some(t) => ParseError::UnexpectedToken {
                position: self.position(),
                expected,
                found: t.text(),
            },
            None => ParseError::UnexpectedEnd {
                position: self.end,
                expected,
            },
        }
    }

    /// Parses a left-associative level of binary operators in `ops`.
    fn left_assoc(
        &mut self,
        ops: &[Operator],
        next: fn(&mut Self) -> Result<NodeId, ParseError>,
    ) -> Result<NodeId, ParseError> {
        let mut lhs = next(self)?;
        while let Some(op) = self.peek_operator().filter(|op| ops.contains(op)) {
            self.pos += 1;
            let rhs = next(self)?;
            lhs = self.formula.binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn equiv(&mut self) -> Result<NodeId, ParseError> {
        self.left_assoc(&[Operator::Equiv], Self::implication)
    }

    fn implication(&mut self) -> Result<NodeId, ParseError> {
        let lhs = self.disjunction()?;
        if self.peek_operator() == Some(Operator::Impl) {
            self.pos += 1;
            let rhs = self.implication()?;
            return Ok(self.formula.binary(Operator::Impl, lhs, rhs));
        }
        Ok(lhs)
    }

    fn disjunction(&mut self) -> Result<NodeId, ParseError> {
        self.left_assoc(&[Operator::Or], Self::conjunction)
    }

    fn conjunction(&mut self) -> Result<NodeId, ParseError> {
        self.left_assoc(&[Operator::And], Self::temporal)
    }

    fn temporal(&mut self) -> Result<NodeId, ParseError> {
        self.left_assoc(&[Operator::Since, Operator::Until, Operator::Unless], Self::unary)
    }

    fn unary(&mut self) -> Result<NodeId, ParseError> {
        match self.peek_operator() {
            Some(op) if op.is_unary() => {
                self.pos += 1;
                let operand = self.unary()?;
                Ok(self.formula.unary(op, operand))
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> Result<NodeId, ParseError> {
        let token = match self.peek() {
            Some(t) => t.clone(),
            None => return Err(self.error("a formula")),
        };
        let id = match token {
            Token::Ident(name) => self.formula.prop(name),
            Token::Const(value) => self.formula.constant(value),
            Token::LParen => {
                self.pos += 1;
                let inner = self.equiv()?;
                if self.peek() != Some(&Token::RParen) {
                    return Err(self.error("')'"));
                }
                inner
            }
            Token::RParen | Token::Op(_) => return Err(self.error("a formula")),
        };
        self.pos += 1;
        Ok(id)
    }
}

/// Parses `input` into a formula.
pub fn parse(input: &str) -> Result<Formula, ParseError> {
    let tokens = tokenize(input)?;
    let mut formula = Formula::new();
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.len(),
        formula: &mut formula,
    };
    let root = parser.equiv()?;
    if parser.peek().is_some() {
        return Err(parser.error("an operator"));
    }
    formula.set_root(root);
    Ok(formula)
}

impl FromStr for Formula {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn roundtrip(s: &str) -> String {
        let f = parse(s).unwrap();
        assert!(f.is_consistent());
        f.to_string()
    }

    #[test]
    fn test_atoms() {
        assert_eq!(roundtrip("a"), "a");
        assert_eq!(roundtrip("  x_1 "), "x_1");
        assert_eq!(roundtrip("true"), "true");
        assert_eq!(roundtrip("(false)"), "false");
        assert_eq!(roundtrip("trueSq"), "trueSq");
    }

    #[test]
    fn test_precedence() {
        assert_eq!(roundtrip("a & b | c"), "(a&b)|c");
        assert_eq!(roundtrip("a | b & c"), "a|(b&c)");
        assert_eq!(roundtrip("a S b & c"), "(aSb)&c");
        assert_eq!(roundtrip("!a S b"), "!aSb");
        assert_eq!(roundtrip("a -> b | c"), "a->(b|c)");
        assert_eq!(roundtrip("a <-> b -> c"), "a<->(b->c)");
        assert_eq!(roundtrip("G F a"), "GFa");
        assert_eq!(roundtrip("X(a U b)"), "X(aUb)");
    }

    #[test]
    fn test_associativity() {
        assert_eq!(roundtrip("a S b U c"), "(aSb)Uc");
        assert_eq!(roundtrip("a -> b -> c"), "a->(b->c)");
        let f = parse("a -> b -> c").unwrap();
        assert_eq!(f.operator(f.right(f.root())), Some(Operator::Impl));
        let g = parse("a & b & c").unwrap();
        assert_eq!(g.operator(g.left(g.root())), Some(Operator::And));
    }

    #[test]
    fn test_compact_syntax() {
        assert_eq!(roundtrip("(a&(bUc))Sq"), "(a&(bUc))Sq");
        assert_eq!(roundtrip("pWq"), "pWq");
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse("a & $"),
            Err(ParseError::UnexpectedChar { position: 4, found: '$' })
        );
        assert_eq!(
            parse("(a | b"),
            Err(ParseError::UnexpectedEnd { position: 6, expected: "')'" })
        );
        assert_eq!(
            parse("a b"),
            Err(ParseError::UnexpectedToken {
                position: 2,
                expected: "an operator",
                found: "b".to_string()
            })
        );
        assert_eq!(parse("").unwrap_err().position(), 0);
        assert_eq!(parse("a & ").unwrap_err().position(), 4);
        assert!(parse("a - b").is_err());
        assert!(parse("a <- b").is_err());
        assert!(parse("A").is_err());
    }

    #[test]
    fn test_from_str() {
        let f: Formula = "O q".parse().unwrap();
        assert_eq!(f.to_string(), "Oq");
        let err = "a &".parse::<Formula>().unwrap_err();
        assert_eq!(err.to_string(), "expected a formula at position 3, found end of input");
    }
}
