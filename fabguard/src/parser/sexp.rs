//! Minimal S-expression reader for KiCad board files.
//!
//! KiCad stores boards as nested lists of bare symbols, numbers and quoted
//! strings. This reader keeps every leaf as text; numeric interpretation is
//! left to the board parser so it can report which field was malformed.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unexpected end of input at offset {0}")]
    UnexpectedEof(usize),
    #[error("unexpected '{found}' at offset {offset}")]
    UnexpectedToken { offset: usize, found: char },
    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),
    #[error("trailing content at offset {0}")]
    TrailingContent(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SExp {
    Atom(String),
    List(Vec<SExp>),
}

impl SExp {
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            SExp::Atom(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SExp]> {
        match self {
            SExp::List(items) => Some(items),
            _ => None,
        }
    }

    /// Tag of a list node, i.e. the leading symbol of `(tag ...)`.
    pub fn head(&self) -> Option<&str> {
        self.as_list()
            .and_then(|items| items.first())
            .and_then(SExp::as_atom)
    }

    /// Atom at position `index` of a list node (0 is the tag).
    pub fn atom(&self, index: usize) -> Option<&str> {
        self.as_list()
            .and_then(|items| items.get(index))
            .and_then(SExp::as_atom)
    }

    /// First direct child list tagged `key`.
    pub fn find(&self, key: &str) -> Option<&SExp> {
        self.as_list()?
            .iter()
            .find(|item| item.head() == Some(key))
    }

    /// All direct child lists tagged `key`, in document order.
    pub fn find_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a SExp> + 'a {
        self.as_list()
            .unwrap_or(&[])
            .iter()
            .filter(move |item| item.head() == Some(key))
    }

    /// Value of a `(key value)` child.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.find(key).and_then(|node| node.atom(1))
    }
}

impl fmt::Display for SExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SExp::Atom(s) => {
                let needs_quotes = s.is_empty()
                    || s.chars().any(|c| c.is_whitespace() || c == '(' || c == ')' || c == '"');
                if needs_quotes {
                    write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
                } else {
                    write!(f, "{}", s)
                }
            }
            SExp::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

pub struct SExpParser {
    input: Vec<char>,
    pos: usize,
}

impl SExpParser {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    /// Parse exactly one expression; anything but whitespace after it is an error.
    pub fn parse(&mut self) -> Result<SExp, ParseError> {
        let expr = self.parse_sexp()?;
        self.skip_whitespace();
        if !self.is_eof() {
            return Err(ParseError::TrailingContent(self.pos));
        }
        Ok(expr)
    }

    fn parse_sexp(&mut self) -> Result<SExp, ParseError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(ParseError::UnexpectedEof(self.pos)),
            Some('(') => self.parse_list(),
            Some(')') => Err(ParseError::UnexpectedToken {
                offset: self.pos,
                found: ')',
            }),
            Some('"') => self.parse_string(),
            Some(_) => Ok(self.parse_symbol()),
        }
    }

    fn parse_list(&mut self) -> Result<SExp, ParseError> {
        self.advance();
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(ParseError::UnexpectedEof(self.pos)),
                Some(')') => {
                    self.advance();
                    return Ok(SExp::List(items));
                }
                Some(_) => items.push(self.parse_sexp()?),
            }
        }
    }

    fn parse_string(&mut self) -> Result<SExp, ParseError> {
        let start = self.pos;
        self.advance();
        let mut s = String::new();

        while let Some(ch) = self.peek() {
            self.advance();
            match ch {
                '"' => return Ok(SExp::Atom(s)),
                '\\' => {
                    let escaped = self.peek().ok_or(ParseError::UnterminatedString(start))?;
                    self.advance();
                    s.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    });
                }
                _ => s.push(ch),
            }
        }

        Err(ParseError::UnterminatedString(start))
    }

    fn parse_symbol(&mut self) -> SExp {
        let mut s = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == '(' || ch == ')' || ch == '"' {
                break;
            }
            s.push(ch);
            self.advance();
        }
        SExp::Atom(s)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            self.pos += 1;
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }
}
