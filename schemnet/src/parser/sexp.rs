//! Minimal S-expression reader for KiCad files.
//!
//! KiCad schematics are a single nested S-expression. This reader keeps the
//! whole tree in memory as [`Sexp`] values; the document layer walks the tree
//! and pulls out the nodes it cares about.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SexpError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unexpected character '{0}' at offset {1}")]
    UnexpectedChar(char, usize),
    #[error("empty atom at offset {0}")]
    EmptyAtom(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sexp {
    Atom(String),
    List(Vec<Sexp>),
}

impl Sexp {
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Sexp::Atom(s) => Some(s),
            Sexp::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Sexp]> {
        match self {
            Sexp::Atom(_) => None,
            Sexp::List(items) => Some(items),
        }
    }

    /// Tag of a list node: its first element, when that is an atom.
    pub fn tag(&self) -> Option<&str> {
        self.as_list()?.first()?.as_atom()
    }

    /// First child list whose tag equals `key`.
    pub fn child(&self, key: &str) -> Option<&Sexp> {
        self.as_list()?
            .iter()
            .find(|item| item.tag() == Some(key))
    }

    /// All child lists whose tag equals `key`, in document order.
    pub fn children<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Sexp> + 'a {
        self.as_list()
            .unwrap_or(&[])
            .iter()
            .filter(move |item| item.tag() == Some(key))
    }

    /// Positional atom inside a list node (index 0 is the tag).
    pub fn atom_at(&self, index: usize) -> Option<&str> {
        self.as_list()?.get(index)?.as_atom()
    }
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexp::Atom(s) => {
                if s.is_empty() || s.contains(|c: char| c.is_whitespace() || c == '(' || c == ')') {
                    write!(f, "\"{}\"", s.replace('"', "\\\""))
                } else {
                    write!(f, "{}", s)
                }
            }
            Sexp::List(items) => {
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

/// Parse a complete S-expression document; trailing whitespace is allowed.
pub fn parse(input: &str) -> Result<Sexp, SexpError> {
    let mut cursor = Cursor::new(input);
    cursor.skip_whitespace();
    let root = cursor.parse_value()?;
    cursor.skip_whitespace();
    if let Some((pos, ch)) = cursor.peek_indexed() {
        return Err(SexpError::UnexpectedChar(ch, pos));
    }
    Ok(root)
}

struct Cursor<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
        }
    }

    fn peek_indexed(&mut self) -> Option<(usize, char)> {
        self.chars.peek().copied()
    }

    fn peek(&mut self) -> Option<char> {
        self.peek_indexed().map(|(_, c)| c)
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        self.chars.next()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn parse_value(&mut self) -> Result<Sexp, SexpError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(SexpError::UnexpectedEof),
            Some('(') => self.parse_list(),
            Some('"') => self.parse_string(),
            Some(')') => {
                let (pos, ch) = self.bump().unwrap_or((0, ')'));
                Err(SexpError::UnexpectedChar(ch, pos))
            }
            Some(_) => self.parse_bare_atom(),
        }
    }

    fn parse_list(&mut self) -> Result<Sexp, SexpError> {
        self.bump(); // consume '('
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(SexpError::UnexpectedEof),
                Some(')') => {
                    self.bump();
                    return Ok(Sexp::List(items));
                }
                Some(_) => items.push(self.parse_value()?),
            }
        }
    }

    fn parse_string(&mut self) -> Result<Sexp, SexpError> {
        self.bump(); // consume opening quote
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(SexpError::UnexpectedEof),
                Some((_, '"')) => return Ok(Sexp::Atom(out)),
                Some((_, '\\')) => match self.bump() {
                    None => return Err(SexpError::UnexpectedEof),
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, other)) => out.push(other),
                },
                Some((_, ch)) => out.push(ch),
            }
        }
    }

    fn parse_bare_atom(&mut self) -> Result<Sexp, SexpError> {
        let mut out = String::new();
        let start = self.peek_indexed().map(|(i, _)| i).unwrap_or(0);
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == '(' || ch == ')' {
                break;
            }
            out.push(ch);
            self.bump();
        }
        if out.is_empty() {
            Err(SexpError::EmptyAtom(start))
        } else {
            Ok(Sexp::Atom(out))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_atom() {
        assert_eq!(parse("hello").unwrap(), Sexp::Atom("hello".into()));
    }

    #[test]
    fn parses_quoted_string_with_escapes() {
        let parsed = parse(r#""a \"b\" c""#).unwrap();
        assert_eq!(parsed, Sexp::Atom("a \"b\" c".into()));
    }

    #[test]
    fn parses_nested_lists() {
        let parsed = parse("(wire (pts (xy 1 2) (xy 3 4)))").unwrap();
        assert_eq!(parsed.tag(), Some("wire"));
        let pts = parsed.child("pts").unwrap();
        let xys: Vec<_> = pts.children("xy").collect();
        assert_eq!(xys.len(), 2);
        assert_eq!(xys[1].atom_at(1), Some("3"));
    }

    #[test]
    fn child_finds_first_match_only() {
        let parsed = parse("(a (b 1) (b 2))").unwrap();
        assert_eq!(parsed.child("b").unwrap().atom_at(1), Some("1"));
    }

    #[test]
    fn rejects_unbalanced_input() {
        assert!(parse("(a (b 1)").is_err());
        assert!(parse("(a) trailing").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn display_round_trips_quoting() {
        let parsed = parse(r#"(text "two words")"#).unwrap();
        assert_eq!(parsed.to_string(), r#"(text "two words")"#);
    }
}
