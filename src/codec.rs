//! Term codec: wire-form text ⇄ structured terms.
//!
//! The wire form is `functor(arg1,arg2,...)` with an optional `[annot,...]`
//! annotation suffix. Arguments are numbers, quoted strings, atoms,
//! variables, nested terms, or `[..]` list literals (decoded as tuples, to
//! match the reasoning engine's term shape). Pure and stateless.
//!
//! Decoding a malformed body is a [`CodecError`], fatal for the message
//! that carried it and never silently recovered.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CodecError;
use crate::term::{Term, Value};

/// The wildcard naming convention: an argument substring starting with `_X`
/// decodes as a single fresh unbound variable.
static WILDCARD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^_X").unwrap());

/// Render a term in wire form.
pub fn encode(term: &Term) -> String {
    term.to_string()
}

/// Render a single argument value in wire form.
pub fn encode_value(value: &Value) -> String {
    value.to_string()
}

/// Parse a wire-form body into a term.
pub fn decode(input: &str) -> Result<Term, CodecError> {
    let mut scanner = Scanner::new(input.trim());
    let term = scanner.parse_term(true)?;
    scanner.skip_ws();
    if !scanner.at_end() {
        return Err(CodecError::TrailingInput {
            fragment: scanner.rest().to_string(),
        });
    }
    Ok(term)
}

// ── Rendering ────────────────────────────────────────────────────────────

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.functor())?;
        if !self.args().is_empty() {
            write!(f, "(")?;
            for (i, arg) in self.args().iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{arg}")?;
            }
            write!(f, ")")?;
        }
        if !self.annots().is_empty() {
            write!(f, "[")?;
            for (i, annot) in self.annots().iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{annot}")?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Term(t) => write!(f, "{t}"),
            Self::Int(n) => write!(f, "{n}"),
            // Integral floats keep a decimal point so they decode back as floats.
            Self::Float(x) if x.fract() == 0.0 && x.is_finite() => write!(f, "{x:.1}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            Self::Tuple(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Var(Some(name)) => write!(f, "{name}"),
            Self::Var(None) => write!(f, "_"),
        }
    }
}

// ── Parsing ──────────────────────────────────────────────────────────────

struct Scanner<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), CodecError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(CodecError::Unbalanced {
                input: self.input.to_string(),
            })
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn rest(&self) -> String {
        self.chars[self.pos..].iter().collect()
    }

    fn is_ident_char(c: char) -> bool {
        c.is_alphanumeric() || matches!(c, '_' | '@' | '.' | '-')
    }

    fn take_ident(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(Self::is_ident_char) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// The raw argument substring up to the matching `)`, without consuming.
    /// Tracks nested delimiters and string literals.
    fn peek_balanced_args(&self) -> Result<String, CodecError> {
        let mut depth = 1usize;
        let mut in_str = false;
        let mut escaped = false;
        for (offset, &c) in self.chars[self.pos..].iter().enumerate() {
            if in_str {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    in_str = false;
                }
                continue;
            }
            match c {
                '"' => in_str = true,
                '(' | '[' => depth += 1,
                ')' | ']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(self.chars[self.pos..self.pos + offset].iter().collect());
                    }
                }
                _ => {}
            }
        }
        Err(CodecError::Unbalanced {
            input: self.input.to_string(),
        })
    }

    fn parse_term(&mut self, top_level: bool) -> Result<Term, CodecError> {
        self.skip_ws();
        let functor = self.take_ident();
        if functor.is_empty() {
            return Err(CodecError::EmptyFunctor {
                input: self.input.to_string(),
            });
        }

        let mut args = Vec::new();
        if self.eat('(') {
            let raw = self.peek_balanced_args()?;
            if top_level && WILDCARD.is_match(raw.trim()) {
                // Whole argument substring is a wildcard placeholder: one
                // fresh unbound variable, regardless of what follows.
                self.pos += raw.chars().count();
                self.expect(')')?;
                args.push(Value::Var(None));
            } else if raw.trim().is_empty() {
                self.pos += raw.chars().count();
                self.expect(')')?;
            } else {
                loop {
                    args.push(self.parse_value()?);
                    self.skip_ws();
                    if self.eat(',') {
                        continue;
                    }
                    self.expect(')')?;
                    break;
                }
            }
        }

        let mut term = Term::new(functor, args);
        self.skip_ws();
        if self.eat('[') {
            loop {
                let annot = self.parse_term(false)?;
                term = term.with_annotation(annot);
                self.skip_ws();
                if self.eat(',') {
                    continue;
                }
                self.expect(']')?;
                break;
            }
        }
        Ok(term)
    }

    fn parse_value(&mut self) -> Result<Value, CodecError> {
        self.skip_ws();
        match self.peek() {
            Some('"') => self.parse_string(),
            Some('[') => {
                self.pos += 1;
                let mut items = Vec::new();
                self.skip_ws();
                if self.eat(']') {
                    return Ok(Value::Tuple(items));
                }
                loop {
                    items.push(self.parse_value()?);
                    self.skip_ws();
                    if self.eat(',') {
                        continue;
                    }
                    self.expect(']')?;
                    break;
                }
                Ok(Value::Tuple(items))
            }
            Some(c) if c.is_ascii_digit() => self.parse_number(),
            Some('-') if self.chars.get(self.pos + 1).is_some_and(|d| d.is_ascii_digit()) => {
                self.parse_number()
            }
            Some(c) if Self::is_ident_char(c) => {
                let save = self.pos;
                let ident = self.take_ident();
                match self.peek() {
                    // A nested term or annotated atom: re-parse from the start.
                    Some('(') | Some('[') => {
                        self.pos = save;
                        Ok(Value::Term(self.parse_term(false)?))
                    }
                    _ if ident == "_" => Ok(Value::Var(None)),
                    _ if ident.starts_with(|c: char| c.is_uppercase() || c == '_') => {
                        Ok(Value::Var(Some(ident)))
                    }
                    _ => Ok(Value::Term(Term::atom(ident))),
                }
            }
            _ => Err(CodecError::InvalidArgument {
                fragment: self.rest(),
                reason: "expected a number, string, atom, variable, or list".into(),
            }),
        }
    }

    fn parse_string(&mut self) -> Result<Value, CodecError> {
        self.pos += 1; // opening quote
        let mut out = String::new();
        loop {
            match self.peek() {
                Some('\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(c) => {
                            out.push(c);
                            self.pos += 1;
                        }
                        None => {
                            return Err(CodecError::UnterminatedString {
                                input: self.input.to_string(),
                            });
                        }
                    }
                }
                Some('"') => {
                    self.pos += 1;
                    return Ok(Value::Str(out));
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
                None => {
                    return Err(CodecError::UnterminatedString {
                        input: self.input.to_string(),
                    });
                }
            }
        }
    }

    fn parse_number(&mut self) -> Result<Value, CodecError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        {
            self.pos += 1;
        }
        let fragment: String = self.chars[start..self.pos].iter().collect();
        if fragment.contains(['.', 'e', 'E']) {
            fragment
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| CodecError::InvalidArgument {
                    fragment,
                    reason: e.to_string(),
                })
        } else {
            fragment
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| CodecError::InvalidArgument {
                    fragment,
                    reason: e.to_string(),
                })
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
