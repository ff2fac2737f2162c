/*
 * jsonpath.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! JSONPath-style query evaluation.
//!
//! Supports the query forms templates are authored against:
//!
//! - root and dotted keys: `$.applicants.firstName`, `applicants.firstName`
//! - bracket keys: `$['applicants']`
//! - indexes and slices: `[0]`, `[-1]`, `[1:3]`, `[:2]`
//! - wildcards: `[*]`
//! - deep scan: `$..lastName`
//! - predicate filters: `[?(@.type=='PRIMARY')]` with `==`, `!=`, `<`,
//!   `<=`, `>`, `>=`
//! - simplified filters: `[type='PRIMARY']`, normalized into the canonical
//!   form before parsing
//!
//! A query with no wildcard/slice/filter/scan segment is *definite*: it
//! addresses at most one value and evaluates to that value. Indefinite
//! queries evaluate to the list of matches in document order.

use serde_json::Value;

/// One parsed path segment.
#[derive(Debug, Clone, PartialEq)]
enum Segment {
    /// `.key` or `['key']`
    Key(String),
    /// `[n]`, negative indexes count from the end
    Index(i64),
    /// `[*]`
    Wildcard,
    /// `[start:end]`, either side optional
    Slice { start: Option<i64>, end: Option<i64> },
    /// `[?(@.path op literal)]`
    Filter(Predicate),
    /// `..key`
    DeepScan(String),
}

/// Comparison operator inside a filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A filter predicate: `@.path op literal`.
#[derive(Debug, Clone, PartialEq)]
struct Predicate {
    path: Vec<String>,
    op: CmpOp,
    literal: Value,
}

/// A parsed query.
#[derive(Debug, Clone)]
pub struct Query {
    segments: Vec<Segment>,
    definite: bool,
}

impl Query {
    /// Parse a query expression. `None` means the expression is malformed,
    /// which callers degrade to an unresolved result.
    pub fn parse(expression: &str) -> Option<Query> {
        let normalized = normalize(expression.trim());
        let segments = Parser::new(&normalized).parse()?;
        let definite = segments
            .iter()
            .all(|s| matches!(s, Segment::Key(_) | Segment::Index(_)));
        Some(Query { segments, definite })
    }

    /// Whether this query addresses at most one value.
    pub fn is_definite(&self) -> bool {
        self.definite
    }

    /// Run the query, returning matches in document order.
    pub fn run<'a>(&self, data: &'a Value) -> Vec<&'a Value> {
        let mut current = vec![data];
        for segment in &self.segments {
            current = apply(segment, &current);
            if current.is_empty() {
                break;
            }
        }
        current
    }
}

/// Evaluate an expression to a single value.
///
/// Definite queries yield their one match. Indefinite queries yield the
/// array of matches (callers that need a scalar unwrap single-element
/// arrays). No match at all is `None`.
pub fn evaluate(expression: &str, data: &Value) -> Option<Value> {
    let query = Query::parse(expression)?;
    let matches = query.run(data);
    if matches.is_empty() {
        return None;
    }
    if query.is_definite() {
        Some(matches[0].clone())
    } else {
        Some(Value::Array(matches.into_iter().cloned().collect()))
    }
}

/// Rewrite simplified `[field='value']` filters into the canonical
/// `[?(@.field=='value')]` form. Canonical filters, indexes, slices, and
/// wildcards pass through untouched.
fn normalize(expression: &str) -> String {
    let mut out = String::with_capacity(expression.len());
    let chars: Vec<char> = expression.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '[' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        // Collect the bracket group, respecting quoted spans.
        let start = i;
        let mut quote: Option<char> = None;
        let mut end = None;
        i += 1;
        while i < chars.len() {
            let c = chars[i];
            match quote {
                Some(q) if c == q => quote = None,
                Some(_) => {}
                None if c == '\'' || c == '"' => quote = Some(c),
                None if c == ']' => {
                    end = Some(i);
                    break;
                }
                None => {}
            }
            i += 1;
        }
        let Some(end) = end else {
            // Unterminated bracket: emit as-is, the parser will reject it.
            out.extend(&chars[start..]);
            break;
        };
        let content: String = chars[start + 1..end].iter().collect();
        out.push('[');
        out.push_str(&normalize_bracket(&content));
        out.push(']');
        i = end + 1;
    }
    out
}

fn normalize_bracket(content: &str) -> String {
    let trimmed = content.trim();
    let first = trimmed.chars().next().unwrap_or(']');
    // Canonical filter, wildcard, quoted key, index, or slice: untouched.
    if matches!(first, '?' | '*' | '\'' | '"')
        || trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || c == '-' || c == ':' || c.is_whitespace())
    {
        return trimmed.to_string();
    }
    // Simplified filter: `lhs op rhs` becomes `?(@.lhs op rhs)`, with the
    // single `=` spelled as `==` in the canonical form.
    if let Some((lhs, op, rhs)) = split_comparison(trimmed) {
        let op = if op == "=" { "==" } else { op };
        return format!("?(@.{}{}{})", lhs.trim(), op, rhs.trim());
    }
    trimmed.to_string()
}

/// Split `lhs op rhs` on the first comparison operator outside quotes.
fn split_comparison(content: &str) -> Option<(&str, &str, &str)> {
    let bytes = content.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'\'' || b == b'"' => quote = Some(b),
            None => {
                for op in ["==", "!=", "<=", ">=", "=", "<", ">"] {
                    if content[i..].starts_with(op) {
                        return Some((&content[..i], op, &content[i + op.len()..]));
                    }
                }
            }
        }
        i += 1;
    }
    None
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(expression: &str) -> Parser {
        Parser {
            chars: expression.chars().collect(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Option<Vec<Segment>> {
        let mut segments = Vec::new();
        if self.peek() == Some('$') {
            self.pos += 1;
        }
        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.pos += 1;
                    if self.peek() == Some('.') {
                        self.pos += 1;
                        let key = self.ident()?;
                        segments.push(Segment::DeepScan(key));
                    } else {
                        let key = self.ident()?;
                        segments.push(Segment::Key(key));
                    }
                }
                '[' => {
                    self.pos += 1;
                    segments.push(self.bracket()?);
                }
                _ if segments.is_empty() && is_ident_char(c) => {
                    let key = self.ident()?;
                    segments.push(Segment::Key(key));
                }
                _ => return None,
            }
        }
        Some(segments)
    }

    fn bracket(&mut self) -> Option<Segment> {
        self.skip_ws();
        let segment = match self.peek()? {
            '*' => {
                self.pos += 1;
                Segment::Wildcard
            }
            '?' => {
                self.pos += 1;
                self.expect('(')?;
                let predicate = self.predicate()?;
                self.expect(')')?;
                Segment::Filter(predicate)
            }
            '\'' | '"' => {
                let key = self.quoted()?;
                Segment::Key(key)
            }
            _ => self.index_or_slice()?,
        };
        self.skip_ws();
        self.expect(']')?;
        Some(segment)
    }

    fn predicate(&mut self) -> Option<Predicate> {
        self.skip_ws();
        self.expect('@')?;
        self.expect('.')?;
        let mut path = vec![self.ident()?];
        while self.peek() == Some('.') {
            self.pos += 1;
            path.push(self.ident()?);
        }
        self.skip_ws();
        let op = self.cmp_op()?;
        self.skip_ws();
        let literal = self.literal()?;
        self.skip_ws();
        Some(Predicate { path, op, literal })
    }

    fn cmp_op(&mut self) -> Option<CmpOp> {
        let rest: String = self.chars[self.pos..].iter().collect();
        let (op, len) = if rest.starts_with("==") {
            (CmpOp::Eq, 2)
        } else if rest.starts_with("!=") {
            (CmpOp::Ne, 2)
        } else if rest.starts_with("<=") {
            (CmpOp::Le, 2)
        } else if rest.starts_with(">=") {
            (CmpOp::Ge, 2)
        } else if rest.starts_with('<') {
            (CmpOp::Lt, 1)
        } else if rest.starts_with('>') {
            (CmpOp::Gt, 1)
        } else if rest.starts_with('=') {
            // Tolerated single-= spelling, same as the simplified form.
            (CmpOp::Eq, 1)
        } else {
            return None;
        };
        self.pos += len;
        Some(op)
    }

    fn literal(&mut self) -> Option<Value> {
        match self.peek()? {
            '\'' | '"' => self.quoted().map(Value::String),
            c if c.is_ascii_digit() || c == '-' => {
                let start = self.pos;
                if c == '-' {
                    self.pos += 1;
                }
                while matches!(self.peek(), Some(d) if d.is_ascii_digit() || d == '.') {
                    self.pos += 1;
                }
                let text: String = self.chars[start..self.pos].iter().collect();
                serde_json::from_str(&text).ok()
            }
            _ => {
                let word = self.ident()?;
                match word.as_str() {
                    "true" => Some(Value::Bool(true)),
                    "false" => Some(Value::Bool(false)),
                    "null" => Some(Value::Null),
                    _ => None,
                }
            }
        }
    }

    fn index_or_slice(&mut self) -> Option<Segment> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '-' || c == ':' || c.is_whitespace())
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let text = text.trim();
        if let Some((lhs, rhs)) = text.split_once(':') {
            let parse_side = |s: &str| -> Option<Option<i64>> {
                let s = s.trim();
                if s.is_empty() {
                    Some(None)
                } else {
                    s.parse().ok().map(Some)
                }
            };
            Some(Segment::Slice {
                start: parse_side(lhs)?,
                end: parse_side(rhs)?,
            })
        } else {
            text.parse().ok().map(Segment::Index)
        }
    }

    fn quoted(&mut self) -> Option<String> {
        let quote = self.peek()?;
        self.pos += 1;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == quote {
                let text: String = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                return Some(text);
            }
            self.pos += 1;
        }
        None
    }

    fn ident(&mut self) -> Option<String> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if is_ident_char(c)) {
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        Some(self.chars[start..self.pos].iter().collect())
    }

    fn expect(&mut self, expected: char) -> Option<()> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Some(())
        } else {
            None
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn apply<'a>(segment: &Segment, current: &[&'a Value]) -> Vec<&'a Value> {
    let mut next = Vec::new();
    for value in current {
        match segment {
            Segment::Key(key) => match value {
                Value::Object(map) => {
                    if let Some(v) = map.get(key) {
                        next.push(v);
                    }
                }
                // A key step over an array maps over its elements, so a
                // filter result can be projected: `[?(...)].firstName`.
                Value::Array(items) => {
                    for item in items {
                        if let Some(v) = item.as_object().and_then(|m| m.get(key)) {
                            next.push(v);
                        }
                    }
                }
                _ => {}
            },
            Segment::Index(index) => {
                if let Value::Array(items) = value {
                    if let Some(i) = resolve_index(*index, items.len()) {
                        next.push(&items[i]);
                    }
                }
            }
            Segment::Wildcard => match value {
                Value::Array(items) => next.extend(items.iter()),
                Value::Object(map) => next.extend(map.values()),
                _ => {}
            },
            Segment::Slice { start, end } => {
                if let Value::Array(items) = value {
                    let len = items.len() as i64;
                    let lo = clamp_slice_bound(start.unwrap_or(0), len);
                    let hi = clamp_slice_bound(end.unwrap_or(len), len);
                    if lo < hi {
                        next.extend(items[lo as usize..hi as usize].iter());
                    }
                }
            }
            Segment::Filter(predicate) => match value {
                Value::Array(items) => {
                    next.extend(items.iter().filter(|item| matches(predicate, item)));
                }
                other => {
                    if matches(predicate, other) {
                        next.push(other);
                    }
                }
            },
            Segment::DeepScan(key) => {
                deep_scan(value, key, &mut next);
            }
        }
    }
    next
}

fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = if index < 0 { len + index } else { index };
    if (0..len).contains(&resolved) {
        Some(resolved as usize)
    } else {
        None
    }
}

fn clamp_slice_bound(bound: i64, len: i64) -> i64 {
    let resolved = if bound < 0 { len + bound } else { bound };
    resolved.clamp(0, len)
}

fn deep_scan<'a>(value: &'a Value, key: &str, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                if k == key {
                    out.push(v);
                }
                deep_scan(v, key, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                deep_scan(item, key, out);
            }
        }
        _ => {}
    }
}

fn matches(predicate: &Predicate, item: &Value) -> bool {
    let mut current = item;
    for key in &predicate.path {
        match current {
            Value::Object(map) => match map.get(key) {
                Some(v) => current = v,
                None => return false,
            },
            _ => return false,
        }
    }
    compare(current, predicate.op, &predicate.literal)
}

fn compare(value: &Value, op: CmpOp, literal: &Value) -> bool {
    use std::cmp::Ordering;

    let ordering = match (value, literal) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
        (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    };
    match (op, ordering) {
        (CmpOp::Eq, Some(Ordering::Equal)) => true,
        (CmpOp::Ne, Some(Ordering::Equal)) => false,
        (CmpOp::Ne, _) => true,
        (CmpOp::Lt, Some(Ordering::Less)) => true,
        (CmpOp::Le, Some(Ordering::Less | Ordering::Equal)) => true,
        (CmpOp::Gt, Some(Ordering::Greater)) => true,
        (CmpOp::Ge, Some(Ordering::Greater | Ordering::Equal)) => true,
        _ => false,
    }
}
