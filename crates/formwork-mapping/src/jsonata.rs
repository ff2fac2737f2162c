/*
 * jsonata.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! JSONata-style expression evaluation.
//!
//! Covers the expression forms templates are authored against:
//!
//! - field paths: `plan.name`, `$.plan.name` (paths map over arrays, so
//!   `applicants.age` over a collection yields the list of ages)
//! - string concatenation: `firstName & ' ' & lastName`
//! - arithmetic: `+ - * / %`, comparisons `= != < <= > >=` (`==` is
//!   accepted as an alias of `=`), boolean `and` / `or`
//! - conditionals: `age >= 18 ? 'adult' : 'minor'`
//! - aggregates: `$sum(...)`, `$average(...)`, `$max(...)`, `$min(...)`,
//!   `$count(...)`, `$join(..., sep)`
//!
//! Any evaluation error degrades to `None`; the dispatcher renders it as
//! an empty field value.

use serde_json::{json, Value};

use crate::value::{cast_number, cast_string, is_truthy};

/// Evaluate an expression against a data tree.
pub fn evaluate(expression: &str, data: &Value) -> Option<Value> {
    let tokens = lex(expression)?;
    let mut parser = ExprParser {
        tokens,
        pos: 0,
    };
    let ast = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return None;
    }
    eval(&ast, data)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Func(String),
    Num(f64),
    Str(String),
    True,
    False,
    Null,
    And,
    Or,
    Dollar,
    Dot,
    Comma,
    LParen,
    RParen,
    Question,
    Colon,
    Amp,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

fn lex(expression: &str) -> Option<Vec<Token>> {
    let chars: Vec<char> = expression.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '&' => {
                tokens.push(Token::Amp);
                i += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '?' => {
                tokens.push(Token::Question);
                i += 1;
            }
            ':' => {
                tokens.push(Token::Colon);
                i += 1;
            }
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            '=' => {
                tokens.push(Token::Eq);
                i += if chars.get(i + 1) == Some(&'=') { 2 } else { 1 };
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Ne);
                    i += 2;
                } else {
                    return None;
                }
            }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Le);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Ge);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            '\'' | '"' => {
                let quote = c;
                let start = i + 1;
                let mut j = start;
                while j < chars.len() && chars[j] != quote {
                    j += 1;
                }
                if j == chars.len() {
                    return None;
                }
                tokens.push(Token::Str(chars[start..j].iter().collect()));
                i = j + 1;
            }
            '$' => {
                let start = i + 1;
                let mut j = start;
                while j < chars.len() && (chars[j].is_alphanumeric() || chars[j] == '_') {
                    j += 1;
                }
                if j > start {
                    tokens.push(Token::Func(chars[start..j].iter().collect()));
                } else {
                    tokens.push(Token::Dollar);
                }
                i = j;
            }
            c if c.is_ascii_digit() => {
                let start = i;
                let mut j = i;
                while j < chars.len() && (chars[j].is_ascii_digit() || chars[j] == '.') {
                    // A dot followed by a non-digit is a path separator,
                    // not a decimal point.
                    if chars[j] == '.'
                        && !chars.get(j + 1).is_some_and(|d| d.is_ascii_digit())
                    {
                        break;
                    }
                    j += 1;
                }
                let text: String = chars[start..j].iter().collect();
                tokens.push(Token::Num(text.parse().ok()?));
                i = j;
            }
            c if c.is_alphanumeric() || c == '_' => {
                let start = i;
                let mut j = i;
                while j < chars.len() && (chars[j].is_alphanumeric() || chars[j] == '_') {
                    j += 1;
                }
                let word: String = chars[start..j].iter().collect();
                tokens.push(match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" => Token::Null,
                    _ => Token::Ident(word),
                });
                i = j;
            }
            _ => return None,
        }
    }
    Some(tokens)
}

#[derive(Debug, Clone)]
enum Expr {
    Path(Vec<String>),
    Num(f64),
    Str(String),
    Bool(bool),
    Null,
    Concat(Box<Expr>, Box<Expr>),
    Arith(char, Box<Expr>, Box<Expr>),
    Cmp(Token, Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser {
    fn expr(&mut self) -> Option<Expr> {
        self.ternary()
    }

    fn ternary(&mut self) -> Option<Expr> {
        let cond = self.or_expr()?;
        if self.eat(&Token::Question) {
            let then = self.expr()?;
            self.expect(&Token::Colon)?;
            let otherwise = self.expr()?;
            return Some(Expr::Ternary(
                Box::new(cond),
                Box::new(then),
                Box::new(otherwise),
            ));
        }
        Some(cond)
    }

    fn or_expr(&mut self) -> Option<Expr> {
        let mut left = self.and_expr()?;
        while self.eat(&Token::Or) {
            let right = self.and_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Some(left)
    }

    fn and_expr(&mut self) -> Option<Expr> {
        let mut left = self.cmp_expr()?;
        while self.eat(&Token::And) {
            let right = self.cmp_expr()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Some(left)
    }

    fn cmp_expr(&mut self) -> Option<Expr> {
        let left = self.concat_expr()?;
        let op = match self.peek() {
            Some(t @ (Token::Eq | Token::Ne | Token::Lt | Token::Le | Token::Gt | Token::Ge)) => {
                t.clone()
            }
            _ => return Some(left),
        };
        self.pos += 1;
        let right = self.concat_expr()?;
        Some(Expr::Cmp(op, Box::new(left), Box::new(right)))
    }

    fn concat_expr(&mut self) -> Option<Expr> {
        let mut left = self.add_expr()?;
        while self.eat(&Token::Amp) {
            let right = self.add_expr()?;
            left = Expr::Concat(Box::new(left), Box::new(right));
        }
        Some(left)
    }

    fn add_expr(&mut self) -> Option<Expr> {
        let mut left = self.mul_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => '+',
                Some(Token::Minus) => '-',
                _ => return Some(left),
            };
            self.pos += 1;
            let right = self.mul_expr()?;
            left = Expr::Arith(op, Box::new(left), Box::new(right));
        }
    }

    fn mul_expr(&mut self) -> Option<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => '*',
                Some(Token::Slash) => '/',
                Some(Token::Percent) => '%',
                _ => return Some(left),
            };
            self.pos += 1;
            let right = self.unary()?;
            left = Expr::Arith(op, Box::new(left), Box::new(right));
        }
    }

    fn unary(&mut self) -> Option<Expr> {
        if self.eat(&Token::Minus) {
            let inner = self.unary()?;
            return Some(Expr::Arith('-', Box::new(Expr::Num(0.0)), Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Option<Expr> {
        match self.peek()?.clone() {
            Token::Num(n) => {
                self.pos += 1;
                Some(Expr::Num(n))
            }
            Token::Str(s) => {
                self.pos += 1;
                Some(Expr::Str(s))
            }
            Token::True => {
                self.pos += 1;
                Some(Expr::Bool(true))
            }
            Token::False => {
                self.pos += 1;
                Some(Expr::Bool(false))
            }
            Token::Null => {
                self.pos += 1;
                Some(Expr::Null)
            }
            Token::LParen => {
                self.pos += 1;
                let inner = self.expr()?;
                self.expect(&Token::RParen)?;
                Some(inner)
            }
            Token::Func(name) => {
                self.pos += 1;
                self.expect(&Token::LParen)?;
                let mut args = Vec::new();
                if !self.eat(&Token::RParen) {
                    loop {
                        args.push(self.expr()?);
                        if self.eat(&Token::RParen) {
                            break;
                        }
                        self.expect(&Token::Comma)?;
                    }
                }
                Some(Expr::Call(name, args))
            }
            // `$.path` or a bare `$` meaning the whole context.
            Token::Dollar => {
                self.pos += 1;
                if self.eat(&Token::Dot) {
                    self.path()
                } else {
                    Some(Expr::Path(Vec::new()))
                }
            }
            Token::Ident(_) => self.path(),
            _ => None,
        }
    }

    fn path(&mut self) -> Option<Expr> {
        let mut parts = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Ident(name)) => {
                    parts.push(name.clone());
                    self.pos += 1;
                }
                _ => return None,
            }
            if !self.eat(&Token::Dot) {
                break;
            }
        }
        Some(Expr::Path(parts))
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Option<()> {
        if self.eat(token) {
            Some(())
        } else {
            None
        }
    }
}

fn eval(expr: &Expr, data: &Value) -> Option<Value> {
    match expr {
        Expr::Num(n) => Some(json!(n)),
        Expr::Str(s) => Some(Value::String(s.clone())),
        Expr::Bool(b) => Some(Value::Bool(*b)),
        Expr::Null => Some(Value::Null),
        Expr::Path(parts) => eval_path(parts, data),
        Expr::Concat(a, b) => {
            let a = eval(a, data)?;
            let b = eval(b, data)?;
            Some(Value::String(format!("{}{}", cast_string(&a), cast_string(&b))))
        }
        Expr::Arith(op, a, b) => {
            let a = cast_number(&eval(a, data)?)?;
            let b = cast_number(&eval(b, data)?)?;
            let result = match op {
                '+' => a + b,
                '-' => a - b,
                '*' => a * b,
                '/' => {
                    if b == 0.0 {
                        return None;
                    }
                    a / b
                }
                '%' => {
                    if b == 0.0 {
                        return None;
                    }
                    a % b
                }
                _ => return None,
            };
            Some(json!(result))
        }
        Expr::Cmp(op, a, b) => {
            let a = eval(a, data)?;
            let b = eval(b, data)?;
            Some(Value::Bool(compare(op, &a, &b)?))
        }
        Expr::And(a, b) => {
            let a = eval(a, data)?;
            if !is_truthy(&a) {
                return Some(Value::Bool(false));
            }
            let b = eval(b, data)?;
            Some(Value::Bool(is_truthy(&b)))
        }
        Expr::Or(a, b) => {
            let a = eval(a, data)?;
            if is_truthy(&a) {
                return Some(Value::Bool(true));
            }
            let b = eval(b, data)?;
            Some(Value::Bool(is_truthy(&b)))
        }
        Expr::Ternary(cond, then, otherwise) => {
            let cond = eval(cond, data).map(|v| is_truthy(&v)).unwrap_or(false);
            if cond {
                eval(then, data)
            } else {
                eval(otherwise, data)
            }
        }
        Expr::Call(name, args) => {
            let values: Option<Vec<Value>> = args.iter().map(|a| eval(a, data)).collect();
            call(name, &values?)
        }
    }
}

/// Navigate a dotted path. Paths map over arrays: stepping into an array
/// applies the remaining path to every element and collects the results.
fn eval_path(parts: &[String], data: &Value) -> Option<Value> {
    if parts.is_empty() {
        return Some(data.clone());
    }
    let mut current = vec![data];
    for part in parts {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Object(map) => {
                    if let Some(v) = map.get(part) {
                        next.push(v);
                    }
                }
                Value::Array(items) => {
                    for item in items {
                        if let Some(v) = item.as_object().and_then(|m| m.get(part)) {
                            next.push(v);
                        }
                    }
                }
                _ => {}
            }
        }
        current = next;
        if current.is_empty() {
            return None;
        }
    }
    if current.len() == 1 {
        Some(current[0].clone())
    } else {
        Some(Value::Array(current.into_iter().cloned().collect()))
    }
}

fn compare(op: &Token, a: &Value, b: &Value) -> Option<bool> {
    // Numeric comparison when both sides are numeric, else string compare.
    if let (Some(x), Some(y)) = (cast_number_strict(a), cast_number_strict(b)) {
        return Some(match op {
            Token::Eq => x == y,
            Token::Ne => x != y,
            Token::Lt => x < y,
            Token::Le => x <= y,
            Token::Gt => x > y,
            Token::Ge => x >= y,
            _ => return None,
        });
    }
    if let (Value::Bool(x), Value::Bool(y)) = (a, b) {
        return match op {
            Token::Eq => Some(x == y),
            Token::Ne => Some(x != y),
            _ => None,
        };
    }
    let x = cast_string(a);
    let y = cast_string(b);
    Some(match op {
        Token::Eq => x == y,
        Token::Ne => x != y,
        Token::Lt => x < y,
        Token::Le => x <= y,
        Token::Gt => x > y,
        Token::Ge => x >= y,
        _ => return None,
    })
}

/// Number cast that does not coerce booleans (a comparison of `true` with
/// `1` should not silently become numeric).
fn cast_number_strict(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Array(items) if items.len() == 1 => cast_number_strict(&items[0]),
        _ => None,
    }
}

fn call(name: &str, args: &[Value]) -> Option<Value> {
    match name {
        "sum" | "average" | "max" | "min" => {
            let numbers = numeric_items(args.first()?)?;
            if numbers.is_empty() {
                return match name {
                    "sum" => Some(json!(0.0)),
                    _ => None,
                };
            }
            let result = match name {
                "sum" => numbers.iter().sum(),
                "average" => numbers.iter().sum::<f64>() / numbers.len() as f64,
                "max" => numbers.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                "min" => numbers.iter().cloned().fold(f64::INFINITY, f64::min),
                _ => unreachable!(),
            };
            Some(json!(result))
        }
        "count" => {
            let count = match args.first() {
                Some(Value::Array(items)) => items.len(),
                Some(Value::Null) | None => 0,
                Some(_) => 1,
            };
            Some(json!(count))
        }
        "join" => {
            let items = match args.first()? {
                Value::Array(items) => items.clone(),
                other => vec![other.clone()],
            };
            let separator = args.get(1).map(cast_string).unwrap_or_default();
            let joined = items
                .iter()
                .map(cast_string)
                .collect::<Vec<_>>()
                .join(&separator);
            Some(Value::String(joined))
        }
        "string" => Some(Value::String(cast_string(args.first()?))),
        "number" => cast_number(args.first()?).map(|n| json!(n)),
        "uppercase" => Some(Value::String(cast_string(args.first()?).to_uppercase())),
        "lowercase" => Some(Value::String(cast_string(args.first()?).to_lowercase())),
        _ => None,
    }
}

fn numeric_items(value: &Value) -> Option<Vec<f64>> {
    match value {
        Value::Array(items) => items.iter().map(cast_number).collect(),
        other => cast_number(other).map(|n| vec![n]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn data() -> Value {
        json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "flag": true,
            "applicants": [
                {"firstName": "Ada", "age": 36, "premium": 120.5},
                {"firstName": "Alan", "age": 34, "premium": 80.25}
            ]
        })
    }

    #[test]
    fn test_concatenation() {
        assert_eq!(
            evaluate("firstName & ' ' & lastName", &data()),
            Some(json!("Ada Lovelace"))
        );
    }

    #[test]
    fn test_path_maps_over_arrays() {
        assert_eq!(
            evaluate("applicants.firstName", &data()),
            Some(json!(["Ada", "Alan"]))
        );
    }

    #[test]
    fn test_aggregates() {
        assert_eq!(
            evaluate("$sum(applicants.premium)", &data()),
            Some(json!(200.75))
        );
        assert_eq!(evaluate("$count(applicants)", &data()), Some(json!(2)));
        assert_eq!(evaluate("$max(applicants.age)", &data()), Some(json!(36.0)));
        assert_eq!(evaluate("$min(applicants.age)", &data()), Some(json!(34.0)));
        assert_eq!(
            evaluate("$average(applicants.age)", &data()),
            Some(json!(35.0))
        );
    }

    #[test]
    fn test_join() {
        assert_eq!(
            evaluate("$join(applicants.firstName, '; ')", &data()),
            Some(json!("Ada; Alan"))
        );
    }

    #[test]
    fn test_conditional() {
        assert_eq!(
            evaluate("flag ? 'yes' : 'no'", &data()),
            Some(json!("yes"))
        );
        assert_eq!(
            evaluate("$count(applicants) > 5 ? 'many' : 'few'", &data()),
            Some(json!("few"))
        );
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(evaluate("$.flag = true", &data()), Some(json!(true)));
        assert_eq!(evaluate("$.flag == true", &data()), Some(json!(true)));
        assert_eq!(
            evaluate("firstName = 'Ada'", &data()),
            Some(json!(true))
        );
        assert_eq!(evaluate("1 + 1 = 2", &data()), Some(json!(true)));
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(evaluate("2 + 3 * 4", &data()), Some(json!(14.0)));
        assert_eq!(evaluate("(2 + 3) * 4", &data()), Some(json!(20.0)));
        assert_eq!(evaluate("10 / 0", &data()), None);
    }

    #[test]
    fn test_and_or() {
        assert_eq!(
            evaluate("flag and firstName = 'Ada'", &data()),
            Some(json!(true))
        );
        assert_eq!(
            evaluate("flag = false or firstName = 'Ada'", &data()),
            Some(json!(true))
        );
    }

    #[test]
    fn test_missing_path_is_none() {
        assert_eq!(evaluate("middleName", &data()), None);
    }

    #[test]
    fn test_malformed_is_none() {
        assert_eq!(evaluate("firstName &", &data()), None);
        assert_eq!(evaluate("$unknownfn(1)", &data()), None);
        assert_eq!(evaluate("'unterminated", &data()), None);
    }
}
