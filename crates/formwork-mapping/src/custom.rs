/*
 * custom.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Named custom transforms composed over the other strategies.
//!
//! A custom expression has the form `fn:arg1,arg2,...`. Each argument is
//! resolved before the transform runs:
//!
//! 1. quoted text (`'...'` or `"..."`) is a literal
//! 2. a `direct:` / `jsonpath:` / `jsonata:` prefix forces that strategy
//!    for the rest of the argument
//! 3. bare integers, values containing `/` or `-`, and date patterns
//!    (a repeated date-letter run like `yyyy` or `MM/dd`) are literals
//! 4. anything else is a field reference; JSONPath when the expression
//!    contains `[`, direct navigation otherwise
//!
//! An unknown transform name or any argument-resolution failure degrades
//! the whole field to an empty string.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use base64::Engine;
use chrono::{Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use serde_json::Value;

use crate::value::cast_string;
use crate::{direct, jsonata, jsonpath};

/// Context passed to every transform invocation.
///
/// `today` is injectable so date-relative transforms (age calculation) are
/// deterministic under test.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext {
    pub today: NaiveDate,
}

type TransformFn = Box<dyn Fn(&[String], &TransformContext) -> Option<String> + Send + Sync>;

/// Registry of named transforms, pre-populated with the built-in set and
/// extensible at construction time.
pub struct TransformRegistry {
    transforms: HashMap<String, TransformFn>,
    context: TransformContext,
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("transforms", &self.transforms.keys().collect::<Vec<_>>())
            .field("context", &self.context)
            .finish()
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformRegistry {
    /// Create a registry with the built-in transforms and today's date.
    pub fn new() -> Self {
        let mut registry = TransformRegistry {
            transforms: HashMap::new(),
            context: TransformContext {
                today: Local::now().date_naive(),
            },
        };
        registry.install_builtins();
        registry
    }

    /// Pin the registry's notion of "today" (for deterministic tests).
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.context.today = today;
        self
    }

    /// Register (or replace) a named transform.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        transform: impl Fn(&[String], &TransformContext) -> Option<String> + Send + Sync + 'static,
    ) {
        self.transforms.insert(name.into(), Box::new(transform));
    }

    /// Apply a transform by name. Unknown names are `None`.
    pub fn apply(&self, name: &str, args: &[String]) -> Option<String> {
        let transform = self.transforms.get(name)?;
        transform(args, &self.context)
    }

    /// Whether a transform with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    fn install_builtins(&mut self) {
        self.register("passthrough", |args, _| {
            Some(args.first().cloned().unwrap_or_default())
        });
        self.register("formatPhone", |args, _| {
            args.first().map(|raw| format_phone(raw))
        });
        self.register("calculateAge", |args, ctx| {
            let dob = parse_date_flexible(args.first()?)?;
            calculate_age(dob, ctx.today).map(|age| age.to_string())
        });
        self.register("formatCurrency", |args, _| {
            let amount: f64 = args.first()?.trim().parse().ok()?;
            Some(format_currency(amount))
        });
        self.register("encode", |args, _| {
            Some(base64::engine::general_purpose::STANDARD.encode(args.first()?))
        });
        self.register("randomString", |args, _| {
            let length = args
                .first()
                .and_then(|a| a.trim().parse::<usize>().ok())
                .unwrap_or(8)
                .min(256);
            let value: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(length)
                .map(char::from)
                .collect();
            Some(value)
        });
        self.register("formatDate", |args, _| {
            let (value, target) = match args {
                [value, target] => (parse_date_flexible(value)?, target),
                [value, source, target] => {
                    let pattern = java_pattern_to_chrono(source);
                    (NaiveDate::parse_from_str(value, &pattern).ok()?, target)
                }
                _ => return None,
            };
            Some(value.format(&java_pattern_to_chrono(target)).to_string())
        });
        self.register("daysBetween", |args, _| {
            let [from, to] = args else { return None };
            let from = parse_date_flexible(from)?;
            let to = parse_date_flexible(to)?;
            Some((to - from).num_days().to_string())
        });
        self.register("stripWhitespace", |args, _| {
            Some(args.first()?.chars().filter(|c| !c.is_whitespace()).collect())
        });
        self.register("capitalize", |args, _| {
            Some(capitalize_words(args.first()?))
        });
        self.register("truncate", |args, _| {
            let value = args.first()?;
            let max: usize = args.get(1)?.trim().parse().ok()?;
            Some(truncate_with_ellipsis(value, max))
        });
        self.register("hash", |args, _| {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            args.first()?.hash(&mut hasher);
            Some(hasher.finish().to_string())
        });
    }
}

/// Evaluate a custom expression against a data tree.
pub fn evaluate(expression: &str, data: &Value, registry: &TransformRegistry) -> Option<String> {
    let expression = expression.trim();
    let (name, raw_args) = match expression.split_once(':') {
        Some((name, rest)) => (name.trim(), rest),
        None => (expression, ""),
    };
    if !registry.contains(name) {
        return None;
    }
    let mut args = Vec::new();
    for raw in split_top_level_commas(raw_args) {
        args.push(resolve_argument(raw.trim(), data)?);
    }
    registry.apply(name, &args)
}

/// Split on commas that are not inside quotes.
fn split_top_level_commas(input: &str) -> Vec<&str> {
    if input.trim().is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    for (i, c) in input.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == ',' => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            None => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

static DATE_LETTER_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(y{2,}|M{2,}|d{2,}|H{2,}|h{2,}|m{2,}|s{2,}|E{2,})").unwrap());

/// Resolve one argument to a string, per the grammar in the module docs.
fn resolve_argument(raw: &str, data: &Value) -> Option<String> {
    // Quoted literal.
    if raw.len() >= 2 {
        let first = raw.chars().next().unwrap();
        if (first == '\'' || first == '"') && raw.ends_with(first) {
            return Some(raw[1..raw.len() - 1].to_string());
        }
    }
    // Explicit strategy prefix.
    if let Some(rest) = raw.strip_prefix("direct:") {
        return direct::evaluate(rest, data).map(|v| cast_string(&v));
    }
    if let Some(rest) = raw.strip_prefix("jsonpath:") {
        return jsonpath::evaluate(rest, data).map(|v| cast_string(&v));
    }
    if let Some(rest) = raw.strip_prefix("jsonata:") {
        return jsonata::evaluate(rest, data).map(|v| cast_string(&v));
    }
    // Bare literal heuristics: integers, slashed/dashed values (dates,
    // phone-ish text), and date patterns.
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
        return Some(raw.to_string());
    }
    if raw.contains('/') || raw.contains('-') || DATE_LETTER_RUN.is_match(raw) {
        return Some(raw.to_string());
    }
    // Unprefixed field reference.
    let value = if raw.contains('[') {
        jsonpath::evaluate(raw, data)
    } else {
        direct::evaluate(raw, data)
    }?;
    Some(cast_string(&value))
}

fn format_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let digits = digits
        .strip_prefix('1')
        .filter(|rest| rest.len() == 10)
        .unwrap_or(&digits);
    if digits.len() == 10 {
        format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..])
    } else {
        raw.to_string()
    }
}

fn calculate_age(dob: NaiveDate, today: NaiveDate) -> Option<u32> {
    if dob > today {
        return None;
    }
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    u32::try_from(age).ok()
}

fn format_currency(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;
    let mut grouped = String::new();
    let digits = whole.to_string();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if negative { "-" } else { "" };
    format!("{sign}${grouped}.{fraction:02}")
}

fn parse_date_flexible(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    for pattern in ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, pattern) {
            return Some(date);
        }
    }
    None
}

/// Translate a Java-style date pattern (`MM/dd/yyyy`) into a chrono format
/// string. Unknown letters pass through as literals.
fn java_pattern_to_chrono(pattern: &str) -> String {
    let mut out = String::new();
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }
        match (c, run) {
            ('y', 4..) => out.push_str("%Y"),
            ('y', _) => out.push_str("%y"),
            ('M', 4..) => out.push_str("%B"),
            ('M', 3) => out.push_str("%b"),
            ('M', _) => out.push_str("%m"),
            ('d', _) => out.push_str("%d"),
            ('H', _) => out.push_str("%H"),
            ('h', _) => out.push_str("%I"),
            ('m', _) => out.push_str("%M"),
            ('s', _) => out.push_str("%S"),
            ('E', 4..) => out.push_str("%A"),
            ('E', _) => out.push_str("%a"),
            ('%', _) => {
                for _ in 0..run {
                    out.push_str("%%");
                }
            }
            _ => {
                for _ in 0..run {
                    out.push(c);
                }
            }
        }
        i += run;
    }
    out
}

fn capitalize_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max).collect();
    format!("{truncated}...")
}
