//! Parameter name extraction from declaration text.
//!
//! Methods registered through [`crate::builder::NamespaceBuilder::declare`]
//! describe themselves with a signature string such as
//! `"fn add(a: f64, /* rhs */ b: f64)"` or `"function (a, b, callback)"`.
//! The names recovered here drive the named-parameter mapping.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ExtractionError;

static STRIP_COMMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(//.*$)|(/\*[\s\S]*?\*/)").expect("valid regex"));

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:fn|function)\b([^(]*)\(")
        .expect("valid regex")
});

/// Name and ordered parameter names of a declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Empty for anonymous declarations such as `function (a, b)`
    pub name: String,
    pub params: Vec<String>,
}

/// Parse a declaration into its name and parameter names.
///
/// Commas nested in `()`, `[]`, `<>` or `{}` belong to a parameter's type or
/// default and do not split the list. A leading `self` receiver is not a
/// parameter and is skipped.
pub fn parse_declaration(text: &str) -> Result<Declaration, ExtractionError> {
    let stripped = STRIP_COMMENTS.replace_all(text, "");
    let no_list = || ExtractionError::NoParameterList(text.trim().to_string());

    let captures = DECLARATION.captures(&stripped).ok_or_else(no_list)?;
    let opening = captures.get(0).ok_or_else(no_list)?;
    let name = captures
        .get(1)
        .map(|m| leading_identifier(m.as_str()))
        .unwrap_or_default();

    let tokens = split_parameter_list(&stripped[opening.end()..]).ok_or_else(no_list)?;
    let params = match tokens.as_slice() {
        [only] if only.trim().is_empty() => Vec::new(),
        [first, rest @ ..] if is_receiver(first) => rest.iter().map(|t| bare_name(t)).collect(),
        _ => tokens.iter().map(|t| bare_name(t)).collect(),
    };

    Ok(Declaration { name, params })
}

/// Ordered formal parameter names of a declaration.
///
/// Duplicates and empty names are passed through unchanged.
pub fn extract_parameter_names(text: &str) -> Result<Vec<String>, ExtractionError> {
    parse_declaration(text).map(|declaration| declaration.params)
}

/// Split the text after an opening `(` on top-level commas, up to the
/// matching `)`. `None` if the list is never closed.
fn split_parameter_list(list: &str) -> Option<Vec<&str>> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut previous = None;

    for (index, c) in list.char_indices() {
        match c {
            '(' | '[' | '{' | '<' => depth += 1,
            ')' if depth == 0 => {
                tokens.push(&list[start..index]);
                return Some(tokens);
            }
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            // `->` and `=>` are arrows, not closing brackets
            '>' if !matches!(previous, Some('-') | Some('=')) => {
                depth = depth.saturating_sub(1)
            }
            ',' if depth == 0 => {
                tokens.push(&list[start..index]);
                start = index + c.len_utf8();
            }
            _ => {}
        }
        previous = Some(c);
    }
    None
}

fn leading_identifier(raw: &str) -> String {
    raw.trim()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
        .collect()
}

/// The bound name, without a `: Type` annotation or `= default`
fn binding(token: &str) -> &str {
    let token = token.trim();
    match token.find([':', '=']) {
        Some(end) => token[..end].trim_end(),
        None => token,
    }
}

/// `self`, `mut self`, `&self`, `&mut self`, `&'a self`, `self: Arc<Self>`
fn is_receiver(token: &str) -> bool {
    let mut name = binding(token);
    if let Some(rest) = name.strip_prefix('&') {
        name = rest.trim_start();
        if name.starts_with('\'') {
            name = name
                .split_once(char::is_whitespace)
                .map(|(_, rest)| rest.trim_start())
                .unwrap_or_default();
        }
    }
    let name = name.strip_prefix("mut ").map(str::trim_start).unwrap_or(name);
    name == "self"
}

fn bare_name(token: &str) -> String {
    let token = binding(token);
    let token = token.strip_prefix("mut ").map(str::trim_start).unwrap_or(token);
    strip_marker(token).to_string()
}

/// `_unused_` -> `unused`; a one-sided marker such as `_unused` is kept.
fn strip_marker(token: &str) -> &str {
    let mut chars = token.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last))
            if first == last
                && !first.is_alphanumeric()
                && token.len() > first.len_utf8() * 2 =>
        {
            &token[first.len_utf8()..token.len() - last.len_utf8()]
        }
        _ => token,
    }
}
