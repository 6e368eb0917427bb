//! Query parameters and `${key}` substitution.

use std::collections::HashMap;
use std::iter::Peekable;
use std::str::CharIndices;

use serde::{Deserialize, Serialize};

/// Param added to every new search, holding the user that started it.
pub const CURRENT_USER: &str = "currentUser";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Param {
    pub key: String,
    pub value: String,
}

impl Param {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Key to value lookup. Later params win over earlier ones with the same key.
pub fn param_map(params: &[Param]) -> HashMap<String, String> {
    params
        .iter()
        .map(|param| (param.key.clone(), param.value.clone()))
        .collect()
}

/// Parses `k1=v1 k2="v 2"` into params.
///
/// Quoted values may contain whitespace and `\"` escapes. Fragments without
/// an `=` are skipped.
pub fn parse_param_string(text: &str) -> Vec<Param> {
    let mut params = Vec::new();
    let mut chars = text.char_indices().peekable();

    loop {
        while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
        let Some(&(start, _)) = chars.peek() else {
            break;
        };

        let mut key_end = text.len();
        let mut has_value = false;
        while let Some(&(index, c)) = chars.peek() {
            if c.is_whitespace() {
                key_end = index;
                break;
            }
            chars.next();
            if c == '=' {
                key_end = index;
                has_value = true;
                break;
            }
        }
        if !has_value {
            continue;
        }

        let key = text[start..key_end].trim();
        let value = read_value(text, &mut chars);
        if !key.is_empty() {
            params.push(Param::new(key, value));
        }
    }

    params
}

fn read_value(text: &str, chars: &mut Peekable<CharIndices<'_>>) -> String {
    if chars.next_if(|(_, c)| *c == '"').is_some() {
        let mut value = String::new();
        while let Some((_, c)) = chars.next() {
            match c {
                '"' => break,
                '\\' => {
                    if let Some((_, escaped)) = chars.next() {
                        value.push(escaped);
                    }
                }
                other => value.push(other),
            }
        }
        return value;
    }

    let start = chars.peek().map_or(text.len(), |(index, _)| *index);
    let mut end = text.len();
    while let Some(&(index, c)) = chars.peek() {
        if c.is_whitespace() {
            end = index;
            break;
        }
        chars.next();
    }
    text[start..end].to_string()
}

/// A fragment of a value containing parameter references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamToken<'a> {
    Text(&'a str),
    Param {
        /// The whole `${...}` reference as written.
        text: &'a str,
        key: &'a str,
        default: Option<&'a str>,
    },
}

impl<'a> ParamToken<'a> {
    /// Splits `value` into literal text and `${key}` / `${key:-default}`
    /// references. An unterminated `${` is literal text.
    pub fn tokenize(value: &'a str) -> Vec<ParamToken<'a>> {
        let mut tokens = Vec::new();
        let mut rest = value;

        while let Some(start) = rest.find("${") {
            let Some(close) = rest[start + 2..].find('}') else {
                break;
            };
            let end = start + 2 + close;
            if start > 0 {
                tokens.push(ParamToken::Text(&rest[..start]));
            }

            let inner = &rest[start + 2..end];
            let (key, default) = match inner.split_once(":-") {
                Some((key, default)) => (key, Some(default)),
                None => (inner, None),
            };
            tokens.push(ParamToken::Param {
                text: &rest[start..=end],
                key: key.trim(),
                default,
            });
            rest = &rest[end + 1..];
        }

        if !rest.is_empty() {
            tokens.push(ParamToken::Text(rest));
        }
        tokens
    }
}

/// Replaces parameter references in `value`.
///
/// Resolution order: a matching param, then the inline default, then (with
/// `keep_unmatched`) the reference text itself; otherwise nothing. Substituted
/// param values containing whitespace are double quoted.
pub fn replace_parameters(
    value: &str,
    params: &HashMap<String, String>,
    keep_unmatched: bool,
) -> String {
    let mut out = String::with_capacity(value.len());
    for token in ParamToken::tokenize(value) {
        match token {
            ParamToken::Text(text) => out.push_str(text),
            ParamToken::Param { text, key, default } => {
                if let Some(replacement) = params.get(key) {
                    push_quoted(&mut out, replacement);
                } else if let Some(default) = default {
                    out.push_str(default);
                } else if keep_unmatched {
                    out.push_str(text);
                }
            }
        }
    }
    out
}

fn push_quoted(out: &mut String, value: &str) {
    if value.chars().any(char::is_whitespace) {
        out.push('"');
        for c in value.chars() {
            if c == '"' || c == '\\' {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('"');
    } else {
        out.push_str(value);
    }
}
