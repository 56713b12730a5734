//! Identity matching for tracked hosts
//!
//! A host can be referenced by three different identifiers: its tracking key,
//! its resolved address, or the timestamp of the conversation message that
//! registered it. [`Identity`] bundles these (already normalized) so every
//! lookup goes through the same rules.

use std::net::IpAddr;

use regex::Regex;

use crate::error::RegistryError;

/// Normalize a user supplied query into a tracking key
pub fn normalize_key(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Normalized identifiers of a single tracked host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    key: String,
    address: String,
    conversation: String,
}

impl Identity {
    pub fn new(key: &str, address: IpAddr, conversation: &str) -> Self {
        Self {
            key: normalize_key(key),
            address: address.to_string().to_lowercase(),
            conversation: conversation.to_lowercase(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Check whether `id` refers to this host by key, address or conversation
    ///
    /// An empty conversation timestamp never matches.
    pub fn matches(&self, id: &str) -> bool {
        let id = normalize_key(id);
        if id.is_empty() {
            return false;
        }

        id == self.key || id == self.address || (!self.conversation.is_empty() && id == self.conversation)
    }

    /// Check whether the key or the address matches a glob pattern
    pub fn matches_glob(&self, glob: &Glob) -> bool {
        glob.is_match(&self.key) || glob.is_match(&self.address)
    }
}

/// Shell-style wildcard pattern (`*`, `?`, `[abc]`, `[!a-z]`)
///
/// Matching is anchored and case-insensitive.
#[derive(Debug, Clone)]
pub struct Glob {
    regex: Regex,
}

impl Glob {
    pub fn new(pattern: &str) -> Result<Self, RegistryError> {
        let regex = Regex::new(&translate(pattern)).map_err(|e| RegistryError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { regex })
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }
}

/// Translate a glob into an anchored, case-insensitive regular expression
fn translate(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("(?i)^");
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' if i + 1 < chars.len() => {
                i += 1;
                out.push_str(&regex::escape(&chars[i].to_string()));
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.push_str(&translate_class(&chars[i + 1..end]));
                    i = end;
                }
                // unterminated class, treat the bracket literally
                None => out.push_str(r"\["),
            },
            c => out.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }

    out.push('$');
    out
}

/// Index of the `]` closing the class opened at `start`
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    if chars.get(i) == Some(&'!') || chars.get(i) == Some(&'^') {
        i += 1;
    }
    // a leading `]` is part of the class
    if chars.get(i) == Some(&']') {
        i += 1;
    }

    (i..chars.len()).find(|&j| chars[j] == ']')
}

fn translate_class(body: &[char]) -> String {
    let (negated, body) = match body.first() {
        Some('!') | Some('^') => (true, &body[1..]),
        _ => (false, body),
    };

    let mut out = String::from("[");
    if negated {
        out.push('^');
    }

    for (i, &c) in body.iter().enumerate() {
        let is_range = c == '-'
            && i > 0
            && i + 1 < body.len()
            && body[i - 1] != '-'
            && body[i + 1] != '-';

        match c {
            '-' if is_range => out.push('-'),
            '\\' | '[' | ']' | '^' | '&' | '~' | '-' => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }

    out.push(']');
    out
}
