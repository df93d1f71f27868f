//! Glob patterns over object keys
//!
//! `*` matches any run of characters inside one path segment, `?` a single
//! character, `[...]` a character class (`[!...]` negated). Everything else
//! matches literally.

use crate::error::{Error, Result};
use regex::Regex;
use std::iter::Peekable;
use std::str::Chars;

/// A compiled glob pattern
#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: String,
    prefix: String,
    regex: Regex,
}

impl GlobPattern {
    /// Compile a glob pattern
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = pattern.trim_start_matches('/');

        let prefix = pattern
            .split('/')
            .take_while(|segment| !has_wildcard(segment))
            .collect::<Vec<_>>();
        // The last segment is a file name unless the whole pattern is literal
        let prefix = if prefix.len() == pattern.split('/').count() {
            prefix[..prefix.len().saturating_sub(1)].join("/")
        } else {
            prefix.join("/")
        };

        let regex = Regex::new(&translate(pattern)).map_err(|e| Error::Glob {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            prefix,
            regex,
        })
    }

    /// The pattern as given
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Directory to list before filtering: the segments ahead of the first wildcard
    pub fn listing_prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether a relative object key matches
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key.trim_start_matches('/'))
    }
}

fn has_wildcard(segment: &str) -> bool {
    segment.contains(['*', '?', '['])
}

/// Read a class body after `[`, consuming through the closing `]`
///
/// A `]` right after `[` or `[!` is a member. Returns `None`, consuming
/// nothing, when the class is never closed.
fn parse_class(chars: &mut Peekable<Chars<'_>>) -> Option<(bool, Vec<char>)> {
    let mut ahead = chars.clone();
    let negated = ahead.next_if_eq(&'!').is_some();

    let mut members = Vec::new();
    if let Some(c) = ahead.next_if_eq(&']') {
        members.push(c);
    }
    loop {
        match ahead.next()? {
            ']' => break,
            c => members.push(c),
        }
    }

    *chars = ahead;
    Some((negated, members))
}

fn translate(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    out.push('^');

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                while chars.peek() == Some(&'*') {
                    chars.next();
                }
                out.push_str("[^/]*");
            }
            '?' => out.push_str("[^/]"),
            '[' => match parse_class(&mut chars) {
                Some((negated, members)) => {
                    out.push('[');
                    if negated {
                        out.push_str("^/");
                    }
                    for m in members {
                        if matches!(m, '\\' | '[' | ']' | '^' | '&' | '~') {
                            out.push('\\');
                        }
                        out.push(m);
                    }
                    out.push(']');
                }
                None => out.push_str(&regex::escape("[")),
            },
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }

    out.push('$');
    out
}
