//! Path-based selection for container values
//!
//! Supports `$.user.name`, `items[0]`, `$['key with spaces']`.

use crate::contract::{KeyComparison, VariantValue};
use crate::error::{VariantError, VariantResult};
use crate::variant::Variant;

/// Maximum number of path segments allowed.
pub const MAX_PATH_SEGMENTS: usize = 100;

/// Path segment for navigating values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object key access: `.key` or `['key']`
    Key(String),
    /// Array index access: `[index]`
    Index(usize),
}

/// Walks `path` from `root`. Missing segments yield `root`'s null.
pub fn select(root: &dyn VariantValue, path: &str) -> VariantResult<Variant> {
    let segments = parse_path(path)?;
    let Some((first, rest)) = segments.split_first() else {
        return Ok(Variant::from_box(root.clone_box()));
    };

    let mut current = match step(root, first) {
        Some(next) => next,
        None => return Ok(root.null()),
    };
    for segment in rest {
        current = match step(current.inner(), segment) {
            Some(next) => next,
            None => return Ok(root.null()),
        };
    }
    Ok(current)
}

fn step(value: &dyn VariantValue, segment: &PathSegment) -> Option<Variant> {
    match segment {
        PathSegment::Key(key) => value.property(key, KeyComparison::IgnoreCase),
        PathSegment::Index(index) => value.element(*index),
    }
}

/// Parses a path into segments.
///
/// - `user.name` -> `[Key("user"), Key("name")]`
/// - `$.items[0]` -> `[Key("items"), Index(0)]`
/// - `$['a.b']` -> `[Key("a.b")]`
pub fn parse_path(path: &str) -> VariantResult<Vec<PathSegment>> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(VariantError::invalid_argument("path", "path is empty"));
    }
    let body = trimmed.strip_prefix('$').unwrap_or(trimmed);

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = body.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '.' => flush(&mut current, &mut segments)?,
            '[' => {
                flush(&mut current, &mut segments)?;
                let segment = match chars.peek() {
                    Some(&quote @ ('\'' | '"')) => {
                        chars.next();
                        let mut key = String::new();
                        loop {
                            match chars.next() {
                                Some(c) if c == quote => break,
                                Some(c) => key.push(c),
                                None => return Err(malformed(path, "unterminated quoted key")),
                            }
                        }
                        PathSegment::Key(key)
                    }
                    _ => {
                        let mut digits = String::new();
                        while let Some(&c) = chars.peek() {
                            if c == ']' {
                                break;
                            }
                            digits.push(c);
                            chars.next();
                        }
                        let index = digits
                            .trim()
                            .parse::<usize>()
                            .map_err(|_| malformed(path, "array index is not a number"))?;
                        PathSegment::Index(index)
                    }
                };
                if chars.next() != Some(']') {
                    return Err(malformed(path, "missing ']'"));
                }
                push(&mut segments, segment)?;
            }
            _ => current.push(ch),
        }
    }
    flush(&mut current, &mut segments)?;
    Ok(segments)
}

fn flush(current: &mut String, segments: &mut Vec<PathSegment>) -> VariantResult<()> {
    if current.is_empty() {
        return Ok(());
    }
    push(segments, PathSegment::Key(std::mem::take(current)))
}

fn push(segments: &mut Vec<PathSegment>, segment: PathSegment) -> VariantResult<()> {
    if segments.len() >= MAX_PATH_SEGMENTS {
        return Err(VariantError::invalid_argument(
            "path",
            format!("more than {MAX_PATH_SEGMENTS} segments"),
        ));
    }
    segments.push(segment);
    Ok(())
}

fn malformed(path: &str, reason: &str) -> VariantError {
    VariantError::invalid_argument("path", format!("{reason} in '{path}'"))
}
