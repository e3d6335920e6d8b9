//! Resource path decomposition.

use std::fmt;

use crate::error::PathError;

/// Separator used by resource paths.
pub const PATH_SEPARATOR: char = '/';

/// Separator used for paths inside cache keys.
///
/// Differs from [`PATH_SEPARATOR`] because backends with pattern-based key
/// search give `/` a special meaning.
pub const KEY_PATH_SEPARATOR: char = '+';

/// Split a path into its non-empty segments.
///
/// Leading, trailing and repeated separators are dropped; an empty path
/// yields no segments.
pub fn split(path: &str) -> Vec<&str> {
    path.split(PATH_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Join segments with `separator`.
pub fn join<S: AsRef<str>>(segments: &[S], separator: char) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push(separator);
        }
        out.push_str(segment.as_ref());
    }
    out
}

/// A validated resource path, held as its ordered segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    segments: Vec<String>,
}

impl ResourcePath {
    /// Parse and validate a resource path.
    ///
    /// The path must be non-empty and must not carry a query string,
    /// fragment, whitespace or control characters. `/` alone is the root and
    /// has no segments.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }
        if let Some(c) = path.chars().find(|c| matches!(c, '?' | '#')) {
            return Err(PathError::ForbiddenChar(c, path.to_string()));
        }
        if path.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(PathError::Unprintable(path.to_string()));
        }

        Ok(Self::from_segments(split(path)))
    }

    /// Build a path from already-split segments. Empty segments are dropped.
    pub fn from_segments<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Self {
        Self {
            segments: segments
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        }
    }

    /// The path's segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The first `len` segments as a new path.
    pub fn prefix(&self, len: usize) -> ResourcePath {
        Self {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    /// The path without its last segment, or `None` at the root.
    pub fn parent(&self) -> Option<ResourcePath> {
        if self.is_root() {
            None
        } else {
            Some(self.prefix(self.len() - 1))
        }
    }

    /// This path followed by each shorter prefix, down to one segment.
    pub fn ancestors(&self) -> impl Iterator<Item = ResourcePath> + '_ {
        (1..=self.len()).rev().map(move |len| self.prefix(len))
    }

    /// Encode the path for use inside a cache key.
    ///
    /// Segments are joined with [`KEY_PATH_SEPARATOR`]. `%`, `+` and `-` are
    /// percent-escaped inside each segment so a segment can never be
    /// mistaken for a separator.
    pub fn to_key_segment(&self) -> String {
        let escaped: Vec<String> = self.segments.iter().map(|s| escape_segment(s)).collect();
        join(&escaped, KEY_PATH_SEPARATOR)
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PATH_SEPARATOR, join(&self.segments, PATH_SEPARATOR))
    }
}

fn escape_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        match c {
            '%' => out.push_str("%25"),
            '+' => out.push_str("%2B"),
            '-' => out.push_str("%2D"),
            c => out.push(c),
        }
    }
    out
}
