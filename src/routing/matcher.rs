//! Route pattern compilation and path matching.
//!
//! # Responsibilities
//! - Compile a route template (`/tasks/:id/complete`) into segment matchers
//! - Match a concrete `path?query` against a compiled pattern
//! - Capture named segments and the raw query string
//!
//! # Design Decisions
//! - Patterns are compiled once at registration, never per request
//! - Literal segments are compared raw and case-sensitively
//! - A capture consumes exactly one non-empty segment (never spans `/`)
//! - Captured values are percent-decoded after splitting, so `%2F` stays
//!   inside its segment; values that are not valid UTF-8 fail the match
//! - Empty segments and trailing slashes never match (`/tasks/` != `/tasks`)
//! - A query string is accepted only when the pattern ends with `?`
//! - No regex: matching is a single pass over the segments

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Marker that opens a named capture segment.
const CAPTURE_MARKER: char = ':';

/// Trailing marker that allows a query string.
const QUERY_MARKER: char = '?';

/// Errors raised while compiling a route template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("route pattern `{0}` must start with '/'")]
    MissingLeadingSlash(String),

    #[error("route pattern `{0}` contains an empty segment")]
    EmptySegment(String),

    #[error("route pattern `{0}` has a capture without a name")]
    UnnamedCapture(String),

    #[error("route pattern `{pattern}` captures `{name}` more than once")]
    DuplicateCapture { pattern: String, name: String },

    #[error("route pattern `{0}` may only use '?' as its final character")]
    MisplacedQueryMarker(String),
}

/// A single compiled path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture(String),
}

/// Captures produced by a successful match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMatch {
    /// Named segment values, percent-decoded.
    pub params: HashMap<String, String>,
    /// Raw query text after `?`, present only for query-enabled patterns.
    pub query: Option<String>,
}

/// An immutable, compiled route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
    accepts_query: bool,
}

impl PathPattern {
    /// Compile a route template.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let (path, accepts_query) = match pattern.strip_suffix(QUERY_MARKER) {
            Some(rest) => (rest, true),
            None => (pattern, false),
        };

        if path.contains(QUERY_MARKER) {
            return Err(PatternError::MisplacedQueryMarker(pattern.to_string()));
        }

        let rest = path
            .strip_prefix('/')
            .ok_or_else(|| PatternError::MissingLeadingSlash(pattern.to_string()))?;

        let mut segments = Vec::new();
        if !rest.is_empty() {
            for raw in rest.split('/') {
                if raw.is_empty() {
                    return Err(PatternError::EmptySegment(pattern.to_string()));
                }

                let segment = match raw.strip_prefix(CAPTURE_MARKER) {
                    Some("") => return Err(PatternError::UnnamedCapture(pattern.to_string())),
                    Some(name) => {
                        let taken = segments
                            .iter()
                            .any(|s| matches!(s, Segment::Capture(n) if n == name));
                        if taken {
                            return Err(PatternError::DuplicateCapture {
                                pattern: pattern.to_string(),
                                name: name.to_string(),
                            });
                        }
                        Segment::Capture(name.to_string())
                    }
                    None => Segment::Literal(raw.to_string()),
                };
                segments.push(segment);
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
            accepts_query,
        })
    }

    /// The template this pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether a trailing query string is allowed.
    pub fn accepts_query(&self) -> bool {
        self.accepts_query
    }

    /// Match a request target (`/path?query`) against this pattern.
    pub fn match_path(&self, path_and_query: &str) -> Option<PathMatch> {
        let (path, query) = match path_and_query.split_once(QUERY_MARKER) {
            Some((path, query)) => (path, Some(query)),
            None => (path_and_query, None),
        };

        if query.is_some() && !self.accepts_query {
            return None;
        }

        let rest = path.strip_prefix('/')?;
        let parts: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };

        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Capture(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    let value = urlencoding::decode(part).ok()?;
                    params.insert(name.clone(), value.into_owned());
                }
            }
        }

        Some(PathMatch {
            params,
            query: query.map(str::to_string),
        })
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_segment() {
        let pattern = PathPattern::compile("/tasks/:id/complete").unwrap();

        let m = pattern.match_path("/tasks/abc123/complete").unwrap();
        assert_eq!(m.params.get("id").map(String::as_str), Some("abc123"));
        assert_eq!(m.query, None);

        // Wrong segment count
        assert!(pattern.match_path("/tasks/abc123").is_none());
        // Empty capture
        assert!(pattern.match_path("/tasks//complete").is_none());
        // Capture never spans '/'
        assert!(pattern.match_path("/tasks/a/b/complete").is_none());
    }

    #[test]
    fn test_literals_are_case_sensitive() {
        let pattern = PathPattern::compile("/tasks").unwrap();
        assert!(pattern.match_path("/tasks").is_some());
        assert!(pattern.match_path("/Tasks").is_none());
        assert!(pattern.match_path("/task").is_none());
    }

    #[test]
    fn test_trailing_slash_does_not_match() {
        let pattern = PathPattern::compile("/tasks").unwrap();
        assert!(pattern.match_path("/tasks/").is_none());

        let pattern = PathPattern::compile("/tasks/:id").unwrap();
        assert!(pattern.match_path("/tasks/").is_none());
    }

    #[test]
    fn test_root_pattern() {
        let pattern = PathPattern::compile("/").unwrap();
        assert!(pattern.match_path("/").is_some());
        assert!(pattern.match_path("/tasks").is_none());
    }

    #[test]
    fn test_query_requires_marker() {
        let plain = PathPattern::compile("/tasks").unwrap();
        assert!(plain.match_path("/tasks?title=x").is_none());

        let with_query = PathPattern::compile("/tasks?").unwrap();
        assert!(with_query.accepts_query());
        assert_eq!(with_query.match_path("/tasks").unwrap().query, None);
        assert_eq!(
            with_query.match_path("/tasks?title=x&y=z").unwrap().query.as_deref(),
            Some("title=x&y=z")
        );
        assert_eq!(with_query.match_path("/tasks?").unwrap().query.as_deref(), Some(""));
    }

    #[test]
    fn test_captures_are_percent_decoded() {
        let pattern = PathPattern::compile("/tasks/:id").unwrap();

        let m = pattern.match_path("/tasks/hello%20world").unwrap();
        assert_eq!(m.params["id"], "hello world");

        // An encoded slash stays within its segment
        let m = pattern.match_path("/tasks/a%2Fb").unwrap();
        assert_eq!(m.params["id"], "a/b");

        // Invalid UTF-8 after decoding is a miss, not a truncated value
        assert!(pattern.match_path("/tasks/%FF").is_none());
    }

    #[test]
    fn test_literals_compare_raw() {
        let pattern = PathPattern::compile("/tasks").unwrap();
        assert!(pattern.match_path("/task%73").is_none());
    }

    #[test]
    fn test_compile_errors() {
        assert_eq!(
            PathPattern::compile("tasks"),
            Err(PatternError::MissingLeadingSlash("tasks".into()))
        );
        assert_eq!(
            PathPattern::compile("/tasks//x"),
            Err(PatternError::EmptySegment("/tasks//x".into()))
        );
        assert_eq!(
            PathPattern::compile("/tasks/:"),
            Err(PatternError::UnnamedCapture("/tasks/:".into()))
        );
        assert!(matches!(
            PathPattern::compile("/a/:id/b/:id"),
            Err(PatternError::DuplicateCapture { .. })
        ));
        assert_eq!(
            PathPattern::compile("/tasks?/x"),
            Err(PatternError::MisplacedQueryMarker("/tasks?/x".into()))
        );
    }
}
