//! Path normalization and route templates.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::Serialize;

/// Canonical form of a navigation path.
///
/// Strips query and fragment, collapses repeated slashes, removes a trailing
/// slash and guarantees a leading one. The empty path becomes `/`.
pub fn normalize_path(raw: &str) -> String {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    let segments: Vec<&str> = raw[..end].split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return "/".to_string();
    }
    let mut out = String::with_capacity(end + 1);
    for segment in segments {
        out.push('/');
        out.push_str(segment);
    }
    out
}

fn segments(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split('/').filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A route path, either literal (`/employee`) or templated
/// (`/employee/details/:id`, one `:name` per dynamic segment).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: Cow<'static, str>,
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn new(raw: impl Into<Cow<'static, str>>) -> Self {
        let raw = raw.into();
        let normalized = normalize_path(&raw);
        let segments = segments(&normalized)
            .map(|s| match s.strip_prefix(':') {
                Some(name) if !name.is_empty() => Segment::Param(name.to_string()),
                _ => Segment::Literal(s.to_string()),
            })
            .collect();
        Self {
            raw: Cow::Owned(normalized),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_literal(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Literal(_)))
    }

    pub fn literal_segments(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    /// Match an already-normalized path, capturing template parameters.
    pub fn matches(&self, normalized: &str) -> Option<RouteParams> {
        let mut params = RouteParams::default();
        let mut actual = segments(normalized);
        for expected in &self.segments {
            let value = actual.next()?;
            match expected {
                Segment::Literal(lit) if lit == value => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.0.insert(name.clone(), value.to_string());
                }
            }
        }
        if actual.next().is_some() {
            return None;
        }
        Some(params)
    }
}

impl core::fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parameters captured from a templated route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RouteParams(BTreeMap<String, String>);

impl RouteParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_query_fragment_and_slashes() {
        assert_eq!(normalize_path("/employee?page=2"), "/employee");
        assert_eq!(normalize_path("/employee/#top"), "/employee");
        assert_eq!(normalize_path("//employee///details/4/"), "/employee/details/4");
        assert_eq!(normalize_path("employee"), "/employee");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/?next=/home"), "/");
    }

    #[test]
    fn literal_pattern_matches_exactly() {
        let pattern = RoutePattern::new("/employee");
        assert!(pattern.is_literal());
        assert!(pattern.matches("/employee").is_some());
        assert!(pattern.matches("/employee/details").is_none());
        assert!(pattern.matches("/employees").is_none());
    }

    #[test]
    fn template_captures_parameters() {
        let pattern = RoutePattern::new("/employee/details/:id");
        assert!(!pattern.is_literal());
        assert_eq!(pattern.literal_segments(), 2);

        let params = pattern.matches("/employee/details/17").unwrap();
        assert_eq!(params.get("id"), Some("17"));
        assert!(pattern.matches("/employee/details").is_none());
        assert!(pattern.matches("/employee/details/17/extra").is_none());
    }

    #[test]
    fn bare_colon_is_literal() {
        let pattern = RoutePattern::new("/odd/:");
        assert!(pattern.is_literal());
        assert!(pattern.matches("/odd/:").is_some());
    }

    #[test]
    fn root_pattern() {
        let pattern = RoutePattern::new("/");
        assert!(pattern.matches("/").is_some());
        assert!(pattern.matches("/home").is_none());
    }
}
