//! Method + path routing over an ordered route table.
//!
//! Patterns are parsed once into literal and capture segments. Resolution
//! walks the table in registration order: the first route whose pattern and
//! method both match wins. Routes whose pattern matched under a different
//! method are remembered so the caller can answer 405 with an `Allow` list.

use axum::http::Method;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture(String),
}

/// A parsed route pattern such as `/api/v1/messages/{owner}/{created_at}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = split(pattern)
            .map(|seg| match seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => Segment::Capture(name.to_string()),
                None => Segment::Literal(seg.to_string()),
            })
            .collect();
        Self { segments }
    }

    /// Match `path`, returning its captures in pattern order. Capture
    /// segments must be non-empty and are percent-decoded.
    pub fn matches(&self, path: &str) -> Option<Captures> {
        let parts: Vec<&str> = split(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut captured = Vec::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Capture(_) if part.is_empty() => return None,
                Segment::Capture(_) => captured.push(decode(part)),
            }
        }

        Some(Captures(captured))
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}

/// Percent-decode a capture. A segment that does not decode to UTF-8 is
/// kept as sent.
fn decode(part: &str) -> String {
    match urlencoding::decode(part) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            debug!("Keeping undecodable path segment '{}': {}", part, e);
            part.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("no path capture at index {index} ({len} captured)")]
    OutOfRange { index: usize, len: usize },
}

/// Path segments captured by a matched route, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures(Vec<String>);

impl Captures {
    pub fn get(&self, index: usize) -> Result<&str, CaptureError> {
        self.0
            .get(index)
            .map(String::as_str)
            .ok_or(CaptureError::OutOfRange { index, len: self.0.len() })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

struct Route<H> {
    method: Method,
    pattern: PathPattern,
    handler: H,
}

/// Outcome of [`Dispatcher::resolve`].
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution<'a, H> {
    Matched { handler: &'a H, captures: Captures },
    /// The path matched at least one route, none with this method.
    MethodNotAllowed { allow: Vec<Method> },
    NotFound,
}

pub struct Dispatcher<H> {
    routes: Vec<Route<H>>,
}

impl<H> Default for Dispatcher<H> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<H> Dispatcher<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. Earlier routes take precedence on overlap.
    pub fn route(mut self, method: Method, pattern: &str, handler: H) -> Self {
        self.routes.push(Route {
            method,
            pattern: PathPattern::parse(pattern),
            handler,
        });
        self
    }

    pub fn resolve(&self, method: &Method, path: &str) -> Resolution<'_, H> {
        let mut allow: Vec<Method> = Vec::new();

        for route in &self.routes {
            let Some(captures) = route.pattern.matches(path) else {
                continue;
            };

            if route.method == *method {
                return Resolution::Matched {
                    handler: &route.handler,
                    captures,
                };
            }

            if !allow.contains(&route.method) {
                allow.push(route.method.clone());
            }
        }

        if allow.is_empty() {
            Resolution::NotFound
        } else {
            Resolution::MethodNotAllowed { allow }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_and_capture_segments() {
        let pattern = PathPattern::parse("/api/v1/messages/{owner}/{created_at}");
        assert_eq!(
            pattern.segments,
            [
                Segment::Literal("api".into()),
                Segment::Literal("v1".into()),
                Segment::Literal("messages".into()),
                Segment::Capture("owner".into()),
                Segment::Capture("created_at".into()),
            ]
        );

        let captures = pattern.matches("/api/v1/messages/abc/2024-01-01T00:00:00Z").unwrap();
        assert_eq!(captures.len(), 2);
        assert_eq!(captures.get(0).unwrap(), "abc");
        assert_eq!(captures.get(1).unwrap(), "2024-01-01T00:00:00Z");

        assert!(pattern.matches("/api/v1/messages/abc").is_none());
        assert!(pattern.matches("/api/v1/messages/abc/def/ghi").is_none());
        assert!(pattern.matches("/api/v2/messages/abc/def").is_none());
    }

    #[test]
    fn empty_segments_do_not_capture() {
        let pattern = PathPattern::parse("/messages/{owner}");
        assert!(pattern.matches("/messages/").is_none());
        assert!(PathPattern::parse("/messages").matches("/messages/").is_none());
    }

    #[test]
    fn captures_are_percent_decoded() {
        let pattern = PathPattern::parse("/messages/{owner}/{created_at}");
        let captures = pattern
            .matches("/messages/abc/2024-01-01T02%3A00%3A00%2B02%3A00")
            .unwrap();
        assert_eq!(captures.get(1).unwrap(), "2024-01-01T02:00:00+02:00");
    }

    #[test]
    fn undecodable_capture_is_kept_raw() {
        let pattern = PathPattern::parse("/messages/{owner}");
        let captures = pattern.matches("/messages/ab%FFcd").unwrap();
        assert_eq!(captures.get(0).unwrap(), "ab%FFcd");
    }

    #[test]
    fn capture_index_out_of_range_is_an_error() {
        let captures = PathPattern::parse("/messages/{owner}").matches("/messages/abc").unwrap();
        assert_eq!(
            captures.get(1),
            Err(CaptureError::OutOfRange { index: 1, len: 1 })
        );
        assert!(Captures::default().get(0).is_err());
    }

    #[test]
    fn first_registered_route_wins() {
        let dispatcher = Dispatcher::new()
            .route(Method::GET, "/messages/{x}", "capture")
            .route(Method::GET, "/messages/latest", "literal");

        match dispatcher.resolve(&Method::GET, "/messages/latest") {
            Resolution::Matched { handler, .. } => assert_eq!(*handler, "capture"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn segment_count_separates_patterns() {
        let dispatcher = Dispatcher::new()
            .route(Method::GET, "/messages/{x}", "one")
            .route(Method::GET, "/messages", "list");

        match dispatcher.resolve(&Method::GET, "/messages") {
            Resolution::Matched { handler, captures } => {
                assert_eq!(*handler, "list");
                assert!(captures.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn wrong_method_lists_allowed_methods() {
        let dispatcher = Dispatcher::new()
            .route(Method::GET, "/messages", "list")
            .route(Method::POST, "/messages/{x}", "create")
            .route(Method::PUT, "/messages/{x}", "update")
            .route(Method::POST, "/messages/{y}", "shadowed");

        assert_eq!(
            dispatcher.resolve(&Method::DELETE, "/messages/abc"),
            Resolution::MethodNotAllowed {
                allow: vec![Method::POST, Method::PUT]
            }
        );

        let post_only = Dispatcher::new().route(Method::POST, "/messages/{x}", ());
        assert_eq!(
            post_only.resolve(&Method::GET, "/messages/abc"),
            Resolution::MethodNotAllowed { allow: vec![Method::POST] }
        );
    }

    #[test]
    fn unknown_path_is_not_found() {
        let dispatcher = Dispatcher::new().route(Method::GET, "/messages", ());
        assert_eq!(dispatcher.resolve(&Method::GET, "/users"), Resolution::NotFound);
        assert_eq!(dispatcher.resolve(&Method::POST, "/"), Resolution::NotFound);
    }
}
