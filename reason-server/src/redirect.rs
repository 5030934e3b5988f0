//! Catch-all handling for requests no route matched.
//!
//! Unmatched requests get an empty `404`. When trailing-slash redirects are
//! enabled, a path such as `/widgets/` whose trimmed form is routed for the
//! same method is redirected instead: `301` for `GET`, `307` for anything
//! else so the method and body are preserved.

use axum::{
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
}

/// Registered `(method, pattern)` pairs, used to resolve redirects.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<(Method, Vec<Segment>)>,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pattern such as `/widgets/{id}`.
    pub fn insert(&mut self, method: Method, pattern: &str) {
        let segments = split(pattern)
            .map(|s| {
                if s.starts_with('{') && s.ends_with('}') {
                    Segment::Param
                } else {
                    Segment::Literal(s.to_owned())
                }
            })
            .collect();
        self.routes.push((method, segments));
    }

    /// Whether `path` would be routed for `method`.
    #[must_use]
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        let parts: Vec<&str> = split(path).collect();
        self.routes.iter().any(|(m, segments)| {
            m == method
                && segments.len() == parts.len()
                && segments.iter().zip(&parts).all(|(segment, part)| match segment {
                    Segment::Literal(lit) => lit == part,
                    Segment::Param => !part.is_empty(),
                })
        })
    }

    /// Location to redirect to when `uri` only misses because of a trailing
    /// slash. The query string is carried over.
    #[must_use]
    pub fn redirect_target(&self, method: &Method, uri: &Uri) -> Option<String> {
        let trimmed = uri.path().strip_suffix('/').filter(|p| !p.is_empty())?;
        if !self.matches(method, trimmed) {
            return None;
        }
        Some(match uri.query() {
            Some(query) => format!("{trimmed}?{query}"),
            None => trimmed.to_owned(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}

/// Response for a request no route matched.
#[must_use]
pub fn not_found_or_redirect(table: Option<&RouteTable>, method: &Method, uri: &Uri) -> Response {
    let Some(location) = table.and_then(|t| t.redirect_target(method, uri)) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let status = if *method == Method::GET {
        StatusCode::MOVED_PERMANENTLY
    } else {
        StatusCode::TEMPORARY_REDIRECT
    };
    tracing::debug!(%method, from = %uri, to = %location, "redirecting trailing slash");
    (status, [(header::LOCATION, location)]).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        let mut table = RouteTable::new();
        table.insert(Method::GET, "/widgets");
        table.insert(Method::GET, "/widgets/{id}");
        table.insert(Method::POST, "/widgets");
        table
    }

    fn uri(s: &str) -> Uri {
        match s.parse() {
            Ok(u) => u,
            Err(e) => panic!("invalid uri {s}: {e}"),
        }
    }

    #[test]
    fn route_table_matches_literals_and_params() {
        let table = table();
        assert_eq!(table.len(), 3);
        assert!(table.matches(&Method::GET, "/widgets"));
        assert!(table.matches(&Method::GET, "/widgets/42"));
        assert!(!table.matches(&Method::GET, "/widgets/42/extra"));
        assert!(!table.matches(&Method::DELETE, "/widgets/42"));
        assert!(!table.matches(&Method::GET, "/gadgets"));
    }

    #[test]
    fn redirect_target_trims_one_slash_and_keeps_query() {
        let table = table();
        assert_eq!(table.redirect_target(&Method::GET, &uri("/widgets/")), Some("/widgets".to_owned()));
        assert_eq!(
            table.redirect_target(&Method::GET, &uri("/widgets/7/?pretty=1")),
            Some("/widgets/7?pretty=1".to_owned())
        );
        assert_eq!(table.redirect_target(&Method::GET, &uri("/widgets")), None);
        assert_eq!(table.redirect_target(&Method::GET, &uri("/")), None);
        assert_eq!(table.redirect_target(&Method::PUT, &uri("/widgets/")), None);
    }

    #[test]
    fn not_found_or_redirect_picks_status_by_method() {
        let table = table();
        let get = not_found_or_redirect(Some(&table), &Method::GET, &uri("/widgets/"));
        assert_eq!(get.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(get.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()), Some("/widgets"));

        let post = not_found_or_redirect(Some(&table), &Method::POST, &uri("/widgets/"));
        assert_eq!(post.status(), StatusCode::TEMPORARY_REDIRECT);

        let missing = not_found_or_redirect(Some(&table), &Method::GET, &uri("/gadgets/"));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let disabled = not_found_or_redirect(None, &Method::GET, &uri("/widgets/"));
        assert_eq!(disabled.status(), StatusCode::NOT_FOUND);
    }
}
