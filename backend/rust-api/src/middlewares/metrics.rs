use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::metrics::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};

/// Records request count and latency per method, route and status
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = match req.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_string(),
        None => normalize_path(req.uri().path()),
    };

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &path])
        .observe(start.elapsed().as_secs_f64());

    response
}

/// Collapses session ids and numeric segments so unmatched paths keep
/// label cardinality bounded
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if is_uuid_like(segment) || is_numeric_id(segment) {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// 8-4-4-4-12 hex groups
fn is_uuid_like(s: &str) -> bool {
    let groups: Vec<&str> = s.split('-').collect();
    groups.len() == 5
        && groups
            .iter()
            .zip([8, 4, 4, 4, 12])
            .all(|(group, len)| group.len() == len && group.chars().all(|c| c.is_ascii_hexdigit()))
}

fn is_numeric_id(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_collapsed() {
        assert_eq!(
            normalize_path("/api/v1/sessions/550e8400-e29b-41d4-a716-446655440000/annotations"),
            "/api/v1/sessions/{id}/annotations"
        );
        assert_eq!(normalize_path("/api/v1/sessions/42"), "/api/v1/sessions/{id}");
        assert_eq!(normalize_path("/api/v1/rubric"), "/api/v1/rubric");
        assert_eq!(normalize_path("/health"), "/health");
    }

    #[test]
    fn uuid_shape_is_checked_per_group() {
        assert!(is_uuid_like("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!is_uuid_like("550e8400e29b-41d4-a716-4466554400000"));
        assert!(!is_uuid_like("not-a-uuid"));
        assert!(!is_uuid_like("zzzzzzzz-e29b-41d4-a716-446655440000"));
    }

    #[test]
    fn numeric_ids() {
        assert!(is_numeric_id("7"));
        assert!(!is_numeric_id("RAG4O"));
        assert!(!is_numeric_id(""));
    }
}
