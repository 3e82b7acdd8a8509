use rama::http::{HeaderValue, StatusCode};

use super::{RangeOutcome, RequestConfig, ResolvedRange, SimMethod};

/// First transport decision: redirect away or respond with a status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusDecision {
    Redirect {
        status: StatusCode,
        location: HeaderValue,
    },
    Respond(StatusCode),
}

pub fn decide_status(cfg: &RequestConfig) -> StatusDecision {
    match &cfg.redirect_location {
        Some(location) if cfg.is_redirect() => StatusDecision::Redirect {
            status: cfg.status,
            location: location.clone(),
        },
        _ => StatusDecision::Respond(cfg.status),
    }
}

/// Whether the status allows a message body at all.
pub fn status_permits_body(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

/// Everything needed to write the head and (optional) body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPlan {
    pub status: StatusCode,
    /// Value of `Content-Length`, `None` when unknown or not allowed.
    pub content_length: Option<u64>,
    pub content_range: Option<String>,
    /// Range to stream, `None` for an empty body.
    pub range: Option<ResolvedRange>,
    /// HEAD requests and body-less statuses keep the head only.
    pub send_body: bool,
    pub compress: bool,
}

/// Map the range outcome onto the transport decisions of the response.
pub fn plan_body(
    cfg: &RequestConfig,
    status: StatusCode,
    outcome: RangeOutcome,
    compress: bool,
) -> BodyPlan {
    let content_range = outcome.content_range(cfg.total_bytes);

    let (status, range) = match outcome {
        RangeOutcome::Unsatisfiable => {
            return BodyPlan {
                status: StatusCode::RANGE_NOT_SATISFIABLE,
                content_length: None,
                content_range,
                range: None,
                send_body: false,
                compress: false,
            };
        }
        RangeOutcome::Partial(range) => (StatusCode::PARTIAL_CONTENT, Some(range)),
        RangeOutcome::Full(range) => (status, range),
    };

    let permits_body = status_permits_body(status);
    let content_length = (permits_body && !compress)
        .then(|| range.map(|r| r.len()).unwrap_or(0));

    BodyPlan {
        status,
        content_length,
        content_range,
        range,
        send_body: permits_body && cfg.method != SimMethod::Head,
        compress: compress && permits_body,
    }
}

#[cfg(test)]
mod tests {
    use rama::http::Method;

    use super::*;
    use crate::{
        config::Limits,
        sim::{RawParams, resolve_range},
    };

    fn config(query: &str, method: Method) -> RequestConfig {
        RequestConfig::resolve(
            &RawParams::from_query(Some(query)),
            &method,
            &Limits::default(),
        )
    }

    fn plan(query: &str, method: Method, client_range: Option<&str>, compress: bool) -> BodyPlan {
        let cfg = config(query, method);
        let outcome = resolve_range(cfg.total_bytes, cfg.range_support, cfg.gzip, client_range);
        plan_body(&cfg, cfg.status, outcome, compress)
    }

    #[test]
    fn test_decide_status() {
        assert_eq!(
            decide_status(&config("status=301&location=https%3A%2F%2Fexample.com", Method::GET)),
            StatusDecision::Redirect {
                status: StatusCode::MOVED_PERMANENTLY,
                location: HeaderValue::from_static("https://example.com"),
            }
        );
        assert_eq!(
            decide_status(&config("status=301", Method::GET)),
            StatusDecision::Respond(StatusCode::OK)
        );
        assert_eq!(
            decide_status(&config("status=503", Method::GET)),
            StatusDecision::Respond(StatusCode::SERVICE_UNAVAILABLE)
        );
    }

    #[test]
    fn test_full_body_plan() {
        let plan = plan("bytes=1000", Method::GET, None, false);
        assert_eq!(plan.status, StatusCode::OK);
        assert_eq!(plan.content_length, Some(1000));
        assert_eq!(plan.content_range, None);
        assert!(plan.send_body);
        assert_eq!(plan.range, ResolvedRange::full(1000));
    }

    #[test]
    fn test_head_keeps_length_but_no_body() {
        let plan = plan("bytes=1000", Method::HEAD, None, false);
        assert_eq!(plan.content_length, Some(1000));
        assert!(!plan.send_body);
    }

    #[test]
    fn test_no_content_has_no_length() {
        let plan = plan("bytes=0&status=204", Method::GET, None, false);
        assert_eq!(plan.status, StatusCode::NO_CONTENT);
        assert_eq!(plan.content_length, None);
        assert!(!plan.send_body);

        let plan = plan("bytes=500&status=304", Method::GET, None, false);
        assert_eq!(plan.content_length, None);
        assert!(!plan.send_body);
    }

    #[test]
    fn test_partial_plan() {
        let plan = plan("bytes=1000", Method::GET, Some("bytes=0-9999"), false);
        assert_eq!(plan.status, StatusCode::PARTIAL_CONTENT);
        assert_eq!(plan.content_length, Some(1000));
        assert_eq!(plan.content_range.as_deref(), Some("bytes 0-999/1000"));

        let plan = plan("bytes=1000", Method::GET, Some("bytes=100-199"), false);
        assert_eq!(plan.content_length, Some(100));
        assert_eq!(plan.content_range.as_deref(), Some("bytes 100-199/1000"));
    }

    #[test]
    fn test_unsatisfiable_plan() {
        let plan = plan("bytes=1000", Method::GET, Some("bytes=2000-3000"), false);
        assert_eq!(plan.status, StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(plan.content_range.as_deref(), Some("bytes */1000"));
        assert!(!plan.send_body);
        assert_eq!(plan.range, None);
    }

    #[test]
    fn test_compressed_plan_has_no_length() {
        let plan = plan("bytes=1000&gzip=1", Method::GET, Some("bytes=0-9"), true);
        assert_eq!(plan.status, StatusCode::OK);
        assert_eq!(plan.content_length, None);
        assert!(plan.compress);
        assert_eq!(plan.range, ResolvedRange::full(1000));
    }

    #[test]
    fn test_zero_bytes_full_body() {
        let plan = plan("bytes=0", Method::GET, None, false);
        assert_eq!(plan.content_length, Some(0));
        assert_eq!(plan.range, None);
    }
}
