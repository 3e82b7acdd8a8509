use std::{
    convert::Infallible,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use rama::{
    Service,
    error::{ErrorContext as _, OpaqueError},
    http::{
        HeaderMap, HeaderValue, Method, Request, Response, StatusCode,
        header::{
            ACCEPT_RANGES, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE,
            LOCATION, RANGE, VARY,
        },
        headers::ContentType,
        service::web::response::{Headers, IntoResponse},
    },
    telemetry::tracing,
};

use crate::{
    config::ServiceSettings,
    sim::{
        ContentFlavor, FaultPlan, MemoryBallast, PacingPolicy, RangeOutcome, RawParams,
        RequestConfig, ResolvedRange, SimMethod, StatusDecision, Synthesizer, ThreadDice,
        ThrottledStream, decide_status, empty_body_holding, plan_body, resolve_range, simulate_cpu,
        simulate_memory, status_permits_body,
    },
};

use super::{
    encoding::accepts_gzip,
    gate::is_authorized,
    headers::{CookieBatch, SEED_HEADER, insert_cors_headers, insert_header_fill},
};

pub const INJECTED_FAILURE_BODY: &str = "injected failure\n";
pub const UNAUTHORIZED_BODY: &str = "unauthorized";

/// The simulator endpoint: every request, whatever its path,
/// is answered according to its query parameters.
#[derive(Debug, Clone)]
pub struct SimulatorService {
    settings: Arc<ServiceSettings>,
}

impl SimulatorService {
    pub fn new(settings: ServiceSettings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    async fn simulate(
        &self,
        method: &Method,
        query: Option<&str>,
        headers: &HeaderMap,
    ) -> Response {
        let raw = RawParams::from_query(query);
        let presented_token = raw.token.clone();
        let raw = raw.or_defaults(&self.settings.defaults);
        let cfg = RequestConfig::resolve(&raw, method, &self.settings.limits);
        // shared by the random body and the cookie values
        let seed = cfg.seed.unwrap_or_else(rand::random);

        let mut resp = if is_authorized(
            self.settings.token.as_ref(),
            presented_token.as_deref(),
            headers,
        ) {
            self.respond(&cfg, seed, headers).await
        } else {
            tracing::debug!("request without valid token: deny access");
            (
                StatusCode::UNAUTHORIZED,
                Headers::single(ContentType::text_utf8()),
                UNAUTHORIZED_BODY,
            )
                .into_response()
        };

        insert_header_fill(resp.headers_mut(), cfg.header_fill_kb);
        CookieBatch {
            count: cfg.cookie_count,
            value_bytes: cfg.cookie_value_bytes,
            ttl_secs: cfg.cookie_ttl_secs,
        }
        .append_to(resp.headers_mut(), seed);
        if cfg.cookie_count > 0 && !resp.headers().contains_key(SEED_HEADER) {
            resp.headers_mut().insert(SEED_HEADER, HeaderValue::from(seed));
        }

        resp
    }

    async fn respond(&self, cfg: &RequestConfig, seed: u64, headers: &HeaderMap) -> Response {
        if let Some(cause) = FaultPlan::from_config(cfg).evaluate(&mut ThreadDice) {
            tracing::debug!(?cause, "inject failure");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Headers::single(ContentType::text_utf8()),
                INJECTED_FAILURE_BODY,
            )
                .into_response();
        }

        simulate_cpu(cfg.cpu).await;
        let ballast = simulate_memory(cfg.memory_mb).await;

        if !cfg.ttfb.is_zero() {
            tokio::time::sleep(cfg.ttfb).await;
        }

        match decide_status(cfg) {
            StatusDecision::Redirect { status, location } => {
                tracing::debug!(%status, ?location, "redirect");
                let mut resp = Response::new(empty_body_holding(ballast));
                *resp.status_mut() = status;
                resp.headers_mut().insert(LOCATION, location);
                resp
            }
            StatusDecision::Respond(status) => {
                self.content_response(cfg, status, seed, headers, ballast)
                    .unwrap_or_else(|err| {
                        tracing::error!("failed to build simulated response: {err}");
                        StatusCode::INTERNAL_SERVER_ERROR.into_response()
                    })
            }
        }
    }

    fn content_response(
        &self,
        cfg: &RequestConfig,
        status: StatusCode,
        seed: u64,
        headers: &HeaderMap,
        ballast: MemoryBallast,
    ) -> Result<Response, OpaqueError> {
        let compress = cfg.gzip && accepts_gzip(headers);
        let outcome = if status == StatusCode::OK {
            let client_range = headers.get(RANGE).and_then(|v| v.to_str().ok());
            resolve_range(cfg.total_bytes, cfg.range_support, cfg.gzip, client_range)
        } else {
            RangeOutcome::Full(ResolvedRange::full(cfg.total_bytes))
        };

        let plan = plan_body(cfg, status, outcome, compress);
        tracing::debug!(
            status = %plan.status,
            content_length = ?plan.content_length,
            content_range = ?plan.content_range,
            compress = plan.compress,
            "response planned"
        );

        let body = if plan.send_body {
            let synth = Synthesizer::new(cfg.flavor, cfg.total_bytes, seed, unix_timestamp());
            let pacing = PacingPolicy {
                chunk_size: cfg.chunk_size,
                bytes_per_second: cfg.bytes_per_second,
                jitter_max: cfg.jitter_max,
            };
            let stream = ThrottledStream::new(plan.range, synth, pacing, ballast);
            if plan.compress {
                stream.with_gzip().into_body()
            } else {
                stream.into_body()
            }
        } else {
            empty_body_holding(ballast)
        };

        let mut resp = Response::new(body);
        *resp.status_mut() = plan.status;
        let resp_headers = resp.headers_mut();

        if status_permits_body(plan.status) && plan.status != StatusCode::RANGE_NOT_SATISFIABLE {
            resp_headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static(cfg.flavor.content_type()),
            );
        }
        if let Some(content_length) = plan.content_length {
            resp_headers.insert(CONTENT_LENGTH, HeaderValue::from(content_length));
        }
        if let Some(content_range) = plan.content_range {
            resp_headers.insert(
                CONTENT_RANGE,
                HeaderValue::try_from(content_range)
                    .context("create content-range header value")?,
            );
        }
        if cfg.range_support {
            resp_headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        }
        if cfg.gzip {
            resp_headers.append(VARY, HeaderValue::from_static("Accept-Encoding"));
        }
        if plan.compress {
            resp_headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        }
        if cfg.flavor == ContentFlavor::Random {
            resp_headers.insert(SEED_HEADER, HeaderValue::from(seed));
        }

        Ok(resp)
    }
}

impl Service<Request> for SimulatorService {
    type Output = Response;
    type Error = Infallible;

    async fn serve(&self, req: Request) -> Result<Self::Output, Self::Error> {
        let (parts, _) = req.into_parts();
        let preflight = SimMethod::from_method(&parts.method) == SimMethod::Options;

        let mut resp = if preflight {
            StatusCode::NO_CONTENT.into_response()
        } else {
            self.simulate(&parts.method, parts.uri.query(), &parts.headers)
                .await
        };

        insert_cors_headers(resp.headers_mut(), &parts.headers, preflight);
        Ok(resp)
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
