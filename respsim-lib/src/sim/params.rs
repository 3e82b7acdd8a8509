use std::{num::NonZeroU64, time::Duration};

use rama::{
    http::{HeaderValue, Method, StatusCode},
    telemetry::tracing,
};
use serde::Deserialize;

use crate::config::Limits;

use super::ContentFlavor;

/// Raw, unvalidated request parameters as found in the query string.
///
/// Every property is kept as text so that a malformed value
/// only resets that one property to its default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawParams {
    pub bytes: Option<String>,
    pub ttfb: Option<String>,
    pub jitter: Option<String>,
    pub bps: Option<String>,
    pub chunk: Option<String>,
    pub content: Option<String>,
    pub gzip: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
    pub header_kb: Option<String>,
    pub cookies: Option<String>,
    pub cookie_bytes: Option<String>,
    pub cookie_ttl: Option<String>,
    pub failrate: Option<String>,
    pub burst_n: Option<String>,
    pub cpu_ms: Option<String>,
    pub mem_mb: Option<String>,
    pub accept_ranges: Option<String>,
    pub seed: Option<String>,
    pub token: Option<String>,
}

impl RawParams {
    /// Decode the parameters of a (raw) query string.
    ///
    /// Never fails: an undecodable query resolves to all defaults.
    pub fn from_query(query: Option<&str>) -> Self {
        let Some(query) = query.filter(|q| !q.is_empty()) else {
            return Self::default();
        };
        serde_html_form::from_str(query).unwrap_or_else(|err| {
            tracing::debug!("undecodable query string, fallback to defaults: {err}");
            Self::default()
        })
    }

    /// Fill every property left undefined with the one from `base`.
    pub fn or_defaults(self, base: &Self) -> Self {
        macro_rules! merge_params {
            ($overwrite:ident, $base:ident, {$($property:ident),+ $(,)?}) => {
                Self {
                    $(
                        $property: match $overwrite.$property {
                            Some(value) => Some(value),
                            None => $base.$property.clone(),
                        },
                    )+
                }
            };
        }

        let overwrite = self;
        merge_params!(
            overwrite, base,
            {
                bytes,
                ttfb,
                jitter,
                bps,
                chunk,
                content,
                gzip,
                status,
                location,
                header_kb,
                cookies,
                cookie_bytes,
                cookie_ttl,
                failrate,
                burst_n,
                cpu_ms,
                mem_mb,
                accept_ranges,
                seed,
                token,
            }
        )
    }
}

/// Request method as far as the simulator distinguishes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimMethod {
    Get,
    Head,
    Options,
}

impl SimMethod {
    /// Any method other than HEAD and OPTIONS is served as GET.
    pub fn from_method(method: &Method) -> Self {
        if method == Method::HEAD {
            Self::Head
        } else if method == Method::OPTIONS {
            Self::Options
        } else {
            Self::Get
        }
    }
}

/// Status codes a caller may force, anything else resolves to 200.
pub const ALLOWED_STATUS_CODES: [u16; 14] = [
    200, 204, 301, 302, 304, 400, 401, 403, 404, 408, 429, 500, 502, 503,
];

pub const DEFAULT_TOTAL_BYTES: u64 = 1024;
pub const DEFAULT_CHUNK_SIZE: u64 = 16 * 1024;
pub const DEFAULT_COOKIE_VALUE_BYTES: u64 = 16;
pub const DEFAULT_COOKIE_TTL_SECS: u64 = 3600;

/// Fully resolved configuration of a single simulated request.
///
/// All numeric properties lie within the [`Limits`] they were resolved with.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    pub total_bytes: u64,
    pub ttfb: Duration,
    pub jitter_max: Duration,
    /// `None` streams as fast as the transport allows.
    pub bytes_per_second: Option<NonZeroU64>,
    pub chunk_size: usize,
    pub flavor: ContentFlavor,
    pub gzip: bool,
    pub status: StatusCode,
    /// Only set in combination with a redirect status.
    pub redirect_location: Option<HeaderValue>,
    pub fail_rate: f64,
    pub burst_period: Option<NonZeroU64>,
    pub cpu: Duration,
    pub memory_mb: usize,
    pub range_support: bool,
    pub method: SimMethod,
    pub header_fill_kb: usize,
    pub cookie_count: usize,
    pub cookie_value_bytes: usize,
    pub cookie_ttl_secs: u64,
    pub seed: Option<u64>,
}

impl RequestConfig {
    /// Resolve raw parameters into a configuration, clamping every value
    /// into `limits`. Malformed values fall back to their default.
    pub fn resolve(raw: &RawParams, method: &Method, limits: &Limits) -> Self {
        let total_bytes = clamp_int(
            raw.bytes.as_deref(),
            DEFAULT_TOTAL_BYTES,
            0,
            limits.max_total_bytes,
        );
        let ttfb_ms = clamp_int(raw.ttfb.as_deref(), 0, 0, limits.max_ttfb_ms);
        let jitter_ms = clamp_int(raw.jitter.as_deref(), 0, 0, limits.max_jitter_ms);
        let chunk_size = clamp_int(
            raw.chunk.as_deref(),
            DEFAULT_CHUNK_SIZE.min(limits.max_chunk_size),
            1,
            limits.max_chunk_size.max(1),
        );

        let bytes_per_second = match parse_int(raw.bps.as_deref()) {
            Some(n) if n > 0 => {
                NonZeroU64::new(saturate_u64(n).max(limits.min_bytes_per_second.max(1)))
            }
            _ => None,
        };

        let flavor = raw
            .content
            .as_deref()
            .and_then(ContentFlavor::parse)
            .unwrap_or_default();

        let (status, redirect_location) = resolve_status(raw);

        let fail_rate = raw
            .failrate
            .as_deref()
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| !v.is_nan())
            .map(|v| v.clamp(0.0, 1.0))
            .unwrap_or(0.0);

        let burst_period = parse_int(raw.burst_n.as_deref())
            .filter(|n| *n > 0)
            .and_then(|n| NonZeroU64::new(saturate_u64(n)));

        let cpu_ms = clamp_int(raw.cpu_ms.as_deref(), 0, 0, limits.max_cpu_ms);
        let memory_mb = clamp_int(raw.mem_mb.as_deref(), 0, 0, limits.max_memory_mb);

        let header_fill_kb = clamp_int(raw.header_kb.as_deref(), 0, 0, limits.max_header_fill_kb);
        let cookie_count = clamp_int(raw.cookies.as_deref(), 0, 0, limits.max_cookie_count);
        let cookie_value_bytes = clamp_int(
            raw.cookie_bytes.as_deref(),
            DEFAULT_COOKIE_VALUE_BYTES.min(limits.max_cookie_value_bytes),
            0,
            limits.max_cookie_value_bytes,
        );
        let cookie_ttl_secs = clamp_int(
            raw.cookie_ttl.as_deref(),
            DEFAULT_COOKIE_TTL_SECS.max(limits.min_cookie_ttl_secs),
            limits.min_cookie_ttl_secs,
            u64::MAX,
        );

        Self {
            total_bytes,
            ttfb: Duration::from_millis(ttfb_ms),
            jitter_max: Duration::from_millis(jitter_ms),
            bytes_per_second,
            chunk_size: to_usize(chunk_size),
            flavor,
            gzip: parse_bool(raw.gzip.as_deref()).unwrap_or(false),
            status,
            redirect_location,
            fail_rate,
            burst_period,
            cpu: Duration::from_millis(cpu_ms),
            memory_mb: to_usize(memory_mb),
            range_support: parse_bool(raw.accept_ranges.as_deref()).unwrap_or(true),
            method: SimMethod::from_method(method),
            header_fill_kb: to_usize(header_fill_kb),
            cookie_count: to_usize(cookie_count),
            cookie_value_bytes: to_usize(cookie_value_bytes),
            cookie_ttl_secs,
            seed: raw.seed.as_deref().and_then(|v| v.trim().parse().ok()),
        }
    }

    pub fn is_redirect(&self) -> bool {
        is_redirect_status(self.status)
    }
}

pub fn is_redirect_status(status: StatusCode) -> bool {
    matches!(status, StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND)
}

fn resolve_status(raw: &RawParams) -> (StatusCode, Option<HeaderValue>) {
    let status = parse_int(raw.status.as_deref())
        .and_then(|n| u16::try_from(n).ok())
        .filter(|n| ALLOWED_STATUS_CODES.contains(n))
        .and_then(|n| StatusCode::from_u16(n).ok())
        .unwrap_or(StatusCode::OK);

    if !is_redirect_status(status) {
        return (status, None);
    }

    let location = raw
        .location
        .as_deref()
        .map(str::trim)
        .filter(|loc| !loc.is_empty())
        .and_then(|loc| HeaderValue::from_str(loc).ok());

    match location {
        Some(location) => (status, Some(location)),
        None => {
            tracing::debug!(%status, "redirect without (valid) location: downgrade to 200");
            (StatusCode::OK, None)
        }
    }
}

fn parse_int(value: Option<&str>) -> Option<i64> {
    value?.trim().parse().ok()
}

fn saturate_u64(n: i64) -> u64 {
    n.max(0).unsigned_abs()
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

fn clamp_int(value: Option<&str>, default: u64, min: u64, max: u64) -> u64 {
    match parse_int(value) {
        Some(n) => saturate_u64(n).clamp(min, max),
        None => default,
    }
}

fn parse_bool(value: Option<&str>) -> Option<bool> {
    let value = value?.trim();
    if ["1", "true", "yes", "on"]
        .iter()
        .any(|v| value.eq_ignore_ascii_case(v))
    {
        Some(true)
    } else if ["0", "false", "no", "off"]
        .iter()
        .any(|v| value.eq_ignore_ascii_case(v))
    {
        Some(false)
    } else {
        None
    }
}
