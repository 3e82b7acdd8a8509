use rama::http::{
    HeaderMap, HeaderName, HeaderValue,
    header::{
        ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE, ACCESS_CONTROL_REQUEST_HEADERS,
        ORIGIN, SET_COOKIE, VARY,
    },
};
use rama::telemetry::tracing;

use crate::sim::{ContentFlavor, Synthesizer};

/// Seed of the random flavor, replaying it reproduces the body.
pub const SEED_HEADER: HeaderName = HeaderName::from_static("x-respsim-seed");

const CORS_ALLOW_METHODS: &str = "GET, HEAD, OPTIONS";
const CORS_EXPOSE_HEADERS: &str =
    "content-length, content-range, accept-ranges, content-encoding, x-respsim-seed";
const CORS_MAX_AGE_SECS: u32 = 600;

/// Size of the value of a single filler header.
pub const FILL_VALUE_LEN: usize = 1024;

const FILL_VALUE: [u8; FILL_VALUE_LEN] = {
    let mut value = [0u8; FILL_VALUE_LEN];
    let mut i = 0;
    while i < FILL_VALUE_LEN {
        value[i] = b'a' + (i % 26) as u8;
        i += 1;
    }
    value
};

const COOKIE_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Cross origin headers, present on every response.
pub fn insert_cors_headers(headers: &mut HeaderMap, request: &HeaderMap, preflight: bool) {
    match request.get(ORIGIN) {
        Some(origin) => {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
            headers.append(VARY, HeaderValue::from_static("Origin"));
        }
        None => {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        }
    }

    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        request
            .get(ACCESS_CONTROL_REQUEST_HEADERS)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("*")),
    );
    headers.insert(
        ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(CORS_EXPOSE_HEADERS),
    );

    if preflight {
        headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(CORS_MAX_AGE_SECS));
    }
}

/// Append `count` headers `x-fill-<i>` of [`FILL_VALUE_LEN`] bytes each.
pub fn insert_header_fill(headers: &mut HeaderMap, count: usize) {
    if count == 0 {
        return;
    }

    let value = match HeaderValue::from_bytes(&FILL_VALUE) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!("failed to create header fill value: {err}");
            return;
        }
    };

    for i in 1..=count {
        match HeaderName::try_from(format!("x-fill-{i}")) {
            Ok(name) => {
                headers.insert(name, value.clone());
            }
            Err(err) => tracing::error!("failed to create header fill name #{i}: {err}"),
        }
    }
}

/// Cookie settings of a single response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieBatch {
    pub count: usize,
    pub value_bytes: usize,
    pub ttl_secs: u64,
}

impl CookieBatch {
    /// Append one `Set-Cookie` header per cookie.
    ///
    /// Values are URL safe and derived from `seed`.
    pub fn append_to(&self, headers: &mut HeaderMap, seed: u64) {
        for i in 1..=self.count {
            let value = cookie_value(seed.wrapping_add(i as u64), self.value_bytes);
            let cookie = format!(
                "sim{i}={value}; Max-Age={}; Path=/; SameSite=Lax",
                self.ttl_secs
            );
            match HeaderValue::try_from(cookie) {
                Ok(cookie) => {
                    headers.append(SET_COOKIE, cookie);
                }
                Err(err) => tracing::error!("failed to create cookie #{i}: {err}"),
            }
        }
    }
}

fn cookie_value(seed: u64, len: usize) -> String {
    Synthesizer::new(ContentFlavor::Random, len as u64, seed, 0)
        .fill(0, len)
        .iter()
        .map(|b| char::from(COOKIE_ALPHABET[usize::from(b & 63)]))
        .collect()
}
