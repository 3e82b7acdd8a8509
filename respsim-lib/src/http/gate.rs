use rama::http::{HeaderMap, header::AUTHORIZATION};
use secrecy::{ExposeSecret as _, SecretString};

/// Check the token presented by a request against the configured one.
///
/// The token may be presented as query parameter
/// or as `Authorization: Bearer <token>` header.
pub fn is_authorized(
    expected: Option<&SecretString>,
    query_token: Option<&str>,
    headers: &HeaderMap,
) -> bool {
    let Some(expected) = expected else {
        return true;
    };
    let expected = expected.expose_secret().as_bytes();

    let presented_query = query_token.is_some_and(|t| constant_time_eq(t.as_bytes(), expected));
    let presented_bearer = bearer_token(headers).is_some_and(|t| constant_time_eq(t, expected));

    presented_query || presented_bearer
}

fn bearer_token(headers: &HeaderMap) -> Option<&[u8]> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim().as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
