use rama::http::{HeaderMap, header::ACCEPT_ENCODING};

/// One `coding;q=<weight>` item of an `Accept-Encoding` header.
#[derive(Debug, Clone, PartialEq)]
struct EncodingPreference<'a> {
    coding: &'a str,
    quality: f32,
}

impl<'a> EncodingPreference<'a> {
    fn parse(s: &'a str) -> Option<Self> {
        let mut parts = s.split(';');
        let coding = parts.next()?.trim();
        if coding.is_empty() {
            return None;
        }

        let quality = parts
            .filter_map(|param| {
                let (key, value) = param.split_once('=')?;
                if !key.trim().eq_ignore_ascii_case("q") {
                    return None;
                }
                value.trim().parse::<f32>().ok()
            })
            .next()
            .unwrap_or(1.0);

        Some(Self { coding, quality })
    }
}

/// Whether the client accepts a gzip encoded response.
///
/// An explicit `gzip` (or `x-gzip`) preference wins over the `*` wildcard,
/// a weight of zero means "not acceptable".
pub fn accepts_gzip(headers: &HeaderMap) -> bool {
    let mut explicit = None;
    let mut wildcard = None;

    for value in headers.get_all(ACCEPT_ENCODING) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for pref in value.split(',').filter_map(EncodingPreference::parse) {
            if pref.coding.eq_ignore_ascii_case("gzip")
                || pref.coding.eq_ignore_ascii_case("x-gzip")
            {
                explicit = Some(pref.quality);
            } else if pref.coding == "*" {
                wildcard = Some(pref.quality);
            }
        }
    }

    explicit.or(wildcard).is_some_and(|q| q > 0.0)
}
