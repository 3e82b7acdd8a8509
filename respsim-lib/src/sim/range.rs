/// Inclusive byte offsets into the virtual body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: u64,
    pub end: u64,
    pub partial: bool,
}

impl ResolvedRange {
    /// Full body of `total_bytes`, `None` for an empty body.
    pub fn full(total_bytes: u64) -> Option<Self> {
        (total_bytes > 0).then(|| Self {
            start: 0,
            end: total_bytes - 1,
            partial: false,
        })
    }

    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOutcome {
    /// Serve the whole body (`None` when it is empty).
    Full(Option<ResolvedRange>),
    Partial(ResolvedRange),
    /// Start beyond the body or start after end.
    Unsatisfiable,
}

impl RangeOutcome {
    /// The range to stream, if any.
    pub fn range(&self) -> Option<ResolvedRange> {
        match self {
            Self::Full(range) => *range,
            Self::Partial(range) => Some(*range),
            Self::Unsatisfiable => None,
        }
    }

    /// Value for the `Content-Range` header, if the outcome requires one.
    pub fn content_range(&self, total_bytes: u64) -> Option<String> {
        match self {
            Self::Full(_) => None,
            Self::Partial(range) => Some(format!(
                "bytes {}-{}/{total_bytes}",
                range.start, range.end
            )),
            Self::Unsatisfiable => Some(format!("bytes */{total_bytes}")),
        }
    }
}

/// A single `bytes=<start>-<end?>` range as sent by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRangeSpec {
    pub start: u64,
    pub end: Option<u64>,
}

impl ByteRangeSpec {
    /// `None` for anything other than a single range with explicit start:
    /// suffix ranges, multiple ranges and other units are not supported.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let (unit, spec) = value.split_once('=')?;
        if !unit.trim().eq_ignore_ascii_case("bytes") || spec.contains(',') {
            return None;
        }

        let (start, end) = spec.trim().split_once('-')?;
        let start = parse_offset(start)?;
        let end = match end.trim() {
            "" => None,
            end => Some(parse_offset(end)?),
        };
        Some(Self { start, end })
    }
}

fn parse_offset(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Compute the part of the body to deliver.
///
/// Ranges are only honoured when supported and the output is not compressed,
/// compressed output has no stable byte addressing.
pub fn resolve_range(
    total_bytes: u64,
    range_support: bool,
    gzip: bool,
    client_range: Option<&str>,
) -> RangeOutcome {
    let full = RangeOutcome::Full(ResolvedRange::full(total_bytes));

    if !range_support || gzip {
        return full;
    }
    let Some(spec) = client_range.and_then(ByteRangeSpec::parse) else {
        return full;
    };

    let end = spec.end.unwrap_or(total_bytes.saturating_sub(1));
    if spec.start > end || spec.start >= total_bytes {
        return RangeOutcome::Unsatisfiable;
    }

    RangeOutcome::Partial(ResolvedRange {
        start: spec.start,
        end: end.min(total_bytes - 1),
        partial: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(start: u64, end: u64) -> RangeOutcome {
        RangeOutcome::Partial(ResolvedRange {
            start,
            end,
            partial: true,
        })
    }

    #[test]
    fn test_parse_byte_range_spec() {
        for (input, expected) in [
            (
                "bytes=0-99",
                Some(ByteRangeSpec {
                    start: 0,
                    end: Some(99),
                }),
            ),
            (
                "bytes=10-",
                Some(ByteRangeSpec {
                    start: 10,
                    end: None,
                }),
            ),
            (
                "Bytes = 5 - 6",
                Some(ByteRangeSpec {
                    start: 5,
                    end: Some(6),
                }),
            ),
            ("bytes=-500", None),
            ("bytes=0-1,5-6", None),
            ("items=0-1", None),
            ("bytes=a-b", None),
            ("bytes=+1-2", None),
            ("bytes", None),
            ("", None),
        ] {
            assert_eq!(ByteRangeSpec::parse(input), expected, "input: '{input}'");
        }
    }

    #[test]
    fn test_full_body_without_client_range() {
        assert_eq!(
            resolve_range(1000, true, false, None),
            RangeOutcome::Full(Some(ResolvedRange {
                start: 0,
                end: 999,
                partial: false
            }))
        );
        assert_eq!(
            resolve_range(0, true, false, None),
            RangeOutcome::Full(None)
        );
    }

    #[test]
    fn test_partial_ranges() {
        assert_eq!(resolve_range(1000, true, false, Some("bytes=0-999")), partial(0, 999));
        assert_eq!(resolve_range(1000, true, false, Some("bytes=0-9999")), partial(0, 999));
        assert_eq!(resolve_range(1000, true, false, Some("bytes=10-")), partial(10, 999));
        assert_eq!(resolve_range(1000, true, false, Some("bytes=5-5")), partial(5, 5));
    }

    #[test]
    fn test_unsatisfiable_ranges() {
        for (total, header) in [
            (1000, "bytes=2000-3000"),
            (1000, "bytes=1000-"),
            (1000, "bytes=50-10"),
            (0, "bytes=0-"),
            (0, "bytes=0-10"),
        ] {
            assert_eq!(
                resolve_range(total, true, false, Some(header)),
                RangeOutcome::Unsatisfiable,
                "total={total}, header={header}"
            );
        }
    }

    #[test]
    fn test_range_ignored_when_disabled_or_compressed() {
        let full = RangeOutcome::Full(ResolvedRange::full(1000));
        assert_eq!(resolve_range(1000, false, false, Some("bytes=0-9")), full);
        assert_eq!(resolve_range(1000, true, true, Some("bytes=0-9")), full);
        assert_eq!(resolve_range(1000, true, true, Some("bytes=5000-")), full);
        assert_eq!(resolve_range(1000, true, false, Some("bytes=-10")), full);
    }

    #[test]
    fn test_content_range_header_values() {
        assert_eq!(
            partial(0, 999).content_range(1000).as_deref(),
            Some("bytes 0-999/1000")
        );
        assert_eq!(
            RangeOutcome::Unsatisfiable.content_range(1000).as_deref(),
            Some("bytes */1000")
        );
        assert_eq!(
            RangeOutcome::Full(ResolvedRange::full(1000)).content_range(1000),
            None
        );
    }

    #[test]
    fn test_resolved_range_len() {
        assert_eq!(ResolvedRange::full(10_000).map(|r| r.len()), Some(10_000));
        assert_eq!(ResolvedRange::full(0), None);
    }
}
