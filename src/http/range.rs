//! HTTP Range request parsing module
//!
//! Single byte-range support (RFC 7233) for identity-encoded assets.

/// Resolved, inclusive byte range within a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub const fn byte_count(self) -> usize {
        self.end - self.start + 1
    }

    /// Value of the `Content-Range` header for a body of `total` bytes
    pub fn content_range(self, total: usize) -> String {
        format!("bytes {}-{}/{total}", self.start, self.end)
    }
}

/// Range header parse result
#[derive(Debug, PartialEq, Eq)]
pub enum RangeOutcome {
    /// Serve the given slice with 206
    Partial(ByteRange),
    /// Respond 416
    NotSatisfiable,
    /// No usable Range header; serve the whole body
    Full,
}

/// Parse an HTTP Range header against a body of `size` bytes
///
/// Supported forms are `bytes=a-b`, `bytes=a-` and `bytes=-n`.
/// Multi-range requests and other units fall back to a full response.
///
/// # Examples
/// ```
/// use edgehost::http::range::{parse_range, ByteRange, RangeOutcome};
///
/// assert_eq!(
///     parse_range(Some("bytes=0-99"), 1000),
///     RangeOutcome::Partial(ByteRange { start: 0, end: 99 })
/// );
/// assert_eq!(parse_range(None, 1000), RangeOutcome::Full);
/// ```
pub fn parse_range(range_header: Option<&str>, size: usize) -> RangeOutcome {
    let Some(spec) = range_header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeOutcome::Full;
    };

    if spec.contains(',') {
        return RangeOutcome::Full;
    }

    let Some((first, last)) = spec.split_once('-') else {
        return RangeOutcome::Full;
    };
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        return suffix_range(last, size);
    }

    let Ok(start) = first.parse::<usize>() else {
        return RangeOutcome::Full;
    };
    if start >= size {
        return RangeOutcome::NotSatisfiable;
    }

    let end = if last.is_empty() {
        size - 1
    } else {
        match last.parse::<usize>() {
            Ok(end) if end < start => return RangeOutcome::NotSatisfiable,
            Ok(end) => end.min(size - 1),
            Err(_) => return RangeOutcome::Full,
        }
    };

    RangeOutcome::Partial(ByteRange { start, end })
}

/// `bytes=-n`: the last `n` bytes
fn suffix_range(last: &str, size: usize) -> RangeOutcome {
    let Ok(suffix) = last.parse::<usize>() else {
        return RangeOutcome::Full;
    };

    if suffix == 0 || size == 0 {
        return RangeOutcome::NotSatisfiable;
    }

    RangeOutcome::Partial(ByteRange {
        start: size.saturating_sub(suffix),
        end: size - 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_range() {
        assert_eq!(parse_range(None, 100), RangeOutcome::Full);
        assert_eq!(parse_range(Some("items=0-5"), 100), RangeOutcome::Full);
    }

    #[test]
    fn test_bounded_range() {
        let RangeOutcome::Partial(range) = parse_range(Some("bytes=0-9"), 100) else {
            panic!("expected partial");
        };
        assert_eq!(range, ByteRange { start: 0, end: 9 });
        assert_eq!(range.byte_count(), 10);
        assert_eq!(range.content_range(100), "bytes 0-9/100");
    }

    #[test]
    fn test_open_range_and_clamp() {
        assert_eq!(
            parse_range(Some("bytes=50-"), 100),
            RangeOutcome::Partial(ByteRange { start: 50, end: 99 })
        );
        assert_eq!(
            parse_range(Some("bytes=90-500"), 100),
            RangeOutcome::Partial(ByteRange { start: 90, end: 99 })
        );
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(
            parse_range(Some("bytes=-20"), 100),
            RangeOutcome::Partial(ByteRange { start: 80, end: 99 })
        );
        assert_eq!(
            parse_range(Some("bytes=-500"), 100),
            RangeOutcome::Partial(ByteRange { start: 0, end: 99 })
        );
        assert_eq!(parse_range(Some("bytes=-0"), 100), RangeOutcome::NotSatisfiable);
    }

    #[test]
    fn test_not_satisfiable() {
        assert_eq!(parse_range(Some("bytes=200-"), 100), RangeOutcome::NotSatisfiable);
        assert_eq!(parse_range(Some("bytes=50-10"), 100), RangeOutcome::NotSatisfiable);
        assert_eq!(parse_range(Some("bytes=0-"), 0), RangeOutcome::NotSatisfiable);
    }

    #[test]
    fn test_malformed_is_ignored() {
        assert_eq!(parse_range(Some("bytes=a-b"), 100), RangeOutcome::Full);
        assert_eq!(parse_range(Some("bytes=0-9,20-29"), 100), RangeOutcome::Full);
        assert_eq!(parse_range(Some("bytes=5"), 100), RangeOutcome::Full);
    }
}
