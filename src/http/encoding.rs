//! Content-Encoding negotiation module
//!
//! Decides from `Accept-Encoding` whether a gzip body may be sent.

/// Returns true if the client accepts `gzip`
///
/// An explicit `gzip` entry wins over `*`. A quality value of zero
/// refuses the coding. Missing header means identity only.
///
/// # Examples
/// ```
/// use edgehost::http::encoding::accepts_gzip;
/// assert!(accepts_gzip(Some("gzip, deflate, br")));
/// assert!(!accepts_gzip(Some("gzip;q=0, br")));
/// assert!(!accepts_gzip(None));
/// ```
pub fn accepts_gzip(accept_encoding: Option<&str>) -> bool {
    let Some(header) = accept_encoding else {
        return false;
    };

    let mut wildcard = None;
    for item in header.split(',') {
        let mut parts = item.split(';');
        let coding = parts.next().unwrap_or_default().trim();
        let quality = parts
            .find_map(|p| p.trim().strip_prefix("q="))
            .map_or(1.0, |q| q.trim().parse::<f32>().unwrap_or(0.0));

        if coding.eq_ignore_ascii_case("gzip") || coding.eq_ignore_ascii_case("x-gzip") {
            return quality > 0.0;
        }
        if coding == "*" {
            wildcard = Some(quality > 0.0);
        }
    }

    wildcard.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_gzip() {
        assert!(accepts_gzip(Some("gzip")));
        assert!(accepts_gzip(Some("deflate, gzip")));
        assert!(accepts_gzip(Some("GZIP")));
        assert!(accepts_gzip(Some("x-gzip")));
    }

    #[test]
    fn test_quality_values() {
        assert!(accepts_gzip(Some("gzip;q=0.5")));
        assert!(accepts_gzip(Some("br;q=1.0, gzip; q=0.8")));
        assert!(!accepts_gzip(Some("gzip;q=0")));
        assert!(!accepts_gzip(Some("gzip;q=0.0, *;q=1")));
        assert!(!accepts_gzip(Some("gzip;q=abc")));
    }

    #[test]
    fn test_wildcard() {
        assert!(accepts_gzip(Some("*")));
        assert!(!accepts_gzip(Some("*;q=0")));
        assert!(!accepts_gzip(Some("br, identity")));
    }

    #[test]
    fn test_missing_header() {
        assert!(!accepts_gzip(None));
        assert!(!accepts_gzip(Some("")));
    }
}
