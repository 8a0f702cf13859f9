//! Byte-range handling
//!
//! Only the first range of a `Range` header is ever served; multi-range
//! requests get that one range back rather than a multipart response.
//! Malformed or unsatisfiable headers are ignored and the whole entry is
//! served.

use hyper::StatusCode;

/// Inclusive byte range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered
    pub fn byte_count(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Outcome of parsing a `Range` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeParse {
    /// Satisfiable ranges, in request order
    Ranges(Vec<ByteRange>),
    /// Well-formed but none of the ranges overlap the entry
    Unsatisfiable,
    /// Not a `bytes=` range header we understand
    Malformed,
}

/// Parse a `Range` header against an entry of `size` bytes
pub fn parse_range(size: u64, header: &str) -> RangeParse {
    let Some((unit, spec)) = header.trim().split_once('=') else {
        return RangeParse::Malformed;
    };
    if !unit.trim().eq_ignore_ascii_case("bytes") {
        return RangeParse::Malformed;
    }

    let mut ranges = Vec::new();
    for part in spec.split(',') {
        let Some((start_raw, end_raw)) = part.trim().split_once('-') else {
            return RangeParse::Malformed;
        };
        let (start_raw, end_raw) = (start_raw.trim(), end_raw.trim());

        let (start, end) = if start_raw.is_empty() {
            // suffix range: last N bytes
            let Ok(suffix) = end_raw.parse::<u64>() else {
                return RangeParse::Malformed;
            };
            (size.saturating_sub(suffix), size.saturating_sub(1))
        } else {
            let Ok(start) = start_raw.parse::<u64>() else {
                return RangeParse::Malformed;
            };
            let end = if end_raw.is_empty() {
                size.saturating_sub(1)
            } else {
                match end_raw.parse::<u64>() {
                    Ok(end) => end.min(size.saturating_sub(1)),
                    Err(_) => return RangeParse::Malformed,
                }
            };
            (start, end)
        };

        if size > 0 && start <= end && start < size {
            ranges.push(ByteRange { start, end });
        }
    }

    if ranges.is_empty() {
        RangeParse::Unsatisfiable
    } else {
        RangeParse::Ranges(ranges)
    }
}

/// Status and length headers decided for an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangePlan {
    pub status: StatusCode,
    pub range: Option<ByteRange>,
    pub content_range: Option<String>,
    pub content_length: Option<u64>,
}

impl RangePlan {
    /// Decide how to serve an entry of `size` bytes given the request's
    /// `Range` header
    pub fn for_entry(size: u64, header: Option<&str>) -> Self {
        let first = match header.map(|h| parse_range(size, h)) {
            Some(RangeParse::Ranges(ranges)) => ranges.into_iter().next(),
            _ => None,
        };
        match first {
            Some(range) => Self {
                status: StatusCode::PARTIAL_CONTENT,
                range: Some(range),
                content_range: Some(format!("bytes {}-{}/{}", range.start, range.end, size)),
                content_length: Some(range.byte_count()),
            },
            None => Self {
                status: StatusCode::OK,
                range: None,
                content_range: None,
                content_length: (size > 0).then_some(size),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_range() {
        let plan = RangePlan::for_entry(500, Some("bytes=0-99"));
        assert_eq!(plan.status, StatusCode::PARTIAL_CONTENT);
        assert_eq!(plan.content_range.as_deref(), Some("bytes 0-99/500"));
        assert_eq!(plan.content_length, Some(100));
        assert_eq!(plan.range, Some(ByteRange { start: 0, end: 99 }));
    }

    #[test]
    fn test_only_first_range_is_used() {
        assert_eq!(
            parse_range(1000, "bytes=0-9, 20-29"),
            RangeParse::Ranges(vec![ByteRange { start: 0, end: 9 }, ByteRange { start: 20, end: 29 }])
        );
        let plan = RangePlan::for_entry(1000, Some("bytes=10-19,50-59"));
        assert_eq!(plan.content_range.as_deref(), Some("bytes 10-19/1000"));
        assert_eq!(plan.content_length, Some(10));
    }

    #[test]
    fn test_open_and_suffix_ranges() {
        assert_eq!(parse_range(100, "bytes=90-"), RangeParse::Ranges(vec![ByteRange { start: 90, end: 99 }]));
        assert_eq!(parse_range(100, "bytes=-10"), RangeParse::Ranges(vec![ByteRange { start: 90, end: 99 }]));
        assert_eq!(parse_range(100, "bytes=-500"), RangeParse::Ranges(vec![ByteRange { start: 0, end: 99 }]));
        // end past the entry is clamped
        assert_eq!(parse_range(100, "bytes=50-5000"), RangeParse::Ranges(vec![ByteRange { start: 50, end: 99 }]));
    }

    #[test]
    fn test_unsatisfiable_and_malformed_serve_everything() {
        assert_eq!(parse_range(100, "bytes=200-300"), RangeParse::Unsatisfiable);
        assert_eq!(parse_range(100, "bytes=50-10"), RangeParse::Unsatisfiable);
        assert_eq!(parse_range(0, "bytes=0-"), RangeParse::Unsatisfiable);
        assert_eq!(parse_range(100, "items=0-5"), RangeParse::Malformed);
        assert_eq!(parse_range(100, "bytes=a-b"), RangeParse::Malformed);
        assert_eq!(parse_range(100, "garbage"), RangeParse::Malformed);

        let plan = RangePlan::for_entry(100, Some("bytes=200-300"));
        assert_eq!(plan.status, StatusCode::OK);
        assert_eq!(plan.content_length, Some(100));
        assert_eq!(plan.content_range, None);
    }

    #[test]
    fn test_no_header() {
        let plan = RangePlan::for_entry(42, None);
        assert_eq!(plan.status, StatusCode::OK);
        assert_eq!(plan.content_length, Some(42));
        assert_eq!(RangePlan::for_entry(0, None).content_length, None);
    }
}
