//! Collapses a [`TimeRange`]'s optional `start`/`end`/`duration` triple into
//! a definite `(start, end)` pair, per the policy table in the module
//! overview: first match wins.

use std::time::{SystemTime, UNIX_EPOCH};

use stats_core::Error;

use super::model::{NormalizedTimeRange, TimeRange};

const ONE_HOUR_MICROS: i64 = 3_600_000_000;
const ONE_SECOND_MICROS: i64 = 1_000_000;

/// Current wall-clock time, truncated to whole seconds, in microseconds.
///
/// Truncating to seconds means repeated calls within the same second
/// produce identical boundaries, which the default- and duration-only
/// paths rely on.
pub fn now_micros_truncated() -> i64 {
    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_micros() as i64;
    (micros / ONE_SECOND_MICROS) * ONE_SECOND_MICROS
}

/// Normalize a [`TimeRange`] against the given `now` (microseconds,
/// already truncated to whole seconds).
///
/// Use [`normalize`] in production code; this variant exists so callers can
/// pin `now` in tests.
pub fn normalize_at(tr: &TimeRange, now: i64) -> Result<NormalizedTimeRange, Error> {
    let (start, end) = match (tr.start, tr.end, tr.duration) {
        (Some(s), Some(e), _) => {
            let (lo, hi) = if s <= e { (s, e) } else { (e, s) };
            if lo == hi {
                return Err(Error::InvalidObject(
                    "empty time range: start equals end".to_string(),
                ));
            }
            (lo, hi)
        }
        (None, Some(_), _) => {
            return Err(Error::InvalidObject(
                "time range start is not set".to_string(),
            ));
        }
        (Some(s), None, Some(d)) if d > 0 => (s, s + d),
        (Some(_), None, Some(_)) => {
            return Err(Error::InvalidObject(
                "empty time range: duration is zero or negative".to_string(),
            ));
        }
        (None, None, Some(d)) if d > 0 => (now - d, now),
        (Some(_), None, None) => {
            return Err(Error::InvalidObject(
                "time range start is set, but not end or duration".to_string(),
            ));
        }
        (None, None, _) => (now - ONE_HOUR_MICROS, now),
    };

    Ok(NormalizedTimeRange {
        start,
        end,
        duration: end - start,
        granularity: tr.granularity,
    })
}

/// Normalize a [`TimeRange`] against the real current wall-clock time.
pub fn normalize(tr: &TimeRange) -> Result<NormalizedTimeRange, Error> {
    normalize_at(tr, now_micros_truncated())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::types::Granularity;

    fn range(start: Option<i64>, end: Option<i64>, duration: Option<i64>) -> TimeRange {
        TimeRange {
            start,
            end,
            duration,
            granularity: Granularity::Seconds,
        }
    }

    #[test]
    fn both_set_normal_order() {
        let r = normalize_at(&range(Some(1_000_000), Some(2_000_000), None), 0).unwrap();
        assert_eq!((r.start, r.end), (1_000_000, 2_000_000));
        assert_eq!(r.duration, 1_000_000);
    }

    #[test]
    fn both_set_reversed_order_is_swapped() {
        let r = normalize_at(&range(Some(2_000_000), Some(1_000_000), None), 0).unwrap();
        assert_eq!((r.start, r.end), (1_000_000, 2_000_000));
    }

    #[test]
    fn both_set_equal_is_an_error() {
        let err = normalize_at(&range(Some(5), Some(5), None), 0).unwrap_err();
        assert!(matches!(err, Error::InvalidObject(m) if m.contains("start equals end")));
    }

    #[test]
    fn end_without_start_is_an_error() {
        let err = normalize_at(&range(None, Some(5), None), 0).unwrap_err();
        assert!(matches!(err, Error::InvalidObject(m) if m.contains("start is not set")));
    }

    #[test]
    fn start_and_positive_duration() {
        let r = normalize_at(&range(Some(10), None, Some(5)), 0).unwrap();
        assert_eq!((r.start, r.end), (10, 15));
    }

    #[test]
    fn start_and_non_positive_duration_is_an_error() {
        let err = normalize_at(&range(Some(10), None, Some(0)), 0).unwrap_err();
        assert!(matches!(err, Error::InvalidObject(m) if m.contains("duration is zero or negative")));

        let err = normalize_at(&range(Some(10), None, Some(-5)), 0).unwrap_err();
        assert!(matches!(err, Error::InvalidObject(m) if m.contains("duration is zero or negative")));
    }

    #[test]
    fn duration_only_anchors_on_now() {
        let r = normalize_at(&range(None, None, Some(100)), 1_000).unwrap();
        assert_eq!((r.start, r.end), (900, 1_000));
    }

    #[test]
    fn start_only_is_an_error() {
        let err = normalize_at(&range(Some(10), None, None), 0).unwrap_err();
        assert!(matches!(err, Error::InvalidObject(m) if m.contains("not end or duration")));
    }

    #[test]
    fn nothing_set_defaults_to_one_hour_window() {
        let r = normalize_at(&range(None, None, None), 10_000_000).unwrap();
        assert_eq!(r.start, 10_000_000 - ONE_HOUR_MICROS);
        assert_eq!(r.end, 10_000_000);
        assert_eq!(r.duration, ONE_HOUR_MICROS);
    }

    #[test]
    fn now_is_truncated_to_whole_seconds() {
        let now = now_micros_truncated();
        assert_eq!(now % ONE_SECOND_MICROS, 0);
    }
}
