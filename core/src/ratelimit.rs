//! Rate-limit headers attached to error responses.
//!
//! The service reports its budget on every response; on `429` callers are
//! expected to wait before retrying. The client itself never retries.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::http::HttpResponse;

pub const GLOBAL_REMAINING_HEADER: &str = "x-ratelimit-global-remaining";
pub const ROUTE_REMAINING_HEADER: &str = "x-ratelimit-route-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";
pub const RETRY_AFTER_HEADER: &str = "retry-after";

/// Rate-limit state reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimit {
    pub global_remaining: Option<u64>,
    pub route_remaining: Option<u64>,
    /// When the current window resets (`x-ratelimit-reset`, epoch millis).
    pub reset_at: Option<SystemTime>,
    /// Parsed `retry-after`, either delta seconds or an HTTP-date.
    pub retry_after: Option<Duration>,
}

impl RateLimit {
    pub fn from_response(response: &HttpResponse) -> Self {
        Self {
            global_remaining: parse_count(response.header(GLOBAL_REMAINING_HEADER)),
            route_remaining: parse_count(response.header(ROUTE_REMAINING_HEADER)),
            reset_at: response.header(RESET_HEADER).and_then(parse_reset),
            retry_after: response
                .header(RETRY_AFTER_HEADER)
                .and_then(|v| parse_retry_after(v, SystemTime::now())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.global_remaining.is_none()
            && self.route_remaining.is_none()
            && self.reset_at.is_none()
            && self.retry_after.is_none()
    }

    /// How long to wait before the next attempt, measured from `now`.
    ///
    /// `retry-after` wins; otherwise the distance to the reset time. A reset
    /// time already in the past yields `Duration::ZERO`.
    pub fn retry_delay(&self, now: SystemTime) -> Option<Duration> {
        if let Some(delay) = self.retry_after {
            return Some(delay);
        }
        self.reset_at
            .map(|reset| reset.duration_since(now).unwrap_or(Duration::ZERO))
    }
}

fn parse_count(value: Option<&str>) -> Option<u64> {
    value?.trim().parse().ok()
}

fn parse_reset(value: &str) -> Option<SystemTime> {
    let millis: u64 = value.trim().parse().ok()?;
    UNIX_EPOCH.checked_add(Duration::from_millis(millis))
}

/// Parse a `retry-after` value: delta seconds or RFC 1123 HTTP-date.
///
/// Returns `None` for negative seconds, dates already past, or garbage.
pub fn parse_retry_after(value: &str, now: SystemTime) -> Option<Duration> {
    let trimmed = value.trim();
    if let Ok(seconds) = trimmed.parse::<i64>() {
        return u64::try_from(seconds).ok().map(Duration::from_secs);
    }
    let at = httpdate::parse_http_date(trimmed).ok()?;
    at.duration_since(now).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(headers: &[(&str, &str)]) -> HttpResponse {
        HttpResponse {
            status: 429,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: String::new(),
        }
    }

    #[test]
    fn parses_all_headers() {
        let limit = RateLimit::from_response(&response(&[
            ("X-Ratelimit-Global-Remaining", "10"),
            ("X-Ratelimit-Route-Remaining", "0"),
            ("X-Ratelimit-Reset", "1700000000000"),
            ("Retry-After", "7"),
        ]));
        assert_eq!(limit.global_remaining, Some(10));
        assert_eq!(limit.route_remaining, Some(0));
        assert_eq!(
            limit.reset_at,
            Some(UNIX_EPOCH + Duration::from_millis(1_700_000_000_000))
        );
        assert_eq!(limit.retry_after, Some(Duration::from_secs(7)));
        assert!(!limit.is_empty());
    }

    #[test]
    fn missing_headers_yield_empty() {
        let limit = RateLimit::from_response(&response(&[]));
        assert!(limit.is_empty());
        assert_eq!(limit.retry_delay(SystemTime::now()), None);
    }

    #[test]
    fn negative_or_garbage_retry_after_is_ignored() {
        let now = SystemTime::now();
        assert_eq!(parse_retry_after("-3", now), None);
        assert_eq!(parse_retry_after("soon", now), None);
    }

    #[test]
    fn retry_after_accepts_http_date() {
        let now = UNIX_EPOCH + Duration::from_secs(1_445_412_400);
        // 2015-10-21T07:28:00Z, 80 seconds after `now`
        let delay = parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT", now);
        assert_eq!(delay, Some(Duration::from_secs(80)));
    }

    #[test]
    fn past_http_date_is_ignored() {
        let now = UNIX_EPOCH + Duration::from_secs(2_000_000_000);
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT", now), None);
    }

    #[test]
    fn retry_delay_prefers_retry_after() {
        let now = UNIX_EPOCH + Duration::from_secs(100);
        let limit = RateLimit {
            reset_at: Some(UNIX_EPOCH + Duration::from_secs(160)),
            retry_after: Some(Duration::from_secs(2)),
            ..RateLimit::default()
        };
        assert_eq!(limit.retry_delay(now), Some(Duration::from_secs(2)));

        let limit = RateLimit {
            retry_after: None,
            ..limit
        };
        assert_eq!(limit.retry_delay(now), Some(Duration::from_secs(60)));
    }

    #[test]
    fn reset_in_the_past_means_no_wait() {
        let now = UNIX_EPOCH + Duration::from_secs(500);
        let limit = RateLimit {
            reset_at: Some(UNIX_EPOCH + Duration::from_secs(100)),
            ..RateLimit::default()
        };
        assert_eq!(limit.retry_delay(now), Some(Duration::ZERO));
    }
}
