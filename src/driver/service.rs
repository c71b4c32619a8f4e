//! Request handling for the line driver.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::ratelimit::{ActionClass, RateLimiterBackend};

/// One request line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DriverRequest {
    /// Record a request and report whether it is limited
    Consume {
        identifier: String,
        #[serde(default)]
        class: ActionClass,
    },
    /// Report the remaining hourly allowance
    Remaining {
        identifier: String,
        #[serde(default)]
        class: ActionClass,
    },
    /// Clear all state for a key
    Reset {
        identifier: String,
        #[serde(default)]
        class: ActionClass,
    },
}

/// One response line. Fields that do not apply to the operation are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriverResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<ActionClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limited: Option<bool>,
    /// HTTP status the calling layer would answer with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DriverResponse {
    fn for_key(op: &'static str, identifier: String, class: ActionClass) -> Self {
        Self {
            op: Some(op),
            identifier: Some(identifier),
            class: Some(class),
            ..Self::default()
        }
    }

    fn invalid(error: String) -> Self {
        Self {
            error: Some(error),
            status: Some(400),
            ..Self::default()
        }
    }
}

/// Dispatches driver requests to a rate limiter.
pub struct LimitService<R: RateLimiterBackend> {
    /// The rate limiter instance
    rate_limiter: Arc<R>,
}

impl<R: RateLimiterBackend> LimitService<R> {
    /// Create a new LimitService with the given rate limiter.
    pub fn new(rate_limiter: Arc<R>) -> Self {
        Self { rate_limiter }
    }

    /// Parse and answer one input line. Bad input yields an error response.
    pub fn handle_line(&self, line: &str) -> DriverResponse {
        match serde_json::from_str::<DriverRequest>(line) {
            Ok(request) => self.handle(request),
            Err(e) => {
                warn!(error = %e, "Rejecting malformed driver request");
                DriverResponse::invalid(e.to_string())
            }
        }
    }

    /// Answer one parsed request.
    #[instrument(skip(self))]
    pub fn handle(&self, request: DriverRequest) -> DriverResponse {
        match request {
            DriverRequest::Consume { identifier, class } => {
                let status = match self.rate_limiter.admit(&identifier, class) {
                    Ok(()) => 200,
                    Err(e) => e.status_code(),
                };
                debug!(status, "Consume processed");

                DriverResponse {
                    limited: Some(status != 200),
                    status: Some(status),
                    ..DriverResponse::for_key("consume", identifier, class)
                }
            }
            DriverRequest::Remaining { identifier, class } => {
                let remaining = self.rate_limiter.remaining(&identifier, class);
                DriverResponse {
                    remaining: Some(remaining),
                    ..DriverResponse::for_key("remaining", identifier, class)
                }
            }
            DriverRequest::Reset { identifier, class } => {
                self.rate_limiter.reset(&identifier, class);
                // A cleared key has its whole hour ahead of it.
                let remaining = self.rate_limiter.ceiling(class).per_hour;
                DriverResponse {
                    remaining: Some(remaining),
                    ..DriverResponse::for_key("reset", identifier, class)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::{LimitRules, ManualClock, RateLimiter};

    fn service() -> LimitService<RateLimiter<ManualClock>> {
        let limiter = RateLimiter::with_clock(LimitRules::default(), ManualClock::new());
        LimitService::new(Arc::new(limiter))
    }

    #[test]
    fn test_parse_request_defaults_class() {
        let request: DriverRequest =
            serde_json::from_str(r#"{"op":"consume","identifier":"10.0.0.5"}"#).unwrap();
        assert_eq!(
            request,
            DriverRequest::Consume {
                identifier: "10.0.0.5".to_string(),
                class: ActionClass::General,
            }
        );
    }

    #[test]
    fn test_consume_reports_429_when_limited() {
        let service = service();
        let line = r#"{"op":"consume","identifier":"userA","class":"login"}"#;

        for _ in 0..5 {
            let response = service.handle_line(line);
            assert_eq!(response.limited, Some(false));
            assert_eq!(response.status, Some(200));
        }

        let response = service.handle_line(line);
        assert_eq!(response.limited, Some(true));
        assert_eq!(response.status, Some(429));
        assert_eq!(response.class, Some(ActionClass::Login));
    }

    #[test]
    fn test_reset_reports_full_allowance() {
        let service = service();
        service.handle_line(r#"{"op":"consume","identifier":"Z"}"#);

        let response = service.handle_line(r#"{"op":"remaining","identifier":"Z"}"#);
        assert_eq!(response.remaining, Some(999));

        let response = service.handle_line(r#"{"op":"reset","identifier":"Z"}"#);
        assert_eq!(response.op, Some("reset"));
        assert_eq!(response.remaining, Some(1000));
    }

    #[test]
    fn test_reset_leaves_no_entry_behind() {
        let limiter = Arc::new(RateLimiter::with_clock(
            LimitRules::default(),
            ManualClock::new(),
        ));
        let service = LimitService::new(Arc::clone(&limiter));

        for _ in 0..6 {
            service.handle_line(r#"{"op":"consume","identifier":"userA","class":"login"}"#);
        }
        assert_eq!(limiter.tracked_keys(), 1);

        let response =
            service.handle_line(r#"{"op":"reset","identifier":"userA","class":"login"}"#);
        assert_eq!(response.remaining, Some(20));
        assert_eq!(limiter.tracked_keys(), 0);

        let response = service.handle_line(r#"{"op":"reset","identifier":"ghost"}"#);
        assert_eq!(response.remaining, Some(1000));
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn test_malformed_line() {
        let service = service();

        let response = service.handle_line("not json");
        assert_eq!(response.status, Some(400));
        assert!(response.error.is_some());
        assert!(response.op.is_none());

        let response = service.handle_line(r#"{"op":"consume","identifier":"a","class":"admin"}"#);
        assert!(response.error.is_some());
    }

    #[test]
    fn test_response_omits_unused_fields() {
        let service = service();
        let response = service.handle_line(r#"{"op":"remaining","identifier":"q"}"#);
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(
            json,
            r#"{"op":"remaining","identifier":"q","class":"general","remaining":1000}"#
        );
    }
}
