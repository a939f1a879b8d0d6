//! Room status query.
//!
//! The status endpoint and the meaning of its status codes are observed
//! behavior, not a documented contract, so both live in [`StatusMapping`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{DetectionContext, DetectionStrategy, Verdict};
use crate::error::ProbeError;
use crate::read::LiveState;
use crate::utils::scalar_key;

/// Placeholder replaced by the room id in [`StatusMapping::endpoint`].
pub const ROOM_ID_PLACEHOLDER: &str = "{room_id}";

/// How to query the status endpoint and how to read its answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMapping {
    /// URL template containing `{room_id}`.
    pub endpoint: String,
    /// JSON pointers tried in order; the first present, non-null value wins.
    pub pointers: Vec<String>,
    /// Status values that mean the room is live.
    pub live_values: Vec<String>,
    /// Status values that mean the session has ended.
    pub ended_values: Vec<String>,
}

impl Default for StatusMapping {
    fn default() -> Self {
        Self {
            endpoint: "https://www.tiktok.com/api/live/detail/?aid=1988&roomID={room_id}"
                .to_string(),
            pointers: vec!["/LiveRoomInfo/status".to_string(), "/data/status".to_string()],
            live_values: vec!["2".to_string()],
            ended_values: vec!["4".to_string()],
        }
    }
}

impl StatusMapping {
    pub fn endpoint_for(&self, room_id: &str) -> String {
        self.endpoint.replace(ROOM_ID_PLACEHOLDER, room_id)
    }

    /// Parse a raw status response and classify it.
    pub fn classify_body(&self, body: &str) -> Result<LiveState, ProbeError> {
        let json: Value = serde_json::from_str(body)?;
        self.classify(&json)
    }

    /// Map a status response body to a definite state.
    pub fn classify(&self, body: &Value) -> Result<LiveState, ProbeError> {
        let value = self
            .pointers
            .iter()
            .filter_map(|pointer| body.pointer(pointer))
            .find(|value| !value.is_null())
            .ok_or_else(|| ProbeError::MissingStatusField(self.pointers.join(", ")))?;

        let key = scalar_key(value).ok_or_else(|| ProbeError::UnknownStatus(value.to_string()))?;

        if self.live_values.iter().any(|v| *v == key) {
            Ok(LiveState::Live)
        } else if self.ended_values.iter().any(|v| *v == key) {
            Ok(LiveState::NotLive)
        } else {
            Err(ProbeError::UnknownStatus(key))
        }
    }
}

/// Asks the status endpoint about the room id found earlier in the chain.
///
/// Transport failures abort the read. A body that cannot be classified
/// defers to the next strategy.
pub struct StatusQueryStrategy {
    mapping: StatusMapping,
}

impl StatusQueryStrategy {
    pub fn new(mapping: StatusMapping) -> Self {
        Self { mapping }
    }

    async fn query(&self, ctx: &DetectionContext<'_>, room_id: &str) -> Result<String, ProbeError> {
        let url = self.mapping.endpoint_for(room_id);
        let response = ctx.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        Ok(response.text().await?)
    }
}

impl Default for StatusQueryStrategy {
    fn default() -> Self {
        Self::new(StatusMapping::default())
    }
}

#[async_trait]
impl DetectionStrategy for StatusQueryStrategy {
    fn name(&self) -> &'static str {
        "status_query"
    }

    async fn detect(&self, ctx: &mut DetectionContext<'_>) -> Verdict {
        let Some(room_id) = ctx.room_id.clone() else {
            return Verdict::Defer;
        };

        let body = match self.query(ctx, &room_id).await {
            Ok(body) => body,
            Err(e) => return Verdict::Abort(e),
        };

        match self.mapping.classify_body(&body) {
            Ok(state) => {
                debug!(room_id = %room_id, %state, "Room status resolved");
                Verdict::Settled(state)
            }
            Err(e @ ProbeError::JsonError(_)) => {
                warn!(room_id = %room_id, error = %e, "Status response is not JSON");
                Verdict::Defer
            }
            Err(e) => {
                debug!(room_id = %room_id, error = %e, "Room status ambiguous");
                Verdict::Defer
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_for() {
        let mapping = StatusMapping::default();
        assert_eq!(
            mapping.endpoint_for("42"),
            "https://www.tiktok.com/api/live/detail/?aid=1988&roomID=42"
        );
    }

    #[test]
    fn test_classify_default_mapping() {
        let mapping = StatusMapping::default();
        assert_eq!(
            mapping.classify(&json!({"LiveRoomInfo": {"status": 2}})).unwrap(),
            LiveState::Live
        );
        assert_eq!(
            mapping.classify(&json!({"LiveRoomInfo": {"status": 4}})).unwrap(),
            LiveState::NotLive
        );
        // Second pointer is used when the first is missing or null.
        assert_eq!(
            mapping
                .classify(&json!({"LiveRoomInfo": {"status": null}, "data": {"status": "2"}}))
                .unwrap(),
            LiveState::Live
        );
    }

    #[test]
    fn test_classify_ambiguous() {
        let mapping = StatusMapping::default();
        assert!(matches!(
            mapping.classify(&json!({"other": 1})),
            Err(ProbeError::MissingStatusField(_))
        ));
        assert!(matches!(
            mapping.classify(&json!({"data": {"status": 3}})),
            Err(ProbeError::UnknownStatus(s)) if s == "3"
        ));
        assert!(matches!(
            mapping.classify(&json!({"data": {"status": [2]}})),
            Err(ProbeError::UnknownStatus(_))
        ));
    }

    #[test]
    fn test_classify_body() {
        let mapping = StatusMapping::default();
        assert_eq!(
            mapping.classify_body(r#"{"data":{"status":4}}"#).unwrap(),
            LiveState::NotLive
        );
        assert!(matches!(
            mapping.classify_body("<html>captcha</html>"),
            Err(ProbeError::JsonError(_))
        ));
        assert!(matches!(
            mapping.classify_body("{}"),
            Err(ProbeError::MissingStatusField(_))
        ));
    }

    #[test]
    fn test_classify_custom_mapping() {
        let mapping = StatusMapping {
            pointers: vec!["/room/state".to_string()],
            live_values: vec!["on".to_string()],
            ended_values: vec!["off".to_string()],
            ..Default::default()
        };
        assert_eq!(
            mapping.classify(&json!({"room": {"state": "on"}})).unwrap(),
            LiveState::Live
        );
        assert_eq!(
            mapping.classify(&json!({"room": {"state": "off"}})).unwrap(),
            LiveState::NotLive
        );
    }

    #[tokio::test]
    async fn test_defers_without_room_id() {
        let strategy = StatusQueryStrategy::default();
        let client = crate::client::build_client(std::time::Duration::ZERO).unwrap();
        let mut ctx = DetectionContext::new("<html></html>", &client);
        assert!(matches!(strategy.detect(&mut ctx).await, Verdict::Defer));
    }
}
