// Records served by the API. Built fresh for every request from the NextBus XML
// feed and dropped once serialized.

use serde::{Deserialize, Serialize};

// ============================================================================
// Data Structures
// ============================================================================

pub const UNKNOWN_ROUTE: &str = "Unknown";
pub const UNKNOWN_DIRECTION: &str = "Unknown Direction";

/// One upstream arrival/departure estimate for one vehicle at one stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub route_tag: String,
    pub stop_title: Option<String>,
    pub vehicle: Option<String>,
    pub minutes: u32,
    pub seconds: u32,
    /// Milliseconds since the Unix epoch, 0 when the feed did not send one.
    pub epoch_time: i64,
    /// `epoch_time` rendered in the agency's local time. `None` when `epoch_time` is 0.
    pub timestamp: Option<String>,
    pub is_departure: bool,
    pub affected_by_layover: bool,
    pub trip_tag: Option<String>,
    pub block: Option<String>,
    pub dir_tag: Option<String>,
    pub direction: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub title: Option<String>,
    pub stop_id: String,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTagResult {
    pub route_tag: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub tested: usize,
    pub results: Vec<RouteTagResult>,
}

// ============================================================================
// Response Envelope
// ============================================================================

/// Either the normalized payload or `{"error": ...}`. Both are sent with 200.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FeedResponse<T> {
    Data(T),
    Error { error: String },
}

impl<T: Serialize> FeedResponse<T> {
    pub fn success(data: T) -> Self {
        FeedResponse::Data(data)
    }

    pub fn error(message: impl Into<String>) -> Self {
        FeedResponse::Error {
            error: message.into(),
        }
    }
}
