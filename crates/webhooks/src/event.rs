//! Domain events and their wire payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::WebhookError;

/// Events a webhook can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookEvent {
    /// A workout was logged.
    #[serde(rename = "workout.created")]
    WorkoutCreated,
    /// A workout was edited.
    #[serde(rename = "workout.updated")]
    WorkoutUpdated,
    /// A personal record was set.
    #[serde(rename = "pr.set")]
    PrSet,
    /// A meet result was recorded.
    #[serde(rename = "result.added")]
    ResultAdded,
    /// An athlete's ranking moved.
    #[serde(rename = "ranking.changed")]
    RankingChanged,
}

impl WebhookEvent {
    /// Every event, in wire order.
    pub const ALL: [WebhookEvent; 5] = [
        WebhookEvent::WorkoutCreated,
        WebhookEvent::WorkoutUpdated,
        WebhookEvent::PrSet,
        WebhookEvent::ResultAdded,
        WebhookEvent::RankingChanged,
    ];

    /// The event name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEvent::WorkoutCreated => "workout.created",
            WebhookEvent::WorkoutUpdated => "workout.updated",
            WebhookEvent::PrSet => "pr.set",
            WebhookEvent::ResultAdded => "result.added",
            WebhookEvent::RankingChanged => "ranking.changed",
        }
    }
}

impl fmt::Display for WebhookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookEvent {
    type Err = WebhookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WebhookEvent::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| WebhookError::UnknownEvent(s.to_string()))
    }
}

/// Wire payload for `workout.created` and `workout.updated`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPayload {
    /// The athlete who logged the workout.
    pub user_id: String,
    /// The workout itself.
    pub workout: WorkoutDetails,
}

/// Workout fields carried on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDetails {
    /// Workout id.
    pub id: String,
    /// Kind of session ("tempo", "intervals", "lift", ...).
    pub workout_type: String,
    /// ISO date the workout took place.
    pub date: String,
    /// Session length, if tracked.
    pub duration_seconds: Option<u32>,
    /// Distance covered, if tracked.
    pub distance_meters: Option<f64>,
}

impl WorkoutPayload {
    /// Builds the payload for a workout event.
    pub fn new(user_id: impl Into<String>, workout: WorkoutDetails) -> Self {
        Self {
            user_id: user_id.into(),
            workout,
        }
    }
}

/// Wire payload for `pr.set`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrPayload {
    /// The athlete who set the record.
    pub user_id: String,
    /// The record itself.
    pub pr: PrDetails,
}

/// Personal record fields carried on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrDetails {
    /// Track event name ("100m", "mile", ...).
    pub event: String,
    /// New mark in seconds.
    pub time: f64,
    /// Previous best in seconds, if one existed.
    pub previous_time: Option<f64>,
    /// Seconds shaved off the previous best.
    pub improvement: Option<f64>,
    /// ISO date of the performance.
    pub date: String,
    /// Meet where the record was set, if any.
    pub meet_name: Option<String>,
}

impl PrPayload {
    /// Builds the payload for a new personal record, deriving the
    /// improvement over the previous best.
    pub fn new(
        user_id: impl Into<String>,
        event: impl Into<String>,
        time: f64,
        previous_time: Option<f64>,
        date: impl Into<String>,
        meet_name: Option<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            pr: PrDetails {
                event: event.into(),
                time,
                previous_time,
                improvement: previous_time.map(|previous| previous - time),
                date: date.into(),
                meet_name,
            },
        }
    }
}

/// Wire payload for `result.added`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPayload {
    /// The athlete the result belongs to.
    pub user_id: String,
    /// The result itself.
    pub result: ResultDetails,
}

/// Meet result fields carried on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultDetails {
    /// Track event name.
    pub event: String,
    /// Mark in seconds.
    pub time: f64,
    /// Finishing place, if placed.
    pub place: Option<u32>,
    /// Meet name.
    pub meet_name: String,
    /// ISO date of the meet.
    pub date: String,
}

impl ResultPayload {
    /// Builds the payload for a recorded result.
    pub fn new(user_id: impl Into<String>, result: ResultDetails) -> Self {
        Self {
            user_id: user_id.into(),
            result,
        }
    }
}

/// Wire payload for `ranking.changed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingPayload {
    /// The athlete whose ranking moved.
    pub user_id: String,
    /// The ranking movement.
    pub ranking: RankingDetails,
}

/// Ranking fields carried on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingDetails {
    /// Track event name.
    pub event: String,
    /// New position.
    pub new_rank: u32,
    /// Previous position, if ranked before.
    pub previous_rank: Option<u32>,
    /// Places gained (positive means the athlete moved up).
    pub change: Option<i64>,
}

impl RankingPayload {
    /// Builds the payload for a ranking move, deriving the number of
    /// places gained.
    pub fn new(
        user_id: impl Into<String>,
        event: impl Into<String>,
        new_rank: u32,
        previous_rank: Option<u32>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            ranking: RankingDetails {
                event: event.into(),
                new_rank,
                previous_rank,
                change: previous_rank.map(|previous| i64::from(previous) - i64::from(new_rank)),
            },
        }
    }
}

/// A domain event paired with its typed payload.
///
/// The pairing is a sum type so the serialization site matches
/// exhaustively; there is no untyped payload bag.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A workout was logged.
    WorkoutCreated(WorkoutPayload),
    /// A workout was edited.
    WorkoutUpdated(WorkoutPayload),
    /// A personal record was set.
    PrSet(PrPayload),
    /// A meet result was recorded.
    ResultAdded(ResultPayload),
    /// An athlete's ranking moved.
    RankingChanged(RankingPayload),
}

impl DomainEvent {
    /// The event kind, used for subscription matching and wire headers.
    pub fn kind(&self) -> WebhookEvent {
        match self {
            DomainEvent::WorkoutCreated(_) => WebhookEvent::WorkoutCreated,
            DomainEvent::WorkoutUpdated(_) => WebhookEvent::WorkoutUpdated,
            DomainEvent::PrSet(_) => WebhookEvent::PrSet,
            DomainEvent::ResultAdded(_) => WebhookEvent::ResultAdded,
            DomainEvent::RankingChanged(_) => WebhookEvent::RankingChanged,
        }
    }

    /// Serializes the payload for the delivery body.
    pub fn data(&self) -> Value {
        let value = match self {
            DomainEvent::WorkoutCreated(p) | DomainEvent::WorkoutUpdated(p) => {
                serde_json::to_value(p)
            }
            DomainEvent::PrSet(p) => serde_json::to_value(p),
            DomainEvent::ResultAdded(p) => serde_json::to_value(p),
            DomainEvent::RankingChanged(p) => serde_json::to_value(p),
        };
        value.unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_name_round_trip() {
        for event in WebhookEvent::ALL {
            assert_eq!(event.as_str().parse::<WebhookEvent>().unwrap(), event);
        }
        assert!("meet.scheduled".parse::<WebhookEvent>().is_err());
    }

    #[test]
    fn test_pr_improvement_is_derived() {
        let payload = PrPayload::new(
            "u1",
            "100m",
            10.15,
            Some(10.32),
            "2026-01-04",
            Some("Winter Classic".to_string()),
        );

        let improvement = payload.pr.improvement.unwrap();
        assert!((improvement - 0.17).abs() < 1e-9);

        let first_pr = PrPayload::new("u1", "200m", 21.80, None, "2026-01-04", None);
        assert!(first_pr.pr.improvement.is_none());
    }

    #[test]
    fn test_ranking_change_is_derived() {
        let payload = RankingPayload::new("u1", "100m", 3, Some(7));
        assert_eq!(payload.ranking.change, Some(4));

        let dropped = RankingPayload::new("u1", "100m", 9, Some(5));
        assert_eq!(dropped.ranking.change, Some(-4));

        let unranked = RankingPayload::new("u1", "100m", 12, None);
        assert_eq!(unranked.ranking.change, None);
    }

    #[test]
    fn test_workout_and_result_payloads() {
        let workout = DomainEvent::WorkoutCreated(WorkoutPayload::new(
            "u1",
            WorkoutDetails {
                id: "w1".to_string(),
                workout_type: "intervals".to_string(),
                date: "2026-01-02".to_string(),
                duration_seconds: Some(3600),
                distance_meters: Some(8000.0),
            },
        ));
        assert_eq!(workout.kind(), WebhookEvent::WorkoutCreated);
        assert_eq!(workout.data()["workout"]["workoutType"], "intervals");

        let result = DomainEvent::ResultAdded(ResultPayload::new(
            "u1",
            ResultDetails {
                event: "400m".to_string(),
                time: 48.91,
                place: Some(2),
                meet_name: "Conference Finals".to_string(),
                date: "2026-05-20".to_string(),
            },
        ));
        assert_eq!(result.kind(), WebhookEvent::ResultAdded);
        assert_eq!(result.data()["result"]["meetName"], "Conference Finals");
    }

    #[test]
    fn test_payload_serializes_camel_case() {
        let event = DomainEvent::PrSet(PrPayload::new(
            "u1",
            "100m",
            10.15,
            Some(10.32),
            "2026-01-04",
            Some("Winter Classic".to_string()),
        ));

        assert_eq!(event.kind(), WebhookEvent::PrSet);
        let data = event.data();
        assert_eq!(data["userId"], "u1");
        assert_eq!(data["pr"]["previousTime"], 10.32);
        assert_eq!(data["pr"]["meetName"], "Winter Classic");
    }
}
