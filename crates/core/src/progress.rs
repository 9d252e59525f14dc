use std::time::SystemTime;

use serde::Serialize;
use uuid::Uuid;

/// Pipeline stages, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Transcript,
    Merge,
    Frames,
    Analysis,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Transcript => "transcript",
            Stage::Merge => "merge",
            Stage::Frames => "frames",
            Stage::Analysis => "analysis",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Started,
    Finished,
    Skipped,
    Failed,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Started => "started",
            StageStatus::Finished => "finished",
            StageStatus::Skipped => "skipped",
            StageStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageEvent {
    pub event_id: Uuid,
    pub ts: SystemTime,
    pub stage: Stage,
    pub status: StageStatus,
    pub message: String,
}

impl StageEvent {
    pub const EVENT_TYPE: &'static str = "digest.stage";

    pub fn new(stage: Stage, status: StageStatus, message: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            ts: SystemTime::now(),
            stage,
            status,
            message: message.into(),
        }
    }
}

/// Receives stage events as the pipeline runs. Implementations must be cheap;
/// emit is called inline from the pipeline.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: StageEvent);
}

/// Discards every event.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn emit(&self, _event: StageEvent) {}
}

/// Forwards every event to the log facade.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn emit(&self, event: StageEvent) {
        log::info!(
            "{} {}: {}",
            event.stage.as_str(),
            event.status.as_str(),
            event.message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_serialize_with_snake_case_tags() {
        let event = StageEvent::new(Stage::Frames, StageStatus::Skipped, "no grabber");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["stage"], json!("frames"));
        assert_eq!(value["status"], json!("skipped"));
        assert_eq!(value["message"], json!("no grabber"));
    }

    #[test]
    fn string_names_match_the_serialized_form() {
        for stage in [Stage::Transcript, Stage::Merge, Stage::Frames, Stage::Analysis] {
            let serialized = serde_json::to_value(stage).unwrap();
            assert_eq!(serialized, json!(stage.as_str()));
        }
        for status in [
            StageStatus::Started,
            StageStatus::Finished,
            StageStatus::Skipped,
            StageStatus::Failed,
        ] {
            let serialized = serde_json::to_value(status).unwrap();
            assert_eq!(serialized, json!(status.as_str()));
        }
    }

    #[test]
    fn each_event_gets_a_fresh_id() {
        let a = StageEvent::new(Stage::Merge, StageStatus::Started, "");
        let b = StageEvent::new(Stage::Merge, StageStatus::Started, "");
        assert_ne!(a.event_id, b.event_id);
    }
}
