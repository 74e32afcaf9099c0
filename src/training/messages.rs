//! Wire types exchanged with observers: inbound control messages, outbound
//! snapshot updates and command replies. All of them are JSON.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::ai::TrainingInfo;
use crate::error::ControlError;
use crate::game::GameSnapshot;

/// Updates broadcast from the training thread.
///
/// Serialized as `{"event": "...", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum TrainingUpdate {
    #[serde(rename = "game_update")]
    Game(GameSnapshot),
    #[serde(rename = "training_update")]
    Training(TrainingInfo),
    /// The run ended because a tick failed.
    Stopped { reason: String },
    /// The run reached its epoch ceiling.
    Finished { epoch: usize },
}

/// Commands accepted from observers, tagged by `"type"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    StartTraining,
    StopTraining,
    ResetGame,
    ResetAgent,
    /// Numeric fields also accept numeric strings, since form-based clients
    /// send them that way.
    SetHyperparameters {
        #[serde(deserialize_with = "lenient_f64")]
        learning_rate: f64,
        #[serde(deserialize_with = "lenient_usize")]
        batch_size: usize,
        #[serde(deserialize_with = "lenient_usize")]
        max_epochs: usize,
    },
}

impl ControlMessage {
    /// Parse one JSON control message.
    pub fn parse(text: &str) -> Result<Self, ControlError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Acknowledgement for a handled control message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlReply {
    pub event: String,
    pub message: String,
}

impl ControlReply {
    pub fn new(event: &str, message: &str) -> Self {
        ControlReply {
            event: event.to_string(),
            message: message.to_string(),
        }
    }
}

/// Result of asking the controller to start a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

impl StartOutcome {
    pub fn message(self) -> &'static str {
        match self {
            StartOutcome::Started => "Training started",
            StartOutcome::AlreadyRunning => "Training already in progress",
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Int(u64),
    Float(f64),
    Text(String),
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Numeric::deserialize(deserializer)? {
        Numeric::Int(n) => Ok(n as f64),
        Numeric::Float(f) => Ok(f),
        Numeric::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("expected a number, got {s:?}"))),
    }
}

fn lenient_usize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    match Numeric::deserialize(deserializer)? {
        Numeric::Int(n) => usize::try_from(n)
            .map_err(|_| de::Error::custom(format!("{n} does not fit in usize"))),
        Numeric::Float(f) if f >= 0.0 && f.fract() == 0.0 && f <= usize::MAX as f64 => {
            Ok(f as usize)
        }
        Numeric::Float(f) => Err(de::Error::custom(format!(
            "expected a non-negative integer, got {f}"
        ))),
        Numeric::Text(s) => s
            .trim()
            .parse::<usize>()
            .map_err(|_| de::Error::custom(format!("expected a non-negative integer, got {s:?}"))),
    }
}
