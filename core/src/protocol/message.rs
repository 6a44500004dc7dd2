use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const FINAL_ANSWER: &str = "final_answer";
pub const REWARD_SCORE: &str = "reward_score";

/// One line of the single-answer stdout protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolMessage {
    FinalAnswer(String),
    RewardScore(f64),
    /// Free-form log output or a JSON line this reader does not understand.
    Unrecognized(DiscardReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// Not delimited by `{` ... `}`.
    NotJson,
    /// Looked like JSON but failed to parse.
    MalformedJson,
    /// Parsed, but `type` is absent or not one we handle.
    UnknownType,
    /// Known `type` whose payload field is missing or has the wrong JSON type.
    BadPayload,
}

/// The pair produced by a successful single-answer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAnswer {
    pub answer: String,
    pub reward_score: f64,
}

/// Classifies a single line. The caller strips the newline; surrounding
/// whitespace is ignored here.
pub fn decode_line(line: &str) -> ProtocolMessage {
    let s = line.trim();
    if !(s.starts_with('{') && s.ends_with('}')) {
        return ProtocolMessage::Unrecognized(DiscardReason::NotJson);
    }

    let v: Value = match serde_json::from_str(s) {
        Ok(v) => v,
        Err(_) => return ProtocolMessage::Unrecognized(DiscardReason::MalformedJson),
    };

    match v.get("type").and_then(|x| x.as_str()) {
        Some(FINAL_ANSWER) => match v.get("answer").and_then(|x| x.as_str()) {
            Some(answer) => ProtocolMessage::FinalAnswer(answer.to_string()),
            None => ProtocolMessage::Unrecognized(DiscardReason::BadPayload),
        },
        Some(REWARD_SCORE) => match v.get("score").and_then(|x| x.as_f64()) {
            Some(score) => ProtocolMessage::RewardScore(score),
            None => ProtocolMessage::Unrecognized(DiscardReason::BadPayload),
        },
        _ => ProtocolMessage::Unrecognized(DiscardReason::UnknownType),
    }
}
