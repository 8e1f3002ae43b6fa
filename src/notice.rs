//! Purpose: Define a stable, structured schema for non-fatal stderr notices.
//! Exports: `Notice`, `notice_json`, `unterminated_notices`.
//! Role: Shared contract helper for CLI diagnostics (non-error events).
//! Invariants: Notices are non-fatal and never alter stdout payloads or the merged file.
//! Invariants: JSON schema is stable once published; fields are additive-only.
use serde_json::{Map, Value, json};

use crate::api::ComposedWord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: String,
    pub time: String,
    pub cmd: String,
    pub word: String,
    pub message: String,
    pub details: Map<String, Value>,
}

pub fn notice_json(notice: &Notice) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(notice.kind));
    inner.insert("time".to_string(), json!(notice.time));
    inner.insert("cmd".to_string(), json!(notice.cmd));
    inner.insert("word".to_string(), json!(notice.word));
    inner.insert("message".to_string(), json!(notice.message));
    inner.insert("details".to_string(), Value::Object(notice.details.clone()));

    let mut outer = Map::new();
    outer.insert("notice".to_string(), Value::Object(inner));
    Value::Object(outer)
}

/// One notice per input that carried no trailing terminator.
pub fn unterminated_notices(composed: &ComposedWord, cmd: &str, time: &str) -> Vec<Notice> {
    composed
        .report
        .unterminated()
        .map(|input| {
            let letter = composed.letters[input.index];
            let mut details = Map::new();
            details.insert("letter".to_string(), json!(letter.as_char().to_string()));
            details.insert("index".to_string(), json!(input.index));
            details.insert("stitch_len".to_string(), json!(input.stitch_len));
            Notice {
                kind: "unterminated".to_string(),
                time: time.to_string(),
                cmd: cmd.to_string(),
                word: composed.word.clone(),
                message: format!("{} has no trailing end marker", letter.file_name()),
                details,
            }
        })
        .collect()
}
