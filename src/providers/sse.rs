//! Line-oriented reader for the event stream a Gradio job emits.
//!
//! Only two event names matter: `complete` carries the job output on its
//! `data:` line, `error` means the job was refused (in practice: anonymous
//! quota is used up). Heartbeats and progress events are skipped.

use serde_json::Value;

use crate::error::{GenerateError, Result};

const DIAGNOSTIC_PREFIX_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseState {
    /// Outside any `complete` event; `data:` lines are ignored.
    Idle,
    /// The last `event:` line named `complete`; the next `data:` line is the result.
    InComplete,
}

#[derive(Debug)]
pub struct SseParser {
    state: SseState,
    prefix: String,
    prefix_chars: usize,
}

impl Default for SseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SseParser {
    pub fn new() -> Self {
        Self {
            state: SseState::Idle,
            prefix: String::new(),
            prefix_chars: 0,
        }
    }

    pub fn state(&self) -> SseState {
        self.state
    }

    /// Feeds one line as read from the stream, line terminator included
    /// or not.
    ///
    /// Returns `Ok(Some(payload))` at the first `data:` line of a `complete`
    /// event, `Err(QuotaExhausted)` at the first `error` event, `Ok(None)`
    /// otherwise.
    pub fn feed_line(&mut self, raw_line: &str) -> Result<Option<Vec<Value>>> {
        self.record(raw_line);
        let line = raw_line.trim_end_matches(&['\r', '\n'][..]);

        if let Some(name) = line.strip_prefix("event:") {
            self.state = match name.trim() {
                "complete" => SseState::InComplete,
                "error" => return Err(GenerateError::QuotaExhausted),
                _ => SseState::Idle,
            };
        } else if let Some(data) = line.strip_prefix("data:") {
            if self.state == SseState::InComplete {
                return parse_payload(data.trim()).map(Some);
            }
        }

        Ok(None)
    }

    /// Error to report when the stream ended without a result.
    pub fn finish(self) -> GenerateError {
        GenerateError::NoCompleteEvent(self.prefix)
    }

    fn record(&mut self, raw_line: &str) {
        for c in raw_line.chars() {
            if self.prefix_chars == DIAGNOSTIC_PREFIX_CHARS {
                break;
            }
            self.prefix.push(c);
            self.prefix_chars += 1;
        }
    }
}

fn parse_payload(data: &str) -> Result<Vec<Value>> {
    match serde_json::from_str::<Value>(data)? {
        Value::Array(items) => Ok(items),
        other => Err(GenerateError::ResponseError(format!(
            "complete event payload is not a JSON array: {}",
            other
        ))),
    }
}

/// Parses a whole stream held in memory.
pub fn parse_complete_event(stream: &str) -> Result<Vec<Value>> {
    let mut parser = SseParser::new();
    for line in stream.split_inclusive('\n') {
        if let Some(payload) = parser.feed_line(line)? {
            return Ok(payload);
        }
    }
    Err(parser.finish())
}
