//! Structured transfer-lifecycle logging
//!
//! Events go through the `log` facade as one JSON object per line.

use serde_json::{json, Value};

/// Current timestamp in milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Structured log event builder
///
/// Usage:
/// ```
/// use finvo::logging::LogEvent;
///
/// let log_value = LogEvent::new("TRANSFER_SUBMITTED")
///     .field("source_account_id", 12)
///     .field("destination", "FR12345678")
///     .field("amount", "100.00")
///     .build();
///
/// log::info!("{}", log_value);
/// ```
pub struct LogEvent {
    fields: serde_json::Map<String, Value>,
}

impl LogEvent {
    /// Create a new log event with the given event name
    pub fn new(event: &str) -> Self {
        let mut fields = serde_json::Map::new();
        fields.insert("event".to_string(), json!(event));
        fields.insert("timestamp_ms".to_string(), json!(now_ms()));

        Self { fields }
    }

    /// Add a field to the log event
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Tag with the controller lifecycle generation
    pub fn generation(self, generation: u64) -> Self {
        self.field("generation", generation)
    }

    /// Build the final JSON value
    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }

    pub fn info(self) {
        log::info!("{}", self.build());
    }

    pub fn warn(self) {
        log::warn!("{}", self.build());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_builder() {
        let log = LogEvent::new("TRANSFER_COMPLETED")
            .field("transaction_id", 42)
            .field("amount", "100.00")
            .generation(3)
            .build();

        assert_eq!(log["event"], "TRANSFER_COMPLETED");
        assert_eq!(log["transaction_id"], 42);
        assert_eq!(log["amount"], "100.00");
        assert_eq!(log["generation"], 3);
        assert!(log.get("timestamp_ms").is_some());
    }
}
