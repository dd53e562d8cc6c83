use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error body returned by the FINVO API on any non-2xx response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Usually a string; request-validation failures send a list of objects
    #[serde(default)]
    pub detail: Option<Value>,
    /// Machine-readable code; only newer server builds send it
    #[serde(default)]
    pub code: Option<String>,
}

impl ApiErrorBody {
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::String(_) | Value::Null => None,
            Value::Array(items) => {
                let msgs: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                if msgs.is_empty() {
                    None
                } else {
                    Some(msgs.join("; "))
                }
            }
            other => Some(other.to_string()),
        }
    }
}

/// Generic `{"message": ...}` acknowledgement
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}
