//! Frame Codec
//!
//! Decodes inbound text frames to JSON payloads. Every exchange in scope
//! speaks JSON on its public market-data streams; some also send bare text
//! keepalives (`"pong"`), which decode to a JSON string and are classified
//! away by the profile.

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The frame was not valid JSON.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The frame was empty.
    #[error("empty frame")]
    Empty,
}

/// JSON codec for market-data frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl JsonCodec {
    /// Create a codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode one text frame.
    ///
    /// Bare keepalive words (`ping`/`pong`) are mapped to JSON strings so
    /// the profile can classify them uniformly.
    pub fn decode(&self, text: &str) -> Result<serde_json::Value, CodecError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(CodecError::Empty);
        }
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            return Ok(serde_json::from_str(trimmed)?);
        }
        Ok(serde_json::Value::String(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_object() {
        let value = JsonCodec::new().decode(r#"{"event":"subscribe"}"#).unwrap();
        assert_eq!(value, json!({"event": "subscribe"}));
    }

    #[test]
    fn decodes_bare_pong_as_string() {
        let value = JsonCodec::new().decode("pong").unwrap();
        assert_eq!(value, json!("pong"));
    }

    #[test]
    fn rejects_truncated_json() {
        assert!(JsonCodec::new().decode(r#"{"event":"#).is_err());
    }

    #[test]
    fn rejects_empty_frame() {
        assert!(matches!(
            JsonCodec::new().decode("   "),
            Err(CodecError::Empty)
        ));
    }
}
