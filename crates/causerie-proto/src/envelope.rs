use serde::{Deserialize, Serialize};

/// Outbound message payload, serialized into the `{type, data}` envelope
/// that rides inside the opaque transport body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Payload {
    Text { text: String },
    Image { link: String },
    Location { latitude: f64, longitude: f64 },
}

impl Payload {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(link: impl Into<String>) -> Self {
        Self::Image { link: link.into() }
    }

    pub fn location(latitude: f64, longitude: f64) -> Self {
        Self::Location {
            latitude,
            longitude,
        }
    }

    /// Serialize to the JSON envelope string carried as the transport body.
    pub fn to_body(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Decoded message body as it is shown to the user.
///
/// Exactly one variant per message; the variant is decided by the envelope
/// tag, with everything unrecognized collapsing to `Text`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayBody {
    Text(String),
    Image { url: String },
    Location { latitude: f64, longitude: f64 },
}

impl DisplayBody {
    /// Decode a transport body. Total: any input yields a body.
    ///
    /// Bodies that are not valid JSON, carry an unknown `type` tag, or have
    /// malformed `data` are shown verbatim as plain text. Producers that
    /// never adopted the envelope format send bare strings, so this fallback
    /// is the compatibility contract, not an error path.
    pub fn from_body(raw: &str) -> Self {
        // Only a JSON object can be an envelope; serde would also accept the
        // [tag, data] sequence form, which no producer emits.
        let value = match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(v) if v.is_object() => v,
            _ => return Self::Text(raw.to_string()),
        };
        match serde_json::from_value::<Payload>(value) {
            Ok(Payload::Text { text }) => Self::Text(text),
            Ok(Payload::Image { link }) => Self::Image { url: link },
            Ok(Payload::Location {
                latitude,
                longitude,
            }) => Self::Location {
                latitude,
                longitude,
            },
            Err(_) => Self::Text(raw.to_string()),
        }
    }
}
