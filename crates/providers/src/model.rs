use std::pin::Pin;

use {async_trait::async_trait, tokio_stream::Stream};

/// Events emitted during a streamed text generation.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Delta(String),
    Done,
    Error(String),
}

/// Generative-text provider (Gemini, etc.).
///
/// `contents` values use the provider wire shape built by [`content`]:
/// a role plus a list of text parts.
#[async_trait]
pub trait TextProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Single non-streamed call. Returns the raw upstream response body so
    /// diagnostic callers can inspect it.
    async fn generate(&self, contents: Vec<serde_json::Value>)
    -> anyhow::Result<serde_json::Value>;

    /// Stream a generation, yielding delta/done/error events. The stream
    /// is finite and not restartable; callers drain it fully.
    fn stream(
        &self,
        contents: Vec<serde_json::Value>,
    ) -> Pin<Box<dyn Stream<Item = StreamEvent> + Send + '_>>;
}

/// Image generation provider. Returns a hosted image URL.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Build one content entry in the text-provider wire shape.
pub fn content(role: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "role": role,
        "parts": [{ "text": text }],
    })
}

/// Extract the reply text from a raw non-streamed response: top-level
/// `text` if present, else the joined part texts of the first candidate.
pub fn extract_text(raw: &serde_json::Value) -> String {
    if let Some(text) = raw["text"].as_str() {
        return text.to_string();
    }
    raw["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_wire_shape() {
        let c = content("user", "hi");
        assert_eq!(c["role"], "user");
        assert_eq!(c["parts"][0]["text"], "hi");
    }

    #[test]
    fn extract_prefers_top_level_text() {
        let raw = serde_json::json!({ "text": "direct" });
        assert_eq!(extract_text(&raw), "direct");
    }

    #[test]
    fn extract_joins_candidate_parts() {
        let raw = serde_json::json!({
            "candidates": [{ "content": { "parts": [
                { "text": "one" }, { "text": "two" }
            ]}}]
        });
        assert_eq!(extract_text(&raw), "one\ntwo");
    }

    #[test]
    fn extract_empty_on_unknown_shape() {
        assert_eq!(extract_text(&serde_json::json!({ "ok": true })), "");
    }
}
