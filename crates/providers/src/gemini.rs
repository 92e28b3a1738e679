use std::pin::Pin;

use {
    async_trait::async_trait,
    futures::StreamExt,
    tokio_stream::Stream,
    tracing::debug,
};

use crate::model::{StreamEvent, TextProvider};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-001";

/// Gemini `generateContent` / `streamGenerateContent` client.
pub struct GeminiProvider {
    model: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_options(api_key, DEFAULT_MODEL.into(), DEFAULT_BASE_URL.into())
    }

    pub fn with_options(api_key: String, model: String, base_url: String) -> Self {
        Self {
            model,
            base_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, verb: &str) -> String {
        format!("{}/models/{}:{verb}", self.base_url, self.model)
    }
}

#[async_trait]
impl TextProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        contents: Vec<serde_json::Value>,
    ) -> anyhow::Result<serde_json::Value> {
        let resp = self
            .client
            .post(self.endpoint("generateContent"))
            .header("x-goog-api-key", &self.api_key)
            .json(&serde_json::json!({ "contents": contents }))
            .send()
            .await?;

        if let Err(e) = resp.error_for_status_ref() {
            let status = e.status().map(|s| s.as_u16()).unwrap_or(0);
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("HTTP {status}: {body}");
        }

        Ok(resp.json::<serde_json::Value>().await?)
    }

    fn stream(
        &self,
        contents: Vec<serde_json::Value>,
    ) -> Pin<Box<dyn Stream<Item = StreamEvent> + Send + '_>> {
        Box::pin(async_stream::stream! {
            let resp = match self
                .client
                .post(self.endpoint("streamGenerateContent"))
                .query(&[("alt", "sse")])
                .header("x-goog-api-key", &self.api_key)
                .json(&serde_json::json!({ "contents": contents }))
                .send()
                .await
            {
                Ok(r) => {
                    if let Err(e) = r.error_for_status_ref() {
                        let status = e.status().map(|s| s.as_u16()).unwrap_or(0);
                        let body_text = r.text().await.unwrap_or_default();
                        yield StreamEvent::Error(format!("HTTP {status}: {body_text}"));
                        return;
                    }
                    r
                }
                Err(e) => {
                    yield StreamEvent::Error(e.to_string());
                    return;
                }
            };

            let mut byte_stream = resp.bytes_stream();
            let mut buf = String::new();

            while let Some(chunk) = byte_stream.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        yield StreamEvent::Error(e.to_string());
                        return;
                    }
                };
                buf.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(pos) = buf.find('\n') {
                    let line = buf[..pos].trim().to_string();
                    buf = buf[pos + 1..].to_string();

                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };

                    let Ok(evt) = serde_json::from_str::<serde_json::Value>(data) else {
                        debug!(line = %data, "skipping unparseable sse chunk");
                        continue;
                    };

                    if let Some(msg) = evt["error"]["message"].as_str() {
                        yield StreamEvent::Error(msg.to_string());
                        return;
                    }

                    if let Some(parts) = evt["candidates"][0]["content"]["parts"].as_array() {
                        for part in parts {
                            if let Some(text) = part["text"].as_str()
                                && !text.is_empty()
                            {
                                yield StreamEvent::Delta(text.to_string());
                            }
                        }
                    }
                }
            }

            yield StreamEvent::Done;
        })
    }
}
