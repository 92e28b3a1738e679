use async_trait::async_trait;

use crate::model::ImageProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI images API client. One image per request, fixed 512x512 size.
pub struct OpenAiImageProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiImageProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.into())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            base_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ImageProvider for OpenAiImageProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let resp = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "prompt": prompt,
                "n": 1,
                "size": "512x512",
            }))
            .send()
            .await?;

        if let Err(e) = resp.error_for_status_ref() {
            let status = e.status().map(|s| s.as_u16()).unwrap_or(0);
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("HTTP {status}: {body}");
        }

        let body = resp.json::<serde_json::Value>().await?;
        body["data"][0]["url"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("image response missing data[0].url"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_for(server: &mockito::Server) -> OpenAiImageProvider {
        OpenAiImageProvider::with_base_url("test-key".into(), server.url())
    }

    #[tokio::test]
    async fn generate_returns_hosted_url() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/images/generations")
            .match_header("authorization", "Bearer test-key")
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":[{"url":"https://img.example/cat.png"}]}"#)
            .create_async()
            .await;

        let url = provider_for(&server).generate("a cat").await.unwrap();
        assert_eq!(url, "https://img.example/cat.png");
    }

    #[tokio::test]
    async fn generate_fails_on_http_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/images/generations")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let err = provider_for(&server).generate("a cat").await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn generate_fails_on_missing_url() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/images/generations")
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":[]}"#)
            .create_async()
            .await;

        let err = provider_for(&server).generate("a cat").await.unwrap_err();
        assert!(err.to_string().contains("data[0].url"));
    }
}
