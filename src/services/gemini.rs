use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::core::error::CollaboratorError;
use crate::core::traits::{EmbeddingProvider, TextGenerator};
use crate::models::TasteVector;

/// Errors that can occur when calling the Gemini API
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl GeminiError {
    fn into_collaborator(self, service: &str) -> CollaboratorError {
        match self {
            GeminiError::InvalidResponse(message) => CollaboratorError::invalid(service, message),
            other => CollaboratorError::failed(service, other),
        }
    }
}

/// Gemini REST client
///
/// Provides mood embeddings (`embedContent`) and explanation text
/// (`generateContent`). The API key travels in the `x-goog-api-key` header.
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    embedding_model: String,
    generation_model: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(
        base_url: String,
        api_key: String,
        embedding_model: String,
        generation_model: String,
        request_timeout: Duration,
    ) -> Result<Self, GeminiError> {
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            embedding_model,
            generation_model,
            client,
        })
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(model),
            method
        )
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value, GeminiError> {
        tracing::debug!("Calling Gemini: {}", url);

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(GeminiError::Unauthorized),
            status if !status.is_success() => {
                let text = response.text().await.unwrap_or_default();
                Err(GeminiError::ApiError(format!("{}: {}", status, text)))
            }
            _ => Ok(response.json().await?),
        }
    }

    /// Embed a piece of text with the configured embedding model
    pub async fn embed_content(&self, text: &str) -> Result<TasteVector, GeminiError> {
        let url = self.model_url(&self.embedding_model, "embedContent");
        let body = json!({ "content": { "parts": [{ "text": text }] } });

        let json = self.post(&url, &body).await?;

        let values = json
            .get("embedding")
            .and_then(|e| e.get("values"))
            .and_then(|v| v.as_array())
            .ok_or_else(|| GeminiError::InvalidResponse("Missing embedding.values".into()))?;

        values
            .iter()
            .map(|v| {
                v.as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| GeminiError::InvalidResponse("Non-numeric embedding value".into()))
            })
            .collect::<Result<Vec<f32>, _>>()
            .map(TasteVector::new)
    }

    /// Generate text for a prompt with the configured generation model
    pub async fn generate_content(&self, prompt: &str) -> Result<String, GeminiError> {
        let url = self.model_url(&self.generation_model, "generateContent");
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });

        let json = self.post(&url, &body).await?;

        let parts = json
            .get("candidates")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .ok_or_else(|| GeminiError::InvalidResponse("Missing candidates[0].content.parts".into()))?;

        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect();

        Ok(text)
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini-embedding"
    }

    async fn embed(&self, text: &str) -> Result<TasteVector, CollaboratorError> {
        self.embed_content(text)
            .await
            .map_err(|e| e.into_collaborator(EmbeddingProvider::name(self)))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &str {
        "gemini-generation"
    }

    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
        self.generate_content(prompt)
            .await
            .map_err(|e| e.into_collaborator(TextGenerator::name(self)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client(base_url: String) -> GeminiClient {
        GeminiClient::new(
            base_url,
            "test-key".to_string(),
            "text-embedding-004".to_string(),
            "gemini-2.5-flash".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_embed_content() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/text-embedding-004:embedContent")
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::PartialJson(json!({
                "content": { "parts": [{ "text": "something spicy" }] }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"embedding":{"values":[0.1,0.2,0.3]}}"#)
            .create_async()
            .await;

        let vector = client(server.url()).embed_content("something spicy").await.unwrap();

        mock.assert_async().await;
        assert_eq!(vector.as_slice(), &[0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_generate_content_joins_parts() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates":[{"content":{"parts":[{"text":"Crispy and "},{"text":"bright."}]}}]}"#,
            )
            .create_async()
            .await;

        let text = client(server.url()).generate_content("prompt").await.unwrap();

        mock.assert_async().await;
        assert_eq!(text, "Crispy and bright.");
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/models/text-embedding-004:embedContent")
            .with_status(403)
            .create_async()
            .await;

        let result = client(server.url()).embed_content("x").await;
        assert!(matches!(result, Err(GeminiError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_malformed_body_maps_to_invalid_response() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/models/text-embedding-004:embedContent")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"unexpected":true}"#)
            .create_async()
            .await;

        let result = client(server.url()).embed("x").await;
        assert!(matches!(result, Err(CollaboratorError::InvalidResponse { .. })));
    }

    #[tokio::test]
    async fn test_server_error_maps_to_failed() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(500)
            .with_body("internal")
            .create_async()
            .await;

        let result = client(server.url()).generate("x").await;
        assert!(matches!(result, Err(CollaboratorError::Failed { .. })));
    }
}
