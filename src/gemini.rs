// src/gemini.rs

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::config::GeminiConfig;
use crate::error::ExtractError;
use crate::readiness::{FilePoller, FileState};

/// The instruction sent along with the uploaded receipt.
const TRANSCRIBE_PROMPT: &str = "Extract text from this receipt";

/// Thin REST client for the Gemini file and generation endpoints.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
}

/// Handle for a file registered with the remote service.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    /// Service-side resource name, e.g. `files/abc123`.
    pub name: String,
    pub uri: String,
    pub mime_type: String,
    pub state: FileState,
}

#[derive(Deserialize)]
struct UploadResponse {
    file: FileResource,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    name: String,
    uri: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

impl FileResource {
    fn file_state(&self) -> FileState {
        self.state
            .as_deref()
            .map(FileState::from_remote)
            .unwrap_or(FileState::Processing)
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(cfg: &GeminiConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
        }
    }

    /// Register raw bytes with the file API. The returned handle may
    /// still be processing; callers must wait for it to become active
    /// before asking for generation.
    pub async fn upload_file(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<RemoteFile, ExtractError> {
        let url = format!("{}/upload/v1beta/files?key={}", self.base_url, self.api_key);
        let response = self
            .http
            .post(&url)
            .header("X-Goog-Upload-Protocol", "raw")
            .header("Content-Type", mime_type)
            .body(bytes)
            .send()
            .await?;

        let response = check_status(response, "file upload").await?;
        let upload: UploadResponse = response.json().await?;
        let file = upload.file;
        let state = file.file_state();
        info!(name = %file.name, state = ?state, "Registered file with model service");

        Ok(RemoteFile {
            mime_type: file.mime_type.unwrap_or_else(|| mime_type.to_string()),
            name: file.name,
            uri: file.uri,
            state,
        })
    }

    /// Ask the model to transcribe the uploaded receipt.
    pub async fn extract_text(&self, file: &RemoteFile) -> Result<String, ExtractError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = json!({
            "contents": [{
                "parts": [
                    { "file_data": { "file_uri": file.uri, "mime_type": file.mime_type } },
                    { "text": TRANSCRIBE_PROMPT },
                ],
            }],
        });

        let response = self.http.post(&url).json(&body).send().await?;
        let response = check_status(response, "content generation").await?;
        let generate: GenerateResponse = response.json().await?;

        let text: String = generate
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ExtractError::Service {
                stage: "content generation",
                detail: "model returned no text".to_string(),
            });
        }

        info!(chars = text.len(), "Model transcription received");
        Ok(text)
    }
}

async fn check_status(
    response: reqwest::Response,
    stage: &'static str,
) -> Result<reqwest::Response, ExtractError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(ExtractError::Service {
        stage,
        detail: format!("{status}: {body}"),
    })
}

#[async_trait]
impl FilePoller for GeminiClient {
    async fn poll_state(&mut self, name: &str) -> Result<FileState, ExtractError> {
        let url = format!("{}/v1beta/{}?key={}", self.base_url, name, self.api_key);
        let response = self.http.get(&url).send().await?;
        let response = check_status(response, "file status poll").await?;
        let file: FileResource = response.json().await?;
        Ok(file.file_state())
    }
}
