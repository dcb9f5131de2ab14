// Imgur image host - upload by URL into an album
use crate::application::media::ImageHost;
use crate::domain::error::PipelineError;
use async_trait::async_trait;
use serde::Deserialize;

const UPLOAD_URL: &str = "https://api.imgur.com/3/image";

#[derive(Debug, Clone)]
pub struct ImgurHost {
    client: reqwest::Client,
    client_id: String,
    album: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: UploadData,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl ImgurHost {
    pub fn new(client: reqwest::Client, client_id: String, album: Option<String>) -> Self {
        Self {
            client,
            client_id,
            album,
        }
    }

    fn form(&self, url: &str) -> Vec<(&'static str, String)> {
        let mut form = vec![("image", url.to_string()), ("type", "url".to_string())];
        if let Some(album) = &self.album {
            form.push(("album", album.clone()));
        }
        form
    }
}

#[async_trait]
impl ImageHost for ImgurHost {
    async fn upload_url(&self, url: &str) -> Result<String, PipelineError> {
        let response = self
            .client
            .post(UPLOAD_URL)
            .header("Authorization", format!("Client-ID {}", self.client_id))
            .form(&self.form(url))
            .send()
            .await
            .map_err(|e| PipelineError::UploadError(e.without_url().to_string()))?;

        let status = response.status();
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::UploadError(format!("unreadable response ({}): {}", status, e)))?;

        if !status.is_success() {
            let reason = body
                .data
                .error
                .map(|e| e.to_string())
                .unwrap_or_else(|| status.to_string());
            return Err(PipelineError::UploadError(reason));
        }

        body.data
            .link
            .ok_or_else(|| PipelineError::UploadError("response carried no link".to_string()))
    }
}
