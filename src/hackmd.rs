use crate::types::{DigestError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const NOTES_API_URL: &str = "https://api.hackmd.io/v1/notes";

/// Client for the HackMD note-hosting API. The note upload is an optional
/// sink; callers treat failures as non-fatal.
pub struct HackmdClient {
    client: Client,
    token: String,
}

#[derive(Serialize)]
struct CreateNoteRequest<'a> {
    title: &'a str,
    content: &'a str,
    #[serde(rename = "readPermission")]
    read_permission: &'a str,
    #[serde(rename = "writePermission")]
    write_permission: &'a str,
    #[serde(rename = "commentPermission")]
    comment_permission: &'a str,
}

#[derive(Deserialize)]
struct CreateNoteResponse {
    id: String,
}

impl HackmdClient {
    pub fn new(client: Client, token: String) -> Self {
        Self { client, token }
    }

    /// Create a publicly readable note and return its URL. Anything other
    /// than HTTP 201 is an upload failure.
    pub async fn create_note(&self, title: &str, content: &str) -> Result<String> {
        debug!(title, "Creating note");

        let request = CreateNoteRequest {
            title,
            content,
            read_permission: "guest",
            write_permission: "owner",
            comment_permission: "everyone",
        };

        let response = self
            .client
            .post(NOTES_API_URL)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(DigestError::NoteUpload(format!("HTTP {status}: {body}")));
        }

        let note: CreateNoteResponse = response.json().await?;
        Ok(format!("https://hackmd.io/{}", note.id))
    }
}
