use anyhow::Result;
use reqwest::{header, Client};

/// One fetched document, owned by a single worker for one pipeline pass.
#[derive(Debug)]
pub struct FetchResponse {
    pub content_type: String,
    pub status_code: i16,
    pub body: Vec<u8>,
}

/// Content types the crawler persists.
const ALLOWED_CONTENT_TYPES: [&str; 2] = ["text/html", "text/plain"];

pub fn content_type_allowed(content_type: &str) -> bool {
    ALLOWED_CONTENT_TYPES.contains(&content_type)
}

/// Lowercase a raw content-type header and keep the first `;` token.
pub fn normalize_content_type(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    lowered.split(';').next().unwrap_or("").trim().to_string()
}

/// GET `url`. The client carries the crawler's user agent, redirect policy
/// and total timeout; status gating happens at the call site.
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchResponse> {
    let response = client.get(url).send().await?;
    let status_code = response.status().as_u16() as i16;
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(normalize_content_type)
        .unwrap_or_default();
    let body = response.bytes().await?.to_vec();
    Ok(FetchResponse { content_type, status_code, body })
}
