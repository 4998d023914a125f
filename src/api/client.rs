//! HTTP client for the dataset metadata API

use super::types::{DatasetSummary, LoginRequest, LoginResponse, NewDataset};
use crate::error::{DataHubError, Result};
use crate::transfer::UploadCompleteRequest;
use log::debug;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Per-request timeout for metadata calls
pub const API_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let http = Client::builder().timeout(API_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Send a request; `None` for 204 or an empty body.
    async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Option<Value>>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path);
        debug!("api_request: {} {}", method, url);

        let mut request = self.http.request(method, &url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(DataHubError::api(status.as_u16(), error_message(&text)));
        }
        if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }

    async fn send_json<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let value = self.send(method, path, body).await?.unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }

    /// Exchange credentials for a bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let body = LoginRequest { username, password };
        let response: LoginResponse = self
            .send_json(Method::POST, "/auth/login", Some(&body))
            .await?;
        if response.token.is_empty() {
            return Err(DataHubError::Validation(
                "Login response did not include a token".to_string(),
            ));
        }
        Ok(response.token)
    }

    /// True when the stored token is accepted. API rejections map to `false`;
    /// transport failures are returned as errors.
    pub async fn check_auth(&self) -> Result<bool> {
        match self.send::<()>(Method::GET, "/auth/check", None).await {
            Ok(_) => Ok(true),
            Err(DataHubError::Api { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn list_datasets(&self) -> Result<Vec<DatasetSummary>> {
        self.send_json::<_, ()>(Method::GET, "/datasets", None).await
    }

    pub async fn get_dataset(&self, dataset_id: &str) -> Result<DatasetSummary> {
        self.send_json::<_, ()>(Method::GET, &format!("/datasets/{}", dataset_id), None)
            .await
    }

    pub async fn create_dataset(&self, dataset: &NewDataset) -> Result<DatasetSummary> {
        self.send_json(Method::POST, "/datasets", Some(dataset)).await
    }

    /// Partial update with arbitrary fields
    pub async fn update_dataset(&self, dataset_id: &str, fields: &Value) -> Result<DatasetSummary> {
        self.send_json(Method::PUT, &format!("/datasets/{}", dataset_id), Some(fields))
            .await
    }

    pub async fn delete_dataset(&self, dataset_id: &str) -> Result<()> {
        self.send::<()>(Method::DELETE, &format!("/datasets/{}", dataset_id), None)
            .await?;
        Ok(())
    }

    /// Record the uploaded files on the dataset.
    pub async fn upload_complete(
        &self,
        dataset_id: &str,
        request: &UploadCompleteRequest,
    ) -> Result<DatasetSummary> {
        self.send_json(
            Method::POST,
            &format!("/datasets/{}/upload-complete", dataset_id),
            Some(request),
        )
        .await
    }
}

/// `error` field of a JSON error body, else the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
