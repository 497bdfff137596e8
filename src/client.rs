// src/client.rs
use log::{debug, error};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::{Stock, StockFields};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered {status}: {message}")]
    Status { status: StatusCode, message: String },
}

/// A request ready to send: method, path below the API root, JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub method: Method,
    pub path: String,
    pub body: Value,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Talks to the `/api` root of a running portfolio server.
#[derive(Debug, Clone)]
pub struct PortfolioClient {
    http: Client,
    base_url: String,
}

impl PortfolioClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        PortfolioClient { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn list_stocks(&self) -> Result<Vec<Stock>, ClientError> {
        let res = send(self.http.get(self.url("/stocks"))).await?;
        Ok(res.json().await?)
    }

    pub async fn create_stock(&self, fields: &StockFields) -> Result<Stock, ClientError> {
        let res = send(self.http.post(self.url("/stocks")).json(fields)).await?;
        Ok(res.json().await?)
    }

    pub async fn update_stock(&self, id: i64, fields: &StockFields) -> Result<Stock, ClientError> {
        let res = send(self.http.put(self.url(&format!("/stocks/{}", id))).json(fields)).await?;
        Ok(res.json().await?)
    }

    pub async fn delete_stock(&self, id: i64) -> Result<(), ClientError> {
        send(self.http.delete(self.url(&format!("/stocks/{}", id)))).await?;
        Ok(())
    }

    /// Sends a form submission as-is and returns the stored stock.
    pub async fn submit(&self, submission: &Submission) -> Result<Stock, ClientError> {
        let request = self
            .http
            .request(submission.method.clone(), self.url(&submission.path))
            .json(&submission.body);
        let res = send(request).await?;
        Ok(res.json().await?)
    }
}

async fn send(request: RequestBuilder) -> Result<Response, ClientError> {
    let res = request.send().await.map_err(|e| {
        error!("Request to portfolio server failed: {}", e);
        ClientError::Http(e)
    })?;
    let status = res.status();
    debug!("{} {}", status, res.url());
    if status.is_success() {
        return Ok(res);
    }

    let text = res.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    Err(ClientError::Status { status, message })
}
