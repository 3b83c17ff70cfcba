//! HTTP client for the tracking backend.

use crate::error::RequestFailure;
use crate::model::{ApiErrorBody, RegisterAck, RegisterRequest, TrackConfig, TrackingSnapshot};
use anyhow::{Context, Result};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

const REGISTER_FAILED: &str = "registration failed";
const FETCH_FAILED: &str = "failed to fetch tracking information";

#[derive(Debug, Clone)]
pub struct TrackingClient {
    http: Client,
    base_url: Url,
}

impl TrackingClient {
    pub fn new(cfg: &TrackConfig) -> Result<Self> {
        let base_url = Url::parse(&cfg.base_url)
            .with_context(|| format!("parse base URL {}", cfg.base_url))?;
        let http = Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.timeout)
            .build()
            .context("build HTTP client")?;
        Ok(Self { http, base_url })
    }

    /// `POST /api/track`.
    pub async fn register(
        &self,
        tracking_number: &str,
        item_name: &str,
    ) -> Result<RegisterAck, RequestFailure> {
        let tracking_number = tracking_number.trim();
        if tracking_number.is_empty() {
            return Err(RequestFailure::InvalidTrackingNumber);
        }
        let url = self.endpoint(&["api", "track"])?;
        tracing::debug!(%url, tracking_number, "registering");
        let resp = self
            .http
            .post(url)
            .json(&RegisterRequest {
                tracking_number: tracking_number.to_string(),
                item_name: item_name.to_string(),
            })
            .send()
            .await?;
        read_json(resp, REGISTER_FAILED).await
    }

    /// `GET /api/track/{tracking_number}`.
    pub async fn fetch(&self, tracking_number: &str) -> Result<TrackingSnapshot, RequestFailure> {
        let tracking_number = tracking_number.trim();
        if tracking_number.is_empty() {
            return Err(RequestFailure::InvalidTrackingNumber);
        }
        let url = self.endpoint(&["api", "track", tracking_number])?;
        tracing::debug!(%url, "fetching");
        let resp = self.http.get(url).send().await?;
        read_json(resp, FETCH_FAILED).await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RequestFailure> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RequestFailure::BaseUrl {
                url: self.base_url.to_string(),
                reason: "cannot be a base".into(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn read_json<T: DeserializeOwned>(
    resp: reqwest::Response,
    default_message: &str,
) -> Result<T, RequestFailure> {
    let status = resp.status();
    let body = resp.bytes().await?;
    if !status.is_success() {
        let message = serde_json::from_slice::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default_message.to_string());
        return Err(RequestFailure::Rejected { status, message });
    }
    serde_json::from_slice(&body).map_err(RequestFailure::Decode)
}
