//! Pull-style status provider over the provider's REST API.
//!
//! Every response body is the uniform `{ ok, data?, error? }` envelope,
//! except `predict_wait`, which puts its fields at the top level next to
//! `ok`. Both layouts are accepted there.

use std::time::Duration;

use qtrack_core::config::ProviderConfig;
use qtrack_core::{ProviderError, StatusProvider};
use qtrack_types::lenient::decode_entities;
use qtrack_types::{
    AnalyticsRecord, DetailRecord, EntitySnapshot, Envelope, HistorySample, WaitEstimate,
};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ClientError;

/// [`StatusProvider`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpStatusProvider {
    client: reqwest::Client,
    base: Url,
}

impl HttpStatusProvider {
    /// Build a provider for `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the base URL is unusable, or
    /// [`ClientError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self, ClientError> {
        let base = parse_base_url(&config.base_url)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self { client, base })
    }

    /// The provider's base URL.
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// GET `segments` with `query` and return the parsed JSON body.
    async fn get_json(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<Value, ProviderError> {
        let url = endpoint(&self.base, segments)?;
        debug!(url = %url, "Provider request");

        let response = self
            .client
            .get(url.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Transport(format!("{url} returned {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(format!("{url} body is not JSON: {e}")))
    }

    /// GET an enveloped payload and unwrap it.
    async fn get_enveloped<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let body = self.get_json(segments, query).await?;
        let envelope: Envelope<T> = serde_json::from_value(body)
            .map_err(|e| ProviderError::Malformed(format!("unexpected envelope: {e}")))?;
        Ok(envelope.into_result()?)
    }
}

impl StatusProvider for HttpStatusProvider {
    async fn list_entities(&self) -> Result<Vec<EntitySnapshot>, ProviderError> {
        let rows: Vec<Value> = self.get_enveloped(&["api", "backends"], &[]).await?;
        let total = rows.len();
        let entities = decode_entities(rows);
        if entities.len() < total {
            warn!(
                dropped = total.saturating_sub(entities.len()),
                "Dropped undecodable backend rows"
            );
        }
        Ok(entities)
    }

    async fn entity_detail(&self, identity: &str) -> Result<DetailRecord, ProviderError> {
        self.get_enveloped(&["api", "backends", identity, "details"], &[])
            .await
    }

    async fn entity_analytics(&self, identity: &str) -> Result<AnalyticsRecord, ProviderError> {
        self.get_enveloped(&["api", "backends", identity, "analytics"], &[])
            .await
    }

    async fn history(
        &self,
        identity: &str,
        limit: usize,
    ) -> Result<Vec<HistorySample>, ProviderError> {
        let query = [
            ("backend_name", identity.to_owned()),
            ("limit", limit.to_string()),
        ];
        let rows: Vec<Value> = self.get_enveloped(&["api", "history"], &query).await?;
        Ok(decode_history(rows))
    }

    async fn wait_estimate(&self, identity: &str) -> Result<WaitEstimate, ProviderError> {
        let query = [("backend_name", identity.to_owned())];
        let body = self.get_json(&["api", "predict_wait"], &query).await?;
        parse_wait_estimate(body)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidUrl {
        url: raw.to_owned(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid(String::from("URL cannot carry a path")));
    }
    Ok(url)
}

/// Append percent-encoded path segments to `base`.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ProviderError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ProviderError::Transport(format!("{base} cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Decode history rows, skipping any that lack a usable timestamp.
fn decode_history(rows: Vec<Value>) -> Vec<HistorySample> {
    let total = rows.len();
    let samples: Vec<HistorySample> = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect();
    if samples.len() < total {
        warn!(
            dropped = total.saturating_sub(samples.len()),
            "Dropped undecodable history rows"
        );
    }
    samples
}

/// Accept both `{ok, data: {...}}` and `{ok, estimate_seconds, ...}`.
fn parse_wait_estimate(body: Value) -> Result<WaitEstimate, ProviderError> {
    let ok = body.get("ok").and_then(Value::as_bool).unwrap_or(false);
    if !ok {
        let reason = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("wait estimate unavailable");
        return Err(ProviderError::Rejected(reason.to_owned()));
    }

    let payload = match body.get("data") {
        Some(data) if data.is_object() => data.clone(),
        _ => body,
    };
    serde_json::from_value(payload)
        .map_err(|e| ProviderError::Malformed(format!("unexpected wait estimate: {e}")))
}
