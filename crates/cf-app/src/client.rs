//! Simulation service client.

use reqwest::blocking::Client;
use serde::Deserialize;

use cf_results::SimulationRun;

use crate::config::{ConfigError, ServiceConfig};
use crate::error::{AppError, AppResult};
use crate::request::PreparedRequest;

/// Submits one prepared request and returns the finished run.
///
/// Implementations are called from a worker thread.
pub trait SimulationClient: Send + Sync {
    fn simulate(&self, request: &PreparedRequest) -> AppResult<SimulationRun>;
}

pub struct HttpSimulationClient {
    simulate_url: String,
    client: Client,
}

impl HttpSimulationClient {
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| ConfigError::ClientBuild {
                message: err.to_string(),
            })?;

        Ok(Self {
            simulate_url: config.simulate_url(),
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SuccessEnvelope {
    data: SimulationRun,
}

#[derive(Debug, Deserialize)]
struct FailureEnvelope {
    #[serde(default)]
    detail: serde_json::Value,
}

impl SimulationClient for HttpSimulationClient {
    fn simulate(&self, request: &PreparedRequest) -> AppResult<SimulationRun> {
        let url = format!("{}?readings={}", self.simulate_url, request.readings);

        let response = self
            .client
            .post(url)
            .json(&request.body)
            .send()
            .map_err(|err| AppError::Http {
                message: err.to_string(),
            })?;

        let status = response.status();
        let body = response.text().map_err(|err| AppError::Http {
            message: err.to_string(),
        })?;

        if !status.is_success() {
            return Err(AppError::HttpStatus {
                code: status.as_u16(),
                detail: extract_detail(&body),
            });
        }

        decode_run(&body)
    }
}

/// Human-readable `detail` from a failure body, if the service sent one.
pub fn extract_detail(body: &str) -> Option<String> {
    let envelope: FailureEnvelope = serde_json::from_str(body).ok()?;
    match envelope.detail {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) if text.trim().is_empty() => None,
        serde_json::Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

/// Decode a success body `{ "data": SimulationRun }`.
pub fn decode_run(body: &str) -> AppResult<SimulationRun> {
    serde_json::from_str::<SuccessEnvelope>(body)
        .map(|envelope| envelope.data)
        .map_err(|err| AppError::DecodeResponse {
            message: err.to_string(),
        })
}
