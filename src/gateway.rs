//! # Inference Gateway Module
//!
//! Client for the external plant disease prediction service.
//!
//! Wire contract: `POST {base_url}/predict` with JSON
//! `{ "image": <base64>, "plant_type": <subject key> }`, answered by
//! `{ "prediction": <label>, "confidence": <0..1> }`. Any non-success status
//! or malformed body is a [`GatewayError`].

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::GatewayConfig;
use crate::errors::GatewayError;

/// Outcome of a prediction
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub label: String,
    /// Probability in [0, 1], when the service reports one
    pub confidence: Option<f32>,
}

impl PredictionResult {
    /// Confidence rendered as a percentage with two decimals, e.g. `87.00`
    pub fn confidence_percent(&self) -> Option<String> {
        self.confidence.map(|c| format!("{:.2}", c * 100.0))
    }
}

/// Image classification backend
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    async fn predict(&self, image: &[u8], subject_key: &str) -> Result<PredictionResult, GatewayError>;
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    image: String,
    plant_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    prediction: Option<String>,
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// HTTP implementation of [`InferenceGateway`]
#[derive(Debug, Clone)]
pub struct HttpInferenceGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpInferenceGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GatewayError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/predict", config.base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl InferenceGateway for HttpInferenceGateway {
    async fn predict(&self, image: &[u8], subject_key: &str) -> Result<PredictionResult, GatewayError> {
        let body = PredictRequest {
            image: base64::engine::general_purpose::STANDARD.encode(image),
            plant_type: subject_key,
        };

        debug!(
            endpoint = %self.endpoint,
            subject_key = %subject_key,
            image_bytes = image.len(),
            "Sending prediction request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(GatewayError::from)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            // The service reports failures as {"error": "..."}
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            error!(status = status.as_u16(), message = %message, "Gateway returned an error status");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let payload: PredictResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;

        let result = parse_prediction(payload)?;
        info!(
            subject_key = %subject_key,
            label = %result.label,
            confidence = ?result.confidence,
            "Prediction received"
        );
        Ok(result)
    }
}

fn parse_prediction(payload: PredictResponse) -> Result<PredictionResult, GatewayError> {
    let label = payload
        .prediction
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| GatewayError::Malformed("missing prediction label".to_string()))?;

    let confidence = match payload.confidence {
        Some(c) if c.is_finite() && (0.0..=1.0).contains(&c) => Some(c as f32),
        Some(c) => {
            return Err(GatewayError::Malformed(format!(
                "confidence {c} outside [0, 1]"
            )))
        }
        None => None,
    };

    Ok(PredictionResult { label, confidence })
}
