use super::PredictionClient;
use crate::domain::credential::Credential;
use crate::domain::error::{AppError, Result};
use crate::domain::prediction::{FeatureVector, PredictionResult, PredictionValue};
use crate::domain::prediction_config::PredictionConfig;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

#[derive(Serialize)]
struct FeaturePayload<'a> {
    features: &'a [f64],
}

pub struct HttpPredictionClient {
    client: reqwest::Client,
    predict_url: Url,
    batch_url: Url,
}

impl HttpPredictionClient {
    pub fn new(config: &PredictionConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            predict_url: endpoint(&config.api_base_url, &config.predict_path)?,
            batch_url: endpoint(&config.api_base_url, &config.batch_path)?,
        })
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        url: &Url,
        body: &T,
        credential: &Credential,
    ) -> Result<Value> {
        let started = Instant::now();
        let response = self
            .client
            .post(url.clone())
            .bearer_auth(credential.token())
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Unreachable(format!("Request failed: {}", e)))?;

        let status = response.status();
        debug!(
            url = %url,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Prediction service responded"
        );

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Unauthorized(error_message(&text, status)));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::ServerError {
                status: status.as_u16(),
                message: error_message(&text, status),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::InvalidResponse(format!("Failed to parse JSON: {}", e)))
    }
}

#[async_trait]
impl PredictionClient for HttpPredictionClient {
    async fn predict_one(
        &self,
        vector: &FeatureVector,
        credential: &Credential,
    ) -> Result<PredictionValue> {
        let body = FeaturePayload {
            features: vector.values(),
        };
        let json = self.post(&self.predict_url, &body, credential).await?;

        parse_prediction(&json)
            .map(PredictionValue)
            .map_err(AppError::InvalidResponse)
    }

    async fn predict_batch(
        &self,
        vectors: &[FeatureVector],
        credential: &Credential,
    ) -> Result<Vec<PredictionResult>> {
        if vectors.is_empty() {
            return Ok(Vec::new());
        }

        let body: Vec<FeaturePayload> = vectors
            .iter()
            .map(|v| FeaturePayload {
                features: v.values(),
            })
            .collect();
        let json = self.post(&self.batch_url, &body, credential).await?;

        let items = match &json {
            Value::Array(items) => items,
            Value::Object(map) => map
                .get("predictions")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    AppError::InvalidResponse(
                        "Invalid response format: missing predictions array".to_string(),
                    )
                })?,
            _ => {
                return Err(AppError::InvalidResponse(
                    "Invalid response format: expected an array".to_string(),
                ))
            }
        };

        if items.len() != vectors.len() {
            return Err(AppError::InvalidResponse(format!(
                "Expected {} predictions, got {}",
                vectors.len(),
                items.len()
            )));
        }

        let results = items
            .iter()
            .enumerate()
            .map(|(row, item)| batch_item(row, item))
            .collect::<Vec<_>>();

        let failed = results.iter().filter(|r| !r.is_value()).count();
        if failed > 0 {
            warn!(failed, total = results.len(), "Service reported per-row failures");
        }

        Ok(results)
    }
}

/// Join a relative endpoint path onto the base URL, keeping any base path
fn endpoint(base: &str, path: &str) -> Result<Url> {
    let base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    };
    Url::parse(&base)
        .and_then(|url| url.join(path.trim_start_matches('/')))
        .map_err(|e| AppError::ConfigError(format!("Invalid prediction endpoint: {}", e)))
}

/// Accepts a bare number, a one-element array, or an object with a
/// `prediction` key holding either.
fn parse_prediction(value: &Value) -> std::result::Result<f64, String> {
    let number = match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| "prediction is not representable as f64".to_string())?,
        Value::Array(items) if items.len() == 1 => return parse_prediction(&items[0]),
        Value::Object(map) => match map.get("prediction") {
            Some(inner) => return parse_prediction(inner),
            None => return Err("Invalid response format: missing prediction".to_string()),
        },
        other => return Err(format!("Invalid prediction value: {}", other)),
    };

    if number.is_finite() {
        Ok(number)
    } else {
        Err("prediction is not a finite number".to_string())
    }
}

fn batch_item(row: usize, item: &Value) -> PredictionResult {
    if let Some(err) = item.get("error").filter(|e| !e.is_null()) {
        let message = err
            .as_str()
            .map(|s| s.to_string())
            .unwrap_or_else(|| err.to_string());
        return PredictionResult::error(row, message);
    }

    match parse_prediction(item) {
        Ok(prediction) => PredictionResult::value(prediction),
        Err(message) => PredictionResult::error(row, message),
    }
}

/// Prefer the service's `message`/`detail` field over the raw body
fn error_message(body: &str, status: StatusCode) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let field = parsed.as_ref().and_then(|json| {
        ["message", "detail", "error"]
            .iter()
            .find_map(|key| json.get(*key).and_then(Value::as_str))
    });

    match field {
        Some(message) => message.to_string(),
        None if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        None => body.trim().to_string(),
    }
}
