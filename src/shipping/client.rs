use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::utils::{
    retry_on_transient, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState,
    RetryConfig,
};

use super::token::TokenProvider;

// ============================================================================
// Courier Client
// ============================================================================
//
// All courier traffic flows through the circuit breaker; a courier outage
// trips it open and callers fail fast instead of stacking up on a dead
// upstream. Transient failures inside a closed circuit get a bounded retry.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CourierError {
    #[error("Courier API unavailable (circuit open)")]
    Unavailable,

    #[error("Courier request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Courier token error: {0}")]
    Token(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourierShipment {
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierTrackingEvent {
    pub status: String,
    pub message: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Deserialize)]
struct TrackResponse {
    events: Vec<CourierTrackingEvent>,
}

pub struct CourierClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenProvider>,
    circuit_breaker: CircuitBreaker,
    retry: RetryConfig,
}

impl CourierClient {
    pub fn new(base_url: String, tokens: Arc<TokenProvider>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client construction cannot fail with static config");

        let cb_config = CircuitBreakerConfig {
            failure_threshold: 5,
            timeout: Duration::from_secs(30),
            success_threshold: 2,
        };

        Self {
            http,
            base_url,
            tokens,
            circuit_breaker: CircuitBreaker::new(cb_config),
            retry: RetryConfig::for_courier(),
        }
    }

    /// Register a shipment with the courier.
    pub async fn create_shipment(
        &self,
        order_id: uuid::Uuid,
        partner: &str,
        tracking_number: &str,
    ) -> Result<CourierShipment, CourierError> {
        let token = self
            .tokens
            .bearer_token()
            .await
            .map_err(|e| CourierError::Token(e.to_string()))?;

        let url = format!("{}/shipments", self.base_url);
        let body = serde_json::json!({
            "order_ref": order_id,
            "partner": partner,
            "tracking_number": tracking_number,
        });

        let result = self
            .circuit_breaker
            .call(async {
                retry_on_transient(self.retry.clone(), |_attempt| {
                    let request = self.http.post(&url).bearer_auth(&token).json(&body);
                    async move {
                        let response = request.send().await?.error_for_status()?;
                        response.json::<CourierShipment>().await
                    }
                })
                .await
                .into_result()
            })
            .await;

        match result {
            Ok(shipment) => {
                tracing::info!(
                    order_id = %order_id,
                    reference = %shipment.reference,
                    "Shipment registered with courier"
                );
                Ok(shipment)
            }
            Err(CircuitBreakerError::CircuitOpen) => {
                tracing::error!(order_id = %order_id, "Courier circuit open, shipment not registered");
                Err(CourierError::Unavailable)
            }
            Err(CircuitBreakerError::OperationFailed(e)) => {
                tracing::error!(order_id = %order_id, error = %e, "Courier shipment registration failed");
                Err(CourierError::Request(e))
            }
        }
    }

    /// Poll live tracking for a tracking number.
    pub async fn track(
        &self,
        tracking_number: &str,
    ) -> Result<Vec<CourierTrackingEvent>, CourierError> {
        let token = self
            .tokens
            .bearer_token()
            .await
            .map_err(|e| CourierError::Token(e.to_string()))?;

        let url = format!("{}/tracking/{}", self.base_url, tracking_number);

        let result = self
            .circuit_breaker
            .call(async {
                retry_on_transient(self.retry.clone(), |_attempt| {
                    let request = self.http.get(&url).bearer_auth(&token);
                    async move {
                        let response = request.send().await?.error_for_status()?;
                        response.json::<TrackResponse>().await
                    }
                })
                .await
                .into_result()
            })
            .await;

        match result {
            Ok(response) => Ok(response.events),
            Err(CircuitBreakerError::CircuitOpen) => Err(CourierError::Unavailable),
            Err(CircuitBreakerError::OperationFailed(e)) => {
                // A 401 means the shared token went stale under us
                if e.status().map(|s| s.as_u16()) == Some(401) {
                    self.tokens.invalidate().await;
                }
                Err(CourierError::Request(e))
            }
        }
    }

    pub async fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.get_state().await
    }

    /// Manual reset for operators, once the courier is known healthy again.
    pub async fn reset_circuit_breaker(&self) {
        self.circuit_breaker.reset().await;
    }
}
