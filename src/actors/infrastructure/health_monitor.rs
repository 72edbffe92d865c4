use actix::prelude::*;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

use crate::actors::core::{ComponentHealth, HealthStatus};
use crate::metrics::Metrics;
use crate::shipping::CourierClient;
use crate::utils::CircuitState;

// ============================================================================
// Health Monitor Actor - Tracks system health
// ============================================================================
//
// Components report their status here; the monitor aggregates them and also
// watches the courier circuit breaker on its own clock, mirroring the state
// into the Prometheus gauge.
//
// ============================================================================

// ============================================================================
// Messages
// ============================================================================

#[derive(Message)]
#[rtype(result = "()")]
pub struct UpdateHealth {
    pub component: String,
    pub status: HealthStatus,
    pub details: Option<String>,
}

#[derive(Message)]
#[rtype(result = "SystemHealth")]
pub struct GetSystemHealth;

#[derive(Debug, Clone, MessageResponse)]
pub struct SystemHealth {
    pub overall_status: HealthStatus,
    pub components: HashMap<String, ComponentHealth>,
    pub check_time: chrono::DateTime<Utc>,
}

// ============================================================================
// Health Monitor Actor
// ============================================================================

pub struct HealthMonitorActor {
    components: HashMap<String, ComponentHealth>,
    courier: Arc<CourierClient>,
    metrics: Arc<Metrics>,
}

impl HealthMonitorActor {
    pub fn new(courier: Arc<CourierClient>, metrics: Arc<Metrics>) -> Self {
        Self {
            components: HashMap::new(),
            courier,
            metrics,
        }
    }

    fn compute_overall_status(&self) -> HealthStatus {
        let mut has_degraded = false;
        let mut unhealthy_components = Vec::new();

        for (name, health) in &self.components {
            match &health.status {
                HealthStatus::Unhealthy(msg) => {
                    unhealthy_components.push(format!("{}: {}", name, msg));
                }
                HealthStatus::Degraded(_) => {
                    has_degraded = true;
                }
                HealthStatus::Healthy => {}
            }
        }

        if !unhealthy_components.is_empty() {
            HealthStatus::Unhealthy(unhealthy_components.join(", "))
        } else if has_degraded {
            HealthStatus::Degraded("Some components degraded".to_string())
        } else {
            HealthStatus::Healthy
        }
    }
}

impl Actor for HealthMonitorActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!("HealthMonitorActor started");

        let addr = ctx.address();
        let courier = self.courier.clone();
        let metrics = self.metrics.clone();

        // Watch the courier circuit breaker periodically
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(10));
            loop {
                interval.tick().await;

                let state = courier.circuit_state().await;
                let (gauge, status) = match state {
                    CircuitState::Closed => (0, HealthStatus::Healthy),
                    CircuitState::Open => (
                        1,
                        HealthStatus::Unhealthy("Courier circuit breaker open".to_string()),
                    ),
                    CircuitState::HalfOpen => (
                        2,
                        HealthStatus::Degraded("Courier circuit breaker half-open".to_string()),
                    ),
                };

                metrics.update_courier_circuit_state(gauge);

                addr.do_send(UpdateHealth {
                    component: "courier_gateway".to_string(),
                    status,
                    details: None,
                });
            }
        });
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Handler<UpdateHealth> for HealthMonitorActor {
    type Result = ();

    fn handle(&mut self, msg: UpdateHealth, _: &mut Self::Context) {
        let health = ComponentHealth {
            name: msg.component.clone(),
            status: msg.status.clone(),
            last_check: Utc::now(),
            details: msg.details,
        };

        tracing::debug!(
            component = %msg.component,
            status = ?msg.status,
            "Updated component health"
        );

        self.components.insert(msg.component, health);
    }
}

impl Handler<GetSystemHealth> for HealthMonitorActor {
    type Result = SystemHealth;

    fn handle(&mut self, _: GetSystemHealth, _: &mut Self::Context) -> Self::Result {
        SystemHealth {
            overall_status: self.compute_overall_status(),
            components: self.components.clone(),
            check_time: Utc::now(),
        }
    }
}

/// Message to gracefully stop the monitor
#[derive(Message)]
#[rtype(result = "()")]
pub struct StopMonitor;

impl Handler<StopMonitor> for HealthMonitorActor {
    type Result = ();

    fn handle(&mut self, _: StopMonitor, ctx: &mut Self::Context) {
        tracing::info!("HealthMonitorActor received stop signal");
        ctx.stop();
    }
}
