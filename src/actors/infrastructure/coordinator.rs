use actix::prelude::*;
use std::sync::Arc;
use tokio::time::Duration;

use crate::actors::core::HealthStatus;
use crate::metrics::Metrics;
use crate::notify::Mailer;
use crate::shipping::{CourierClient, TokenProvider};
use crate::store::{NotificationStore, OrderStore, OutboxStore, SessionStore};

use super::health_monitor::{GetSystemHealth, HealthMonitorActor, StopMonitor, UpdateHealth};
use super::outbox_relay::{OutboxRelayActor, StopRelay};
use super::tracking_poller::{StopPoller, TrackingPollerActor};

// ============================================================================
// Coordinator Actor - Orchestrates the background workers
// ============================================================================
//
// Responsibilities:
// - Starts and owns the child actors (outbox relay, tracking poller,
//   health monitor)
// - Runs the scheduled courier token refresh
// - Periodically logs aggregate system health
// - Coordinates graceful shutdown
//
// Actor Hierarchy:
//   CoordinatorActor
//   ├── OutboxRelayActor
//   ├── TrackingPollerActor
//   └── HealthMonitorActor
//
// ============================================================================

/// Intervals and ceilings for the background workers, from AppConfig.
#[derive(Clone)]
pub struct WorkerSettings {
    pub relay_poll_interval: Duration,
    pub relay_batch_size: i64,
    pub relay_max_attempts: i32,
    pub tracking_poll_interval: Duration,
    pub tracking_batch_size: i64,
    pub token_refresh_interval: Duration,
}

pub struct CoordinatorActor {
    orders: OrderStore,
    outbox: OutboxStore,
    notifications: NotificationStore,
    sessions: SessionStore,
    courier: Arc<CourierClient>,
    tokens: Arc<TokenProvider>,
    mailer: Arc<dyn Mailer>,
    metrics: Arc<Metrics>,
    settings: WorkerSettings,

    relay: Option<Addr<OutboxRelayActor>>,
    poller: Option<Addr<TrackingPollerActor>>,
    health_monitor: Option<Addr<HealthMonitorActor>>,
}

impl CoordinatorActor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orders: OrderStore,
        outbox: OutboxStore,
        notifications: NotificationStore,
        sessions: SessionStore,
        courier: Arc<CourierClient>,
        tokens: Arc<TokenProvider>,
        mailer: Arc<dyn Mailer>,
        metrics: Arc<Metrics>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            orders,
            outbox,
            notifications,
            sessions,
            courier,
            tokens,
            mailer,
            metrics,
            settings,
            relay: None,
            poller: None,
            health_monitor: None,
        }
    }

    fn start_child_actors(&mut self, _ctx: &mut Context<Self>) {
        tracing::info!("Starting background workers");

        let health_monitor =
            HealthMonitorActor::new(self.courier.clone(), self.metrics.clone()).start();
        self.health_monitor = Some(health_monitor.clone());

        let relay = OutboxRelayActor::new(
            self.outbox.clone(),
            self.notifications.clone(),
            self.sessions.clone(),
            self.mailer.clone(),
            self.metrics.clone(),
            self.settings.relay_poll_interval,
            self.settings.relay_batch_size,
            self.settings.relay_max_attempts,
        )
        .start();
        self.relay = Some(relay);

        health_monitor.do_send(UpdateHealth {
            component: "outbox_relay".to_string(),
            status: HealthStatus::Healthy,
            details: Some("Outbox relay started".to_string()),
        });

        let poller = TrackingPollerActor::new(
            self.orders.clone(),
            self.courier.clone(),
            self.metrics.clone(),
            self.settings.tracking_poll_interval,
            self.settings.tracking_batch_size,
        )
        .start();
        self.poller = Some(poller);

        health_monitor.do_send(UpdateHealth {
            component: "tracking_poller".to_string(),
            status: HealthStatus::Healthy,
            details: Some("Tracking poller started".to_string()),
        });

        tracing::info!("All background workers started");
    }
}

impl Actor for CoordinatorActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!("CoordinatorActor started");
        self.start_child_actors(ctx);

        // Scheduled courier token refresh, so request-path calls rarely pay
        // for a refresh themselves
        let tokens = self.tokens.clone();
        ctx.run_interval(self.settings.token_refresh_interval, move |_act, _ctx| {
            let tokens = tokens.clone();
            actix::spawn(async move {
                tokens.invalidate().await;
                if let Err(error) = tokens.bearer_token().await {
                    tracing::warn!(error = %error, "Scheduled courier token refresh failed");
                }
            });
        });

        // Periodic aggregate health report
        ctx.run_interval(std::time::Duration::from_secs(30), |act, _ctx| {
            if let Some(ref health_monitor) = act.health_monitor {
                let health_monitor = health_monitor.clone();
                actix::spawn(async move {
                    match health_monitor.send(GetSystemHealth).await {
                        Ok(health) => match health.overall_status {
                            HealthStatus::Healthy => {
                                tracing::debug!("System health check: Healthy");
                            }
                            HealthStatus::Degraded(ref msg) => {
                                tracing::warn!("System health check: Degraded - {}", msg);
                            }
                            HealthStatus::Unhealthy(ref msg) => {
                                tracing::error!("System health check: Unhealthy - {}", msg);
                            }
                        },
                        Err(e) => {
                            tracing::error!("Failed to get system health: {}", e);
                        }
                    }
                });
            }
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        tracing::info!("CoordinatorActor stopping - initiating graceful shutdown");
        Running::Stop
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        tracing::info!("CoordinatorActor stopped");
    }
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Message)]
#[rtype(result = "Result<(), String>")]
pub struct Shutdown;

impl Handler<Shutdown> for CoordinatorActor {
    type Result = Result<(), String>;

    fn handle(&mut self, _msg: Shutdown, ctx: &mut Self::Context) -> Self::Result {
        tracing::info!("Received shutdown signal");

        if let Some(ref relay) = self.relay {
            relay.do_send(StopRelay);
        }

        if let Some(ref poller) = self.poller {
            poller.do_send(StopPoller);
        }

        if let Some(ref health_monitor) = self.health_monitor {
            health_monitor.do_send(StopMonitor);
        }

        ctx.stop();

        Ok(())
    }
}
