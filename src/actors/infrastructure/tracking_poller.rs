use actix::prelude::*;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};

use crate::domain::order::{Order, OrderActor, OrderStatus, StatusChange};
use crate::metrics::Metrics;
use crate::shipping::{CourierClient, CourierTrackingEvent};
use crate::store::OrderStore;

// ============================================================================
// Tracking Poller Actor - Courier reconciliation job
// ============================================================================
//
// Periodically walks SHIPPED orders that carry a tracking number, asks the
// courier for live tracking, appends any movement the log does not have yet,
// and applies the DELIVERED transition through the same validated path the
// HTTP handler uses. A courier outage just skips the pass; the circuit
// breaker inside the client keeps the polls cheap while the API is down.
//
// ============================================================================

pub struct TrackingPollerActor {
    orders: OrderStore,
    courier: Arc<CourierClient>,
    metrics: Arc<Metrics>,
    poll_interval: Duration,
    batch_size: i64,
}

impl TrackingPollerActor {
    pub fn new(
        orders: OrderStore,
        courier: Arc<CourierClient>,
        metrics: Arc<Metrics>,
        poll_interval: Duration,
        batch_size: i64,
    ) -> Self {
        Self {
            orders,
            courier,
            metrics,
            poll_interval,
            batch_size,
        }
    }

    async fn poll_order(&self, order: &Order) -> anyhow::Result<()> {
        let Some(tracking_number) = order.tracking_number.as_deref() else {
            return Ok(());
        };

        let started = Instant::now();
        let events = self.courier.track(tracking_number).await?;
        self.metrics
            .record_courier_call("track", started.elapsed().as_secs_f64());

        let mut delivered: Option<CourierTrackingEvent> = None;

        for event in &events {
            if event.status.eq_ignore_ascii_case("DELIVERED") {
                delivered = Some(event.clone());
                continue;
            }

            // Movement updates keep the order SHIPPED; only log rows change
            if !self
                .orders
                .has_tracking_message(order.id, &event.message)
                .await?
            {
                self.orders
                    .append_tracking(
                        order.id,
                        OrderStatus::Shipped,
                        &event.message,
                        location_of(event),
                    )
                    .await?;

                tracing::debug!(
                    order_id = %order.id,
                    message = %event.message,
                    "Appended courier tracking event"
                );
            }
        }

        if let Some(event) = delivered {
            let change = StatusChange {
                target: OrderStatus::Delivered,
                tracking_partner: None,
                tracking_number: None,
                note: Some(event.message.clone()),
                location: location_of(&event),
            };

            match change.plan(order, &OrderActor::System) {
                Ok(transition) => {
                    self.orders.apply_transition(&transition).await?;
                    self.metrics
                        .record_transition(transition.from.as_str(), transition.to.as_str());

                    tracing::info!(
                        order_id = %order.id,
                        "Courier reported delivery, order marked DELIVERED"
                    );
                }
                Err(error) => {
                    // Another caller may have moved the order since we read it
                    tracing::warn!(
                        order_id = %order.id,
                        error = %error,
                        "Skipping courier-driven delivery transition"
                    );
                }
            }
        }

        Ok(())
    }

    async fn run_pass(&self) -> anyhow::Result<usize> {
        let orders = self.orders.list_shipped_with_tracking(self.batch_size).await?;
        if orders.is_empty() {
            return Ok(0);
        }

        // Orders are independent, poll them concurrently
        let results = join_all(orders.iter().map(|order| async move {
            (order.id, self.poll_order(order).await)
        }))
        .await;

        let mut polled = 0usize;
        for (order_id, result) in results {
            match result {
                Ok(()) => polled += 1,
                Err(error) => {
                    tracing::warn!(
                        order_id = %order_id,
                        error = %error,
                        "Tracking poll failed for order"
                    );
                }
            }
        }

        Ok(polled)
    }
}

fn location_of(event: &CourierTrackingEvent) -> Option<crate::domain::order::GeoPoint> {
    match (event.latitude, event.longitude) {
        (Some(latitude), Some(longitude)) => Some(crate::domain::order::GeoPoint {
            latitude,
            longitude,
        }),
        _ => None,
    }
}

impl Actor for TrackingPollerActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            "TrackingPollerActor started"
        );

        let poller = TrackingPollerActor {
            orders: self.orders.clone(),
            courier: self.courier.clone(),
            metrics: self.metrics.clone(),
            poll_interval: self.poll_interval,
            batch_size: self.batch_size,
        };

        tokio::spawn(async move {
            loop {
                match poller.run_pass().await {
                    Ok(0) => {}
                    Ok(count) => tracing::debug!(orders_polled = count, "Tracking pass complete"),
                    Err(error) => {
                        tracing::error!(error = %error, "Tracking pass failed");
                    }
                }

                sleep(poller.poll_interval).await;
            }
        });
    }
}

/// Message to gracefully stop the poller
#[derive(Message)]
#[rtype(result = "()")]
pub struct StopPoller;

impl Handler<StopPoller> for TrackingPollerActor {
    type Result = ();

    fn handle(&mut self, _: StopPoller, ctx: &mut Self::Context) {
        tracing::info!("TrackingPollerActor received stop signal");
        ctx.stop();
    }
}
