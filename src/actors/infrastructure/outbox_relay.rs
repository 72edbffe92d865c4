use actix::prelude::*;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

use crate::metrics::Metrics;
use crate::notify::{plan_fanout, Mailer};
use crate::store::{NotificationStore, OutboxMessage, OutboxStore, SessionStore};

// ============================================================================
// Outbox Relay Actor - Drains the outbox into notifications + email
// ============================================================================
//
// Polling relay over the outbox_messages table:
// 1. Fetch undispatched messages, oldest first
// 2. Fan each one out to notification rows and a transactional email
// 3. Mark dispatched on success, bump attempts on failure
// 4. Park messages in dead_letters once the attempt ceiling is hit
//
// Delivery is at-least-once: a crash between the notification write and the
// dispatched mark replays the message on the next pass.
//
// ============================================================================

pub struct OutboxRelayActor {
    outbox: OutboxStore,
    notifications: NotificationStore,
    sessions: SessionStore,
    mailer: Arc<dyn Mailer>,
    metrics: Arc<Metrics>,
    poll_interval: Duration,
    batch_size: i64,
    max_attempts: i32,
}

impl OutboxRelayActor {
    pub fn new(
        outbox: OutboxStore,
        notifications: NotificationStore,
        sessions: SessionStore,
        mailer: Arc<dyn Mailer>,
        metrics: Arc<Metrics>,
        poll_interval: Duration,
        batch_size: i64,
        max_attempts: i32,
    ) -> Self {
        Self {
            outbox,
            notifications,
            sessions,
            mailer,
            metrics,
            poll_interval,
            batch_size,
            max_attempts,
        }
    }

    /// Fan one message out. Any error here counts as a failed attempt.
    async fn dispatch(
        notifications: &NotificationStore,
        sessions: &SessionStore,
        mailer: &Arc<dyn Mailer>,
        message: &OutboxMessage,
    ) -> anyhow::Result<()> {
        let fanout = plan_fanout(&message.event_type, &message.payload)?;

        if let Some(draft) = &fanout.admin_broadcast {
            notifications.insert(draft).await?;
        }

        if let Some(draft) = &fanout.user {
            notifications.insert(draft).await?;
        }

        if let Some(email) = &fanout.email {
            match sessions.email_for_user(email.to_user_id).await? {
                Some(address) => {
                    mailer.send(&address, &email.subject, &email.body).await?;
                }
                None => {
                    tracing::warn!(
                        user_id = %email.to_user_id,
                        message_id = %message.id,
                        "No email address on file, skipping email"
                    );
                }
            }
        }

        Ok(())
    }

    async fn run_pass(&self) -> anyhow::Result<usize> {
        let messages = self.outbox.fetch_undispatched(self.batch_size).await?;
        if messages.is_empty() {
            return Ok(0);
        }

        tracing::debug!(message_count = messages.len(), "Fetched outbox messages");

        let mut dispatched = 0usize;

        for message in &messages {
            match Self::dispatch(&self.notifications, &self.sessions, &self.mailer, message).await
            {
                Ok(()) => {
                    self.outbox.mark_dispatched(message.id).await?;
                    self.metrics.record_dispatch(&message.event_type, true);
                    dispatched += 1;

                    tracing::info!(
                        message_id = %message.id,
                        event_type = %message.event_type,
                        "Outbox message dispatched"
                    );
                }
                Err(error) => {
                    self.metrics.record_dispatch(&message.event_type, false);
                    let attempts = self.outbox.record_attempt(message.id).await?;

                    if attempts >= self.max_attempts {
                        self.outbox.dead_letter(message, &error.to_string()).await?;
                        self.metrics.record_dead_letter();
                    } else {
                        tracing::warn!(
                            message_id = %message.id,
                            event_type = %message.event_type,
                            attempts = attempts,
                            error = %error,
                            "Outbox dispatch failed, will retry on next pass"
                        );
                    }
                }
            }
        }

        if let Ok(pending) = self.outbox.pending_count().await {
            self.metrics.outbox_pending.set(pending);
        }

        Ok(dispatched)
    }
}

impl Actor for OutboxRelayActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis(),
            batch_size = self.batch_size,
            "OutboxRelayActor started"
        );

        let relay = OutboxRelayActor {
            outbox: self.outbox.clone(),
            notifications: self.notifications.clone(),
            sessions: self.sessions.clone(),
            mailer: self.mailer.clone(),
            metrics: self.metrics.clone(),
            poll_interval: self.poll_interval,
            batch_size: self.batch_size,
            max_attempts: self.max_attempts,
        };

        tokio::spawn(async move {
            loop {
                match relay.run_pass().await {
                    Ok(0) => {}
                    Ok(count) => tracing::debug!(dispatched = count, "Outbox pass complete"),
                    Err(error) => {
                        tracing::error!(error = %error, "Outbox pass failed");
                    }
                }

                sleep(relay.poll_interval).await;
            }
        });
    }
}

/// Message to gracefully stop the relay
#[derive(Message)]
#[rtype(result = "()")]
pub struct StopRelay;

impl Handler<StopRelay> for OutboxRelayActor {
    type Result = ();

    fn handle(&mut self, _: StopRelay, ctx: &mut Self::Context) {
        tracing::info!("OutboxRelayActor received stop signal");
        ctx.stop();
    }
}
