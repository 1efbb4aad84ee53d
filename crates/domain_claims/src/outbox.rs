//! Notification outbox
//!
//! Emails are never sent inline with a state change. The lifecycle records
//! a [`NotificationIntent`] per recipient and a background
//! [`OutboxWorker`] delivers them, retrying transient failures with
//! exponential backoff. A provider outage therefore delays notifications
//! instead of failing claim operations.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use core_kernel::{ClaimId, IntentId};

use crate::notify::Recipient;
use crate::ports::{Mailer, OutboxStore};

/// Delivery state of a queued notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    /// Waiting for the worker, either fresh or between retry attempts
    Pending,
    Sent,
    /// Permanently failed; kept for inspection
    Dead,
}

/// One email owed to one recipient, usually for one claim event.
/// Account-level notices (approval) carry no claim reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationIntent {
    pub id: IntentId,
    #[serde(default)]
    pub claim_id: Option<ClaimId>,
    pub recipient: Recipient,
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub status: IntentStatus,
    pub attempts: u32,
    pub next_attempt_at: DateTime<Utc>,
    #[serde(default)]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NotificationIntent {
    pub fn new(
        claim_id: ClaimId,
        recipient: Recipient,
        to: impl Into<String>,
        subject: impl Into<String>,
        html_body: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: IntentId::new_v7(),
            claim_id: Some(claim_id),
            recipient,
            to: to.into(),
            subject: subject.into(),
            html_body: html_body.into(),
            status: IntentStatus::Pending,
            attempts: 0,
            next_attempt_at: now,
            last_error: None,
            created_at: now,
        }
    }

    /// An intent with no claim attached, for account-level notices
    pub fn account(
        to: impl Into<String>,
        subject: impl Into<String>,
        html_body: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: IntentId::new_v7(),
            claim_id: None,
            recipient: Recipient::Account,
            to: to.into(),
            subject: subject.into(),
            html_body: html_body.into(),
            status: IntentStatus::Pending,
            attempts: 0,
            next_attempt_at: now,
            last_error: None,
            created_at: now,
        }
    }
}

/// Exponential backoff schedule for failed deliveries
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(30),
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt, doubling per completed attempt.
    /// Attempt counts at or past the cap get the maximum delay.
    pub fn delay_after(&self, attempts: u32) -> Duration {
        let exp = attempts.min(self.max_attempts).saturating_sub(1);
        self.base_delay * 2u32.saturating_pow(exp)
    }

    pub fn exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }
}

/// Background dispatcher draining the outbox
pub struct OutboxWorker {
    outbox: Arc<dyn OutboxStore>,
    mailer: Arc<dyn Mailer>,
    policy: RetryPolicy,
    poll_interval: Duration,
    batch_size: usize,
}

impl OutboxWorker {
    pub fn new(outbox: Arc<dyn OutboxStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            outbox,
            mailer,
            policy: RetryPolicy::default(),
            poll_interval: Duration::from_secs(5),
            batch_size: 20,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Polls the outbox until the task is dropped
    pub async fn run(self) {
        info!(
            poll_secs = self.poll_interval.as_secs(),
            "notification outbox worker started"
        );
        loop {
            if let Err(e) = self.run_once().await {
                error!(error = %e, "outbox poll failed");
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Drains one batch of due intents; split out so tests can drive the
    /// worker without timers
    pub async fn run_once(&self) -> Result<usize, core_kernel::PortError> {
        let due = self.outbox.due(Utc::now(), self.batch_size).await?;
        let mut delivered = 0;
        for intent in due {
            if self.dispatch(intent).await {
                delivered += 1;
            }
        }
        Ok(delivered)
    }

    async fn dispatch(&self, intent: NotificationIntent) -> bool {
        let result = self
            .mailer
            .send(&intent.to, &intent.subject, &intent.html_body)
            .await;

        match result {
            Ok(()) => {
                debug!(intent = %intent.id, claim = ?intent.claim_id, "notification delivered");
                if let Err(e) = self.outbox.mark_sent(intent.id).await {
                    error!(intent = %intent.id, error = %e, "failed to mark intent sent");
                }
                true
            }
            Err(e) => {
                let attempts = intent.attempts + 1;
                // Permanent failures and exhausted retries both dead-letter.
                if !e.is_transient() || self.policy.exhausted(attempts) {
                    warn!(
                        intent = %intent.id,
                        claim = ?intent.claim_id,
                        attempts,
                        error = %e,
                        "notification dead-lettered"
                    );
                    if let Err(me) = self
                        .outbox
                        .mark_dead(intent.id, attempts, &e.to_string())
                        .await
                    {
                        error!(intent = %intent.id, error = %me, "failed to mark intent dead");
                    }
                } else {
                    let next = Utc::now()
                        + chrono::Duration::from_std(self.policy.delay_after(attempts))
                            .unwrap_or_else(|_| chrono::Duration::seconds(30));
                    debug!(
                        intent = %intent.id,
                        attempts,
                        next_attempt = %next,
                        "notification delivery failed, will retry"
                    );
                    if let Err(me) = self
                        .outbox
                        .mark_retry(intent.id, attempts, next, &e.to_string())
                        .await
                    {
                        error!(intent = %intent.id, error = %me, "failed to schedule retry");
                    }
                }
                false
            }
        }
    }
}
