//! Notification fan-out
//!
//! Every claim event notifies up to four parties: the claimant, the
//! internal claims desk, the referring agent, and that agent's organizer.
//! [`Notifier`] composes the emails and enqueues them on the outbox;
//! enqueue failures are logged and swallowed so notification trouble can
//! never fail the underlying claim operation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use domain_party::User;

use crate::claim::{Claim, ClaimStatus};
use crate::outbox::NotificationIntent;
use crate::ports::OutboxStore;

/// Which stakeholder an intent addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    Claimant,
    Admin,
    Agent,
    Organizer,
    /// Account holder, for notices not tied to any claim
    Account,
}

/// Claimant-facing copy for a status the claimant is told about.
///
/// `Submitted` returns `None`: the claimant already got the intake
/// confirmation, so the internal bookkeeping transition sends nothing.
fn claimant_copy(status: ClaimStatus, claim: &Claim) -> Option<(String, String)> {
    let code = claim.tracking_code.as_str();
    let (subject, body) = match status {
        ClaimStatus::Submitted => return None,
        ClaimStatus::Received => (
            format!("Your claim {code} is being reviewed"),
            "A claims specialist has been assigned to your case and is reviewing \
             the documentation you provided. We will contact you if anything \
             further is needed."
                .to_string(),
        ),
        ClaimStatus::Initiated => (
            format!("Your claim {code} has been formally initiated"),
            "We have formally opened your claim before the responsible insurer. \
             The insurer now has a statutory window to respond."
                .to_string(),
        ),
        ClaimStatus::Negotiating => (
            format!("Your claim {code} is under negotiation"),
            "We are negotiating the compensation amount with the insurer on your \
             behalf and will keep you informed of any offer."
                .to_string(),
        ),
        ClaimStatus::AwaitingPayout => (
            format!("Your claim {code}: agreement reached"),
            "An agreement has been reached and the settlement is closed. The \
             payout is typically credited within 30 business days. Our fee of 20% \
             is deducted from the settled amount as agreed."
                .to_string(),
        ),
        ClaimStatus::Paid => (
            format!("Your claim {code} has been paid"),
            "The settlement for your claim has been paid out. Thank you for \
             trusting us with your case."
                .to_string(),
        ),
        ClaimStatus::Rejected => (
            format!("Your claim {code} could not proceed"),
            "After legal review, your claim unfortunately cannot proceed. You can \
             reply to this email if you believe relevant information is missing."
                .to_string(),
        ),
    };
    Some((
        subject,
        wrap_html(&claim.claimant.name, &body),
    ))
}

fn wrap_html(name: &str, body: &str) -> String {
    format!(
        "<p>Hello {name},</p><p>{body}</p><p>Best regards,<br/>The Claims Team</p>"
    )
}

fn staff_status_body(claim: &Claim, old: ClaimStatus, new: ClaimStatus) -> String {
    format!(
        "<p>Claim <strong>{code}</strong> (claimant {name}, national id {nid}) \
         moved from <em>{old}</em> to <em>{new}</em>.</p>",
        code = claim.tracking_code.as_str(),
        name = claim.claimant.name,
        nid = claim.claimant.national_id,
    )
}

/// Builds and enqueues stakeholder notifications for claim events
pub struct Notifier {
    outbox: Arc<dyn OutboxStore>,
    admin_email: String,
}

impl Notifier {
    pub fn new(outbox: Arc<dyn OutboxStore>, admin_email: impl Into<String>) -> Self {
        Self {
            outbox,
            admin_email: admin_email.into(),
        }
    }

    /// Fan-out for a freshly filed claim: confirmation to the claimant,
    /// alert to the claims desk, and a heads-up to the referring agent and
    /// their organizer when present. Returns how many intents were queued.
    pub async fn claim_created(
        &self,
        claim: &Claim,
        agent: Option<&User>,
        organizer: Option<&User>,
    ) -> usize {
        let code = claim.tracking_code.as_str();
        let mut intents = vec![
            NotificationIntent::new(
                claim.id,
                Recipient::Claimant,
                claim.claimant.email.clone(),
                format!("We received your claim ({code})"),
                wrap_html(
                    &claim.claimant.name,
                    &format!(
                        "Your claim was received and will be reviewed shortly. Keep \
                         your tracking code <strong>{code}</strong>; together with \
                         your national id it lets you check progress at any time."
                    ),
                ),
            ),
            NotificationIntent::new(
                claim.id,
                Recipient::Admin,
                self.admin_email.clone(),
                format!("New claim filed: {code}"),
                format!(
                    "<p>A new claim <strong>{code}</strong> was filed by {name} \
                     (national id {nid}).</p>",
                    name = claim.claimant.name,
                    nid = claim.claimant.national_id,
                ),
            ),
        ];

        if let Some(agent) = agent {
            intents.push(NotificationIntent::new(
                claim.id,
                Recipient::Agent,
                agent.email.clone(),
                format!("A claim was filed through your link ({code})"),
                format!(
                    "<p>Hello {agent_name}, claim <strong>{code}</strong> was filed \
                     using your referral link by {name}.</p>",
                    agent_name = agent.name,
                    name = claim.claimant.name,
                ),
            ));
        }
        if let Some(organizer) = organizer {
            intents.push(NotificationIntent::new(
                claim.id,
                Recipient::Organizer,
                organizer.email.clone(),
                format!("New claim in your network ({code})"),
                format!(
                    "<p>Hello {org_name}, a claim <strong>{code}</strong> was filed \
                     through your network.</p>",
                    org_name = organizer.name,
                ),
            ));
        }

        self.enqueue_all(intents).await
    }

    /// Fan-out for a status change. The claimant only gets a copy for
    /// statuses with claimant-facing wording; staff always hear about it.
    pub async fn status_changed(
        &self,
        claim: &Claim,
        old: ClaimStatus,
        new: ClaimStatus,
        agent: Option<&User>,
        organizer: Option<&User>,
    ) -> usize {
        let code = claim.tracking_code.as_str();
        let staff_subject = format!("Claim {code} moved to {new}");
        let staff_body = staff_status_body(claim, old, new);

        let mut intents = Vec::with_capacity(4);
        if let Some((subject, body)) = claimant_copy(new, claim) {
            intents.push(NotificationIntent::new(
                claim.id,
                Recipient::Claimant,
                claim.claimant.email.clone(),
                subject,
                body,
            ));
        } else {
            debug!(claim = %claim.id, status = %new, "no claimant copy for status");
        }

        intents.push(NotificationIntent::new(
            claim.id,
            Recipient::Admin,
            self.admin_email.clone(),
            staff_subject.clone(),
            staff_body.clone(),
        ));
        if let Some(agent) = agent {
            intents.push(NotificationIntent::new(
                claim.id,
                Recipient::Agent,
                agent.email.clone(),
                staff_subject.clone(),
                staff_body.clone(),
            ));
        }
        if let Some(organizer) = organizer {
            intents.push(NotificationIntent::new(
                claim.id,
                Recipient::Organizer,
                organizer.email.clone(),
                staff_subject,
                staff_body,
            ));
        }

        self.enqueue_all(intents).await
    }

    /// Tells a freshly approved user they can log in
    pub async fn account_approved(&self, user: &User) -> usize {
        let intent = NotificationIntent::account(
            user.email.clone(),
            "Your account has been approved",
            wrap_html(
                &user.name,
                "Your account has been approved. You can now log in and start \
                 referring claims.",
            ),
        );
        self.enqueue_all(vec![intent]).await
    }

    async fn enqueue_all(&self, intents: Vec<NotificationIntent>) -> usize {
        let mut queued = 0;
        for intent in intents {
            match self.outbox.enqueue(&intent).await {
                Ok(()) => queued += 1,
                // The primary operation already succeeded; losing a
                // notification is preferable to failing it.
                Err(e) => warn!(
                    claim = ?intent.claim_id,
                    recipient = ?intent.recipient,
                    error = %e,
                    "failed to enqueue notification"
                ),
            }
        }
        queued
    }
}
