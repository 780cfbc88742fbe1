//! Notification fan-out.
//!
//! Each new order is announced to up to three recipients:
//!
//! | role     | text                     | PDF |
//! |----------|--------------------------|-----|
//! | admin    | full receipt             | yes |
//! | driver   | receipt without customer | no  |
//! | customer | confirmation + receipt   | yes |
//!
//! Recipients are attempted concurrently and independently. A failure is
//! recorded in that recipient's [`DeliveryReport`] and never propagates:
//! the order is already persisted when dispatch starts. Nothing is retried.

use std::fmt;
use std::sync::Arc;

use boutique_core::{ChatId, Order};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::services::messenger::{Document, Messenger, MessagingError};
use crate::services::receipt::{Audience, ReceiptFormatter};

/// Who a notification is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Shop administrator.
    Admin,
    /// Delivery driver.
    Driver,
    /// The customer who placed the order.
    Customer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Admin => "admin",
            Self::Driver => "driver",
            Self::Customer => "customer",
        };
        f.write_str(name)
    }
}

/// Why a recipient was not contacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No messaging credentials are configured.
    MessagingDisabled,
    /// The role has no destination.
    NoDestination,
}

/// Result of one notification attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// Every message for the role was accepted.
    Delivered,
    /// Nothing was sent.
    Skipped {
        /// Why.
        reason: SkipReason,
    },
    /// At least one message failed.
    Failed {
        /// First failure.
        error: String,
    },
}

/// Per-recipient delivery record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    /// Recipient role.
    pub role: Role,
    /// Destination, when one was resolved.
    pub destination: Option<ChatId>,
    /// What happened.
    #[serde(flatten)]
    pub outcome: DeliveryOutcome,
}

impl DeliveryReport {
    /// Whether the recipient got everything meant for them.
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self.outcome, DeliveryOutcome::Delivered)
    }

    fn log(&self, order: &Order) {
        let destination = self.destination.as_ref().map(ChatId::as_str);
        match &self.outcome {
            DeliveryOutcome::Delivered => {
                info!(order_id = %order.id, role = %self.role, ?destination, "Notification delivered");
            }
            DeliveryOutcome::Skipped { reason } => {
                debug!(order_id = %order.id, role = %self.role, ?reason, "Notification skipped");
            }
            DeliveryOutcome::Failed { error } => {
                warn!(order_id = %order.id, role = %self.role, ?destination, error = %error, "Notification failed");
            }
        }
    }
}

/// Outcome of announcing one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dispatch {
    /// One report per role, in admin, driver, customer order.
    pub reports: Vec<DeliveryReport>,
}

impl Dispatch {
    /// Report for a role.
    #[must_use]
    pub fn report(&self, role: Role) -> Option<&DeliveryReport> {
        self.reports.iter().find(|r| r.role == role)
    }

    /// Whether the customer received their receipt.
    #[must_use]
    pub fn receipt_sent(&self) -> bool {
        self.report(Role::Customer)
            .is_some_and(DeliveryReport::is_delivered)
    }
}

/// Sends order notifications to the configured recipients.
#[derive(Clone)]
pub struct NotificationDispatcher {
    messenger: Option<Arc<dyn Messenger>>,
    formatter: ReceiptFormatter,
    admin_chat: Option<ChatId>,
    driver_chat: Option<ChatId>,
}

impl fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("enabled", &self.messenger.is_some())
            .field("admin_chat", &self.admin_chat)
            .field("driver_chat", &self.driver_chat)
            .finish_non_exhaustive()
    }
}

impl NotificationDispatcher {
    /// Create a dispatcher.
    ///
    /// With `messenger = None` every attempt is skipped.
    #[must_use]
    pub fn new(
        messenger: Option<Arc<dyn Messenger>>,
        formatter: ReceiptFormatter,
        admin_chat: Option<ChatId>,
        driver_chat: Option<ChatId>,
    ) -> Self {
        Self {
            messenger,
            formatter,
            admin_chat,
            driver_chat,
        }
    }

    /// Announce an order to admin, driver and (when resolved) the customer.
    #[instrument(skip(self, order, customer), fields(order_id = %order.id))]
    pub async fn dispatch(&self, order: &Order, customer: Option<&ChatId>) -> Dispatch {
        let (admin, driver, customer) = tokio::join!(
            self.notify(Role::Admin, order, self.admin_chat.as_ref()),
            self.notify(Role::Driver, order, self.driver_chat.as_ref()),
            self.notify(Role::Customer, order, customer),
        );

        Dispatch {
            reports: vec![admin, driver, customer],
        }
    }

    /// Notify a single recipient.
    pub async fn notify(
        &self,
        role: Role,
        order: &Order,
        destination: Option<&ChatId>,
    ) -> DeliveryReport {
        let outcome = match (&self.messenger, destination) {
            (None, _) => DeliveryOutcome::Skipped {
                reason: SkipReason::MessagingDisabled,
            },
            (Some(_), None) => DeliveryOutcome::Skipped {
                reason: SkipReason::NoDestination,
            },
            (Some(messenger), Some(to)) => {
                match self.deliver(messenger.as_ref(), role, order, to).await {
                    Ok(()) => DeliveryOutcome::Delivered,
                    Err(error) => DeliveryOutcome::Failed { error },
                }
            }
        };

        let report = DeliveryReport {
            role,
            destination: destination.cloned(),
            outcome,
        };
        report.log(order);
        report
    }

    /// Send every message for `role`, attempting all of them even if one fails.
    async fn deliver(
        &self,
        messenger: &dyn Messenger,
        role: Role,
        order: &Order,
        to: &ChatId,
    ) -> Result<(), String> {
        let text = self.message(role, order);
        let text_result = messenger
            .send_text(to, &text)
            .await
            .map_err(|e| e.to_string());

        let document_result = match self.document(role, order) {
            None => Ok(()),
            Some(Ok(document)) => messenger
                .send_document(to, &document)
                .await
                .map_err(|e: MessagingError| e.to_string()),
            Some(Err(e)) => Err(e),
        };

        text_result.and(document_result)
    }

    /// HTML text for a role.
    #[must_use]
    pub fn message(&self, role: Role, order: &Order) -> String {
        match role {
            Role::Admin => format!(
                "<b>Nouvelle commande</b>\n\n{}",
                self.formatter.text(order, Audience::Named).html()
            ),
            Role::Driver => format!(
                "<b>Nouvelle livraison #{}</b>\n\n{}",
                order.id,
                self.formatter.text(order, Audience::Anonymous).html()
            ),
            Role::Customer => format!(
                "<b>Merci pour votre commande !</b>\nVotre commande #{} a bien été reçue.\n\n{}",
                order.id,
                self.formatter.text(order, Audience::Named).html()
            ),
        }
    }

    /// PDF attachment for a role, if it gets one.
    fn document(&self, role: Role, order: &Order) -> Option<Result<Document, String>> {
        let caption = match role {
            Role::Admin => format!("Reçu commande #{}", order.id),
            Role::Customer => format!("Votre reçu - commande #{}", order.id),
            Role::Driver => return None,
        };

        Some(
            self.formatter
                .pdf(order)
                .map(|bytes| Document::pdf(ReceiptFormatter::pdf_filename(order), bytes, caption))
                .map_err(|e| e.to_string()),
        )
    }
}
