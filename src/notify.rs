//! Best-effort event publication on ticket update/delete. Publish
//! failures are logged and discarded; the triggering operation has
//! already committed and still reports success.

use std::{error::Error as StdError, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    config,
    db::ticket::{self, Ticket},
    taxonomy::{MasterId, UserId},
};

pub type PublishError = Box<dyn StdError + Send + Sync>;

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(
        &self,
        subject: &str,
        payload: Vec<u8>,
    ) -> Result<(), PublishError>;
}

#[derive(Serialize)]
struct TicketUpdated {
    ticket_id: ticket::Id,
}

#[derive(Serialize)]
struct TicketDeleted {
    ticket_owner_id: UserId,
    name: String,
    description: String,
    price: Option<f64>,
    quantity: i32,
    responded_master_ids: Vec<MasterId>,
}

pub struct Notifier {
    publisher: Arc<dyn Publisher>,
    subjects: config::Subjects,
}

impl Notifier {
    pub fn new(
        publisher: Arc<dyn Publisher>,
        subjects: config::Subjects,
    ) -> Self {
        Self {
            publisher,
            subjects,
        }
    }

    pub async fn ticket_updated(&self, ticket: &Ticket) {
        let envelope = TicketUpdated {
            ticket_id: ticket.id,
        };
        self.send(&self.subjects.ticket_updated, &envelope).await;
    }

    pub async fn ticket_deleted(
        &self,
        ticket: &Ticket,
        responded_master_ids: Vec<MasterId>,
    ) {
        let envelope = TicketDeleted {
            ticket_owner_id: ticket.user_id,
            name: ticket.name.clone(),
            description: ticket.description.clone(),
            price: ticket.price,
            quantity: ticket.quantity,
            responded_master_ids,
        };
        self.send(&self.subjects.ticket_deleted, &envelope).await;
    }

    async fn send<T: Serialize>(&self, subject: &str, envelope: &T) {
        let payload = match serde_json::to_vec(envelope) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(
                    subject,
                    error = %e,
                    "failed to encode notification payload",
                );
                return;
            }
        };

        if let Err(e) = self.publisher.publish(subject, payload).await {
            tracing::error!(
                subject,
                error = %e,
                "failed to publish notification",
            );
        }
    }
}

/// Publisher posting payloads to an HTTP broker gateway, one route per
/// subject.
pub struct HttpPublisher {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPublisher {
    pub fn new(config: &config::Notifications) -> Result<Self, PublishError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn publish(
        &self,
        subject: &str,
        payload: Vec<u8>,
    ) -> Result<(), PublishError> {
        let url = format!("{}/{subject}", self.base_url);
        self.http
            .post(url)
            .header("content-type", "application/json")
            .body(payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
