use derive_more::Display;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use async_trait::async_trait;

use crate::{
    db::query::{self, Pagination, TicketsFilters},
    service::TicketStore,
    taxonomy::{CategoryId, TagId, UserId},
};

use super::{Client, Error};

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    Hash,
    PartialEq,
    Serialize,
    sqlx::Type,
)]
#[sqlx(transparent)]
pub struct Id(i64);

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    Hash,
    PartialEq,
    Serialize,
    sqlx::Type,
)]
#[sqlx(transparent)]
pub struct AttachmentId(i64);

impl From<i64> for AttachmentId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A posted work request together with its child collections. Children
/// are loaded in a second pass, never via a one-to-many join.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Ticket {
    pub id: Id,
    pub user_id: UserId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Option<f64>,
    pub quantity: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[sqlx(skip)]
    pub tag_ids: Vec<TagId>,
    #[sqlx(skip)]
    pub attachments: Vec<Attachment>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Attachment {
    pub id: AttachmentId,
    pub ticket_id: Id,
    pub link: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug)]
pub struct CreateTicket {
    pub user_id: UserId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Option<f64>,
    pub quantity: i32,
    pub tag_ids: Vec<TagId>,
    pub attachments: Vec<String>,
}

/// Delta-only update of a ticket. Scalar fields are written when
/// supplied; `price` is tri-state (outer `None` leaves the column
/// untouched, `Some(None)` clears it). Child collections are synced by
/// the precomputed add/delete sets.
#[derive(Clone, Debug, Default)]
pub struct TicketPatch {
    pub id: Id,
    pub category_id: Option<CategoryId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Option<f64>>,
    pub quantity: Option<i32>,
    pub tag_ids_to_add: Vec<TagId>,
    pub tag_ids_to_delete: Vec<TagId>,
    pub attachments_to_add: Vec<String>,
    pub attachment_ids_to_delete: Vec<AttachmentId>,
}

impl Client {
    async fn load_ticket_children(
        &self,
        ticket: &mut Ticket,
    ) -> Result<(), Error> {
        const TAGS_SQL: &str = "\
            SELECT tta.tag_id \
            FROM tickets_tags_associations AS tta \
            WHERE tta.ticket_id = $1";
        ticket.tag_ids = sqlx::query_scalar(TAGS_SQL)
            .bind(ticket.id)
            .fetch_all(self.pool())
            .await?;

        const ATTACHMENTS_SQL: &str = "\
            SELECT id, ticket_id, link, created_at, updated_at \
            FROM tickets_attachments \
            WHERE ticket_id = $1 \
            ORDER BY id";
        ticket.attachments = sqlx::query_as(ATTACHMENTS_SQL)
            .bind(ticket.id)
            .fetch_all(self.pool())
            .await?;

        Ok(())
    }

    async fn fetch_tickets(
        &self,
        user_id: Option<UserId>,
        pagination: Option<&Pagination>,
        filters: Option<&TicketsFilters>,
    ) -> Result<Vec<Ticket>, Error> {
        let mut tickets = query::ticket_rows(user_id, filters, pagination)
            .build_query_as::<Ticket>()
            .fetch_all(self.pool())
            .await?;

        for ticket in &mut tickets {
            self.load_ticket_children(ticket).await?;
        }

        Ok(tickets)
    }

    async fn fetch_ticket_count(
        &self,
        user_id: Option<UserId>,
        filters: Option<&TicketsFilters>,
    ) -> Result<u64, Error> {
        let count: i64 = query::ticket_count(user_id, filters)
            .build_query_scalar()
            .fetch_one(self.pool())
            .await?;
        Ok(count as u64)
    }
}

fn ticket_update(patch: &TicketPatch) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new("UPDATE tickets SET updated_at = now()");
    if let Some(category_id) = patch.category_id {
        query.push(", category_id = ").push_bind(category_id);
    }
    if let Some(name) = &patch.name {
        query.push(", name = ").push_bind(name.clone());
    }
    if let Some(description) = &patch.description {
        query.push(", description = ").push_bind(description.clone());
    }
    if let Some(quantity) = patch.quantity {
        query.push(", quantity = ").push_bind(quantity);
    }
    if let Some(price) = patch.price {
        query.push(", price = ").push_bind(price);
    }
    query.push(" WHERE id = ").push_bind(patch.id);
    query
}

#[async_trait]
impl TicketStore for Client {
    async fn create_ticket(&self, data: &CreateTicket) -> Result<Id, Error> {
        let mut tx = self.pool().begin().await?;

        const SQL: &str = "\
            INSERT INTO tickets (user_id, category_id, name, \
                                 description, price, quantity) \
            VALUES ($1, $2, $3, $4, $5, $6) \
            RETURNING id";
        let id: Id = sqlx::query_scalar(SQL)
            .bind(data.user_id)
            .bind(data.category_id)
            .bind(&data.name)
            .bind(&data.description)
            .bind(data.price)
            .bind(data.quantity)
            .fetch_one(&mut *tx)
            .await?;

        if !data.tag_ids.is_empty() {
            let mut insert = QueryBuilder::new(
                "INSERT INTO tickets_tags_associations (ticket_id, tag_id) ",
            );
            insert.push_values(&data.tag_ids, |mut row, tag_id| {
                row.push_bind(id).push_bind(*tag_id);
            });
            insert.build().execute(&mut *tx).await?;
        }

        if !data.attachments.is_empty() {
            let mut insert = QueryBuilder::new(
                "INSERT INTO tickets_attachments (ticket_id, link) ",
            );
            insert.push_values(&data.attachments, |mut row, link| {
                row.push_bind(id).push_bind(link.clone());
            });
            insert.build().execute(&mut *tx).await?;
        }

        // Any earlier error path dropped the transaction, rolling the
        // ticket row and its children back together.
        tx.commit().await?;

        Ok(id)
    }

    async fn get_ticket_by_id(&self, id: Id) -> Result<Option<Ticket>, Error> {
        const SQL: &str = "\
            SELECT id, user_id, category_id, name, description, \
                   price, quantity, created_at, updated_at \
            FROM tickets \
            WHERE id = $1";
        let ticket: Option<Ticket> = sqlx::query_as(SQL)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        match ticket {
            Some(mut ticket) => {
                self.load_ticket_children(&mut ticket).await?;
                Ok(Some(ticket))
            }
            None => Ok(None),
        }
    }

    async fn get_tickets(
        &self,
        pagination: Option<&Pagination>,
        filters: Option<&TicketsFilters>,
    ) -> Result<Vec<Ticket>, Error> {
        self.fetch_tickets(None, pagination, filters).await
    }

    async fn get_user_tickets(
        &self,
        user_id: UserId,
        pagination: Option<&Pagination>,
        filters: Option<&TicketsFilters>,
    ) -> Result<Vec<Ticket>, Error> {
        self.fetch_tickets(Some(user_id), pagination, filters).await
    }

    async fn count_tickets(
        &self,
        filters: Option<&TicketsFilters>,
    ) -> Result<u64, Error> {
        self.fetch_ticket_count(None, filters).await
    }

    async fn count_user_tickets(
        &self,
        user_id: UserId,
        filters: Option<&TicketsFilters>,
    ) -> Result<u64, Error> {
        self.fetch_ticket_count(Some(user_id), filters).await
    }

    async fn update_ticket(&self, patch: &TicketPatch) -> Result<(), Error> {
        let mut tx = self.pool().begin().await?;

        ticket_update(patch).build().execute(&mut *tx).await?;

        if !patch.tag_ids_to_add.is_empty() {
            let mut insert = QueryBuilder::new(
                "INSERT INTO tickets_tags_associations (ticket_id, tag_id) ",
            );
            insert.push_values(&patch.tag_ids_to_add, |mut row, tag_id| {
                row.push_bind(patch.id).push_bind(*tag_id);
            });
            insert.build().execute(&mut *tx).await?;
        }

        if !patch.tag_ids_to_delete.is_empty() {
            const SQL: &str = "\
                DELETE FROM tickets_tags_associations \
                WHERE ticket_id = $1 AND tag_id = ANY($2)";
            sqlx::query(SQL)
                .bind(patch.id)
                .bind(patch.tag_ids_to_delete.clone())
                .execute(&mut *tx)
                .await?;
        }

        if !patch.attachments_to_add.is_empty() {
            let mut insert = QueryBuilder::new(
                "INSERT INTO tickets_attachments (ticket_id, link) ",
            );
            insert.push_values(&patch.attachments_to_add, |mut row, link| {
                row.push_bind(patch.id).push_bind(link.clone());
            });
            insert.build().execute(&mut *tx).await?;
        }

        if !patch.attachment_ids_to_delete.is_empty() {
            const SQL: &str = "\
                DELETE FROM tickets_attachments \
                WHERE ticket_id = $1 AND id = ANY($2)";
            sqlx::query(SQL)
                .bind(patch.id)
                .bind(patch.attachment_ids_to_delete.clone())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn delete_ticket(&self, id: Id) -> Result<(), Error> {
        // Associations, attachments and responds go with the ticket via
        // the schema's ON DELETE CASCADE.
        sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}
