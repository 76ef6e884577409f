use derive_more::Display;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use async_trait::async_trait;

use crate::{service::RespondStore, taxonomy::MasterId};

use super::{ticket, Client, Error};

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

/// An offer made by a master against a ticket.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Respond {
    pub id: Id,
    pub ticket_id: ticket::Id,
    pub master_id: MasterId,
    pub price: f64,
    pub comment: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug)]
pub struct CreateRespond {
    pub ticket_id: ticket::Id,
    pub master_id: MasterId,
    pub price: f64,
    pub comment: Option<String>,
}

/// Update of a respond. Price is written only when supplied; comment is
/// tri-state (outer `None` leaves the column untouched, `Some(None)`
/// clears it).
#[derive(Clone, Debug, Default)]
pub struct RespondPatch {
    pub id: Id,
    pub price: Option<f64>,
    pub comment: Option<Option<String>>,
}

const RESPOND_COLUMNS: &str = "\
    id, ticket_id, master_id, price, comment, created_at, updated_at";

fn respond_update(patch: &RespondPatch) -> QueryBuilder<'static, Postgres> {
    let mut query =
        QueryBuilder::new("UPDATE responds SET updated_at = now()");
    if let Some(price) = patch.price {
        query.push(", price = ").push_bind(price);
    }
    if let Some(comment) = &patch.comment {
        query.push(", comment = ").push_bind(comment.clone());
    }
    query.push(" WHERE id = ").push_bind(patch.id);
    query
}

#[async_trait]
impl RespondStore for Client {
    async fn respond_to_ticket(
        &self,
        data: &CreateRespond,
    ) -> Result<Id, Error> {
        const SQL: &str = "\
            INSERT INTO responds (ticket_id, master_id, price, comment) \
            VALUES ($1, $2, $3, $4) \
            RETURNING id";
        sqlx::query_scalar(SQL)
            .bind(data.ticket_id)
            .bind(data.master_id)
            .bind(data.price)
            .bind(&data.comment)
            .fetch_one(self.pool())
            .await
    }

    async fn get_respond_by_id(
        &self,
        id: Id,
    ) -> Result<Option<Respond>, Error> {
        let sql = format!(
            "SELECT {RESPOND_COLUMNS} FROM responds WHERE id = $1",
        );
        sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
    }

    async fn get_ticket_responds(
        &self,
        ticket_id: ticket::Id,
    ) -> Result<Vec<Respond>, Error> {
        let sql = format!(
            "SELECT {RESPOND_COLUMNS} FROM responds WHERE ticket_id = $1",
        );
        sqlx::query_as(&sql)
            .bind(ticket_id)
            .fetch_all(self.pool())
            .await
    }

    async fn get_master_responds(
        &self,
        master_id: MasterId,
    ) -> Result<Vec<Respond>, Error> {
        let sql = format!(
            "SELECT {RESPOND_COLUMNS} FROM responds WHERE master_id = $1",
        );
        sqlx::query_as(&sql)
            .bind(master_id)
            .fetch_all(self.pool())
            .await
    }

    async fn update_respond(&self, patch: &RespondPatch) -> Result<(), Error> {
        respond_update(patch)
            .build()
            .execute(self.pool())
            .await
            .map(drop)
    }

    async fn delete_respond(&self, id: Id) -> Result<(), Error> {
        sqlx::query("DELETE FROM responds WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map(drop)
    }
}
