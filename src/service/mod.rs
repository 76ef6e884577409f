//! Business-rule orchestration over the stores and the taxonomy
//! collaborator. Depends on the trait seams below only, so every piece
//! can be substituted with an in-memory fake in tests.

pub mod respond;
pub mod ticket;

use std::sync::Arc;

use async_trait::async_trait;
use derive_more::{Display, From};

use crate::{
    db,
    db::{
        query::{Pagination, TicketsFilters},
        respond::{CreateRespond, Respond, RespondPatch},
        ticket::{CreateTicket, Ticket, TicketPatch},
    },
    notify::Notifier,
    taxonomy::{self, Category, CategoryId, Master, MasterId, Tag, TagId, UserId},
};

#[derive(Debug, Display, From)]
pub enum Error {
    #[display("ticket not found")]
    TicketNotFound,

    #[display("ticket already exists")]
    TicketAlreadyExists,

    #[display("respond not found")]
    RespondNotFound,

    #[display("respond already exists")]
    RespondAlreadyExists,

    #[display("respond to own ticket is not allowed")]
    RespondToOwnTicket,

    #[display("category with id {_0} not found")]
    CategoryNotFound(CategoryId),

    #[display("tag with id {_0} not found")]
    TagNotFound(TagId),

    /// Collaborator failures propagate verbatim, including the
    /// NotFound-shaped master resolution error.
    #[display("taxonomy error: {_0}")]
    #[from]
    Taxonomy(taxonomy::Error),

    /// Undifferentiated storage failure; never carries a business
    /// meaning.
    #[display("storage error: {_0}")]
    #[from]
    Storage(db::Error),
}

impl std::error::Error for Error {}

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn create_ticket(
        &self,
        data: &CreateTicket,
    ) -> Result<db::ticket::Id, db::Error>;

    async fn get_ticket_by_id(
        &self,
        id: db::ticket::Id,
    ) -> Result<Option<Ticket>, db::Error>;

    async fn get_tickets(
        &self,
        pagination: Option<&Pagination>,
        filters: Option<&TicketsFilters>,
    ) -> Result<Vec<Ticket>, db::Error>;

    async fn get_user_tickets(
        &self,
        user_id: UserId,
        pagination: Option<&Pagination>,
        filters: Option<&TicketsFilters>,
    ) -> Result<Vec<Ticket>, db::Error>;

    async fn count_tickets(
        &self,
        filters: Option<&TicketsFilters>,
    ) -> Result<u64, db::Error>;

    async fn count_user_tickets(
        &self,
        user_id: UserId,
        filters: Option<&TicketsFilters>,
    ) -> Result<u64, db::Error>;

    async fn update_ticket(&self, patch: &TicketPatch)
        -> Result<(), db::Error>;

    async fn delete_ticket(&self, id: db::ticket::Id)
        -> Result<(), db::Error>;
}

#[async_trait]
pub trait RespondStore: Send + Sync {
    async fn respond_to_ticket(
        &self,
        data: &CreateRespond,
    ) -> Result<db::respond::Id, db::Error>;

    async fn get_respond_by_id(
        &self,
        id: db::respond::Id,
    ) -> Result<Option<Respond>, db::Error>;

    async fn get_ticket_responds(
        &self,
        ticket_id: db::ticket::Id,
    ) -> Result<Vec<Respond>, db::Error>;

    async fn get_master_responds(
        &self,
        master_id: MasterId,
    ) -> Result<Vec<Respond>, db::Error>;

    async fn update_respond(
        &self,
        patch: &RespondPatch,
    ) -> Result<(), db::Error>;

    async fn delete_respond(
        &self,
        id: db::respond::Id,
    ) -> Result<(), db::Error>;
}

#[async_trait]
pub trait TaxonomyClient: Send + Sync {
    async fn get_all_categories(
        &self,
    ) -> Result<Vec<Category>, taxonomy::Error>;

    async fn get_all_tags(&self) -> Result<Vec<Tag>, taxonomy::Error>;

    async fn get_master_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Master, taxonomy::Error>;
}

#[async_trait]
impl TaxonomyClient for taxonomy::HttpClient {
    async fn get_all_categories(
        &self,
    ) -> Result<Vec<Category>, taxonomy::Error> {
        self.get_all_categories().await
    }

    async fn get_all_tags(&self) -> Result<Vec<Tag>, taxonomy::Error> {
        self.get_all_tags().await
    }

    async fn get_master_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Master, taxonomy::Error> {
        self.get_master_by_user_id(user_id).await
    }
}

pub struct Service {
    tickets: Arc<dyn TicketStore>,
    responds: Arc<dyn RespondStore>,
    taxonomy: Arc<dyn TaxonomyClient>,
    notifier: Notifier,
}

impl Service {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        responds: Arc<dyn RespondStore>,
        taxonomy: Arc<dyn TaxonomyClient>,
        notifier: Notifier,
    ) -> Self {
        Self {
            tickets,
            responds,
            taxonomy,
            notifier,
        }
    }
}
