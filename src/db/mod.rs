pub mod query;
pub mod respond;
pub mod ticket;

use sqlx::postgres::PgPoolOptions;

use crate::config;

pub use sqlx::Error;

pub use self::{
    query::{Pagination, TicketsFilters},
    respond::Respond,
    ticket::Ticket,
};

pub async fn connect(config: config::Db) -> Result<Client, Error> {
    PgPoolOptions::new()
        .max_connections(config.pool.max_connections)
        .acquire_timeout(config.pool.acquire_timeout)
        .connect(&config.url)
        .await
        .map(Client)
}

/// Shared handle over the connection pool. Cloning is cheap and every
/// clone draws from the same pool.
#[derive(Clone)]
pub struct Client(sqlx::PgPool);

impl Client {
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.0).await
    }

    pub(crate) fn pool(&self) -> &sqlx::PgPool {
        &self.0
    }
}
