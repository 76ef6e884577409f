use std::{net, time};

use serde::Deserialize;

#[derive(Deserialize)]
pub struct Config {
    pub db: Db,
    pub http: Http,
    pub taxonomy: Taxonomy,
    pub notifications: Notifications,
}

#[derive(Deserialize)]
pub struct Db {
    pub url: String,
    pub pool: Pool,
}

#[derive(Deserialize)]
pub struct Pool {
    pub max_connections: u32,
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: time::Duration,
}

#[derive(Deserialize)]
pub struct Http {
    pub server: Server,
    pub cors: Cors,
}

#[derive(Deserialize)]
pub struct Server {
    pub addr: net::SocketAddr,
}

#[derive(Deserialize)]
pub struct Cors {
    pub allowed_origins: Vec<String>,
}

#[derive(Deserialize)]
pub struct Taxonomy {
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub timeout: time::Duration,
}

#[derive(Deserialize)]
pub struct Notifications {
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub timeout: time::Duration,
    pub subjects: Subjects,
}

/// Broker subjects for ticket lifecycle events.
#[derive(Clone, Deserialize)]
pub struct Subjects {
    pub ticket_updated: String,
    pub ticket_deleted: String,
}
