//! Client for the taxonomy service supplying categories, tags and
//! user-to-master resolution. Tickets and responds reference these
//! entities by id but never own them.

use derive_more::{Display, From};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::config;

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
pub struct UserId(i64);

impl From<i64> for UserId {
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
pub struct MasterId(i64);

impl From<i64> for MasterId {
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
pub struct CategoryId(i32);

impl From<i32> for CategoryId {
    fn from(value: i32) -> Self {
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
pub struct TagId(i32);

impl From<i32> for TagId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Master {
    pub id: MasterId,
    pub user_id: UserId,
    pub info: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Display, From)]
pub enum Error {
    /// No master identity is registered for the given user.
    #[display("master for user with id {_0} not found")]
    MasterNotFound(UserId),

    #[display("taxonomy request failed: {_0}")]
    #[from]
    Http(reqwest::Error),
}

impl std::error::Error for Error {}

/// HTTP implementation of the taxonomy collaborator.
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(config: &config::Taxonomy) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn get_all_categories(&self) -> Result<Vec<Category>, Error> {
        let url = format!("{}/categories", self.base_url);
        Ok(self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    pub async fn get_all_tags(&self) -> Result<Vec<Tag>, Error> {
        let url = format!("{}/tags", self.base_url);
        Ok(self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    pub async fn get_master_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Master, Error> {
        let url = format!("{}/masters/by-user/{user_id}", self.base_url);
        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::MasterNotFound(user_id));
        }

        Ok(response.error_for_status()?.json().await?)
    }
}
