use serde::Deserialize;

use crate::taxonomy::UserId;

pub use crate::db::respond::{Id, Respond};

#[derive(Deserialize)]
pub struct Create {
    pub user_id: UserId,
    pub price: f64,
    pub comment: Option<String>,
}

#[derive(Deserialize)]
pub struct Update {
    pub price: Option<f64>,
    pub comment: Option<String>,
}
