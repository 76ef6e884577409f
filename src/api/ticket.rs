use serde::{Deserialize, Serialize};

use crate::taxonomy::{CategoryId, TagId, UserId};

pub use crate::db::{
    query::{Pagination, TicketsFilters},
    ticket::{Attachment, AttachmentId, Id, Ticket},
};

#[derive(Deserialize)]
pub struct Create {
    pub user_id: UserId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Option<f64>,
    pub quantity: i32,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Deserialize)]
pub struct Update {
    pub category_id: Option<CategoryId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i32>,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Default, Deserialize)]
pub struct Search {
    pub filters: Option<TicketsFilters>,
    pub pagination: Option<Pagination>,
}

#[derive(Serialize)]
pub struct List {
    pub tickets: Vec<Ticket>,
    pub total_count: u64,
}
