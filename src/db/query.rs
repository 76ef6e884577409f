//! Predicate composition for ticket queries. The same filter fragments
//! feed both the row-selecting and the row-counting statements, so a
//! listing can never disagree with its count.

use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};

use crate::taxonomy::{CategoryId, TagId, UserId};

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TicketsFilters {
    /// Case-insensitive substring match against name or description.
    pub search: Option<String>,
    pub price_floor: Option<f64>,
    pub price_ceiling: Option<f64>,
    pub quantity_floor: Option<i32>,
    pub category_ids: Option<Vec<CategoryId>>,
    /// A ticket must carry every listed tag, not merely one of them.
    pub tag_ids: Option<Vec<TagId>>,
    pub created_at_ascending: Option<bool>,
}

const TICKET_COLUMNS: &str = "\
    id, user_id, category_id, name, description, \
    price, quantity, created_at, updated_at";

pub(crate) fn ticket_rows(
    user_id: Option<UserId>,
    filters: Option<&TicketsFilters>,
    pagination: Option<&Pagination>,
) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!(
        "SELECT {TICKET_COLUMNS} FROM tickets AS t WHERE TRUE",
    ));
    push_user_scope(&mut query, user_id);
    push_filters(&mut query, filters);
    push_ordering(&mut query, filters);
    push_pagination(&mut query, pagination);
    query
}

pub(crate) fn ticket_count(
    user_id: Option<UserId>,
    filters: Option<&TicketsFilters>,
) -> QueryBuilder<'static, Postgres> {
    let mut query =
        QueryBuilder::new("SELECT COUNT(*) FROM tickets AS t WHERE TRUE");
    push_user_scope(&mut query, user_id);
    push_filters(&mut query, filters);
    query
}

fn push_user_scope(
    query: &mut QueryBuilder<'static, Postgres>,
    user_id: Option<UserId>,
) {
    if let Some(user_id) = user_id {
        query.push(" AND t.user_id = ").push_bind(user_id);
    }
}

fn push_filters(
    query: &mut QueryBuilder<'static, Postgres>,
    filters: Option<&TicketsFilters>,
) {
    let Some(filters) = filters else {
        return;
    };

    if let Some(search) = &filters.search {
        let pattern = format!("%{search}%");
        query
            .push(" AND (t.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR t.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(floor) = filters.price_floor {
        query.push(" AND t.price >= ").push_bind(floor);
    }
    if let Some(ceiling) = filters.price_ceiling {
        query.push(" AND t.price <= ").push_bind(ceiling);
    }
    if let Some(floor) = filters.quantity_floor {
        query.push(" AND t.quantity >= ").push_bind(floor);
    }
    if let Some(category_ids) = &filters.category_ids {
        query
            .push(" AND t.category_id = ANY(")
            .push_bind(category_ids.clone())
            .push(")");
    }
    if let Some(tag_ids) = &filters.tag_ids {
        // One existential subquery per tag: the ticket must carry ALL
        // requested tags.
        for &tag_id in tag_ids {
            query
                .push(
                    " AND EXISTS (\
                        SELECT 1 FROM tickets_tags_associations AS tta \
                        WHERE tta.ticket_id = t.id AND tta.tag_id = ",
                )
                .push_bind(tag_id)
                .push(")");
        }
    }
}

fn push_ordering(
    query: &mut QueryBuilder<'static, Postgres>,
    filters: Option<&TicketsFilters>,
) {
    let ascending = filters
        .and_then(|filters| filters.created_at_ascending)
        .unwrap_or(false);
    query.push(if ascending {
        " ORDER BY t.created_at ASC"
    } else {
        " ORDER BY t.created_at DESC"
    });
}

fn push_pagination(
    query: &mut QueryBuilder<'static, Postgres>,
    pagination: Option<&Pagination>,
) {
    let Some(pagination) = pagination else {
        return;
    };

    if let Some(limit) = pagination.limit {
        query.push(" LIMIT ").push_bind(limit as i64);
    }
    if let Some(offset) = pagination.offset {
        query.push(" OFFSET ").push_bind(offset as i64);
    }
}
