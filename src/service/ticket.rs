use std::collections::HashSet;
use std::hash::Hash;

use itertools::Itertools as _;

use crate::{
    db,
    db::{
        query::{Pagination, TicketsFilters},
        ticket::{CreateTicket, Ticket, TicketPatch},
    },
    taxonomy::{CategoryId, TagId, UserId},
};

use super::{Error, Service};

/// Desired state of a ticket as submitted by its owner. Tag ids and
/// attachment links are full replacement sets; the diff against the
/// stored state is computed here, not by the caller.
#[derive(Clone, Debug)]
pub struct UpdateTicket {
    pub id: db::ticket::Id,
    pub category_id: Option<CategoryId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i32>,
    pub tag_ids: Vec<TagId>,
    pub attachments: Vec<String>,
}

impl Service {
    pub async fn create_ticket(
        &self,
        mut data: CreateTicket,
    ) -> Result<db::ticket::Id, Error> {
        data.tag_ids = data.tag_ids.into_iter().unique().collect();

        self.validate_category(data.category_id).await?;
        self.validate_tags(&data.tag_ids).await?;

        let existing =
            self.tickets.get_user_tickets(data.user_id, None, None).await?;
        let duplicate = existing.iter().any(|ticket| {
            ticket.name == data.name
                && ticket.category_id == data.category_id
                && ticket.description == data.description
        });
        if duplicate {
            return Err(Error::TicketAlreadyExists);
        }

        Ok(self.tickets.create_ticket(&data).await?)
    }

    pub async fn get_ticket_by_id(
        &self,
        id: db::ticket::Id,
    ) -> Result<Ticket, Error> {
        self.tickets
            .get_ticket_by_id(id)
            .await?
            .ok_or(Error::TicketNotFound)
    }

    pub async fn get_tickets(
        &self,
        pagination: Option<Pagination>,
        filters: Option<TicketsFilters>,
    ) -> Result<Vec<Ticket>, Error> {
        Ok(self
            .tickets
            .get_tickets(pagination.as_ref(), filters.as_ref())
            .await?)
    }

    pub async fn get_user_tickets(
        &self,
        user_id: UserId,
        pagination: Option<Pagination>,
        filters: Option<TicketsFilters>,
    ) -> Result<Vec<Ticket>, Error> {
        Ok(self
            .tickets
            .get_user_tickets(user_id, pagination.as_ref(), filters.as_ref())
            .await?)
    }

    pub async fn count_tickets(
        &self,
        filters: Option<TicketsFilters>,
    ) -> Result<u64, Error> {
        Ok(self.tickets.count_tickets(filters.as_ref()).await?)
    }

    pub async fn count_user_tickets(
        &self,
        user_id: UserId,
        filters: Option<TicketsFilters>,
    ) -> Result<u64, Error> {
        Ok(self
            .tickets
            .count_user_tickets(user_id, filters.as_ref())
            .await?)
    }

    pub async fn update_ticket(
        &self,
        mut data: UpdateTicket,
    ) -> Result<(), Error> {
        data.tag_ids = data.tag_ids.into_iter().unique().collect();

        let ticket = self.get_ticket_by_id(data.id).await?;

        if let Some(category_id) = data.category_id {
            self.validate_category(category_id).await?;
        }
        self.validate_tags(&data.tag_ids).await?;

        let (tag_ids_to_add, tag_ids_to_delete) =
            set_diff(&ticket.tag_ids, &data.tag_ids);

        let current_links = ticket
            .attachments
            .iter()
            .map(|attachment| attachment.link.clone())
            .collect::<Vec<_>>();
        let (attachments_to_add, links_to_delete) =
            set_diff(&current_links, &data.attachments);
        let stale_links = links_to_delete.into_iter().collect::<HashSet<_>>();
        let attachment_ids_to_delete = ticket
            .attachments
            .iter()
            .filter(|attachment| stale_links.contains(&attachment.link))
            .map(|attachment| attachment.id)
            .collect();

        let patch = TicketPatch {
            id: data.id,
            category_id: data.category_id,
            name: data.name,
            description: data.description,
            // Price has no "leave unchanged" form at this boundary: an
            // absent price clears the stored one.
            price: Some(data.price),
            quantity: data.quantity,
            tag_ids_to_add,
            tag_ids_to_delete,
            attachments_to_add,
            attachment_ids_to_delete,
        };
        self.tickets.update_ticket(&patch).await?;

        self.notifier.ticket_updated(&ticket).await;

        Ok(())
    }

    pub async fn delete_ticket(&self, id: db::ticket::Id) -> Result<(), Error> {
        let ticket = self.get_ticket_by_id(id).await?;
        let responds = self.responds.get_ticket_responds(id).await?;

        self.tickets.delete_ticket(id).await?;

        let responded_master_ids = responds
            .iter()
            .map(|respond| respond.master_id)
            .collect();
        self.notifier.ticket_deleted(&ticket, responded_master_ids).await;

        Ok(())
    }

    pub(super) async fn validate_category(
        &self,
        category_id: CategoryId,
    ) -> Result<(), Error> {
        let categories = self.taxonomy.get_all_categories().await?;
        if categories.iter().any(|category| category.id == category_id) {
            return Ok(());
        }

        Err(Error::CategoryNotFound(category_id))
    }

    pub(super) async fn validate_tags(
        &self,
        tag_ids: &[TagId],
    ) -> Result<(), Error> {
        let tags = self.taxonomy.get_all_tags().await?;
        let known = tags.iter().map(|tag| tag.id).collect::<HashSet<_>>();
        for &tag_id in tag_ids {
            if !known.contains(&tag_id) {
                return Err(Error::TagNotFound(tag_id));
            }
        }

        Ok(())
    }
}

/// Minimal add/delete sets turning `current` into `desired`. Members
/// present on both sides are left untouched, so re-running the diff with
/// the desired set on both sides yields two empty sets.
pub fn set_diff<T: Clone + Eq + Hash>(
    current: &[T],
    desired: &[T],
) -> (Vec<T>, Vec<T>) {
    let current_set = current.iter().collect::<HashSet<_>>();
    let desired_set = desired.iter().collect::<HashSet<_>>();

    let to_add = desired
        .iter()
        .filter(|item| !current_set.contains(item))
        .cloned()
        .collect();
    let to_delete = current
        .iter()
        .filter(|item| !desired_set.contains(item))
        .cloned()
        .collect();

    (to_add, to_delete)
}
