use crate::{
    db,
    db::respond::{CreateRespond, Respond, RespondPatch},
    taxonomy::{MasterId, UserId},
};

use super::{Error, Service};

/// An offer submitted by a user; the master identity is resolved here,
/// not by the caller.
#[derive(Clone, Debug)]
pub struct RespondToTicket {
    pub ticket_id: db::ticket::Id,
    pub user_id: UserId,
    pub price: f64,
    pub comment: Option<String>,
}

#[derive(Clone, Debug)]
pub struct UpdateRespond {
    pub id: db::respond::Id,
    pub price: Option<f64>,
    pub comment: Option<String>,
}

impl Service {
    pub async fn respond_to_ticket(
        &self,
        data: RespondToTicket,
    ) -> Result<db::respond::Id, Error> {
        let ticket = self.get_ticket_by_id(data.ticket_id).await?;
        if ticket.user_id == data.user_id {
            return Err(Error::RespondToOwnTicket);
        }

        let master =
            self.taxonomy.get_master_by_user_id(data.user_id).await?;

        let existing = self.responds.get_master_responds(master.id).await?;
        if existing
            .iter()
            .any(|respond| respond.ticket_id == data.ticket_id)
        {
            return Err(Error::RespondAlreadyExists);
        }

        let respond = CreateRespond {
            ticket_id: data.ticket_id,
            master_id: master.id,
            price: data.price,
            comment: data.comment,
        };
        Ok(self.responds.respond_to_ticket(&respond).await?)
    }

    pub async fn get_respond_by_id(
        &self,
        id: db::respond::Id,
    ) -> Result<Respond, Error> {
        self.responds
            .get_respond_by_id(id)
            .await?
            .ok_or(Error::RespondNotFound)
    }

    pub async fn get_ticket_responds(
        &self,
        ticket_id: db::ticket::Id,
    ) -> Result<Vec<Respond>, Error> {
        Ok(self.responds.get_ticket_responds(ticket_id).await?)
    }

    pub async fn get_master_responds(
        &self,
        master_id: MasterId,
    ) -> Result<Vec<Respond>, Error> {
        Ok(self.responds.get_master_responds(master_id).await?)
    }

    pub async fn get_user_responds(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Respond>, Error> {
        let master = self.taxonomy.get_master_by_user_id(user_id).await?;
        Ok(self.responds.get_master_responds(master.id).await?)
    }

    pub async fn update_respond(
        &self,
        data: UpdateRespond,
    ) -> Result<(), Error> {
        self.get_respond_by_id(data.id).await?;

        let patch = RespondPatch {
            id: data.id,
            price: data.price,
            // Comment has no "leave unchanged" form at this boundary: an
            // absent comment clears the stored one.
            comment: Some(data.comment),
        };
        Ok(self.responds.update_respond(&patch).await?)
    }

    pub async fn delete_respond(
        &self,
        id: db::respond::Id,
    ) -> Result<(), Error> {
        self.get_respond_by_id(id).await?;

        Ok(self.responds.delete_respond(id).await?)
    }
}
