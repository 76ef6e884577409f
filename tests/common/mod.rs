#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;

use artisan_tickets::{
    config::Subjects,
    db,
    db::{
        query::{Pagination, TicketsFilters},
        respond::{CreateRespond, Respond, RespondPatch},
        ticket::{Attachment, CreateTicket, Ticket, TicketPatch},
    },
    notify::{Notifier, PublishError, Publisher},
    service::{RespondStore, Service, TaxonomyClient, TicketStore},
    taxonomy::{self, Category, Master, MasterId, Tag, UserId},
};

#[derive(Default)]
pub struct FakeTicketStore {
    pub tickets: Mutex<Vec<Ticket>>,
    pub created: Mutex<Vec<CreateTicket>>,
    pub patches: Mutex<Vec<TicketPatch>>,
    pub deleted: Mutex<Vec<db::ticket::Id>>,
}

#[async_trait]
impl TicketStore for FakeTicketStore {
    async fn create_ticket(
        &self,
        data: &CreateTicket,
    ) -> Result<db::ticket::Id, db::Error> {
        let mut created = self.created.lock().unwrap();
        created.push(data.clone());
        Ok((created.len() as i64).into())
    }

    async fn get_ticket_by_id(
        &self,
        id: db::ticket::Id,
    ) -> Result<Option<Ticket>, db::Error> {
        Ok(self
            .tickets
            .lock()
            .unwrap()
            .iter()
            .find(|ticket| ticket.id == id)
            .cloned())
    }

    async fn get_tickets(
        &self,
        _pagination: Option<&Pagination>,
        _filters: Option<&TicketsFilters>,
    ) -> Result<Vec<Ticket>, db::Error> {
        Ok(self.tickets.lock().unwrap().clone())
    }

    async fn get_user_tickets(
        &self,
        user_id: UserId,
        _pagination: Option<&Pagination>,
        _filters: Option<&TicketsFilters>,
    ) -> Result<Vec<Ticket>, db::Error> {
        Ok(self
            .tickets
            .lock()
            .unwrap()
            .iter()
            .filter(|ticket| ticket.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn count_tickets(
        &self,
        _filters: Option<&TicketsFilters>,
    ) -> Result<u64, db::Error> {
        Ok(self.tickets.lock().unwrap().len() as u64)
    }

    async fn count_user_tickets(
        &self,
        user_id: UserId,
        _filters: Option<&TicketsFilters>,
    ) -> Result<u64, db::Error> {
        Ok(self
            .tickets
            .lock()
            .unwrap()
            .iter()
            .filter(|ticket| ticket.user_id == user_id)
            .count() as u64)
    }

    async fn update_ticket(
        &self,
        patch: &TicketPatch,
    ) -> Result<(), db::Error> {
        self.patches.lock().unwrap().push(patch.clone());
        Ok(())
    }

    async fn delete_ticket(
        &self,
        id: db::ticket::Id,
    ) -> Result<(), db::Error> {
        self.tickets.lock().unwrap().retain(|ticket| ticket.id != id);
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeRespondStore {
    pub responds: Mutex<Vec<Respond>>,
    pub created: Mutex<Vec<CreateRespond>>,
    pub patches: Mutex<Vec<RespondPatch>>,
    pub deleted: Mutex<Vec<db::respond::Id>>,
}

#[async_trait]
impl RespondStore for FakeRespondStore {
    async fn respond_to_ticket(
        &self,
        data: &CreateRespond,
    ) -> Result<db::respond::Id, db::Error> {
        let mut created = self.created.lock().unwrap();
        created.push(data.clone());
        Ok((created.len() as i64).into())
    }

    async fn get_respond_by_id(
        &self,
        id: db::respond::Id,
    ) -> Result<Option<Respond>, db::Error> {
        Ok(self
            .responds
            .lock()
            .unwrap()
            .iter()
            .find(|respond| respond.id == id)
            .cloned())
    }

    async fn get_ticket_responds(
        &self,
        ticket_id: db::ticket::Id,
    ) -> Result<Vec<Respond>, db::Error> {
        Ok(self
            .responds
            .lock()
            .unwrap()
            .iter()
            .filter(|respond| respond.ticket_id == ticket_id)
            .cloned()
            .collect())
    }

    async fn get_master_responds(
        &self,
        master_id: MasterId,
    ) -> Result<Vec<Respond>, db::Error> {
        Ok(self
            .responds
            .lock()
            .unwrap()
            .iter()
            .filter(|respond| respond.master_id == master_id)
            .cloned()
            .collect())
    }

    async fn update_respond(
        &self,
        patch: &RespondPatch,
    ) -> Result<(), db::Error> {
        self.patches.lock().unwrap().push(patch.clone());
        Ok(())
    }

    async fn delete_respond(
        &self,
        id: db::respond::Id,
    ) -> Result<(), db::Error> {
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeTaxonomy {
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
    pub masters: Vec<Master>,
}

#[async_trait]
impl TaxonomyClient for FakeTaxonomy {
    async fn get_all_categories(
        &self,
    ) -> Result<Vec<Category>, taxonomy::Error> {
        Ok(self.categories.clone())
    }

    async fn get_all_tags(&self) -> Result<Vec<Tag>, taxonomy::Error> {
        Ok(self.tags.clone())
    }

    async fn get_master_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Master, taxonomy::Error> {
        self.masters
            .iter()
            .find(|master| master.user_id == user_id)
            .cloned()
            .ok_or(taxonomy::Error::MasterNotFound(user_id))
    }
}

#[derive(Default)]
pub struct FakePublisher {
    pub sent: Mutex<Vec<(String, Vec<u8>)>>,
    pub fail: bool,
}

impl FakePublisher {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            fail: true,
        }
    }
}

#[async_trait]
impl Publisher for FakePublisher {
    async fn publish(
        &self,
        subject: &str,
        payload: Vec<u8>,
    ) -> Result<(), PublishError> {
        if self.fail {
            return Err("broker unavailable".into());
        }

        self.sent.lock().unwrap().push((subject.to_string(), payload));
        Ok(())
    }
}

pub struct Harness {
    pub tickets: Arc<FakeTicketStore>,
    pub responds: Arc<FakeRespondStore>,
    pub publisher: Arc<FakePublisher>,
    pub service: Service,
}

impl Harness {
    pub fn new(taxonomy: FakeTaxonomy) -> Self {
        Self::with_publisher(taxonomy, FakePublisher::default())
    }

    pub fn with_publisher(
        taxonomy: FakeTaxonomy,
        publisher: FakePublisher,
    ) -> Self {
        let tickets = Arc::new(FakeTicketStore::default());
        let responds = Arc::new(FakeRespondStore::default());
        let publisher = Arc::new(publisher);
        let notifier = Notifier::new(publisher.clone(), subjects());
        let service = Service::new(
            tickets.clone(),
            responds.clone(),
            Arc::new(taxonomy),
            notifier,
        );

        Self {
            tickets,
            responds,
            publisher,
            service,
        }
    }
}

fn subjects() -> Subjects {
    Subjects {
        ticket_updated: "tickets.updated".into(),
        ticket_deleted: "tickets.deleted".into(),
    }
}

pub fn ticket(
    id: i64,
    user_id: i64,
    category_id: i32,
    name: &str,
    description: &str,
) -> Ticket {
    Ticket {
        id: id.into(),
        user_id: user_id.into(),
        category_id: category_id.into(),
        name: name.into(),
        description: description.into(),
        price: None,
        quantity: 1,
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
        tag_ids: Vec::new(),
        attachments: Vec::new(),
    }
}

pub fn attachment(id: i64, ticket_id: i64, link: &str) -> Attachment {
    Attachment {
        id: id.into(),
        ticket_id: ticket_id.into(),
        link: link.into(),
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

pub fn respond(id: i64, ticket_id: i64, master_id: i64) -> Respond {
    Respond {
        id: id.into(),
        ticket_id: ticket_id.into(),
        master_id: master_id.into(),
        price: 100.0,
        comment: None,
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

pub fn category(id: i32, name: &str) -> Category {
    Category {
        id: id.into(),
        name: name.into(),
    }
}

pub fn tag(id: i32, name: &str) -> Tag {
    Tag {
        id: id.into(),
        name: name.into(),
    }
}

pub fn master(id: i64, user_id: i64) -> Master {
    Master {
        id: id.into(),
        user_id: user_id.into(),
        info: String::new(),
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

pub fn create_ticket_data(
    user_id: i64,
    category_id: i32,
    name: &str,
    description: &str,
) -> CreateTicket {
    CreateTicket {
        user_id: user_id.into(),
        category_id: category_id.into(),
        name: name.into(),
        description: description.into(),
        price: None,
        quantity: 1,
        tag_ids: Vec::new(),
        attachments: Vec::new(),
    }
}
