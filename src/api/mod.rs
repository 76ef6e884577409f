pub mod respond;
pub mod ticket;

pub use self::{respond::Respond, ticket::Ticket};
