pub mod entry;
pub mod event;
pub mod registration;
pub mod ticket;

pub use entry::TicketEntry;
pub use event::Event;
pub use registration::EventRegistration;
pub use ticket::{NewTicket, Ticket, TicketStatus};
