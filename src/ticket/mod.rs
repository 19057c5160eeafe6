pub mod code;
pub mod issuance;
pub mod qr_image;

pub use code::{DecodeError, TicketKey};
pub use issuance::{IssuanceError, IssuanceService, IssuedTicket};
