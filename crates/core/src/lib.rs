pub mod messages;
pub mod models;
pub mod parsing;
pub mod validation;

pub use messages::Alert;
pub use models::{FormData, InvoiceNumber, InvoiceNumberError};
