//! Terminal invoice editor built on `ledger-table`.

pub mod app;
pub mod error;
pub mod invoice;
pub mod paths;
pub mod render;
pub mod settings;
pub mod terminal;

pub use error::AppError;
pub use invoice::{InvoiceEditor, LineStore, ServiceLine, Totals};
