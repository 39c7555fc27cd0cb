//! Service implementations for Bot API methods.

pub mod documents;

pub use documents::{DocumentsService, DocumentsServiceTrait};
