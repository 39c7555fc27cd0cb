//! Documents service for the Bot API.
//!
//! Uploads a staged file as a document with `sendDocument`.

mod requests;
mod responses;
mod service;

pub use requests::*;
pub use responses::*;
pub use service::*;
