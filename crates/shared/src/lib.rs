//! Shared types for the Teamspace API: wire models, the response envelope,
//! the error taxonomy and real-time frames.

pub mod envelope;
pub mod error;
pub mod models;
pub mod protocol;

pub use envelope::*;
pub use error::*;
pub use models::*;
pub use protocol::*;
