//! # Yatube Shared
//!
//! Serializable view documents returned by the server, shared with clients
//! (and with the server's own tests) so both sides agree on the page shapes.

pub mod response;
pub mod views;

pub use response::ErrorResponse;
pub use views::Rendered;
