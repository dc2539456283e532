//! # Yatube Core
//!
//! The domain layer of the Yatube blogging platform.
//! Entities, pagination, form validation and the ports implemented by
//! `yatube-infra`. Nothing in here talks to a database or the network.

pub mod domain;
pub mod error;
pub mod forms;
pub mod pagination;
pub mod ports;

pub use error::{DomainError, RepoError};
pub use pagination::{Page, PageRequest};
