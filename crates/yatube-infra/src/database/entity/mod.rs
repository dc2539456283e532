//! SeaORM entities mirroring the migrated schema.

pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;
