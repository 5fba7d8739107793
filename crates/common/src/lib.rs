//! Shared plumbing for the todo and promo services: logging setup,
//! runtime environment checks and a few wire types used by both.

pub mod types;
pub mod utils;
pub mod env;
