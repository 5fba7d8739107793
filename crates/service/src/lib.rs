//! Service layer for the todo and promo-code APIs.
//! - Business rules live here; HTTP wiring stays in the `server` crate.
//! - All state goes through the `storage::KvStore` abstraction.
//! - Clock and randomness are injected so behaviour is reproducible in tests.

pub mod errors;
pub mod storage;
pub mod clock;
pub mod todo;
pub mod promo;
