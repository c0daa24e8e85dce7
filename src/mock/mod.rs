//! In-memory mock of the Revue API
//!
//! Serves the same five calls as the public API, with the same status codes
//! and messages, so suites can run offline and the integration tests have a
//! server to talk to.

mod server;
mod store;

pub use server::{MockHandle, MockServer, SharedStore, API_PREFIX};
pub use store::{Reply, RevueStore, StoredRevue};
