//! Revue REST API client
//!
//! Typed access to the five calls the scenarios exercise. Responses are
//! returned as raw status + body so negative cases can assert on them
//! without the client second-guessing what counts as success.

mod client;
mod types;

pub use client::{ApiResponse, RevueClient};
pub(crate) use client::truncate_body;
pub use types::*;

/// Endpoint paths, relative to the configured base URL
pub mod endpoints {
    pub const AUTHENTICATE: &str = "/User/Authentication";
    pub const CREATE: &str = "/Revue/Create";
    pub const LIST: &str = "/Revue/All";
    pub const EDIT: &str = "/Revue/Edit";
    pub const DELETE: &str = "/Revue/Delete";

    /// Query parameter carrying the target id for edit and delete
    pub const REVUE_ID_PARAM: &str = "revueId";
}

/// Confirmation and error messages returned in the `msg` field
pub mod messages {
    pub const CREATED: &str = "Successfully created!";
    pub const EDITED: &str = "Edited successfully";
    pub const DELETED: &str = "The revue is deleted!";
    pub const NO_SUCH_REVUE: &str = "There is no such revue!";
}

/// Well-formed id that never names an existing revue
pub const NIL_REVUE_ID: &str = "00000000-0000-0000-0000-000000000000";
