//! REST API
//!
//! Everything the code area exchanges with the server goes through an
//! [`EntityStore`]. `RestClient` is the browser implementation; tests use
//! the in-memory `MemoryStore`.

mod error;
mod query;
mod rest;
pub mod schema;

#[cfg(test)]
pub mod memory;

pub use error::{ApiError, ApiResult};
pub use query::{FilterValue, Query};
pub use rest::RestClient;

use async_trait::async_trait;
use serde_json::Value;

use crate::models::EntityKind;

#[async_trait(?Send)]
pub trait EntityStore {
    /// `GET /{Type}?{filters}&{paging}`
    async fn query(&self, query: &Query) -> ApiResult<Vec<Value>>;

    /// `GET /{Type}/{id}`; `None` when the entity does not exist
    async fn get(&self, kind: EntityKind, id: &str) -> ApiResult<Option<Value>>;

    /// `POST /{Type}`, returns the new id
    async fn create(&self, kind: EntityKind, body: Value) -> ApiResult<String>;

    /// `PUT /{Type}/{id}` with the changed attributes only
    async fn update(&self, kind: EntityKind, id: &str, body: Value) -> ApiResult<()>;

    async fn delete(&self, kind: EntityKind, id: &str) -> ApiResult<()>;

    /// `GET /_schema/{Type}/{view}`: property descriptors of a runtime type
    async fn schema_info(&self, type_name: &str, view: &str) -> ApiResult<Vec<Value>>;

    /// `POST /maintenance/{command}`
    async fn maintenance(&self, command: &str, body: Value) -> ApiResult<Value>;
}
