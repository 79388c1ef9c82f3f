//! Federated Search
//!
//! One inexact query per searchable field, joined with a per-request
//! timeout. The join always completes; requests that fail or time out are
//! reported next to whatever hits the others delivered.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use futures::future::{join_all, select, Either};
use tracing::{info, warn};

use crate::api::schema::map_entities;
use crate::api::{ApiError, ApiResult, EntityStore, Query};
use crate::models::{EntityKind, SchemaEntity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldQuery {
    pub kind: EntityKind,
    pub field: &'static str,
}

const fn field(kind: EntityKind, field: &'static str) -> FieldQuery {
    FieldQuery { kind, field }
}

/// Every field the search looks at
pub const SEARCH_FIELDS: [FieldQuery; 10] = [
    field(EntityKind::SchemaNode, "name"),
    field(EntityKind::SchemaProperty, "name"),
    field(EntityKind::SchemaProperty, "readFunction"),
    field(EntityKind::SchemaProperty, "writeFunction"),
    field(EntityKind::SchemaMethod, "name"),
    field(EntityKind::SchemaMethod, "source"),
    field(EntityKind::SchemaView, "name"),
    field(EntityKind::SchemaRelationshipNode, "relationshipType"),
    field(EntityKind::SchemaRelationshipNode, "sourceJsonName"),
    field(EntityKind::SchemaRelationshipNode, "targetJsonName"),
];

pub type BoxedRequest<'a, T> = Pin<Box<dyn Future<Output = ApiResult<T>> + 'a>>;

#[derive(Debug)]
pub enum RequestOutcome<T> {
    Done(T),
    Failed(ApiError),
    TimedOut,
}

/// Race every request against its own timer and wait for all of them.
/// Results keep the order of `requests`.
pub async fn join_with_timeout<'a, T, F, Fut>(requests: Vec<BoxedRequest<'a, T>>, mut timer: F) -> Vec<RequestOutcome<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()> + Unpin,
{
    let raced = requests.into_iter().map(|request| {
        let deadline = timer();
        async move {
            match select(request, deadline).await {
                Either::Left((Ok(value), _)) => RequestOutcome::Done(value),
                Either::Left((Err(e), _)) => RequestOutcome::Failed(e),
                Either::Right(_) => RequestOutcome::TimedOut,
            }
        }
    });
    join_all(raced).await
}

#[derive(Debug, Default)]
pub struct SearchOutcome {
    pub term: String,
    /// Merged hits keyed by entity id
    pub hits: BTreeMap<String, SchemaEntity>,
    pub failed: Vec<FieldQuery>,
    pub timed_out: Vec<FieldQuery>,
}

impl SearchOutcome {
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty() || !self.timed_out.is_empty()
    }

    pub fn entities(&self) -> Vec<SchemaEntity> {
        self.hits.values().cloned().collect()
    }
}

pub async fn federated_search<S, F, Fut>(store: &S, term: &str, page_size: u32, timer: F) -> SearchOutcome
where
    S: EntityStore,
    F: FnMut() -> Fut,
    Fut: Future<Output = ()> + Unpin,
{
    let term = term.trim();
    if term.is_empty() {
        return SearchOutcome::default();
    }

    let queries: Vec<Query> = SEARCH_FIELDS
        .iter()
        .map(|f| Query::new(f.kind).filter(f.field, term).inexact().page_size(page_size))
        .collect();
    let requests: Vec<BoxedRequest<'_, Vec<serde_json::Value>>> = queries.iter().map(|q| store.query(q)).collect();

    let mut outcome = SearchOutcome { term: term.to_string(), ..SearchOutcome::default() };
    for (field, result) in SEARCH_FIELDS.iter().zip(join_with_timeout(requests, timer).await) {
        match result {
            RequestOutcome::Done(values) => {
                for entity in map_entities(field.kind, &values) {
                    outcome.hits.insert(entity.id().to_string(), entity);
                }
            }
            RequestOutcome::Failed(e) => {
                warn!(field = field.field, kind = ?field.kind, error = %e, "search request failed");
                outcome.failed.push(*field);
            }
            RequestOutcome::TimedOut => {
                warn!(field = field.field, kind = ?field.kind, "search request timed out");
                outcome.timed_out.push(*field);
            }
        }
    }

    info!(term, hits = outcome.hits.len(), partial = outcome.is_partial(), "search finished");
    outcome
}
