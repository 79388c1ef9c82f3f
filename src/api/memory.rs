//! In-memory [`EntityStore`] used by the tests
//!
//! Mimics the server closely enough for tree loading, search and the
//! schema scenarios: equality and inexact filters, embedded owner objects
//! in responses, cascading type deletes and unique type names.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::{ApiError, ApiResult, EntityStore, FilterValue, Query};
use crate::models::EntityKind;

pub struct MemoryStore {
    entities: RefCell<BTreeMap<EntityKind, BTreeMap<String, Value>>>,
    next_id: Cell<u64>,
    schema_views: RefCell<BTreeSet<String>>,
    schema_info: RefCell<HashMap<String, Vec<Value>>>,
    failing_fields: RefCell<BTreeSet<String>>,
    stalled_fields: RefCell<BTreeSet<String>>,
    requests: RefCell<Vec<String>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entities: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(1),
            schema_views: RefCell::new(["all", "ui"].iter().map(|v| v.to_string()).collect()),
            schema_info: RefCell::new(HashMap::new()),
            failing_fields: RefCell::new(BTreeSet::new()),
            stalled_fields: RefCell::new(BTreeSet::new()),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Store a raw object as-is, assigning an id when it has none
    pub fn insert(&self, kind: EntityKind, value: Value) -> String {
        let mut object = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let id = match object.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => self.fresh_id(),
        };
        object.insert("id".to_string(), Value::String(id.clone()));
        object.insert("type".to_string(), Value::String(kind.rest_type().to_string()));
        self.entities.borrow_mut().entry(kind).or_default().insert(id.clone(), Value::Object(object));
        id
    }

    pub fn raw(&self, kind: EntityKind, id: &str) -> Option<Value> {
        self.entities.borrow().get(&kind).and_then(|m| m.get(id)).cloned()
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities.borrow().get(&kind).map_or(0, BTreeMap::len)
    }

    pub fn set_schema_views(&self, views: &[&str]) {
        *self.schema_views.borrow_mut() = views.iter().map(|v| v.to_string()).collect();
    }

    pub fn set_schema_info(&self, type_name: &str, info: Vec<Value>) {
        self.schema_info.borrow_mut().insert(type_name.to_string(), info);
    }

    /// Queries filtering on `field` fail with a network error
    pub fn fail_queries_on(&self, field: &str) {
        self.failing_fields.borrow_mut().insert(field.to_string());
    }

    /// Queries filtering on `field` never complete
    pub fn stall_queries_on(&self, field: &str) {
        self.stalled_fields.borrow_mut().insert(field.to_string());
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.borrow_mut().clear();
    }

    fn log(&self, line: String) {
        self.requests.borrow_mut().push(line);
    }

    fn fresh_id(&self) -> String {
        let n = self.next_id.get();
        self.next_id.set(n + 1);
        format!("{:032x}", 0x5c0de_0000_u64 + n)
    }

    /// Responses embed owner and endpoint objects the way the server's default view does
    fn expand(&self, kind: EntityKind, value: &Value) -> Value {
        let mut value = value.clone();
        let Value::Object(object) = &mut value else { return value };

        let entities = self.entities.borrow();
        let types = entities.get(&EntityKind::SchemaNode);
        let embed = |id: &str| -> Option<Value> {
            let node = types?.get(id)?;
            Some(json!({
                "id": id,
                "name": node.get("name").cloned().unwrap_or(Value::Null),
                "isBuiltinType": node.get("isBuiltinType").and_then(Value::as_bool).unwrap_or(false),
            }))
        };

        let links: &[(&str, &str)] = match kind {
            EntityKind::SchemaRelationshipNode => &[("sourceId", "sourceNode"), ("targetId", "targetNode")],
            EntityKind::SchemaNode => &[("extendsClass", "extendsClass")],
            EntityKind::WorkingSet => &[],
            _ => &[("schemaNode", "schemaNode")],
        };
        for (from, to) in links {
            if let Some(embedded) = object.get(*from).and_then(Value::as_str).and_then(|id| embed(id)) {
                object.insert(to.to_string(), embedded);
            }
        }
        value
    }

    fn name_taken(&self, name: &str, except: Option<&str>) -> bool {
        self.entities
            .borrow()
            .get(&EntityKind::SchemaNode)
            .map(|types| {
                types.iter().any(|(id, t)| Some(id.as_str()) != except && t.get("name").and_then(Value::as_str) == Some(name))
            })
            .unwrap_or(false)
    }
}

fn matches(entity: &Value, key: &str, expected: &FilterValue, inexact: bool) -> bool {
    let actual = entity.get(key).unwrap_or(&Value::Null);
    match expected {
        FilterValue::Null => actual.is_null(),
        FilterValue::Bool(b) => actual.as_bool().unwrap_or(false) == *b,
        FilterValue::Text(text) => {
            let candidate = actual.as_str().or_else(|| actual.get("id").and_then(Value::as_str));
            match candidate {
                Some(c) if inexact => c.to_lowercase().contains(&text.to_lowercase()),
                Some(c) => c == text,
                None => false,
            }
        }
    }
}

fn not_found(kind: EntityKind, id: &str) -> ApiError {
    ApiError::Status { code: 404, message: format!("{} {} not found", kind.rest_type(), id) }
}

#[async_trait(?Send)]
impl EntityStore for MemoryStore {
    async fn query(&self, query: &Query) -> ApiResult<Vec<Value>> {
        self.log(format!("query {}?{}", query.kind.rest_type(), query.to_query_string()));

        let stalled = query.filters.iter().any(|(k, _)| self.stalled_fields.borrow().contains(k));
        if stalled {
            futures::future::pending::<()>().await;
        }
        let failing = query.filters.iter().any(|(k, _)| self.failing_fields.borrow().contains(k));
        if failing {
            return Err(ApiError::Network(format!("connection reset while querying {}", query.kind.rest_type())));
        }

        let mut hits: Vec<Value> = self
            .entities
            .borrow()
            .get(&query.kind)
            .map(|all| {
                all.values()
                    .filter(|e| query.filters.iter().all(|(k, v)| matches(e, k, v, query.inexact)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(sort) = &query.sort {
            hits.sort_by_key(|e| e.get(sort).and_then(Value::as_str).unwrap_or_default().to_string());
        }

        let skip = (query.page.saturating_sub(1) * query.page_size) as usize;
        Ok(hits
            .iter()
            .skip(skip)
            .take(query.page_size as usize)
            .map(|e| self.expand(query.kind, e))
            .collect())
    }

    async fn get(&self, kind: EntityKind, id: &str) -> ApiResult<Option<Value>> {
        self.log(format!("get {}/{}", kind.rest_type(), id));
        Ok(self.raw(kind, id).map(|e| self.expand(kind, &e)))
    }

    async fn create(&self, kind: EntityKind, body: Value) -> ApiResult<String> {
        self.log(format!("create {}", kind.rest_type()));
        if kind == EntityKind::SchemaNode {
            let name = body.get("name").and_then(Value::as_str).unwrap_or_default();
            if name.is_empty() || self.name_taken(name, None) {
                return Err(ApiError::Validation {
                    messages: vec![format!("name {}", if name.is_empty() { "must_not_be_empty" } else { "already_taken" })],
                    properties: vec!["name".to_string()],
                });
            }
        }
        let mut body = body;
        if let Value::Object(map) = &mut body {
            map.remove("id");
        }
        Ok(self.insert(kind, body))
    }

    async fn update(&self, kind: EntityKind, id: &str, body: Value) -> ApiResult<()> {
        self.log(format!("update {}/{}", kind.rest_type(), id));
        if kind == EntityKind::SchemaNode {
            if let Some(name) = body.get("name").and_then(Value::as_str) {
                if self.name_taken(name, Some(id)) {
                    return Err(ApiError::Validation {
                        messages: vec!["name already_taken".to_string()],
                        properties: vec!["name".to_string()],
                    });
                }
            }
        }

        let mut entities = self.entities.borrow_mut();
        let Some(Value::Object(entity)) = entities.get_mut(&kind).and_then(|m| m.get_mut(id)) else {
            return Err(not_found(kind, id));
        };
        if let Value::Object(changes) = body {
            for (key, value) in changes {
                entity.insert(key, value);
            }
        }
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> ApiResult<()> {
        self.log(format!("delete {}/{}", kind.rest_type(), id));
        let mut entities = self.entities.borrow_mut();
        if entities.get_mut(&kind).and_then(|m| m.remove(id)).is_none() {
            return Err(not_found(kind, id));
        }

        if kind == EntityKind::SchemaNode {
            for member in [EntityKind::SchemaProperty, EntityKind::SchemaView, EntityKind::SchemaMethod] {
                if let Some(members) = entities.get_mut(&member) {
                    members.retain(|_, m| m.get("schemaNode").and_then(Value::as_str) != Some(id));
                }
            }
            if let Some(relationships) = entities.get_mut(&EntityKind::SchemaRelationshipNode) {
                relationships.retain(|_, r| {
                    r.get("sourceId").and_then(Value::as_str) != Some(id) && r.get("targetId").and_then(Value::as_str) != Some(id)
                });
            }
        }
        Ok(())
    }

    async fn schema_info(&self, type_name: &str, view: &str) -> ApiResult<Vec<Value>> {
        self.log(format!("schema {}/{}", type_name, view));
        if !self.schema_views.borrow().contains(view) {
            return Err(ApiError::Status { code: 404, message: format!("view {} not found", view) });
        }
        Ok(self.schema_info.borrow().get(type_name).cloned().unwrap_or_default())
    }

    async fn maintenance(&self, command: &str, body: Value) -> ApiResult<Value> {
        self.log(format!("maintenance {}", command));
        Ok(json!({ "command": command, "arguments": body }))
    }
}
