//! Schema Operations
//!
//! Typed helpers over [`EntityStore`] for the mutations the code area
//! performs. Bodies carry changed attributes only.

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use super::{ApiError, ApiResult, EntityStore, Query};
use crate::models::{EntityKind, MethodParameter, SchemaEntity};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
    pub name: String,
    pub property_type: String,
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRelationship {
    pub source_id: String,
    pub target_id: String,
    pub relationship_type: String,
    pub source_multiplicity: String,
    pub target_multiplicity: String,
    pub source_json_name: String,
    pub target_json_name: String,
}

/// Map a result list, skipping entries the mapping layer rejects
pub fn map_entities(kind: EntityKind, values: &[Value]) -> Vec<SchemaEntity> {
    values
        .iter()
        .filter_map(|value| match SchemaEntity::from_json(kind, value) {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!(?kind, error = %e, "skipping malformed entity");
                None
            }
        })
        .collect()
}

pub async fn list(store: &impl EntityStore, query: &Query) -> ApiResult<Vec<SchemaEntity>> {
    let values = store.query(query).await?;
    Ok(map_entities(query.kind, &values))
}

pub async fn fetch_entity(store: &impl EntityStore, kind: EntityKind, id: &str) -> ApiResult<Option<SchemaEntity>> {
    match store.get(kind, id).await? {
        Some(value) => Ok(Some(SchemaEntity::from_json(kind, &value)?)),
        None => Ok(None),
    }
}

fn body_of(value: &impl Serialize) -> ApiResult<Value> {
    Ok(serde_json::to_value(value)?)
}

pub async fn create_type(store: &impl EntityStore, name: &str) -> ApiResult<String> {
    let id = store.create(EntityKind::SchemaNode, json!({ "name": name })).await?;
    info!(name, %id, "created type");
    Ok(id)
}

pub async fn add_property(store: &impl EntityStore, type_id: &str, property: &NewProperty) -> ApiResult<String> {
    let mut body = body_of(property)?;
    if let Value::Object(map) = &mut body {
        map.insert("schemaNode".to_string(), Value::String(type_id.to_string()));
    }
    let id = store.create(EntityKind::SchemaProperty, body).await?;
    info!(type_id, name = %property.name, %id, "added property");
    Ok(id)
}

pub async fn add_view(store: &impl EntityStore, type_id: &str, name: &str) -> ApiResult<String> {
    store.create(EntityKind::SchemaView, json!({ "schemaNode": type_id, "name": name })).await
}

/// A method on a type, or a global method when `type_id` is `None`
pub async fn add_method(store: &impl EntityStore, type_id: Option<&str>, name: &str) -> ApiResult<String> {
    let body = json!({ "schemaNode": type_id, "name": name, "source": "" });
    store.create(EntityKind::SchemaMethod, body).await
}

pub async fn create_relationship(store: &impl EntityStore, relationship: &NewRelationship) -> ApiResult<String> {
    let id = store.create(EntityKind::SchemaRelationshipNode, body_of(relationship)?).await?;
    info!(relationship_type = %relationship.relationship_type, %id, "created relationship");
    Ok(id)
}

/// Send the changed attributes; nothing is sent for an empty change set
pub async fn update_entity(store: &impl EntityStore, kind: EntityKind, id: &str, changes: Map<String, Value>) -> ApiResult<()> {
    if changes.is_empty() {
        return Ok(());
    }
    let fields: Vec<String> = changes.keys().cloned().collect();
    store.update(kind, id, Value::Object(changes)).await?;
    info!(?kind, id, ?fields, "saved changes");
    Ok(())
}

pub async fn save_parameters(store: &impl EntityStore, method_id: &str, parameters: &[MethodParameter]) -> ApiResult<()> {
    let body = json!({ "parameters": body_of(&parameters)? });
    store.update(EntityKind::SchemaMethod, method_id, body).await
}

pub async fn delete_entity(store: &impl EntityStore, kind: EntityKind, id: &str) -> ApiResult<()> {
    store.delete(kind, id).await?;
    info!(?kind, id, "deleted");
    Ok(())
}

/// Property descriptors of a runtime type; retries once with the `ui` view
pub async fn fetch_schema_info(store: &impl EntityStore, type_name: &str) -> ApiResult<Vec<Value>> {
    match store.schema_info(type_name, "all").await {
        Ok(info) => Ok(info),
        Err(ApiError::SessionInvalid) => Err(ApiError::SessionInvalid),
        Err(e) => {
            warn!(type_name, error = %e, "schema info unavailable for `all`, retrying with `ui`");
            store.schema_info(type_name, "ui").await
        }
    }
}

pub async fn run_global_method(store: &impl EntityStore, name: &str, arguments: Value) -> ApiResult<Value> {
    store.maintenance(&format!("globalSchemaMethods/{}", name), arguments).await
}
