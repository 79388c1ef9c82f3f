//! Frontend Models
//!
//! View-models for the schema entities served by the REST API, plus the
//! mapping layer that turns raw server JSON into them.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::path::CodePath;

/// Server-side entity kinds the code area works with
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    SchemaNode,
    SchemaProperty,
    SchemaView,
    SchemaMethod,
    SchemaRelationshipNode,
    WorkingSet,
}

impl EntityKind {
    /// REST resource name
    pub fn rest_type(self) -> &'static str {
        match self {
            EntityKind::SchemaNode => "SchemaNode",
            EntityKind::SchemaProperty => "SchemaProperty",
            EntityKind::SchemaView => "SchemaView",
            EntityKind::SchemaMethod => "SchemaMethod",
            EntityKind::SchemaRelationshipNode => "SchemaRelationshipNode",
            // Working sets are stored as layout configuration nodes
            EntityKind::WorkingSet => "ApplicationConfigurationDataNode",
        }
    }

    pub fn icon_class(self) -> &'static str {
        match self {
            EntityKind::SchemaNode => "icon-type",
            EntityKind::SchemaProperty => "icon-property",
            EntityKind::SchemaView => "icon-view",
            EntityKind::SchemaMethod => "icon-method",
            EntityKind::SchemaRelationshipNode => "icon-relationship",
            EntityKind::WorkingSet => "icon-working-set",
        }
    }
}

/// Reference to a type, either an id echoed by the server or an embedded object
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub is_builtin_type: bool,
}

impl TypeRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Default::default() }
    }
}

impl<'de> Deserialize<'de> for TypeRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Embedded {
            id: String,
            #[serde(default)]
            name: Option<String>,
            #[serde(default)]
            is_builtin_type: bool,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Id(String),
            Object(Embedded),
        }

        match Raw::deserialize(deserializer) {
            Ok(Raw::Id(id)) => Ok(TypeRef::new(id)),
            Ok(Raw::Object(o)) => Ok(TypeRef { id: o.id, name: o.name, is_builtin_type: o.is_builtin_type }),
            Err(_) => Err(de::Error::custom("expected a type id or an object with an id")),
        }
    }
}

/// A user-defined or builtin type (SchemaNode)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaType {
    pub id: String,
    pub name: String,
    pub is_builtin_type: bool,
    pub is_abstract: bool,
    pub is_interface: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends_class: Option<TypeRef>,
    pub category: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaProperty {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_node: Option<TypeRef>,
    pub property_type: String,
    pub content_type: Option<String>,
    pub format: Option<String>,
    pub type_hint: Option<String>,
    pub hint: Option<String>,
    pub category: Option<String>,
    pub default_value: Option<String>,
    pub unique: bool,
    pub compound: bool,
    pub indexed: bool,
    pub not_null: bool,
    pub read_function: Option<String>,
    pub write_function: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaView {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_node: Option<TypeRef>,
    pub non_graph_properties: Option<String>,
    pub sort_order: Option<String>,
}

/// Method parameter row of the parameter sub-form
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MethodParameter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub parameter_type: String,
    pub description: Option<String>,
    pub example_value: Option<String>,
    pub index: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaMethod {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_node: Option<TypeRef>,
    pub source: Option<String>,
    pub code_type: Option<String>,
    pub is_static: bool,
    pub is_private: bool,
    pub return_raw_result: bool,
    pub http_verb: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub parameters: Vec<MethodParameter>,
}

impl SchemaMethod {
    pub fn is_global(&self) -> bool {
        self.schema_node.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRelationship {
    pub id: String,
    pub relationship_type: String,
    pub source: TypeRef,
    pub target: TypeRef,
    pub source_multiplicity: String,
    pub target_multiplicity: String,
    pub source_json_name: Option<String>,
    pub target_json_name: Option<String>,
    pub cascading_delete_flag: Option<i64>,
}

impl SchemaRelationship {
    /// Name under which the relationship appears on the given type
    pub fn json_name_for(&self, type_id: &str) -> String {
        let (own, other) = if self.source.id == type_id {
            (&self.target_json_name, &self.target)
        } else {
            (&self.source_json_name, &self.source)
        };
        own.clone()
            .filter(|n| !n.is_empty())
            .or_else(|| other.name.clone())
            .unwrap_or_else(|| self.relationship_type.clone())
    }
}

/// Wire shape of a relationship: endpoints arrive either as ids or as embedded nodes
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRelationship {
    id: String,
    #[serde(default)]
    relationship_type: Option<String>,
    #[serde(default)]
    source_id: Option<String>,
    #[serde(default)]
    target_id: Option<String>,
    #[serde(default)]
    source_node: Option<TypeRef>,
    #[serde(default)]
    target_node: Option<TypeRef>,
    #[serde(default)]
    source_multiplicity: Option<String>,
    #[serde(default)]
    target_multiplicity: Option<String>,
    #[serde(default)]
    source_json_name: Option<String>,
    #[serde(default)]
    target_json_name: Option<String>,
    #[serde(default)]
    cascading_delete_flag: Option<i64>,
}

impl TryFrom<RawRelationship> for SchemaRelationship {
    type Error = MappingError;

    fn try_from(raw: RawRelationship) -> Result<Self, Self::Error> {
        let source = raw
            .source_node
            .or_else(|| raw.source_id.map(TypeRef::new))
            .ok_or_else(|| MappingError::MissingField("sourceId"))?;
        let target = raw
            .target_node
            .or_else(|| raw.target_id.map(TypeRef::new))
            .ok_or_else(|| MappingError::MissingField("targetId"))?;

        Ok(SchemaRelationship {
            id: raw.id,
            relationship_type: raw.relationship_type.unwrap_or_default(),
            source,
            target,
            source_multiplicity: raw.source_multiplicity.unwrap_or_else(|| "*".to_string()),
            target_multiplicity: raw.target_multiplicity.unwrap_or_else(|| "*".to_string()),
            source_json_name: raw.source_json_name,
            target_json_name: raw.target_json_name,
            cascading_delete_flag: raw.cascading_delete_flag,
        })
    }
}

/// Named group of types used to scope the schema graph
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingSet {
    pub id: String,
    pub name: String,
    pub type_names: Vec<String>,
}

impl WorkingSet {
    /// Working sets keep their member types as the keys of `content.positions`
    fn from_json(value: &Value) -> Result<Self, MappingError> {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .ok_or(MappingError::MissingField("id"))?
            .to_string();
        let name = value.get("name").and_then(Value::as_str).unwrap_or_default().to_string();

        let mut type_names: Vec<String> = value
            .get("content")
            .and_then(Value::as_str)
            .and_then(|c| serde_json::from_str::<Value>(c).ok())
            .and_then(|c| c.get("positions").and_then(Value::as_object).cloned())
            .map(|positions| positions.keys().cloned().collect())
            .unwrap_or_default();
        type_names.sort();

        Ok(WorkingSet { id, name, type_names })
    }
}

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("malformed {kind:?}: {source}")]
    Malformed {
        kind: EntityKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Discriminated union of every entity the code area can show
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaEntity {
    Node(SchemaType),
    Property(SchemaProperty),
    View(SchemaView),
    Method(SchemaMethod),
    Relationship(SchemaRelationship),
    WorkingSet(WorkingSet),
}

impl SchemaEntity {
    /// Mapping layer: build the typed view-model for a server JSON object
    pub fn from_json(kind: EntityKind, value: &Value) -> Result<Self, MappingError> {
        fn typed<T: for<'de> Deserialize<'de>>(kind: EntityKind, value: &Value) -> Result<T, MappingError> {
            T::deserialize(value).map_err(|source| MappingError::Malformed { kind, source })
        }

        if value.get("id").and_then(Value::as_str).is_none() {
            return Err(MappingError::MissingField("id"));
        }

        Ok(match kind {
            EntityKind::SchemaNode => SchemaEntity::Node(typed(kind, value)?),
            EntityKind::SchemaProperty => SchemaEntity::Property(typed(kind, value)?),
            EntityKind::SchemaView => SchemaEntity::View(typed(kind, value)?),
            EntityKind::SchemaMethod => SchemaEntity::Method(typed(kind, value)?),
            EntityKind::SchemaRelationshipNode => {
                let raw: RawRelationship = typed(kind, value)?;
                SchemaEntity::Relationship(raw.try_into()?)
            }
            EntityKind::WorkingSet => SchemaEntity::WorkingSet(WorkingSet::from_json(value)?),
        })
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            SchemaEntity::Node(_) => EntityKind::SchemaNode,
            SchemaEntity::Property(_) => EntityKind::SchemaProperty,
            SchemaEntity::View(_) => EntityKind::SchemaView,
            SchemaEntity::Method(_) => EntityKind::SchemaMethod,
            SchemaEntity::Relationship(_) => EntityKind::SchemaRelationshipNode,
            SchemaEntity::WorkingSet(_) => EntityKind::WorkingSet,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            SchemaEntity::Node(t) => &t.id,
            SchemaEntity::Property(p) => &p.id,
            SchemaEntity::View(v) => &v.id,
            SchemaEntity::Method(m) => &m.id,
            SchemaEntity::Relationship(r) => &r.id,
            SchemaEntity::WorkingSet(w) => &w.id,
        }
    }

    /// Display name
    pub fn name(&self) -> String {
        match self {
            SchemaEntity::Node(t) => t.name.clone(),
            SchemaEntity::Property(p) => p.name.clone(),
            SchemaEntity::View(v) => v.name.clone(),
            SchemaEntity::Method(m) => m.name.clone(),
            SchemaEntity::Relationship(r) => r.relationship_type.clone(),
            SchemaEntity::WorkingSet(w) => w.name.clone(),
        }
    }

    /// Owning type of a member entity
    pub fn owner(&self) -> Option<&TypeRef> {
        match self {
            SchemaEntity::Property(p) => p.schema_node.as_ref(),
            SchemaEntity::View(v) => v.schema_node.as_ref(),
            SchemaEntity::Method(m) => m.schema_node.as_ref(),
            SchemaEntity::Relationship(r) => Some(&r.source),
            SchemaEntity::Node(_) | SchemaEntity::WorkingSet(_) => None,
        }
    }

    /// Field snapshot the dirty tracker compares form values against
    pub fn snapshot(&self) -> serde_json::Map<String, Value> {
        let value = match self {
            SchemaEntity::Node(t) => serde_json::to_value(t),
            SchemaEntity::Property(p) => serde_json::to_value(p),
            SchemaEntity::View(v) => serde_json::to_value(v),
            SchemaEntity::Method(m) => serde_json::to_value(m),
            SchemaEntity::Relationship(r) => serde_json::to_value(r),
            SchemaEntity::WorkingSet(w) => serde_json::to_value(w),
        };
        match value {
            Ok(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Node of the code tree; children are loaded when it is expanded
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub id: CodePath,
    pub label: String,
    pub icon: &'static str,
    /// Whether an expander is shown
    pub expandable: bool,
}

impl TreeNode {
    pub fn has_children(&self) -> bool {
        self.expandable
    }
}

/// Entry of the recently-used bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentlyUsedEntry {
    pub id: String,
    pub name: String,
    pub icon_class: String,
    pub path: String,
}
