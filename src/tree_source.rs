//! Tree Data Source
//!
//! Lazily loads the children of a code-tree node. The node's path alone
//! decides which request is issued.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::api::schema::{fetch_entity, list};
use crate::api::{ApiResult, EntityStore, Query};
use crate::models::{EntityKind, SchemaEntity, TreeNode};
use crate::path::{CodePath, MemberCollection, TreeRoot};

/// Upper bound when following `extendsClass`
const MAX_INHERITANCE_DEPTH: usize = 32;

const FOLDER_ICON: &str = "icon-folder";

#[derive(Debug, Clone, PartialEq)]
pub enum LoadTarget {
    /// The invisible root above the static buckets
    RootSentinel,
    Path(CodePath),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Case-insensitive by label
    Alphabetical,
    /// Keep the order the server returned
    Server,
}

pub struct TreeDataSource<S: EntityStore> {
    store: Rc<S>,
    page_size: u32,
    search_results: RefCell<Option<Vec<SchemaEntity>>>,
}

impl<S: EntityStore> TreeDataSource<S> {
    pub fn new(store: Rc<S>, page_size: u32) -> Self {
        Self {
            store,
            page_size,
            search_results: RefCell::new(None),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Hits shown below the Search Results bucket; `None` hides the bucket
    pub fn set_search_results(&self, hits: Option<Vec<SchemaEntity>>) {
        *self.search_results.borrow_mut() = hits;
    }

    pub fn search_active(&self) -> bool {
        self.search_results.borrow().is_some()
    }

    pub async fn load(&self, target: &LoadTarget) -> ApiResult<Vec<TreeNode>> {
        let path = match target {
            LoadTarget::RootSentinel => return Ok(self.root_nodes()),
            LoadTarget::Path(path) => path,
        };
        debug!(%path, "loading children");

        let (mut nodes, sort) = self.children_of(path).await.inspect_err(|e| {
            warn!(%path, error = %e, "tree load failed");
        })?;
        if sort == SortMode::Alphabetical {
            nodes.sort_by_key(|n| n.label.to_lowercase());
        }
        Ok(nodes)
    }

    /// Entity addressed by a path, if any
    pub async fn load_entity(&self, path: &CodePath) -> ApiResult<Option<SchemaEntity>> {
        match path.target() {
            Some((kind, id)) => fetch_entity(&*self.store, kind, id).await,
            None => Ok(None),
        }
    }

    fn root_nodes(&self) -> Vec<TreeNode> {
        let mut roots = vec![TreeRoot::Globals, TreeRoot::Custom, TreeRoot::Builtin, TreeRoot::WorkingSets];
        if self.search_active() {
            roots.push(TreeRoot::SearchResults);
        }
        roots.into_iter().map(|root| folder(CodePath::new(root), root.label())).collect()
    }

    async fn children_of(&self, path: &CodePath) -> ApiResult<(Vec<TreeNode>, SortMode)> {
        use SortMode::*;

        if path.member_id().is_some() {
            return Ok((Vec::new(), Server));
        }

        let result = match (path.root(), path.working_set_id(), path.type_id(), path.member_collection()) {
            (TreeRoot::Root, ..) => (self.root_nodes(), Server),
            (TreeRoot::Globals, ..) => (self.global_methods().await?, Alphabetical),
            (TreeRoot::SearchResults, ..) => (self.search_result_nodes(), Alphabetical),
            (TreeRoot::WorkingSets, None, None, None) => (self.working_sets().await?, Server),
            (TreeRoot::WorkingSets, Some(set_id), None, None) => (self.working_set_types(path, set_id).await?, Alphabetical),
            (_, _, Some(_), None) => (collection_buckets(path), Server),
            (_, _, Some(type_id), Some(collection)) => (self.members(path, type_id, collection).await?, Alphabetical),
            (TreeRoot::Custom, None, None, None) => (self.types(path, false).await?, Alphabetical),
            (TreeRoot::Builtin, None, None, None) => (self.types(path, true).await?, Alphabetical),
            _ => (Vec::new(), Server),
        };
        Ok(result)
    }

    fn query(&self, kind: EntityKind) -> Query {
        Query::new(kind).page_size(self.page_size)
    }

    async fn types(&self, path: &CodePath, builtin: bool) -> ApiResult<Vec<TreeNode>> {
        let types = list(&*self.store, &self.query(EntityKind::SchemaNode).filter("isBuiltinType", builtin)).await?;
        Ok(types
            .iter()
            .filter_map(|t| Some(entity_node(path.with_type(t.id())?, t, t.name(), true)))
            .collect())
    }

    async fn global_methods(&self) -> ApiResult<Vec<TreeNode>> {
        let methods = list(&*self.store, &self.query(EntityKind::SchemaMethod).null("schemaNode")).await?;
        Ok(methods
            .iter()
            .map(|m| entity_node(CodePath::global_method(m.id()), m, m.name(), false))
            .collect())
    }

    async fn working_sets(&self) -> ApiResult<Vec<TreeNode>> {
        let query = self.query(EntityKind::WorkingSet).filter("configType", "layout").sort("position");
        let sets = list(&*self.store, &query).await?;
        Ok(sets
            .iter()
            .map(|s| entity_node(CodePath::working_set(s.id()), s, s.name(), true))
            .collect())
    }

    async fn working_set_types(&self, path: &CodePath, set_id: &str) -> ApiResult<Vec<TreeNode>> {
        let Some(SchemaEntity::WorkingSet(set)) = fetch_entity(&*self.store, EntityKind::WorkingSet, set_id).await? else {
            return Ok(Vec::new());
        };
        let names: BTreeSet<&str> = set.type_names.iter().map(String::as_str).collect();
        let types = list(&*self.store, &self.query(EntityKind::SchemaNode)).await?;
        Ok(types
            .iter()
            .filter(|t| names.contains(t.name().as_str()))
            .filter_map(|t| Some(entity_node(path.with_type(t.id())?, t, t.name(), true)))
            .collect())
    }

    async fn members(&self, path: &CodePath, type_id: &str, collection: MemberCollection) -> ApiResult<Vec<TreeNode>> {
        let kind = collection.entity_kind();
        let entities = match collection {
            MemberCollection::Properties | MemberCollection::Views | MemberCollection::Methods => {
                list(&*self.store, &self.query(kind).filter("schemaNode", type_id)).await?
            }
            MemberCollection::RemoteProperties => self.relationships_of(type_id).await?,
            MemberCollection::InheritedProperties => self.inherited_properties(type_id).await?,
        };

        Ok(entities
            .iter()
            .filter_map(|e| {
                let label = match e {
                    SchemaEntity::Relationship(r) => r.json_name_for(type_id),
                    other => other.name(),
                };
                Some(entity_node(path.with_member(e.id())?, e, label, false))
            })
            .collect())
    }

    /// Relationships with the type on either end, deduplicated by id
    async fn relationships_of(&self, type_id: &str) -> ApiResult<Vec<SchemaEntity>> {
        let outgoing = self.query(EntityKind::SchemaRelationshipNode).filter("sourceId", type_id);
        let incoming = self.query(EntityKind::SchemaRelationshipNode).filter("targetId", type_id);
        let (outgoing, incoming) =
            futures::future::try_join(list(&*self.store, &outgoing), list(&*self.store, &incoming)).await?;

        let merged: BTreeMap<String, SchemaEntity> =
            outgoing.into_iter().chain(incoming).map(|r| (r.id().to_string(), r)).collect();
        Ok(merged.into_values().collect())
    }

    async fn inherited_properties(&self, type_id: &str) -> ApiResult<Vec<SchemaEntity>> {
        let mut visited = BTreeSet::from([type_id.to_string()]);
        let mut next = self.parent_type(type_id).await?;
        let mut inherited = Vec::new();

        while let Some(ancestor) = next {
            if visited.len() > MAX_INHERITANCE_DEPTH || !visited.insert(ancestor.clone()) {
                warn!(type_id, %ancestor, "stopping inheritance walk");
                break;
            }
            inherited.extend(list(&*self.store, &self.query(EntityKind::SchemaProperty).filter("schemaNode", ancestor.as_str())).await?);
            next = self.parent_type(&ancestor).await?;
        }
        Ok(inherited)
    }

    async fn parent_type(&self, type_id: &str) -> ApiResult<Option<String>> {
        Ok(match fetch_entity(&*self.store, EntityKind::SchemaNode, type_id).await? {
            Some(SchemaEntity::Node(t)) => t.extends_class.map(|parent| parent.id),
            _ => None,
        })
    }

    fn search_result_nodes(&self) -> Vec<TreeNode> {
        self.search_results
            .borrow()
            .iter()
            .flatten()
            .map(|hit| entity_node(CodePath::for_entity(hit), hit, hit.name(), hit.kind() == EntityKind::SchemaNode))
            .collect()
    }
}

fn folder(path: CodePath, label: &str) -> TreeNode {
    TreeNode {
        id: path,
        label: label.to_string(),
        icon: FOLDER_ICON,
        expandable: true,
    }
}

fn collection_buckets(type_path: &CodePath) -> Vec<TreeNode> {
    MemberCollection::ALL
        .into_iter()
        .filter_map(|c| Some(folder(type_path.with_collection(c)?, c.label())))
        .collect()
}

fn entity_node(path: CodePath, entity: &SchemaEntity, label: String, has_children: bool) -> TreeNode {
    let label = if label.is_empty() { entity.id().to_string() } else { label };
    TreeNode {
        id: path,
        icon: entity.kind().icon_class(),
        expandable: has_children,
        label,
    }
}
