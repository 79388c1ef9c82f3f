//! End-to-end flows of the code area against the in-memory store
//!
//! Each test walks the same calls the UI makes: schema helpers for the
//! creation forms, the tree data source for what the tree shows, and the
//! form/dirty machinery for edits in the detail panel.

use std::rc::Rc;

use futures::executor::block_on;
use futures::future::{pending, Pending};
use serde_json::json;

use crate::api::memory::MemoryStore;
use crate::api::schema::{add_method, add_property, create_relationship, create_type, delete_entity, update_entity, NewProperty, NewRelationship};
use crate::components::field_specs::bound_keys;
use crate::dirty::{changes_to_json, collect, FieldValue, FormState};
use crate::models::{EntityKind, SchemaEntity, TreeNode};
use crate::path::{CodePath, MemberCollection, TreeRoot};
use crate::search::federated_search;
use crate::tree_source::{LoadTarget, TreeDataSource};

struct ProjectSchema {
    project: String,
    project_id_property: String,
    milestone: String,
    relationship: String,
}

fn never() -> Pending<()> {
    pending()
}

fn tree() -> TreeDataSource<MemoryStore> {
    TreeDataSource::new(Rc::new(MemoryStore::new()), 10_000)
}

fn children(source: &TreeDataSource<MemoryStore>, path: &CodePath) -> Vec<TreeNode> {
    block_on(source.load(&LoadTarget::Path(path.clone()))).unwrap()
}

fn ids(nodes: &[TreeNode]) -> Vec<String> {
    nodes.iter().map(|n| n.id.to_string()).collect()
}

/// Project, its unique projectId and the PROJECT_HAS_MILESTONE link to Milestone
fn build_project_schema(store: &MemoryStore) -> ProjectSchema {
    block_on(async {
        let project = create_type(store, "Project").await.unwrap();
        let project_id_property = add_property(
            store,
            &project,
            &NewProperty { name: "projectId".into(), property_type: "String".into(), unique: true },
        )
        .await
        .unwrap();
        let milestone = create_type(store, "Milestone").await.unwrap();
        let relationship = create_relationship(
            store,
            &NewRelationship {
                source_id: project.clone(),
                target_id: milestone.clone(),
                relationship_type: "PROJECT_HAS_MILESTONE".into(),
                source_multiplicity: "1".into(),
                target_multiplicity: "*".into(),
                source_json_name: "project".into(),
                target_json_name: "milestones".into(),
            },
        )
        .await
        .unwrap();
        ProjectSchema { project, project_id_property, milestone, relationship }
    })
}

/// Edit bound fields the way the detail panel does and save the difference
fn edit(store: &MemoryStore, entity: &SchemaEntity, edits: &[(&str, &str)]) -> usize {
    let snapshot = entity.snapshot();
    let mut form = FormState::from_snapshot(bound_keys(entity.kind()), &snapshot);
    for (key, value) in edits {
        form.set(*key, FieldValue::text(*value));
    }
    let changes = collect(&form, &snapshot);
    let count = changes.len();
    block_on(update_entity(store, entity.kind(), entity.id(), changes_to_json(&changes))).unwrap();
    count
}

#[test]
fn test_schema_creation_shows_up_in_tree() {
    let source = tree();
    let schema = build_project_schema(source.store());

    let custom = CodePath::new(TreeRoot::Custom);
    let types = children(&source, &custom);
    assert_eq!(types.iter().map(|n| n.label.as_str()).collect::<Vec<_>>(), vec!["Milestone", "Project"]);

    let project = custom.with_type(&schema.project).unwrap();
    let properties = children(&source, &project.with_collection(MemberCollection::Properties).unwrap());
    assert_eq!(
        ids(&properties),
        vec![format!("custom-{}-properties-{}", schema.project, schema.project_id_property)]
    );
    assert_eq!(properties[0].label, "projectId");
    assert!(!properties[0].has_children());

    let remote = project.with_collection(MemberCollection::RemoteProperties).unwrap();
    let relationship_path = format!("custom-{}-remoteproperties-{}", schema.project, schema.relationship);
    let links = children(&source, &remote);
    assert_eq!(ids(&links), vec![relationship_path.clone()]);
    assert_eq!(links[0].label, "milestones");

    // Seen from the target side the same relationship carries the source name
    let milestone_links = children(&source, &custom.with_type(&schema.milestone).unwrap().with_collection(MemberCollection::RemoteProperties).unwrap());
    assert_eq!(milestone_links.iter().map(|n| n.label.as_str()).collect::<Vec<_>>(), vec!["project"]);

    // The node is addressable: its path resolves back to the relationship
    let path = CodePath::parse(&relationship_path).unwrap();
    let entity = block_on(source.load_entity(&path)).unwrap().unwrap();
    let SchemaEntity::Relationship(relationship) = &entity else {
        panic!("expected a relationship, got {:?}", entity);
    };
    assert_eq!(relationship.relationship_type, "PROJECT_HAS_MILESTONE");
    assert_eq!((relationship.source_multiplicity.as_str(), relationship.target_multiplicity.as_str()), ("1", "*"));
    assert_eq!(CodePath::for_entity(&entity), path);

    // ... and deletable
    block_on(delete_entity(source.store(), EntityKind::SchemaRelationshipNode, &schema.relationship)).unwrap();
    assert!(children(&source, &remote).is_empty());
    assert!(block_on(source.load_entity(&path)).unwrap().is_none());
}

#[test]
fn test_duplicate_type_name_is_rejected() {
    let store = MemoryStore::new();
    build_project_schema(&store);

    let err = block_on(create_type(&store, "Project")).unwrap_err();
    assert_eq!(err.invalid_properties(), ["name".to_string()]);
    assert_eq!(store.count(EntityKind::SchemaNode), 2);
}

#[test]
fn test_rename_found_by_search_then_gone() {
    let source = tree();
    let store = source.store();
    let schema = build_project_schema(store);

    let count_property = block_on(add_property(
        store,
        &schema.project,
        &NewProperty { name: "milestoneCount".into(), property_type: "Function".into(), unique: false },
    ))
    .unwrap();
    let method = block_on(add_method(store, Some(&schema.project), "listOpen")).unwrap();
    let project_path = CodePath::new(TreeRoot::Custom).with_type(&schema.project).unwrap();
    let property_path = project_path.with_collection(MemberCollection::Properties).unwrap().with_member(&count_property).unwrap();
    let method_path = project_path.with_collection(MemberCollection::Methods).unwrap().with_member(&method).unwrap();
    let property = block_on(source.load_entity(&property_path)).unwrap().unwrap();
    let method_entity = block_on(source.load_entity(&method_path)).unwrap().unwrap();
    edit(store, &property, &[("readFunction", "size(this.milestones)")]);
    edit(store, &method_entity, &[("source", "{ return $.this.milestones.filter(m => !m.done); }")]);

    // The old name is discoverable before the edit
    let before = block_on(federated_search(store, "milestones", 10_000, never));
    assert!(!before.is_partial());
    for id in [&schema.relationship, &count_property, &method] {
        assert!(before.hits.contains_key(id.as_str()), "{} not found", id);
    }

    // Search hits show up under the search root at their canonical paths
    source.set_search_results(Some(before.entities()));
    let roots = block_on(source.load(&LoadTarget::RootSentinel)).unwrap();
    assert_eq!(roots.last().map(|n| n.id.to_string()).as_deref(), Some("searchresults"));
    let hits = children(&source, &CodePath::new(TreeRoot::SearchResults));
    assert!(hits.iter().any(|n| n.id == property_path));

    // Rename the relationship through its form, then fix the dependent expressions by hand
    let relationship_path = project_path.with_collection(MemberCollection::RemoteProperties).unwrap().with_member(&schema.relationship).unwrap();
    let relationship = block_on(source.load_entity(&relationship_path)).unwrap().unwrap();
    assert_eq!(edit(store, &relationship, &[("targetJsonName", "goals")]), 1);
    assert_eq!(edit(store, &property, &[("readFunction", "size(this.goals)")]), 1);
    assert_eq!(edit(store, &method_entity, &[("source", "{ return $.this.goals.filter(m => !m.done); }")]), 1);

    let after = block_on(federated_search(store, "milestones", 10_000, never));
    assert!(after.hits.is_empty(), "left over: {:?}", after.hits.keys().collect::<Vec<_>>());

    let renamed = block_on(federated_search(store, "goals", 10_000, never));
    assert_eq!(renamed.hits.len(), 3);

    let links = children(&source, &project_path.with_collection(MemberCollection::RemoteProperties).unwrap());
    assert_eq!(links.iter().map(|n| n.label.as_str()).collect::<Vec<_>>(), vec!["goals"]);
}

#[test]
fn test_unchanged_form_saves_nothing() {
    let source = tree();
    let store = source.store();
    let schema = build_project_schema(store);
    let path = CodePath::new(TreeRoot::Custom).with_type(&schema.project).unwrap();
    let project = block_on(source.load_entity(&path)).unwrap().unwrap();

    store.clear_requests();
    assert_eq!(edit(store, &project, &[("name", "Project"), ("summary", "")]), 0);
    assert!(store.requests().is_empty());
    assert_eq!(store.raw(EntityKind::SchemaNode, &schema.project).unwrap()["name"], json!("Project"));
}
