//! Path Identifiers
//!
//! Composite ids addressing nodes of the code tree:
//! `root[-workingSetId][-typeId[-memberCollection[-memberId]]]`.
//! Global methods are addressed as `globals-{methodId}`.
//!
//! Id segments are percent-escaped for `-` and `%`, so an id containing the
//! separator survives a round trip. Ids without those characters serialize
//! to the plain hyphen-joined form.

use std::fmt;
use std::str::FromStr;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use thiserror::Error;

use crate::models::{EntityKind, SchemaEntity};

const SEPARATOR: char = '-';

/// Characters escaped inside an id segment
const SEGMENT: &AsciiSet = &CONTROLS.add(b'-').add(b'%');

/// Top-level buckets of the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeRoot {
    Globals,
    Custom,
    Builtin,
    WorkingSets,
    SearchResults,
    Root,
}

impl TreeRoot {
    pub fn as_str(self) -> &'static str {
        match self {
            TreeRoot::Globals => "globals",
            TreeRoot::Custom => "custom",
            TreeRoot::Builtin => "builtin",
            TreeRoot::WorkingSets => "workingsets",
            TreeRoot::SearchResults => "searchresults",
            TreeRoot::Root => "root",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "globals" => Some(TreeRoot::Globals),
            "custom" => Some(TreeRoot::Custom),
            "builtin" => Some(TreeRoot::Builtin),
            "workingsets" => Some(TreeRoot::WorkingSets),
            "searchresults" => Some(TreeRoot::SearchResults),
            "root" => Some(TreeRoot::Root),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TreeRoot::Globals => "Global Methods",
            TreeRoot::Custom => "Custom Types",
            TreeRoot::Builtin => "Builtin Types",
            TreeRoot::WorkingSets => "Working Sets",
            TreeRoot::SearchResults => "Search Results",
            TreeRoot::Root => "Root",
        }
    }
}

/// Member lists below a type node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberCollection {
    Properties,
    RemoteProperties,
    Views,
    Methods,
    InheritedProperties,
}

impl MemberCollection {
    pub const ALL: [MemberCollection; 5] = [
        MemberCollection::Properties,
        MemberCollection::RemoteProperties,
        MemberCollection::Views,
        MemberCollection::Methods,
        MemberCollection::InheritedProperties,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MemberCollection::Properties => "properties",
            MemberCollection::RemoteProperties => "remoteproperties",
            MemberCollection::Views => "views",
            MemberCollection::Methods => "methods",
            MemberCollection::InheritedProperties => "inheritedproperties",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        MemberCollection::ALL.into_iter().find(|c| c.as_str() == token)
    }

    pub fn label(self) -> &'static str {
        match self {
            MemberCollection::Properties => "Local Attributes",
            MemberCollection::RemoteProperties => "Linked Properties",
            MemberCollection::Views => "Views",
            MemberCollection::Methods => "Methods",
            MemberCollection::InheritedProperties => "Inherited Attributes",
        }
    }

    /// Entity kind of the members listed in this collection
    pub fn entity_kind(self) -> EntityKind {
        match self {
            MemberCollection::Properties | MemberCollection::InheritedProperties => EntityKind::SchemaProperty,
            MemberCollection::RemoteProperties => EntityKind::SchemaRelationshipNode,
            MemberCollection::Views => EntityKind::SchemaView,
            MemberCollection::Methods => EntityKind::SchemaMethod,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty path")]
    Empty,
    #[error("unknown tree root `{0}`")]
    UnknownRoot(String),
    #[error("unknown member collection `{0}`")]
    UnknownCollection(String),
    #[error("empty segment in `{0}`")]
    EmptySegment(String),
    #[error("invalid escape in segment `{0}`")]
    InvalidEncoding(String),
    #[error("unexpected segment `{segment}` in `{path}`")]
    SurplusSegment { path: String, segment: String },
}

/// Result of splitting a path string into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParts {
    pub source: String,
    pub root: TreeRoot,
    pub working_set_id: Option<String>,
    pub type_id: Option<String>,
    pub member_collection: Option<MemberCollection>,
    pub member_id: Option<String>,
}

/// Address of a tree node. Paths are values: the `with_*` builders
/// return a new path instead of changing this one, and refuse to build a
/// path whose segments are out of order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CodePath {
    root: TreeRoot,
    working_set_id: Option<String>,
    type_id: Option<String>,
    member_collection: Option<MemberCollection>,
    member_id: Option<String>,
}

impl CodePath {
    pub fn new(root: TreeRoot) -> Self {
        Self {
            root,
            working_set_id: None,
            type_id: None,
            member_collection: None,
            member_id: None,
        }
    }

    /// `globals-{methodId}`
    pub fn global_method(id: impl Into<String>) -> Self {
        let mut path = CodePath::new(TreeRoot::Globals);
        path.member_collection = Some(MemberCollection::Methods);
        path.member_id = Some(id.into());
        path
    }

    /// `workingsets-{setId}`
    pub fn working_set(id: impl Into<String>) -> Self {
        let mut path = CodePath::new(TreeRoot::WorkingSets);
        path.working_set_id = Some(id.into());
        path
    }

    /// `{root}-{typeId}-{collection}-{memberId}`
    fn type_member(root: TreeRoot, type_id: &str, collection: MemberCollection, member_id: &str) -> Self {
        CodePath {
            root,
            working_set_id: None,
            type_id: Some(type_id.to_string()),
            member_collection: Some(collection),
            member_id: Some(member_id.to_string()),
        }
    }

    /// Type below this path; only type buckets and working sets hold types
    pub fn with_type(&self, id: impl Into<String>) -> Option<Self> {
        let holds_types = match self.root {
            TreeRoot::Custom | TreeRoot::Builtin => true,
            TreeRoot::WorkingSets => self.working_set_id.is_some(),
            _ => false,
        };
        holds_types.then(|| CodePath {
            type_id: Some(id.into()),
            member_collection: None,
            member_id: None,
            ..self.clone()
        })
    }

    /// Collection below a type; `None` when no type is set
    pub fn with_collection(&self, collection: MemberCollection) -> Option<Self> {
        self.type_id.as_ref()?;
        Some(CodePath {
            member_collection: Some(collection),
            member_id: None,
            ..self.clone()
        })
    }

    /// Member inside a collection; `None` when no collection is set
    pub fn with_member(&self, id: impl Into<String>) -> Option<Self> {
        self.member_collection?;
        Some(CodePath {
            member_id: Some(id.into()),
            ..self.clone()
        })
    }

    pub fn root(&self) -> TreeRoot {
        self.root
    }

    pub fn working_set_id(&self) -> Option<&str> {
        self.working_set_id.as_deref()
    }

    pub fn type_id(&self) -> Option<&str> {
        self.type_id.as_deref()
    }

    pub fn member_collection(&self) -> Option<MemberCollection> {
        self.member_collection
    }

    pub fn member_id(&self) -> Option<&str> {
        self.member_id.as_deref()
    }

    /// Number of segments below the root
    pub fn depth(&self) -> usize {
        if self.root == TreeRoot::Globals {
            return usize::from(self.member_id.is_some());
        }
        [
            self.working_set_id.is_some(),
            self.type_id.is_some(),
            self.member_collection.is_some(),
            self.member_id.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }

    /// Ancestor one level up; `None` for a bare root
    pub fn parent(&self) -> Option<CodePath> {
        let mut parent = self.clone();
        if parent.member_id.take().is_some() {
            if parent.root == TreeRoot::Globals {
                parent.member_collection = None;
            }
            return Some(parent);
        }
        if parent.member_collection.take().is_some() {
            return Some(parent);
        }
        if parent.type_id.take().is_some() {
            return Some(parent);
        }
        if parent.working_set_id.take().is_some() {
            return Some(parent);
        }
        None
    }

    /// True when `other` lies strictly below this path
    pub fn is_ancestor_of(&self, other: &CodePath) -> bool {
        if self.root != other.root || self.depth() >= other.depth() {
            return false;
        }
        let mut current = other.parent();
        while let Some(path) = current {
            if path == *self {
                return true;
            }
            current = path.parent();
        }
        false
    }

    /// Entity addressed by this path, if the path points at one
    pub fn target(&self) -> Option<(EntityKind, &str)> {
        if let (Some(collection), Some(id)) = (self.member_collection, self.member_id.as_deref()) {
            return Some((collection.entity_kind(), id));
        }
        if self.member_collection.is_none() {
            if let Some(type_id) = self.type_id.as_deref() {
                return Some((EntityKind::SchemaNode, type_id));
            }
            if let Some(set_id) = self.working_set_id.as_deref() {
                return Some((EntityKind::WorkingSet, set_id));
            }
        }
        None
    }

    /// Address of a known entity
    pub fn for_entity(entity: &SchemaEntity) -> CodePath {
        fn type_root(owner: &crate::models::TypeRef) -> TreeRoot {
            if owner.is_builtin_type { TreeRoot::Builtin } else { TreeRoot::Custom }
        }

        match entity {
            SchemaEntity::Node(t) => {
                let root = if t.is_builtin_type { TreeRoot::Builtin } else { TreeRoot::Custom };
                CodePath {
                    type_id: Some(t.id.clone()),
                    ..CodePath::new(root)
                }
            }
            SchemaEntity::Property(p) => match &p.schema_node {
                Some(owner) => CodePath::type_member(type_root(owner), &owner.id, MemberCollection::Properties, &p.id),
                None => CodePath::new(TreeRoot::Custom),
            },
            SchemaEntity::View(v) => match &v.schema_node {
                Some(owner) => CodePath::type_member(type_root(owner), &owner.id, MemberCollection::Views, &v.id),
                None => CodePath::new(TreeRoot::Custom),
            },
            SchemaEntity::Method(m) => match &m.schema_node {
                Some(owner) => CodePath::type_member(type_root(owner), &owner.id, MemberCollection::Methods, &m.id),
                None => CodePath::global_method(&m.id),
            },
            SchemaEntity::Relationship(r) => {
                CodePath::type_member(type_root(&r.source), &r.source.id, MemberCollection::RemoteProperties, &r.id)
            }
            SchemaEntity::WorkingSet(w) => CodePath::working_set(&w.id),
        }
    }

    /// Parse a path string
    pub fn parse(source: &str) -> Result<CodePath, PathError> {
        if source.is_empty() {
            return Err(PathError::Empty);
        }

        let mut tokens = source.split(SEPARATOR);
        let root_token = tokens.next().unwrap_or_default();
        let root = TreeRoot::parse(root_token).ok_or_else(|| PathError::UnknownRoot(root_token.to_string()))?;
        let mut path = CodePath::new(root);

        match root {
            TreeRoot::Root => {}
            TreeRoot::Globals => {
                if let Some(token) = tokens.next() {
                    path = CodePath::global_method(decode(source, token)?);
                }
            }
            _ => {
                if root == TreeRoot::WorkingSets {
                    if let Some(token) = tokens.next() {
                        path.working_set_id = Some(decode(source, token)?);
                    }
                }
                if let Some(token) = tokens.next() {
                    path.type_id = Some(decode(source, token)?);
                }
                if let Some(token) = tokens.next() {
                    let collection =
                        MemberCollection::parse(token).ok_or_else(|| PathError::UnknownCollection(token.to_string()))?;
                    path.member_collection = Some(collection);
                }
                if let Some(token) = tokens.next() {
                    path.member_id = Some(decode(source, token)?);
                }
            }
        }

        if let Some(extra) = tokens.next() {
            return Err(PathError::SurplusSegment {
                path: source.to_string(),
                segment: extra.to_string(),
            });
        }
        Ok(path)
    }
}

fn decode(source: &str, token: &str) -> Result<String, PathError> {
    if token.is_empty() {
        return Err(PathError::EmptySegment(source.to_string()));
    }
    percent_decode_str(token)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| PathError::InvalidEncoding(token.to_string()))
}

impl fmt::Display for CodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn segment(f: &mut fmt::Formatter<'_>, id: &str) -> fmt::Result {
            write!(f, "{}{}", SEPARATOR, utf8_percent_encode(id, SEGMENT))
        }

        f.write_str(self.root.as_str())?;

        if self.root == TreeRoot::Globals {
            if let Some(id) = &self.member_id {
                segment(f, id)?;
            }
            return Ok(());
        }
        if let Some(id) = &self.working_set_id {
            segment(f, id)?;
        }
        let Some(type_id) = &self.type_id else { return Ok(()) };
        segment(f, type_id)?;
        let Some(collection) = self.member_collection else { return Ok(()) };
        write!(f, "{}{}", SEPARATOR, collection.as_str())?;
        if let Some(id) = &self.member_id {
            segment(f, id)?;
        }
        Ok(())
    }
}

impl FromStr for CodePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CodePath::parse(s)
    }
}

impl From<&CodePath> for PathParts {
    fn from(path: &CodePath) -> Self {
        PathParts {
            source: path.to_string(),
            root: path.root,
            working_set_id: path.working_set_id.clone(),
            type_id: path.type_id.clone(),
            member_collection: path.member_collection,
            member_id: path.member_id.clone(),
        }
    }
}

/// Split a path string into its parts
pub fn split(source: &str) -> Result<PathParts, PathError> {
    let path = CodePath::parse(source)?;
    let mut parts = PathParts::from(&path);
    parts.source = source.to_string();
    Ok(parts)
}

/// Path of a known entity
pub fn build(entity: &SchemaEntity) -> CodePath {
    CodePath::for_entity(entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SchemaMethod, SchemaProperty, SchemaRelationship, SchemaType, SchemaView, TypeRef};
    use rstest::rstest;

    fn owner(id: &str, builtin: bool) -> Option<TypeRef> {
        Some(TypeRef { id: id.to_string(), name: None, is_builtin_type: builtin })
    }

    fn parts(
        source: &str,
        root: TreeRoot,
        type_id: Option<&str>,
        collection: Option<MemberCollection>,
        member_id: Option<&str>,
    ) -> PathParts {
        PathParts {
            source: source.to_string(),
            root,
            working_set_id: None,
            type_id: type_id.map(str::to_string),
            member_collection: collection,
            member_id: member_id.map(str::to_string),
        }
    }

    #[rstest]
    #[case::custom_type(
        SchemaEntity::Node(SchemaType { id: "t1".into(), name: "Project".into(), ..Default::default() }),
        parts("custom-t1", TreeRoot::Custom, Some("t1"), None, None)
    )]
    #[case::builtin_type(
        SchemaEntity::Node(SchemaType { id: "t2".into(), is_builtin_type: true, ..Default::default() }),
        parts("builtin-t2", TreeRoot::Builtin, Some("t2"), None, None)
    )]
    #[case::property(
        SchemaEntity::Property(SchemaProperty { id: "p1".into(), schema_node: owner("t1", false), ..Default::default() }),
        parts("custom-t1-properties-p1", TreeRoot::Custom, Some("t1"), Some(MemberCollection::Properties), Some("p1"))
    )]
    #[case::view(
        SchemaEntity::View(SchemaView { id: "v1".into(), schema_node: owner("t3", true), ..Default::default() }),
        parts("builtin-t3-views-v1", TreeRoot::Builtin, Some("t3"), Some(MemberCollection::Views), Some("v1"))
    )]
    #[case::type_method(
        SchemaEntity::Method(SchemaMethod { id: "m1".into(), schema_node: owner("t1", false), ..Default::default() }),
        parts("custom-t1-methods-m1", TreeRoot::Custom, Some("t1"), Some(MemberCollection::Methods), Some("m1"))
    )]
    #[case::global_method(
        SchemaEntity::Method(SchemaMethod { id: "m2".into(), ..Default::default() }),
        parts("globals-m2", TreeRoot::Globals, None, Some(MemberCollection::Methods), Some("m2"))
    )]
    fn test_split_of_build_matches_entity_parts(#[case] entity: SchemaEntity, #[case] expected: PathParts) {
        let built = build(&entity).to_string();
        assert_eq!(built, expected.source);
        assert_eq!(split(&built).unwrap(), expected);
    }

    #[test]
    fn test_relationship_path_uses_source_type() {
        let rel = SchemaEntity::Relationship(SchemaRelationship {
            id: "r1".into(),
            source: TypeRef::new("t1"),
            target: TypeRef::new("t2"),
            ..Default::default()
        });
        assert_eq!(build(&rel).to_string(), "custom-t1-remoteproperties-r1");
    }

    #[test]
    fn test_short_paths_denote_ancestors() {
        let parts = split("custom-t1-properties").unwrap();
        assert_eq!(parts.type_id.as_deref(), Some("t1"));
        assert_eq!(parts.member_collection, Some(MemberCollection::Properties));
        assert_eq!(parts.member_id, None);

        let parts = split("builtin").unwrap();
        assert_eq!(parts.root, TreeRoot::Builtin);
        assert_eq!(parts.type_id, None);
    }

    #[test]
    fn test_working_set_segment_precedes_type() {
        let path = CodePath::parse("workingsets-w1-t1-methods-m1").unwrap();
        assert_eq!(path.working_set_id(), Some("w1"));
        assert_eq!(path.type_id(), Some("t1"));
        assert_eq!(path.target(), Some((EntityKind::SchemaMethod, "m1")));
        assert_eq!(path.to_string(), "workingsets-w1-t1-methods-m1");
    }

    fn member(type_id: &str, collection: MemberCollection, id: &str) -> CodePath {
        CodePath::new(TreeRoot::Custom)
            .with_type(type_id)
            .and_then(|t| t.with_collection(collection))
            .and_then(|c| c.with_member(id))
            .unwrap()
    }

    #[test]
    fn test_ids_containing_separator_round_trip() {
        let path = member("a-b", MemberCollection::Properties, "50%-off");
        let text = path.to_string();
        assert_eq!(text, "custom-a%2Db-properties-50%25%2Doff");
        assert_eq!(CodePath::parse(&text).unwrap(), path);
    }

    #[rstest]
    #[case("", PathError::Empty)]
    #[case("types-t1", PathError::UnknownRoot("types".into()))]
    #[case("custom-t1-fields", PathError::UnknownCollection("fields".into()))]
    #[case("custom--properties", PathError::EmptySegment("custom--properties".into()))]
    #[case("root-x", PathError::SurplusSegment { path: "root-x".into(), segment: "x".into() })]
    #[case("globals-m1-extra", PathError::SurplusSegment { path: "globals-m1-extra".into(), segment: "extra".into() })]
    fn test_invalid_paths(#[case] input: &str, #[case] expected: PathError) {
        assert_eq!(CodePath::parse(input).unwrap_err(), expected);
    }

    #[test]
    fn test_parent_walks_up_one_level() {
        let path = CodePath::parse("custom-t1-views-v1").unwrap();
        let parent = path.parent().unwrap();
        assert_eq!(parent.to_string(), "custom-t1-views");
        assert_eq!(parent.parent().unwrap().to_string(), "custom-t1");
        assert_eq!(parent.parent().unwrap().parent().unwrap().to_string(), "custom");
        assert_eq!(CodePath::new(TreeRoot::Custom).parent(), None);
        assert_eq!(CodePath::global_method("m1").parent(), Some(CodePath::new(TreeRoot::Globals)));
    }

    #[test]
    fn test_builders_leave_original_untouched() {
        let base = CodePath::new(TreeRoot::Custom).with_type("t1").unwrap();
        let member = member("t1", MemberCollection::Methods, "m1");
        assert_eq!(base.to_string(), "custom-t1");
        assert_eq!(member.depth(), 3);
        assert_eq!(base.with_type("t2").unwrap().to_string(), "custom-t2");
    }

    #[test]
    fn test_member_needs_a_collection() {
        let custom = CodePath::new(TreeRoot::Custom);
        assert_eq!(custom.with_member("t1"), None);
        assert_eq!(custom.with_collection(MemberCollection::Views), None);

        let project = custom.with_type("t1").unwrap();
        assert_eq!(project.with_member("m1"), None);
        let methods = project.with_collection(MemberCollection::Methods).unwrap();
        assert_eq!(methods.with_member("m1").unwrap().to_string(), "custom-t1-methods-m1");
    }

    #[rstest]
    #[case::globals(CodePath::new(TreeRoot::Globals))]
    #[case::search_results(CodePath::new(TreeRoot::SearchResults))]
    #[case::root(CodePath::new(TreeRoot::Root))]
    #[case::working_sets_without_set(CodePath::new(TreeRoot::WorkingSets))]
    fn test_types_only_below_type_buckets(#[case] path: CodePath) {
        assert_eq!(path.with_type("t1"), None);
    }

    #[test]
    fn test_working_set_path() {
        let set = CodePath::working_set("w1");
        assert_eq!(set.to_string(), "workingsets-w1");
        assert_eq!(set.target(), Some((EntityKind::WorkingSet, "w1")));

        let typed = set.with_type("t1").unwrap();
        assert_eq!(typed.to_string(), "workingsets-w1-t1");
        assert_eq!(CodePath::parse("workingsets-w1-t1").unwrap(), typed);
        assert_eq!(typed.parent(), Some(set));
    }

    #[test]
    fn test_is_ancestor_of() {
        let member = CodePath::parse("custom-t1-views-v1").unwrap();
        assert!(CodePath::new(TreeRoot::Custom).is_ancestor_of(&member));
        assert!(CodePath::parse("custom-t1").unwrap().is_ancestor_of(&member));
        assert!(!member.is_ancestor_of(&member));
        assert!(!member.is_ancestor_of(&CodePath::new(TreeRoot::Custom)));
        assert!(!CodePath::new(TreeRoot::Builtin).is_ancestor_of(&member));
    }
}
