//! Detail panel field tables
//!
//! Which attributes each entity kind shows, on which tab and with which
//! input. Every field is bound to the attribute named by `key`.

use crate::models::EntityKind;

pub const PROPERTY_TYPES: &[&str] = &[
    "String", "Integer", "Long", "Double", "Boolean", "Enum", "Date", "ZonedDateTime", "Count", "Function", "Cypher",
    "Thumbnail", "Password", "Encrypted", "Custom", "StringArray", "IntegerArray", "LongArray", "DoubleArray",
    "BooleanArray", "DateArray", "ByteArray",
];

pub const HTTP_VERBS: &[&str] = &["GET", "PUT", "POST", "PATCH", "DELETE"];

pub const MULTIPLICITIES: &[&str] = &["1", "*"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldInput {
    Text,
    TextArea,
    /// Source editor
    Code,
    Checkbox,
    Select(&'static [&'static str]),
    /// Comma separated list
    Tags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelTab {
    Basic,
    Source,
    Functions,
    Parameters,
    Docs,
    Schema,
}

impl PanelTab {
    pub fn as_str(self) -> &'static str {
        match self {
            PanelTab::Basic => "basic",
            PanelTab::Source => "source",
            PanelTab::Functions => "functions",
            PanelTab::Parameters => "parameters",
            PanelTab::Docs => "docs",
            PanelTab::Schema => "schema",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        [
            PanelTab::Basic,
            PanelTab::Source,
            PanelTab::Functions,
            PanelTab::Parameters,
            PanelTab::Docs,
            PanelTab::Schema,
        ]
        .into_iter()
        .find(|t| t.as_str() == name)
    }

    pub fn label(self) -> &'static str {
        match self {
            PanelTab::Basic => "General",
            PanelTab::Source => "Source",
            PanelTab::Functions => "Read/Write Functions",
            PanelTab::Parameters => "Parameters",
            PanelTab::Docs => "Documentation",
            PanelTab::Schema => "Runtime Schema",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub input: FieldInput,
    pub tab: PanelTab,
}

const fn spec(key: &'static str, label: &'static str, input: FieldInput, tab: PanelTab) -> FieldSpec {
    FieldSpec { key, label, input, tab }
}

const fn basic(key: &'static str, label: &'static str, input: FieldInput) -> FieldSpec {
    spec(key, label, input, PanelTab::Basic)
}

use FieldInput::*;

const TYPE_FIELDS: &[FieldSpec] = &[
    basic("name", "Name", Text),
    basic("isAbstract", "Abstract", Checkbox),
    basic("isInterface", "Interface", Checkbox),
    basic("category", "Category", Text),
    basic("summary", "Summary", Text),
    basic("description", "Description", TextArea),
    basic("tags", "Tags", Tags),
];

const PROPERTY_FIELDS: &[FieldSpec] = &[
    basic("name", "Name", Text),
    basic("propertyType", "Type", Select(PROPERTY_TYPES)),
    basic("format", "Format", Text),
    basic("contentType", "Content Type", Text),
    basic("typeHint", "Type Hint", Text),
    basic("defaultValue", "Default Value", Text),
    basic("category", "Category", Text),
    basic("hint", "Hint", Text),
    basic("notNull", "Not Null", Checkbox),
    basic("compound", "Compound Unique", Checkbox),
    basic("unique", "Unique", Checkbox),
    basic("indexed", "Indexed", Checkbox),
    spec("readFunction", "Read Function", Code, PanelTab::Functions),
    spec("writeFunction", "Write Function", Code, PanelTab::Functions),
];

const VIEW_FIELDS: &[FieldSpec] = &[
    basic("name", "Name", Text),
    basic("nonGraphProperties", "Properties", TextArea),
    basic("sortOrder", "Sort Order", Text),
];

const METHOD_FIELDS: &[FieldSpec] = &[
    spec("source", "Source", Code, PanelTab::Source),
    basic("name", "Name", Text),
    basic("isStatic", "Static", Checkbox),
    basic("isPrivate", "Not callable via HTTP", Checkbox),
    basic("returnRawResult", "Return raw result", Checkbox),
    basic("httpVerb", "HTTP Verb", Select(HTTP_VERBS)),
    basic("summary", "Summary", Text),
    basic("description", "Description", TextArea),
    basic("tags", "Tags", Tags),
];

const RELATIONSHIP_FIELDS: &[FieldSpec] = &[
    basic("relationshipType", "Relationship Type", Text),
    basic("sourceMultiplicity", "Source Multiplicity", Select(MULTIPLICITIES)),
    basic("targetMultiplicity", "Target Multiplicity", Select(MULTIPLICITIES)),
    basic("sourceJsonName", "Source JSON Name", Text),
    basic("targetJsonName", "Target JSON Name", Text),
];

const WORKING_SET_FIELDS: &[FieldSpec] = &[basic("name", "Name", Text)];

pub fn fields_for(kind: EntityKind) -> &'static [FieldSpec] {
    match kind {
        EntityKind::SchemaNode => TYPE_FIELDS,
        EntityKind::SchemaProperty => PROPERTY_FIELDS,
        EntityKind::SchemaView => VIEW_FIELDS,
        EntityKind::SchemaMethod => METHOD_FIELDS,
        EntityKind::SchemaRelationshipNode => RELATIONSHIP_FIELDS,
        EntityKind::WorkingSet => WORKING_SET_FIELDS,
    }
}

/// Tabs in display order; the first one is the default
pub fn tabs_for(kind: EntityKind) -> &'static [PanelTab] {
    match kind {
        EntityKind::SchemaNode => &[PanelTab::Basic, PanelTab::Schema],
        EntityKind::SchemaProperty => &[PanelTab::Basic, PanelTab::Functions],
        EntityKind::SchemaMethod => &[PanelTab::Source, PanelTab::Basic, PanelTab::Parameters, PanelTab::Docs],
        _ => &[PanelTab::Basic],
    }
}

pub fn bound_keys(kind: EntityKind) -> impl Iterator<Item = &'static str> {
    fields_for(kind).iter().map(|f| f.key)
}
