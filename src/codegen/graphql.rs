//! GraphQL SDL composition.
//!
//! Object types come straight from the snapshot. The `Query` and `Mutation`
//! roots are assembled from a list of [`RootFieldProvider`]s registered on the
//! [`SchemaComposer`], so extra root fields are added by registering another
//! provider rather than by editing the generator.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tracing::warn;

use super::format::{Indent, IndentWriter};
use crate::metadata::{DataType, EntityConfiguration, PropertyConfiguration};
use crate::naming::{dedupe, graph_collection_name, graph_field_name, message_name};
use crate::repository::Snapshot;

/// Map a declared type to a GraphQL named type.
pub fn graph_type(data_type: &DataType) -> &'static str {
    match data_type {
        DataType::Bool => "Boolean",
        DataType::Int8 | DataType::Int16 | DataType::Int32 => "Int",
        DataType::Int64 => "Long",
        DataType::Float32 | DataType::Float64 => "Float",
        DataType::Date | DataType::Time | DataType::Timestamp | DataType::TimestampTz => {
            "DateTime"
        }
        DataType::Uuid => "ID",
        _ => "String",
    }
}

/// Type of the `id` argument of single-entity root fields.
fn id_argument_type(entity: &EntityConfiguration) -> String {
    let named = entity
        .single_key()
        .map(|key| graph_type(&key.data_type))
        .unwrap_or("ID");
    format!("{named}!")
}

fn property_type(property: &PropertyConfiguration) -> String {
    let named = graph_type(&property.data_type);
    if property.nullable {
        named.to_string()
    } else {
        format!("{named}!")
    }
}

/// Name of the input object used by create/update mutations.
pub fn input_type_name(entity: &str) -> String {
    format!("{}Input", message_name(entity))
}

/// One argument of a root field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: String,
    pub type_ref: String,
}

impl Argument {
    pub fn new(name: impl Into<String>, type_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_ref: type_ref.into(),
        }
    }
}

/// A field on `Query` or `Mutation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootField {
    pub name: String,
    pub arguments: Vec<Argument>,
    pub type_ref: String,
    pub description: Option<String>,
}

impl RootField {
    pub fn new(name: impl Into<String>, type_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            type_ref: type_ref.into(),
            description: None,
        }
    }

    pub fn argument(mut self, name: impl Into<String>, type_ref: impl Into<String>) -> Self {
        self.arguments.push(Argument::new(name, type_ref));
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn signature(&self) -> String {
        if self.arguments.is_empty() {
            return format!("{}: {}", self.name, self.type_ref);
        }
        let args: Vec<String> = self
            .arguments
            .iter()
            .map(|a| format!("{}: {}", a.name, a.type_ref))
            .collect();
        format!("{}({}): {}", self.name, args.join(", "), self.type_ref)
    }
}

/// Contributes root fields for a snapshot.
pub trait RootFieldProvider: Send + Sync {
    fn name(&self) -> &str;

    fn query_fields(&self, snapshot: &Snapshot) -> Vec<RootField>;

    fn mutation_fields(&self, _snapshot: &Snapshot) -> Vec<RootField> {
        Vec::new()
    }
}

/// Get/list queries and create/update/delete mutations for every entity.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrudFieldProvider;

impl RootFieldProvider for CrudFieldProvider {
    fn name(&self) -> &str {
        "crud"
    }

    fn query_fields(&self, snapshot: &Snapshot) -> Vec<RootField> {
        snapshot
            .iter()
            .flat_map(|entity| {
                let type_name = message_name(entity.name());
                [
                    RootField::new(graph_field_name(entity.name()), type_name.clone())
                        .argument("id", id_argument_type(entity))
                        .describe(format!("Fetch one {type_name} by key.")),
                    RootField::new(graph_collection_name(entity.name()), format!("[{type_name}!]!"))
                        .argument("pageNumber", "Int")
                        .argument("pageSize", "Int")
                        .describe(format!("List {type_name} records, one page at a time.")),
                ]
            })
            .collect()
    }

    fn mutation_fields(&self, snapshot: &Snapshot) -> Vec<RootField> {
        snapshot
            .iter()
            .flat_map(|entity| {
                let type_name = message_name(entity.name());
                let input = format!("{}!", input_type_name(entity.name()));
                let id = id_argument_type(entity);
                [
                    RootField::new(format!("create{type_name}"), format!("{type_name}!"))
                        .argument("input", input.clone()),
                    RootField::new(format!("update{type_name}"), type_name.clone())
                        .argument("id", id.clone())
                        .argument("input", input),
                    RootField::new(format!("delete{type_name}"), "Boolean!").argument("id", id),
                ]
            })
            .collect()
    }
}

/// Assembles an SDL document from a snapshot and registered providers.
pub struct SchemaComposer {
    providers: Vec<Arc<dyn RootFieldProvider>>,
    include_comments: bool,
}

impl SchemaComposer {
    /// A composer with no providers.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            include_comments: true,
        }
    }

    /// A composer with the CRUD provider registered.
    pub fn with_crud() -> Self {
        Self::new().with_provider(Arc::new(CrudFieldProvider))
    }

    pub fn with_provider(mut self, provider: Arc<dyn RootFieldProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn register(&mut self, provider: Arc<dyn RootFieldProvider>) {
        self.providers.push(provider);
    }

    pub fn include_comments(mut self, include: bool) -> Self {
        self.include_comments = include;
        self
    }

    /// Render the schema for `snapshot`.
    pub fn compose(&self, snapshot: &Snapshot) -> String {
        let query = self.collect(snapshot, "Query", |p, s| p.query_fields(s));
        let mutation = self.collect(snapshot, "Mutation", |p, s| p.mutation_fields(s));

        let mut w = IndentWriter::new(Indent::Spaces(2)).with_comment_prefix("#");
        if self.include_comments {
            w.write_comment("Code generated by dynapi. DO NOT EDIT.");
            w.blank_line();
        }

        for scalar in custom_scalars(snapshot, query.iter().chain(&mutation)) {
            w.write_line(&format!("scalar {scalar}"));
        }

        for entity in snapshot.iter() {
            w.blank_line();
            write_object_type(&mut w, snapshot, entity);
            w.blank_line();
            write_input_type(&mut w, entity);
        }

        w.blank_line();
        if query.is_empty() {
            // a schema must have a query root
            w.block("type Query", |w| w.write_line("_empty: Boolean"));
        } else {
            self.write_root(&mut w, "Query", &query);
        }

        if !mutation.is_empty() {
            w.blank_line();
            self.write_root(&mut w, "Mutation", &mutation);
        }

        w.into_string()
    }

    fn collect(
        &self,
        snapshot: &Snapshot,
        root: &str,
        fields: impl Fn(&dyn RootFieldProvider, &Snapshot) -> Vec<RootField>,
    ) -> Vec<RootField> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for provider in &self.providers {
            for field in fields(provider.as_ref(), snapshot) {
                if seen.insert(field.name.clone()) {
                    out.push(field);
                } else {
                    warn!(provider = provider.name(), root, field = %field.name, "duplicate root field ignored");
                }
            }
        }
        out
    }

    fn write_root(&self, w: &mut IndentWriter, root: &str, fields: &[RootField]) {
        let include_comments = self.include_comments;
        w.block(&format!("type {root}"), |w| {
            for field in fields {
                if let (true, Some(description)) = (include_comments, &field.description) {
                    w.write_comment(description);
                }
                w.write_line(&field.signature());
            }
        });
    }
}

impl Default for SchemaComposer {
    fn default() -> Self {
        Self::with_crud()
    }
}

fn write_object_type(w: &mut IndentWriter, snapshot: &Snapshot, entity: &EntityConfiguration) {
    w.block(&format!("type {}", message_name(entity.name())), |w| {
        let mut taken = HashSet::new();
        for property in entity.properties() {
            let name = dedupe(graph_field_name(&property.name), &mut taken);
            w.write_line(&format!("{}: {}", name, property_type(property)));
        }

        for relationship in entity.relationships() {
            // navigation only to entities that exist in this snapshot
            let Some(related) = snapshot.get(&relationship.related_entity) else {
                continue;
            };
            let related = message_name(related.name());
            let type_ref = if relationship.kind.is_collection() {
                format!("[{related}!]!")
            } else if relationship.required {
                format!("{related}!")
            } else {
                related
            };
            let name = dedupe(graph_field_name(&relationship.name), &mut taken);
            w.write_line(&format!("{name}: {type_ref}"));
        }
    });
}

fn write_input_type(w: &mut IndentWriter, entity: &EntityConfiguration) {
    w.block(&format!("input {}", input_type_name(entity.name())), |w| {
        let mut taken = HashSet::new();
        for property in entity.properties().iter().filter(|p| !p.generated) {
            let name = dedupe(graph_field_name(&property.name), &mut taken);
            w.write_line(&format!("{}: {}", name, property_type(property)));
        }
    });
}

/// Non-builtin scalars referenced anywhere in the document.
fn custom_scalars<'a>(
    snapshot: &Snapshot,
    fields: impl Iterator<Item = &'a RootField>,
) -> BTreeSet<&'static str> {
    const CUSTOM: [&str; 2] = ["DateTime", "Long"];

    let mut used: BTreeSet<&'static str> = snapshot
        .iter()
        .flat_map(|e| e.properties())
        .map(|p| graph_type(&p.data_type))
        .filter(|t| CUSTOM.contains(t))
        .collect();

    for field in fields {
        let refs = field
            .arguments
            .iter()
            .map(|a| a.type_ref.as_str())
            .chain([field.type_ref.as_str()]);
        for type_ref in refs {
            let named = type_ref.trim_matches(|c| c == '[' || c == ']' || c == '!');
            if let Some(&scalar) = CUSTOM.iter().find(|s| **s == named) {
                used.insert(scalar);
            }
        }
    }

    used
}
