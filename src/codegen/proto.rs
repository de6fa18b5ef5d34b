//! proto3 interface definition generator.
//!
//! Each entity becomes one message whose fields follow its properties in
//! declared order with tags `1..=n`. Relationships are not inlined: foreign
//! keys are already scalar properties, so generation never looks past the
//! entity at hand and needs no cycle detection.
//!
//! Output is a pure function of the entity list, so regenerating from an
//! unchanged snapshot is byte-identical.
//!
//! Entity names are normalised to PascalCase, so `order_line` and
//! `OrderLine` map to the same message. An entity whose message, request or
//! service names are already declared by an earlier entity is left out with
//! a warning.

use std::collections::HashSet;

use tracing::warn;

use super::format::{Indent, IndentWriter};
use crate::config::GeneratorSettings;
use crate::metadata::{DataType, EntityConfiguration, PropertyConfiguration};
use crate::naming::{dedupe, field_name, message_name, service_name};
use crate::repository::Snapshot;

const TIMESTAMP_TYPE: &str = "google.protobuf.Timestamp";
const TIMESTAMP_IMPORT: &str = "google/protobuf/timestamp.proto";

/// Generation options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtoOptions {
    /// `package` declaration; omitted when empty.
    pub package: String,
    /// Emit a header and one comment per entity message.
    pub include_comments: bool,
}

impl Default for ProtoOptions {
    fn default() -> Self {
        Self {
            package: "dynapi.entities".to_string(),
            include_comments: true,
        }
    }
}

impl From<&GeneratorSettings> for ProtoOptions {
    fn from(settings: &GeneratorSettings) -> Self {
        Self {
            package: settings.package.clone(),
            include_comments: settings.include_comments,
        }
    }
}

/// Map a declared type to its proto3 scalar (or well-known) type.
pub fn proto_type(data_type: &DataType) -> &'static str {
    match data_type {
        DataType::Bool => "bool",
        DataType::Int8 | DataType::Int16 | DataType::Int32 => "int32",
        DataType::Int64 => "int64",
        DataType::Float32 => "float",
        DataType::Float64 => "double",
        DataType::Date | DataType::Time | DataType::Timestamp | DataType::TimestampTz => {
            TIMESTAMP_TYPE
        }
        DataType::Binary => "bytes",
        _ => "string",
    }
}

/// Proto type of the `id` field in Get/Update/Delete requests.
///
/// Follows a single-column primary key; composite or missing keys use
/// `string`.
pub fn id_type(entity: &EntityConfiguration) -> &'static str {
    entity
        .single_key()
        .map(|key| proto_type(&key.data_type))
        .unwrap_or("string")
}

/// Generates proto3 text from entity metadata.
#[derive(Debug, Clone, Default)]
pub struct ProtoGenerator {
    options: ProtoOptions,
}

impl ProtoGenerator {
    pub fn new(options: ProtoOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ProtoOptions {
        &self.options
    }

    /// One complete proto3 file for a single entity.
    pub fn generate(&self, entity: &EntityConfiguration) -> String {
        self.generate_all([entity])
    }

    /// Every entity of a snapshot, in snapshot order.
    pub fn generate_snapshot(&self, snapshot: &Snapshot) -> String {
        self.generate_all(snapshot.iter().map(|e| &**e))
    }

    /// One proto3 file: package, all entity messages, then the request and
    /// response messages and the service of each entity.
    pub fn generate_all<'a, I>(&self, entities: I) -> String
    where
        I: IntoIterator<Item = &'a EntityConfiguration>,
    {
        let entities = without_name_clashes(entities);
        let mut w = IndentWriter::new(Indent::Spaces(2));

        self.write_header(&mut w, &entities);

        for entity in &entities {
            w.blank_line();
            self.write_entity_message(&mut w, entity);
        }

        for entity in &entities {
            w.blank_line();
            write_crud_messages(&mut w, entity);
            w.blank_line();
            write_service(&mut w, entity);
        }

        w.into_string()
    }

    fn write_header(&self, w: &mut IndentWriter, entities: &[&EntityConfiguration]) {
        if self.options.include_comments {
            w.write_comment("Code generated by dynapi. DO NOT EDIT.");
            w.blank_line();
        }

        w.write_line("syntax = \"proto3\";");

        if !self.options.package.is_empty() {
            w.blank_line();
            w.write_line(&format!("package {};", self.options.package));
        }

        let uses_timestamp = entities
            .iter()
            .flat_map(|e| e.properties())
            .any(|p| proto_type(&p.data_type) == TIMESTAMP_TYPE);
        if uses_timestamp {
            w.blank_line();
            w.write_line(&format!("import \"{TIMESTAMP_IMPORT}\";"));
        }
    }

    fn write_entity_message(&self, w: &mut IndentWriter, entity: &EntityConfiguration) {
        if self.options.include_comments {
            w.write_comment(&format!("Entity {}", entity.qualified_name()));
        }

        w.block(&format!("message {}", message_name(entity.name())), |w| {
            let mut taken = HashSet::new();
            for (tag, property) in (1..).zip(entity.properties()) {
                let name = dedupe(field_name(&property.name), &mut taken);
                w.write_line(&format!("{}{} {} = {};", label(property), proto_type(&property.data_type), name, tag));
            }
        });
    }
}

/// Every top-level name an entity declares in the file.
fn declared_names(entity: &EntityConfiguration) -> [String; 9] {
    let m = message_name(entity.name());
    [
        format!("Get{m}Request"),
        format!("List{m}Request"),
        format!("List{m}Response"),
        format!("Create{m}Request"),
        format!("Update{m}Request"),
        format!("Delete{m}Request"),
        format!("Delete{m}Response"),
        service_name(entity.name()),
        m,
    ]
}

/// Keep entities in order, dropping any that would redeclare a name.
fn without_name_clashes<'a, I>(entities: I) -> Vec<&'a EntityConfiguration>
where
    I: IntoIterator<Item = &'a EntityConfiguration>,
{
    let mut declared: HashSet<String> = HashSet::new();
    let mut kept = Vec::new();

    for entity in entities {
        let names = declared_names(entity);
        if let Some(clash) = names.iter().find(|name| declared.contains(name.as_str())) {
            warn!(
                entity = entity.name(),
                name = %clash,
                "proto name already declared, entity skipped"
            );
            continue;
        }
        declared.extend(names);
        kept.push(entity);
    }
    kept
}

/// `optional ` for nullable, non-key scalar fields.
fn label(property: &PropertyConfiguration) -> &'static str {
    let scalar = proto_type(&property.data_type) != TIMESTAMP_TYPE;
    if scalar && property.nullable && !property.primary_key {
        "optional "
    } else {
        ""
    }
}

fn write_crud_messages(w: &mut IndentWriter, entity: &EntityConfiguration) {
    let message = message_name(entity.name());
    let id = id_type(entity);

    w.block(&format!("message Get{message}Request"), |w| {
        w.write_line(&format!("{id} id = 1;"));
    });
    w.blank_line();
    w.block(&format!("message List{message}Request"), |w| {
        w.write_line("int32 page_number = 1;");
        w.write_line("int32 page_size = 2;");
    });
    w.blank_line();
    w.block(&format!("message List{message}Response"), |w| {
        w.write_line(&format!("repeated {message} items = 1;"));
        w.write_line("int32 total_count = 2;");
    });
    w.blank_line();
    w.block(&format!("message Create{message}Request"), |w| {
        w.write_line(&format!("{message} entity = 1;"));
    });
    w.blank_line();
    w.block(&format!("message Update{message}Request"), |w| {
        w.write_line(&format!("{id} id = 1;"));
        w.write_line(&format!("{message} entity = 2;"));
    });
    w.blank_line();
    w.block(&format!("message Delete{message}Request"), |w| {
        w.write_line(&format!("{id} id = 1;"));
    });
    w.blank_line();
    w.block(&format!("message Delete{message}Response"), |w| {
        w.write_line("bool success = 1;");
    });
}

fn write_service(w: &mut IndentWriter, entity: &EntityConfiguration) {
    let message = message_name(entity.name());

    w.block(&format!("service {}", service_name(entity.name())), |w| {
        w.write_line(&format!("rpc Get(Get{message}Request) returns ({message});"));
        w.write_line(&format!("rpc List(List{message}Request) returns (List{message}Response);"));
        w.write_line(&format!("rpc Create(Create{message}Request) returns ({message});"));
        w.write_line(&format!("rpc Update(Update{message}Request) returns ({message});"));
        w.write_line(&format!("rpc Delete(Delete{message}Request) returns (Delete{message}Response);"));
    });
}
