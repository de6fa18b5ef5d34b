use std::sync::Arc;

use dynapi::codegen::{RootField, RootFieldProvider, SchemaComposer};
use dynapi::metadata::{
    DataType, EntityConfiguration, PropertyConfiguration, RelationshipConfiguration,
    RelationshipKind,
};
use dynapi::repository::{EntityRepository, Snapshot};

fn shop() -> Arc<Snapshot> {
    let user = EntityConfiguration::builder("User")
        .property(
            PropertyConfiguration::new("Id", DataType::Int64)
                .primary_key()
                .generated(),
        )
        .property(PropertyConfiguration::new("Name", DataType::Varchar(100)).required())
        .property(PropertyConfiguration::new("CreatedAt", DataType::TimestampTz))
        .relationship(
            RelationshipConfiguration::new("Orders", "Order", RelationshipKind::OneToMany)
                .key("UserId", "Id"),
        )
        .relationship(
            RelationshipConfiguration::new("Avatar", "Image", RelationshipKind::OneToOne)
                .key("AvatarId", "Id"),
        )
        .build()
        .unwrap();
    let order = EntityConfiguration::builder("Order")
        .property(PropertyConfiguration::new("Id", DataType::Int32).primary_key())
        .property(PropertyConfiguration::new("UserId", DataType::Int64).required())
        .relationship(
            RelationshipConfiguration::new("User", "User", RelationshipKind::ManyToOne)
                .key("UserId", "Id")
                .required(),
        )
        .build()
        .unwrap();

    let repo = EntityRepository::new();
    repo.replace([user, order]).unwrap()
}

fn bare() -> SchemaComposer {
    SchemaComposer::with_crud().include_comments(false)
}

struct SearchFields;

impl RootFieldProvider for SearchFields {
    fn name(&self) -> &str {
        "search"
    }

    fn query_fields(&self, snapshot: &Snapshot) -> Vec<RootField> {
        let mut fields = vec![RootField::new("search", "[String!]!").argument("text", "String!")];
        if snapshot.get("User").is_some() {
            // collides with the CRUD field and is dropped
            fields.push(RootField::new("users", "Int"));
        }
        fields
    }
}

#[test]
fn test_object_and_input_types() {
    let sdl = bare().compose(&shop());

    assert!(sdl.contains(
        "type User {\n  id: Long!\n  name: String!\n  createdAt: DateTime\n  orders: [Order!]!\n}\n"
    ));
    assert!(sdl.contains("input UserInput {\n  name: String!\n  createdAt: DateTime\n}\n"));
    assert!(sdl.contains("type Order {\n  id: Int!\n  userId: Long!\n  user: User!\n}\n"));
    assert!(!sdl.contains("avatar"));
}

#[test]
fn test_scalars_declared_once_and_sorted() {
    let sdl = bare().compose(&shop());
    assert!(sdl.starts_with("scalar DateTime\nscalar Long\n"));
    assert_eq!(sdl.matches("scalar Long").count(), 1);
}

#[test]
fn test_crud_root_fields() {
    let sdl = bare().compose(&shop());

    assert!(sdl.contains("  user(id: Long!): User\n"));
    assert!(sdl.contains("  users(pageNumber: Int, pageSize: Int): [User!]!\n"));
    assert!(sdl.contains("  order(id: Int!): Order\n"));
    assert!(sdl.contains("  orders(pageNumber: Int, pageSize: Int): [Order!]!\n"));

    assert!(sdl.contains("type Mutation {\n"));
    assert!(sdl.contains("  createUser(input: UserInput!): User!\n"));
    assert!(sdl.contains("  updateUser(id: Long!, input: UserInput!): User\n"));
    assert!(sdl.contains("  deleteOrder(id: Int!): Boolean!\n"));
}

#[test]
fn test_registered_provider_extends_query_root() {
    let composer = bare().with_provider(Arc::new(SearchFields));
    let sdl = composer.compose(&shop());

    assert!(sdl.contains("  search(text: String!): [String!]!\n"));
    assert!(!sdl.contains("  users: Int\n"));
}

#[test]
fn test_empty_snapshot() {
    let empty = EntityRepository::new().snapshot();
    let sdl = bare().compose(&empty);

    assert!(sdl.contains("type Query {\n  _empty: Boolean\n}\n"));
    assert!(!sdl.contains("Mutation"));
    assert!(!sdl.contains("scalar"));
}

#[test]
fn test_descriptions_follow_comment_setting() {
    let sdl = SchemaComposer::default().compose(&shop());
    assert!(sdl.starts_with("# Code generated by dynapi. DO NOT EDIT."));
    assert!(sdl.contains("  # Fetch one User by key.\n  user(id: Long!): User\n"));
}
