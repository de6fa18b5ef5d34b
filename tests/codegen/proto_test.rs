use dynapi::codegen::{ProtoGenerator, ProtoOptions};
use dynapi::metadata::{
    DataType, EntityConfiguration, PropertyConfiguration, RelationshipConfiguration,
    RelationshipKind,
};
use dynapi::repository::EntityRepository;
use insta::assert_snapshot;

fn shop() -> Vec<EntityConfiguration> {
    let user = EntityConfiguration::builder("User")
        .property(PropertyConfiguration::new("Id", DataType::Int64).primary_key())
        .property(PropertyConfiguration::new("Name", DataType::Varchar(100)).required())
        .relationship(
            RelationshipConfiguration::new("Orders", "Order", RelationshipKind::OneToMany)
                .key("UserId", "Id"),
        )
        .build()
        .unwrap();
    let order = EntityConfiguration::builder("Order")
        .property(PropertyConfiguration::new("Id", DataType::Int32).primary_key())
        .property(
            PropertyConfiguration::new("UserId", DataType::Int64)
                .foreign_key()
                .required(),
        )
        .build()
        .unwrap();
    vec![user, order]
}

fn generator() -> ProtoGenerator {
    ProtoGenerator::new(ProtoOptions {
        package: "shop.v1".to_string(),
        include_comments: true,
    })
}

#[test]
fn shop_proto() {
    let entities = shop();
    let proto = generator().generate_all(&entities);
    assert_snapshot!(proto);
}

#[test]
fn snapshot_output_matches_entity_list() {
    let repo = EntityRepository::new();
    repo.replace(shop()).unwrap();

    let from_snapshot = generator().generate_snapshot(&repo.snapshot());
    let from_list = generator().generate_all(&shop());
    assert_eq!(from_snapshot, from_list);
}

#[test]
fn single_entity_is_a_complete_file() {
    let entities = shop();
    let proto = generator().generate(&entities[1]);

    assert!(proto.contains("syntax = \"proto3\";"));
    assert!(proto.contains("package shop.v1;"));
    assert!(proto.contains("message Order {"));
    assert!(proto.contains("service OrderService {"));
    assert!(!proto.contains("message User {"));
    assert!(proto.contains("message GetOrderRequest {\n  int32 id = 1;\n}"));
}

#[test]
fn empty_package_is_omitted() {
    let generator = ProtoGenerator::new(ProtoOptions {
        package: String::new(),
        include_comments: false,
    });
    let proto = generator.generate_all(&shop());
    assert!(!proto.contains("package"));
}

#[test]
fn empty_input_has_only_header() {
    let proto = generator().generate_all(&Vec::<EntityConfiguration>::new());
    assert_eq!(
        proto,
        "// Code generated by dynapi. DO NOT EDIT.\n\nsyntax = \"proto3\";\n\npackage shop.v1;\n"
    );
}
