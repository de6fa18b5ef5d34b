#[cfg(test)]
mod tests {
    use dynapi::metadata::{
        DataType, EntityConfiguration, EntityDocument, IndexConfiguration, MetadataError,
        PropertyConfiguration, RelationshipConfiguration, RelationshipKind,
    };

    const SHOP: &str = r#"{
        "entities": [
            {
                "name": "User",
                "schema": "dbo",
                "properties": [
                    { "name": "Id", "type": "bigint", "primary_key": true, "nullable": false, "generated": true },
                    { "name": "Email", "type": "nvarchar(255)", "nullable": false, "max_length": 255 },
                    { "name": "CreatedAt", "type": "datetimeoffset" }
                ],
                "indexes": [
                    { "name": "IX_User_Email", "properties": ["Email"], "unique": true }
                ],
                "relationships": [
                    {
                        "name": "Orders",
                        "related_entity": "Order",
                        "kind": "one_to_many",
                        "foreign_keys": ["UserId"],
                        "principal_keys": ["Id"]
                    }
                ]
            },
            {
                "name": "Order",
                "properties": [
                    { "name": "Id", "type": "int", "primary_key": true, "nullable": false },
                    { "name": "UserId", "type": "bigint", "foreign_key": true, "nullable": false },
                    { "name": "Total", "type": "decimal(18,2)" },
                    { "name": "Shape", "type": "geography" }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_document_preserves_order_and_types() {
        let doc = EntityDocument::from_json(SHOP).unwrap();
        assert_eq!(doc.entities.len(), 2);

        let user = &doc.entities[0];
        assert_eq!(user.qualified_name(), "dbo.User");
        let names: Vec<_> = user.properties().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Id", "Email", "CreatedAt"]);
        assert_eq!(user.properties()[0].data_type, DataType::Int64);
        assert!(user.properties()[0].generated);
        assert_eq!(user.properties()[1].max_length, Some(255));
        assert!(user.properties()[2].nullable);
        assert!(user.indexes()[0].unique);
        assert!(user.relationships()[0].kind.is_collection());

        let order = &doc.entities[1];
        assert_eq!(order.schema(), None);
        assert_eq!(order.property("Total").unwrap().data_type, DataType::Decimal(18, 2));
        assert_eq!(
            order.property("Shape").unwrap().data_type,
            DataType::Other("geography".into())
        );
    }

    #[test]
    fn test_document_rejects_invalid_entity() {
        let json = r#"{ "entities": [ { "name": "Dup", "properties": [
            { "name": "A", "type": "int" }, { "name": "A", "type": "int" } ] } ] }"#;
        let err = EntityDocument::from_json(json).unwrap_err();
        assert!(err.to_string().contains("duplicate property 'A'"));
    }

    #[test]
    fn test_document_json_is_stable() {
        let doc = EntityDocument::from_json(SHOP).unwrap();
        let again = EntityDocument::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(doc, again);
    }

    #[test]
    fn test_single_and_composite_keys() {
        let single = EntityConfiguration::builder("Tag")
            .property(PropertyConfiguration::new("Id", DataType::Uuid).primary_key())
            .build()
            .unwrap();
        assert_eq!(single.single_key().unwrap().name, "Id");
        assert!(!single.properties()[0].nullable);

        let composite = EntityConfiguration::builder("OrderLine")
            .property(PropertyConfiguration::new("OrderId", DataType::Int32).primary_key())
            .property(PropertyConfiguration::new("Line", DataType::Int16).primary_key())
            .build()
            .unwrap();
        assert!(composite.single_key().is_none());
        assert_eq!(composite.primary_key().count(), 2);

        let keyless = EntityConfiguration::builder("Log").build().unwrap();
        assert!(keyless.single_key().is_none());
    }

    #[test]
    fn test_builder_errors() {
        assert_eq!(
            EntityConfiguration::builder("  ").build().unwrap_err(),
            MetadataError::EmptyEntityName
        );

        let err = EntityConfiguration::builder("User")
            .property(PropertyConfiguration::new("Id", DataType::Int32))
            .index(IndexConfiguration::new("IX_Missing", ["Email"]))
            .build()
            .unwrap_err();
        assert!(matches!(err, MetadataError::UnknownIndexProperty { property, .. } if property == "Email"));

        let err = EntityConfiguration::builder("Order")
            .relationship(RelationshipConfiguration::new(
                "User",
                "User",
                RelationshipKind::ManyToOne,
            ))
            .build()
            .unwrap_err();
        assert!(matches!(err, MetadataError::EmptyRelationshipKeys { .. }));
    }

    #[test]
    fn test_data_type_parsing() {
        assert_eq!(DataType::parse("BIGINT"), DataType::Int64);
        assert_eq!(DataType::parse("int8"), DataType::Int64);
        assert_eq!(DataType::parse("numeric(10,4)"), DataType::Decimal(10, 4));
        assert_eq!(DataType::parse("varchar"), DataType::String);
        assert_eq!(DataType::parse("Hierarchyid"), DataType::Other("hierarchyid".into()));
    }
}
