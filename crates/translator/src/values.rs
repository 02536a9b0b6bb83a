//! Runtime value shaping: upstream JSON into GraphQL field values, GraphQL
//! arguments back into the JSON the upstream service speaks.

use async_graphql::{dynamic::FieldValue, Name, Value};

use crate::types::{DefinitionId, TargetKind, TypeRegistry};

pub(crate) fn json_to_graphql_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(value) => Value::Boolean(value),
        serde_json::Value::Number(value) => Value::Number(value),
        serde_json::Value::String(value) => Value::String(value),
        serde_json::Value::Array(values) => {
            Value::List(values.into_iter().map(json_to_graphql_value).collect())
        }
        serde_json::Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (Name::new(key), json_to_graphql_value(value)))
                .collect(),
        ),
    }
}

/// Shapes a decoded upstream value into the field value the GraphQL engine
/// expects for `definition`: list items are shaped element-wise, union values
/// are tagged with the member type they belong to, enum literals are mapped
/// to their GraphQL identifiers.
pub(crate) fn output_field_value(
    registry: &TypeRegistry,
    id: DefinitionId,
    value: Value,
) -> Option<FieldValue<'static>> {
    if matches!(value, Value::Null) {
        return None;
    }

    let definition = &registry[id];
    match definition.kind {
        TargetKind::List => {
            let Some(item) = definition.item else {
                return Some(FieldValue::from(value));
            };
            match value {
                Value::List(values) => Some(FieldValue::list(values.into_iter().map(|value| {
                    output_field_value(registry, item, value).unwrap_or(FieldValue::NULL)
                }))),
                other => Some(FieldValue::from(other)),
            }
        }
        TargetKind::Union => {
            let member = match &value {
                Value::Object(map) => resolve_union_member(registry, id, map),
                _ => None,
            };
            let field_value = FieldValue::from(value);
            match member {
                Some(member) => {
                    Some(field_value.with_type(registry[member].type_name.clone()))
                }
                None => Some(field_value),
            }
        }
        TargetKind::Enum => {
            let literal = literal_form(&value)?;
            definition
                .enum_values
                .iter()
                .find(|candidate| candidate.literal == literal)
                .map(|candidate| {
                    FieldValue::value(Value::Enum(Name::new(&candidate.identifier)))
                })
        }
        _ => Some(FieldValue::from(value)),
    }
}

/// The first union member whose declared property names are all present in
/// the runtime value. Members with overlapping property sets are ambiguous;
/// that ambiguity belongs to the upstream schema, not the gateway.
fn resolve_union_member(
    registry: &TypeRegistry,
    union: DefinitionId,
    map: &async_graphql::indexmap::IndexMap<Name, Value>,
) -> Option<DefinitionId> {
    registry[union].members.iter().copied().find(|member| {
        let member = &registry[*member];
        member.kind == TargetKind::Object
            && member.fields.keys().all(|field| map.contains_key(field.as_str()))
    })
}

fn literal_form(value: &Value) -> Option<String> {
    match value {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        Value::Boolean(value) => Some(value.to_string()),
        _ => None,
    }
}

/// Walks an argument value, replacing GraphQL enum identifiers with the
/// literals the upstream service declared. Everything else passes through
/// untouched.
pub(crate) fn input_json(
    registry: &TypeRegistry,
    id: DefinitionId,
    value: serde_json::Value,
) -> serde_json::Value {
    let definition = &registry[id];
    match definition.kind {
        TargetKind::Enum => {
            if let serde_json::Value::String(identifier) = &value {
                if let Some(candidate) = definition
                    .enum_values
                    .iter()
                    .find(|candidate| &candidate.identifier == identifier)
                {
                    return serde_json::Value::String(candidate.literal.clone());
                }
            }
            value
        }
        TargetKind::List => match (definition.item, value) {
            (Some(item), serde_json::Value::Array(values)) => serde_json::Value::Array(
                values
                    .into_iter()
                    .map(|value| input_json(registry, item, value))
                    .collect(),
            ),
            (_, value) => value,
        },
        TargetKind::Object => match value {
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(key, value)| match definition.fields.get(&key) {
                        Some(child) => {
                            let value = input_json(registry, *child, value);
                            (key, value)
                        }
                        None => (key, value),
                    })
                    .collect(),
            ),
            value => value,
        },
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_builder::TypeBuilder;
    use crate::types::SchemaNames;
    use serde_json::json;

    fn builder_document(schemas: serde_json::Value) -> openapiv3::OpenAPI {
        serde_json::from_value(json!({
            "openapi": "3.0.0",
            "info": {"title": "test", "version": "1.0.0"},
            "paths": {},
            "components": {"schemas": schemas}
        }))
        .unwrap()
    }

    fn graphql(value: serde_json::Value) -> Value {
        json_to_graphql_value(value)
    }

    #[test]
    fn union_values_resolve_to_the_first_member_with_all_properties_present() {
        let document = builder_document(json!({
            "CatMember": {"type": "object", "properties": {"catBreed": {"type": "string"}}},
            "DogMember": {"type": "object", "properties": {"dogBreed": {"type": "string"}}}
        }));
        let mut builder = TypeBuilder::new(&document);
        let union = builder
            .create_data_definition(
                &openapiv3::ReferenceOr::Item(
                    serde_json::from_value(json!({
                        "oneOf": [
                            {"$ref": "#/components/schemas/CatMember"},
                            {"$ref": "#/components/schemas/DogMember"}
                        ]
                    }))
                    .unwrap(),
                ),
                SchemaNames::default(),
                "/breeds",
                false,
            )
            .unwrap();
        let registry = builder.into_registry();

        let Value::Object(cat) = graphql(json!({"catBreed": "Sphynx"})) else {
            panic!("expected an object")
        };
        let member = resolve_union_member(&registry, union, &cat).unwrap();
        assert_eq!(registry[member].type_name, "CatMember");

        let Value::Object(dog) = graphql(json!({"dogBreed": "Labrador"})) else {
            panic!("expected an object")
        };
        let member = resolve_union_member(&registry, union, &dog).unwrap();
        assert_eq!(registry[member].type_name, "DogMember");

        let Value::Object(neither) = graphql(json!({"fishBreed": "Koi"})) else {
            panic!("expected an object")
        };
        assert!(resolve_union_member(&registry, union, &neither).is_none());
    }

    #[test]
    fn enum_literals_map_to_identifiers_and_back() {
        let document = builder_document(json!({}));
        let mut builder = TypeBuilder::new(&document);
        let status = builder
            .create_data_definition(
                &openapiv3::ReferenceOr::Item(
                    serde_json::from_value(json!({"type": "string", "enum": ["available", "sold"]}))
                        .unwrap(),
                ),
                SchemaNames {
                    from_schema: Some("Status".into()),
                    ..SchemaNames::default()
                },
                "/",
                false,
            )
            .unwrap();
        let registry = builder.into_registry();

        // Upstream literal surfaces as the GraphQL identifier.
        let value = output_field_value(&registry, status, Value::String("available".into()));
        assert!(value.is_some());

        // Unknown literals resolve to null rather than leaking through.
        let value = output_field_value(&registry, status, Value::String("hidden".into()));
        assert!(value.is_none());

        // The argument direction restores the declared literal.
        assert_eq!(
            input_json(&registry, status, json!("SOLD")),
            json!("sold")
        );
    }

    #[test]
    fn input_mapping_reaches_through_objects_and_lists() {
        let document = builder_document(json!({
            "Filter": {
                "type": "object",
                "properties": {
                    "statuses": {
                        "type": "array",
                        "items": {"type": "string", "enum": ["on sale", "archived"]}
                    }
                }
            }
        }));
        let mut builder = TypeBuilder::new(&document);
        let filter = builder
            .create_data_definition(
                &openapiv3::ReferenceOr::Reference {
                    reference: "#/components/schemas/Filter".into(),
                },
                SchemaNames::default(),
                "/",
                false,
            )
            .unwrap();
        let registry = builder.into_registry();

        assert_eq!(
            input_json(&registry, filter, json!({"statuses": ["ONSALE"], "extra": 1})),
            json!({"statuses": ["on sale"], "extra": 1})
        );
    }
}
