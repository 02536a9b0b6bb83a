//! Materialises the Data Definition registry into `async_graphql::dynamic`
//! types and assembles the executable schema.

use std::collections::HashSet;
use std::sync::Arc;

use async_graphql::dynamic::{
    Enum, EnumItem, Field, FieldFuture, InputObject, InputValue, Object, Scalar, Schema, Type,
    TypeRef, Union,
};
use async_graphql::Value;
use indexmap::IndexMap;

use crate::{
    operations::{OperationKind, OperationPlan},
    types::{DataDefinition, DefinitionId, TargetKind, TypeRegistry},
    values, Error,
};

/// The catch-all scalar used wherever OpenAPI cannot be statically typed.
pub(crate) const JSON_SCALAR: &str = "JSON";

pub(crate) fn build_schema(
    registry: &Arc<TypeRegistry>,
    plans: Vec<OperationPlan>,
    client: reqwest::Client,
) -> Result<Schema, Error> {
    let has_query = plans.iter().any(|plan| plan.kind == OperationKind::Query);
    let has_mutation = plans.iter().any(|plan| plan.kind == OperationKind::Mutation);
    if !has_query && !has_mutation {
        return Err(Error::EmptySchema);
    }

    let mut builder = Schema::build("Query", has_mutation.then_some("Mutation"), None);
    builder = builder.register(Scalar::new(JSON_SCALAR));

    for ty in registry_types(registry) {
        builder = builder.register(ty);
    }

    let mut query = Object::new("Query");
    let mut mutation = Object::new("Mutation");
    for plan in plans {
        let kind = plan.kind;
        let field = root_field(plan, registry, &client);
        match kind {
            OperationKind::Query => query = query.field(field),
            OperationKind::Mutation => mutation = mutation.field(field),
        }
    }

    if has_query {
        builder = builder.register(query);
    }
    if has_mutation {
        builder = builder.register(mutation);
    }

    builder
        .finish()
        .map_err(|error| Error::SchemaBuild(error.to_string()))
}

fn registry_types(registry: &Arc<TypeRegistry>) -> Vec<Type> {
    let mut types = Vec::new();
    for (_, id) in registry.named_definitions() {
        let definition = &registry[id];
        match definition.kind {
            TargetKind::Object => {
                types.push(object_type(registry, id).into());
                types.push(input_object_type(registry, id).into());
            }
            TargetKind::Enum => types.push(enum_type(definition).into()),
            TargetKind::Union => types.push(union_type(registry, definition).into()),
            // Lists and scalars materialise as type references only.
            _ => {}
        }
    }
    types
}

fn object_type(registry: &Arc<TypeRegistry>, id: DefinitionId) -> Object {
    let definition = &registry[id];
    let mut object = Object::new(definition.type_name.clone());
    for (property, child) in &definition.fields {
        object = object.field(property_field(registry, property.clone(), *child));
    }
    object
}

/// A field of a translated object reads the matching property out of the
/// parent's decoded JSON value.
fn property_field(registry: &Arc<TypeRegistry>, property: String, child: DefinitionId) -> Field {
    let type_ref = output_type_ref(registry, child);
    let registry = Arc::clone(registry);
    Field::new(property.clone(), type_ref, move |ctx| {
        let value = ctx.parent_value.as_value().and_then(|parent| match parent {
            Value::Object(map) => map.get(property.as_str()).cloned(),
            _ => None,
        });
        FieldFuture::Value(value.and_then(|value| values::output_field_value(&registry, child, value)))
    })
}

fn input_object_type(registry: &TypeRegistry, id: DefinitionId) -> InputObject {
    let definition = &registry[id];
    let mut input = InputObject::new(definition.input_type_name.clone());
    for (property, child) in &definition.fields {
        input = input.field(InputValue::new(property.clone(), input_type_ref(registry, *child)));
    }
    input
}

fn enum_type(definition: &DataDefinition) -> Enum {
    Enum::new(definition.type_name.clone()).items(
        definition
            .enum_values
            .iter()
            .map(|value| EnumItem::new(value.identifier.clone())),
    )
}

fn union_type(registry: &TypeRegistry, definition: &DataDefinition) -> Union {
    let mut union = Union::new(definition.type_name.clone());
    let mut seen = HashSet::new();
    for member in &definition.members {
        let member = &registry[*member];
        if member.kind != TargetKind::Object || !seen.insert(member.type_name.clone()) {
            continue;
        }
        union = union.possible_type(member.type_name.clone());
    }
    union
}

/// The output `TypeRef` of a definition. The required flag wraps the final
/// type, so non-null is always the outermost wrapper; list items carry their
/// own flag.
pub(crate) fn output_type_ref(registry: &TypeRegistry, id: DefinitionId) -> TypeRef {
    let definition = &registry[id];
    let base = match definition.kind {
        TargetKind::Object | TargetKind::Enum | TargetKind::Union => {
            TypeRef::named(definition.type_name.clone())
        }
        TargetKind::List => TypeRef::List(Box::new(
            definition
                .item
                .map(|item| output_type_ref(registry, item))
                .unwrap_or_else(|| TypeRef::named(JSON_SCALAR)),
        )),
        TargetKind::String => TypeRef::named(TypeRef::STRING),
        TargetKind::Integer => TypeRef::named(TypeRef::INT),
        TargetKind::Float => TypeRef::named(TypeRef::FLOAT),
        TargetKind::Boolean => TypeRef::named(TypeRef::BOOLEAN),
        TargetKind::Json | TargetKind::Unknown => TypeRef::named(JSON_SCALAR),
    };
    wrap_required(base, definition.required)
}

/// The input `TypeRef` of a definition. Objects point at their `Input`
/// counterpart; a union's input form degenerates to the JSON scalar.
pub(crate) fn input_type_ref(registry: &TypeRegistry, id: DefinitionId) -> TypeRef {
    let definition = &registry[id];
    let base = match definition.kind {
        TargetKind::Object => TypeRef::named(definition.input_type_name.clone()),
        TargetKind::Enum => TypeRef::named(definition.type_name.clone()),
        TargetKind::Union => TypeRef::named(JSON_SCALAR),
        TargetKind::List => TypeRef::List(Box::new(
            definition
                .item
                .map(|item| input_type_ref(registry, item))
                .unwrap_or_else(|| TypeRef::named(JSON_SCALAR)),
        )),
        TargetKind::String => TypeRef::named(TypeRef::STRING),
        TargetKind::Integer => TypeRef::named(TypeRef::INT),
        TargetKind::Float => TypeRef::named(TypeRef::FLOAT),
        TargetKind::Boolean => TypeRef::named(TypeRef::BOOLEAN),
        TargetKind::Json | TargetKind::Unknown => TypeRef::named(JSON_SCALAR),
    };
    wrap_required(base, definition.required)
}

fn wrap_required(type_ref: TypeRef, required: bool) -> TypeRef {
    if required {
        TypeRef::NonNull(Box::new(type_ref))
    } else {
        type_ref
    }
}

/// One root field: argument values are snapshotted into plain JSON, the
/// operation's HTTP resolver runs, and the decoded response is shaped into
/// the field's declared type.
fn root_field(plan: OperationPlan, registry: &Arc<TypeRegistry>, client: &reqwest::Client) -> Field {
    let OperationPlan {
        name,
        description,
        arguments,
        type_ref,
        resolver,
        ..
    } = plan;

    let resolver = Arc::new(resolver);
    let registry = Arc::clone(registry);
    let client = client.clone();

    let mut field = Field::new(name, type_ref, move |ctx| {
        let registry = Arc::clone(&registry);
        let resolver = Arc::clone(&resolver);
        let client = client.clone();

        let mut args = IndexMap::new();
        for (argument, definition) in resolver.argument_bindings() {
            let Some(accessor) = ctx.args.get(argument) else {
                continue;
            };
            let Ok(value) = accessor.deserialize::<serde_json::Value>() else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            args.insert(
                argument.to_string(),
                values::input_json(&registry, definition, value),
            );
        }

        FieldFuture::new(async move {
            let data = resolver
                .resolve(&client, &args)
                .await
                .map_err(|error| async_graphql::Error::new(error.to_string()))?;
            Ok(values::output_field_value(
                &registry,
                resolver.response,
                values::json_to_graphql_value(data),
            ))
        })
    });

    for argument in arguments {
        let mut input = InputValue::new(argument.name, argument.type_ref);
        if let Some(description) = argument.description {
            input = input.description(description);
        }
        field = field.argument(input);
    }
    if let Some(description) = description {
        field = field.description(description);
    }
    field
}
