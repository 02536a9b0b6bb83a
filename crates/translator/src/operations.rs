//! Walks the document's paths × methods and produces one root-field plan per
//! representable operation. Operations that cannot be represented are
//! skipped with a logged cause; the translation carries on.

use async_graphql::dynamic::TypeRef;
use openapiv3::{OpenAPI, Operation, Parameter, ParameterSchemaOrContent, PathItem};
use tracing::{info, warn};

use crate::{
    document::{self, HttpMethod},
    naming, output,
    resolver::{HttpResolver, ParameterBinding, RequestBodyBinding},
    type_builder::TypeBuilder,
    types::SchemaNames,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OperationKind {
    Query,
    Mutation,
}

pub(crate) struct OperationPlan {
    pub name: String,
    pub description: Option<String>,
    pub kind: OperationKind,
    pub arguments: Vec<ArgumentPlan>,
    pub type_ref: TypeRef,
    pub resolver: HttpResolver,
}

pub(crate) struct ArgumentPlan {
    pub name: String,
    pub type_ref: TypeRef,
    pub description: Option<String>,
}

pub(crate) fn translate_operations(
    document: &OpenAPI,
    server_url: &str,
    builder: &mut TypeBuilder<'_>,
) -> Vec<OperationPlan> {
    let mut plans: Vec<OperationPlan> = Vec::new();

    for (path, item) in &document.paths.paths {
        let Some(item) = item.as_item() else {
            warn!("Skipping {path}. Path items behind a reference are unsupported");
            continue;
        };

        for method in HttpMethod::ALL {
            let Some(operation) = method.operation(item) else {
                continue;
            };

            let name_source = operation
                .operation_id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| naming::infer_resource_name_from_path(path));
            let field_name = naming::to_camel_case(&name_source);
            if field_name.is_empty() {
                warn!("Skipping {method} {path}. No operation name could be derived");
                continue;
            }

            let Some(plan) = translate_operation(
                document, server_url, builder, path, item, method, operation, &field_name,
            ) else {
                continue;
            };

            // graphql-go overwrote silently here; a dynamic object rejects
            // duplicate fields, so the first definition wins.
            if plans
                .iter()
                .any(|existing| existing.kind == plan.kind && existing.name == plan.name)
            {
                warn!("Skipping {field_name}. A field with that name already exists");
                continue;
            }

            info!("Added field: {field_name}");
            plans.push(plan);
        }
        info!("Path processed: {path}");
    }

    plans
}

#[allow(clippy::too_many_arguments)]
fn translate_operation(
    document: &OpenAPI,
    server_url: &str,
    builder: &mut TypeBuilder<'_>,
    path: &str,
    item: &PathItem,
    method: HttpMethod,
    operation: &Operation,
    field_name: &str,
) -> Option<OperationPlan> {
    let Some(response) = document::success_response(document, operation) else {
        warn!("Skipping {field_name}. Success status code not found");
        return None;
    };
    let Some(response_schema) = document::response_content(response) else {
        warn!("Skipping {field_name}. Response content not found");
        return None;
    };

    let kind = if method == HttpMethod::Get {
        OperationKind::Query
    } else {
        OperationKind::Mutation
    };

    let mut arguments = Vec::new();
    let mut path_parameters = Vec::new();
    let mut query_parameters = Vec::new();

    for parameter in item.parameters.iter().chain(&operation.parameters) {
        let parameter = match document::resolve_parameter(document, parameter) {
            Ok(parameter) => parameter,
            Err(error) => {
                warn!("Skipping parameter on {field_name}. {error}");
                continue;
            }
        };
        let (data, is_path) = match parameter {
            Parameter::Path { parameter_data, .. } => (parameter_data, true),
            Parameter::Query { parameter_data, .. } => (parameter_data, false),
            Parameter::Header { parameter_data, .. } | Parameter::Cookie { parameter_data, .. } => {
                warn!(
                    "Skipping parameter {} on {field_name}. Only path and query parameters are supported",
                    parameter_data.name
                );
                continue;
            }
        };

        let schema_ref = match &data.format {
            ParameterSchemaOrContent::Schema(schema) => Some(schema.clone()),
            ParameterSchemaOrContent::Content(content) => content
                .get("application/json")
                .and_then(|media| media.schema.clone()),
        };
        let Some(schema_ref) = schema_ref else {
            warn!("Skipping {field_name}. Parameter schema not found");
            continue;
        };

        let argument = naming::to_camel_case(&data.name);
        let names = SchemaNames {
            from_schema: Some(argument.clone()),
            ..SchemaNames::default()
        };
        let definition =
            match builder.create_data_definition(&schema_ref, names, path, data.required) {
                Ok(definition) => definition,
                Err(error) => {
                    warn!("Skipping parameter {} on {field_name}. {error}", data.name);
                    continue;
                }
            };

        arguments.push(ArgumentPlan {
            name: argument.clone(),
            type_ref: output::input_type_ref(builder.registry(), definition),
            description: data.description.clone(),
        });
        let binding = ParameterBinding {
            argument,
            name: data.name.clone(),
            definition,
        };
        if is_path {
            path_parameters.push(binding);
        } else {
            query_parameters.push(binding);
        }
    }

    let mut request_body = None;
    if let Some(body_ref) = &operation.request_body {
        let body = match document::resolve_request_body(document, body_ref) {
            Ok(body) => body,
            Err(error) => {
                warn!("Skipping {field_name}. {error}");
                return None;
            }
        };
        let Some((content_type, schema_ref)) = document::request_content(body) else {
            warn!("Skipping {field_name}. Request content not found");
            return None;
        };
        let (resolved, reference) = match document::resolve_schema(document, schema_ref) {
            Ok(resolved) => resolved,
            Err(error) => {
                warn!("Skipping {field_name}. {error}");
                return None;
            }
        };
        let names = SchemaNames {
            from_ref: reference,
            from_schema: resolved.schema_data.title.clone(),
            from_path: Some(naming::infer_resource_name_from_path(path)),
        };
        let definition =
            match builder.create_data_definition(schema_ref, names, path, body.required) {
                Ok(definition) => definition,
                Err(error) => {
                    warn!("Skipping {field_name}. {error}");
                    return None;
                }
            };

        let argument = naming::to_camel_case(&builder.registry()[definition].input_type_name);
        arguments.push(ArgumentPlan {
            name: argument.clone(),
            type_ref: output::input_type_ref(builder.registry(), definition),
            description: body.description.clone(),
        });
        request_body = Some(RequestBodyBinding {
            content_type,
            argument,
            definition,
        });
    }

    let (resolved, reference) = match document::resolve_schema(document, response_schema) {
        Ok(resolved) => resolved,
        Err(error) => {
            warn!("Skipping {field_name}. {error}");
            return None;
        }
    };
    let names = SchemaNames {
        from_ref: reference,
        from_schema: resolved.schema_data.title.clone(),
        from_path: Some(naming::infer_resource_name_from_path(path)),
    };
    let definition = match builder.create_data_definition(response_schema, names, path, false) {
        Ok(definition) => definition,
        Err(error) => {
            warn!("Skipping {field_name}. {error}");
            return None;
        }
    };

    Some(OperationPlan {
        name: field_name.to_string(),
        description: operation.description.clone(),
        kind,
        arguments,
        type_ref: output::output_type_ref(builder.registry(), definition),
        resolver: HttpResolver {
            url: format!("{server_url}{path}"),
            method,
            path_parameters,
            query_parameters,
            request_body,
            response: definition,
        },
    })
}
