//! Accessors over the OpenAPI document: reference resolution, response and
//! content selection, HTTP method iteration.

use openapiv3::{
    OpenAPI, Operation, Parameter, PathItem, ReferenceOr, RequestBody, Response, Schema,
    StatusCode,
};

use crate::Error;

/// Response media types the translator understands, in preference order.
pub(crate) const RESPONSE_CONTENT_TYPES: [&str; 3] =
    ["application/json", "text/plain", "text/html"];

/// Request media types the translator understands, in preference order.
pub(crate) const REQUEST_CONTENT_TYPES: [&str; 2] =
    ["application/json", "application/x-www-form-urlencoded"];

// Reference chains longer than this are assumed to be cyclic.
const MAX_REF_DEPTH: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ];

    pub fn operation(self, item: &PathItem) -> Option<&Operation> {
        match self {
            HttpMethod::Get => item.get.as_ref(),
            HttpMethod::Post => item.post.as_ref(),
            HttpMethod::Put => item.put.as_ref(),
            HttpMethod::Patch => item.patch.as_ref(),
            HttpMethod::Delete => item.delete.as_ref(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The base URL all operation paths are appended to.
pub(crate) fn server_url(document: &OpenAPI) -> Result<String, Error> {
    document
        .servers
        .iter()
        .find(|server| !server.url.is_empty())
        .map(|server| server.url.clone())
        .ok_or(Error::MissingServerUrl)
}

/// The last path component of a `$ref`, which names the referenced component.
pub(crate) fn ref_name(reference: &str) -> String {
    reference
        .rsplit('/')
        .next()
        .unwrap_or(reference)
        .to_string()
}

/// Follows schema references through `#/components/schemas` until an inline
/// schema is reached. Returns the schema together with the name of the last
/// reference crossed, if any.
pub(crate) fn resolve_schema<'a>(
    document: &'a OpenAPI,
    schema: &'a ReferenceOr<Schema>,
) -> Result<(&'a Schema, Option<String>), Error> {
    let mut current = schema;
    let mut name = None;

    for _ in 0..MAX_REF_DEPTH {
        match current {
            ReferenceOr::Item(schema) => return Ok((schema, name)),
            ReferenceOr::Reference { reference } => {
                let target = ref_name(reference);
                current = document
                    .components
                    .as_ref()
                    .and_then(|components| components.schemas.get(&target))
                    .ok_or_else(|| Error::UnresolvedReference(reference.clone()))?;
                name = Some(target);
            }
        }
    }

    Err(Error::UnresolvedReference(name.unwrap_or_default()))
}

pub(crate) fn resolve_response<'a>(
    document: &'a OpenAPI,
    response: &'a ReferenceOr<Response>,
) -> Result<&'a Response, Error> {
    match response {
        ReferenceOr::Item(response) => Ok(response),
        ReferenceOr::Reference { reference } => document
            .components
            .as_ref()
            .and_then(|components| components.responses.get(&ref_name(reference)))
            .and_then(|entry| entry.as_item())
            .ok_or_else(|| Error::UnresolvedReference(reference.clone())),
    }
}

pub(crate) fn resolve_request_body<'a>(
    document: &'a OpenAPI,
    request_body: &'a ReferenceOr<RequestBody>,
) -> Result<&'a RequestBody, Error> {
    match request_body {
        ReferenceOr::Item(request_body) => Ok(request_body),
        ReferenceOr::Reference { reference } => document
            .components
            .as_ref()
            .and_then(|components| components.request_bodies.get(&ref_name(reference)))
            .and_then(|entry| entry.as_item())
            .ok_or_else(|| Error::UnresolvedReference(reference.clone())),
    }
}

pub(crate) fn resolve_parameter<'a>(
    document: &'a OpenAPI,
    parameter: &'a ReferenceOr<Parameter>,
) -> Result<&'a Parameter, Error> {
    match parameter {
        ReferenceOr::Item(parameter) => Ok(parameter),
        ReferenceOr::Reference { reference } => document
            .components
            .as_ref()
            .and_then(|components| components.parameters.get(&ref_name(reference)))
            .and_then(|entry| entry.as_item())
            .ok_or_else(|| Error::UnresolvedReference(reference.clone())),
    }
}

/// The first response declared with a status code in [200, 300).
pub(crate) fn success_response<'a>(
    document: &'a OpenAPI,
    operation: &'a Operation,
) -> Option<&'a Response> {
    operation
        .responses
        .responses
        .iter()
        .find_map(|(status, response)| match status {
            StatusCode::Code(code) if (200..300).contains(code) => {
                resolve_response(document, response).ok()
            }
            _ => None,
        })
}

/// The schema of the first supported response media type. The media type must
/// carry a schema to qualify.
pub(crate) fn response_content(response: &Response) -> Option<&ReferenceOr<Schema>> {
    RESPONSE_CONTENT_TYPES.iter().find_map(|content_type| {
        response
            .content
            .get(*content_type)
            .and_then(|media| media.schema.as_ref())
    })
}

/// The first supported request media type together with its schema.
pub(crate) fn request_content(
    request_body: &RequestBody,
) -> Option<(&'static str, &ReferenceOr<Schema>)> {
    REQUEST_CONTENT_TYPES.iter().find_map(|content_type| {
        request_body
            .content
            .get(*content_type)
            .and_then(|media| media.schema.as_ref())
            .map(|schema| (*content_type, schema))
    })
}
