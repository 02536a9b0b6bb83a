//! Turns an OpenAPI 3 description of an HTTP/JSON API into an executable
//! GraphQL schema.
//!
//! [`translate`] walks the document and materialises a complete GraphQL type
//! system (objects, input objects, unions, enums, lists, scalars) together
//! with one root field per REST operation. At query time each root field
//! dispatches an HTTP call to the upstream service described by the document,
//! marshalling GraphQL arguments into path segments, query strings and
//! request bodies, and the HTTP response back into a GraphQL value.

use std::sync::Arc;

use async_graphql::dynamic::Schema;
use openapiv3::OpenAPI;

mod document;
mod naming;
mod operations;
mod output;
mod resolver;
mod type_builder;
mod types;
mod values;

use type_builder::TypeBuilder;

/// Translate `document` into a GraphQL schema whose resolvers issue HTTP
/// requests through `client`.
///
/// Operations that cannot be represented are skipped with a logged cause;
/// only document-level problems (no server URL, no usable operation at all,
/// an invalid resulting schema) abort the translation.
pub fn translate(document: &OpenAPI, client: reqwest::Client) -> Result<Schema, Error> {
    let server_url = document::server_url(document)?;

    let mut builder = TypeBuilder::new(document);
    let plans = operations::translate_operations(document, &server_url, &mut builder);

    let registry = Arc::new(builder.into_registry());
    output::build_schema(&registry, plans, client)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("there was no server URL in this OpenAPI document")]
    MissingServerUrl,
    #[error("found a reference {0} which didn't seem to exist in the document")]
    UnresolvedReference(String),
    #[error("encountered an array without items")]
    ArrayWithoutItems,
    #[error("no operation in this document could be translated")]
    EmptySchema,
    #[error("the translated schema was invalid: {0}")]
    SchemaBuild(String),
}
