//! The runtime half of a translated operation: composing the upstream HTTP
//! request from GraphQL arguments and decoding the response.

use indexmap::IndexMap;

use crate::{document::HttpMethod, types::DefinitionId};

pub(crate) mod parameters;

/// One bound parameter: the GraphQL argument it reads from and the OpenAPI
/// parameter it feeds.
#[derive(Debug)]
pub(crate) struct ParameterBinding {
    pub argument: String,
    pub name: String,
    pub definition: DefinitionId,
}

#[derive(Debug)]
pub(crate) struct RequestBodyBinding {
    pub content_type: &'static str,
    pub argument: String,
    pub definition: DefinitionId,
}

/// Everything needed to turn one resolved GraphQL field call into an
/// upstream HTTP request. Immutable after translation; safe to share across
/// concurrent requests.
#[derive(Debug)]
pub(crate) struct HttpResolver {
    /// Server base URL joined with the operation's path template.
    pub url: String,
    pub method: HttpMethod,
    pub path_parameters: Vec<ParameterBinding>,
    pub query_parameters: Vec<ParameterBinding>,
    pub request_body: Option<RequestBodyBinding>,
    /// The Data Definition the decoded response conforms to.
    pub response: DefinitionId,
}

impl HttpResolver {
    /// Every GraphQL argument this resolver reads, with the definition that
    /// governs its value mapping.
    pub fn argument_bindings(&self) -> impl Iterator<Item = (&str, DefinitionId)> {
        self.path_parameters
            .iter()
            .chain(&self.query_parameters)
            .map(|parameter| (parameter.argument.as_str(), parameter.definition))
            .chain(
                self.request_body
                    .iter()
                    .map(|body| (body.argument.as_str(), body.definition)),
            )
    }

    /// Issues the upstream request. Absent arguments leave their parameter
    /// out entirely; a missing body argument sends no body and no
    /// content-type header.
    pub async fn resolve(
        &self,
        client: &reqwest::Client,
        args: &IndexMap<String, serde_json::Value>,
    ) -> Result<serde_json::Value, ResolveError> {
        let mut endpoint = self.url.clone();
        for parameter in &self.path_parameters {
            let Some(value) = args.get(&parameter.argument) else {
                continue;
            };
            endpoint = parameters::substitute_path_parameter(&endpoint, &parameter.name, value);
        }

        let mut query_parts = Vec::new();
        for parameter in &self.query_parameters {
            let Some(value) = args.get(&parameter.argument) else {
                continue;
            };
            query_parts.push(parameters::serialize(value, &parameter.name)?);
        }
        let query = parameters::escape_query(&query_parts.join("&"));
        if !query.is_empty() {
            endpoint.push('?');
            endpoint.push_str(&query);
        }

        let mut request = client.request(self.method.to_reqwest(), endpoint.as_str());
        if let Some(body) = &self.request_body {
            if let Some(value) = args.get(&body.argument) {
                request = request.header(reqwest::header::CONTENT_TYPE, body.content_type);
                request = match body.content_type {
                    "application/x-www-form-urlencoded" => {
                        request.body(parameters::serialize(value, "")?)
                    }
                    _ => request.body(serde_json::to_vec(value)?),
                };
            }
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        // Decode as JSON when possible, otherwise carry the raw text.
        let data = match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Ok(value) if !value.is_null() => value,
            _ => serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned()),
        };

        if status.as_u16() >= 400 {
            return Err(ResolveError::UpstreamStatus {
                code: status.as_u16(),
                status: status.canonical_reason().unwrap_or_default().to_string(),
                body: data,
            });
        }

        Ok(data)
    }
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum ResolveError {
    #[error("cannot serialize a {0} value into a query string")]
    UnsupportedValue(&'static str),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("StatusCode: {code}. Status: {status}. Response body: {body}")]
    UpstreamStatus {
        code: u16,
        status: String,
        body: serde_json::Value,
    },
}
