//! Route contracts and the OpenAPI document generated from them.
//!
//! A [`RouteContract`] is the one place an endpoint's method, path, auth
//! requirement, request shape and responses are written down. The router
//! mounts handlers through [`RouteContract::bind`] and `/doc` renders the
//! same list, so the two cannot drift apart.

use axum::{
    Router,
    handler::Handler,
    routing::{MethodFilter, on},
};
use schemars::{JsonSchema, Schema, SchemaGenerator, generate::SchemaSettings};
use serde_json::{Map, Value, json};
use utils::build_info::BUILD_INFO;

use crate::AppState;

pub const API_TITLE: &str = "Bunplate API";

const BEARER_SCHEME: &str = "bearerAuth";

pub type SchemaFn = fn(&mut SchemaGenerator) -> Schema;

/// Reference to `T` under `components/schemas`.
pub fn schema_ref<T: JsonSchema>(generator: &mut SchemaGenerator) -> Schema {
    generator.subschema_for::<T>()
}

/// `T`'s own schema, used for query strings whose properties become parameters.
pub fn schema_inline<T: JsonSchema>(generator: &mut SchemaGenerator) -> Schema {
    T::json_schema(generator)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
        }
    }

    fn filter(self) -> MethodFilter {
        match self {
            HttpMethod::Get => MethodFilter::GET,
            HttpMethod::Post => MethodFilter::POST,
            HttpMethod::Patch => MethodFilter::PATCH,
            HttpMethod::Delete => MethodFilter::DELETE,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PathParam {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Clone, Copy)]
pub struct ResponseSpec {
    pub status: u16,
    pub description: &'static str,
    pub schema: Option<SchemaFn>,
}

impl ResponseSpec {
    pub const fn json(status: u16, description: &'static str, schema: SchemaFn) -> Self {
        Self {
            status,
            description,
            schema: Some(schema),
        }
    }

    pub const fn empty(status: u16, description: &'static str) -> Self {
        Self {
            status,
            description,
            schema: None,
        }
    }
}

#[derive(Clone, Copy)]
pub struct RouteContract {
    pub operation_id: &'static str,
    pub method: HttpMethod,
    /// Path relative to the base path, in axum syntax (`/tasks/{id}`).
    pub path: &'static str,
    pub summary: &'static str,
    pub tag: &'static str,
    pub requires_session: bool,
    pub path_params: &'static [PathParam],
    pub query: Option<SchemaFn>,
    pub body: Option<SchemaFn>,
    pub responses: &'static [ResponseSpec],
}

impl RouteContract {
    /// Mount `handler` at this contract's method and path.
    pub fn bind<H, T>(&self, router: Router<AppState>, handler: H) -> Router<AppState>
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        router.route(self.path, on(self.method.filter(), handler))
    }

    fn operation(&self, generator: &mut SchemaGenerator) -> Value {
        let mut parameters: Vec<Value> = self
            .path_params
            .iter()
            .map(|param| {
                json!({
                    "name": param.name,
                    "in": "path",
                    "required": true,
                    "description": param.description,
                    "schema": { "type": "integer", "format": "int64", "minimum": 1 },
                })
            })
            .collect();

        if let Some(query) = self.query {
            parameters.extend(query_parameters(&query(generator)));
        }

        let mut responses = Map::new();
        for response in self.responses {
            let mut entry = json!({ "description": response.description });
            if let Some(schema) = response.schema {
                entry["content"] = json!({
                    "application/json": { "schema": schema(generator).to_value() }
                });
            }
            responses.insert(response.status.to_string(), entry);
        }

        let mut operation = json!({
            "operationId": self.operation_id,
            "summary": self.summary,
            "tags": [self.tag],
            "responses": responses,
        });

        if !parameters.is_empty() {
            operation["parameters"] = Value::Array(parameters);
        }
        if let Some(body) = self.body {
            operation["requestBody"] = json!({
                "required": true,
                "content": {
                    "application/json": { "schema": body(generator).to_value() }
                }
            });
        }
        if self.requires_session {
            operation["security"] = json!([{ BEARER_SCHEME: [] }]);
        }

        operation
    }
}

/// Every property of an object schema becomes an optional query parameter.
fn query_parameters(schema: &Schema) -> Vec<Value> {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    properties
        .iter()
        .map(|(name, property)| {
            let mut property = property.clone();
            let description = property
                .as_object_mut()
                .and_then(|object| object.remove("description"));
            let mut parameter = json!({
                "name": name,
                "in": "query",
                "required": required.contains(&name.as_str()),
                "schema": property,
            });
            if let Some(description) = description {
                parameter["description"] = description;
            }
            parameter
        })
        .collect()
}

/// Build the OpenAPI 3.0 document for `contracts` served under `base_path`.
pub fn openapi_document(contracts: &[RouteContract], base_path: &str) -> Value {
    let mut generator = SchemaSettings::openapi3().into_generator();

    let mut paths = Map::new();
    for contract in contracts {
        let operation = contract.operation(&mut generator);
        let item = paths
            .entry(contract.path.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(item) = item.as_object_mut() {
            item.insert(contract.method.as_str().to_string(), operation);
        }
    }

    let server_url = if base_path.is_empty() { "/" } else { base_path };

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": API_TITLE,
            "version": BUILD_INFO.version,
        },
        "servers": [{ "url": server_url }],
        "paths": paths,
        "components": {
            "schemas": generator.take_definitions(true),
            "securitySchemes": {
                BEARER_SCHEME: {
                    "type": "http",
                    "scheme": "bearer",
                    "bearerFormat": "JWT",
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Deserialize, JsonSchema)]
    struct Filter {
        /// Words to look for.
        q: Option<String>,
        page: u32,
    }

    #[test]
    fn test_query_parameters_from_schema() {
        let mut generator = SchemaSettings::openapi3().into_generator();
        let schema = schema_inline::<Filter>(&mut generator);
        let params = query_parameters(&schema);

        assert_eq!(params.len(), 2);
        let q = params.iter().find(|p| p["name"] == "q").unwrap();
        assert_eq!(q["in"], "query");
        assert_eq!(q["required"], false);
        assert_eq!(q["description"], "Words to look for.");

        let page = params.iter().find(|p| p["name"] == "page").unwrap();
        assert_eq!(page["required"], true);
    }

    #[test]
    fn test_method_names() {
        assert_eq!(HttpMethod::Patch.as_str(), "patch");
        assert_eq!(HttpMethod::Delete.as_str(), "delete");
    }
}
