// src/generate/schema.rs

//! The site's machine-readable descriptions: a JSON Schema for its JSON
//! resources and an OpenAPI document for the resource URLs.

use serde_json::{json, Map, Value};

use crate::generate::url::UrlGenerator;

/// Resource path of the JSON Schema.
pub const SCHEMA_RESOURCE: &str = "schema.json";

/// Resource path of the OpenAPI document.
pub const OPENAPI_RESOURCE: &str = "api/index.json";

/// URL of definition `name` within the site's schema.
pub fn def_url(urls: &UrlGenerator, name: &str) -> String {
    format!("{}#/$defs/{}", urls.url(SCHEMA_RESOURCE), name)
}

/// `"source-citation"` -> `"sourceCitation"`.
pub fn lower_camel_case(kebab: &str) -> String {
    let mut out = String::with_capacity(kebab.len());
    let mut upper = false;
    for c in kebab.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

pub fn entity_def(entity_type: &str) -> String {
    format!("{}Entity", lower_camel_case(entity_type))
}

pub fn collection_def(entity_type: &str) -> String {
    format!("{}EntityCollectionResponse", lower_camel_case(entity_type))
}

/// JSON Schema covering error responses and every entity type.
pub fn json_schema(urls: &UrlGenerator, entity_types: &[String]) -> Value {
    let mut defs = Map::new();
    defs.insert(
        "errorResponse".to_string(),
        json!({
            "type": "object",
            "properties": { "message": { "type": "string" } },
            "required": ["message"],
        }),
    );
    for entity_type in entity_types {
        defs.insert(
            entity_def(entity_type),
            json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string" },
                    "label": { "type": "string" },
                    "private": { "type": "boolean" },
                    "attributes": {
                        "type": "object",
                        "additionalProperties": { "type": "string" },
                    },
                },
                "required": ["id"],
            }),
        );
        defs.insert(
            collection_def(entity_type),
            json!({
                "type": "object",
                "properties": {
                    "collection": {
                        "type": "array",
                        "items": { "type": "string", "format": "uri" },
                    },
                },
                "required": ["collection"],
            }),
        );
    }

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": urls.url(SCHEMA_RESOURCE),
        "$defs": defs,
    })
}

/// OpenAPI 3.1 document describing the JSON resources of each entity type.
pub fn openapi(urls: &UrlGenerator, entity_types: &[String]) -> Value {
    let errors = json!({
        "401": error_response(urls, "Not logged in."),
        "403": error_response(urls, "Not allowed."),
        "404": error_response(urls, "Not found."),
    });

    let mut paths = Map::new();
    for entity_type in entity_types {
        let mut collection_responses = errors.clone();
        collection_responses["200"] = json_response(
            urls,
            &format!("The {} collection.", entity_type),
            &collection_def(entity_type),
        );
        paths.insert(
            format!("/{}", UrlGenerator::entity_type_resource(entity_type, "json")),
            json!({
                "get": {
                    "summary": format!("Retrieve the {} collection.", entity_type),
                    "responses": collection_responses,
                },
            }),
        );

        let mut entity_responses = errors.clone();
        entity_responses["200"] = json_response(
            urls,
            &format!("A single {}.", entity_type),
            &entity_def(entity_type),
        );
        paths.insert(
            format!("/{}", UrlGenerator::entity_resource(entity_type, "{id}", "json")),
            json!({
                "get": {
                    "summary": format!("Retrieve a single {}.", entity_type),
                    "parameters": [{
                        "name": "id",
                        "in": "path",
                        "required": true,
                        "schema": { "type": "string" },
                    }],
                    "responses": entity_responses,
                },
            }),
        );
    }

    json!({
        "openapi": "3.1.0",
        "info": {
            "title": "Pedigree site API",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "servers": [{ "url": urls.url("") }],
        "paths": paths,
    })
}

fn error_response(urls: &UrlGenerator, description: &str) -> Value {
    json_response(urls, description, "errorResponse")
}

fn json_response(urls: &UrlGenerator, description: &str, def: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": { "schema": { "$ref": def_url(urls, def) } },
        },
    })
}

