//! Builds the OpenAPI document from registered routes.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::error::{Result, TrestleError};
use crate::openapi::document::{
    Info, OpenApiDocument, Operation, Parameter, ResponseSpec, Server, OPENAPI_VERSION,
};
use crate::routing::{Route, Segment};

/// Application-level document settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecInfo {
    pub title: String,
    pub version: String,
    pub description: String,
    pub host: String,
    pub port: u16,
    pub secure: bool,
    /// Fail on the first route without a summary and responses.
    pub strict: bool,
}

impl SpecInfo {
    pub fn from_config(config: &ServerConfig) -> Self {
        let secure = config.listener.secure;
        let port = config
            .listener
            .bind_address
            .rsplit_once(':')
            .and_then(|(_, port)| port.parse().ok())
            .unwrap_or(if secure { 443 } else { 80 });

        Self {
            title: config.openapi.title.clone(),
            version: config.openapi.version.clone(),
            description: config.openapi.description.clone(),
            host: config.openapi.host.clone(),
            port,
            secure,
            strict: config.openapi.strict,
        }
    }

    pub fn server_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }
}

/// `/users/:id` → `/users/{id}`
pub fn openapi_path(route: &Route) -> String {
    let mut path = String::with_capacity(route.path().len() + 2);
    for segment in route.segments() {
        path.push('/');
        match segment {
            Segment::Literal(text) => path.push_str(text),
            Segment::Param(name) => {
                path.push('{');
                path.push_str(name);
                path.push('}');
            }
        }
    }
    path
}

/// Generate the document. Routes sharing a path share one path item; for a
/// duplicated (path, method) the first registration is documented.
pub fn generate(routes: &[Arc<Route>], info: &SpecInfo) -> Result<OpenApiDocument> {
    let mut paths: BTreeMap<String, BTreeMap<String, Operation>> = BTreeMap::new();

    for route in routes {
        if info.strict && !route.is_spec_compatible() {
            return Err(TrestleError::SpecNotCompliant {
                method: route.method().to_string(),
                path: route.path().to_string(),
            });
        }

        paths
            .entry(openapi_path(route))
            .or_default()
            .entry(route.method().as_str().to_ascii_lowercase())
            .or_insert_with(|| operation(route));
    }

    Ok(OpenApiDocument {
        openapi: OPENAPI_VERSION.to_string(),
        info: Info {
            title: info.title.clone(),
            version: info.version.clone(),
            description: info.description.clone(),
        },
        servers: vec![Server {
            url: info.server_url(),
        }],
        paths,
    })
}

fn operation(route: &Route) -> Operation {
    let parameters = route
        .segments()
        .iter()
        .filter_map(|segment| match segment {
            Segment::Param(name) => Some(Parameter::path(name.clone())),
            Segment::Literal(_) => None,
        })
        .collect();

    let responses = route
        .responses()
        .iter()
        .map(|(code, description)| {
            (
                code.to_string(),
                ResponseSpec {
                    description: description.clone(),
                },
            )
        })
        .collect();

    Operation {
        summary: route.summary().map(str::to_string),
        description: route.description().map(str::to_string),
        parameters,
        responses,
        tags: route.tags().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::RouteRequest;
    use crate::http::response::Reply;
    use axum::http::Method;
    use serde_json::json;

    async fn noop(_req: RouteRequest) -> Reply {
        Reply::ok()
    }

    fn info(strict: bool) -> SpecInfo {
        SpecInfo {
            title: "Test API".into(),
            version: "2.0.0".into(),
            description: "Routes under test".into(),
            host: "api.example.com".into(),
            port: 8443,
            secure: true,
            strict,
        }
    }

    fn routes() -> Vec<Arc<Route>> {
        vec![
            Arc::new(
                Route::builder("/users/:id")
                    .summary("Fetch a user")
                    .tags(["users"])
                    .responses([(200, "The user"), (404, "No such user")])
                    .build(noop)
                    .unwrap(),
            ),
            Arc::new(
                Route::builder("/users/:id")
                    .method(Method::DELETE)
                    .summary("Delete a user")
                    .build(noop)
                    .unwrap(),
            ),
            Arc::new(Route::get("/health", noop).unwrap()),
        ]
    }

    #[test]
    fn test_document_shape() {
        let doc = generate(&routes(), &info(false)).unwrap();
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["openapi"], "3.0.0");
        assert_eq!(
            value["info"],
            json!({"title": "Test API", "version": "2.0.0", "description": "Routes under test"})
        );
        assert_eq!(value["servers"], json!([{"url": "https://api.example.com:8443"}]));

        let get = &value["paths"]["/users/{id}"]["get"];
        assert_eq!(get["summary"], "Fetch a user");
        assert_eq!(get["tags"], json!(["users"]));
        assert_eq!(
            get["responses"],
            json!({"200": {"description": "The user"}, "404": {"description": "No such user"}})
        );
        assert_eq!(
            get["parameters"],
            json!([{"name": "id", "in": "path", "required": true, "schema": {"type": "string"}}])
        );
        assert_eq!(value["paths"]["/users/{id}"]["delete"]["summary"], "Delete a user");

        let health = &value["paths"]["/health"]["get"];
        assert_eq!(health["responses"], json!({"200": {"description": "Success"}}));
        assert!(health.get("parameters").is_none());
        assert!(health.get("summary").is_none());
    }

    #[test]
    fn test_strict_mode_names_first_offender() {
        let err = generate(&routes(), &info(true)).unwrap_err();
        match err {
            TrestleError::SpecNotCompliant { method, path } => {
                assert_eq!(method, "GET");
                assert_eq!(path, "/health");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_strict_mode_accepts_documented_routes() {
        let documented = &routes()[..2];
        assert!(generate(documented, &info(true)).is_ok());
    }

    #[test]
    fn test_duplicate_route_documents_first() {
        let routes = vec![
            Arc::new(Route::builder("/a").summary("first").build(noop).unwrap()),
            Arc::new(Route::builder("/a").summary("second").build(noop).unwrap()),
        ];
        let doc = generate(&routes, &info(false)).unwrap();
        assert_eq!(doc.paths["/a"]["get"].summary.as_deref(), Some("first"));
    }

    #[test]
    fn test_spec_info_from_config() {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "0.0.0.0:3000".into();
        let info = SpecInfo::from_config(&config);
        assert_eq!(info.port, 3000);
        assert_eq!(info.server_url(), "http://localhost:3000");
        assert!(!info.strict);
    }

    #[test]
    fn test_openapi_path() {
        let route = Route::get("/orgs/:org/repos/:repo", noop).unwrap();
        assert_eq!(openapi_path(&route), "/orgs/{org}/repos/{repo}");
        assert_eq!(openapi_path(&Route::get("/", noop).unwrap()), "/");
    }

    #[test]
    fn test_to_json() {
        let doc = generate(&routes(), &info(false)).unwrap();
        let text = doc.to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["openapi"], "3.0.0");
    }
}
