use super::request::{parse_request, ParsedRequest};
use super::response::{write_json_response, JsonResponse};
use super::uploads::UploadStore;
use crate::dispatcher::DispatchError;
use crate::generator::normalize_base_path;
use crate::ids::DispatchId;
use crate::live::{ActivationError, LiveApi};
use crate::spec::{self, is_supported_method};
use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use std::io;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Route an inbound request resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Health,
    Upload,
    Serve,
    Status,
    Dynamic { group: String, operation: String },
    MethodNotAllowed,
    NotFound,
}

/// Map `method` and `path` to a [`Route`]. `prefix` is the normalized API prefix.
pub fn route_request(method: &str, path: &str, prefix: &str) -> Route {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if method == "GET" && segments == ["health"] {
        return Route::Health;
    }

    let prefix_segments: Vec<&str> = prefix.split('/').filter(|s| !s.is_empty()).collect();
    let Some(rest) = segments.strip_prefix(prefix_segments.as_slice()) else {
        return Route::NotFound;
    };

    match rest {
        ["swagger", action] => match (method, *action) {
            ("POST", "upload") => Route::Upload,
            ("GET", "serve") => Route::Serve,
            ("GET", "status") => Route::Status,
            (_, "upload" | "serve" | "status") => Route::MethodNotAllowed,
            _ => Route::NotFound,
        },
        ["dynamic", group, operation] => {
            let supported = method
                .parse::<http::Method>()
                .is_ok_and(|m| is_supported_method(&m));
            if supported {
                Route::Dynamic {
                    group: (*group).to_string(),
                    operation: (*operation).to_string(),
                }
            } else {
                Route::MethodNotAllowed
            }
        }
        _ => Route::NotFound,
    }
}

/// HTTP front end of a [`LiveApi`].
#[derive(Clone)]
pub struct LiveService {
    api: Arc<LiveApi>,
    prefix: String,
    uploads: Option<UploadStore>,
}

impl LiveService {
    pub fn new(api: Arc<LiveApi>, prefix: &str, uploads: Option<UploadStore>) -> Self {
        Self {
            api,
            prefix: normalize_base_path(prefix),
            uploads,
        }
    }

    #[must_use]
    pub fn api(&self) -> &Arc<LiveApi> {
        &self.api
    }

    /// Handle a parsed request. Never fails; every error becomes a status code.
    pub fn handle(&self, req: &ParsedRequest) -> JsonResponse {
        match route_request(&req.method, &req.path, &self.prefix) {
            Route::Health => JsonResponse::ok(json!({ "status": "ok" })),
            Route::Upload => self.upload(&req.body),
            Route::Serve => self.serve(),
            Route::Status => JsonResponse::ok(json!(self.api.status())),
            Route::Dynamic { group, operation } => {
                let dispatch_id = DispatchId::from_header_or_new(req.header("x-request-id"));
                self.dynamic(dispatch_id, &group, &operation)
            }
            Route::MethodNotAllowed => JsonResponse::error(405, "Method Not Allowed"),
            Route::NotFound => JsonResponse::new(
                404,
                json!({ "error": "Not Found", "method": req.method, "path": req.path }),
            ),
        }
    }

    fn upload(&self, body: &[u8]) -> JsonResponse {
        if body.iter().all(u8::is_ascii_whitespace) {
            return JsonResponse::error(400, "No file uploaded.");
        }

        let doc = match spec::parse_spec(body) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, size_bytes = body.len(), "Rejected uploaded specification");
                return JsonResponse::error(400, e.to_string());
            }
        };

        if let Some(store) = &self.uploads {
            if let Err(e) = store.persist(body) {
                error!(error = %format!("{e:#}"), "Failed to store uploaded specification");
                return JsonResponse::error(500, "Failed to store the uploaded file.");
            }
        }

        match self.api.generate_and_activate(&doc) {
            Ok(report) => {
                info!(version = report.version, groups = ?report.groups, "Uploaded specification is live");
                JsonResponse::ok(json!({
                    "message": "File uploaded and API generated successfully.",
                    "version": report.version,
                    "groups": report.groups,
                    "warnings": report.warnings,
                    "sourceDigest": report.source_digest,
                }))
            }
            Err(e) => {
                let kind = match &e {
                    ActivationError::Generation(_) => "generation",
                    ActivationError::Build(_) => "build",
                };
                JsonResponse::new(
                    422,
                    json!({
                        "error": e.to_string(),
                        "stage": kind,
                        "diagnostics": e.diagnostics(),
                    }),
                )
            }
        }
    }

    fn serve(&self) -> JsonResponse {
        let status = self.api.status();
        if !status.has_active_module {
            return JsonResponse::error(404, "No API has been generated.");
        }
        JsonResponse::ok(json!({
            "message": "Generated API is ready.",
            "version": status.version,
            "callerControllerName": status.declared_handler_groups.first(),
        }))
    }

    fn dynamic(&self, dispatch_id: DispatchId, group: &str, operation: &str) -> JsonResponse {
        match self.api.dispatch_with_id(dispatch_id, group, operation) {
            Ok(value) => JsonResponse::ok(value),
            Err(e @ DispatchError::HandlerGroupNotFound { .. }) => {
                JsonResponse::error(e.status_code(), format!("Controller '{group}' not found."))
            }
            Err(e @ DispatchError::OperationNotFound { .. }) => JsonResponse::error(
                e.status_code(),
                format!("Action '{operation}' not found on controller '{group}'."),
            ),
            // Details are logged by the dispatcher; callers get a generic message.
            Err(e) => JsonResponse::error(
                e.status_code(),
                "An error occurred while processing your request.",
            ),
        }
    }
}

impl HttpService for LiveService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let parsed = parse_request(req);
        let response = self.handle(&parsed);
        write_json_response(res, response);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::echo::static_catalog;
    use crate::generator::GeneratorConfig;

    const WIDGETS: &str = r#"{
      "openapi": "3.1.0",
      "info": {"title": "Widgets", "version": "1"},
      "paths": {
        "/widgets": {
          "get": {
            "operationId": "listWidgets",
            "responses": {"200": {"description": "OK",
              "content": {"application/json": {"schema": {"type": "array"}}}}}
          }
        }
      }
    }"#;

    fn service() -> LiveService {
        let api = Arc::new(LiveApi::new(GeneratorConfig::default(), static_catalog()));
        LiveService::new(api, "/api/", None)
    }

    #[test]
    fn test_route_request() {
        assert_eq!(route_request("GET", "/health", "api"), Route::Health);
        assert_eq!(route_request("POST", "/api/swagger/upload", "api"), Route::Upload);
        assert_eq!(route_request("GET", "/api/swagger/upload", "api"), Route::MethodNotAllowed);
        assert_eq!(route_request("GET", "/api/swagger/serve/", "api"), Route::Serve);
        assert_eq!(
            route_request("DELETE", "/api/dynamic/Widgets/remove", "api"),
            Route::Dynamic {
                group: "Widgets".into(),
                operation: "remove".into()
            }
        );
        assert_eq!(route_request("TRACE", "/api/dynamic/W/x", "api"), Route::MethodNotAllowed);
        assert_eq!(route_request("GET", "/api/dynamic/W", "api"), Route::NotFound);
        assert_eq!(route_request("GET", "/other/swagger/serve", "api"), Route::NotFound);
        assert_eq!(route_request("GET", "/v1/api/swagger/serve", "v1/api"), Route::Serve);
    }

    #[test]
    fn test_serve_before_upload() {
        let svc = service();
        let r = svc.handle(&ParsedRequest::new("GET", "/api/swagger/serve"));
        assert_eq!(r.status, 404);
        assert_eq!(r.body["error"], "No API has been generated.");
    }

    #[test]
    fn test_upload_then_dispatch() {
        let svc = service();
        let r = svc.handle(&ParsedRequest::new("POST", "/api/swagger/upload").with_body(WIDGETS));
        assert_eq!(r.status, 200, "{}", r.body);
        assert_eq!(r.body["version"], 1);

        let r = svc.handle(&ParsedRequest::new("GET", "/api/swagger/serve"));
        assert_eq!(r.status, 200);
        assert_eq!(r.body["callerControllerName"], "Widgets");

        let r = svc.handle(&ParsedRequest::new("GET", "/api/dynamic/widgets/listWidgets"));
        assert_eq!(r, JsonResponse::ok(json!([])));

        let r = svc.handle(&ParsedRequest::new("GET", "/api/dynamic/Gadgets/list"));
        assert_eq!(r.status, 404);
        assert_eq!(r.body["error"], "Controller 'Gadgets' not found.");

        let r = svc.handle(&ParsedRequest::new("GET", "/api/dynamic/Widgets/ListWidgets"));
        assert_eq!(r.status, 404);
        assert_eq!(
            r.body["error"],
            "Action 'ListWidgets' not found on controller 'Widgets'."
        );
    }

    #[test]
    fn test_static_group_reachable_without_upload() {
        let svc = service();
        let r = svc.handle(&ParsedRequest::new("POST", "/api/dynamic/Echo/Ping"));
        assert_eq!(r.status, 200);
        assert_eq!(r.body["message"], "pong");
    }

    #[test]
    fn test_bad_uploads() {
        let svc = service();
        let r = svc.handle(&ParsedRequest::new("POST", "/api/swagger/upload"));
        assert_eq!(r.status, 400);
        assert_eq!(r.body["error"], "No file uploaded.");

        let r = svc.handle(&ParsedRequest::new("POST", "/api/swagger/upload").with_body("{oops"));
        assert_eq!(r.status, 400);

        let missing_id = WIDGETS.replace(r#""operationId": "listWidgets","#, "");
        let r = svc.handle(&ParsedRequest::new("POST", "/api/swagger/upload").with_body(missing_id));
        assert_eq!(r.status, 422);
        assert_eq!(r.body["stage"], "generation");
        assert_eq!(svc.api().status().version, 0);
    }

    #[test]
    fn test_upload_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(LiveApi::new(GeneratorConfig::default(), static_catalog()));
        let svc = LiveService::new(api, "api", Some(UploadStore::new(dir.path())));
        let r = svc.handle(&ParsedRequest::new("POST", "/api/swagger/upload").with_body(WIDGETS));
        assert_eq!(r.status, 200);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_status_endpoint() {
        let svc = service();
        let r = svc.handle(&ParsedRequest::new("GET", "/api/swagger/status"));
        assert_eq!(
            r.body,
            json!({"has_active_module": false, "version": 0, "declared_handler_groups": []})
        );
    }
}
