//! HTTP transport for the live API, built on `may_minihttp`.
//!
//! | Route                                   | Purpose                                  |
//! |-----------------------------------------|------------------------------------------|
//! | `GET /health`                           | liveness                                 |
//! | `POST /{prefix}/swagger/upload`         | upload a specification and activate it   |
//! | `GET /{prefix}/swagger/serve`           | summary of the active module             |
//! | `GET /{prefix}/swagger/status`          | version and declared handler groups      |
//! | `* /{prefix}/dynamic/{group}/{operation}` | dispatch to a handler                  |

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;
pub mod uploads;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_request, ParsedRequest};
pub use response::JsonResponse;
pub use service::{route_request, LiveService, Route};
pub use uploads::UploadStore;
