//! # liveroute
//!
//! **liveroute** turns an [OpenAPI 3](https://spec.openapis.org/oas/v3.1.0) document into
//! handler code at run time, builds that code in-process and swaps it in atomically, so a
//! running service can answer for an API it did not know about when it started.
//!
//! ## Architecture
//!
//! - **[`spec`]** - OpenAPI parsing into [`SpecDocument`] descriptors
//! - **[`generator`]** - Handler-module source generation (askama templates)
//! - **[`builder`]** - In-process build of generated source into a [`HandlerModule`]
//! - **[`handlers`]** - Handler group types, instances and catalogs
//! - **[`registry`]** - The single active module, replaced atomically
//! - **[`dispatcher`]** - Group/operation dispatch with failure isolation
//! - **[`live`]** - [`LiveApi`], the façade tying the above together
//! - **[`server`]** - HTTP transport on `may_minihttp`
//! - **[`hot_reload`]** - Re-activation when a watched specification changes
//! - **[`cli`]** - The `liveroute` binary
//!
//! ### Activation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as LiveService
//!     participant Live as LiveApi
//!     participant Gen as generator
//!     participant Build as builder
//!     participant Reg as ActiveModuleRegistry
//!
//!     Client->>Server: POST /api/swagger/upload
//!     Server->>Live: generate_and_activate(doc)
//!     Live->>Gen: generate(doc, config)
//!     Gen-->>Live: GeneratedSource
//!     Live->>Build: build_module(source, env)
//!     alt Build errors
//!         Build-->>Client: 422 + diagnostics (registry untouched)
//!     end
//!     Build-->>Live: HandlerModule
//!     Live->>Reg: replace(module)
//!     Reg-->>Client: 200 version N+1
//! ```
//!
//! ## Runtime Considerations
//!
//! Like the HTTP layer, request handling runs on `may` coroutines. The coroutine stack
//! size comes from `server.stack_size` or `LIVEROUTE_STACK_SIZE`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use liveroute::{echo::static_catalog, GeneratorConfig, LiveApi, load_spec};
//!
//! let api = LiveApi::new(GeneratorConfig::default(), static_catalog());
//! let doc = load_spec("openapi.yaml").expect("failed to load spec");
//! let report = api.generate_and_activate(&doc).expect("activation failed");
//! println!("active version {}: {:?}", report.version, report.groups);
//! let pong = api.dispatch("echo", "Ping").expect("dispatch failed");
//! assert_eq!(pong["message"], "pong");
//! ```

pub mod builder;
pub mod cli;
pub mod dispatcher;
pub mod echo;
pub mod generator;
pub mod handlers;
pub mod hot_reload;
pub mod ids;
pub mod live;
pub mod logging;
pub mod registry;
pub mod runtime_config;
pub mod server;
pub mod spec;

pub use builder::{build_module, BuildEnvironment, BuildFailure, Diagnostic, HandlerModule};
pub use dispatcher::{DispatchError, Dispatcher};
pub use generator::{generate, GeneratedSource, GenerationError, GeneratorConfig};
pub use handlers::{GroupBuilder, HandlerCatalog};
pub use live::{ActivationError, ActivationReport, LiveApi, LiveStatus};
pub use registry::ActiveModuleRegistry;
pub use spec::{load_spec, parse_spec, SpecDocument};
