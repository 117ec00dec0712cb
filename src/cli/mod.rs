//! # CLI Module
//!
//! Command-line interface of the `liveroute` binary.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Run the HTTP server. Specifications can be uploaded at run time; `--spec` activates
//! one at startup and `--watch` re-activates it whenever the file changes.
//!
//! ```bash
//! liveroute serve --spec openapi.yaml --watch --addr 127.0.0.1:8080
//! ```
//!
//! ### `generate`
//!
//! Print the handler module generated for a specification:
//!
//! ```bash
//! liveroute generate --spec openapi.yaml --naming operation-id
//! ```
//!
//! ### `check`
//!
//! Generate and build without activating; exits non-zero and prints diagnostics on
//! failure:
//!
//! ```bash
//! liveroute check --spec openapi.yaml --strict
//! ```
//!
//! All commands accept `--config <FILE>` (or `LIVEROUTE_CONFIG`), see
//! [`runtime_config`](crate::runtime_config).

mod commands;


pub use commands::{check_spec, generate_source, run_cli, start_server, CheckReport, Cli, Commands};
