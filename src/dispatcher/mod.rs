//! # Dispatcher Module
//!
//! Name-based dispatch of `(handler group, operation)` calls.
//!
//! ## Overview
//!
//! A call names a handler group and an operation. The dispatcher:
//!
//! 1. looks the group up among the statically registered groups (case-insensitive),
//! 2. otherwise takes a snapshot of the [active module](crate::registry) and looks it up there,
//! 3. creates a fresh instance of the group,
//! 4. resolves the operation by exact, case-sensitive name,
//! 5. invokes it with no arguments and returns its JSON payload.
//!
//! Static groups shadow generated groups of the same name. Every failure is mapped to a
//! [`DispatchError`]; handler errors and panics never escape the dispatch call.
//!
//! ## Concurrency
//!
//! The dispatcher holds no mutable state and is shared freely between coroutines and
//! threads. Each call pins the registry snapshot it started with, so a concurrent
//! activation never changes the module underneath a running call.
//!
//! ```rust
//! use liveroute::dispatcher::{DispatchError, Dispatcher};
//! use liveroute::handlers::HandlerCatalog;
//! use liveroute::registry::ActiveModuleRegistry;
//! use std::sync::Arc;
//!
//! let dispatcher = Dispatcher::new(HandlerCatalog::new(), Arc::new(ActiveModuleRegistry::new()));
//! assert!(matches!(
//!     dispatcher.dispatch("Widgets", "listWidgets"),
//!     Err(DispatchError::HandlerGroupNotFound { .. })
//! ));
//! ```

mod core;

pub use core::{DispatchError, Dispatcher};
