use crate::handlers::{GroupBuilder, HandlerCatalog, HandlerGroupType};
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// Built-in handler group that is always reachable, with or without a generated module.
pub struct Echo {
    created_at_ms: u128,
}

/// `Echo` group: `Ping` and `Version`
pub fn echo_group() -> HandlerGroupType {
    GroupBuilder::new("Echo", || {
        let created_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        Ok(Echo { created_at_ms })
    })
    .operation("Ping", |echo: &mut Echo| {
        Ok(json!({ "message": "pong", "timestamp_ms": echo.created_at_ms.to_string() }))
    })
    .operation("Version", |_: &mut Echo| {
        Ok(json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        }))
    })
    .build()
}

/// Catalog of the groups compiled into the binary
pub fn static_catalog() -> HandlerCatalog {
    let mut catalog = HandlerCatalog::new();
    if let Err(e) = catalog.register(echo_group()) {
        warn!(error = %e, "Failed to register static handler group");
    }
    catalog
}
