//! # Hot Reload Module
//!
//! Watches a specification file and regenerates the live API whenever it changes.
//!
//! Each change runs the full generate/build/activate pass through
//! [`LiveApi::generate_and_activate`]. A document that fails to parse, generate or build
//! is logged and ignored: the last good module keeps serving. Saves that leave the
//! content unchanged (editors often write twice) are skipped.
//!
//! ```rust,ignore
//! use liveroute::hot_reload::watch_spec;
//!
//! let watcher = watch_spec("openapi.yaml", api.clone())?;
//! // Reloads stop when the watcher is dropped.
//! ```

use crate::builder::sha256_hex;
use crate::live::{ActivationReport, LiveApi};
use crate::spec;
use anyhow::Context;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Read, parse and activate the document at `path`.
///
/// Returns `Ok(None)` when the content digest equals `last_digest`.
pub fn reload_from_file(
    path: &Path,
    api: &LiveApi,
    last_digest: &mut Option<String>,
) -> anyhow::Result<Option<ActivationReport>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let digest = sha256_hex(&bytes);
    if last_digest.as_deref() == Some(digest.as_str()) {
        debug!(path = %path.display(), "hot-reload: content unchanged");
        return Ok(None);
    }

    let doc = spec::parse_spec(&bytes)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let report = api.generate_and_activate(&doc)?;
    *last_digest = Some(digest);
    Ok(Some(report))
}

/// Watch `spec_path` and activate a new module on every content change.
///
/// The returned watcher must be kept alive for reloads to continue.
pub fn watch_spec<P>(spec_path: P, api: Arc<LiveApi>) -> notify::Result<RecommendedWatcher>
where
    P: AsRef<Path>,
{
    let path: PathBuf = spec_path.as_ref().to_path_buf();
    let watch_path = path.clone();
    let mut last_digest: Option<String> = std::fs::read(&path).ok().map(|b| sha256_hex(&b));

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    return;
                }
                match reload_from_file(&watch_path, &api, &mut last_digest) {
                    Ok(Some(report)) => info!(
                        path = %watch_path.display(),
                        version = report.version,
                        groups = ?report.groups,
                        "hot-reload: applied specification change"
                    ),
                    Ok(None) => {}
                    Err(e) => error!(
                        path = %watch_path.display(),
                        error = %format!("{e:#}"),
                        "hot-reload: keeping the active module"
                    ),
                }
            }
            Err(e) => warn!(error = %e, "hot-reload: watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&path, RecursiveMode::NonRecursive)?;
    info!(path = %path.display(), "hot-reload: watching specification");
    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratorConfig;
    use crate::handlers::HandlerCatalog;
    use std::io::Write;

    const SPEC: &str = r#"openapi: 3.1.0
info: { title: Reload, version: '1' }
paths:
  /items:
    get:
      operationId: listItems
      responses:
        '200':
          description: OK
          content:
            application/json:
              schema: { type: array }
"#;

    #[test]
    fn test_reload_activates_and_skips_unchanged() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SPEC.as_bytes()).unwrap();
        let api = LiveApi::new(GeneratorConfig::default(), HandlerCatalog::new());
        let mut last = None;

        let report = reload_from_file(file.path(), &api, &mut last).unwrap().unwrap();
        assert_eq!(report.version, 1);
        assert_eq!(report.groups, vec!["Items".to_string()]);

        assert!(reload_from_file(file.path(), &api, &mut last).unwrap().is_none());
        assert_eq!(api.status().version, 1);
    }

    #[test]
    fn test_broken_file_keeps_module() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SPEC.as_bytes()).unwrap();
        let api = LiveApi::new(GeneratorConfig::default(), HandlerCatalog::new());
        let mut last = None;
        reload_from_file(file.path(), &api, &mut last).unwrap();

        std::fs::write(file.path(), "openapi: [").unwrap();
        assert!(reload_from_file(file.path(), &api, &mut last).is_err());
        assert_eq!(api.status().version, 1);
        assert_eq!(api.dispatch("Items", "listItems").unwrap(), serde_json::json!([]));
    }
}
