//! Public entry point: generate, build and activate handler modules at run time, and
//! dispatch calls against them.
//!
//! ```rust
//! use liveroute::generator::GeneratorConfig;
//! use liveroute::handlers::HandlerCatalog;
//! use liveroute::live::LiveApi;
//! use liveroute::spec::{OperationDescriptor, ResultShape, SpecDocument};
//! use serde_json::json;
//!
//! let api = LiveApi::new(GeneratorConfig::default(), HandlerCatalog::new());
//! let doc = SpecDocument::new("Widgets", "1").with_operation(OperationDescriptor::new(
//!     "listWidgets",
//!     http::Method::GET,
//!     "/widgets",
//!     ResultShape::from_schema(json!({"type": "array"})),
//! ));
//!
//! let report = api.generate_and_activate(&doc).unwrap();
//! assert_eq!(report.version, 1);
//! assert_eq!(api.dispatch("Widgets", "listWidgets").unwrap(), json!([]));
//! ```

use crate::builder::{build_module, BuildEnvironment, BuildFailure, Diagnostic};
use crate::dispatcher::{DispatchError, Dispatcher};
use crate::generator::{generate, GenerationError, GenerationWarning, GeneratorConfig};
use crate::handlers::HandlerCatalog;
use crate::ids::DispatchId;
use crate::registry::ActiveModuleRegistry;
use crate::spec::SpecDocument;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

/// Result of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    /// Version assigned to the newly active module
    pub version: u64,
    /// Generation warnings followed by build warnings
    pub warnings: Vec<String>,
    /// Handler groups the module declares
    pub groups: Vec<String>,
    /// Hex SHA-256 of the generated source
    pub source_digest: String,
}

/// Activation did not happen; the previously active module keeps serving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationError {
    Generation(GenerationError),
    Build(BuildFailure),
}

impl ActivationError {
    /// Diagnostics suitable for an error response body
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            ActivationError::Generation(_) => Vec::new(),
            ActivationError::Build(failure) => failure.diagnostics.clone(),
        }
    }
}

impl fmt::Display for ActivationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivationError::Generation(e) => write!(f, "generation failed: {e}"),
            ActivationError::Build(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ActivationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ActivationError::Generation(e) => Some(e),
            ActivationError::Build(e) => Some(e),
        }
    }
}

impl From<GenerationError> for ActivationError {
    fn from(e: GenerationError) -> Self {
        ActivationError::Generation(e)
    }
}

impl From<BuildFailure> for ActivationError {
    fn from(e: BuildFailure) -> Self {
        ActivationError::Build(e)
    }
}

/// Point-in-time view of the active module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveStatus {
    pub has_active_module: bool,
    pub version: u64,
    pub declared_handler_groups: Vec<String>,
}

/// Runtime-regenerable API surface.
pub struct LiveApi {
    config: GeneratorConfig,
    env: BuildEnvironment,
    registry: Arc<ActiveModuleRegistry>,
    dispatcher: Dispatcher,
    activation_lock: Mutex<()>,
}

impl LiveApi {
    /// Create an API with no active module. `static_groups` are always reachable.
    pub fn new(config: GeneratorConfig, static_groups: HandlerCatalog) -> Self {
        Self::with_environment(config, BuildEnvironment::default(), static_groups)
    }

    pub fn with_environment(
        config: GeneratorConfig,
        env: BuildEnvironment,
        static_groups: HandlerCatalog,
    ) -> Self {
        let registry = Arc::new(ActiveModuleRegistry::new());
        let dispatcher = Dispatcher::new(static_groups, Arc::clone(&registry));
        Self {
            config,
            env,
            registry,
            dispatcher,
            activation_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ActiveModuleRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Generate handlers for `doc`, build them, and make them the active module.
    ///
    /// Passes are serialized. On any error nothing changes: the previous module and
    /// version keep serving.
    ///
    /// # Errors
    ///
    /// [`ActivationError::Generation`] or [`ActivationError::Build`].
    pub fn generate_and_activate(
        &self,
        doc: &SpecDocument,
    ) -> Result<ActivationReport, ActivationError> {
        let _guard = self
            .activation_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let source = generate(doc, &self.config).map_err(|e| {
            error!(title = %doc.title, error = %e, "Handler generation failed");
            ActivationError::from(e)
        })?;
        let module = build_module(&source, &self.env).map_err(|e| {
            error!(
                title = %doc.title,
                errors = e.errors().count(),
                "Handler module build failed; keeping the active module"
            );
            ActivationError::from(e)
        })?;

        let warnings: Vec<String> = source
            .warnings()
            .iter()
            .map(GenerationWarning::to_string)
            .chain(module.warnings().iter().map(Diagnostic::to_string))
            .collect();
        let groups = module.group_names();
        let source_digest = module.digest().to_string();
        let version = self.registry.replace(module);

        if !warnings.is_empty() {
            warn!(version = version, warnings = warnings.len(), "Module activated with warnings");
        }
        info!(
            title = %doc.title,
            spec_version = %doc.version,
            version = version,
            groups = ?groups,
            "Generated API is live"
        );

        Ok(ActivationReport {
            version,
            warnings,
            groups,
            source_digest,
        })
    }

    /// Dispatch a call by group and operation name.
    pub fn dispatch(&self, group: &str, operation: &str) -> Result<Value, DispatchError> {
        self.dispatcher.dispatch(group, operation)
    }

    /// Dispatch under a caller-supplied id (e.g. from a request header).
    pub fn dispatch_with_id(
        &self,
        dispatch_id: DispatchId,
        group: &str,
        operation: &str,
    ) -> Result<Value, DispatchError> {
        self.dispatcher.dispatch_with_id(dispatch_id, group, operation)
    }

    #[must_use]
    pub fn status(&self) -> LiveStatus {
        let snap = self.registry.current_snapshot();
        LiveStatus {
            has_active_module: !snap.is_empty(),
            version: snap.version(),
            declared_handler_groups: snap.module().map(|m| m.group_names()).unwrap_or_default(),
        }
    }
}

impl fmt::Debug for LiveApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveApi")
            .field("config", &self.config)
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{OperationDescriptor, ResultShape};
    use serde_json::json;

    fn widgets() -> SpecDocument {
        SpecDocument::new("Widgets", "1").with_operation(OperationDescriptor::new(
            "listWidgets",
            http::Method::GET,
            "/widgets",
            ResultShape::from_schema(json!({"type": "array"})),
        ))
    }

    #[test]
    fn test_build_failure_keeps_previous_module() {
        let mut api = LiveApi::new(GeneratorConfig::default(), HandlerCatalog::new());
        let report = api.generate_and_activate(&widgets()).unwrap();
        assert_eq!(report.version, 1);
        let before = api.status();

        // Narrowing the allow-list makes every later build fail on its imports.
        api.env = BuildEnvironment::empty();
        let gadgets = SpecDocument::new("Gadgets", "2").with_operation(OperationDescriptor::new(
            "listGadgets",
            http::Method::GET,
            "/gadgets",
            ResultShape::from_schema(json!({"type": "array"})),
        ));
        let err = api.generate_and_activate(&gadgets).unwrap_err();
        assert!(matches!(err, ActivationError::Build(_)));
        assert!(!err.diagnostics().is_empty());

        let after = api.status();
        assert_eq!(after, before);
        assert_eq!(after.version, 1);
        assert_eq!(after.declared_handler_groups, vec!["Widgets".to_string()]);
        assert_eq!(api.dispatch("Widgets", "listWidgets").unwrap(), json!([]));
        assert!(matches!(
            api.dispatch("Gadgets", "listGadgets"),
            Err(DispatchError::HandlerGroupNotFound { .. })
        ));
    }

    #[test]
    fn test_generation_failure_reports_no_diagnostics() {
        let config = GeneratorConfig {
            default_group: String::new(),
            ..GeneratorConfig::default()
        };
        let api = LiveApi::new(config, HandlerCatalog::new());
        let err = api.generate_and_activate(&widgets()).unwrap_err();
        assert!(matches!(
            err,
            ActivationError::Generation(GenerationError::InvalidDefaultGroup { .. })
        ));
        assert!(err.diagnostics().is_empty());
        assert_eq!(api.status().version, 0);
    }
}
