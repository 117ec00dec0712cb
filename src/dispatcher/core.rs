use crate::handlers::{HandlerCatalog, HandlerGroupType};
use crate::ids::DispatchId;
use crate::registry::{ActiveModuleRegistry, ModuleSnapshot};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Failure of a single dispatch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No static or generated group has this name
    HandlerGroupNotFound { group: String },
    /// The group exists but has no operation with this exact name
    OperationNotFound { group: String, operation: String },
    /// The group's factory failed or panicked
    InstantiationError { group: String, message: String },
    /// The operation returned an error or panicked
    InvocationFailed {
        group: String,
        operation: String,
        message: String,
    },
}

impl DispatchError {
    /// HTTP status the transport should answer with
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            DispatchError::HandlerGroupNotFound { .. } | DispatchError::OperationNotFound { .. } => {
                404
            }
            DispatchError::InstantiationError { .. } | DispatchError::InvocationFailed { .. } => 500,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::HandlerGroupNotFound { group } => {
                write!(f, "handler group '{group}' not found")
            }
            DispatchError::OperationNotFound { group, operation } => {
                write!(f, "operation '{operation}' not found on handler group '{group}'")
            }
            DispatchError::InstantiationError { group, message } => {
                write!(f, "failed to instantiate handler group '{group}': {message}")
            }
            DispatchError::InvocationFailed {
                group,
                operation,
                message,
            } => write!(f, "operation '{group}.{operation}' failed: {message}"),
        }
    }
}

impl std::error::Error for DispatchError {}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Routes `(group, operation)` calls to static groups or the active generated module.
#[derive(Clone)]
pub struct Dispatcher {
    static_groups: Arc<HandlerCatalog>,
    registry: Arc<ActiveModuleRegistry>,
}

impl Dispatcher {
    pub fn new(static_groups: HandlerCatalog, registry: Arc<ActiveModuleRegistry>) -> Self {
        Self {
            static_groups: Arc::new(static_groups),
            registry,
        }
    }

    /// Statically registered groups
    #[must_use]
    pub fn static_groups(&self) -> &HandlerCatalog {
        &self.static_groups
    }

    /// Dispatch with a freshly generated [`DispatchId`].
    pub fn dispatch(&self, group: &str, operation: &str) -> Result<Value, DispatchError> {
        self.dispatch_with_id(DispatchId::new(), group, operation)
    }

    /// Resolve `group` and `operation` and invoke the operation.
    ///
    /// # Errors
    ///
    /// See [`DispatchError`]. Handler errors and panics are caught and logged here.
    pub fn dispatch_with_id(
        &self,
        dispatch_id: DispatchId,
        group: &str,
        operation: &str,
    ) -> Result<Value, DispatchError> {
        debug!(
            dispatch_id = %dispatch_id,
            group = %group,
            operation = %operation,
            "Dispatch started"
        );

        // The snapshot stays pinned until the call returns, so the module cannot be
        // released mid-call.
        let (group_type, source, pinned): (_, _, Option<Arc<ModuleSnapshot>>) =
            match self.static_groups.find(group) {
                Some(ty) => (Arc::clone(ty), "static", None),
                None => {
                    let snap = self.registry.current_snapshot();
                    let Some(ty) = snap
                        .module()
                        .and_then(|m| m.catalog().find(group))
                        .map(Arc::clone)
                    else {
                        warn!(
                            dispatch_id = %dispatch_id,
                            group = %group,
                            module_version = snap.version(),
                            has_active_module = !snap.is_empty(),
                            "Handler group not found"
                        );
                        return Err(DispatchError::HandlerGroupNotFound {
                            group: group.to_string(),
                        });
                    };
                    (ty, "generated", Some(snap))
                }
            };

        let version = pinned.as_ref().map(|s| s.version());
        self.invoke(dispatch_id, &group_type, source, version, operation)
    }

    fn invoke(
        &self,
        dispatch_id: DispatchId,
        group_type: &Arc<HandlerGroupType>,
        source: &'static str,
        module_version: Option<u64>,
        operation: &str,
    ) -> Result<Value, DispatchError> {
        let group_name = group_type.name().to_string();

        let mut instance = match catch_unwind(AssertUnwindSafe(|| group_type.instantiate())) {
            Ok(Ok(instance)) => instance,
            Ok(Err(e)) => {
                error!(
                    dispatch_id = %dispatch_id,
                    group = %group_name,
                    source = source,
                    error = %format!("{e:#}"),
                    "Handler group instantiation failed"
                );
                return Err(DispatchError::InstantiationError {
                    group: group_name,
                    message: format!("{e:#}"),
                });
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(
                    dispatch_id = %dispatch_id,
                    group = %group_name,
                    source = source,
                    panic_message = %message,
                    "Handler group factory panicked"
                );
                return Err(DispatchError::InstantiationError {
                    group: group_name,
                    message,
                });
            }
        };

        let Some(op) = instance.resolve(operation) else {
            warn!(
                dispatch_id = %dispatch_id,
                group = %group_name,
                operation = %operation,
                available = ?group_type.operation_names(),
                "Operation not found"
            );
            return Err(DispatchError::OperationNotFound {
                group: group_name,
                operation: operation.to_string(),
            });
        };

        let started = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| instance.invoke(&op)));
        let execution_time_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(value)) => {
                info!(
                    dispatch_id = %dispatch_id,
                    group = %group_name,
                    operation = %operation,
                    source = source,
                    module_version = ?module_version,
                    execution_time_ms = execution_time_ms,
                    "Dispatch complete"
                );
                Ok(value)
            }
            Ok(Err(e)) => {
                let message = format!("{e:#}");
                error!(
                    dispatch_id = %dispatch_id,
                    group = %group_name,
                    operation = %operation,
                    source = source,
                    module_version = ?module_version,
                    error = %message,
                    "Operation returned an error"
                );
                Err(DispatchError::InvocationFailed {
                    group: group_name,
                    operation: operation.to_string(),
                    message,
                })
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                let backtrace = std::backtrace::Backtrace::capture();
                error!(
                    dispatch_id = %dispatch_id,
                    group = %group_name,
                    operation = %operation,
                    source = source,
                    module_version = ?module_version,
                    panic_message = %message,
                    backtrace = %backtrace,
                    "Operation panicked - CRITICAL"
                );
                Err(DispatchError::InvocationFailed {
                    group: group_name,
                    operation: operation.to_string(),
                    message,
                })
            }
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("static_groups", &self.static_groups.group_names())
            .field("module_version", &self.registry.current_snapshot().version())
            .finish()
    }
}
