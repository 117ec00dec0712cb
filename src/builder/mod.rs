//! # Module Builder
//!
//! Turns [`GeneratedSource`] text into an executable [`HandlerModule`].
//!
//! The builder is an embedded interpreter for the handler-module language emitted by
//! the [generator](crate::generator): it parses the text, resolves every referenced
//! symbol against a [`BuildEnvironment`], and lowers each `group` into a
//! [`HandlerGroupType`](crate::handlers::HandlerGroupType) whose operations are plain
//! closures.
//!
//! A build either yields a complete module or a [`BuildFailure`] listing every
//! diagnostic. Nothing outside the return value is touched, so a failed build can be
//! retried freely and never disturbs the module that is currently serving.
//!
//! ## Example
//!
//! ```rust
//! use liveroute::builder::{build_module, BuildEnvironment};
//! use liveroute::generator::GeneratedSource;
//!
//! let source = GeneratedSource::new(
//!     "use handler::Base;\nuse result::Json;\ngroup Pets : Base { op list() -> Json = []; }",
//!     vec!["Pets".to_string()],
//! );
//! let module = build_module(&source, &BuildEnvironment::default()).unwrap();
//! assert_eq!(module.group_names(), vec!["Pets".to_string()]);
//! ```

mod diagnostics;
mod parser;
mod translate;


pub use diagnostics::{BuildFailure, Diagnostic, Location, Severity};

use crate::generator::GeneratedSource;
use crate::handlers::HandlerCatalog;
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, error, warn};

/// Symbol every group must derive from
pub const HANDLER_BASE: &str = "handler::Base";
/// Symbol every operation must return
pub const RESULT_WRAPPER: &str = "result::Json";

static DEFAULT_SYMBOLS: Lazy<BTreeSet<String>> = Lazy::new(|| {
    [
        HANDLER_BASE,
        RESULT_WRAPPER,
        "std::string::String",
        "std::vec::Vec",
        "std::option::Option",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
});

/// External symbols a module may import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEnvironment {
    symbols: BTreeSet<String>,
}

impl Default for BuildEnvironment {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS.clone(),
        }
    }
}

impl BuildEnvironment {
    /// Environment with no symbols at all; every import fails.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            symbols: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_symbol(mut self, path: impl Into<String>) -> Self {
        self.symbols.insert(path.into());
        self
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.symbols.contains(path)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }
}

/// A successfully built module, ready to be activated.
pub struct HandlerModule {
    catalog: HandlerCatalog,
    warnings: Vec<Diagnostic>,
    digest: String,
}

impl HandlerModule {
    /// Handler groups in declaration order
    #[must_use]
    pub fn group_names(&self) -> Vec<String> {
        self.catalog.group_names()
    }

    #[must_use]
    pub fn catalog(&self) -> &HandlerCatalog {
        &self.catalog
    }

    /// Warning diagnostics produced by the build
    #[must_use]
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Hex SHA-256 of the source text this module was built from
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl fmt::Debug for HandlerModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerModule")
            .field("groups", &self.catalog.group_names())
            .field("warnings", &self.warnings.len())
            .field("digest", &self.digest)
            .finish()
    }
}

/// Lower-case hex SHA-256 of `bytes`
pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Build `source` into a [`HandlerModule`].
///
/// # Errors
///
/// Returns [`BuildFailure`] if any diagnostic has error severity. The failure carries
/// the warnings too, in source order.
pub fn build_module(
    source: &GeneratedSource,
    env: &BuildEnvironment,
) -> Result<HandlerModule, BuildFailure> {
    let items = match parser::parse_module(source.text()) {
        Ok(items) => items,
        Err(diagnostic) => {
            error!(diagnostic = %diagnostic, "Handler module failed to parse");
            return Err(BuildFailure {
                diagnostics: vec![diagnostic],
            });
        }
    };

    let mut translator = translate::Translator::new(env);
    let catalog = translator.translate(&items);
    let diagnostics = translator.diagnostics;

    if diagnostics.iter().any(Diagnostic::is_error) {
        for d in diagnostics.iter().filter(|d| d.is_error()) {
            error!(line = d.location.line, column = d.location.column, message = %d.message, "Handler module build error");
        }
        return Err(BuildFailure { diagnostics });
    }

    for d in &diagnostics {
        warn!(line = d.location.line, column = d.location.column, message = %d.message, "Handler module build warning");
    }
    let digest = sha256_hex(source.text().as_bytes());
    debug!(groups = ?catalog.group_names(), digest = %digest, "Built handler module");

    Ok(HandlerModule {
        catalog,
        warnings: diagnostics,
        digest,
    })
}
