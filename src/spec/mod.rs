//! # Spec Module
//!
//! Turns an OpenAPI 3.x document into the in-memory [`SpecDocument`] the generator consumes.
//!
//! Parsing is done with `oas3`; YAML and JSON inputs are both accepted. For each operation
//! the module records its `operationId`, verb, path and the [`ResultShape`] of its preferred
//! success response, with local `$ref` schemas already expanded.

mod build;
mod load;
mod types;

pub use build::*;
pub use load::*;
pub use types::*;
