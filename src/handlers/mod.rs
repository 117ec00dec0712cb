//! # Handlers Module
//!
//! Capability-typed handler groups: the unit the dispatcher resolves by name.
//!
//! A [`HandlerGroupType`] is registered under a name together with a factory that
//! creates a fresh instance and a map of operation name to invocable function. The map
//! is built once at registration time, so invoking "by name" is a map lookup rather than
//! runtime introspection.
//!
//! Groups are collected in a [`HandlerCatalog`]. The host builds one at startup for its
//! statically compiled groups; the module builder produces another for every generated
//! module.
//!
//! ```rust
//! use liveroute::handlers::{GroupBuilder, HandlerCatalog};
//! use serde_json::json;
//!
//! #[derive(Default)]
//! struct Greeter {
//!     greeting: &'static str,
//! }
//!
//! let greeter = GroupBuilder::new("Greeter", || Ok(Greeter { greeting: "hello" }))
//!     .operation("SayHello", |g: &mut Greeter| Ok(json!(g.greeting)))
//!     .build();
//!
//! let mut catalog = HandlerCatalog::new();
//! catalog.register(greeter).unwrap();
//! assert!(catalog.find("greeter").is_some());
//! ```

use serde_json::Value;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

/// Type-erased handler group instance
pub type GroupInstance = Box<dyn Any + Send>;

type Factory = Arc<dyn Fn() -> anyhow::Result<GroupInstance> + Send + Sync>;
type Invocable = Arc<dyn Fn(&mut (dyn Any + Send)) -> anyhow::Result<Value> + Send + Sync>;

/// A named, zero-argument operation resolved on a [`HandlerGroup`].
#[derive(Clone)]
pub struct Operation {
    name: Arc<str>,
    func: Invocable,
}

impl Operation {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation").field("name", &self.name).finish()
    }
}

/// Registration record for one handler group.
pub struct HandlerGroupType {
    name: String,
    factory: Factory,
    operations: BTreeMap<String, Operation>,
    declared: Vec<String>,
}

impl HandlerGroupType {
    /// Group name as registered (original casing)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operation names in registration order
    #[must_use]
    pub fn operation_names(&self) -> &[String] {
        &self.declared
    }

    /// Create a fresh instance of this group.
    ///
    /// Every call runs the factory again; instances are never shared between calls.
    pub fn instantiate(self: &Arc<Self>) -> anyhow::Result<HandlerGroup> {
        let instance = (self.factory)()?;
        Ok(HandlerGroup {
            ty: Arc::clone(self),
            instance,
        })
    }
}

impl fmt::Debug for HandlerGroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerGroupType")
            .field("name", &self.name)
            .field("operations", &self.declared)
            .finish()
    }
}

/// A live instance of a handler group, owned by a single dispatch call.
pub struct HandlerGroup {
    ty: Arc<HandlerGroupType>,
    instance: GroupInstance,
}

impl HandlerGroup {
    #[must_use]
    pub fn group_name(&self) -> &str {
        self.ty.name()
    }

    /// Look up an operation by exact, case-sensitive name.
    #[must_use]
    pub fn resolve(&self, operation: &str) -> Option<Operation> {
        self.ty.operations.get(operation).cloned()
    }

    /// Invoke a previously resolved operation with no arguments.
    pub fn invoke(&mut self, operation: &Operation) -> anyhow::Result<Value> {
        (operation.func)(self.instance.as_mut())
    }
}

/// Typed builder for a [`HandlerGroupType`].
///
/// `G` is the concrete instance type; operations receive `&mut G`.
pub struct GroupBuilder<G> {
    name: String,
    factory: Factory,
    operations: BTreeMap<String, Operation>,
    declared: Vec<String>,
    _group: PhantomData<fn() -> G>,
}

impl<G: Any + Send> GroupBuilder<G> {
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<G> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || factory().map(|g| Box::new(g) as GroupInstance));
        Self {
            name: name.into(),
            factory,
            operations: BTreeMap::new(),
            declared: Vec::new(),
            _group: PhantomData,
        }
    }

    /// Register an operation. If the name is already taken the first registration is kept.
    #[must_use]
    pub fn operation<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut G) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.operations.contains_key(&name) {
            warn!(group = %self.name, operation = %name, "Duplicate operation ignored");
            return self;
        }
        let func: Invocable = Arc::new(move |inst: &mut (dyn Any + Send)| {
            match inst.downcast_mut::<G>() {
                Some(g) => f(g),
                None => Err(anyhow::anyhow!("handler group instance has an unexpected type")),
            }
        });
        self.operations.insert(
            name.clone(),
            Operation {
                name: Arc::from(name.as_str()),
                func,
            },
        );
        self.declared.push(name);
        self
    }

    #[must_use]
    pub fn build(self) -> HandlerGroupType {
        HandlerGroupType {
            name: self.name,
            factory: self.factory,
            operations: self.operations,
            declared: self.declared,
        }
    }
}

/// Error returned when registering a group whose name is already taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// A group with the same case-insensitive name exists
    DuplicateGroup { name: String, existing: String },
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::DuplicateGroup { name, existing } => write!(
                f,
                "handler group '{name}' conflicts with already registered group '{existing}'"
            ),
        }
    }
}

impl std::error::Error for RegistrationError {}

fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

/// Ordered set of handler groups with case-insensitive lookup.
#[derive(Clone, Default)]
pub struct HandlerCatalog {
    groups: Vec<Arc<HandlerGroupType>>,
    index: HashMap<String, usize>,
}

impl HandlerCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group. Names are compared case-insensitively.
    pub fn register(&mut self, group: HandlerGroupType) -> Result<(), RegistrationError> {
        let key = fold_name(&group.name);
        if let Some(&idx) = self.index.get(&key) {
            return Err(RegistrationError::DuplicateGroup {
                name: group.name,
                existing: self.groups[idx].name.clone(),
            });
        }
        self.index.insert(key, self.groups.len());
        self.groups.push(Arc::new(group));
        Ok(())
    }

    /// Find a group by case-insensitive name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Arc<HandlerGroupType>> {
        self.index
            .get(&fold_name(name))
            .and_then(|&idx| self.groups.get(idx))
    }

    /// Group names in registration order
    #[must_use]
    pub fn group_names(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.name.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl fmt::Debug for HandlerCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.groups.iter()).finish()
    }
}
