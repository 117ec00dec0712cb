use super::diagnostics::{Diagnostic, Location};
use super::parser::{Body, GroupDecl, Item, SymbolPath};
use super::{BuildEnvironment, HANDLER_BASE, RESULT_WRAPPER};
use crate::handlers::{GroupBuilder, HandlerCatalog, HandlerGroupType};
use std::collections::{HashMap, HashSet};

/// Instance type of every generated group. Generated operations carry no state.
struct GeneratedGroup;

struct Import {
    path: String,
    location: Location,
    used: bool,
}

/// Name resolution and lowering of parsed items into a catalog.
pub(crate) struct Translator<'e> {
    env: &'e BuildEnvironment,
    imports: HashMap<String, Import>,
    import_order: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<'e> Translator<'e> {
    pub fn new(env: &'e BuildEnvironment) -> Self {
        Self {
            env,
            imports: HashMap::new(),
            import_order: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn import(&mut self, path: &SymbolPath) {
        let full = path.joined();
        if !self.env.contains(&full) {
            self.diagnostics.push(Diagnostic::error(
                format!("unresolved import `{full}`"),
                path.location,
            ));
            return;
        }
        let alias = path.segments.last().cloned().unwrap_or_default();
        match self.imports.get(&alias) {
            Some(existing) if existing.path == full => {
                self.diagnostics.push(Diagnostic::warning(
                    format!("`{full}` is imported more than once"),
                    path.location,
                ));
            }
            Some(existing) => {
                self.diagnostics.push(Diagnostic::error(
                    format!(
                        "`{alias}` is already imported as `{}` at {}",
                        existing.path, existing.location
                    ),
                    path.location,
                ));
            }
            None => {
                self.import_order.push(alias.clone());
                self.imports.insert(
                    alias,
                    Import {
                        path: full,
                        location: path.location,
                        used: false,
                    },
                );
            }
        }
    }

    /// Resolve a type path to the fully qualified symbol it names.
    fn resolve(&mut self, path: &SymbolPath) -> Option<String> {
        if let [single] = path.segments.as_slice() {
            if let Some(import) = self.imports.get_mut(single) {
                import.used = true;
                return Some(import.path.clone());
            }
        } else {
            let full = path.joined();
            if self.env.contains(&full) {
                return Some(full);
            }
        }
        self.diagnostics.push(Diagnostic::error(
            format!("cannot find `{}` in this module", path.joined()),
            path.location,
        ));
        None
    }

    fn expect_symbol(&mut self, path: &SymbolPath, expected: &str, role: &str) {
        if let Some(found) = self.resolve(path) {
            if found != expected {
                self.diagnostics.push(Diagnostic::error(
                    format!("{role} must be `{expected}`, found `{found}`"),
                    path.location,
                ));
            }
        }
    }

    fn group(&mut self, decl: &GroupDecl) -> HandlerGroupType {
        self.expect_symbol(
            &decl.base,
            HANDLER_BASE,
            &format!("base of group `{}`", decl.name),
        );
        if decl.ops.is_empty() {
            self.diagnostics.push(Diagnostic::warning(
                format!("group `{}` declares no operations", decl.name),
                decl.location,
            ));
        }

        let mut builder = GroupBuilder::new(decl.name.clone(), || Ok(GeneratedGroup));
        let mut seen: HashMap<&str, Location> = HashMap::new();
        for op in &decl.ops {
            self.expect_symbol(
                &op.returns,
                RESULT_WRAPPER,
                &format!("result type of `{}.{}`", decl.name, op.name),
            );
            if let Some(first) = seen.get(op.name.as_str()) {
                self.diagnostics.push(Diagnostic::error(
                    format!(
                        "operation `{}` is defined more than once in group `{}` (first at {first})",
                        op.name, decl.name
                    ),
                    op.location,
                ));
                continue;
            }
            seen.insert(&op.name, op.location);

            builder = match &op.body {
                Body::Value(value) => {
                    let value = value.clone();
                    builder.operation(op.name.clone(), move |_: &mut GeneratedGroup| {
                        Ok(value.clone())
                    })
                }
                Body::Fail(message) => {
                    let message = message.clone();
                    builder.operation(op.name.clone(), move |_: &mut GeneratedGroup| {
                        Err(anyhow::Error::msg(message.clone()))
                    })
                }
            };
        }
        builder.build()
    }

    /// Lower all items. The returned catalog is only meaningful when no error was recorded.
    pub fn translate(&mut self, items: &[Item]) -> HandlerCatalog {
        // Imports are module-wide, so resolve them before any group refers to them.
        for item in items {
            if let Item::Use(path) = item {
                self.import(path);
            }
        }

        let mut catalog = HandlerCatalog::new();
        let mut group_sites: HashSet<String> = HashSet::new();
        for item in items {
            let Item::Group(decl) = item else { continue };
            let group = self.group(decl);
            if !group_sites.insert(decl.name.to_lowercase()) {
                self.diagnostics.push(Diagnostic::error(
                    format!("group `{}` is defined more than once", decl.name),
                    decl.location,
                ));
                continue;
            }
            if let Err(e) = catalog.register(group) {
                self.diagnostics
                    .push(Diagnostic::error(e.to_string(), decl.location));
            }
        }

        for alias in &self.import_order {
            if let Some(import) = self.imports.get(alias) {
                if !import.used {
                    self.diagnostics.push(Diagnostic::warning(
                        format!("unused import `{}`", import.path),
                        import.location,
                    ));
                }
            }
        }
        self.diagnostics.sort_by_key(|d| (d.location.line, d.location.column));
        catalog
    }
}
