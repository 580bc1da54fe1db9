//! Symbolic export table.
//!
//! Exports are registered once through [`ExportResolverBuilder`] while
//! modules load, then frozen into an [`ExportResolver`] that never changes.
//! Call sites resolve a [`BoundExport`] once and invoke it directly from then
//! on, so steady-state dispatch never touches the table.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::call::{Handler, ShimCall};
use crate::error::{ExportError, ExportResult};

/// A registered export.
pub struct ExportRecord {
    module: String,
    name: String,
    params: &'static [&'static str],
    handler: Box<dyn Handler>,
}

impl ExportRecord {
    /// The module the export belongs to.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The export name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the positional arguments.
    pub fn params(&self) -> &'static [&'static str] {
        self.params
    }

    /// Number of positional arguments.
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl std::fmt::Debug for ExportRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportRecord")
            .field("module", &self.module)
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

type ExportTable = BTreeMap<String, BTreeMap<String, Arc<ExportRecord>>>;

/// Registration phase of the export table.
#[derive(Default)]
pub struct ExportResolverBuilder {
    exports: ExportTable,
}

impl ExportResolverBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if an export is already registered.
    pub fn is_registered(&self, module: &str, name: &str) -> bool {
        self.exports
            .get(module)
            .is_some_and(|names| names.contains_key(name))
    }

    /// Register an export.
    ///
    /// # Arguments
    ///
    /// * `module` - The module name, e.g. `xam.xex`
    /// * `name` - The export name
    /// * `params` - Names of the positional arguments, in order
    /// * `handler` - The shim implementation
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::DuplicateExport`] if the key is taken.
    pub fn register(
        &mut self,
        module: &str,
        name: &str,
        params: &'static [&'static str],
        handler: impl Handler + 'static,
    ) -> ExportResult<&mut Self> {
        if self.is_registered(module, name) {
            return Err(ExportError::DuplicateExport {
                module: module.to_string(),
                name: name.to_string(),
            });
        }

        let record = ExportRecord {
            module: module.to_string(),
            name: name.to_string(),
            params,
            handler: Box::new(handler),
        };

        self.exports
            .entry(module.to_string())
            .or_default()
            .insert(name.to_string(), Arc::new(record));

        debug!(module, name, arity = params.len(), "Registered export");
        Ok(self)
    }

    /// Number of registered exports.
    pub fn len(&self) -> usize {
        self.exports.values().map(BTreeMap::len).sum()
    }

    /// Check if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Freeze the table.
    pub fn build(self) -> ExportResolver {
        let resolver = ExportResolver {
            exports: self.exports,
        };
        info!(exports = resolver.len(), "Export table frozen");
        resolver
    }
}

impl std::fmt::Debug for ExportResolverBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportResolverBuilder")
            .field("exports", &self.len())
            .finish()
    }
}

/// Read-only export table.
pub struct ExportResolver {
    exports: ExportTable,
}

impl ExportResolver {
    /// Resolve `(module, name)` to a callable export.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::UnknownExport`] if nothing is registered under
    /// that key.
    pub fn resolve(&self, module: &str, name: &str) -> ExportResult<BoundExport> {
        self.exports
            .get(module)
            .and_then(|names| names.get(name))
            .map(|record| BoundExport {
                record: Arc::clone(record),
            })
            .ok_or_else(|| ExportError::UnknownExport {
                module: module.to_string(),
                name: name.to_string(),
            })
    }

    /// Check if an export is registered.
    pub fn contains(&self, module: &str, name: &str) -> bool {
        self.exports
            .get(module)
            .is_some_and(|names| names.contains_key(name))
    }

    /// All exports, ordered by module then name.
    pub fn exports(&self) -> impl Iterator<Item = &ExportRecord> + '_ {
        self.exports
            .values()
            .flat_map(|names| names.values())
            .map(|record| record.as_ref())
    }

    /// Number of registered exports.
    pub fn len(&self) -> usize {
        self.exports.values().map(BTreeMap::len).sum()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ExportResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportResolver")
            .field("exports", &self.len())
            .finish()
    }
}

/// An export resolved at bind time.
#[derive(Clone)]
pub struct BoundExport {
    record: Arc<ExportRecord>,
}

impl BoundExport {
    /// The export's registration record.
    pub fn record(&self) -> &ExportRecord {
        &self.record
    }

    /// The module name.
    pub fn module(&self) -> &str {
        self.record.module()
    }

    /// The export name.
    pub fn name(&self) -> &str {
        self.record.name()
    }

    /// Names of the positional arguments.
    pub fn params(&self) -> &'static [&'static str] {
        self.record.params()
    }

    /// Run the handler.
    pub fn invoke(&self, call: &mut ShimCall<'_>) {
        self.record.handler.invoke(call);
    }

    /// Check if two bindings refer to the same registration.
    pub fn same_export(&self, other: &BoundExport) -> bool {
        Arc::ptr_eq(&self.record, &other.record)
    }
}

impl std::fmt::Debug for BoundExport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundExport")
            .field("module", &self.module())
            .field("name", &self.name())
            .finish()
    }
}
