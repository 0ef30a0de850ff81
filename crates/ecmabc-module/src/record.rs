//! The linkage record of one source text module.
//!
//! [`SourceTextModuleRecord`] collects the module requests, imports and
//! exports found by the binding pass. It is written by exactly one pass and
//! becomes read-only once handed to the module record serializer.
//!
//! # Implicit indirect exports
//!
//! A local export whose local name is bound by a regular import re-exports
//! the imported binding, so it is stored as an indirect export pointing at
//! the module it was imported from. The conversion happens whichever of the
//! two entries arrives second:
//!
//! ```text
//! export { x }; import { x } from 'm';   // converted by add_import_entry
//! import { x } from 'm'; export { x };   // converted by add_local_export_entry
//! ```
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use ecmabc_module::{ImportEntry, LocalExport, SourceTextModuleRecord};
//!
//! let arena = Bump::new();
//! let mut record = SourceTextModuleRecord::new(&arena);
//!
//! let m = record.add_module_request("./m.js");
//! record.add_import_entry(ImportEntry::new(m, "x", "x"));
//! assert!(record.add_local_export_entry(LocalExport::new("x", "x")));
//!
//! assert_eq!(record.local_exports().count(), 0);
//! assert_eq!(record.indirect_exports().len(), 1);
//! ```

use bumpalo::Bump;
use bumpalo::collections::Vec as BumpVec;
use ecmabc_core::ModuleError;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::entry::{
    ExportEntry, ImportEntry, IndirectExport, LocalExport, ModuleRequestIdx, StarExport,
};

/// Module requests, imports and exports of one module.
pub struct SourceTextModuleRecord<'a> {
    arena: &'a Bump,

    /// Specifiers in first-use order; position is the request index.
    module_requests: BumpVec<'a, &'a str>,
    module_request_map: FxHashMap<&'a str, ModuleRequestIdx>,

    /// All regular imports in registration order.
    regular_imports: BumpVec<'a, ImportEntry<'a>>,
    /// Local name -> positions in `regular_imports`.
    regular_import_index: FxHashMap<&'a str, Vec<usize>>,
    namespace_imports: BumpVec<'a, ImportEntry<'a>>,

    /// Local name -> every export naming it (`export { x as a, x as b }`).
    local_exports: FxHashMap<&'a str, Vec<LocalExport<'a>>>,
    /// Keys of `local_exports` in first-insertion order.
    local_export_order: Vec<&'a str>,
    indirect_exports: BumpVec<'a, IndirectExport<'a>>,
    star_exports: BumpVec<'a, StarExport>,
}

impl<'a> SourceTextModuleRecord<'a> {
    /// Create an empty record whose sequences live in `arena`.
    pub fn new(arena: &'a Bump) -> Self {
        Self {
            arena,
            module_requests: BumpVec::new_in(arena),
            module_request_map: FxHashMap::default(),
            regular_imports: BumpVec::new_in(arena),
            regular_import_index: FxHashMap::default(),
            namespace_imports: BumpVec::new_in(arena),
            local_exports: FxHashMap::default(),
            local_export_order: Vec::new(),
            indirect_exports: BumpVec::new_in(arena),
            star_exports: BumpVec::new_in(arena),
        }
    }

    /// Copy `name` into the record's arena.
    pub fn intern(&self, name: &str) -> &'a str {
        self.arena.alloc_str(name)
    }

    // ==========================================================================
    // Module Requests
    // ==========================================================================

    /// Register a module specifier and return its index.
    ///
    /// A specifier seen before keeps the index it was first given.
    ///
    /// # Panics
    ///
    /// Panics if `specifier` is empty.
    pub fn add_module_request(&mut self, specifier: &'a str) -> ModuleRequestIdx {
        assert!(!specifier.is_empty(), "module request specifier must not be empty");

        if let Some(&idx) = self.module_request_map.get(specifier) {
            return idx;
        }

        let idx = ModuleRequestIdx(self.module_requests.len() as u32);
        self.module_requests.push(specifier);
        self.module_request_map.insert(specifier, idx);
        idx
    }

    // ==========================================================================
    // Imports
    // ==========================================================================

    /// Register a named or default import.
    ///
    /// Local exports already registered for the same local name are converted
    /// into indirect exports of the imported binding.
    ///
    /// # Panics
    ///
    /// Panics if the import or local name is empty or the module request
    /// index was not handed out by this record.
    pub fn add_import_entry(&mut self, entry: ImportEntry<'a>) {
        assert!(!entry.import_name.is_empty(), "regular import needs an import name");
        assert!(!entry.local_name.is_empty(), "import needs a local name");
        self.assert_request(entry.module_request);

        let position = self.regular_imports.len();
        self.regular_imports.push(entry);
        self.regular_import_index
            .entry(entry.local_name)
            .or_default()
            .push(position);

        self.convert_local_exports_to_indirect(&entry);
    }

    /// Register a namespace import, `import * as ns from '...'`.
    ///
    /// # Panics
    ///
    /// Panics if the import name is set, the local name is empty or the
    /// module request index was not handed out by this record.
    pub fn add_star_import_entry(&mut self, entry: ImportEntry<'a>) {
        assert!(entry.import_name.is_empty(), "namespace import must not name a binding");
        assert!(!entry.local_name.is_empty(), "import needs a local name");
        self.assert_request(entry.module_request);

        self.namespace_imports.push(entry);
    }

    // ==========================================================================
    // Exports
    // ==========================================================================

    /// Register `export { local_name as export_name }`.
    ///
    /// If a regular import binds the local name, the entry is registered as an
    /// indirect export instead. Returns `false` when the export name is
    /// already taken; nothing is inserted in that case.
    ///
    /// # Panics
    ///
    /// Panics if either name is empty.
    pub fn add_local_export_entry(&mut self, entry: LocalExport<'a>) -> bool {
        assert!(!entry.local_name.is_empty(), "local export needs a local name");
        assert!(!entry.export_name.is_empty(), "local export needs an export name");

        if let Some(import) = self.first_regular_import(entry.local_name) {
            let indirect = entry.redirect_through(&import);
            trace!(
                export = entry.export_name,
                local = entry.local_name,
                request = %import.module_request,
                "local export of imported binding registered as indirect"
            );
            return self.add_indirect_export_entry(indirect);
        }

        if !self.check_duplicate_exports(entry.export_name) {
            return false;
        }

        match self.local_exports.get_mut(entry.local_name) {
            Some(entries) => entries.push(entry),
            None => {
                self.local_exports.insert(entry.local_name, vec![entry]);
                self.local_export_order.push(entry.local_name);
            }
        }
        true
    }

    /// Register `export { import_name as export_name } from '...'`.
    ///
    /// Returns `false` when the export name is already taken.
    ///
    /// # Panics
    ///
    /// Panics if either name is empty or the module request index was not
    /// handed out by this record.
    pub fn add_indirect_export_entry(&mut self, entry: IndirectExport<'a>) -> bool {
        assert!(!entry.import_name.is_empty(), "indirect export needs an import name");
        assert!(!entry.export_name.is_empty(), "indirect export needs an export name");
        self.assert_request(entry.module_request);

        if !self.check_duplicate_exports(entry.export_name) {
            return false;
        }
        self.indirect_exports.push(entry);
        true
    }

    /// Register `export * from '...'`.
    ///
    /// Star exports are never checked for duplicates; colliding names are
    /// resolved at link time.
    ///
    /// # Panics
    ///
    /// Panics if the module request index was not handed out by this record.
    pub fn add_star_export_entry(&mut self, entry: StarExport) {
        self.assert_request(entry.module_request);
        self.star_exports.push(entry);
    }

    /// Register any export entry. Star exports always succeed.
    pub fn add_export_entry(&mut self, entry: ExportEntry<'a>) -> bool {
        match entry {
            ExportEntry::Local(e) => self.add_local_export_entry(e),
            ExportEntry::Indirect(e) => self.add_indirect_export_entry(e),
            ExportEntry::Star(e) => {
                self.add_star_export_entry(e);
                true
            }
        }
    }

    /// Like [`add_local_export_entry`](Self::add_local_export_entry), failing
    /// with [`ModuleError::DuplicateExport`].
    pub fn try_add_local_export_entry(&mut self, entry: LocalExport<'a>) -> Result<(), ModuleError> {
        if self.add_local_export_entry(entry) {
            Ok(())
        } else {
            Err(ModuleError::duplicate_export(entry.export_name))
        }
    }

    /// Like [`add_indirect_export_entry`](Self::add_indirect_export_entry),
    /// failing with [`ModuleError::DuplicateExport`].
    pub fn try_add_indirect_export_entry(
        &mut self,
        entry: IndirectExport<'a>,
    ) -> Result<(), ModuleError> {
        if self.add_indirect_export_entry(entry) {
            Ok(())
        } else {
            Err(ModuleError::duplicate_export(entry.export_name))
        }
    }

    /// Returns `false` if `export_name` is already used by a local or
    /// indirect export.
    ///
    /// Linear in the number of local and indirect exports.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn check_duplicate_exports(&self, export_name: &str) -> bool {
        let in_local = self
            .local_exports
            .values()
            .flatten()
            .any(|e| e.export_name == export_name);
        let in_indirect = self
            .indirect_exports
            .iter()
            .any(|e| e.export_name == export_name);
        !(in_local || in_indirect)
    }

    // ==========================================================================
    // Read Access
    // ==========================================================================

    /// Module specifiers; position is the request index.
    pub fn module_requests(&self) -> &[&'a str] {
        &self.module_requests
    }

    /// Specifier of a module request.
    pub fn module_request(&self, idx: ModuleRequestIdx) -> Option<&'a str> {
        self.module_requests.get(idx.index()).copied()
    }

    /// Regular imports in registration order.
    pub fn regular_imports(&self) -> &[ImportEntry<'a>] {
        &self.regular_imports
    }

    /// Regular imports binding `local_name`.
    pub fn regular_imports_of(&self, local_name: &str) -> impl Iterator<Item = &ImportEntry<'a>> {
        self.regular_import_index
            .get(local_name)
            .into_iter()
            .flatten()
            .map(|&position| &self.regular_imports[position])
    }

    pub fn namespace_imports(&self) -> &[ImportEntry<'a>] {
        &self.namespace_imports
    }

    /// Local exports, grouped by local name in first-registration order.
    pub fn local_exports(&self) -> impl Iterator<Item = &LocalExport<'a>> {
        self.local_export_order
            .iter()
            .filter_map(|name| self.local_exports.get(name))
            .flatten()
    }

    pub fn indirect_exports(&self) -> &[IndirectExport<'a>] {
        &self.indirect_exports
    }

    pub fn star_exports(&self) -> &[StarExport] {
        &self.star_exports
    }

    /// Every export: local, then indirect, then star.
    pub fn exports(&self) -> impl Iterator<Item = ExportEntry<'a>> + '_ {
        self.local_exports()
            .copied()
            .map(ExportEntry::Local)
            .chain(self.indirect_exports.iter().copied().map(ExportEntry::Indirect))
            .chain(self.star_exports.iter().copied().map(ExportEntry::Star))
    }

    // ==========================================================================
    // Internals
    // ==========================================================================

    fn first_regular_import(&self, local_name: &str) -> Option<ImportEntry<'a>> {
        self.regular_imports_of(local_name).next().copied()
    }

    /// Replace every local export of `import.local_name` by an indirect export.
    fn convert_local_exports_to_indirect(&mut self, import: &ImportEntry<'a>) {
        let Some(locals) = self.local_exports.remove(import.local_name) else {
            return;
        };
        self.local_export_order.retain(|name| *name != import.local_name);

        for local in locals {
            trace!(
                export = local.export_name,
                local = local.local_name,
                request = %import.module_request,
                "local export converted to indirect by later import"
            );
            self.indirect_exports.push(local.redirect_through(import));
        }
    }

    fn assert_request(&self, idx: ModuleRequestIdx) {
        assert!(
            idx.index() < self.module_requests.len(),
            "module request {} was not registered with this record",
            idx
        );
    }
}

impl std::fmt::Debug for SourceTextModuleRecord<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceTextModuleRecord")
            .field("module_requests", &self.module_requests())
            .field("regular_imports", &self.regular_imports())
            .field("namespace_imports", &self.namespace_imports())
            .field("local_exports", &self.local_exports().collect::<Vec<_>>())
            .field("indirect_exports", &self.indirect_exports())
            .field("star_exports", &self.star_exports())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indirect(export: &'static str, import: &'static str, idx: u32) -> IndirectExport<'static> {
        IndirectExport::new(export, import, ModuleRequestIdx(idx))
    }

    #[test]
    fn module_requests_are_deduplicated() {
        let arena = Bump::new();
        let mut record = SourceTextModuleRecord::new(&arena);

        let a = record.add_module_request("./a.js");
        let b = record.add_module_request("./b.js");
        let a_again = record.add_module_request("./a.js");

        assert_eq!(a, ModuleRequestIdx(0));
        assert_eq!(b, ModuleRequestIdx(1));
        assert_eq!(a_again, ModuleRequestIdx(0));
        assert_eq!(record.module_requests(), &["./a.js", "./b.js"]);
        assert_eq!(record.module_request(b), Some("./b.js"));
        assert_eq!(record.module_request(ModuleRequestIdx(7)), None);
    }

    #[test]
    fn repeated_request_never_grows_sequence() {
        let arena = Bump::new();
        let mut record = SourceTextModuleRecord::new(&arena);

        for _ in 0..5 {
            assert_eq!(record.add_module_request("m"), ModuleRequestIdx(0));
        }
        assert_eq!(record.module_requests().len(), 1);
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn empty_specifier_panics() {
        let arena = Bump::new();
        let mut record = SourceTextModuleRecord::new(&arena);
        record.add_module_request("");
    }

    #[test]
    fn import_then_export_converts() {
        let arena = Bump::new();
        let mut record = SourceTextModuleRecord::new(&arena);
        let m = record.add_module_request("m");

        record.add_import_entry(ImportEntry::new(m, "x", "x"));
        assert!(record.add_local_export_entry(LocalExport::new("x", "x")));

        assert_eq!(record.local_exports().count(), 0);
        assert_eq!(record.indirect_exports(), &[indirect("x", "x", 0)]);
        assert_eq!(record.regular_imports(), &[ImportEntry::new(m, "x", "x")]);
    }

    #[test]
    fn export_then_import_converts() {
        let arena = Bump::new();
        let mut record = SourceTextModuleRecord::new(&arena);
        let m = record.add_module_request("m");

        assert!(record.add_local_export_entry(LocalExport::new("x", "x")));
        assert_eq!(record.local_exports().count(), 1);

        record.add_import_entry(ImportEntry::new(m, "x", "x"));

        assert_eq!(record.local_exports().count(), 0);
        assert_eq!(record.indirect_exports(), &[indirect("x", "x", 0)]);
        assert_eq!(record.regular_imports(), &[ImportEntry::new(m, "x", "x")]);
    }

    #[test]
    fn renamed_import_keeps_import_name() {
        let arena = Bump::new();
        let mut record = SourceTextModuleRecord::new(&arena);
        record.add_module_request("a");
        let m = record.add_module_request("b");

        record.add_import_entry(ImportEntry::new(m, "orig", "local"));
        assert!(record.add_local_export_entry(LocalExport::new("public", "local")));

        assert_eq!(record.indirect_exports(), &[indirect("public", "orig", 1)]);
    }

    #[test]
    fn fan_out_conversion() {
        let arena = Bump::new();
        let mut record = SourceTextModuleRecord::new(&arena);
        let m = record.add_module_request("m");

        assert!(record.add_local_export_entry(LocalExport::new("a", "x")));
        assert!(record.add_local_export_entry(LocalExport::new("b", "x")));
        assert!(record.add_local_export_entry(LocalExport::new("c", "y")));
        record.add_import_entry(ImportEntry::new(m, "x", "x"));

        assert_eq!(
            record.indirect_exports(),
            &[indirect("a", "x", 0), indirect("b", "x", 0)]
        );
        let remaining: Vec<_> = record.local_exports().copied().collect();
        assert_eq!(remaining, vec![LocalExport::new("c", "y")]);
    }

    #[test]
    fn fan_out_after_import() {
        let arena = Bump::new();
        let mut record = SourceTextModuleRecord::new(&arena);
        let m = record.add_module_request("m");

        record.add_import_entry(ImportEntry::new(m, "x", "x"));
        assert!(record.add_local_export_entry(LocalExport::new("a", "x")));
        assert!(record.add_local_export_entry(LocalExport::new("b", "x")));

        assert_eq!(record.local_exports().count(), 0);
        assert_eq!(
            record.indirect_exports(),
            &[indirect("a", "x", 0), indirect("b", "x", 0)]
        );
    }

    #[test]
    fn duplicate_local_export_rejected() {
        let arena = Bump::new();
        let mut record = SourceTextModuleRecord::new(&arena);

        assert!(record.add_local_export_entry(LocalExport::new("x", "x")));
        assert!(!record.add_local_export_entry(LocalExport::new("x", "y")));

        let locals: Vec<_> = record.local_exports().copied().collect();
        assert_eq!(locals, vec![LocalExport::new("x", "x")]);
        assert!(record.indirect_exports().is_empty());
    }

    #[test]
    fn duplicate_across_local_and_indirect() {
        let arena = Bump::new();
        let mut record = SourceTextModuleRecord::new(&arena);
        let m = record.add_module_request("m");

        assert!(record.add_indirect_export_entry(IndirectExport::new("x", "y", m)));
        assert!(!record.add_local_export_entry(LocalExport::new("x", "z")));
        assert!(!record.add_indirect_export_entry(IndirectExport::new("x", "w", m)));
        assert!(!record.check_duplicate_exports("x"));
        assert!(record.check_duplicate_exports("free"));
    }

    #[test]
    fn converted_export_still_checked_for_duplicates() {
        let arena = Bump::new();
        let mut record = SourceTextModuleRecord::new(&arena);
        let m = record.add_module_request("m");

        assert!(record.add_local_export_entry(LocalExport::new("x", "a")));
        record.add_import_entry(ImportEntry::new(m, "b", "b"));
        assert!(!record.add_local_export_entry(LocalExport::new("x", "b")));
        assert_eq!(record.indirect_exports().len(), 0);
    }

    #[test]
    fn try_helpers_report_name() {
        let arena = Bump::new();
        let mut record = SourceTextModuleRecord::new(&arena);
        let m = record.add_module_request("m");

        assert!(record.try_add_local_export_entry(LocalExport::new("x", "x")).is_ok());
        assert_eq!(
            record.try_add_local_export_entry(LocalExport::new("x", "y")),
            Err(ModuleError::duplicate_export("x"))
        );
        assert_eq!(
            record.try_add_indirect_export_entry(IndirectExport::new("x", "q", m)),
            Err(ModuleError::duplicate_export("x"))
        );
    }

    #[test]
    fn star_entries_bypass_checks() {
        let arena = Bump::new();
        let mut record = SourceTextModuleRecord::new(&arena);
        let m = record.add_module_request("m");

        record.add_star_export_entry(StarExport::new(m));
        record.add_star_export_entry(StarExport::new(m));
        record.add_star_import_entry(ImportEntry::namespace(m, "ns"));
        assert!(record.add_local_export_entry(LocalExport::new("ns", "ns")));

        assert_eq!(record.star_exports().len(), 2);
        assert_eq!(record.namespace_imports().len(), 1);
        // Namespace imports take no part in conversion.
        assert_eq!(record.local_exports().count(), 1);
        assert!(record.indirect_exports().is_empty());
    }

    #[test]
    fn add_export_entry_dispatches() {
        let arena = Bump::new();
        let mut record = SourceTextModuleRecord::new(&arena);
        let m = record.add_module_request("m");

        assert!(record.add_export_entry(LocalExport::new("a", "a").into()));
        assert!(record.add_export_entry(IndirectExport::new("b", "b", m).into()));
        assert!(record.add_export_entry(StarExport::new(m).into()));
        assert!(!record.add_export_entry(LocalExport::new("b", "c").into()));

        let exports: Vec<_> = record.exports().collect();
        assert_eq!(
            exports,
            vec![
                ExportEntry::Local(LocalExport::new("a", "a")),
                ExportEntry::Indirect(IndirectExport::new("b", "b", m)),
                ExportEntry::Star(StarExport::new(m)),
            ]
        );
    }

    #[test]
    fn intern_copies_into_arena() {
        let arena = Bump::new();
        let mut record = SourceTextModuleRecord::new(&arena);
        let owned = String::from("./dyn.js");
        let name = record.intern(&owned);
        drop(owned);

        assert_eq!(record.add_module_request(name), ModuleRequestIdx(0));
        assert_eq!(record.module_requests(), &["./dyn.js"]);
    }

    #[test]
    fn regular_imports_of_collects_all() {
        let arena = Bump::new();
        let mut record = SourceTextModuleRecord::new(&arena);
        let a = record.add_module_request("a");
        let b = record.add_module_request("b");

        record.add_import_entry(ImportEntry::new(a, "x", "x"));
        record.add_import_entry(ImportEntry::new(b, "y", "x"));

        let found: Vec<_> = record.regular_imports_of("x").copied().collect();
        assert_eq!(
            found,
            vec![ImportEntry::new(a, "x", "x"), ImportEntry::new(b, "y", "x")]
        );
        assert_eq!(record.regular_imports_of("z").count(), 0);
    }

    #[test]
    #[should_panic(expected = "needs a local name")]
    fn import_without_local_name_panics() {
        let arena = Bump::new();
        let mut record = SourceTextModuleRecord::new(&arena);
        let m = record.add_module_request("m");
        record.add_import_entry(ImportEntry::new(m, "x", ""));
    }

    #[test]
    #[should_panic(expected = "must not name a binding")]
    fn star_import_with_name_panics() {
        let arena = Bump::new();
        let mut record = SourceTextModuleRecord::new(&arena);
        let m = record.add_module_request("m");
        record.add_star_import_entry(ImportEntry::new(m, "x", "ns"));
    }

    #[test]
    #[should_panic(expected = "was not registered")]
    fn unknown_request_panics() {
        let arena = Bump::new();
        let mut record = SourceTextModuleRecord::new(&arena);
        record.add_star_export_entry(StarExport::new(ModuleRequestIdx(0)));
    }
}
