//! Import and export entries of a source text module.
//!
//! Names are arena-allocated slices. An empty name means "absent", which is
//! how a namespace import (`import * as ns`) is told apart from a named one.
//!
//! Exports come in three mutually exclusive shapes. A local export that turns
//! out to re-export an imported binding is never rewritten in place: the
//! record builds a fresh [`IndirectExport`] from it and drops the local one.

use std::fmt;

/// Index of a module request within its record.
///
/// Assigned in first-use order and never reassigned.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleRequestIdx(pub u32);

impl ModuleRequestIdx {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ModuleRequestIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for ModuleRequestIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A binding received from another module.
///
/// ```text
/// import x from 'm';          // import_name "default", local_name "x"
/// import { x as y } from 'm'; // import_name "x",       local_name "y"
/// import * as ns from 'm';    // import_name "",        local_name "ns"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImportEntry<'a> {
    pub module_request: ModuleRequestIdx,
    pub import_name: &'a str,
    pub local_name: &'a str,
}

impl<'a> ImportEntry<'a> {
    /// A named (or default) import.
    pub fn new(module_request: ModuleRequestIdx, import_name: &'a str, local_name: &'a str) -> Self {
        Self {
            module_request,
            import_name,
            local_name,
        }
    }

    /// A namespace import, `import * as local_name from '...'`.
    pub fn namespace(module_request: ModuleRequestIdx, local_name: &'a str) -> Self {
        Self {
            module_request,
            import_name: "",
            local_name,
        }
    }

    pub fn is_namespace(&self) -> bool {
        self.import_name.is_empty()
    }
}

/// `export { x as y }`: exposes a binding declared in this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalExport<'a> {
    pub export_name: &'a str,
    pub local_name: &'a str,
}

impl<'a> LocalExport<'a> {
    pub fn new(export_name: &'a str, local_name: &'a str) -> Self {
        Self {
            export_name,
            local_name,
        }
    }

    /// The indirect export this entry becomes once `import` is known to bind
    /// its local name.
    pub fn redirect_through(&self, import: &ImportEntry<'a>) -> IndirectExport<'a> {
        IndirectExport {
            export_name: self.export_name,
            import_name: import.import_name,
            module_request: import.module_request,
        }
    }
}

/// `export { x as y } from 'm'`: re-exposes a binding of another module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndirectExport<'a> {
    pub export_name: &'a str,
    pub import_name: &'a str,
    pub module_request: ModuleRequestIdx,
}

impl<'a> IndirectExport<'a> {
    pub fn new(export_name: &'a str, import_name: &'a str, module_request: ModuleRequestIdx) -> Self {
        Self {
            export_name,
            import_name,
            module_request,
        }
    }
}

/// `export * from 'm'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StarExport {
    pub module_request: ModuleRequestIdx,
}

impl StarExport {
    pub fn new(module_request: ModuleRequestIdx) -> Self {
        Self { module_request }
    }
}

/// Any export entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportEntry<'a> {
    Local(LocalExport<'a>),
    Indirect(IndirectExport<'a>),
    Star(StarExport),
}

impl<'a> ExportEntry<'a> {
    /// The exported name. Star exports have none.
    pub fn export_name(&self) -> Option<&'a str> {
        match self {
            ExportEntry::Local(e) => Some(e.export_name),
            ExportEntry::Indirect(e) => Some(e.export_name),
            ExportEntry::Star(_) => None,
        }
    }

    /// The module the binding comes from. Local exports have none.
    pub fn module_request(&self) -> Option<ModuleRequestIdx> {
        match self {
            ExportEntry::Local(_) => None,
            ExportEntry::Indirect(e) => Some(e.module_request),
            ExportEntry::Star(e) => Some(e.module_request),
        }
    }
}

impl<'a> From<LocalExport<'a>> for ExportEntry<'a> {
    fn from(entry: LocalExport<'a>) -> Self {
        ExportEntry::Local(entry)
    }
}

impl<'a> From<IndirectExport<'a>> for ExportEntry<'a> {
    fn from(entry: IndirectExport<'a>) -> Self {
        ExportEntry::Indirect(entry)
    }
}

impl From<StarExport> for ExportEntry<'_> {
    fn from(entry: StarExport) -> Self {
        ExportEntry::Star(entry)
    }
}
