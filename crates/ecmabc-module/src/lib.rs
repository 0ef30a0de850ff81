//! Static module linkage for ECMAScript source text modules.
//!
//! The binding pass of each module fills one [`SourceTextModuleRecord`] with
//! the module's requests, imports and exports. The record enforces unique
//! export names and turns re-exported imports into indirect exports; star
//! imports and exports are kept as-is for link-time resolution.

pub mod entry;
pub mod record;

pub use entry::{
    ExportEntry, ImportEntry, IndirectExport, LocalExport, ModuleRequestIdx, StarExport,
};
pub use record::SourceTextModuleRecord;
