//! Serializes a [`SourceTextModuleRecord`] into a flat literal array.
//!
//! Layout, one group per section, each group preceded by its count:
//!
//! ```text
//! Integer(n)  String(specifier) * n
//! Integer(n)  (String(local), String(import), MethodAffiliate(idx)) * n   regular imports
//! Integer(n)  (String(local), MethodAffiliate(idx)) * n                  namespace imports
//! Integer(n)  (String(local), String(export)) * n                        local exports
//! Integer(n)  (String(export), String(import), MethodAffiliate(idx)) * n  indirect exports
//! Integer(n)  MethodAffiliate(idx) * n                                   star exports
//! ```

use ecmabc_module::{ModuleRequestIdx, SourceTextModuleRecord};
use tracing::debug;

use crate::assembly::{Literal, LiteralArray};

/// A module record in its literal array form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedModuleRecord(LiteralArray);

impl SerializedModuleRecord {
    pub fn literals(&self) -> &[Literal] {
        &self.0.literals
    }

    pub fn into_literal_array(self) -> LiteralArray {
        self.0
    }
}

/// Writes one record; reads it only.
pub struct ModuleRecordEmitter<'r, 'a> {
    record: &'r SourceTextModuleRecord<'a>,
    buffer: Vec<Literal>,
}

impl<'r, 'a> ModuleRecordEmitter<'r, 'a> {
    pub fn new(record: &'r SourceTextModuleRecord<'a>) -> Self {
        Self {
            record,
            buffer: Vec::new(),
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn generate(mut self) -> SerializedModuleRecord {
        self.gen_module_requests();
        self.gen_regular_imports();
        self.gen_namespace_imports();
        self.gen_local_exports();
        self.gen_indirect_exports();
        self.gen_star_exports();

        debug!(
            requests = self.record.module_requests().len(),
            literals = self.buffer.len(),
            "module record serialized"
        );
        SerializedModuleRecord(LiteralArray::new(self.buffer))
    }

    fn count(&mut self, n: usize) {
        let n = u32::try_from(n).unwrap_or_else(|_| panic!("module record section of {n} entries"));
        self.buffer.push(Literal::Integer(n));
    }

    fn name(&mut self, name: &str) {
        self.buffer.push(Literal::string(name));
    }

    fn request(&mut self, idx: ModuleRequestIdx) {
        let idx = u16::try_from(idx.0)
            .unwrap_or_else(|_| panic!("module request {idx} does not fit a method affiliate"));
        self.buffer.push(Literal::MethodAffiliate(idx));
    }

    fn gen_module_requests(&mut self) {
        let record = self.record;
        let requests = record.module_requests();
        self.count(requests.len());
        for specifier in requests {
            self.name(specifier);
        }
    }

    fn gen_regular_imports(&mut self) {
        let record = self.record;
        let imports = record.regular_imports();
        self.count(imports.len());
        for entry in imports {
            self.name(entry.local_name);
            self.name(entry.import_name);
            self.request(entry.module_request);
        }
    }

    fn gen_namespace_imports(&mut self) {
        let record = self.record;
        let imports = record.namespace_imports();
        self.count(imports.len());
        for entry in imports {
            self.name(entry.local_name);
            self.request(entry.module_request);
        }
    }

    fn gen_local_exports(&mut self) {
        let record = self.record;
        self.count(record.local_exports().count());
        for entry in record.local_exports() {
            self.name(entry.local_name);
            self.name(entry.export_name);
        }
    }

    fn gen_indirect_exports(&mut self) {
        let record = self.record;
        let exports = record.indirect_exports();
        self.count(exports.len());
        for entry in exports {
            self.name(entry.export_name);
            self.name(entry.import_name);
            self.request(entry.module_request);
        }
    }

    fn gen_star_exports(&mut self) {
        let record = self.record;
        let exports = record.star_exports();
        self.count(exports.len());
        for entry in exports {
            self.request(entry.module_request);
        }
    }
}
