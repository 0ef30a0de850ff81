//! Compile session configuration.
//!
//! [`CompileOptions`] is assembled with `with_*` builder methods and frozen
//! into a [`CompileContext`], which the emitter and the module record
//! serializer read from.
//!
//! # Example
//!
//! ```
//! use ecmabc_core::{CompileContext, CompileOptions};
//!
//! let ctx = CompileContext::new(
//!     CompileOptions::new()
//!         .with_debug(true)
//!         .with_record_name("app/main"),
//! );
//! assert!(ctx.is_debug());
//! assert_eq!(ctx.record_name(), "app/main");
//! ```

/// Record name used when the session does not provide one.
pub const DEFAULT_RECORD_NAME: &str = "_GLOBAL";

/// Options controlling one compile session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    is_debug: bool,
    is_commonjs: bool,
    record_name: String,
    dump_asm: bool,
    dump_debug_info: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            is_debug: false,
            is_commonjs: false,
            record_name: DEFAULT_RECORD_NAME.to_string(),
            dump_asm: false,
            dump_debug_info: false,
        }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate source debug info (instruction lines and columns, local
    /// variables, source file).
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.is_debug = enabled;
        self
    }

    /// Treat the module as wrapped in the legacy CommonJS module system.
    pub fn with_commonjs(mut self, enabled: bool) -> Self {
        self.is_commonjs = enabled;
        self
    }

    /// Name of the program's main record.
    pub fn with_record_name(mut self, name: impl Into<String>) -> Self {
        self.record_name = name.into();
        self
    }

    /// Print the disassembly after finalization.
    pub fn with_dump_asm(mut self, enabled: bool) -> Self {
        self.dump_asm = enabled;
        self
    }

    /// Print the disassembly including debug info after finalization.
    pub fn with_dump_debug_info(mut self, enabled: bool) -> Self {
        self.dump_debug_info = enabled;
        self
    }
}

/// Read-only view of a compile session shared by all producers.
#[derive(Debug, Clone, Default)]
pub struct CompileContext {
    options: CompileOptions,
}

impl CompileContext {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn is_debug(&self) -> bool {
        self.options.is_debug
    }

    pub fn is_commonjs(&self) -> bool {
        self.options.is_commonjs
    }

    pub fn record_name(&self) -> &str {
        &self.options.record_name
    }

    pub fn dump_asm(&self) -> bool {
        self.options.dump_asm
    }

    pub fn dump_debug_info(&self) -> bool {
        self.options.dump_debug_info
    }
}

impl From<CompileOptions> for CompileContext {
    fn from(options: CompileOptions) -> Self {
        Self::new(options)
    }
}
