//! Instruction opcodes of the assembly model.
//!
//! The machine is accumulator based: most instructions read or write the
//! accumulator and name at most one or two virtual registers. The set here is
//! the subset the emitter needs to model function bodies; the binary encoding
//! belongs to the bytecode writer.

use num_enum::IntoPrimitive;

/// Kind of a single instruction operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    /// Virtual register.
    Reg,
    /// Integer immediate.
    Imm,
    /// Floating point immediate.
    Double,
    /// String table reference.
    Str,
    /// Function reference by name.
    Func,
    /// Literal array reference.
    LiteralArray,
    /// Branch target.
    Label,
}

impl OperandKind {
    pub fn name(&self) -> &'static str {
        match self {
            OperandKind::Reg => "register",
            OperandKind::Imm => "immediate",
            OperandKind::Double => "double",
            OperandKind::Str => "string",
            OperandKind::Func => "function",
            OperandKind::LiteralArray => "literal array",
            OperandKind::Label => "label",
        }
    }
}

/// Assembly opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive)]
#[repr(u8)]
pub enum Opcode {
    // =========================================================================
    // Accumulator Loads
    // =========================================================================
    /// Do nothing.
    Nop = 0,
    /// acc = undefined.
    LdUndefined,
    /// acc = null.
    LdNull,
    /// acc = true.
    LdTrue,
    /// acc = false.
    LdFalse,
    /// acc = integer immediate.
    Ldai,
    /// acc = double immediate.
    Fldai,
    /// acc = string.
    LdaStr,
    /// acc = register.
    Lda,
    /// register = acc.
    Sta,
    /// dst register = src register.
    Mov,

    // =========================================================================
    // Arithmetic and Comparison (lhs register, rhs accumulator)
    // =========================================================================
    Add2,
    Sub2,
    Mul2,
    Div2,
    Mod2,
    Eq,
    StrictEq,
    Less,
    Greater,
    /// acc = !acc.
    Not,
    /// acc = typeof acc.
    TypeOf,

    // =========================================================================
    // Control Flow
    // =========================================================================
    Jmp,
    /// Jump when acc is falsy.
    Jeqz,
    /// Jump when acc is truthy.
    Jnez,

    // =========================================================================
    // Object and Array Literals
    // =========================================================================
    CreateEmptyObject,
    CreateEmptyArray,
    /// acc = new array initialised from a literal array.
    CreateArrayWithBuffer,
    /// acc = new object initialised from a literal array.
    CreateObjectWithBuffer,
    /// acc = obj register [name].
    LdObjByName,
    /// obj register [name] = acc.
    StObjByName,

    // =========================================================================
    // Variables
    // =========================================================================
    TryLdGlobalByName,
    TryStGlobalByName,
    /// acc = local module binding.
    LdLocalModuleVar,
    /// local module binding = acc.
    StModuleVar,
    /// acc = binding imported from another module.
    LdExternalModuleVar,
    /// acc = namespace object of an imported module (by request index).
    GetModuleNamespace,

    // =========================================================================
    // Functions
    // =========================================================================
    /// acc = closure over the named function, with its parameter count.
    DefineFunc,
    /// acc = callee register ().
    CallArg0,
    /// acc = callee register (arg register).
    CallArg1,
    /// Return acc.
    Return,
    ReturnUndefined,

    // =========================================================================
    // Exceptions
    // =========================================================================
    /// Throw acc.
    Throw,
}

impl Opcode {
    /// Operand layout of this opcode.
    pub fn operands(&self) -> &'static [OperandKind] {
        use OperandKind::*;
        match self {
            Opcode::Nop
            | Opcode::LdUndefined
            | Opcode::LdNull
            | Opcode::LdTrue
            | Opcode::LdFalse
            | Opcode::Not
            | Opcode::TypeOf
            | Opcode::CreateEmptyObject
            | Opcode::CreateEmptyArray
            | Opcode::Return
            | Opcode::ReturnUndefined
            | Opcode::Throw => &[],

            Opcode::Ldai => &[Imm],
            Opcode::Fldai => &[Double],

            Opcode::LdaStr
            | Opcode::TryLdGlobalByName
            | Opcode::TryStGlobalByName
            | Opcode::LdLocalModuleVar
            | Opcode::StModuleVar
            | Opcode::LdExternalModuleVar => &[Str],

            Opcode::Lda
            | Opcode::Sta
            | Opcode::Add2
            | Opcode::Sub2
            | Opcode::Mul2
            | Opcode::Div2
            | Opcode::Mod2
            | Opcode::Eq
            | Opcode::StrictEq
            | Opcode::Less
            | Opcode::Greater
            | Opcode::CallArg0 => &[Reg],

            Opcode::Mov | Opcode::CallArg1 => &[Reg, Reg],

            Opcode::Jmp | Opcode::Jeqz | Opcode::Jnez => &[Label],

            Opcode::CreateArrayWithBuffer | Opcode::CreateObjectWithBuffer => &[LiteralArray],

            Opcode::LdObjByName | Opcode::StObjByName => &[Reg, Str],

            Opcode::GetModuleNamespace => &[Imm],

            Opcode::DefineFunc => &[Func, Imm],
        }
    }

    /// Number of operands this opcode takes.
    pub fn operand_count(&self) -> usize {
        self.operands().len()
    }

    /// Mnemonic used in disassembly.
    pub fn name(&self) -> &'static str {
        match self {
            Opcode::Nop => "nop",
            Opcode::LdUndefined => "ldundefined",
            Opcode::LdNull => "ldnull",
            Opcode::LdTrue => "ldtrue",
            Opcode::LdFalse => "ldfalse",
            Opcode::Ldai => "ldai",
            Opcode::Fldai => "fldai",
            Opcode::LdaStr => "lda.str",
            Opcode::Lda => "lda",
            Opcode::Sta => "sta",
            Opcode::Mov => "mov",
            Opcode::Add2 => "add2",
            Opcode::Sub2 => "sub2",
            Opcode::Mul2 => "mul2",
            Opcode::Div2 => "div2",
            Opcode::Mod2 => "mod2",
            Opcode::Eq => "eq",
            Opcode::StrictEq => "stricteq",
            Opcode::Less => "less",
            Opcode::Greater => "greater",
            Opcode::Not => "not",
            Opcode::TypeOf => "typeof",
            Opcode::Jmp => "jmp",
            Opcode::Jeqz => "jeqz",
            Opcode::Jnez => "jnez",
            Opcode::CreateEmptyObject => "createemptyobject",
            Opcode::CreateEmptyArray => "createemptyarray",
            Opcode::CreateArrayWithBuffer => "createarraywithbuffer",
            Opcode::CreateObjectWithBuffer => "createobjectwithbuffer",
            Opcode::LdObjByName => "ldobjbyname",
            Opcode::StObjByName => "stobjbyname",
            Opcode::TryLdGlobalByName => "tryldglobalbyname",
            Opcode::TryStGlobalByName => "trystglobalbyname",
            Opcode::LdLocalModuleVar => "ldlocalmodulevar",
            Opcode::StModuleVar => "stmodulevar",
            Opcode::LdExternalModuleVar => "ldexternalmodulevar",
            Opcode::GetModuleNamespace => "getmodulenamespace",
            Opcode::DefineFunc => "definefunc",
            Opcode::CallArg0 => "callarg0",
            Opcode::CallArg1 => "callarg1",
            Opcode::Return => "return",
            Opcode::ReturnUndefined => "returnundefined",
            Opcode::Throw => "throw",
        }
    }
}
