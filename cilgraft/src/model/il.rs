use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter};

use derivative::Derivative;

use crate::model::members::FieldRef;
use crate::model::method_ref::MethodRef;
use crate::model::type_ref::TypeRef;

/// A CIL opcode. The cloner never interprets opcode semantics — no IL
/// optimization is in scope — it only needs the byte value to
/// copy and, for a handful of mnemonics, to classify the operand it carries
/// (see `Operand`). The full ECMA-335 instruction table belongs to the
/// metadata library (out of scope, §1); this is the subset the cloner's own
/// tests exercise, plus a raw escape hatch for everything else.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct OpCode(pub u16);

impl OpCode {
	pub const NOP: OpCode = OpCode(0x00);
	pub const LDARG_0: OpCode = OpCode(0x02);
	pub const LDLOC_0: OpCode = OpCode(0x06);
	pub const STLOC_0: OpCode = OpCode(0x0A);
	pub const LDNULL: OpCode = OpCode(0x14);
	pub const LDC_I4: OpCode = OpCode(0x20);
	pub const LDC_I8: OpCode = OpCode(0x21);
	pub const LDC_R4: OpCode = OpCode(0x22);
	pub const LDC_R8: OpCode = OpCode(0x23);
	pub const DUP: OpCode = OpCode(0x25);
	pub const POP: OpCode = OpCode(0x26);
	pub const CALL: OpCode = OpCode(0x28);
	pub const RET: OpCode = OpCode(0x2A);
	pub const BR_S: OpCode = OpCode(0x2B);
	pub const BRFALSE_S: OpCode = OpCode(0x2C);
	pub const BRTRUE_S: OpCode = OpCode(0x2D);
	pub const BR: OpCode = OpCode(0x38);
	pub const BRFALSE: OpCode = OpCode(0x39);
	pub const BRTRUE: OpCode = OpCode(0x3A);
	pub const SWITCH: OpCode = OpCode(0x45);
	pub const LDFLD: OpCode = OpCode(0x7B);
	pub const STFLD: OpCode = OpCode(0x7D);
	pub const LDSFLD: OpCode = OpCode(0x7E);
	pub const STSFLD: OpCode = OpCode(0x80);
	pub const CASTCLASS: OpCode = OpCode(0x74);
	pub const ISINST: OpCode = OpCode(0x75);
	pub const NEWOBJ: OpCode = OpCode(0x73);
	pub const THROW: OpCode = OpCode(0x7A);
	pub const LDSTR: OpCode = OpCode(0x72);
	pub const NEWARR: OpCode = OpCode(0x8D);
	pub const BOX: OpCode = OpCode(0x8C);
	pub const UNBOX_ANY: OpCode = OpCode(0xA5);
	pub const LEAVE: OpCode = OpCode(0xDD);
	pub const LEAVE_S: OpCode = OpCode(0xDE);
	pub const ENDFINALLY: OpCode = OpCode(0xDC);
	pub const CALLVIRT: OpCode = OpCode(0x6F);
	pub const CALLI: OpCode = OpCode(0x29);
	pub const LDTOKEN: OpCode = OpCode(0xD0);
}

impl Debug for OpCode {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "OpCode({:#04X})", self.0)
	}
}

/// An operand as it lives on a *cloned* instruction. Dispatch on this variant
/// is the Instruction Cloner's whole job; every kind
/// listed there has a case here.
#[derive(Derivative)]
#[derivative(Debug)]
pub enum Operand<'l> {
	None,
	Int32(i32),
	Int64(i64),
	Float32(f32),
	Float64(f64),
	String(&'l str),
	/// Local variable / argument index. Copied verbatim: indices are positional
	/// and do not name an entity that could be external or need cloning.
	Variable(u16),
	Argument(u16),
	Type(TypeRef<'l>),
	Method(MethodRef<'l>),
	Field(FieldRef<'l>),
	/// A branch target: resolved by remapping through the local
	/// source-instruction → clone map once all instructions of the body exist.
	#[derivative(Debug = "ignore")]
	Branch(Cell<Option<&'l Instruction<'l>>>),
	/// `switch` targets: same remapping, element-wise.
	#[derivative(Debug = "ignore")]
	Switch(Cell<&'l [&'l Instruction<'l>]>),
}

pub struct Instruction<'l> {
	/// Position within the cloned body; stable once the body has been fully
	/// cloned.
	pub index: u32,
	pub opcode: OpCode,
	pub operand: Cell<Operand<'l>>,
}

impl Debug for Instruction<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Instruction")
			.field("index", &self.index)
			.field("opcode", &self.opcode)
			.finish()
	}
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ExceptionHandlerKind {
	Catch,
	Filter,
	Finally,
	Fault,
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct ExceptionHandler<'l> {
	pub kind: ExceptionHandlerKind,
	pub try_start: u32,
	pub try_end: u32,
	pub handler_start: u32,
	pub handler_end: u32,
	pub filter_start: Option<u32>,
	/// Only meaningful for `Catch`; rewritten through the Signature Rewriter
	/// like any other type reference.
	pub catch_type: Option<TypeRef<'l>>,
}

#[derive(Debug, Copy, Clone)]
pub struct LocalVariable<'l> {
	pub ty: TypeRef<'l>,
	pub is_pinned: bool,
}

/// A debug sequence point, anchored to the first/last cloned instructions of
/// the scope it covers. Document identity is
/// opaque to the cloner: it never creates new source documents, only reuses
/// whatever the source provided.
#[derive(Debug, Copy, Clone)]
pub struct SequencePoint<'l> {
	pub document: &'l str,
	pub start_line: u32,
	pub start_column: u32,
	pub end_line: u32,
	pub end_column: u32,
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct DebugScope<'l> {
	pub start: u32,
	pub end: u32,
	#[derivative(Debug = "ignore")]
	pub sequence_points: Vec<(u32, SequencePoint<'l>)>,
	/// Local-variable debug entries, reproduced by index.
	pub local_names: Vec<(u32, &'l str)>,
}

/// Instructions, exception handlers and the debug scope are populated by a
/// deferred action strictly after this shell has been attached to its method,
/// so they need interior mutability even though nothing about a body's shape
/// changes once that one action has run.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct MethodBody<'l> {
	pub max_stack_size: u32,
	pub init_locals: bool,
	#[derivative(Debug = "ignore")]
	pub locals: Vec<LocalVariable<'l>>,
	#[derivative(Debug = "ignore")]
	pub instructions: RefCell<Vec<&'l Instruction<'l>>>,
	#[derivative(Debug = "ignore")]
	pub exception_handlers: RefCell<Vec<ExceptionHandler<'l>>>,
	pub debug_scope: Cell<Option<&'l DebugScope<'l>>>,
}
