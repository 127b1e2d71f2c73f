//! The read-side "metadata model interface surface": an abstract
//! schema for whatever already-opened module a source module registry holds,
//! independent of which concrete metadata library backs it. `source::dotscope`
//! implements it over a real PE reader; `source::fake` (test-only) implements
//! it over a handful of in-memory structs, so the cloning engine can be tested
//! without touching disk.
//!
//! Everything here is owned data: a source module's entities are read once,
//! at the moment the cloner visits them, and immediately turned into target
//! entities — there's no benefit to borrowing from the reader's own arena, and
//! owning keeps this trait object-safe and lifetime-free.

use crate::model::attributes::{
	EventAttributes, FieldAttributes, MethodAttributes, MethodImplAttributes, PInvokeAttributes,
	ParameterAttributes, PropertyAttributes, TypeAttributes,
};
use crate::model::il::OpCode;
use crate::model::type_ref::GenericParamOwner;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct SourceTypeHandle(pub u32);
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct SourceMethodHandle(pub u32);
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct SourceFieldHandle(pub u32);
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct SourcePropertyHandle(pub u32);
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct SourceEventHandle(pub u32);

#[derive(Clone, Debug)]
pub enum SourceTypeRef {
	Definition(SourceTypeHandle),
	GenericParam(GenericParamOwner, u32),
	GenericInstance(Box<SourceTypeRef>, Vec<SourceTypeRef>),
	ByRef(Box<SourceTypeRef>),
	Array { element: Box<SourceTypeRef>, rank: u32 },
	Pointer(Box<SourceTypeRef>),
	RequiredModifier { modifier: Box<SourceTypeRef>, inner: Box<SourceTypeRef> },
	/// A by-name reference that may belong to this module, another registered
	/// source module, or an external assembly; resolved by the registry +
	/// Module Resolver.
	Reference { assembly_full_name: String, full_name: String },
}

#[derive(Clone, Debug)]
pub enum SourceMethodRef {
	Definition(SourceMethodHandle),
	GenericInstance(Box<SourceMethodRef>, Vec<SourceTypeRef>),
	Reference {
		declaring_type: SourceTypeRef,
		name: String,
		has_this: bool,
		return_type: SourceTypeRef,
		parameters: Vec<SourceTypeRef>,
		generic_parameter_count: u32,
	},
}

#[derive(Clone, Debug)]
pub enum SourceFieldRef {
	Definition(SourceFieldHandle),
	Reference { declaring_type: SourceTypeRef, name: String, field_type: SourceTypeRef },
}

#[derive(Clone, Debug)]
pub enum SourceConstant {
	Bool(bool),
	Char(u16),
	I8(i8),
	U8(u8),
	I16(i16),
	U16(u16),
	I32(i32),
	U32(u32),
	I64(i64),
	U64(u64),
	R4(f32),
	R8(f64),
	Str(String),
	Null,
}

#[derive(Clone, Debug)]
pub enum SourceOperand {
	None,
	Int32(i32),
	Int64(i64),
	Float32(f32),
	Float64(f64),
	String(String),
	Variable(u16),
	Argument(u16),
	Type(SourceTypeRef),
	Method(SourceMethodRef),
	Field(SourceFieldRef),
	/// Index of the target instruction within the same body.
	Branch(u32),
	Switch(Vec<u32>),
}

#[derive(Clone, Debug)]
pub struct SourceInstruction {
	pub opcode: OpCode,
	pub operand: SourceOperand,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum SourceExceptionHandlerKind {
	Catch,
	Filter,
	Finally,
	Fault,
}

#[derive(Clone, Debug)]
pub struct SourceExceptionHandler {
	pub kind: SourceExceptionHandlerKind,
	pub try_start: u32,
	pub try_end: u32,
	pub handler_start: u32,
	pub handler_end: u32,
	pub filter_start: Option<u32>,
	pub catch_type: Option<SourceTypeRef>,
}

#[derive(Clone, Debug)]
pub struct SourceSequencePoint {
	pub document: String,
	pub start_line: u32,
	pub start_column: u32,
	pub end_line: u32,
	pub end_column: u32,
}

#[derive(Clone, Debug, Default)]
pub struct SourceDebugScope {
	pub sequence_points: Vec<(u32, SourceSequencePoint)>,
	pub local_names: Vec<(u32, String)>,
}

#[derive(Clone, Debug)]
pub struct SourceMethodBody {
	pub max_stack_size: u32,
	pub init_locals: bool,
	pub locals: Vec<SourceTypeRef>,
	pub instructions: Vec<SourceInstruction>,
	pub exception_handlers: Vec<SourceExceptionHandler>,
	pub debug_scope: Option<SourceDebugScope>,
}

#[derive(Clone, Debug)]
pub struct SourcePInvokeInfo {
	pub module_name: String,
	pub entry_point: String,
	pub attributes: PInvokeAttributes,
}

#[derive(Clone, Debug)]
pub struct SourceCustomAttribute {
	pub constructor: SourceMethodRef,
	pub arguments: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct SourceGenericParameter {
	pub name: String,
	pub index: u32,
	pub attributes: u16,
	pub constraints: Vec<SourceTypeRef>,
}

#[derive(Clone, Debug)]
pub struct SourceParameter {
	pub name: String,
	pub sequence: u16,
	pub attributes: ParameterAttributes,
	pub parameter_type: SourceTypeRef,
	pub marshal: Option<Vec<u8>>,
	pub custom_attributes: Vec<SourceCustomAttribute>,
}

#[derive(Clone, Debug)]
pub struct SourceTypeInfo {
	pub name: String,
	pub namespace: String,
	pub attributes: TypeAttributes,
	pub declaring_type: Option<SourceTypeHandle>,
	pub nested_types: Vec<SourceTypeHandle>,
	pub base_type: Option<SourceTypeRef>,
	pub interfaces: Vec<SourceTypeRef>,
	pub generic_parameters: Vec<SourceGenericParameter>,
	pub fields: Vec<SourceFieldHandle>,
	pub methods: Vec<SourceMethodHandle>,
	pub properties: Vec<SourcePropertyHandle>,
	pub events: Vec<SourceEventHandle>,
	pub custom_attributes: Vec<SourceCustomAttribute>,
}

impl SourceTypeInfo {
	pub fn full_name(&self, owner_full_name: Option<&str>) -> String {
		match owner_full_name {
			Some(owner) => format!("{owner}+{}", self.name),
			None if self.namespace.is_empty() => self.name.clone(),
			None => format!("{}.{}", self.namespace, self.name),
		}
	}
}

#[derive(Clone, Debug)]
pub struct SourceMethodInfo {
	pub name: String,
	pub attributes: MethodAttributes,
	pub impl_attributes: MethodImplAttributes,
	pub declaring_type: SourceTypeHandle,
	pub generic_parameters: Vec<SourceGenericParameter>,
	pub parameters: Vec<SourceParameter>,
	pub return_type: SourceTypeRef,
	pub overrides: Vec<SourceMethodRef>,
	pub pinvoke: Option<SourcePInvokeInfo>,
	pub body: Option<SourceMethodBody>,
	pub custom_attributes: Vec<SourceCustomAttribute>,
}

#[derive(Clone, Debug)]
pub struct SourceFieldInfo {
	pub name: String,
	pub attributes: FieldAttributes,
	/// Needed to resolve a bare `SourceFieldHandle` encountered as an
	/// instruction operand back to its declaring type, mirroring `SourceMethodInfo::declaring_type`.
	pub declaring_type: SourceTypeHandle,
	pub field_type: SourceTypeRef,
	pub initial_value: Option<Vec<u8>>,
	pub offset: Option<u32>,
	pub constant: Option<SourceConstant>,
	pub marshal: Option<Vec<u8>>,
	pub custom_attributes: Vec<SourceCustomAttribute>,
}

#[derive(Clone, Debug)]
pub struct SourcePropertyInfo {
	pub name: String,
	pub attributes: PropertyAttributes,
	pub property_type: SourceTypeRef,
	pub getter: Option<SourceMethodHandle>,
	pub setter: Option<SourceMethodHandle>,
	pub custom_attributes: Vec<SourceCustomAttribute>,
}

#[derive(Clone, Debug)]
pub struct SourceEventInfo {
	pub name: String,
	pub attributes: EventAttributes,
	pub event_type: SourceTypeRef,
	pub add: Option<SourceMethodHandle>,
	pub remove: Option<SourceMethodHandle>,
	pub raise: Option<SourceMethodHandle>,
	pub custom_attributes: Vec<SourceCustomAttribute>,
}

/// The contract a metadata library must satisfy to act as a source module.
/// `fn symbols_available` backs the best-effort symbol read: readers that
/// can't or didn't load symbols just report `false` and every body comes
/// back without a debug scope.
pub trait SourceModule {
	fn assembly_full_name(&self) -> &str;
	fn top_level_types(&self) -> Vec<SourceTypeHandle>;
	fn type_info(&self, handle: SourceTypeHandle) -> SourceTypeInfo;
	fn method_info(&self, handle: SourceMethodHandle) -> SourceMethodInfo;
	fn field_info(&self, handle: SourceFieldHandle) -> SourceFieldInfo;
	fn property_info(&self, handle: SourcePropertyHandle) -> SourcePropertyInfo;
	fn event_info(&self, handle: SourceEventHandle) -> SourceEventInfo;
	fn find_type_by_full_name(&self, full_name: &str) -> Option<SourceTypeHandle>;
	fn symbols_available(&self) -> bool;
}
