use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};

use derivative::Derivative;

use crate::model::attributes::{
	EventAttributes, FieldAttributes, MethodAttributes, MethodImplAttributes, PInvokeAttributes,
	ParameterAttributes, PropertyAttributes,
};
use crate::model::il::MethodBody;
use crate::model::method_ref::MethodRef;
use crate::model::target::TypeDefinition;
use crate::model::type_ref::{ExternalTypeRef, TypeRef};
use crate::utilities::impl_pointer_identity;

/// A field reference as it appears in an instruction operand: either a cloned field, a fresh field reference with a
/// rewritten declaring type and field type, or an external field.
#[derive(Copy, Clone)]
pub enum FieldRef<'l> {
	Definition(&'l FieldDefinition<'l>),
	Reference(&'l FieldReference<'l>),
	External(ExternalTypeRef<'l>),
}

pub struct FieldReference<'l> {
	pub declaring_type: TypeRef<'l>,
	pub name: &'l str,
	pub field_type: TypeRef<'l>,
}

impl Display for FieldRef<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			FieldRef::Definition(field) => Display::fmt(field, f),
			FieldRef::Reference(r) => write!(f, "{} {}::{}", r.field_type, r.declaring_type, r.name),
			FieldRef::External(ext) => write!(f, "{}", ext.full_name),
		}
	}
}

impl Debug for FieldRef<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(self, f)
	}
}

/// A value a field's `Constant` table row can hold. Opaque beyond what the
/// cloner needs to copy verbatim.
#[derive(Debug, Copy, Clone)]
pub enum Constant<'l> {
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
	Str(&'l str),
	Null,
}

/// Opaque marshalling descriptor blob; copied verbatim, never interpreted
/// (same rationale as custom-attribute argument blobs, §4.8).
#[derive(Debug, Copy, Clone)]
pub struct MarshalInfo<'l>(pub &'l [u8]);

#[derive(Derivative)]
#[derivative(Debug)]
pub struct CustomAttribute<'l> {
	pub constructor: MethodRef<'l>,
	/// The original serialized argument blob, unrewritten: its binary format
	/// refers to types by name only, so no per-argument rewriting is required.
	#[derivative(Debug(format_with = "crate::utilities::fmt_hex_slice"))]
	pub arguments: &'l [u8],
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Parameter<'l> {
	pub name: &'l str,
	pub sequence: u16,
	pub attributes: Cell<ParameterAttributes>,
	pub parameter_type: Cell<TypeRef<'l>>,
	pub marshal: Option<MarshalInfo<'l>>,
	#[derivative(Debug = "ignore")]
	pub custom_attributes: RefCell<Vec<CustomAttribute<'l>>>,
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct GenericParameter<'l> {
	pub name: &'l str,
	pub index: u32,
	pub attributes: u16,
	#[derivative(Debug = "ignore")]
	pub constraints: RefCell<Vec<TypeRef<'l>>>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ModuleReference<'l> {
	pub name: &'l str,
}

#[derive(Debug, Copy, Clone)]
pub struct PInvokeInfo<'l> {
	pub module: &'l ModuleReference<'l>,
	pub entry_point: &'l str,
	pub attributes: PInvokeAttributes,
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct FieldDefinition<'l> {
	pub name: &'l str,
	pub attributes: Cell<FieldAttributes>,
	pub field_type: Cell<TypeRef<'l>>,
	pub initial_value: Option<&'l [u8]>,
	pub offset: Option<u32>,
	pub constant: Option<Constant<'l>>,
	pub marshal: Option<MarshalInfo<'l>>,
	#[derivative(Debug = "ignore")]
	pub custom_attributes: RefCell<Vec<CustomAttribute<'l>>>,
}

impl_pointer_identity!(FieldDefinition);

impl Display for FieldDefinition<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} {}", self.field_type.get(), self.name)
	}
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct MethodDefinition<'l> {
	pub name: &'l str,
	pub attributes: Cell<MethodAttributes>,
	pub impl_attributes: Cell<MethodImplAttributes>,
	pub declaring_type: Cell<Option<&'l TypeDefinition<'l>>>,
	#[derivative(Debug = "ignore")]
	pub generic_parameters: RefCell<Vec<&'l GenericParameter<'l>>>,
	#[derivative(Debug = "ignore")]
	pub parameters: RefCell<Vec<&'l Parameter<'l>>>,
	/// Placeholder (`System.Void`-shaped) until the Member Cloner rewrites and
	/// sets the real return type.
	pub return_type: Cell<TypeRef<'l>>,
	#[derivative(Debug = "ignore")]
	pub overrides: RefCell<Vec<MethodRef<'l>>>,
	pub pinvoke: Cell<Option<PInvokeInfo<'l>>>,
	pub body: Cell<Option<&'l MethodBody<'l>>>,
	#[derivative(Debug = "ignore")]
	pub custom_attributes: RefCell<Vec<CustomAttribute<'l>>>,
}

impl_pointer_identity!(MethodDefinition);

impl<'l> MethodDefinition<'l> {
	pub(crate) fn declaring_type_name(&self) -> &'l str {
		match self.declaring_type.get() {
			Some(t) => t.name(),
			None => "<unbound>",
		}
	}

	pub fn is_static(&self) -> bool {
		self.attributes.get().contains(MethodAttributes::STATIC)
	}
}

impl Display for MethodDefinition<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} {}::{}", self.return_type.get(), self.declaring_type_name(), self.name)
	}
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct PropertyDefinition<'l> {
	pub name: &'l str,
	pub attributes: Cell<PropertyAttributes>,
	pub property_type: Cell<TypeRef<'l>>,
	pub getter: Cell<Option<&'l MethodDefinition<'l>>>,
	pub setter: Cell<Option<&'l MethodDefinition<'l>>>,
	#[derivative(Debug = "ignore")]
	pub custom_attributes: RefCell<Vec<CustomAttribute<'l>>>,
}

impl_pointer_identity!(PropertyDefinition);

#[derive(Derivative)]
#[derivative(Debug)]
pub struct EventDefinition<'l> {
	pub name: &'l str,
	pub attributes: Cell<EventAttributes>,
	pub event_type: Cell<TypeRef<'l>>,
	pub add: Cell<Option<&'l MethodDefinition<'l>>>,
	pub remove: Cell<Option<&'l MethodDefinition<'l>>>,
	pub raise: Cell<Option<&'l MethodDefinition<'l>>>,
	#[derivative(Debug = "ignore")]
	pub custom_attributes: RefCell<Vec<CustomAttribute<'l>>>,
}

impl_pointer_identity!(EventDefinition);
