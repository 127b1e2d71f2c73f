use std::fmt::{Debug, Display, Formatter};

use crate::model::members::MethodDefinition;
use crate::model::type_ref::{ExternalTypeRef, TypeRef};

/// A method reference as it appears in an override slot, an instruction operand or
/// a custom attribute constructor slot.
#[derive(Copy, Clone)]
pub enum MethodRef<'l> {
	/// A cloned method living in the target module.
	Definition(&'l MethodDefinition<'l>),
	/// A fresh, non-definition reference: declaring type, return type and
	/// parameters are all rewritten, never copied from the source node
	///").
	Reference(&'l MethodReference<'l>),
	/// `element<T...>` — a generic method instantiation; `element` is cloned
	/// per the same rules as any other method reference.
	GenericInstance(&'l MethodRef<'l>, &'l [TypeRef<'l>]),
	/// A method owned by an assembly outside the merge, imported through the
	/// metadata library's standard mechanism.
	External(ExternalTypeRef<'l>),
}

pub struct MethodReference<'l> {
	pub declaring_type: TypeRef<'l>,
	pub name: &'l str,
	pub has_this: bool,
	pub return_type: TypeRef<'l>,
	pub parameters: &'l [TypeRef<'l>],
	pub generic_parameter_count: u32,
}

impl Display for MethodRef<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			MethodRef::Definition(m) => write!(f, "{}::{}", m.declaring_type_name(), m.name),
			MethodRef::Reference(r) => write!(f, "{}::{}", r.declaring_type, r.name),
			MethodRef::GenericInstance(elem, args) => {
				write!(f, "{elem}<")?;
				for (i, arg) in args.iter().enumerate() {
					if i > 0 {
						write!(f, ",")?;
					}
					write!(f, "{arg}")?;
				}
				write!(f, ">")
			}
			MethodRef::External(ext) => write!(f, "{}", ext.full_name),
		}
	}
}

impl Debug for MethodRef<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(self, f)
	}
}
