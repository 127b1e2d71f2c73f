use std::fmt::{Debug, Display, Formatter};

use crate::model::target::TypeDefinition;

/// A type reference as it appears inside a cloned signature, instruction operand,
/// base type, interface list or generic argument list. Every variant a clone can
/// produce is represented here; matching is exhaustive everywhere the Signature
/// Rewriter touches one.
///
/// `TypeRef` nodes are always freshly built by the rewriter; a source-side node is
/// never mutated in place and never aliased into the target graph.
#[derive(Copy, Clone)]
pub enum TypeRef<'l> {
	/// A cloned type living in the target module.
	Definition(&'l TypeDefinition<'l>),
	/// A generic parameter owned by a type or a method, identified positionally.
	GenericParam(GenericParamOwner, u32),
	/// A generic definition bound to concrete arguments.
	GenericInstance(&'l TypeRef<'l>, &'l [TypeRef<'l>]),
	ByRef(&'l TypeRef<'l>),
	Array { element: &'l TypeRef<'l>, rank: u32 },
	Pointer(&'l TypeRef<'l>),
	/// `modreq`/`modopt`: `modifier` is rewritten like any other type reference;
	/// it is treated as external whenever the modifier type itself resolves
	/// external, while `inner` is always rewritten.
	RequiredModifier { modifier: &'l TypeRef<'l>, inner: &'l TypeRef<'l> },
	/// A reference to a type that is neither the target nor a registered source
	/// module: imported through the metadata library's standard mechanism
	/// (§4.1, §6) and never touched again.
	Reference(ExternalTypeRef<'l>),
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum GenericParamOwner {
	Type,
	Method,
}

/// Opaque handle produced by the metadata library's "import external reference"
/// primitive. cilgraft never inspects its contents; it only carries
/// it around so the same external reference is reused rather than re-imported.
#[derive(Copy, Clone)]
pub struct ExternalTypeRef<'l> {
	pub assembly_full_name: &'l str,
	pub full_name: &'l str,
	opaque: &'l (),
}

impl<'l> ExternalTypeRef<'l> {
	pub fn new(assembly_full_name: &'l str, full_name: &'l str, opaque: &'l ()) -> Self {
		Self { assembly_full_name, full_name, opaque }
	}

	pub fn opaque(&self) -> &'l () {
		self.opaque
	}
}

impl Display for TypeRef<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			TypeRef::Definition(t) => Display::fmt(t, f),
			TypeRef::GenericParam(GenericParamOwner::Type, i) => write!(f, "!{i}"),
			TypeRef::GenericParam(GenericParamOwner::Method, i) => write!(f, "!!{i}"),
			TypeRef::GenericInstance(elem, args) => {
				write!(f, "{elem}<")?;
				for (i, arg) in args.iter().enumerate() {
					if i > 0 {
						write!(f, ",")?;
					}
					write!(f, "{arg}")?;
				}
				write!(f, ">")
			}
			TypeRef::ByRef(inner) => write!(f, "{inner}&"),
			TypeRef::Array { element, rank } => write!(f, "{element}[{rank}]"),
			TypeRef::Pointer(inner) => write!(f, "{inner}*"),
			TypeRef::RequiredModifier { modifier, inner } => write!(f, "{inner} modreq({modifier})"),
			TypeRef::Reference(ext) => write!(f, "{}", ext.full_name),
		}
	}
}

impl Debug for TypeRef<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(self, f)
	}
}

impl Debug for ExternalTypeRef<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}, {}", self.full_name, self.assembly_full_name)
	}
}
