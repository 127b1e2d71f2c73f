use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Display, Formatter};

use bumpalo::Bump;
use derivative::Derivative;

use crate::model::attributes::TypeAttributes;
use crate::model::members::{CustomAttribute, EventDefinition, FieldDefinition, GenericParameter, MethodDefinition, ModuleReference, PropertyDefinition};
use crate::model::type_ref::TypeRef;
use crate::utilities::impl_pointer_identity;

/// A cloned (or pre-existing) type living in the target module. Shapes set at
/// shell-creation time (name, namespace, attributes, nesting) are plain
/// fields; everything populated during the rest of the Type/Member Cloner's
/// walk (base type, interfaces, generics, members) is interior-mutable so the
/// shell can be linked into the clone maps before its contents exist.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct TypeDefinition<'l> {
	pub name: &'l str,
	pub namespace: Cell<&'l str>,
	pub attributes: Cell<TypeAttributes>,
	pub declaring_type: Cell<Option<&'l TypeDefinition<'l>>>,
	pub base_type: Cell<Option<TypeRef<'l>>>,
	#[derivative(Debug = "ignore")]
	pub interfaces: RefCell<Vec<TypeRef<'l>>>,
	#[derivative(Debug = "ignore")]
	pub generic_parameters: RefCell<Vec<&'l GenericParameter<'l>>>,
	#[derivative(Debug = "ignore")]
	pub nested_types: RefCell<Vec<&'l TypeDefinition<'l>>>,
	#[derivative(Debug = "ignore")]
	pub fields: RefCell<Vec<&'l FieldDefinition<'l>>>,
	#[derivative(Debug = "ignore")]
	pub methods: RefCell<Vec<&'l MethodDefinition<'l>>>,
	#[derivative(Debug = "ignore")]
	pub properties: RefCell<Vec<&'l PropertyDefinition<'l>>>,
	#[derivative(Debug = "ignore")]
	pub events: RefCell<Vec<&'l EventDefinition<'l>>>,
	#[derivative(Debug = "ignore")]
	pub custom_attributes: RefCell<Vec<CustomAttribute<'l>>>,
}

impl_pointer_identity!(TypeDefinition);

impl<'l> TypeDefinition<'l> {
	pub fn name(&self) -> &'l str {
		self.name
	}

	pub fn namespace(&self) -> &'l str {
		self.namespace.get()
	}

	pub fn is_nested(&self) -> bool {
		self.declaring_type.get().is_some()
	}

	pub fn full_name(&self) -> String {
		match self.declaring_type.get() {
			Some(parent) => format!("{}+{}", parent.full_name(), self.name),
			None if self.namespace().is_empty() => self.name.to_string(),
			None => format!("{}.{}", self.namespace(), self.name),
		}
	}
}

impl Display for TypeDefinition<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.full_name())
	}
}

/// The module being imported into. Owns nothing by value — every entity
/// hanging off it lives in the importer's arena — but it is the single place
/// the invariants of module containment and assembly-reference absorption
/// during merge are enforced.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct TargetModule<'l> {
	pub assembly_full_name: &'l str,
	#[derivative(Debug(format_with = "crate::utilities::fmt_debug_cell_vec"))]
	pub types: RefCell<Vec<&'l TypeDefinition<'l>>>,
	#[derivative(Debug = "ignore")]
	pub module_references: RefCell<Vec<&'l ModuleReference<'l>>>,
	#[derivative(Debug = "ignore")]
	pub assembly_references: RefCell<Vec<&'l str>>,
}

impl<'l> TargetModule<'l> {
	pub fn new(assembly_full_name: &'l str) -> Self {
		Self {
			assembly_full_name,
			types: RefCell::new(Vec::new()),
			module_references: RefCell::new(Vec::new()),
			assembly_references: RefCell::new(Vec::new()),
		}
	}

	/// Adds a top-level type exactly once, upholding the module-containment
	/// invariant.
	pub(crate) fn add_top_level_type(&self, ty: &'l TypeDefinition<'l>) {
		debug_assert!(!ty.is_nested());
		let mut types = self.types.borrow_mut();
		if !types.iter().any(|t| std::ptr::eq(*t, ty)) {
			types.push(ty);
		}
	}

	/// Finds the module reference by name, creating and interning one in
	/// `bump` if it isn't already present.
	pub(crate) fn find_or_create_module_reference(&self, bump: &'l Bump, name: &str) -> &'l ModuleReference<'l> {
		let mut refs = self.module_references.borrow_mut();
		if let Some(existing) = refs.iter().find(|r| r.name == name) {
			return existing;
		}
		let name = bump.alloc_str(name);
		let module_ref = bump.alloc(ModuleReference { name });
		refs.push(module_ref);
		module_ref
	}

	pub fn types(&self) -> std::cell::Ref<'_, Vec<&'l TypeDefinition<'l>>> {
		self.types.borrow()
	}

	pub(crate) fn register_assembly_reference(&self, full_name: &'l str) {
		let mut refs = self.assembly_references.borrow_mut();
		if !refs.iter().any(|r| *r == full_name) {
			refs.push(full_name);
		}
	}

	/// The Merge Driver's closing step: drop every assembly reference whose
	/// full name matches a registered (now absorbed) source module.
	pub(crate) fn remove_assembly_reference(&self, full_name: &str) {
		self.assembly_references.borrow_mut().retain(|r| *r != full_name);
	}
}
