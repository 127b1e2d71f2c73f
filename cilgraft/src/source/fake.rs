//! An in-memory `SourceModule`, built up by hand, so the cloning engine's
//! tests never need to touch disk or link against a real metadata reader
//!. Handles are simply the index a type/member
//! was added at — there is no on-disk token scheme to imitate.

use crate::model::source::{
	SourceCustomAttribute, SourceEventHandle, SourceEventInfo, SourceFieldHandle, SourceFieldInfo,
	SourceGenericParameter, SourceMethodBody, SourceMethodHandle, SourceMethodInfo, SourceModule,
	SourcePropertyHandle, SourcePropertyInfo, SourceTypeHandle, SourceTypeInfo, SourceTypeRef,
};
use crate::model::attributes::TypeAttributes;

/// Accumulates types and members before handing out an immutable [`FakeModule`].
/// Mirrors the shell-then-fill shape of the real cloner: a type is added with
/// `add_type` before its base type, interfaces or members can reference it.
#[derive(Default)]
pub struct FakeModuleBuilder {
	assembly_full_name: String,
	types: Vec<SourceTypeInfo>,
	methods: Vec<SourceMethodInfo>,
	fields: Vec<SourceFieldInfo>,
	properties: Vec<SourcePropertyInfo>,
	events: Vec<SourceEventInfo>,
	symbols_available: bool,
}

impl FakeModuleBuilder {
	pub fn new(assembly_full_name: impl Into<String>) -> Self {
		Self { assembly_full_name: assembly_full_name.into(), ..Default::default() }
	}

	pub fn add_type(&mut self, name: impl Into<String>, namespace: impl Into<String>, attributes: TypeAttributes) -> SourceTypeHandle {
		let handle = SourceTypeHandle(self.types.len() as u32);
		self.types.push(SourceTypeInfo {
			name: name.into(),
			namespace: namespace.into(),
			attributes,
			declaring_type: None,
			nested_types: Vec::new(),
			base_type: None,
			interfaces: Vec::new(),
			generic_parameters: Vec::new(),
			fields: Vec::new(),
			methods: Vec::new(),
			properties: Vec::new(),
			events: Vec::new(),
			custom_attributes: Vec::new(),
		});
		handle
	}

	pub fn nest(&mut self, child: SourceTypeHandle, parent: SourceTypeHandle) {
		self.types[child.0 as usize].declaring_type = Some(parent);
		self.types[parent.0 as usize].nested_types.push(child);
	}

	pub fn set_base_type(&mut self, ty: SourceTypeHandle, base: SourceTypeRef) {
		self.types[ty.0 as usize].base_type = Some(base);
	}

	pub fn add_interface(&mut self, ty: SourceTypeHandle, interface: SourceTypeRef) {
		self.types[ty.0 as usize].interfaces.push(interface);
	}

	pub fn add_generic_parameter(&mut self, ty: SourceTypeHandle, parameter: SourceGenericParameter) {
		self.types[ty.0 as usize].generic_parameters.push(parameter);
	}

	pub fn add_type_custom_attribute(&mut self, ty: SourceTypeHandle, attribute: SourceCustomAttribute) {
		self.types[ty.0 as usize].custom_attributes.push(attribute);
	}

	pub fn add_field(&mut self, info: SourceFieldInfo) -> SourceFieldHandle {
		let handle = SourceFieldHandle(self.fields.len() as u32);
		let declaring_type = info.declaring_type;
		self.fields.push(info);
		self.types[declaring_type.0 as usize].fields.push(handle);
		handle
	}

	pub fn add_method(&mut self, info: SourceMethodInfo) -> SourceMethodHandle {
		let handle = SourceMethodHandle(self.methods.len() as u32);
		let declaring_type = info.declaring_type;
		self.methods.push(info);
		self.types[declaring_type.0 as usize].methods.push(handle);
		handle
	}

	pub fn add_property(&mut self, declaring_type: SourceTypeHandle, info: SourcePropertyInfo) -> SourcePropertyHandle {
		let handle = SourcePropertyHandle(self.properties.len() as u32);
		self.properties.push(info);
		self.types[declaring_type.0 as usize].properties.push(handle);
		handle
	}

	pub fn add_event(&mut self, declaring_type: SourceTypeHandle, info: SourceEventInfo) -> SourceEventHandle {
		let handle = SourceEventHandle(self.events.len() as u32);
		self.events.push(info);
		self.types[declaring_type.0 as usize].events.push(handle);
		handle
	}

	pub fn set_symbols_available(&mut self, available: bool) {
		self.symbols_available = available;
	}

	pub fn build(self) -> FakeModule {
		FakeModule {
			assembly_full_name: self.assembly_full_name,
			types: self.types,
			methods: self.methods,
			fields: self.fields,
			properties: self.properties,
			events: self.events,
			symbols_available: self.symbols_available,
		}
	}
}

/// A handful of in-memory vectors, indexed by the handle that names an entry.
pub struct FakeModule {
	assembly_full_name: String,
	types: Vec<SourceTypeInfo>,
	methods: Vec<SourceMethodInfo>,
	fields: Vec<SourceFieldInfo>,
	properties: Vec<SourcePropertyInfo>,
	events: Vec<SourceEventInfo>,
	symbols_available: bool,
}

impl FakeModule {
	fn full_name_of(&self, handle: SourceTypeHandle) -> String {
		let info = &self.types[handle.0 as usize];
		match info.declaring_type {
			Some(parent) => format!("{}+{}", self.full_name_of(parent), info.name),
			None => info.full_name(None),
		}
	}
}

impl SourceModule for FakeModule {
	fn assembly_full_name(&self) -> &str {
		&self.assembly_full_name
	}

	fn top_level_types(&self) -> Vec<SourceTypeHandle> {
		self.types
			.iter()
			.enumerate()
			.filter(|(_, info)| info.declaring_type.is_none())
			.map(|(index, _)| SourceTypeHandle(index as u32))
			.collect()
	}

	fn type_info(&self, handle: SourceTypeHandle) -> SourceTypeInfo {
		self.types[handle.0 as usize].clone()
	}

	fn method_info(&self, handle: SourceMethodHandle) -> SourceMethodInfo {
		self.methods[handle.0 as usize].clone()
	}

	fn field_info(&self, handle: SourceFieldHandle) -> SourceFieldInfo {
		self.fields[handle.0 as usize].clone()
	}

	fn property_info(&self, handle: SourcePropertyHandle) -> SourcePropertyInfo {
		self.properties[handle.0 as usize].clone()
	}

	fn event_info(&self, handle: SourceEventHandle) -> SourceEventInfo {
		self.events[handle.0 as usize].clone()
	}

	fn find_type_by_full_name(&self, full_name: &str) -> Option<SourceTypeHandle> {
		(0..self.types.len()).map(|i| SourceTypeHandle(i as u32)).find(|&handle| self.full_name_of(handle) == full_name)
	}

	fn symbols_available(&self) -> bool {
		self.symbols_available
	}
}

/// Builds up a [`SourceMethodBody`] instruction-by-instruction, tracking the
/// index each pushed instruction lands at so branch/switch targets can be
/// expressed positionally, the same way a real reader would hand them to the
/// Instruction Cloner.
#[derive(Default)]
pub struct FakeBodyBuilder {
	max_stack_size: u32,
	init_locals: bool,
	locals: Vec<SourceTypeRef>,
	instructions: Vec<crate::model::source::SourceInstruction>,
	exception_handlers: Vec<crate::model::source::SourceExceptionHandler>,
	debug_scope: Option<crate::model::source::SourceDebugScope>,
}

impl FakeBodyBuilder {
	pub fn new(max_stack_size: u32, init_locals: bool) -> Self {
		Self { max_stack_size, init_locals, ..Default::default() }
	}

	pub fn add_local(&mut self, ty: SourceTypeRef) {
		self.locals.push(ty);
	}

	pub fn push(&mut self, opcode: crate::model::il::OpCode, operand: crate::model::source::SourceOperand) -> u32 {
		let index = self.instructions.len() as u32;
		self.instructions.push(crate::model::source::SourceInstruction { opcode, operand });
		index
	}

	pub fn add_exception_handler(&mut self, handler: crate::model::source::SourceExceptionHandler) {
		self.exception_handlers.push(handler);
	}

	pub fn set_debug_scope(&mut self, scope: crate::model::source::SourceDebugScope) {
		self.debug_scope = Some(scope);
	}

	pub fn build(self) -> SourceMethodBody {
		SourceMethodBody {
			max_stack_size: self.max_stack_size,
			init_locals: self.init_locals,
			locals: self.locals,
			instructions: self.instructions,
			exception_handlers: self.exception_handlers,
			debug_scope: self.debug_scope,
		}
	}
}
