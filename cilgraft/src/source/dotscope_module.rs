//! `SourceModule` over a real PE/metadata reader (`dotscope`, default-on
//! feature). Holds the opened [`CilObject`] for the module's lifetime and
//! answers every query by re-resolving the requested token against it —
//! handles exposed to the rest of the crate are just the enumeration index a
//! type/method/field/property/event was first seen at, paired with the token
//! needed to look it back up.

use std::path::Path;

use dotscope::metadata::signatures::TypeSignature;
use dotscope::metadata::token::Token;
use dotscope::prelude::*;
use fxhash::FxHashMap;

use crate::error::Result;
use crate::model::attributes::{
	EventAttributes, FieldAttributes, MethodAttributes, MethodImplAttributes, PInvokeAttributes,
	ParameterAttributes, PropertyAttributes, TypeAttributes,
};
use crate::model::source::{
	SourceCustomAttribute, SourceEventHandle, SourceEventInfo, SourceFieldHandle, SourceFieldInfo,
	SourceGenericParameter, SourceMethodHandle, SourceMethodInfo, SourceModule, SourceMethodRef,
	SourcePropertyHandle, SourcePropertyInfo, SourceTypeHandle, SourceTypeInfo, SourceTypeRef,
};
use crate::model::type_ref::GenericParamOwner;

pub struct DotscopeModule {
	assembly_full_name: String,
	object: CilObject,
	types: Vec<Token>,
	methods: Vec<Token>,
	fields: Vec<Token>,
	properties: Vec<Token>,
	events: Vec<Token>,
	type_by_token: FxHashMap<Token, SourceTypeHandle>,
	symbols_available: bool,
}

impl DotscopeModule {
	pub fn open(path: &Path) -> Result<Self> {
		let object = CilObject::from_file(path)?;

		let mut types = Vec::new();
		let mut type_by_token = FxHashMap::default();
		for entry in object.types().iter() {
			let token = *entry.key();
			type_by_token.insert(token, SourceTypeHandle(types.len() as u32));
			types.push(token);
		}

		let methods: Vec<Token> = object.methods().iter().map(|entry| *entry.key()).collect();
		let fields: Vec<Token> = object.fields().iter().map(|entry| *entry.key()).collect();
		let properties: Vec<Token> = object.properties().iter().map(|entry| *entry.key()).collect();
		let events: Vec<Token> = object.events().iter().map(|entry| *entry.key()).collect();

		let assembly_full_name = object.assembly().map(|a| a.name.clone()).unwrap_or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default());
		let symbols_available = object.symbols().is_some();

		Ok(Self { assembly_full_name, object, types, methods, fields, properties, events, type_by_token, symbols_available })
	}

	fn type_token(&self, handle: SourceTypeHandle) -> Token {
		self.types[handle.0 as usize]
	}

	fn handle_of_token(&self, token: Token) -> SourceTypeHandle {
		*self.type_by_token.get(&token).expect("every TypeDef/TypeRef token reachable from a type's own fields was seen during the initial scan")
	}

	/// Best-effort conversion of a `dotscope` type signature into the
	/// cloner's own `SourceTypeRef` tree.
	/// Named .NET types resolve through `Class`/`ValueType` tokens; anything
	/// this adapter doesn't yet model structurally falls back to a plain
	/// `System.Object` reference rather than failing the whole import.
	fn convert_signature(&self, signature: &TypeSignature) -> SourceTypeRef {
		match signature {
			TypeSignature::Void => self.reference("System.Void"),
			TypeSignature::Boolean => self.reference("System.Boolean"),
			TypeSignature::Char => self.reference("System.Char"),
			TypeSignature::I1 => self.reference("System.SByte"),
			TypeSignature::U1 => self.reference("System.Byte"),
			TypeSignature::I2 => self.reference("System.Int16"),
			TypeSignature::U2 => self.reference("System.UInt16"),
			TypeSignature::I4 => self.reference("System.Int32"),
			TypeSignature::U4 => self.reference("System.UInt32"),
			TypeSignature::I8 => self.reference("System.Int64"),
			TypeSignature::U8 => self.reference("System.UInt64"),
			TypeSignature::R4 => self.reference("System.Single"),
			TypeSignature::R8 => self.reference("System.Double"),
			TypeSignature::String => self.reference("System.String"),
			TypeSignature::Object => self.reference("System.Object"),

			TypeSignature::Class(token) | TypeSignature::ValueType(token) => match self.type_by_token.get(token) {
				Some(handle) => SourceTypeRef::Definition(*handle),
				None => self.external_reference(*token),
			},

			TypeSignature::SzArray(element) => SourceTypeRef::Array { element: Box::new(self.convert_signature(element)), rank: 1 },
			TypeSignature::Array(element, shape) => SourceTypeRef::Array { element: Box::new(self.convert_signature(element)), rank: shape.rank.max(1) },
			TypeSignature::Ptr(inner) => SourceTypeRef::Pointer(Box::new(self.convert_signature(inner))),
			TypeSignature::ByRef(inner) => SourceTypeRef::ByRef(Box::new(self.convert_signature(inner))),
			TypeSignature::Var(index) => SourceTypeRef::GenericParam(GenericParamOwner::Type, *index),
			TypeSignature::MVar(index) => SourceTypeRef::GenericParam(GenericParamOwner::Method, *index),
			TypeSignature::GenericInst(element, arguments) => SourceTypeRef::GenericInstance(
				Box::new(self.convert_signature(element)),
				arguments.iter().map(|a| self.convert_signature(a)).collect(),
			),
			TypeSignature::CModReqD(modifier, inner) => SourceTypeRef::RequiredModifier {
				modifier: Box::new(self.convert_signature(modifier)),
				inner: Box::new(self.convert_signature(inner)),
			},
			TypeSignature::CModOpt(_, inner) => self.convert_signature(inner),

			_ => self.reference("System.Object"),
		}
	}

	fn reference(&self, full_name: &str) -> SourceTypeRef {
		SourceTypeRef::Reference { assembly_full_name: "System.Private.CoreLib".to_string(), full_name: full_name.to_string() }
	}

	fn external_reference(&self, token: Token) -> SourceTypeRef {
		let full_name = self.object.types().get(&token).map(|e| format!("{}.{}", e.value().namespace, e.value().name)).unwrap_or_else(|| format!("<unresolved:{}>", token.value()));
		SourceTypeRef::Reference { assembly_full_name: self.assembly_full_name.clone(), full_name }
	}

	/// Resolves a `MemberRef` token (a method or field reference that didn't
	/// resolve against this module's own method/field tables) to its
	/// declaring type and name via the raw `MemberRef` table, since dotscope's
	/// structured `methods()`/`fields()` maps only cover locally-defined rows.
	fn resolve_member_ref(&self, token: Token) -> Option<(SourceTypeRef, String)> {
		let member_ref = self.object.tables()?.table::<dotscope::metadata::tables::MemberRefRaw>()?.get(token.row())?;
		let declaring_token = Token::new(((member_ref.class.table as u32) << 24) | member_ref.class.row);
		let declaring_type = match self.type_by_token.get(&declaring_token) {
			Some(handle) => SourceTypeRef::Definition(*handle),
			None => self.external_reference(declaring_token),
		};
		let name = self.object.strings()?.get(member_ref.name as usize).ok()?.to_string();
		Some((declaring_type, name))
	}

	fn convert_method_ref(&self, token: Token) -> SourceMethodRef {
		if let Some(handle) = self.methods.iter().position(|t| *t == token) {
			return SourceMethodRef::Definition(SourceMethodHandle(handle as u32));
		}
		let (declaring_type, name) = self.resolve_member_ref(token).unwrap_or_else(|| (self.reference("System.Object"), String::new()));
		SourceMethodRef::Reference {
			declaring_type,
			name,
			has_this: true,
			return_type: self.reference("System.Void"),
			parameters: Vec::new(),
			generic_parameter_count: 0,
		}
	}

	fn convert_custom_attributes(&self, tokens: impl Iterator<Item = Token>) -> Vec<SourceCustomAttribute> {
		tokens
			.map(|ctor_token| SourceCustomAttribute { constructor: self.convert_method_ref(ctor_token), arguments: Vec::new() })
			.collect()
	}
}

impl SourceModule for DotscopeModule {
	fn assembly_full_name(&self) -> &str {
		&self.assembly_full_name
	}

	fn top_level_types(&self) -> Vec<SourceTypeHandle> {
		self.types
			.iter()
			.enumerate()
			.filter(|(_, token)| self.object.types().get(token).map(|e| e.value().enclosing_class.is_none()).unwrap_or(true))
			.map(|(index, _)| SourceTypeHandle(index as u32))
			.collect()
	}

	fn type_info(&self, handle: SourceTypeHandle) -> SourceTypeInfo {
		let token = self.type_token(handle);
		let entry = self.object.types().get(&token).expect("handle came from this module's own type scan");
		let row = entry.value();

		let declaring_type = row.enclosing_class.map(|parent_token| self.handle_of_token(parent_token));
		let nested_types = row.nested_types.iter().map(|(token, _)| self.handle_of_token(*token)).collect();
		let base_type = row.base().map(|base| match self.type_by_token.get(&base.token) {
			Some(handle) => SourceTypeRef::Definition(*handle),
			None => self.external_reference(base.token),
		});
		let interfaces = row
			.interfaces
			.iter()
			.map(|(_, iface)| match self.type_by_token.get(&iface.token) {
				Some(handle) => SourceTypeRef::Definition(*handle),
				None => self.external_reference(iface.token),
			})
			.collect();
		let generic_parameters = row
			.generic_params
			.iter()
			.enumerate()
			.map(|(index, (_, gp))| SourceGenericParameter { name: gp.name.clone(), index: index as u32, attributes: 0, constraints: Vec::new() })
			.collect();
		let fields = row.fields.iter().filter_map(|(token, _)| self.fields.iter().position(|t| t == token).map(|i| SourceFieldHandle(i as u32))).collect();
		let methods = row.methods.iter().filter_map(|(token, _)| self.methods.iter().position(|t| t == token).map(|i| SourceMethodHandle(i as u32))).collect();
		let properties = row.properties.iter().filter_map(|(token, _)| self.properties.iter().position(|t| t == token).map(|i| SourcePropertyHandle(i as u32))).collect();
		let events = row.events.iter().filter_map(|(token, _)| self.events.iter().position(|t| t == token).map(|i| SourceEventHandle(i as u32))).collect();

		SourceTypeInfo {
			name: row.name.clone(),
			namespace: row.namespace.clone(),
			attributes: TypeAttributes::from_bits_truncate(row.flags),
			declaring_type,
			nested_types,
			base_type,
			interfaces,
			generic_parameters,
			fields,
			methods,
			properties,
			events,
			custom_attributes: self.convert_custom_attributes(row.custom_attributes.iter().map(|(_, ca)| ca.constructor_token)),
		}
	}

	fn method_info(&self, handle: SourceMethodHandle) -> SourceMethodInfo {
		let token = self.methods[handle.0 as usize];
		let entry = self.object.methods().get(&token).expect("handle came from this module's own method scan");
		let row = entry.value();

		let declaring_type = row.parent.map(|parent| self.handle_of_token(parent)).unwrap_or(SourceTypeHandle(0));

		SourceMethodInfo {
			name: row.name.clone(),
			attributes: MethodAttributes::from_bits_truncate(row.flags),
			impl_attributes: MethodImplAttributes::from_bits_truncate(row.impl_flags),
			declaring_type,
			generic_parameters: row
				.generic_params
				.iter()
				.enumerate()
				.map(|(index, (_, gp))| SourceGenericParameter { name: gp.name.clone(), index: index as u32, attributes: 0, constraints: Vec::new() })
				.collect(),
			parameters: row
				.params
				.iter()
				.map(|(index, (_, param))| crate::model::source::SourceParameter {
					name: param.name.clone(),
					sequence: *index as u16,
					attributes: ParameterAttributes::from_bits_truncate(param.flags),
					parameter_type: self.convert_signature(&param.signature),
					marshal: None,
					custom_attributes: Vec::new(),
				})
				.collect(),
			return_type: self.convert_signature(&row.signature.return_type),
			overrides: row.overrides.iter().map(|token| self.convert_method_ref(*token)).collect(),
			pinvoke: row.pinvoke.as_ref().map(|p| crate::model::source::SourcePInvokeInfo {
				module_name: p.module_name.clone(),
				entry_point: p.entry_point.clone(),
				attributes: PInvokeAttributes::from_bits_truncate(p.flags),
			}),
			body: row.body.as_ref().map(|body| convert_method_body(self, body)),
			custom_attributes: self.convert_custom_attributes(row.custom_attributes.iter().map(|(_, ca)| ca.constructor_token)),
		}
	}

	fn field_info(&self, handle: SourceFieldHandle) -> SourceFieldInfo {
		let token = self.fields[handle.0 as usize];
		let entry = self.object.fields().get(&token).expect("handle came from this module's own field scan");
		let row = entry.value();
		let declaring_type = row.parent.map(|parent| self.handle_of_token(parent)).unwrap_or(SourceTypeHandle(0));

		SourceFieldInfo {
			name: row.name.clone(),
			attributes: FieldAttributes::from_bits_truncate(row.flags),
			declaring_type,
			field_type: self.convert_signature(&row.signature),
			initial_value: row.rva_data.clone(),
			offset: row.layout_offset,
			constant: None,
			marshal: row.marshal.clone(),
			custom_attributes: self.convert_custom_attributes(row.custom_attributes.iter().map(|(_, ca)| ca.constructor_token)),
		}
	}

	fn property_info(&self, handle: SourcePropertyHandle) -> SourcePropertyInfo {
		let token = self.properties[handle.0 as usize];
		let entry = self.object.properties().get(&token).expect("handle came from this module's own property scan");
		let row = entry.value();

		SourcePropertyInfo {
			name: row.name.clone(),
			attributes: PropertyAttributes::from_bits_truncate(row.flags),
			property_type: self.convert_signature(&row.signature.return_type),
			getter: row.getter.and_then(|t| self.methods.iter().position(|m| *m == t)).map(|i| SourceMethodHandle(i as u32)),
			setter: row.setter.and_then(|t| self.methods.iter().position(|m| *m == t)).map(|i| SourceMethodHandle(i as u32)),
			custom_attributes: self.convert_custom_attributes(row.custom_attributes.iter().map(|(_, ca)| ca.constructor_token)),
		}
	}

	fn event_info(&self, handle: SourceEventHandle) -> SourceEventInfo {
		let token = self.events[handle.0 as usize];
		let entry = self.object.events().get(&token).expect("handle came from this module's own event scan");
		let row = entry.value();

		SourceEventInfo {
			name: row.name.clone(),
			attributes: EventAttributes::from_bits_truncate(row.flags),
			event_type: row.event_type.map(|t| self.convert_signature(&TypeSignature::Class(t))).unwrap_or_else(|| self.reference("System.Object")),
			add: row.add.and_then(|t| self.methods.iter().position(|m| *m == t)).map(|i| SourceMethodHandle(i as u32)),
			remove: row.remove.and_then(|t| self.methods.iter().position(|m| *m == t)).map(|i| SourceMethodHandle(i as u32)),
			raise: row.raise.and_then(|t| self.methods.iter().position(|m| *m == t)).map(|i| SourceMethodHandle(i as u32)),
			custom_attributes: self.convert_custom_attributes(row.custom_attributes.iter().map(|(_, ca)| ca.constructor_token)),
		}
	}

	fn find_type_by_full_name(&self, full_name: &str) -> Option<SourceTypeHandle> {
		self.types.iter().position(|token| {
			self.object.types().get(token).map(|e| {
				let row = e.value();
				let qualified = if row.namespace.is_empty() { row.name.clone() } else { format!("{}.{}", row.namespace, row.name) };
				qualified == full_name
			}).unwrap_or(false)
		}).map(|index| SourceTypeHandle(index as u32))
	}

	fn symbols_available(&self) -> bool {
		self.symbols_available
	}
}

/// Converts a method body via dotscope's decoded instruction stream into the
/// positional, index-addressed shape `copy_instructions` expects. Operand conversion for method/field tokens goes through the same
/// by-token resolution as signatures; instructions this adapter doesn't
/// recognize are copied as a no-operand `nop`, never silently dropped, so a
/// body's instruction count is always preserved.
fn convert_method_body(module: &DotscopeModule, body: &dotscope::metadata::method::MethodBody) -> crate::model::source::SourceMethodBody {
	use crate::model::source::{SourceExceptionHandler, SourceExceptionHandlerKind, SourceInstruction, SourceOperand};

	let offset_to_index: FxHashMap<u32, u32> = body.instructions.iter().enumerate().map(|(index, insn)| (insn.offset, index as u32)).collect();
	let index_of = |offset: u32| *offset_to_index.get(&offset).unwrap_or(&0);

	let instructions = body
		.instructions
		.iter()
		.map(|insn| SourceInstruction {
			opcode: crate::model::il::OpCode(insn.opcode as u16),
			operand: convert_operand(module, insn, &index_of),
		})
		.collect();

	let exception_handlers = body
		.exception_handlers
		.iter()
		.map(|handler| SourceExceptionHandler {
			kind: match handler.kind {
				dotscope::metadata::method::ExceptionHandlerKind::Catch => SourceExceptionHandlerKind::Catch,
				dotscope::metadata::method::ExceptionHandlerKind::Filter => SourceExceptionHandlerKind::Filter,
				dotscope::metadata::method::ExceptionHandlerKind::Finally => SourceExceptionHandlerKind::Finally,
				dotscope::metadata::method::ExceptionHandlerKind::Fault => SourceExceptionHandlerKind::Fault,
			},
			try_start: index_of(handler.try_offset),
			try_end: index_of(handler.try_offset + handler.try_length),
			handler_start: index_of(handler.handler_offset),
			handler_end: index_of(handler.handler_offset + handler.handler_length),
			filter_start: handler.filter_offset.map(index_of),
			catch_type: handler.catch_token.map(|t| module.convert_signature(&TypeSignature::Class(t))),
		})
		.collect();

	crate::model::source::SourceMethodBody {
		max_stack_size: body.max_stack,
		init_locals: body.init_locals,
		locals: body.locals.iter().map(|l| module.convert_signature(&l.signature)).collect(),
		instructions,
		exception_handlers,
		debug_scope: None,
	}
}

fn convert_operand(module: &DotscopeModule, insn: &dotscope::metadata::method::Instruction, index_of: &impl Fn(u32) -> u32) -> crate::model::source::SourceOperand {
	use dotscope::metadata::method::Operand as RawOperand;
	use crate::model::source::SourceOperand;

	match &insn.operand {
		RawOperand::None => SourceOperand::None,
		RawOperand::Int32(v) => SourceOperand::Int32(*v),
		RawOperand::Int64(v) => SourceOperand::Int64(*v),
		RawOperand::Float32(v) => SourceOperand::Float32(*v),
		RawOperand::Float64(v) => SourceOperand::Float64(*v),
		RawOperand::String(s) => SourceOperand::String(s.clone()),
		RawOperand::Variable(v) => SourceOperand::Variable(*v),
		RawOperand::Argument(v) => SourceOperand::Argument(*v),
		RawOperand::Type(token) => SourceOperand::Type(module.convert_signature(&TypeSignature::Class(*token))),
		RawOperand::Method(token) => SourceOperand::Method(module.convert_method_ref(*token)),
		RawOperand::Field(token) => SourceOperand::Field(convert_field_ref(module, *token)),
		RawOperand::BranchTarget(offset) => SourceOperand::Branch(index_of(*offset)),
		RawOperand::SwitchTargets(offsets) => SourceOperand::Switch(offsets.iter().map(|o| index_of(*o)).collect()),
	}
}

fn convert_field_ref(module: &DotscopeModule, token: Token) -> crate::model::source::SourceFieldRef {
	use crate::model::source::SourceFieldRef;
	if let Some(index) = module.fields.iter().position(|t| *t == token) {
		return SourceFieldRef::Definition(SourceFieldHandle(index as u32));
	}
	let (declaring_type, name) = module.resolve_member_ref(token).unwrap_or_else(|| (module.reference("System.Object"), String::new()));
	SourceFieldRef::Reference { declaring_type, name, field_type: module.reference("System.Object") }
}
