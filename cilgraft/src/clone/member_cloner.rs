use std::cell::Cell;
use std::rc::Rc;

use crate::clone::attributes::clone_custom_attributes;
use crate::clone::signature::rewrite_type_ref;
use crate::descriptor::{MemberDescriptor, MemberKind};
use crate::error::{CloneError, Result};
use crate::importer::{ImportedMember, Importer};
use crate::model::il::LocalVariable;
use crate::model::members::{
	Constant, EventDefinition, FieldDefinition, GenericParameter, MarshalInfo, MethodDefinition,
	Parameter, PInvokeInfo, PropertyDefinition,
};
use crate::model::source::{
	SourceConstant, SourceEventHandle, SourceFieldHandle, SourceMethodHandle, SourceModule,
	SourcePropertyHandle,
};
use crate::model::target::TypeDefinition;
use crate::model::type_ref::TypeRef;
use crate::queue::Priority;

fn convert_constant<'l>(bump: &'l bumpalo::Bump, constant: &SourceConstant) -> Constant<'l> {
	match constant {
		SourceConstant::Bool(v) => Constant::Bool(*v),
		SourceConstant::Char(v) => Constant::Char(*v),
		SourceConstant::I8(v) => Constant::I8(*v),
		SourceConstant::U8(v) => Constant::U8(*v),
		SourceConstant::I16(v) => Constant::I16(*v),
		SourceConstant::U16(v) => Constant::U16(*v),
		SourceConstant::I32(v) => Constant::I32(*v),
		SourceConstant::U32(v) => Constant::U32(*v),
		SourceConstant::I64(v) => Constant::I64(*v),
		SourceConstant::U64(v) => Constant::U64(*v),
		SourceConstant::R4(v) => Constant::R4(*v),
		SourceConstant::R8(v) => Constant::R8(*v),
		SourceConstant::Str(v) => Constant::Str(bump.alloc_str(v)),
		SourceConstant::Null => Constant::Null,
	}
}

/// **Fields**: preserve name, attributes, initial value bytes,
/// offset, constant, marshal info, custom attributes; rewrite the field type.
pub(crate) fn clone_field<'l>(
	importer: &mut Importer<'l>,
	source: &Rc<dyn SourceModule>,
	handle: SourceFieldHandle,
	declaring_type: &'l TypeDefinition<'l>,
) -> Result<&'l FieldDefinition<'l>> {
	let assembly = source.assembly_full_name().to_string();
	if let Some(existing) = importer.clone_maps().get_field(&assembly, handle) {
		return Ok(existing);
	}

	let info = source.field_info(handle);
	let field_type = rewrite_type_ref(importer, &assembly, &info.field_type, Some(declaring_type), None)?;
	let custom_attributes = clone_custom_attributes(importer, &assembly, &info.custom_attributes, Some(declaring_type), None)?;

	let bump = importer.bump();
	let field: &'l FieldDefinition<'l> = bump.alloc(FieldDefinition {
		name: bump.alloc_str(&info.name),
		attributes: Cell::new(info.attributes),
		field_type: Cell::new(field_type),
		initial_value: info.initial_value.as_deref().map(|bytes| &*bump.alloc_slice_copy(bytes)),
		offset: info.offset,
		constant: info.constant.as_ref().map(|c| convert_constant(bump, c)),
		marshal: info.marshal.as_deref().map(|bytes| MarshalInfo(bump.alloc_slice_copy(bytes))),
		custom_attributes: custom_attributes.into(),
	});

	importer.clone_maps_mut().insert_field(&assembly, handle, field);
	declaring_type.fields.borrow_mut().push(field);
	Ok(field)
}

/// **Methods**: see the module doc comment on
/// [`crate::clone`] for the overall ordering; the shell goes into the method
/// map before anything recursive happens, since a body's own instructions
/// may reference the very method being cloned.
pub(crate) fn clone_method<'l>(
	importer: &mut Importer<'l>,
	source: &Rc<dyn SourceModule>,
	handle: SourceMethodHandle,
	declaring_type: &'l TypeDefinition<'l>,
) -> Result<&'l MethodDefinition<'l>> {
	let assembly = source.assembly_full_name().to_string();
	if let Some(existing) = importer.clone_maps().get_method(&assembly, handle) {
		return Ok(existing);
	}

	let info = source.method_info(handle);
	let placeholder_return = TypeRef::Reference(importer.import_external(&assembly, "System.Void"));

	let bump = importer.bump();
	let shell: &'l MethodDefinition<'l> = bump.alloc(MethodDefinition {
		name: bump.alloc_str(&info.name),
		attributes: Cell::new(info.attributes),
		impl_attributes: Cell::new(info.impl_attributes),
		declaring_type: Cell::new(Some(declaring_type)),
		generic_parameters: Default::default(),
		parameters: Default::default(),
		return_type: Cell::new(placeholder_return),
		overrides: Default::default(),
		pinvoke: Cell::new(None),
		body: Cell::new(None),
		custom_attributes: Default::default(),
	});
	importer.clone_maps_mut().insert_method(&assembly, handle, shell);
	declaring_type.methods.borrow_mut().push(shell);

	for source_gp in &info.generic_parameters {
		let bump = importer.bump();
		let gp: &'l GenericParameter<'l> = bump.alloc(GenericParameter {
			name: bump.alloc_str(&source_gp.name),
			index: source_gp.index,
			attributes: source_gp.attributes,
			constraints: Default::default(),
		});
		shell.generic_parameters.borrow_mut().push(gp);
		for constraint in &source_gp.constraints {
			let rewritten = rewrite_type_ref(importer, &assembly, constraint, Some(declaring_type), Some(shell))?;
			gp.constraints.borrow_mut().push(rewritten);
		}
	}

	for source_param in &info.parameters {
		let parameter_type = rewrite_type_ref(importer, &assembly, &source_param.parameter_type, Some(declaring_type), Some(shell))?;
		let custom_attributes = clone_custom_attributes(importer, &assembly, &source_param.custom_attributes, Some(declaring_type), Some(shell))?;
		let bump = importer.bump();
		let parameter: &'l Parameter<'l> = bump.alloc(Parameter {
			name: bump.alloc_str(&source_param.name),
			sequence: source_param.sequence,
			attributes: Cell::new(source_param.attributes),
			parameter_type: Cell::new(parameter_type),
			marshal: source_param.marshal.as_deref().map(|bytes| MarshalInfo(bump.alloc_slice_copy(bytes))),
			custom_attributes: custom_attributes.into(),
		});
		shell.parameters.borrow_mut().push(parameter);
	}

	if let Some(pinvoke) = &info.pinvoke {
		let module_ref = importer.target().find_or_create_module_reference(importer.bump(), &pinvoke.module_name);
		let bump = importer.bump();
		shell.pinvoke.set(Some(PInvokeInfo {
			module: module_ref,
			entry_point: bump.alloc_str(&pinvoke.entry_point),
			attributes: pinvoke.attributes,
		}));
	}

	let return_type = rewrite_type_ref(importer, &assembly, &info.return_type, Some(declaring_type), Some(shell))?;
	shell.return_type.set(return_type);

	for source_override in &info.overrides {
		let rewritten = crate::clone::attributes::clone_method_ref(importer, &assembly, source_override, Some(declaring_type), Some(shell))?;
		shell.overrides.borrow_mut().push(rewritten);
	}

	let custom_attributes = clone_custom_attributes(importer, &assembly, &info.custom_attributes, Some(declaring_type), Some(shell))?;
	*shell.custom_attributes.borrow_mut() = custom_attributes;

	if let Some(source_body) = &info.body {
		let mut locals = Vec::with_capacity(source_body.locals.len());
		for local in &source_body.locals {
			let ty = rewrite_type_ref(importer, &assembly, local, Some(declaring_type), Some(shell))?;
			locals.push(LocalVariable { ty, is_pinned: false });
		}

		let bump = importer.bump();
		let body = bump.alloc(crate::model::il::MethodBody {
			max_stack_size: source_body.max_stack_size,
			init_locals: source_body.init_locals,
			locals,
			instructions: Default::default(),
			exception_handlers: Default::default(),
			debug_scope: Cell::new(None),
		});
		shell.body.set(Some(body));

		let source = source.clone();
		let assembly = assembly.clone();
		importer.queue_mut().schedule(Priority::Instructions, move |importer: &mut Importer<'l>| {
			crate::clone::instructions::copy_instructions(importer, &source, &assembly, shell, handle)
		});
	}

	Ok(shell)
}

/// **Properties**: accessors resolved through the method map
/// — the declaring type's methods must already be cloned, which the fixed
/// member order (fields, methods, properties, events) guarantees.
pub(crate) fn clone_property<'l>(
	importer: &mut Importer<'l>,
	source: &Rc<dyn SourceModule>,
	handle: SourcePropertyHandle,
	declaring_type: &'l TypeDefinition<'l>,
) -> Result<&'l PropertyDefinition<'l>> {
	let assembly = source.assembly_full_name().to_string();
	if let Some(existing) = importer.clone_maps().get_property(&assembly, handle) {
		return Ok(existing);
	}

	let info = source.property_info(handle);
	let property_type = rewrite_type_ref(importer, &assembly, &info.property_type, Some(declaring_type), None)?;
	let getter = match info.getter {
		Some(h) => Some(resolve_cloned_method(importer, &assembly, h)?),
		None => None,
	};
	let setter = match info.setter {
		Some(h) => Some(resolve_cloned_method(importer, &assembly, h)?),
		None => None,
	};
	let custom_attributes = clone_custom_attributes(importer, &assembly, &info.custom_attributes, Some(declaring_type), None)?;

	let bump = importer.bump();
	let property: &'l PropertyDefinition<'l> = bump.alloc(PropertyDefinition {
		name: bump.alloc_str(&info.name),
		attributes: Cell::new(info.attributes),
		property_type: Cell::new(property_type),
		getter: Cell::new(getter),
		setter: Cell::new(setter),
		custom_attributes: custom_attributes.into(),
	});

	importer.clone_maps_mut().insert_property(&assembly, handle, property);
	declaring_type.properties.borrow_mut().push(property);
	Ok(property)
}

/// **Events**: analogous to properties, with add/remove/raise.
pub(crate) fn clone_event<'l>(
	importer: &mut Importer<'l>,
	source: &Rc<dyn SourceModule>,
	handle: SourceEventHandle,
	declaring_type: &'l TypeDefinition<'l>,
) -> Result<&'l EventDefinition<'l>> {
	let assembly = source.assembly_full_name().to_string();
	if let Some(existing) = importer.clone_maps().get_event(&assembly, handle) {
		return Ok(existing);
	}

	let info = source.event_info(handle);
	let event_type = rewrite_type_ref(importer, &assembly, &info.event_type, Some(declaring_type), None)?;
	let add = match info.add {
		Some(h) => Some(resolve_cloned_method(importer, &assembly, h)?),
		None => None,
	};
	let remove = match info.remove {
		Some(h) => Some(resolve_cloned_method(importer, &assembly, h)?),
		None => None,
	};
	let raise = match info.raise {
		Some(h) => Some(resolve_cloned_method(importer, &assembly, h)?),
		None => None,
	};
	let custom_attributes = clone_custom_attributes(importer, &assembly, &info.custom_attributes, Some(declaring_type), None)?;

	let bump = importer.bump();
	let event: &'l EventDefinition<'l> = bump.alloc(EventDefinition {
		name: bump.alloc_str(&info.name),
		attributes: Cell::new(info.attributes),
		event_type: Cell::new(event_type),
		add: Cell::new(add),
		remove: Cell::new(remove),
		raise: Cell::new(raise),
		custom_attributes: custom_attributes.into(),
	});

	importer.clone_maps_mut().insert_event(&assembly, handle, event);
	declaring_type.events.borrow_mut().push(event);
	Ok(event)
}

/// Accessor methods are always definitions within the same source module as
/// their owning property/event, and always cloned as part of the same
/// type's member walk (step 10 clones methods before properties/events), so
/// the clone map lookup here can never miss.
fn resolve_cloned_method<'l>(importer: &mut Importer<'l>, assembly_full_name: &str, handle: SourceMethodHandle) -> Result<&'l MethodDefinition<'l>> {
	importer.clone_maps().get_method(assembly_full_name, handle).ok_or_else(|| CloneError::MemberNotFound {
		declaring_type: assembly_full_name.to_string(),
		name: "<accessor>".to_string(),
	})
}

/// Import method/field/property/event by descriptor.
pub(crate) fn clone_member_by_descriptor<'l>(importer: &mut Importer<'l>, source: &Rc<dyn SourceModule>, descriptor: &MemberDescriptor) -> Result<ImportedMember<'l>> {
	let declaring_type = crate::clone::type_cloner::clone_type_by_name(importer, source, &descriptor.declaring_type)?;
	let assembly = source.assembly_full_name().to_string();

	match descriptor.kind {
		MemberKind::Constructor | MemberKind::Method => {
			let source_handle = find_method_handle(source, declaring_type, descriptor)?;
			let method = clone_method(importer, source, source_handle, declaring_type)?;
			Ok(ImportedMember::Method(method))
		}
		MemberKind::Field => {
			let info = source.type_info(source_handle_of(source, &descriptor.declaring_type)?);
			let handle = info
				.fields
				.iter()
				.find(|h| source.field_info(**h).name == descriptor.name)
				.copied()
				.ok_or_else(|| no_match_error(&info, source, descriptor, "field"))?;
			clone_field(importer, source, handle, declaring_type).map(ImportedMember::Field)
		}
		MemberKind::Property => {
			let info = source.type_info(source_handle_of(source, &descriptor.declaring_type)?);
			let handle = info
				.properties
				.iter()
				.find(|h| source.property_info(**h).name == descriptor.name)
				.copied()
				.ok_or_else(|| no_match_error(&info, source, descriptor, "property"))?;
			let property = clone_property(importer, source, handle, declaring_type)?;
			Ok(ImportedMember::Property(property))
		}
		MemberKind::Event => {
			let info = source.type_info(source_handle_of(source, &descriptor.declaring_type)?);
			let handle = info
				.events
				.iter()
				.find(|h| source.event_info(**h).name == descriptor.name)
				.copied()
				.ok_or_else(|| no_match_error(&info, source, descriptor, "event"))?;
			let event = clone_event(importer, source, handle, declaring_type)?;
			Ok(ImportedMember::Event(event))
		}
	}
}

fn source_handle_of(source: &Rc<dyn SourceModule>, full_name: &str) -> Result<crate::model::source::SourceTypeHandle> {
	source.find_type_by_full_name(full_name).ok_or_else(|| CloneError::UnresolvableReference {
		assembly: source.assembly_full_name().to_string(),
		full_name: full_name.to_string(),
	})
}

/// Finds the method on `declaring_type`'s source whose name and parameter
/// signature matches `descriptor`, failing with `InvalidDescriptor` if a
/// same-named member exists but isn't a method/constructor, or
/// `MemberNotFound` if nothing matches at all.
fn find_method_handle<'l>(source: &Rc<dyn SourceModule>, declaring_type: &'l TypeDefinition<'l>, descriptor: &MemberDescriptor) -> Result<SourceMethodHandle> {
	let _ = declaring_type;
	let handle = source_handle_of(source, &descriptor.declaring_type)?;
	let info = source.type_info(handle);

	for method_handle in &info.methods {
		let method_info = source.method_info(*method_handle);
		if method_info.name != descriptor.name {
			continue;
		}
		let parameter_types: Vec<String> = method_info.parameters.iter().map(|p| type_ref_full_name(source, &p.parameter_type)).collect();
		if descriptor.matches_parameters(&parameter_types) {
			return Ok(*method_handle);
		}
	}

	Err(no_match_error(&info, source, descriptor, "method"))
}

/// Builds the failure for a descriptor that matched no candidate of its own
/// kind on the declaring type: `InvalidDescriptor` if a member of the *same*
/// name exists under a different kind (field/property/event/method all cross-
/// checked against each other), `MemberNotFound` if the name doesn't appear
/// at all.
fn no_match_error(info: &crate::model::source::SourceTypeInfo, source: &Rc<dyn SourceModule>, descriptor: &MemberDescriptor, expected: &'static str) -> CloneError {
	let is_method = info.methods.iter().any(|h| source.method_info(*h).name == descriptor.name);
	let is_field = info.fields.iter().any(|h| source.field_info(*h).name == descriptor.name);
	let is_property = info.properties.iter().any(|h| source.property_info(*h).name == descriptor.name);
	let is_event = info.events.iter().any(|h| source.event_info(*h).name == descriptor.name);

	let found_under_other_kind = match expected {
		"method" => is_field || is_property || is_event,
		"field" => is_method || is_property || is_event,
		"property" => is_method || is_field || is_event,
		"event" => is_method || is_field || is_property,
		_ => is_method || is_field || is_property || is_event,
	};

	if found_under_other_kind {
		CloneError::InvalidDescriptor { expected, name: descriptor.name.clone() }
	} else {
		CloneError::MemberNotFound { declaring_type: descriptor.declaring_type.clone(), name: descriptor.name.clone() }
	}
}

/// Renders a source type reference the same way a descriptor's
/// [`crate::descriptor::ParameterTypeToken::Concrete`] names it: a definition
/// resolves through the source module to its namespace-qualified name, and a
/// generic parameter is rendered `!index`/`!!index` (type-owned/method-owned)
/// so two distinct positions never collapse onto the same placeholder.
fn type_ref_full_name(source: &Rc<dyn SourceModule>, type_ref: &crate::model::source::SourceTypeRef) -> String {
	use crate::model::source::SourceTypeRef;
	use crate::model::type_ref::GenericParamOwner;

	match type_ref {
		SourceTypeRef::Reference { full_name, .. } => full_name.clone(),
		SourceTypeRef::Definition(handle) => {
			let info = source.type_info(*handle);
			if info.namespace.is_empty() {
				info.name
			} else {
				format!("{}.{}", info.namespace, info.name)
			}
		}
		SourceTypeRef::GenericParam(GenericParamOwner::Type, index) => format!("!{index}"),
		SourceTypeRef::GenericParam(GenericParamOwner::Method, index) => format!("!!{index}"),
		SourceTypeRef::GenericInstance(element, arguments) => {
			let args: Vec<String> = arguments.iter().map(|a| type_ref_full_name(source, a)).collect();
			format!("{}<{}>", type_ref_full_name(source, element), args.join(","))
		}
		SourceTypeRef::ByRef(inner) => format!("{}&", type_ref_full_name(source, inner)),
		SourceTypeRef::Array { element, rank } => format!("{}[{}]", type_ref_full_name(source, element), rank),
		SourceTypeRef::Pointer(inner) => format!("{}*", type_ref_full_name(source, inner)),
		SourceTypeRef::RequiredModifier { modifier, inner } => format!("{} modreq({})", type_ref_full_name(source, inner), type_ref_full_name(source, modifier)),
	}
}
