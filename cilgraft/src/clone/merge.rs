use crate::error::Result;
use crate::importer::Importer;
use crate::model::il::{ExceptionHandler, Instruction, Operand};
use crate::model::members::{CustomAttribute, FieldDefinition, FieldReference, FieldRef, GenericParameter, MethodDefinition, MethodReference, Parameter, PropertyDefinition, EventDefinition};
use crate::model::method_ref::MethodRef;
use crate::model::target::TypeDefinition;
use crate::model::type_ref::TypeRef;

/// Merge Driver: sweeps every type already living in the
/// target module — both freshly cloned ones and whatever pre-existed it —
/// through the same external/mergeable classification the Signature Rewriter
/// applies during ordinary cloning, so references that were external when
/// first rewritten but have since had their assembly registered become
/// definitions. Closes by dropping assembly references for every now-absorbed
/// source module.
pub(crate) fn merge<'l>(importer: &mut Importer<'l>) -> Result<()> {
	let types: Vec<&'l TypeDefinition<'l>> = importer.target().types().clone();
	for ty in types {
		sweep_type(importer, ty)?;
	}

	let absorbed: Vec<String> = importer.imported_modules().map(|m| m.assembly_full_name().to_string()).collect();
	for assembly in absorbed {
		importer.target().remove_assembly_reference(&assembly);
	}

	Ok(())
}

fn sweep_type<'l>(importer: &mut Importer<'l>, ty: &'l TypeDefinition<'l>) -> Result<()> {
	if let Some(base) = ty.base_type.get() {
		let rewritten = rewrite_existing_type_ref(importer, base)?;
		ty.base_type.set(Some(rewritten));
	}

	let interfaces: Vec<TypeRef<'l>> = ty.interfaces.borrow().clone();
	let mut rewritten_interfaces = Vec::with_capacity(interfaces.len());
	for interface in interfaces {
		rewritten_interfaces.push(rewrite_existing_type_ref(importer, interface)?);
	}
	*ty.interfaces.borrow_mut() = rewritten_interfaces;

	let generic_parameters: Vec<&'l GenericParameter<'l>> = ty.generic_parameters.borrow().clone();
	for gp in generic_parameters {
		sweep_constraints(importer, gp)?;
	}

	sweep_custom_attributes(importer, ty)?;

	let fields: Vec<&'l FieldDefinition<'l>> = ty.fields.borrow().clone();
	for field in fields {
		let rewritten = rewrite_existing_type_ref(importer, field.field_type.get())?;
		field.field_type.set(rewritten);
		sweep_custom_attributes(importer, field)?;
	}

	let methods: Vec<&'l MethodDefinition<'l>> = ty.methods.borrow().clone();
	for method in methods {
		sweep_method(importer, method)?;
	}

	let properties: Vec<&'l PropertyDefinition<'l>> = ty.properties.borrow().clone();
	for property in properties {
		let rewritten = rewrite_existing_type_ref(importer, property.property_type.get())?;
		property.property_type.set(rewritten);
		sweep_custom_attributes(importer, property)?;
	}

	let events: Vec<&'l EventDefinition<'l>> = ty.events.borrow().clone();
	for event in events {
		let rewritten = rewrite_existing_type_ref(importer, event.event_type.get())?;
		event.event_type.set(rewritten);
		sweep_custom_attributes(importer, event)?;
	}

	let nested: Vec<&'l TypeDefinition<'l>> = ty.nested_types.borrow().clone();
	for nested_type in nested {
		sweep_type(importer, nested_type)?;
	}

	Ok(())
}

fn sweep_constraints<'l>(importer: &mut Importer<'l>, gp: &'l GenericParameter<'l>) -> Result<()> {
	let constraints: Vec<TypeRef<'l>> = gp.constraints.borrow().clone();
	let mut rewritten = Vec::with_capacity(constraints.len());
	for constraint in constraints {
		rewritten.push(rewrite_existing_type_ref(importer, constraint)?);
	}
	*gp.constraints.borrow_mut() = rewritten;
	Ok(())
}

fn sweep_method<'l>(importer: &mut Importer<'l>, method: &'l MethodDefinition<'l>) -> Result<()> {
	let return_type = rewrite_existing_type_ref(importer, method.return_type.get())?;
	method.return_type.set(return_type);

	let parameters: Vec<&'l Parameter<'l>> = method.parameters.borrow().clone();
	for parameter in parameters {
		let rewritten = rewrite_existing_type_ref(importer, parameter.parameter_type.get())?;
		parameter.parameter_type.set(rewritten);
		sweep_custom_attributes(importer, parameter)?;
	}

	let generic_parameters: Vec<&'l GenericParameter<'l>> = method.generic_parameters.borrow().clone();
	for gp in generic_parameters {
		sweep_constraints(importer, gp)?;
	}

	let overrides: Vec<MethodRef<'l>> = method.overrides.borrow().clone();
	let mut rewritten_overrides = Vec::with_capacity(overrides.len());
	for method_ref in overrides {
		rewritten_overrides.push(rewrite_existing_method_ref(importer, method_ref)?);
	}
	*method.overrides.borrow_mut() = rewritten_overrides;

	sweep_custom_attributes(importer, method)?;

	if let Some(body) = method.body.get() {
		let instructions: Vec<&'l Instruction<'l>> = body.instructions.borrow().clone();
		for instruction in instructions {
			let operand = instruction.operand.replace(Operand::None);
			instruction.operand.set(rewrite_existing_operand(importer, operand)?);
		}

		let handlers: Vec<ExceptionHandler<'l>> = body.exception_handlers.borrow_mut().drain(..).collect();
		let mut rewritten_handlers = Vec::with_capacity(handlers.len());
		for handler in handlers {
			let catch_type = match handler.catch_type {
				Some(catch_type) => Some(rewrite_existing_type_ref(importer, catch_type)?),
				None => None,
			};
			rewritten_handlers.push(ExceptionHandler { catch_type, ..handler });
		}
		*body.exception_handlers.borrow_mut() = rewritten_handlers;
	}

	Ok(())
}

trait HasCustomAttributes<'l> {
	fn custom_attributes(&self) -> &std::cell::RefCell<Vec<CustomAttribute<'l>>>;
}

impl<'l> HasCustomAttributes<'l> for TypeDefinition<'l> {
	fn custom_attributes(&self) -> &std::cell::RefCell<Vec<CustomAttribute<'l>>> {
		&self.custom_attributes
	}
}
impl<'l> HasCustomAttributes<'l> for FieldDefinition<'l> {
	fn custom_attributes(&self) -> &std::cell::RefCell<Vec<CustomAttribute<'l>>> {
		&self.custom_attributes
	}
}
impl<'l> HasCustomAttributes<'l> for MethodDefinition<'l> {
	fn custom_attributes(&self) -> &std::cell::RefCell<Vec<CustomAttribute<'l>>> {
		&self.custom_attributes
	}
}
impl<'l> HasCustomAttributes<'l> for Parameter<'l> {
	fn custom_attributes(&self) -> &std::cell::RefCell<Vec<CustomAttribute<'l>>> {
		&self.custom_attributes
	}
}
impl<'l> HasCustomAttributes<'l> for PropertyDefinition<'l> {
	fn custom_attributes(&self) -> &std::cell::RefCell<Vec<CustomAttribute<'l>>> {
		&self.custom_attributes
	}
}
impl<'l> HasCustomAttributes<'l> for EventDefinition<'l> {
	fn custom_attributes(&self) -> &std::cell::RefCell<Vec<CustomAttribute<'l>>> {
		&self.custom_attributes
	}
}

fn sweep_custom_attributes<'l>(importer: &mut Importer<'l>, owner: &'l impl HasCustomAttributes<'l>) -> Result<()> {
	let attributes: Vec<CustomAttribute<'l>> = owner.custom_attributes().borrow_mut().drain(..).collect();
	let mut rewritten = Vec::with_capacity(attributes.len());
	for attribute in attributes {
		let constructor = rewrite_existing_method_ref(importer, attribute.constructor)?;
		rewritten.push(CustomAttribute { constructor, arguments: attribute.arguments });
	}
	*owner.custom_attributes().borrow_mut() = rewritten;
	Ok(())
}

/// Rewrites an already-built `TypeRef` the way the Signature Rewriter would
///, except the only variant that can still change is
/// `Reference`: everything else was already resolved against the assemblies
/// mergeable at the time it was first cloned.
fn rewrite_existing_type_ref<'l>(importer: &mut Importer<'l>, type_ref: TypeRef<'l>) -> Result<TypeRef<'l>> {
	match type_ref {
		TypeRef::Definition(_) | TypeRef::GenericParam(..) => Ok(type_ref),

		TypeRef::GenericInstance(element, arguments) => {
			let element = rewrite_existing_type_ref(importer, *element)?;
			let mut rewritten_arguments = Vec::with_capacity(arguments.len());
			for argument in arguments.iter() {
				rewritten_arguments.push(rewrite_existing_type_ref(importer, *argument)?);
			}
			let bump = importer.bump();
			Ok(TypeRef::GenericInstance(bump.alloc(element), bump.alloc_slice_copy(&rewritten_arguments)))
		}

		TypeRef::ByRef(inner) => {
			let inner = rewrite_existing_type_ref(importer, *inner)?;
			Ok(TypeRef::ByRef(importer.bump().alloc(inner)))
		}

		TypeRef::Array { element, rank } => {
			let element = rewrite_existing_type_ref(importer, *element)?;
			Ok(TypeRef::Array { element: importer.bump().alloc(element), rank })
		}

		TypeRef::Pointer(inner) => {
			let inner = rewrite_existing_type_ref(importer, *inner)?;
			Ok(TypeRef::Pointer(importer.bump().alloc(inner)))
		}

		TypeRef::RequiredModifier { modifier, inner } => {
			let modifier = rewrite_existing_type_ref(importer, *modifier)?;
			let inner = rewrite_existing_type_ref(importer, *inner)?;
			let bump = importer.bump();
			Ok(TypeRef::RequiredModifier { modifier: bump.alloc(modifier), inner: bump.alloc(inner) })
		}

		TypeRef::Reference(external) => {
			if !importer.is_mergeable(external.assembly_full_name) {
				return Ok(TypeRef::Reference(external));
			}
			if let Some(existing) = importer.clone_maps().get_type(external.assembly_full_name, external.full_name) {
				return Ok(TypeRef::Definition(existing));
			}
			let assembly = external.assembly_full_name.to_string();
			let full_name = external.full_name.to_string();
			let source = importer.source_module(&assembly)?;
			let clone = crate::clone::type_cloner::clone_type_by_name(importer, &source, &full_name)?;
			Ok(TypeRef::Definition(clone))
		}
	}
}

/// Mirrors `rewrite_existing_type_ref` for method references. `External` is
/// left untouched: unlike `TypeRef::Reference`, it carries no method-signature
/// identity to reconstruct a clone from, only an opaque handle the metadata
/// library produced.
fn rewrite_existing_method_ref<'l>(importer: &mut Importer<'l>, method_ref: MethodRef<'l>) -> Result<MethodRef<'l>> {
	match method_ref {
		MethodRef::Definition(_) | MethodRef::External(_) => Ok(method_ref),

		MethodRef::Reference(reference) => {
			let declaring_type = rewrite_existing_type_ref(importer, reference.declaring_type)?;
			let return_type = rewrite_existing_type_ref(importer, reference.return_type)?;
			let mut rewritten_parameters = Vec::with_capacity(reference.parameters.len());
			for parameter in reference.parameters.iter() {
				rewritten_parameters.push(rewrite_existing_type_ref(importer, *parameter)?);
			}
			let bump = importer.bump();
			let rewritten = bump.alloc(MethodReference {
				declaring_type,
				name: reference.name,
				has_this: reference.has_this,
				return_type,
				parameters: bump.alloc_slice_copy(&rewritten_parameters),
				generic_parameter_count: reference.generic_parameter_count,
			});
			Ok(MethodRef::Reference(rewritten))
		}

		MethodRef::GenericInstance(element, arguments) => {
			let element = rewrite_existing_method_ref(importer, *element)?;
			let mut rewritten_arguments = Vec::with_capacity(arguments.len());
			for argument in arguments.iter() {
				rewritten_arguments.push(rewrite_existing_type_ref(importer, *argument)?);
			}
			let bump = importer.bump();
			Ok(MethodRef::GenericInstance(bump.alloc(element), bump.alloc_slice_copy(&rewritten_arguments)))
		}
	}
}

/// Mirrors `rewrite_existing_type_ref` for field references; `External` is
/// left untouched for the same reason as `MethodRef::External` above.
fn rewrite_existing_field_ref<'l>(importer: &mut Importer<'l>, field_ref: FieldRef<'l>) -> Result<FieldRef<'l>> {
	match field_ref {
		FieldRef::Definition(_) | FieldRef::External(_) => Ok(field_ref),
		FieldRef::Reference(reference) => {
			let declaring_type = rewrite_existing_type_ref(importer, reference.declaring_type)?;
			let field_type = rewrite_existing_type_ref(importer, reference.field_type)?;
			let bump = importer.bump();
			let rewritten = bump.alloc(FieldReference { declaring_type, name: reference.name, field_type });
			Ok(FieldRef::Reference(rewritten))
		}
	}
}

fn rewrite_existing_operand<'l>(importer: &mut Importer<'l>, operand: Operand<'l>) -> Result<Operand<'l>> {
	match operand {
		Operand::Type(type_ref) => Ok(Operand::Type(rewrite_existing_type_ref(importer, type_ref)?)),
		Operand::Method(method_ref) => Ok(Operand::Method(rewrite_existing_method_ref(importer, method_ref)?)),
		Operand::Field(field_ref) => Ok(Operand::Field(rewrite_existing_field_ref(importer, field_ref)?)),
		other => Ok(other),
	}
}
