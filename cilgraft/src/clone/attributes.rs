use crate::clone::context::MethodContext;
use crate::clone::signature::rewrite_type_ref;
use crate::error::Result;
use crate::importer::Importer;
use crate::model::members::CustomAttribute;
use crate::model::method_ref::{MethodRef, MethodReference};
use crate::model::source::{SourceCustomAttribute, SourceMethodRef};
use crate::model::target::TypeDefinition;

/// Resolves a `SourceMethodRef` into a fresh `MethodRef` the same way
/// wherever it's encountered outside an instruction operand (custom
/// attribute constructors, method overrides): synchronously, since unlike
/// instruction operands there's no sibling-instruction ordering constraint
/// to wait on.
pub(crate) fn clone_method_ref<'l>(
	importer: &mut Importer<'l>,
	assembly_full_name: &str,
	method_ref: &SourceMethodRef,
	owner_type: Option<&'l TypeDefinition<'l>>,
	method_context: MethodContext<'l>,
) -> Result<MethodRef<'l>> {
	match method_ref {
		SourceMethodRef::Definition(handle) => {
			let source = importer.source_module(assembly_full_name)?;
			let info = source.method_info(*handle);
			let declaring_type = crate::clone::type_cloner::clone_type(importer, &source, info.declaring_type)?;
			let method = crate::clone::member_cloner::clone_method(importer, &source, *handle, declaring_type)?;
			Ok(MethodRef::Definition(method))
		}

		SourceMethodRef::GenericInstance(element, arguments) => {
			let element = clone_method_ref(importer, assembly_full_name, element, owner_type, method_context)?;
			let mut rewritten_arguments = Vec::with_capacity(arguments.len());
			for argument in arguments {
				rewritten_arguments.push(rewrite_type_ref(importer, assembly_full_name, argument, owner_type, method_context)?);
			}
			let bump = importer.bump();
			Ok(MethodRef::GenericInstance(bump.alloc(element), bump.alloc_slice_copy(&rewritten_arguments)))
		}

		SourceMethodRef::Reference { declaring_type, name, has_this, return_type, parameters, generic_parameter_count } => {
			let declaring_type = rewrite_type_ref(importer, assembly_full_name, declaring_type, owner_type, method_context)?;
			let return_type = rewrite_type_ref(importer, assembly_full_name, return_type, owner_type, method_context)?;
			let mut rewritten_parameters = Vec::with_capacity(parameters.len());
			for parameter in parameters {
				rewritten_parameters.push(rewrite_type_ref(importer, assembly_full_name, parameter, owner_type, method_context)?);
			}

			let bump = importer.bump();
			let reference = bump.alloc(MethodReference {
				declaring_type,
				name: bump.alloc_str(name),
				has_this: *has_this,
				return_type,
				parameters: bump.alloc_slice_copy(&rewritten_parameters),
				generic_parameter_count: *generic_parameter_count,
			});
			Ok(MethodRef::Reference(reference))
		}
	}
}

/// Custom-Attribute Cloner: the constructor reference is
/// cloned through the ordinary Method-Reference path; the serialized
/// argument blob is copied byte-for-byte, since it refers to types by name
/// only and requires no rewriting.
pub(crate) fn clone_custom_attributes<'l>(
	importer: &mut Importer<'l>,
	assembly_full_name: &str,
	source_attributes: &[SourceCustomAttribute],
	owner_type: Option<&'l TypeDefinition<'l>>,
	method_context: MethodContext<'l>,
) -> Result<Vec<CustomAttribute<'l>>> {
	let mut cloned = Vec::with_capacity(source_attributes.len());
	for attribute in source_attributes {
		let constructor = clone_method_ref(importer, assembly_full_name, &attribute.constructor, owner_type, method_context)?;
		let arguments = importer.bump().alloc_slice_copy(&attribute.arguments);
		cloned.push(CustomAttribute { constructor, arguments });
	}
	Ok(cloned)
}
