use std::rc::Rc;

use crate::clone::context::MethodContext;
use crate::error::{CloneError, Result};
use crate::importer::Importer;
use crate::model::source::{SourceModule, SourceTypeRef};
use crate::model::target::TypeDefinition;
use crate::model::type_ref::{GenericParamOwner, TypeRef};

/// `rewrite(typeRef, methodContext) -> typeRef`. `owner_type`
/// is whichever cloned type the reference being rewritten structurally
/// belongs to (the type currently being cloned, or a method's declaring
/// type) — it resolves type-owned generic parameters (`!i`); `method_context`
/// resolves method-owned ones (`!!i`).
///
/// Every returned node is freshly allocated: no source-side node is ever
/// mutated or aliased into the result.
pub(crate) fn rewrite_type_ref<'l>(
	importer: &mut Importer<'l>,
	assembly_full_name: &str,
	type_ref: &SourceTypeRef,
	owner_type: Option<&'l TypeDefinition<'l>>,
	method_context: MethodContext<'l>,
) -> Result<TypeRef<'l>> {
	match type_ref {
		SourceTypeRef::Definition(handle) => {
			let source = importer.source_module(assembly_full_name)?;
			let clone = crate::clone::type_cloner::clone_type(importer, &source, *handle)?;
			Ok(TypeRef::Definition(clone))
		}

		SourceTypeRef::GenericParam(GenericParamOwner::Type, index) => {
			let _ = owner_type;
			Ok(TypeRef::GenericParam(GenericParamOwner::Type, *index))
		}

		SourceTypeRef::GenericParam(GenericParamOwner::Method, index) => match method_context {
			Some(_) => Ok(TypeRef::GenericParam(GenericParamOwner::Method, *index)),
			None => Err(CloneError::MissingContext),
		},

		SourceTypeRef::GenericInstance(element, arguments) => {
			let element = rewrite_type_ref(importer, assembly_full_name, element, owner_type, method_context)?;
			let mut rewritten_arguments = Vec::with_capacity(arguments.len());
			for argument in arguments {
				rewritten_arguments.push(rewrite_type_ref(importer, assembly_full_name, argument, owner_type, method_context)?);
			}
			let bump = importer.bump();
			Ok(TypeRef::GenericInstance(bump.alloc(element), bump.alloc_slice_copy(&rewritten_arguments)))
		}

		SourceTypeRef::ByRef(inner) => {
			let inner = rewrite_type_ref(importer, assembly_full_name, inner, owner_type, method_context)?;
			Ok(TypeRef::ByRef(importer.bump().alloc(inner)))
		}

		SourceTypeRef::Array { element, rank } => {
			let element = rewrite_type_ref(importer, assembly_full_name, element, owner_type, method_context)?;
			Ok(TypeRef::Array { element: importer.bump().alloc(element), rank: *rank })
		}

		SourceTypeRef::Pointer(inner) => {
			let inner = rewrite_type_ref(importer, assembly_full_name, inner, owner_type, method_context)?;
			Ok(TypeRef::Pointer(importer.bump().alloc(inner)))
		}

		SourceTypeRef::RequiredModifier { modifier, inner } => {
			// Open Question decision: the
			// modifier follows the same external/mergeable classification as
			// any other reference; `inner` is always rewritten regardless of
			// what that classification turns out to be.
			let modifier = rewrite_type_ref(importer, assembly_full_name, modifier, owner_type, method_context)?;
			let inner = rewrite_type_ref(importer, assembly_full_name, inner, owner_type, method_context)?;
			let bump = importer.bump();
			Ok(TypeRef::RequiredModifier { modifier: bump.alloc(modifier), inner: bump.alloc(inner) })
		}

		SourceTypeRef::Reference { assembly_full_name: owning_assembly, full_name } => {
			if !importer.is_mergeable(owning_assembly) {
				return Ok(TypeRef::Reference(importer.import_external(owning_assembly, full_name)));
			}

			if let Some(existing) = importer.clone_maps().get_type(owning_assembly, full_name) {
				return Ok(TypeRef::Definition(existing));
			}

			let source: Rc<dyn SourceModule> = importer.source_module(owning_assembly)?;
			let clone = crate::clone::type_cloner::clone_type_by_name(importer, &source, full_name)?;
			Ok(TypeRef::Definition(clone))
		}
	}
}
