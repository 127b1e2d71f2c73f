use std::rc::Rc;

use crate::clone::signature::rewrite_type_ref;
use crate::error::{CloneError, Result};
use crate::importer::Importer;
use crate::model::members::GenericParameter;
use crate::model::source::{SourceModule, SourceTypeHandle, SourceTypeInfo};
use crate::model::target::TypeDefinition;

/// Reconstructs a source type's fully-qualified name by walking its
/// declaring-type chain, so the clone map can be keyed on it before any
/// cloning happens.
fn source_full_name(source: &Rc<dyn SourceModule>, handle: SourceTypeHandle) -> String {
	let info = source.type_info(handle);
	match info.declaring_type {
		Some(parent) => format!("{}+{}", source_full_name(source, parent), info.name),
		None => info.full_name(None),
	}
}

/// Looks a type up by its fully-qualified name within `source`, cloning it on
/// first encounter. Used both by `Importer::import_type` and by the
/// Signature Rewriter's "plain reference" case.
pub(crate) fn clone_type_by_name<'l>(importer: &mut Importer<'l>, source: &Rc<dyn SourceModule>, full_name: &str) -> Result<&'l TypeDefinition<'l>> {
	let assembly = source.assembly_full_name().to_string();
	if let Some(existing) = importer.clone_maps().get_type(&assembly, full_name) {
		return Ok(existing);
	}

	let handle = source.find_type_by_full_name(full_name).ok_or_else(|| CloneError::UnresolvableReference {
		assembly: assembly.clone(),
		full_name: full_name.to_string(),
	})?;

	clone_type(importer, source, handle)
}

/// `clone_type(sourceType) -> clonedType`. Caller is
/// responsible for having already established that `handle`'s assembly is
/// mergeable (the Signature Rewriter does this before ever reaching here).
pub(crate) fn clone_type<'l>(importer: &mut Importer<'l>, source: &Rc<dyn SourceModule>, handle: SourceTypeHandle) -> Result<&'l TypeDefinition<'l>> {
	let assembly = source.assembly_full_name().to_string();
	let full_name = source_full_name(source, handle);

	// Step 2: already cloned.
	if let Some(existing) = importer.clone_maps().get_type(&assembly, &full_name) {
		return Ok(existing);
	}

	let info: SourceTypeInfo = source.type_info(handle);
	let is_top_level = info.declaring_type.is_none();

	// Step 3: shell, namespace decorated iff top-level, inserted immediately.
	let namespace = match is_top_level {
		true => importer.options().decorate_namespace(&info.namespace),
		false => info.namespace.clone(),
	};

	let bump = importer.bump();
	let shell: &'l TypeDefinition<'l> = bump.alloc(TypeDefinition {
		name: bump.alloc_str(&info.name),
		namespace: std::cell::Cell::new(bump.alloc_str(&namespace)),
		attributes: std::cell::Cell::new(info.attributes),
		declaring_type: std::cell::Cell::new(None),
		base_type: std::cell::Cell::new(None),
		interfaces: Default::default(),
		generic_parameters: Default::default(),
		nested_types: Default::default(),
		fields: Default::default(),
		methods: Default::default(),
		properties: Default::default(),
		events: Default::default(),
		custom_attributes: Default::default(),
	});
	importer.clone_maps_mut().insert_type(&assembly, full_name, shell);

	// Step 4: declaring type, nested case.
	if let Some(parent_handle) = info.declaring_type {
		let parent = clone_type(importer, source, parent_handle)?;
		shell.declaring_type.set(Some(parent));
		parent.nested_types.borrow_mut().push(shell);
	}

	// Step 5: interfaces.
	for interface in &info.interfaces {
		let rewritten = rewrite_type_ref(importer, &assembly, interface, Some(shell), None)?;
		shell.interfaces.borrow_mut().push(rewritten);
	}

	// Step 6: generic parameters, constraints rewritten with `shell` as owner.
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
			let rewritten = rewrite_type_ref(importer, &assembly, constraint, Some(shell), None)?;
			gp.constraints.borrow_mut().push(rewritten);
		}
	}

	// Step 7: custom attributes.
	let attributes = crate::clone::attributes::clone_custom_attributes(importer, &assembly, &info.custom_attributes, Some(shell), None)?;
	*shell.custom_attributes.borrow_mut() = attributes;

	// Step 8: base type.
	if let Some(base_type) = &info.base_type {
		let rewritten = rewrite_type_ref(importer, &assembly, base_type, Some(shell), None)?;
		shell.base_type.set(Some(rewritten));
	}

	// Step 9: attach to target (top-level only), downgrade visibility if configured.
	if is_top_level {
		if importer.options().hide_imported_types {
			shell.attributes.set(shell.attributes.get().hide_top_level());
		}
		importer.target().add_top_level_type(shell);
	}

	// Step 10: members, in fixed order.
	for field_handle in &info.fields {
		crate::clone::member_cloner::clone_field(importer, source, *field_handle, shell)?;
	}
	for method_handle in &info.methods {
		crate::clone::member_cloner::clone_method(importer, source, *method_handle, shell)?;
	}
	for property_handle in &info.properties {
		crate::clone::member_cloner::clone_property(importer, source, *property_handle, shell)?;
	}
	for event_handle in &info.events {
		crate::clone::member_cloner::clone_event(importer, source, *event_handle, shell)?;
	}

	Ok(shell)
}
