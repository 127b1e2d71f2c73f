use std::cell::Cell;
use std::rc::Rc;

use crate::clone::attributes::clone_method_ref;
use crate::clone::context::MethodContext;
use crate::clone::signature::rewrite_type_ref;
use crate::error::Result;
use crate::importer::Importer;
use crate::model::il::{DebugScope, ExceptionHandler, ExceptionHandlerKind, Instruction, Operand, SequencePoint};
use crate::model::members::{FieldReference, FieldRef, MethodDefinition};
use crate::model::source::{SourceExceptionHandlerKind, SourceFieldRef, SourceMethodHandle, SourceModule, SourceOperand};
use crate::model::target::TypeDefinition;
use crate::queue::Priority;

/// Instruction Cloner. Scheduled by the Member Cloner at
/// priority *Instructions*; by construction every type reachable through this
/// body's own signatures already has a shell (type cloning is synchronous),
/// so the one remaining cycle a body can hit is an operand naming the very
/// method being cloned — broken the same way every shell breaks cycles: the
/// method map already holds this method before its body is ever scheduled.
pub(crate) fn copy_instructions<'l>(
	importer: &mut Importer<'l>,
	source: &Rc<dyn SourceModule>,
	assembly_full_name: &str,
	method: &'l MethodDefinition<'l>,
	handle: SourceMethodHandle,
) -> Result<()> {
	let info = source.method_info(handle);
	let source_body = info.body.expect("copy_instructions is only ever scheduled when a body exists");
	let body = method.body.get().expect("the body shell is set before this action is scheduled");
	let declaring_type: Option<&'l TypeDefinition<'l>> = method.declaring_type.get();
	let method_context: MethodContext<'l> = Some(method);

	// Phase 1: create every instruction shell with a placeholder operand, in
	// source order, so branch/switch targets can be looked up by index before
	// any operand is actually resolved.
	let mut cloned: Vec<&'l Instruction<'l>> = Vec::with_capacity(source_body.instructions.len());
	for (index, instruction) in source_body.instructions.iter().enumerate() {
		let bump = importer.bump();
		let clone = bump.alloc(Instruction { index: index as u32, opcode: instruction.opcode, operand: Cell::new(Operand::None) });
		cloned.push(clone);
	}
	*body.instructions.borrow_mut() = cloned.clone();

	// Phase 2: dispatch each operand by its kind. Literal kinds
	// and type references are resolved immediately; method/field operands and
	// branch/switch targets are deferred at priority *Operands* so every body
	// scheduled at priority *Instructions* gets its instruction shells first,
	// even across methods.
	for (source_instruction, &clone) in source_body.instructions.iter().zip(cloned.iter()) {
		match &source_instruction.operand {
			SourceOperand::None => clone.operand.set(Operand::None),
			SourceOperand::Int32(v) => clone.operand.set(Operand::Int32(*v)),
			SourceOperand::Int64(v) => clone.operand.set(Operand::Int64(*v)),
			SourceOperand::Float32(v) => clone.operand.set(Operand::Float32(*v)),
			SourceOperand::Float64(v) => clone.operand.set(Operand::Float64(*v)),
			SourceOperand::String(s) => clone.operand.set(Operand::String(importer.bump().alloc_str(s))),
			SourceOperand::Variable(v) => clone.operand.set(Operand::Variable(*v)),
			SourceOperand::Argument(v) => clone.operand.set(Operand::Argument(*v)),

			SourceOperand::Type(type_ref) => {
				let rewritten = rewrite_type_ref(importer, assembly_full_name, type_ref, declaring_type, method_context)?;
				clone.operand.set(Operand::Type(rewritten));
			}

			SourceOperand::Method(method_ref) => {
				let method_ref = method_ref.clone();
				let assembly = assembly_full_name.to_string();
				importer.queue_mut().schedule(Priority::Operands, move |importer: &mut Importer<'l>| {
					let rewritten = clone_method_ref(importer, &assembly, &method_ref, declaring_type, method_context)?;
					clone.operand.set(Operand::Method(rewritten));
					Ok(())
				});
			}

			SourceOperand::Field(field_ref) => {
				let field_ref = field_ref.clone();
				let assembly = assembly_full_name.to_string();
				importer.queue_mut().schedule(Priority::Operands, move |importer: &mut Importer<'l>| {
					let rewritten = clone_field_ref(importer, &assembly, &field_ref, declaring_type, method_context)?;
					clone.operand.set(Operand::Field(rewritten));
					Ok(())
				});
			}

			SourceOperand::Branch(target) => {
				let targets = cloned.clone();
				let target = *target;
				importer.queue_mut().schedule(Priority::Operands, move |_: &mut Importer<'l>| {
					clone.operand.set(Operand::Branch(Cell::new(Some(targets[target as usize]))));
					Ok(())
				});
			}

			SourceOperand::Switch(targets) => {
				let all = cloned.clone();
				let targets = targets.clone();
				importer.queue_mut().schedule(Priority::Operands, move |importer: &mut Importer<'l>| {
					let resolved: Vec<&'l Instruction<'l>> = targets.iter().map(|t| all[*t as usize]).collect();
					let slice = importer.bump().alloc_slice_copy(&resolved);
					clone.operand.set(Operand::Switch(Cell::new(slice)));
					Ok(())
				});
			}
		}
	}

	// Exception handlers: remap try/handler/filter anchors by index into the
	// cloned instruction list (already fully populated above), rewrite the
	// catch type through the Signature Rewriter.
	let mut handlers = Vec::with_capacity(source_body.exception_handlers.len());
	for handler in &source_body.exception_handlers {
		let catch_type = match &handler.catch_type {
			Some(type_ref) => Some(rewrite_type_ref(importer, assembly_full_name, type_ref, declaring_type, method_context)?),
			None => None,
		};
		handlers.push(ExceptionHandler {
			kind: convert_handler_kind(handler.kind),
			try_start: handler.try_start,
			try_end: handler.try_end,
			handler_start: handler.handler_start,
			handler_end: handler.handler_end,
			filter_start: handler.filter_start,
			catch_type,
		});
	}
	*body.exception_handlers.borrow_mut() = handlers;

	// Debug scope: best-effort — absent whenever the source
	// module couldn't or didn't load symbols, in which case `debug_scope` is
	// simply `None` on the source body already.
	if let Some(source_scope) = &source_body.debug_scope {
		if let (Some(&first), Some(&last)) = (cloned.first(), cloned.last()) {
			let bump = importer.bump();
			let sequence_points = source_scope
				.sequence_points
				.iter()
				.map(|(index, sp)| {
					(
						*index,
						SequencePoint {
							document: bump.alloc_str(&sp.document),
							start_line: sp.start_line,
							start_column: sp.start_column,
							end_line: sp.end_line,
							end_column: sp.end_column,
						},
					)
				})
				.collect();
			let local_names = source_scope.local_names.iter().map(|(index, name)| (*index, &*bump.alloc_str(name))).collect();
			let scope = bump.alloc(DebugScope { start: first.index, end: last.index, sequence_points, local_names });
			body.debug_scope.set(Some(scope));
		}
	}

	Ok(())
}

fn convert_handler_kind(kind: SourceExceptionHandlerKind) -> ExceptionHandlerKind {
	match kind {
		SourceExceptionHandlerKind::Catch => ExceptionHandlerKind::Catch,
		SourceExceptionHandlerKind::Filter => ExceptionHandlerKind::Filter,
		SourceExceptionHandlerKind::Finally => ExceptionHandlerKind::Finally,
		SourceExceptionHandlerKind::Fault => ExceptionHandlerKind::Fault,
	}
}

/// Resolves a `SourceFieldRef` operand the same way `clone_method_ref`
/// resolves a method operand: a `Definition`
/// clones (or reuses) the field via its declaring type; a `Reference` builds a
/// fresh field reference with both halves rewritten.
fn clone_field_ref<'l>(
	importer: &mut Importer<'l>,
	assembly_full_name: &str,
	field_ref: &SourceFieldRef,
	owner_type: Option<&'l TypeDefinition<'l>>,
	method_context: MethodContext<'l>,
) -> Result<FieldRef<'l>> {
	match field_ref {
		SourceFieldRef::Definition(handle) => {
			let source = importer.source_module(assembly_full_name)?;
			let info = source.field_info(*handle);
			let declaring_type = crate::clone::type_cloner::clone_type(importer, &source, info.declaring_type)?;
			let field = crate::clone::member_cloner::clone_field(importer, &source, *handle, declaring_type)?;
			Ok(FieldRef::Definition(field))
		}

		SourceFieldRef::Reference { declaring_type, name, field_type } => {
			let declaring_type = rewrite_type_ref(importer, assembly_full_name, declaring_type, owner_type, method_context)?;
			let field_type = rewrite_type_ref(importer, assembly_full_name, field_type, owner_type, method_context)?;
			let bump = importer.bump();
			let reference = bump.alloc(FieldReference { declaring_type, name: bump.alloc_str(name), field_type });
			Ok(FieldRef::Reference(reference))
		}
	}
}
