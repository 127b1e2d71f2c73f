//! End-to-end coverage driven entirely through `source::fake`, exercising the
//! importer's public surface the way a real embedder would: build a fixture,
//! import something, inspect what landed in the target module.

use std::path::PathBuf;
use std::rc::Rc;

use cilgraft::descriptor::ParameterTypeToken;
use cilgraft::importer::ImportedMember;
use cilgraft::model::attributes::{EventAttributes, MethodAttributes, MethodImplAttributes, TypeAttributes};
use cilgraft::model::il::OpCode;
use cilgraft::model::method_ref::MethodRef;
use cilgraft::model::source::{
	SourceEventInfo, SourceExceptionHandler, SourceExceptionHandlerKind, SourceFieldInfo, SourceMethodInfo,
	SourceMethodRef, SourceOperand, SourceTypeRef,
};
use cilgraft::model::type_ref::TypeRef;
use cilgraft::resolver::ModuleResolver;
use cilgraft::source::fake::{FakeBodyBuilder, FakeModuleBuilder};
use cilgraft::{CloneError, Importer, ImporterOptions, MemberDescriptor};

/// Never resolves anything to a path — every referenced assembly is external
/// unless it's explicitly registered on the importer, the same posture a
/// caller with no local reference directory would take.
#[derive(Debug)]
struct NoResolver;

impl ModuleResolver for NoResolver {
	fn resolve(&self, _assembly_full_name: &str) -> Option<PathBuf> {
		None
	}
}

fn void_ref(assembly: &str) -> SourceTypeRef {
	SourceTypeRef::Reference { assembly_full_name: assembly.to_string(), full_name: "System.Void".to_string() }
}

#[test]
fn imports_a_class_with_an_event_and_a_try_catch_finally_constructor() {
	let assembly = "Zoo.Lib, Version=1.0.0.0";
	let mut builder = FakeModuleBuilder::new(assembly);

	let tag = builder.add_type("Tag", "Zoo", TypeAttributes::PUBLIC);
	builder.add_field(SourceFieldInfo {
		name: "Value".to_string(),
		attributes: Default::default(),
		declaring_type: tag,
		field_type: SourceTypeRef::Reference { assembly_full_name: "System.Private.CoreLib".to_string(), full_name: "System.String".to_string() },
		initial_value: None,
		offset: None,
		constant: None,
		marshal: None,
		custom_attributes: Vec::new(),
	});

	let animal = builder.add_type("Animal", "Zoo", TypeAttributes::PUBLIC);
	builder.add_field(SourceFieldInfo {
		name: "Tag".to_string(),
		attributes: Default::default(),
		declaring_type: animal,
		field_type: SourceTypeRef::Definition(tag),
		initial_value: None,
		offset: None,
		constant: None,
		marshal: None,
		custom_attributes: Vec::new(),
	});

	let mut ctor_body = FakeBodyBuilder::new(2, true);
	ctor_body.push(OpCode::NOP, SourceOperand::None);
	ctor_body.push(OpCode::LEAVE_S, SourceOperand::Branch(6));
	ctor_body.push(OpCode::POP, SourceOperand::None);
	ctor_body.push(OpCode::LEAVE_S, SourceOperand::Branch(6));
	ctor_body.push(OpCode::NOP, SourceOperand::None);
	ctor_body.push(OpCode::ENDFINALLY, SourceOperand::None);
	ctor_body.push(OpCode::RET, SourceOperand::None);
	ctor_body.add_exception_handler(SourceExceptionHandler {
		kind: SourceExceptionHandlerKind::Catch,
		try_start: 0,
		try_end: 2,
		handler_start: 2,
		handler_end: 4,
		filter_start: None,
		catch_type: Some(SourceTypeRef::Reference { assembly_full_name: "System.Private.CoreLib".to_string(), full_name: "System.Exception".to_string() }),
	});
	ctor_body.add_exception_handler(SourceExceptionHandler {
		kind: SourceExceptionHandlerKind::Finally,
		try_start: 0,
		try_end: 4,
		handler_start: 4,
		handler_end: 6,
		filter_start: None,
		catch_type: None,
	});

	builder.add_method(SourceMethodInfo {
		name: ".ctor".to_string(),
		attributes: MethodAttributes::PUBLIC | MethodAttributes::SPECIAL_NAME | MethodAttributes::RT_SPECIAL_NAME,
		impl_attributes: MethodImplAttributes::IL,
		declaring_type: animal,
		generic_parameters: Vec::new(),
		parameters: Vec::new(),
		return_type: void_ref(assembly),
		overrides: Vec::new(),
		pinvoke: None,
		body: Some(ctor_body.build()),
		custom_attributes: Vec::new(),
	});

	let add_roar = builder.add_method(SourceMethodInfo {
		name: "add_Roar".to_string(),
		attributes: MethodAttributes::PUBLIC | MethodAttributes::SPECIAL_NAME,
		impl_attributes: MethodImplAttributes::IL,
		declaring_type: animal,
		generic_parameters: Vec::new(),
		parameters: Vec::new(),
		return_type: void_ref(assembly),
		overrides: Vec::new(),
		pinvoke: None,
		body: None,
		custom_attributes: Vec::new(),
	});
	let remove_roar = builder.add_method(SourceMethodInfo {
		name: "remove_Roar".to_string(),
		attributes: MethodAttributes::PUBLIC | MethodAttributes::SPECIAL_NAME,
		impl_attributes: MethodImplAttributes::IL,
		declaring_type: animal,
		generic_parameters: Vec::new(),
		parameters: Vec::new(),
		return_type: void_ref(assembly),
		overrides: Vec::new(),
		pinvoke: None,
		body: None,
		custom_attributes: Vec::new(),
	});
	builder.add_event(
		animal,
		SourceEventInfo {
			name: "Roar".to_string(),
			attributes: EventAttributes::SPECIAL_NAME,
			event_type: SourceTypeRef::Reference { assembly_full_name: "System.Private.CoreLib".to_string(), full_name: "System.EventHandler".to_string() },
			add: Some(add_roar),
			remove: Some(remove_roar),
			raise: None,
			custom_attributes: Vec::new(),
		},
	);

	let module = builder.build();
	let mut importer = Importer::new("Target.Asm, Version=1.0.0.0", Box::new(NoResolver));
	importer.register_module(Rc::new(module));

	let cloned = importer.import_type(assembly, "Zoo.Animal").expect("Animal imports cleanly");
	assert_eq!(cloned.full_name(), "Zoo.Animal");

	let methods = cloned.methods.borrow();
	let ctor = methods.iter().find(|m| m.name == ".ctor").expect("constructor was cloned");
	let body = ctor.body.get().expect("constructor has a body");
	let handlers = body.exception_handlers.borrow();
	assert_eq!(handlers.len(), 2);
	assert_eq!(handlers[0].kind, cilgraft::model::il::ExceptionHandlerKind::Catch);
	assert_eq!(handlers[1].kind, cilgraft::model::il::ExceptionHandlerKind::Finally);

	let fields = cloned.fields.borrow();
	let tag_field = fields.iter().find(|f| f.name == "Tag").expect("Tag field was cloned");
	match tag_field.field_type.get() {
		TypeRef::Definition(ty) => assert_eq!(ty.full_name(), "Zoo.Tag"),
		other => panic!("expected Tag field to reference a cloned definition, got {other:?}"),
	}

	let events = cloned.events.borrow();
	let roar = events.iter().find(|e| e.name == "Roar").expect("Roar event was cloned");
	let add = roar.add.get().expect("add accessor present");
	assert_eq!(add.name, "add_Roar");
	let remove = roar.remove.get().expect("remove accessor present");
	assert_eq!(remove.name, "remove_Roar");
}

#[test]
fn resolves_overloaded_constructor_by_descriptor() {
	let assembly = "Gen.Lib, Version=1.0.0.0";
	let mut builder = FakeModuleBuilder::new(assembly);

	let box_type = builder.add_type("Box", "Gen", TypeAttributes::PUBLIC);
	builder.add_generic_parameter(box_type, cilgraft::model::source::SourceGenericParameter { name: "T".to_string(), index: 0, attributes: 0, constraints: Vec::new() });

	builder.add_method(SourceMethodInfo {
		name: ".ctor".to_string(),
		attributes: MethodAttributes::PUBLIC | MethodAttributes::SPECIAL_NAME | MethodAttributes::RT_SPECIAL_NAME,
		impl_attributes: MethodImplAttributes::IL,
		declaring_type: box_type,
		generic_parameters: Vec::new(),
		parameters: Vec::new(),
		return_type: void_ref(assembly),
		overrides: Vec::new(),
		pinvoke: None,
		body: None,
		custom_attributes: Vec::new(),
	});

	builder.add_method(SourceMethodInfo {
		name: ".ctor".to_string(),
		attributes: MethodAttributes::PUBLIC | MethodAttributes::SPECIAL_NAME | MethodAttributes::RT_SPECIAL_NAME,
		impl_attributes: MethodImplAttributes::IL,
		declaring_type: box_type,
		generic_parameters: Vec::new(),
		parameters: vec![cilgraft::model::source::SourceParameter {
			name: "value".to_string(),
			sequence: 1,
			attributes: Default::default(),
			parameter_type: SourceTypeRef::Reference { assembly_full_name: "System.Private.CoreLib".to_string(), full_name: "System.Int32".to_string() },
			marshal: None,
			custom_attributes: Vec::new(),
		}],
		return_type: void_ref(assembly),
		overrides: Vec::new(),
		pinvoke: None,
		body: None,
		custom_attributes: Vec::new(),
	});

	let module = builder.build();
	let mut importer = Importer::new("Target.Asm, Version=1.0.0.0", Box::new(NoResolver));
	importer.register_module(Rc::new(module));

	let nullary = MemberDescriptor::constructor("Gen.Box", Vec::new());
	let imported = importer.import_member(assembly, &nullary).expect("nullary constructor resolves");
	match imported {
		ImportedMember::Method(m) => assert!(m.parameters.borrow().is_empty()),
		_ => panic!("expected a method"),
	}

	let with_value = MemberDescriptor::constructor("Gen.Box", vec![ParameterTypeToken::Concrete("System.Int32".to_string())]);
	let imported = importer.import_member(assembly, &with_value).expect("unary constructor resolves");
	match imported {
		ImportedMember::Method(m) => {
			let parameters = m.parameters.borrow();
			assert_eq!(parameters.len(), 1);
			assert_eq!(parameters[0].name, "value");
		}
		_ => panic!("expected a method"),
	}
}

#[test]
fn rejects_descriptors_that_name_the_wrong_kind_or_nothing_at_all() {
	let assembly = "Widget.Lib, Version=1.0.0.0";
	let mut builder = FakeModuleBuilder::new(assembly);
	let widget = builder.add_type("Widget", "Ns", TypeAttributes::PUBLIC);
	builder.add_field(SourceFieldInfo {
		name: "Value".to_string(),
		attributes: Default::default(),
		declaring_type: widget,
		field_type: void_ref(assembly),
		initial_value: None,
		offset: None,
		constant: None,
		marshal: None,
		custom_attributes: Vec::new(),
	});

	let module = builder.build();
	let mut importer = Importer::new("Target.Asm, Version=1.0.0.0", Box::new(NoResolver));
	importer.register_module(Rc::new(module));

	let wrong_kind = MemberDescriptor::method("Ns.Widget", "Value", Vec::new());
	let result = importer.import_member(assembly, &wrong_kind);
	assert!(matches!(result, Err(CloneError::InvalidDescriptor { .. })), "expected InvalidDescriptor, got {result:?}");

	let missing = MemberDescriptor::method("Ns.Widget", "DoesNotExist", Vec::new());
	let result = importer.import_member(assembly, &missing);
	assert!(matches!(result, Err(CloneError::MemberNotFound { .. })), "expected MemberNotFound, got {result:?}");
}

#[test]
fn merge_absorbs_a_registered_assembly_and_rewrites_existing_references() {
	let foo_assembly = "A.Lib, Version=1.0.0.0";
	let bar_assembly = "B.Lib, Version=1.0.0.0";

	let mut foo_builder = FakeModuleBuilder::new(foo_assembly);
	let foo = foo_builder.add_type("Foo", "A", TypeAttributes::PUBLIC);
	foo_builder.add_field(SourceFieldInfo {
		name: "Bar".to_string(),
		attributes: Default::default(),
		declaring_type: foo,
		field_type: SourceTypeRef::Reference { assembly_full_name: bar_assembly.to_string(), full_name: "B.Bar".to_string() },
		initial_value: None,
		offset: None,
		constant: None,
		marshal: None,
		custom_attributes: Vec::new(),
	});
	let foo_module = foo_builder.build();

	let mut importer = Importer::new("Target.Asm, Version=1.0.0.0", Box::new(NoResolver));
	importer.register_module(Rc::new(foo_module));

	let cloned_foo = importer.import_type(foo_assembly, "A.Foo").expect("Foo imports cleanly");
	let fields = cloned_foo.fields.borrow();
	let bar_field = fields.iter().find(|f| f.name == "Bar").expect("Bar field was cloned");
	assert!(matches!(bar_field.field_type.get(), TypeRef::Reference(_)), "B.Bar should still be external before B is registered");
	drop(fields);

	let mut bar_builder = FakeModuleBuilder::new(bar_assembly);
	bar_builder.add_type("Bar", "B", TypeAttributes::PUBLIC);
	let bar_module = bar_builder.build();
	importer.register_module(Rc::new(bar_module));

	importer.merge().expect("merge succeeds");

	let fields = cloned_foo.fields.borrow();
	let bar_field = fields.iter().find(|f| f.name == "Bar").expect("Bar field still present");
	match bar_field.field_type.get() {
		TypeRef::Definition(ty) => assert_eq!(ty.full_name(), "B.Bar"),
		other => panic!("expected Bar field to have been absorbed into a definition, got {other:?}"),
	}
}

#[test]
fn namespace_decoration_and_hidden_visibility_apply_to_imported_top_level_types() {
	let assembly = "Orig.Lib, Version=1.0.0.0";
	let mut builder = FakeModuleBuilder::new(assembly);
	builder.add_type("Widget", "Orig.Ns", TypeAttributes::PUBLIC);
	let module = builder.build();

	let mut importer = Importer::new("Target.Asm, Version=1.0.0.0", Box::new(NoResolver));
	importer.register_module(Rc::new(module));
	importer.configure(ImporterOptions {
		hide_imported_types: true,
		namespace_decorator: Some(Box::new(|ns: &str| format!("Decorated.{ns}"))),
	});

	let cloned = importer.import_type(assembly, "Orig.Ns.Widget").expect("Widget imports cleanly");
	assert_eq!(cloned.namespace(), "Decorated.Orig.Ns");
	assert!(!cloned.attributes.get().contains(TypeAttributes::PUBLIC), "visibility should have been downgraded");
}

#[test]
fn a_method_that_calls_itself_clones_without_infinite_recursion() {
	let assembly = "Cyc.Lib, Version=1.0.0.0";
	let mut builder = FakeModuleBuilder::new(assembly);
	let rec = builder.add_type("Rec", "Cyc", TypeAttributes::PUBLIC);

	let mut body = FakeBodyBuilder::new(1, true);
	// The method being defined is the very next (and, in this fixture, only)
	// method handle this builder will hand out.
	let self_handle = cilgraft::model::source::SourceMethodHandle(0);
	body.push(OpCode::CALL, SourceOperand::Method(SourceMethodRef::Definition(self_handle)));
	body.push(OpCode::RET, SourceOperand::None);

	builder.add_method(SourceMethodInfo {
		name: "DoIt".to_string(),
		attributes: MethodAttributes::PUBLIC | MethodAttributes::STATIC,
		impl_attributes: MethodImplAttributes::IL,
		declaring_type: rec,
		generic_parameters: Vec::new(),
		parameters: Vec::new(),
		return_type: void_ref(assembly),
		overrides: Vec::new(),
		pinvoke: None,
		body: Some(body.build()),
		custom_attributes: Vec::new(),
	});

	let module = builder.build();
	let mut importer = Importer::new("Target.Asm, Version=1.0.0.0", Box::new(NoResolver));
	importer.register_module(Rc::new(module));

	let cloned = importer.import_type(assembly, "Cyc.Rec").expect("Rec imports without looping");
	let methods = cloned.methods.borrow();
	let do_it = methods.iter().find(|m| m.name == "DoIt").expect("DoIt was cloned");
	let method_body = do_it.body.get().expect("DoIt has a body");
	let instructions = method_body.instructions.borrow();
	let call = instructions[0];
	let operand = call.operand.replace(cilgraft::model::il::Operand::None);
	match operand {
		cilgraft::model::il::Operand::Method(MethodRef::Definition(target)) => {
			assert!(std::ptr::eq(target, *do_it), "self-call should resolve to the same method shell, not a duplicate clone");
		}
		other => panic!("expected a self-referential Method operand, got {other:?}"),
	}
}
