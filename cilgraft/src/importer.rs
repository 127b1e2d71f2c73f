use std::cell::RefCell;
#[cfg(feature = "dotscope")]
use std::path::PathBuf;
use std::pin::Pin;
use std::rc::Rc;

use bumpalo::Bump;
use fxhash::FxHashMap;

pub use crate::clone::context::MethodContext;
pub use crate::clone::ImporterOptions;
use crate::clone_maps::CloneMaps;
use crate::descriptor::{MemberDescriptor, MemberKind};
use crate::error::{CloneError, Result};
use crate::model::members::{EventDefinition, FieldDefinition, MethodDefinition, PropertyDefinition};
use crate::model::source::SourceModule;
use crate::model::target::TargetModule;
use crate::model::type_ref::ExternalTypeRef;
use crate::queue::DeferredActionQueue;
use crate::registry::SourceModuleRegistry;
use crate::resolver::ModuleResolver;

/// Top-level entry point of the crate. Owns the arena every
/// cloned entity is allocated into: the arena is pinned so its address never
/// moves, and `bump()` hands out a lifetime tied to `Importer` itself rather
/// than to any one call.
pub struct Importer<'l> {
	bump: Pin<Box<Bump>>,
	target: &'l TargetModule<'l>,
	clone_maps: CloneMaps<'l>,
	queue: DeferredActionQueue<'l, Importer<'l>>,
	registry: SourceModuleRegistry,
	resolver: Box<dyn ModuleResolver>,
	options: ImporterOptions,
	external_refs: RefCell<FxHashMap<(String, String), ExternalTypeRef<'l>>>,
}

impl<'l> Importer<'l> {
	pub fn new(target_assembly_full_name: &str, resolver: Box<dyn ModuleResolver>) -> Self {
		let bump = Pin::new(Box::new(Bump::new()));
		let bump_ref: &'l Bump = unsafe { std::mem::transmute(&*bump) };
		let target = bump_ref.alloc(TargetModule::new(bump_ref.alloc_str(target_assembly_full_name)));

		Importer {
			bump,
			target,
			clone_maps: CloneMaps::new(),
			queue: DeferredActionQueue::new(),
			registry: SourceModuleRegistry::new(),
			resolver,
			options: ImporterOptions::default(),
			external_refs: RefCell::new(Default::default()),
		}
	}

	pub(crate) fn bump(&self) -> &'l Bump {
		unsafe { std::mem::transmute::<&Bump, &'l Bump>(&self.bump) }
	}

	pub fn target(&self) -> &'l TargetModule<'l> {
		self.target
	}

	pub fn configure(&mut self, options: ImporterOptions) {
		self.options = options;
	}

	/// Replaces the module resolver used for every subsequent
	/// `is_mergeable`/`source_module` lookup. Modules already registered
	/// through the old resolver stay registered; only future resolution
	/// decisions see the new policy.
	pub fn set_resolver(&mut self, resolver: Box<dyn ModuleResolver>) {
		self.resolver = resolver;
	}

	pub(crate) fn options(&self) -> &ImporterOptions {
		&self.options
	}

	pub(crate) fn clone_maps(&self) -> &CloneMaps<'l> {
		&self.clone_maps
	}

	pub(crate) fn clone_maps_mut(&mut self) -> &mut CloneMaps<'l> {
		&mut self.clone_maps
	}

	pub(crate) fn queue_mut(&mut self) -> &mut DeferredActionQueue<'l, Importer<'l>> {
		&mut self.queue
	}

	/// Whether `assembly_full_name` is mergeable: the resolver accepts it,
	/// it's already registered (a prior reference pulled it in), or it's the
	/// target module itself.
	pub(crate) fn is_mergeable(&self, assembly_full_name: &str) -> bool {
		assembly_full_name == self.target.assembly_full_name
			|| self.registry.is_registered(assembly_full_name)
			|| self.resolver.resolve(assembly_full_name).is_some()
	}

	#[cfg(feature = "dotscope")]
	pub(crate) fn source_module(&mut self, assembly_full_name: &str) -> Result<Rc<dyn SourceModule>> {
		if let Some(module) = self.registry.get(assembly_full_name) {
			return Ok(module.clone());
		}
		let path: Option<PathBuf> = self.resolver.resolve(assembly_full_name);
		self.registry.register_by_assembly(assembly_full_name, path.as_deref())
	}

	#[cfg(not(feature = "dotscope"))]
	pub(crate) fn source_module(&mut self, assembly_full_name: &str) -> Result<Rc<dyn SourceModule>> {
		self.registry.get(assembly_full_name).cloned().ok_or_else(|| CloneError::ResolutionFailed {
			assembly: assembly_full_name.to_string(),
			reason: "no reader module registered and the `dotscope` feature is disabled".to_string(),
		})
	}

	/// Registers an already-opened module directly — the path Merge and
	/// tests take when the caller has its own `SourceModule` in hand rather
	/// than a path the resolver can find.
	pub fn register_module(&mut self, module: Rc<dyn SourceModule>) {
		self.registry.register(module);
	}

	/// Reuses a previously imported external reference for the same
	/// `(assembly, full_name)` pair, or mints a fresh opaque handle.
	pub(crate) fn import_external(&self, assembly_full_name: &str, full_name: &str) -> ExternalTypeRef<'l> {
		let key = (assembly_full_name.to_string(), full_name.to_string());
		if let Some(existing) = self.external_refs.borrow().get(&key) {
			return *existing;
		}
		let bump = self.bump();
		let assembly = bump.alloc_str(assembly_full_name);
		let external = ExternalTypeRef::new(assembly, bump.alloc_str(full_name), bump.alloc(()));
		self.external_refs.borrow_mut().insert(key, external);
		self.target.register_assembly_reference(assembly);
		external
	}

	/// Drains the deferred-action queue to empty, as every top-level entry
	/// call must before returning. Popping the next action
	/// releases the borrow of `self.queue` before the action itself borrows
	/// `self` to run (and, typically, to schedule more work).
	pub(crate) fn drain_queue(&mut self) -> Result<()> {
		while let Some(action) = self.queue.pop_next() {
			action(self)?;
		}
		Ok(())
	}

	/// Import type: clones `full_name` from `assembly_full_name`
	/// (registering that source module on demand) into the target module.
	pub fn import_type(&mut self, assembly_full_name: &str, full_name: &str) -> Result<&'l crate::model::target::TypeDefinition<'l>> {
		let source = self.source_module(assembly_full_name)?;
		let cloned = crate::clone::type_cloner::clone_type_by_name(self, &source, full_name)?;
		self.drain_queue()?;
		Ok(cloned)
	}

	/// Import member by descriptor.
	pub fn import_member(&mut self, assembly_full_name: &str, descriptor: &MemberDescriptor) -> Result<ImportedMember<'l>> {
		let source = self.source_module(assembly_full_name)?;
		let member = crate::clone::member_cloner::clone_member_by_descriptor(self, &source, descriptor)?;
		self.drain_queue()?;
		Ok(member)
	}

	/// List imported types: source full name → cloned top-level type. Nested
	/// types are omitted — they're reached through their declaring type.
	pub fn imported_types(&self) -> Vec<(&str, &'l crate::model::target::TypeDefinition<'l>)> {
		self.clone_maps.iter_types().filter(|(_, ty)| !ty.is_nested()).collect()
	}

	/// List imported modules.
	pub fn imported_modules(&self) -> impl Iterator<Item = &Rc<dyn SourceModule>> {
		self.registry.list()
	}

	/// Merge: sweep every existing target entity through the
	/// Signature Rewriter, then drop assembly references absorbed by
	/// registration.
	pub fn merge(&mut self) -> Result<()> {
		crate::clone::merge::merge(self)?;
		self.drain_queue()
	}
}

/// The result of `Importer::import_member`, discriminated the same way the
/// descriptor that produced it was.
pub enum ImportedMember<'l> {
	Method(&'l MethodDefinition<'l>),
	Field(&'l FieldDefinition<'l>),
	Property(&'l PropertyDefinition<'l>),
	Event(&'l EventDefinition<'l>),
}

impl<'l> ImportedMember<'l> {
	pub fn kind(&self) -> MemberKind {
		match self {
			ImportedMember::Method(m) if m.name == ".ctor" => MemberKind::Constructor,
			ImportedMember::Method(_) => MemberKind::Method,
			ImportedMember::Field(_) => MemberKind::Field,
			ImportedMember::Property(_) => MemberKind::Property,
			ImportedMember::Event(_) => MemberKind::Event,
		}
	}
}
