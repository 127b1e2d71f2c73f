#[cfg(feature = "dotscope")]
use std::path::Path;
use std::rc::Rc;

use fxhash::FxHashMap;

use crate::error::{CloneError, Result};
use crate::model::source::SourceModule;

/// Keeps every source module opened during a session alive and addressable
/// by assembly full name. Modules, once registered, are never
/// closed or mutated by the core — only read.
#[derive(Default)]
pub struct SourceModuleRegistry {
	modules: FxHashMap<String, Rc<dyn SourceModule>>,
}

impl SourceModuleRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Idempotent on the module's assembly full name: re-registering an
	/// already-known assembly is a no-op that keeps the first instance.
	pub fn register(&mut self, module: Rc<dyn SourceModule>) {
		self.modules.entry(module.assembly_full_name().to_string()).or_insert(module);
	}

	/// Opens the module at `path` via the configured metadata reader and
	/// registers it under `assembly_full_name`, unless already registered.
	/// Fails with [`CloneError::ResolutionFailed`] if `path` is `None` — the
	/// caller (the resolver) could not locate the assembly on disk.
	#[cfg(feature = "dotscope")]
	pub fn register_by_assembly(&mut self, assembly_full_name: &str, path: Option<&Path>) -> Result<Rc<dyn SourceModule>> {
		if let Some(existing) = self.modules.get(assembly_full_name) {
			return Ok(existing.clone());
		}

		let Some(path) = path else {
			return Err(CloneError::ResolutionFailed {
				assembly: assembly_full_name.to_string(),
				reason: "no on-disk location could be determined for this assembly".to_string(),
			});
		};

		let module = crate::source::dotscope_module::DotscopeModule::open(path)?;
		let module: Rc<dyn SourceModule> = Rc::new(module);
		self.modules.insert(assembly_full_name.to_string(), module.clone());
		Ok(module)
	}

	pub fn get(&self, assembly_full_name: &str) -> Option<&Rc<dyn SourceModule>> {
		self.modules.get(assembly_full_name)
	}

	pub fn is_registered(&self, assembly_full_name: &str) -> bool {
		self.modules.contains_key(assembly_full_name)
	}

	pub fn list(&self) -> impl Iterator<Item = &Rc<dyn SourceModule>> {
		self.modules.values()
	}
}
