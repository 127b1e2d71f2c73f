use std::cell::RefCell;
use std::fmt::Debug;
use std::path::PathBuf;

use fxhash::{FxHashMap, FxHashSet};

/// Policy object deciding which referenced assemblies are *mergeable* (their
/// types are cloned into the target) versus *external* (left as an imported
/// reference). The core only ever needs the *owning assembly's* path to
/// register it, so the trait is phrased in terms of the assembly full name
/// alone — the type reference itself never participates in the decision for
/// either concrete policy.
pub trait ModuleResolver: Debug {
	/// Returns the on-disk path of the module backing `assembly_full_name`
	/// iff that assembly is mergeable, or `None` if it's external.
	fn resolve(&self, assembly_full_name: &str) -> Option<PathBuf>;
}

/// Constructed with a fixed set of assembly full names; mergeable iff the
/// queried name is a member of that set.
#[derive(Debug)]
pub struct AssemblyListResolver {
	assemblies: FxHashMap<String, PathBuf>,
}

impl AssemblyListResolver {
	pub fn new(assemblies: impl IntoIterator<Item = (String, PathBuf)>) -> Self {
		Self { assemblies: assemblies.into_iter().collect() }
	}
}

impl ModuleResolver for AssemblyListResolver {
	fn resolve(&self, assembly_full_name: &str) -> Option<PathBuf> {
		self.assemblies.get(assembly_full_name).cloned()
	}
}

/// Mergeable iff the assembly's file lives under `directory` — the
/// "copy-local reference" case. Negative decisions are
/// cached per assembly so a repeatedly-referenced framework assembly isn't
/// re-probed on every query.
#[derive(Debug)]
pub struct LocalReferenceResolver {
	directory: PathBuf,
	negative_cache: RefCell<FxHashSet<String>>,
}

impl LocalReferenceResolver {
	pub fn new(directory: impl Into<PathBuf>) -> Self {
		Self { directory: directory.into(), negative_cache: RefCell::new(Default::default()) }
	}

	fn candidate_path(&self, assembly_full_name: &str) -> PathBuf {
		let short_name = assembly_full_name.split(',').next().unwrap_or(assembly_full_name).trim();
		self.directory.join(short_name).with_extension("dll")
	}
}

impl ModuleResolver for LocalReferenceResolver {
	fn resolve(&self, assembly_full_name: &str) -> Option<PathBuf> {
		if self.negative_cache.borrow().contains(assembly_full_name) {
			return None;
		}

		let path = self.candidate_path(assembly_full_name);
		if path.is_file() {
			return Some(path);
		}

		self.negative_cache.borrow_mut().insert(assembly_full_name.to_string());
		None
	}
}
