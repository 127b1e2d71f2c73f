use fxhash::FxHashMap;

use crate::model::members::{EventDefinition, FieldDefinition, MethodDefinition, PropertyDefinition};
use crate::model::source::{SourceEventHandle, SourceFieldHandle, SourceMethodHandle, SourcePropertyHandle};
use crate::model::target::TypeDefinition;

/// Keys every map by `(source assembly full name, source identity)`, so two
/// distinct source modules that happen to reuse a handle numbering scheme
/// (or a type full name) never collide.
pub type AssemblyScoped<K> = (String, K);

/// The clone maps: the single source of truth for "have we
/// already cloned this source entity, and if so, to what". Entries are only
/// ever inserted, never removed or overwritten — a type's shell goes in
/// before its body is populated, which is what breaks reference cycles.
#[derive(Default)]
pub struct CloneMaps<'l> {
	types: FxHashMap<AssemblyScoped<String>, &'l TypeDefinition<'l>>,
	methods: FxHashMap<AssemblyScoped<SourceMethodHandle>, &'l MethodDefinition<'l>>,
	fields: FxHashMap<AssemblyScoped<SourceFieldHandle>, &'l FieldDefinition<'l>>,
	properties: FxHashMap<AssemblyScoped<SourcePropertyHandle>, &'l PropertyDefinition<'l>>,
	events: FxHashMap<AssemblyScoped<SourceEventHandle>, &'l EventDefinition<'l>>,
}

impl<'l> CloneMaps<'l> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get_type(&self, assembly: &str, full_name: &str) -> Option<&'l TypeDefinition<'l>> {
		self.types.get(&(assembly.to_string(), full_name.to_string())).copied()
	}

	pub fn insert_type(&mut self, assembly: &str, full_name: String, clone: &'l TypeDefinition<'l>) {
		self.types.insert((assembly.to_string(), full_name), clone);
	}

	/// Every cloned type keyed by its source full name, in source-registration
	/// order undefined (hash map iteration).
	pub fn iter_types(&self) -> impl Iterator<Item = (&str, &'l TypeDefinition<'l>)> {
		self.types.iter().map(|((_, full_name), clone)| (full_name.as_str(), *clone))
	}

	pub fn get_method(&self, assembly: &str, handle: SourceMethodHandle) -> Option<&'l MethodDefinition<'l>> {
		self.methods.get(&(assembly.to_string(), handle)).copied()
	}

	pub fn insert_method(&mut self, assembly: &str, handle: SourceMethodHandle, clone: &'l MethodDefinition<'l>) {
		self.methods.insert((assembly.to_string(), handle), clone);
	}

	pub fn get_field(&self, assembly: &str, handle: SourceFieldHandle) -> Option<&'l FieldDefinition<'l>> {
		self.fields.get(&(assembly.to_string(), handle)).copied()
	}

	pub fn insert_field(&mut self, assembly: &str, handle: SourceFieldHandle, clone: &'l FieldDefinition<'l>) {
		self.fields.insert((assembly.to_string(), handle), clone);
	}

	pub fn get_property(&self, assembly: &str, handle: SourcePropertyHandle) -> Option<&'l PropertyDefinition<'l>> {
		self.properties.get(&(assembly.to_string(), handle)).copied()
	}

	pub fn insert_property(&mut self, assembly: &str, handle: SourcePropertyHandle, clone: &'l PropertyDefinition<'l>) {
		self.properties.insert((assembly.to_string(), handle), clone);
	}

	pub fn get_event(&self, assembly: &str, handle: SourceEventHandle) -> Option<&'l EventDefinition<'l>> {
		self.events.get(&(assembly.to_string(), handle)).copied()
	}

	pub fn insert_event(&mut self, assembly: &str, handle: SourceEventHandle, clone: &'l EventDefinition<'l>) {
		self.events.insert((assembly.to_string(), handle), clone);
	}
}
