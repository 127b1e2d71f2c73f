use fxhash::FxHashMap;

/// The kind of member a descriptor names: callers building
/// descriptors are a collaborator's concern, so this only captures the
/// extensional contract — declaring type, kind, name, and (for callable
/// members) ordered parameter types.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum MemberKind {
	Constructor,
	Method,
	Property,
	Field,
	Event,
}

/// A parameter-type slot in a descriptor: either a concrete type's full name,
/// or a named placeholder standing in for a generic parameter whose actual
/// type is only known from the candidate being matched against.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ParameterTypeToken {
	Concrete(String),
	GenericPlaceholder(String),
}

/// Identifies a single source member without requiring the caller to hold a
/// handle into that source module's own metadata tables.
#[derive(Clone, Debug)]
pub struct MemberDescriptor {
	pub declaring_type: String,
	pub kind: MemberKind,
	pub name: String,
	/// Only meaningful for [`MemberKind::Constructor`] and [`MemberKind::Method`].
	pub parameter_types: Vec<ParameterTypeToken>,
}

impl MemberDescriptor {
	pub fn method(declaring_type: impl Into<String>, name: impl Into<String>, parameter_types: Vec<ParameterTypeToken>) -> Self {
		Self { declaring_type: declaring_type.into(), kind: MemberKind::Method, name: name.into(), parameter_types }
	}

	pub fn constructor(declaring_type: impl Into<String>, parameter_types: Vec<ParameterTypeToken>) -> Self {
		Self { declaring_type: declaring_type.into(), kind: MemberKind::Constructor, name: ".ctor".to_string(), parameter_types }
	}

	pub fn field(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
		Self { declaring_type: declaring_type.into(), kind: MemberKind::Field, name: name.into(), parameter_types: Vec::new() }
	}

	pub fn property(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
		Self { declaring_type: declaring_type.into(), kind: MemberKind::Property, name: name.into(), parameter_types: Vec::new() }
	}

	pub fn event(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
		Self { declaring_type: declaring_type.into(), kind: MemberKind::Event, name: name.into(), parameter_types: Vec::new() }
	}

	/// Tests `candidate_parameter_types` (the full names of a candidate
	/// method's parameter types, in order) against this descriptor's
	/// parameter list: each [`ParameterTypeToken::Concrete`] slot must match
	/// exactly; each [`ParameterTypeToken::GenericPlaceholder`] binds to
	/// whatever full name appears at that position on first occurrence, and
	/// every later occurrence of the same placeholder name must agree with
	/// that binding.
	pub fn matches_parameters(&self, candidate_parameter_types: &[String]) -> bool {
		if self.parameter_types.len() != candidate_parameter_types.len() {
			return false;
		}

		let mut bindings: FxHashMap<&str, &str> = Default::default();
		for (token, candidate) in self.parameter_types.iter().zip(candidate_parameter_types) {
			match token {
				ParameterTypeToken::Concrete(full_name) => {
					if full_name != candidate {
						return false;
					}
				}
				ParameterTypeToken::GenericPlaceholder(placeholder) => match bindings.get(placeholder.as_str()) {
					Some(bound) if *bound != candidate => return false,
					Some(_) => {}
					None => {
						bindings.insert(placeholder.as_str(), candidate.as_str());
					}
				},
			}
		}

		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn concrete_parameters_must_match_exactly() {
		let descriptor = MemberDescriptor::method("N.C", "M", vec![ParameterTypeToken::Concrete("System.Int32".into())]);
		assert!(descriptor.matches_parameters(&["System.Int32".to_string()]));
		assert!(!descriptor.matches_parameters(&["System.String".to_string()]));
	}

	#[test]
	fn placeholder_binds_on_first_use_and_must_agree_later() {
		let descriptor = MemberDescriptor::method(
			"N.C",
			"M",
			vec![
				ParameterTypeToken::GenericPlaceholder("T".into()),
				ParameterTypeToken::GenericPlaceholder("T".into()),
			],
		);
		assert!(descriptor.matches_parameters(&["N.Foo".to_string(), "N.Foo".to_string()]));
		assert!(!descriptor.matches_parameters(&["N.Foo".to_string(), "N.Bar".to_string()]));
	}

	#[test]
	fn parameter_count_mismatch_fails_fast() {
		let descriptor = MemberDescriptor::method("N.C", "M", vec![ParameterTypeToken::Concrete("System.Int32".into())]);
		assert!(!descriptor.matches_parameters(&[]));
	}
}
