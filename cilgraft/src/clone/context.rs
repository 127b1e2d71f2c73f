use crate::model::members::MethodDefinition;

/// Configuration read by every stage of the cloner.
pub struct ImporterOptions {
	/// Downgrade every cloned top-level type's visibility to not-public.
	pub hide_imported_types: bool,
	/// Rewrites a cloned top-level type's namespace; nested types inherit
	/// their declaring type's (already-decorated) namespace untouched.
	pub namespace_decorator: Option<Box<dyn Fn(&str) -> String>>,
}

impl Default for ImporterOptions {
	fn default() -> Self {
		Self { hide_imported_types: false, namespace_decorator: None }
	}
}

impl ImporterOptions {
	pub fn decorate_namespace(&self, namespace: &str) -> String {
		match &self.namespace_decorator {
			Some(decorator) => decorator(namespace),
			None => namespace.to_string(),
		}
	}
}

/// The method currently being cloned, threaded explicitly through the
/// recursive Signature Rewriter calls so a method-owned generic parameter
/// can be resolved against it"); `None` while cloning anything outside a method body,
/// which surfaces as [`crate::error::CloneError::MissingContext`].
pub type MethodContext<'l> = Option<&'l MethodDefinition<'l>>;
