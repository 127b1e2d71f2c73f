use std::fmt::{Display, Formatter};

/// The taxonomy of failures this crate can surface, plus the I/O-adjacent
/// wrapping a real metadata library forces on callers. Every top-level entry
/// point (`Importer::import_*`, `Importer::merge`) surfaces one of these
/// synchronously and aborts; the target module must not be written out
/// afterwards.
#[derive(Debug)]
pub enum CloneError {
	/// A source module was requested but could not be opened.
	ResolutionFailed { assembly: String, reason: String },
	/// A descriptor named a member that does not exist, or whose signature
	/// does not match any candidate on its declaring type.
	MemberNotFound { declaring_type: String, name: String },
	/// A descriptor pointed at the wrong member kind.
	InvalidDescriptor { expected: &'static str, name: String },
	/// A method-owned generic parameter was hit while rewriting a signature
	/// with no method context available.
	MissingContext,
	/// A plain type reference resolved to neither a clonable definition nor a
	/// classifiable external reference.
	UnresolvableReference { assembly: String, full_name: String },
	Io(std::io::Error),
	#[cfg(feature = "dotscope")]
	Dotscope(dotscope::Error),
}

impl Display for CloneError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			CloneError::ResolutionFailed { assembly, reason } => {
				write!(f, "failed to resolve source module for assembly `{assembly}`: {reason}")
			}
			CloneError::MemberNotFound { declaring_type, name } => {
				write!(f, "member `{name}` not found on `{declaring_type}`")
			}
			CloneError::InvalidDescriptor { expected, name } => {
				write!(f, "descriptor for `{name}` did not identify a {expected}")
			}
			CloneError::MissingContext => {
				write!(f, "method-owned generic parameter encountered without a method context")
			}
			CloneError::UnresolvableReference { assembly, full_name } => {
				write!(f, "could not resolve `{full_name}` in assembly `{assembly}` to a definition or an external reference")
			}
			CloneError::Io(err) => write!(f, "I/O error: {err}"),
			#[cfg(feature = "dotscope")]
			CloneError::Dotscope(err) => write!(f, "dotscope error: {err}"),
		}
	}
}

impl std::error::Error for CloneError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			CloneError::Io(err) => Some(err),
			#[cfg(feature = "dotscope")]
			CloneError::Dotscope(err) => Some(err),
			_ => None,
		}
	}
}

impl From<std::io::Error> for CloneError {
	fn from(value: std::io::Error) -> Self {
		Self::Io(value)
	}
}

#[cfg(feature = "dotscope")]
impl From<dotscope::Error> for CloneError {
	fn from(value: dotscope::Error) -> Self {
		Self::Dotscope(value)
	}
}

pub type Result<T> = std::result::Result<T, CloneError>;
