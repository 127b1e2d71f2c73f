use std::cell::RefCell;
use std::fmt::{Debug, Formatter};

/// Identity by arena address, not by structural equality — the same trick the
/// teacher crate uses for its `structured` entities: two clones of distinct
/// source types are never equal even if their fields happen to match, and a
/// clone is always equal to itself once inserted into the clone maps.
macro_rules! impl_pointer_identity {
	($ty: ident) => {
		impl Eq for $ty<'_> {}

		impl PartialEq<Self> for $ty<'_> {
			#[inline]
			fn eq(&self, other: &Self) -> bool {
				std::ptr::eq(self, other)
			}
		}

		impl std::hash::Hash for $ty<'_> {
			fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
				(self as *const Self).hash(state)
			}
		}
	};
}

pub(crate) use impl_pointer_identity;

pub(crate) fn fmt_hex_slice(bytes: &&[u8], f: &mut Formatter<'_>) -> std::fmt::Result {
	write!(f, "[")?;
	for (i, byte) in bytes.iter().enumerate() {
		if i > 0 {
			write!(f, " ")?;
		}
		write!(f, "{byte:02X}")?;
	}
	write!(f, "]")
}

pub(crate) fn fmt_debug_cell_vec<T: Debug>(cell: &RefCell<Vec<T>>, f: &mut Formatter<'_>) -> std::fmt::Result {
	Debug::fmt(&*cell.borrow(), f)
}
