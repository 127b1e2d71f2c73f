use bitflags::bitflags;

bitflags! {
	/// Mirrors ECMA-335 `TypeAttributes`. Only the bits the cloner reasons about
	/// (visibility, class/interface, nested-ness) are given names; the rest round-trip
	/// opaquely because the cloner never inspects them.
	#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct TypeAttributes: u32 {
		const PUBLIC = 0x0000_0001;
		const NOT_PUBLIC = 0x0000_0000;
		const NESTED_PUBLIC = 0x0000_0002;
		const NESTED_PRIVATE = 0x0000_0003;
		const NESTED_FAMILY = 0x0000_0004;
		const NESTED_ASSEMBLY = 0x0000_0005;
		const NESTED_FAM_AND_ASSEM = 0x0000_0006;
		const NESTED_FAM_OR_ASSEM = 0x0000_0007;
		const VISIBILITY_MASK = 0x0000_0007;
		const INTERFACE = 0x0000_0020;
		const ABSTRACT = 0x0000_0080;
		const SEALED = 0x0000_0100;
	}
}

impl TypeAttributes {
	/// Downgrades a top-level visibility to `NotPublic`, leaving nested visibilities alone.
	/// Used by `HideImportedTypes`; spec preserves the source's unconditional application.
	pub fn hide_top_level(self) -> Self {
		let mut flags = self - Self::VISIBILITY_MASK;
		flags |= Self::NOT_PUBLIC;
		flags
	}
}

bitflags! {
	#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct MethodAttributes: u32 {
		const PRIVATE = 0x0001;
		const FAM_AND_ASSEM = 0x0002;
		const ASSEM = 0x0003;
		const FAMILY = 0x0004;
		const FAM_OR_ASSEM = 0x0005;
		const PUBLIC = 0x0006;
		const STATIC = 0x0010;
		const FINAL = 0x0020;
		const VIRTUAL = 0x0040;
		const HIDE_BY_SIG = 0x0080;
		const NEW_SLOT = 0x0100;
		const ABSTRACT = 0x0400;
		const SPECIAL_NAME = 0x0800;
		const PINVOKE_IMPL = 0x2000;
		const RT_SPECIAL_NAME = 0x1000;
	}
}

bitflags! {
	#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct MethodImplAttributes: u32 {
		const IL = 0x0000;
		const NATIVE = 0x0001;
		const RUNTIME = 0x0003;
		const MANAGED = 0x0000;
		const UNMANAGED = 0x0004;
		const SYNCHRONIZED = 0x0020;
		const NO_INLINING = 0x0008;
		const AGGRESSIVE_INLINING = 0x0100;
	}
}

bitflags! {
	#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct FieldAttributes: u32 {
		const PRIVATE = 0x0001;
		const FAM_AND_ASSEM = 0x0002;
		const ASSEM = 0x0003;
		const FAMILY = 0x0004;
		const FAM_OR_ASSEM = 0x0005;
		const PUBLIC = 0x0006;
		const STATIC = 0x0010;
		const INIT_ONLY = 0x0020;
		const LITERAL = 0x0040;
		const NOT_SERIALIZED = 0x0080;
		const HAS_FIELD_RVA = 0x0100;
		const HAS_DEFAULT = 0x8000;
		const HAS_FIELD_MARSHAL = 0x1000;
	}
}

bitflags! {
	#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct ParameterAttributes: u32 {
		const IN = 0x0001;
		const OUT = 0x0002;
		const OPTIONAL = 0x0010;
		const HAS_DEFAULT = 0x1000;
		const HAS_FIELD_MARSHAL = 0x2000;
	}
}

bitflags! {
	#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct PropertyAttributes: u32 {
		const SPECIAL_NAME = 0x0200;
		const RT_SPECIAL_NAME = 0x0400;
		const HAS_DEFAULT = 0x1000;
	}
}

bitflags! {
	#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct EventAttributes: u32 {
		const SPECIAL_NAME = 0x0200;
		const RT_SPECIAL_NAME = 0x0400;
	}
}

bitflags! {
	#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct PInvokeAttributes: u32 {
		const NO_MANGLE = 0x0001;
		const CALL_CONV_WINAPI = 0x0100;
		const CALL_CONV_CDECL = 0x0200;
		const CALL_CONV_STDCALL = 0x0300;
		const CALL_CONV_THISCALL = 0x0400;
		const CALL_CONV_FASTCALL = 0x0500;
		const CHAR_SET_ANSI = 0x0002;
		const CHAR_SET_UNICODE = 0x0004;
		const CHAR_SET_AUTO = 0x0006;
		const SUPPORTS_LAST_ERROR = 0x0040;
	}
}
