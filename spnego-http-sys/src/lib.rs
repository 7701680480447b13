#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

include!(concat!(env!("OUT_DIR"), "/bindings.rs"));

// These are defined as macros with casts in gssapi.h, which bindgen
// skips. Values are fixed by RFC 2744.
pub const _GSS_C_INDEFINITE: OM_uint32 = 0xffff_ffff;
pub const _GSS_C_CALLING_ERROR_MASK: OM_uint32 = 0o377;
pub const _GSS_C_ROUTINE_ERROR_MASK: OM_uint32 = 0o377;
pub const _GSS_S_CONTINUE_NEEDED: OM_uint32 = 1 << GSS_C_SUPPLEMENTARY_OFFSET;
