/// Oids are BER encoded and defined in the various RFCs
use spnego_http_sys::gss_OID;
use std::{fmt, ops::Deref, slice};

pub static GSS_NT_USER_NAME: Oid = Oid::from_slice(b"\x2a\x86\x48\x86\xf7\x12\x01\x02\x01\x01");

pub static GSS_NT_HOSTBASED_SERVICE: Oid =
    Oid::from_slice(b"\x2a\x86\x48\x86\xf7\x12\x01\x02\x01\x04");

pub static GSS_NT_KRB5_PRINCIPAL: Oid =
    Oid::from_slice(b"\x2a\x86\x48\x86\xf7\x12\x01\x02\x02\x01");

pub static GSS_MECH_KRB5: Oid = Oid::from_slice(b"\x2a\x86\x48\x86\xf7\x12\x01\x02\x02");

// 1.3.6.1.5.5.2
pub static GSS_MECH_SPNEGO: Oid = Oid::from_slice(b"\x2b\x06\x01\x05\x05\x02");

// this mirrors gss_OID_desc, but with a const pointer, so the statics
// above can live in read only memory
#[repr(C)]
pub struct Oid {
    length: u32,
    elements: *const u8,
}

unsafe impl Sync for Oid {}

impl Deref for Oid {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        unsafe { slice::from_raw_parts(self.elements, self.length as usize) }
    }
}

impl PartialEq for Oid {
    fn eq(&self, other: &Oid) -> bool {
        **self == **other
    }
}

impl Eq for Oid {}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self == &GSS_NT_USER_NAME {
            "GSS_NT_USER_NAME"
        } else if self == &GSS_NT_HOSTBASED_SERVICE {
            "GSS_NT_HOSTBASED_SERVICE"
        } else if self == &GSS_NT_KRB5_PRINCIPAL {
            "GSS_NT_KRB5_PRINCIPAL"
        } else if self == &GSS_MECH_KRB5 {
            "GSS_MECH_KRB5"
        } else if self == &GSS_MECH_SPNEGO {
            "GSS_MECH_SPNEGO"
        } else {
            return write!(f, "Oid({:x?})", &**self);
        };
        f.write_str(name)
    }
}

impl Oid {
    // gssapi takes a mutable pointer but never writes through it
    pub(crate) fn to_c(&self) -> gss_OID {
        self as *const Oid as gss_OID
    }

    pub const fn from_slice(ber: &'static [u8]) -> Oid {
        Oid {
            length: ber.len() as u32,
            elements: ber.as_ptr(),
        }
    }
}
