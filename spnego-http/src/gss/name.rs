use super::{
    error::Error,
    oid::Oid,
    util::{Buf, BufRef},
};
use spnego_http_sys::{
    gss_OID, gss_OID_desc, gss_display_name, gss_import_name, gss_name_struct, gss_name_t,
    gss_release_name, OM_uint32, GSS_S_COMPLETE,
};
use std::{fmt, ptr};

pub struct Name(gss_name_t);

unsafe impl Send for Name {}

impl Drop for Name {
    fn drop(&mut self) {
        if !self.0.is_null() {
            let mut _minor = GSS_S_COMPLETE;
            let _major = unsafe {
                gss_release_name(&mut _minor as *mut OM_uint32, &mut self.0 as *mut gss_name_t)
            };
        }
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.display() {
            Ok(name) => write!(f, "Name({:?})", name),
            Err(e) => write!(f, "Name(<{}>)", e),
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.display() {
            Ok(name) => f.write_str(&name),
            Err(_) => f.write_str("<unprintable name>"),
        }
    }
}

impl Name {
    pub(crate) unsafe fn to_c(&self) -> gss_name_t {
        self.0
    }

    /// The printable form, as gss_display_name renders it.
    pub fn display(&self) -> Result<String, Error> {
        let mut minor = GSS_S_COMPLETE;
        let mut out = Buf::empty();
        let mut name_type = ptr::null_mut::<gss_OID_desc>();
        let major = unsafe {
            gss_display_name(
                &mut minor as *mut OM_uint32,
                self.0,
                out.to_c(),
                &mut name_type as *mut gss_OID,
            )
        };
        if major != GSS_S_COMPLETE {
            return Err(Error::new(major, minor));
        }
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Import `s` as a name of type `kind`, e.g.
    /// `GSS_NT_HOSTBASED_SERVICE` for `HTTP@host.example.com`.
    pub fn new(s: &[u8], kind: &Oid) -> Result<Self, Error> {
        let mut buf = BufRef::from(s);
        let mut minor = GSS_S_COMPLETE;
        let mut name = ptr::null_mut::<gss_name_struct>();
        let major = unsafe {
            gss_import_name(
                &mut minor as *mut OM_uint32,
                buf.to_c(),
                kind.to_c(),
                &mut name as *mut gss_name_t,
            )
        };
        if major == GSS_S_COMPLETE {
            Ok(Name(name))
        } else {
            Err(Error::new(major, minor))
        }
    }
}
