use super::util::Buf;
use spnego_http_sys::{
    gss_OID_desc, gss_display_status, OM_uint32, GSS_C_CALLING_ERROR_OFFSET, GSS_C_GSS_CODE,
    GSS_C_MECH_CODE, GSS_C_ROUTINE_ERROR_OFFSET, GSS_S_COMPLETE, _GSS_C_CALLING_ERROR_MASK,
    _GSS_C_ROUTINE_ERROR_MASK,
};
use std::{error, fmt, path::PathBuf, ptr};

pub(crate) fn gss_error(x: OM_uint32) -> OM_uint32 {
    x & ((_GSS_C_CALLING_ERROR_MASK << GSS_C_CALLING_ERROR_OFFSET)
        | (_GSS_C_ROUTINE_ERROR_MASK << GSS_C_ROUTINE_ERROR_OFFSET))
}

/// A failed gssapi call, major and minor status as returned by the
/// library.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Error {
    pub major: u32,
    pub minor: u32,
}

impl Error {
    pub(crate) fn new(major: OM_uint32, minor: OM_uint32) -> Self {
        Error { major, minor }
    }

    fn fmt_code(
        f: &mut fmt::Formatter<'_>,
        code: u32,
        kind: OM_uint32,
        name: &str,
    ) -> fmt::Result {
        let mut message_context: OM_uint32 = 0;
        loop {
            let mut minor = GSS_S_COMPLETE;
            let mut buf = Buf::empty();
            let major = unsafe {
                gss_display_status(
                    &mut minor as *mut OM_uint32,
                    code,
                    kind as i32,
                    ptr::null_mut::<gss_OID_desc>(),
                    &mut message_context as *mut OM_uint32,
                    buf.to_c(),
                )
            };
            if major == GSS_S_COMPLETE {
                write!(f, "gssapi {} error {}; ", name, String::from_utf8_lossy(&buf))?;
            } else {
                write!(f, "gssapi unknown {} error code {}; ", name, code)?;
                break;
            }
            if message_context == 0 {
                break;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Error::fmt_code(f, self.major, GSS_C_GSS_CODE, "major")?;
        if self.minor != 0 {
            Error::fmt_code(f, self.minor, GSS_C_MECH_CODE, "minor")?;
        }
        Ok(())
    }
}

impl error::Error for Error {}

/// Everything the system gssapi layer can fail with.
#[derive(Debug, thiserror::Error)]
pub enum GssapiError {
    #[error(transparent)]
    Gss(#[from] Error),

    #[error("keytab file not found: {}", .0.display())]
    KeytabNotFound(PathBuf),

    #[error("invalid login option: {0}")]
    InvalidOption(String),
}
