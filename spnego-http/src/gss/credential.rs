use super::{
    error::{Error, GssapiError},
    name::Name,
};
use spnego_http_sys::{
    gss_OID_set, gss_acquire_cred, gss_acquire_cred_from, gss_cred_id_struct, gss_cred_id_t,
    gss_cred_usage_t, gss_key_value_element_desc, gss_key_value_set_desc, gss_name_struct,
    gss_release_cred, krb5_cc_destroy, krb5_cc_resolve, krb5_ccache, krb5_context,
    krb5_free_context, krb5_init_context, OM_uint32, GSS_C_INITIATE, GSS_S_COMPLETE,
    _GSS_C_INDEFINITE,
};
use std::{ffi::CString, fmt, ptr, sync::Arc};
use tracing::warn;

/// A krb5 MEMORY: ccache private to one credential. Destroyed, together
/// with any tickets obtained into it, when dropped.
struct MemoryCcache(CString);

impl MemoryCcache {
    fn new() -> MemoryCcache {
        let name = format!("MEMORY:spnego-http-{}", uuid::Uuid::new_v4().simple());
        // uuids never contain a nul
        MemoryCcache(CString::new(name).unwrap_or_default())
    }

    fn name(&self) -> &str {
        self.0.to_str().unwrap_or_default()
    }
}

impl Drop for MemoryCcache {
    fn drop(&mut self) {
        let mut ctx: krb5_context = ptr::null_mut();
        let code = unsafe { krb5_init_context(&mut ctx as *mut krb5_context) };
        if code != 0 {
            warn!(code, ccache = self.name(), "can't destroy ccache, krb5_init_context failed");
            return;
        }
        let mut cc: krb5_ccache = ptr::null_mut();
        let code = unsafe { krb5_cc_resolve(ctx, self.0.as_ptr(), &mut cc as *mut krb5_ccache) };
        if code == 0 {
            let code = unsafe { krb5_cc_destroy(ctx, cc) };
            if code != 0 {
                warn!(code, ccache = self.name(), "krb5_cc_destroy failed");
            }
        }
        unsafe { krb5_free_context(ctx) };
    }
}

struct CredInner {
    handle: gss_cred_id_t,
    // dropped after the handle is released
    _ccache: Option<MemoryCcache>,
}

impl Drop for CredInner {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            let mut minor = GSS_S_COMPLETE;
            let _major = unsafe {
                gss_release_cred(
                    &mut minor as *mut OM_uint32,
                    &mut self.handle as *mut gss_cred_id_t,
                )
            };
        }
    }
}

/// Initiator credentials. Clones share the underlying handle, which is
/// released when the last clone is dropped.
#[derive(Clone)]
pub struct Cred(Arc<CredInner>);

unsafe impl Send for Cred {}
unsafe impl Sync for Cred {}

impl fmt::Debug for Cred {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.0._ccache {
            None => write!(f, "Cred(default ccache)"),
            Some(cc) => write!(f, "Cred({})", cc.name()),
        }
    }
}

impl Cred {
    /// Acquire initiator credentials for `name`, or the default
    /// principal, from the default credential cache.
    pub fn acquire(name: Option<&Name>) -> Result<Cred, Error> {
        let mut minor = GSS_S_COMPLETE;
        let mut cred = ptr::null_mut::<gss_cred_id_struct>();
        let major = unsafe {
            gss_acquire_cred(
                &mut minor as *mut OM_uint32,
                match name {
                    None => ptr::null_mut::<gss_name_struct>(),
                    Some(n) => n.to_c(),
                },
                _GSS_C_INDEFINITE,
                ptr::null_mut(),
                GSS_C_INITIATE as gss_cred_usage_t,
                &mut cred as *mut gss_cred_id_t,
                ptr::null_mut::<gss_OID_set>(),
                ptr::null_mut::<OM_uint32>(),
            )
        };
        if major == GSS_S_COMPLETE {
            Ok(Cred(Arc::new(CredInner {
                handle: cred,
                _ccache: None,
            })))
        } else {
            Err(Error::new(major, minor))
        }
    }

    /// Acquire initiator credentials for `name` from the client keytab
    /// at `keytab`. Tickets are obtained into a private memory ccache
    /// that lives exactly as long as the returned credential.
    pub fn acquire_with_keytab(name: &Name, keytab: &str) -> Result<Cred, GssapiError> {
        let ccache = MemoryCcache::new();
        let handle = acquire_from(
            Some(name),
            &[("client_keytab", keytab), ("ccache", ccache.name())],
        )?;
        Ok(Cred(Arc::new(CredInner {
            handle,
            _ccache: Some(ccache),
        })))
    }

    /// Acquire initiator credentials from a specific credential cache,
    /// e.g. `FILE:/tmp/krb5cc_1000`.
    pub fn acquire_from_ccache(name: Option<&Name>, ccache: &str) -> Result<Cred, GssapiError> {
        let handle = acquire_from(name, &[("ccache", ccache)])?;
        Ok(Cred(Arc::new(CredInner {
            handle,
            _ccache: None,
        })))
    }

    pub(crate) unsafe fn to_c(&self) -> gss_cred_id_t {
        self.0.handle
    }
}

fn acquire_from(name: Option<&Name>, store: &[(&str, &str)]) -> Result<gss_cred_id_t, GssapiError> {
    let store = store
        .iter()
        .map(|(k, v)| {
            let key = CString::new(*k).map_err(|_| GssapiError::InvalidOption(k.to_string()))?;
            let value = CString::new(*v)
                .map_err(|_| GssapiError::InvalidOption(format!("{}={}", k, v)))?;
            Ok((key, value))
        })
        .collect::<Result<Vec<_>, GssapiError>>()?;
    let mut elements = store
        .iter()
        .map(|(key, value)| gss_key_value_element_desc {
            key: key.as_ptr(),
            value: value.as_ptr(),
        })
        .collect::<Vec<_>>();
    let set = gss_key_value_set_desc {
        count: elements.len() as OM_uint32,
        elements: elements.as_mut_ptr(),
    };
    let mut minor = GSS_S_COMPLETE;
    let mut cred = ptr::null_mut::<gss_cred_id_struct>();
    let major = unsafe {
        gss_acquire_cred_from(
            &mut minor as *mut OM_uint32,
            match name {
                None => ptr::null_mut::<gss_name_struct>(),
                Some(n) => n.to_c(),
            },
            _GSS_C_INDEFINITE,
            ptr::null_mut(),
            GSS_C_INITIATE as gss_cred_usage_t,
            &set,
            &mut cred as *mut gss_cred_id_t,
            ptr::null_mut::<gss_OID_set>(),
            ptr::null_mut::<OM_uint32>(),
        )
    };
    if major == GSS_S_COMPLETE {
        Ok(cred)
    } else {
        Err(Error::new(major, minor).into())
    }
}
