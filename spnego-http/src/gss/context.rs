use super::{
    credential::Cred,
    error::{gss_error, Error},
    name::Name,
    oid::Oid,
    util::{Buf, BufRef},
};
use crate::security::ContextFlags;
use bytes::Bytes;
use spnego_http_sys::{
    gss_OID, gss_buffer_desc, gss_channel_bindings_struct, gss_ctx_id_struct, gss_ctx_id_t,
    gss_delete_sec_context, gss_init_sec_context, OM_uint32, GSS_S_COMPLETE,
    _GSS_C_INDEFINITE, _GSS_S_CONTINUE_NEEDED,
};
use std::{fmt, ptr};

fn delete_ctx(mut ctx: gss_ctx_id_t) {
    if !ctx.is_null() {
        let mut minor = GSS_S_COMPLETE;
        let _major = unsafe {
            gss_delete_sec_context(
                &mut minor as *mut OM_uint32,
                &mut ctx as *mut gss_ctx_id_t,
                ptr::null_mut::<gss_buffer_desc>(),
            )
        };
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Uninit,
    Partial,
    Complete,
    Failed(Error),
}

/// The initiator side of a security context.
pub struct ClientCtx {
    ctx: gss_ctx_id_t,
    state: State,
    cred: Cred,
    target: Name,
    mech: &'static Oid,
    flags: ContextFlags,
}

unsafe impl Send for ClientCtx {}

impl Drop for ClientCtx {
    fn drop(&mut self) {
        delete_ctx(self.ctx);
    }
}

impl fmt::Debug for ClientCtx {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ClientCtx")
            .field("state", &self.state)
            .field("target", &self.target)
            .field("mech", &self.mech)
            .field("flags", &self.flags)
            .finish()
    }
}

impl ClientCtx {
    pub fn new(cred: &Cred, target: Name, flags: ContextFlags, mech: &'static Oid) -> ClientCtx {
        ClientCtx {
            ctx: ptr::null_mut::<gss_ctx_id_struct>(),
            state: State::Uninit,
            cred: cred.clone(),
            target,
            mech,
            flags,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == State::Complete
    }

    /// Run one round of gss_init_sec_context. An empty `tok` is passed
    /// as GSS_C_NO_BUFFER. Returns the token to send to the acceptor,
    /// if there is one.
    pub fn step(&mut self, tok: &[u8]) -> Result<Option<Bytes>, Error> {
        match self.state {
            State::Failed(e) => return Err(e),
            State::Complete => return Ok(None),
            State::Uninit | State::Partial => (),
        }
        let mut minor = GSS_S_COMPLETE;
        let mut tok = if tok.is_empty() {
            None
        } else {
            Some(BufRef::from(tok))
        };
        let mut out_tok = Buf::empty();
        let major = unsafe {
            gss_init_sec_context(
                &mut minor as *mut OM_uint32,
                self.cred.to_c(),
                &mut self.ctx as *mut gss_ctx_id_t,
                self.target.to_c(),
                self.mech.to_c(),
                self.flags.bits(),
                _GSS_C_INDEFINITE,
                ptr::null_mut::<gss_channel_bindings_struct>(),
                match tok {
                    None => ptr::null_mut::<gss_buffer_desc>(),
                    Some(ref mut tok) => tok.to_c(),
                },
                ptr::null_mut::<gss_OID>(),
                out_tok.to_c(),
                ptr::null_mut::<OM_uint32>(),
                ptr::null_mut::<OM_uint32>(),
            )
        };
        if gss_error(major) > 0 {
            let e = Error::new(major, minor);
            self.state = State::Failed(e);
            delete_ctx(self.ctx);
            self.ctx = ptr::null_mut();
            Err(e)
        } else {
            self.state = if major & _GSS_S_CONTINUE_NEEDED > 0 {
                State::Partial
            } else {
                State::Complete
            };
            if out_tok.is_empty() {
                Ok(None)
            } else {
                Ok(Some(out_tok.to_bytes()))
            }
        }
    }
}
