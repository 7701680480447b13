use bytes::Bytes;
use spnego_http_sys::{
    gss_buffer_desc, gss_buffer_desc_struct, gss_buffer_t, gss_release_buffer, OM_uint32,
    GSS_S_COMPLETE,
};
use std::{ffi, marker::PhantomData, ops::Deref, ptr, slice};

fn contents(buf: &gss_buffer_desc) -> &[u8] {
    if buf.value.is_null() || buf.length == 0 {
        &[]
    } else {
        // the buffer's owner keeps `value` alive for as long as `buf`
        unsafe { slice::from_raw_parts(buf.value.cast(), buf.length as usize) }
    }
}

/* Only pass this to gssapi routines that treat the buffer as input,
 * C can't be stopped from writing through the pointer. */
#[repr(transparent)]
#[derive(Debug)]
pub(crate) struct BufRef<'a>(gss_buffer_desc_struct, PhantomData<&'a [u8]>);

impl<'a> Deref for BufRef<'a> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        contents(&self.0)
    }
}

impl<'a> From<&'a [u8]> for BufRef<'a> {
    fn from(s: &'a [u8]) -> Self {
        let gss_buf = gss_buffer_desc_struct {
            length: s.len() as _,
            value: s.as_ptr() as *mut ffi::c_void,
        };
        BufRef(gss_buf, PhantomData)
    }
}

impl<'a> BufRef<'a> {
    pub(crate) unsafe fn to_c(&mut self) -> gss_buffer_t {
        &mut self.0 as gss_buffer_t
    }
}

/// An owned buffer allocated by gssapi, released through the library
/// when dropped.
#[repr(transparent)]
#[derive(Debug)]
pub(crate) struct Buf(gss_buffer_desc);

impl Deref for Buf {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        contents(&self.0)
    }
}

impl Drop for Buf {
    fn drop(&mut self) {
        if !self.0.value.is_null() {
            let mut minor = GSS_S_COMPLETE;
            let _major = unsafe {
                gss_release_buffer(&mut minor as *mut OM_uint32, &mut self.0 as gss_buffer_t)
            };
        }
    }
}

impl Buf {
    pub(crate) fn empty() -> Buf {
        Buf(gss_buffer_desc {
            length: 0 as _,
            value: ptr::null_mut(),
        })
    }

    pub(crate) unsafe fn to_c(&mut self) -> gss_buffer_t {
        &mut self.0 as gss_buffer_t
    }

    /// Copy the contents out so the gssapi allocation can be freed.
    pub(crate) fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}
