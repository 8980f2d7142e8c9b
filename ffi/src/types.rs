//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! tagged enums with explicit discriminants. Conversion and release helpers
//! live here to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use mailman_core::{ApiError, HttpMethod, HttpRequest, MailingList, Page, Role};

/// Opaque handle to a `MailmanClient`.
pub struct FfiClient {
    pub(crate) inner: mailman_core::MailmanClient,
}

/// Opaque handle to a `ListsRequest` under construction.
pub struct FfiListsRequest {
    pub(crate) inner: mailman_core::ListsRequest,
}

/// Build a C string, replacing interior NULs rather than failing.
pub(crate) fn c_string(s: impl Into<String>) -> *mut c_char {
    let s: String = s.into();
    CString::new(s.replace('\0', "\u{FFFD}"))
        .unwrap_or_default()
        .into_raw()
}

/// Free a C string created by `c_string`. Safe with null.
pub(crate) fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Head = 0,
    Get = 1,
    Put = 2,
    Post = 3,
    Delete = 4,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Head => FfiHttpMethod::Head,
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

impl From<FfiHttpMethod> for HttpMethod {
    fn from(m: FfiHttpMethod) -> Self {
        match m {
            FfiHttpMethod::Head => HttpMethod::Head,
            FfiHttpMethod::Get => HttpMethod::Get,
            FfiHttpMethod::Put => HttpMethod::Put,
            FfiHttpMethod::Post => HttpMethod::Post,
            FfiHttpMethod::Delete => HttpMethod::Delete,
        }
    }
}

/// Roster selector as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiRole {
    Member = 0,
    Owner = 1,
    Moderator = 2,
}

impl From<FfiRole> for Role {
    fn from(r: FfiRole) -> Self {
        match r {
            FfiRole::Member => Role::Member,
            FfiRole::Owner => Role::Owner,
            FfiRole::Moderator => Role::Moderator,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub uri: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    pub(crate) fn from_core(req: HttpRequest) -> Self {
        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Vec<FfiHeader> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers.into_boxed_slice()) as *mut FfiHeader
        };

        FfiHttpRequest {
            method: req.method.into(),
            uri: c_string(req.uri),
            headers,
            headers_len,
            body: req.body.map_or(std::ptr::null_mut(), c_string),
        }
    }

    /// Release the strings and header array (not the struct itself).
    pub(crate) fn free_fields(&self) {
        free_c_string(self.uri);
        free_c_string(self.body);
        if !self.headers.is_null() && self.headers_len > 0 {
            let slice = std::ptr::slice_from_raw_parts_mut(self.headers, self.headers_len as usize);
            let headers = unsafe { Box::from_raw(slice) };
            for h in headers.iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this after executing a request and passes a
/// pointer to a `mailman_parse_*` function. The FFI layer reads but does
/// not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    NotFound = 1,
    Unauthorized = 2,
    Http = 3,
    Deserialization = 4,
    Serialization = 5,
    Config = 6,
    PathValidation = 7,
    UnsupportedMethod = 8,
    Panic = 9,
    NullArg = 10,
}

/// Tag that tells `mailman_free_result` what `FfiResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    Request = 1,
    ListPage = 2,
}

/// One mailing list exposed to C.
#[repr(C)]
pub struct FfiMailingList {
    pub list_id: *mut c_char,
    pub fqdn_listname: *mut c_char,
    pub display_name: *mut c_char,
    pub member_count: u32,
}

/// A page of mailing lists exposed to C.
#[repr(C)]
pub struct FfiListPage {
    pub items: *mut FfiMailingList,
    pub len: u32,
    pub total_size: u32,
}

impl FfiListPage {
    fn from_core(page: Page<MailingList>) -> Self {
        let len = page.entries.len() as u32;
        let items = if page.entries.is_empty() {
            std::ptr::null_mut()
        } else {
            let lists: Vec<FfiMailingList> = page
                .entries
                .into_iter()
                .map(|l| FfiMailingList {
                    list_id: c_string(l.list_id),
                    fqdn_listname: c_string(l.fqdn_listname),
                    display_name: c_string(l.display_name),
                    member_count: l.member_count,
                })
                .collect();
            Box::into_raw(lists.into_boxed_slice()) as *mut FfiMailingList
        };
        FfiListPage {
            items,
            len,
            total_size: page.total_size as u32,
        }
    }

    fn free_fields(&self) {
        if !self.items.is_null() && self.len > 0 {
            let slice = std::ptr::slice_from_raw_parts_mut(self.items, self.len as usize);
            let lists = unsafe { Box::from_raw(slice) };
            for l in lists.iter() {
                free_c_string(l.list_id);
                free_c_string(l.fqdn_listname);
                free_c_string(l.display_name);
            }
        }
    }
}

/// Result envelope for build and parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the payload (tagged by `data_tag`). On failure `error_code`
/// describes the category, `error_message` is a human-readable C string,
/// and `data` is null.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut std::ffi::c_void,
}

impl FfiResult {
    fn ok(data_tag: FfiDataTag, data: *mut std::ffi::c_void) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            data_tag,
            data,
        }))
    }

    fn error(error_code: FfiErrorCode, http_status: u16, msg: String) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message: c_string(msg),
            http_status,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn ok_request(req: HttpRequest) -> *mut Self {
        let data = Box::into_raw(Box::new(FfiHttpRequest::from_core(req)));
        Self::ok(FfiDataTag::Request, data as *mut std::ffi::c_void)
    }

    pub(crate) fn ok_list_page(page: Page<MailingList>) -> *mut Self {
        let data = Box::into_raw(Box::new(FfiListPage::from_core(page)));
        Self::ok(FfiDataTag::ListPage, data as *mut std::ffi::c_void)
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let (code, status) = match &err {
            ApiError::Config(_) => (FfiErrorCode::Config, 0),
            ApiError::Path(_) => (FfiErrorCode::PathValidation, 0),
            ApiError::UnsupportedMethod { .. } => (FfiErrorCode::UnsupportedMethod, 0),
            ApiError::NotFound => (FfiErrorCode::NotFound, 404),
            ApiError::Unauthorized => (FfiErrorCode::Unauthorized, 401),
            ApiError::HttpError { status, .. } => (FfiErrorCode::Http, *status),
            ApiError::DeserializationError(_) => (FfiErrorCode::Deserialization, 0),
            ApiError::SerializationError(_) => (FfiErrorCode::Serialization, 0),
        };
        Self::error(code, status, err.to_string())
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::NullArg, 0, format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, 0, msg.to_string())
    }

    /// Release the message and payload (not the struct itself).
    pub(crate) fn free_fields(&self) {
        free_c_string(self.error_message);
        if self.data.is_null() {
            return;
        }
        match self.data_tag {
            FfiDataTag::Request => {
                let req = unsafe { Box::from_raw(self.data as *mut FfiHttpRequest) };
                req.free_fields();
            }
            FfiDataTag::ListPage => {
                let page = unsafe { Box::from_raw(self.data as *mut FfiListPage) };
                page.free_fields();
            }
            FfiDataTag::None => {}
        }
    }
}
