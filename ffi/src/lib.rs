//! C-ABI wrapper around `mailman-core`.
//!
//! # Overview
//! Exposes the lists request builder through `extern "C"` functions so any
//! language with a C FFI can describe Mailman REST calls and parse their
//! responses without linking to serde or an HTTP stack.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Builders are opaque handles mutated in place, mirroring the core's
//!   `&mut self` mutators. Mutators return `false` on a null argument.
//! - `mailman_lists_build` and `mailman_parse_lists` return one
//!   `FfiResult` envelope whose `FfiDataTag` says what `data` points to.
//! - The C caller owns all returned pointers and must call the matching
//!   `mailman_*_free` / `mailman_free_*` function to release them.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::catch_unwind;

use mailman_core::options::{DEFAULT_PASSWORD, DEFAULT_USERNAME};
use mailman_core::{Credentials, HttpResponse, MailmanClient, Options, Resource};

use types::*;

/// Borrow a C string argument as `&str`. Null or invalid UTF-8 yields `None`.
fn str_arg<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a `MailmanClient` bound to `endpoint`.
///
/// `username` and `password` may be null; each falls back to the default
/// (`restadmin` / `restpass`). Returns null if `endpoint` is null, is
/// rejected by `Options::new`, or if an internal panic occurs. The caller must free the
/// returned pointer with `mailman_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn mailman_client_new(
    endpoint: *const c_char,
    username: *const c_char,
    password: *const c_char,
) -> *mut FfiClient {
    catch_unwind(|| {
        let Some(endpoint) = str_arg(endpoint) else {
            return std::ptr::null_mut();
        };
        let options = match Options::new(endpoint) {
            Ok(o) => o,
            Err(_) => return std::ptr::null_mut(),
        };
        let credentials = Credentials::new(
            str_arg(username).unwrap_or(DEFAULT_USERNAME),
            str_arg(password).unwrap_or(DEFAULT_PASSWORD),
        );
        let client = MailmanClient::new(options.with_credentials(credentials));
        Box::into_raw(Box::new(FfiClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `mailman_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn mailman_client_free(client: *mut FfiClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Lists builder
// ---------------------------------------------------------------------------

/// Start a fresh lists request from `client`.
///
/// The builder is independent of the client once created. Free it with
/// `mailman_lists_free`.
#[unsafe(no_mangle)]
pub extern "C" fn mailman_lists_new(client: *const FfiClient) -> *mut FfiListsRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        Box::into_raw(Box::new(FfiListsRequest {
            inner: client.inner.lists(),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a builder created by `mailman_lists_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn mailman_lists_free(req: *mut FfiListsRequest) {
    if !req.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(req) });
        });
    }
}

/// Select one list. A null or empty `list_id` clears the selection.
#[unsafe(no_mangle)]
pub extern "C" fn mailman_lists_list_id(req: *mut FfiListsRequest, list_id: *const c_char) -> bool {
    catch_unwind(|| {
        if req.is_null() {
            return false;
        }
        let req = unsafe { &mut *req };
        req.inner.list_id(str_arg(list_id).unwrap_or(""));
        true
    })
    .unwrap_or(false)
}

/// Select a roster view. `address` may be null to address the whole roster.
#[unsafe(no_mangle)]
pub extern "C" fn mailman_lists_role(
    req: *mut FfiListsRequest,
    role: FfiRole,
    address: *const c_char,
) -> bool {
    catch_unwind(|| {
        if req.is_null() {
            return false;
        }
        let req = unsafe { &mut *req };
        req.inner.role(role.into(), str_arg(address));
        true
    })
    .unwrap_or(false)
}

/// Set a text query parameter. With `merge` the value joins any existing
/// values for `key` instead of replacing them.
#[unsafe(no_mangle)]
pub extern "C" fn mailman_lists_param(
    req: *mut FfiListsRequest,
    key: *const c_char,
    value: *const c_char,
    merge: bool,
) -> bool {
    catch_unwind(|| {
        let (Some(key), Some(value)) = (str_arg(key), str_arg(value)) else {
            return false;
        };
        if req.is_null() {
            return false;
        }
        let req = unsafe { &mut *req };
        if merge {
            req.inner.merge_param(key, value);
        } else {
            req.inner.param(key, value);
        }
        true
    })
    .unwrap_or(false)
}

/// Integer flavor of `mailman_lists_param`, for `count`, `page` and the like.
#[unsafe(no_mangle)]
pub extern "C" fn mailman_lists_param_int(
    req: *mut FfiListsRequest,
    key: *const c_char,
    value: i64,
    merge: bool,
) -> bool {
    catch_unwind(|| {
        let Some(key) = str_arg(key) else {
            return false;
        };
        if req.is_null() {
            return false;
        }
        let req = unsafe { &mut *req };
        if merge {
            req.inner.merge_param(key, value);
        } else {
            req.inner.param(key, value);
        }
        true
    })
    .unwrap_or(false)
}

/// Set `filter[key]` to a text value, replacing any previous value.
#[unsafe(no_mangle)]
pub extern "C" fn mailman_lists_filter(
    req: *mut FfiListsRequest,
    key: *const c_char,
    value: *const c_char,
) -> bool {
    catch_unwind(|| {
        let (Some(key), Some(value)) = (str_arg(key), str_arg(value)) else {
            return false;
        };
        if req.is_null() {
            return false;
        }
        let req = unsafe { &mut *req };
        req.inner.filter(key, value);
        true
    })
    .unwrap_or(false)
}

/// Render the absolute URI for the builder's current state.
///
/// Returns null on a null builder or when a path segment fails validation.
/// Free the string with `mailman_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn mailman_lists_uri(req: *const FfiListsRequest) -> *mut c_char {
    catch_unwind(|| {
        if req.is_null() {
            return std::ptr::null_mut();
        }
        let req = unsafe { &*req };
        match req.inner.uri() {
            Ok(uri) => c_string(uri),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Describe a request for `method` in the builder's current state.
///
/// `body` is an optional JSON document sent as-is; it must parse as JSON.
/// Returns a result with `data_tag = Request` on success, or an error code
/// such as `UnsupportedMethod` or `PathValidation`. Free it with
/// `mailman_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn mailman_lists_build(
    req: *const FfiListsRequest,
    method: FfiHttpMethod,
    body: *const c_char,
) -> *mut FfiResult {
    catch_unwind(|| {
        if req.is_null() {
            return FfiResult::null_arg("req");
        }
        let req = unsafe { &*req };
        let body = match str_arg(body) {
            None => None,
            Some(json) => match serde_json::from_str::<serde_json::Value>(json) {
                Ok(_) => Some(json.to_string()),
                Err(e) => {
                    return FfiResult::from_error(mailman_core::ApiError::SerializationError(
                        e.to_string(),
                    ))
                }
            },
        };
        match req.inner.build(method.into(), body) {
            Ok(request) => FfiResult::ok_request(request),
            Err(e) => FfiResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in mailman_lists_build"))
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body: str_arg(resp.body).unwrap_or("").to_string(),
    }
}

/// Parse a lists collection response.
///
/// With `max_members` set, only the lists with the largest member count are
/// kept. Returns a result with `data_tag = ListPage` on success.
#[unsafe(no_mangle)]
pub extern "C" fn mailman_parse_lists(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
    max_members: bool,
) -> *mut FfiResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match client.inner.parse_lists(ffi_response_to_core(resp)) {
            Ok(page) if max_members => FfiResult::ok_list_page(page.max_members()),
            Ok(page) => FfiResult::ok_list_page(page),
            Err(e) => FfiResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in mailman_parse_lists"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a result returned by `mailman_lists_build` or `mailman_parse_lists`.
/// Safe to call with null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn mailman_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        result.free_fields();
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn mailman_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
