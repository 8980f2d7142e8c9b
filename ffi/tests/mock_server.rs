//! Drive the C ABI against the mock server, the way a C caller would:
//! build through `mailman_lists_build`, execute the described request, then
//! hand the status and body back to `mailman_parse_lists`.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use mailman_ffi::types::{
    FfiDataTag, FfiErrorCode, FfiHttpMethod, FfiHttpRequest, FfiHttpResponse, FfiListPage,
    FfiResult,
};
use mailman_ffi::*;
use mailman_mock::{AppState, Db};

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            let state = AppState::new(Db::seeded(), "restadmin", "restpass");
            mailman_mock::run_with_state(listener, state).await
        })
        .unwrap();
    });

    format!("http://{addr}/3.1")
}

fn read(s: *const c_char) -> String {
    unsafe { CStr::from_ptr(s) }.to_str().unwrap().to_string()
}

/// Execute a GET described by a build result; returns status and body.
fn execute(result: *mut FfiResult) -> (u16, String) {
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::Ok);
    assert_eq!(r.data_tag, FfiDataTag::Request);
    let req = unsafe { &*(r.data as *const FfiHttpRequest) };
    assert_eq!(req.method, FfiHttpMethod::Get);

    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();
    let mut builder = agent.get(read(req.uri));
    let headers = unsafe { std::slice::from_raw_parts(req.headers, req.headers_len as usize) };
    for h in headers {
        builder = builder.header(read(h.key), read(h.value));
    }
    let mut response = builder.call().expect("HTTP transport error");
    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();
    (status, body)
}

#[test]
fn filtered_collection_round_trip() {
    let endpoint = CString::new(start_server()).unwrap();
    let client = mailman_client_new(endpoint.as_ptr(), std::ptr::null(), std::ptr::null());
    assert!(!client.is_null());

    let lists = mailman_lists_new(client);
    let key = CString::new("mail_host").unwrap();
    let value = CString::new("example.com").unwrap();
    assert!(mailman_lists_filter(lists, key.as_ptr(), value.as_ptr()));

    let built = mailman_lists_build(lists, FfiHttpMethod::Get, std::ptr::null());
    let (status, body) = execute(built);
    mailman_free_result(built);

    let body = CString::new(body).unwrap();
    let resp = FfiHttpResponse {
        status,
        body: body.as_ptr(),
    };
    let parsed = mailman_parse_lists(client, &resp, true);
    let r = unsafe { &*parsed };
    assert_eq!(r.error_code, FfiErrorCode::Ok);
    let page = unsafe { &*(r.data as *const FfiListPage) };
    assert_eq!(page.len, 1);
    let items = unsafe { std::slice::from_raw_parts(page.items, page.len as usize) };
    assert_eq!(read(items[0].list_id), "ant.example.com");

    mailman_free_result(parsed);
    mailman_lists_free(lists);
    mailman_client_free(client);
}

#[test]
fn wrong_password_is_reported_as_unauthorized() {
    let endpoint = CString::new(start_server()).unwrap();
    let user = CString::new("restadmin").unwrap();
    let pass = CString::new("wrong").unwrap();
    let client = mailman_client_new(endpoint.as_ptr(), user.as_ptr(), pass.as_ptr());

    let lists = mailman_lists_new(client);
    let built = mailman_lists_build(lists, FfiHttpMethod::Get, std::ptr::null());
    let (status, body) = execute(built);
    mailman_free_result(built);
    assert_eq!(status, 401);

    let body = CString::new(body).unwrap();
    let resp = FfiHttpResponse {
        status,
        body: body.as_ptr(),
    };
    let parsed = mailman_parse_lists(client, &resp, false);
    assert_eq!(unsafe { &*parsed }.error_code, FfiErrorCode::Unauthorized);

    mailman_free_result(parsed);
    mailman_lists_free(lists);
    mailman_client_free(client);
}
