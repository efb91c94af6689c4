use std::io::{Read as _, Write as _};
use std::sync::Arc;

use file_serve::{CORS_HEADERS, ErrorKind, Server, ServerBuilder};

struct Site {
    dir: tempfile::TempDir,
    server: Arc<Server>,
    handle: Option<std::thread::JoinHandle<Result<(), file_serve::Error>>>,
}

impl Site {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("site");
        std::fs::create_dir_all(root.join("assets")).unwrap();
        std::fs::write(root.join("index.html"), "hello").unwrap();
        std::fs::write(root.join("assets/logo.bin"), [0_u8, 159, 146, 150, 255]).unwrap();
        std::fs::write(dir.path().join("secret.txt"), "top secret").unwrap();

        let server = ServerBuilder::new(&root)
            .hostname("127.0.0.1")
            .port(0)
            .build()
            .unwrap();
        let server = Arc::new(server);
        let serving = Arc::clone(&server);
        let handle = std::thread::spawn(move || serving.serve());

        Self {
            dir,
            server,
            handle: Some(handle),
        }
    }

    fn request(&self, method: &str, target: &str) -> Response {
        let mut stream = std::net::TcpStream::connect(self.server.addr()).unwrap();
        write!(
            stream,
            "{method} {target} HTTP/1.0\r\nHost: localhost\r\nConnection: close\r\n\r\n"
        )
        .unwrap();
        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).unwrap();
        Response::parse(&raw)
    }

    fn get(&self, target: &str) -> Response {
        self.request("GET", target)
    }
}

impl Drop for Site {
    fn drop(&mut self) {
        self.server.close();
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap().unwrap();
        }
    }
}

#[derive(Debug)]
struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Response {
    fn parse(raw: &[u8]) -> Self {
        let split = raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("complete header block");
        let head = std::str::from_utf8(&raw[..split]).unwrap();
        let mut lines = head.split("\r\n");
        let status = lines
            .next()
            .and_then(|line| line.split(' ').nth(1))
            .and_then(|code| code.parse().ok())
            .expect("status line");
        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(field, value)| (field.trim().to_owned(), value.trim().to_owned()))
            .collect();
        Self {
            status,
            headers,
            body: raw[split + 4..].to_vec(),
        }
    }

    fn header(&self, field: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(f, _)| f.eq_ignore_ascii_case(field))
            .map(|(_, v)| v.as_str())
    }

    fn assert_cors(&self) {
        for (field, value) in CORS_HEADERS {
            assert_eq!(self.header(field), Some(value), "{field} on {self:?}");
        }
    }
}

#[test]
fn get_index_html() {
    let site = Site::new();
    let response = site.get("/index.html");

    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"hello");
    assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
    assert_eq!(response.header("Content-Type"), Some("text/html"));
    response.assert_cors();
}

#[test]
fn get_binary_file_is_byte_for_byte() {
    let site = Site::new();
    let response = site.get("/assets/logo.bin");

    assert_eq!(response.status, 200);
    assert_eq!(response.body, [0_u8, 159, 146, 150, 255]);
    assert_eq!(
        response.header("Content-Type"),
        Some("application/octet-stream")
    );
    response.assert_cors();
}

#[test]
fn get_missing_file() {
    let site = Site::new();
    let response = site.get("/does-not-exist.txt");

    assert_eq!(response.status, 404);
    response.assert_cors();
}

#[test]
fn get_directory_redirects_then_lists() {
    let site = Site::new();
    let response = site.get("/assets");
    assert_eq!(response.status, 301);
    assert_eq!(response.header("Location"), Some("/assets/"));
    response.assert_cors();

    let response = site.get("/assets/");
    assert_eq!(response.status, 200);
    let body = String::from_utf8(response.body.clone()).unwrap();
    assert!(body.contains("<a href=\"logo.bin\">logo.bin</a>"), "{body}");
    response.assert_cors();
}

#[test]
fn head_sends_no_body() {
    let site = Site::new();
    let response = site.request("HEAD", "/index.html");

    assert_eq!(response.status, 200);
    assert!(response.body.is_empty());
    response.assert_cors();
}

#[test]
fn options_preflight() {
    let site = Site::new();
    let response = site.request("OPTIONS", "/index.html");

    assert_eq!(response.status, 204);
    response.assert_cors();
}

#[test]
fn post_is_unsupported() {
    let site = Site::new();
    let response = site.request("POST", "/index.html");

    assert_eq!(response.status, 501);
    response.assert_cors();
}

#[test]
fn traversal_stays_in_root() {
    let site = Site::new();
    assert!(site.dir.path().join("secret.txt").exists());

    for target in [
        "/../secret.txt",
        "/%2e%2e/secret.txt",
        "/assets/../../secret.txt",
        "/..%2f..%2fsecret.txt",
    ] {
        let response = site.get(target);
        assert_eq!(response.status, 404, "{target}");
        assert!(
            !String::from_utf8_lossy(&response.body).contains("top secret"),
            "{target}"
        );
        response.assert_cors();
    }
}

#[test]
#[cfg(unix)]
fn symlink_out_of_root_is_refused() {
    let site = Site::new();
    std::os::unix::fs::symlink(
        site.dir.path().join("secret.txt"),
        site.server.root().join("leak.txt"),
    )
    .unwrap();

    let response = site.get("/leak.txt");
    assert_eq!(response.status, 404);
    assert!(!String::from_utf8_lossy(&response.body).contains("top secret"));
}

#[test]
fn bad_requests_do_not_stop_the_server() {
    let site = Site::new();
    assert_eq!(site.get("*").status, 400);
    assert_eq!(site.get("/does-not-exist.txt").status, 404);
    assert_eq!(site.get("/index.html").status, 200);
}

#[test]
fn second_bind_fails_fast() {
    let site = Site::new();
    let err = ServerBuilder::new(site.server.root())
        .hostname("127.0.0.1")
        .port(site.server.addr().port())
        .build()
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Bind);
}

#[test]
fn close_stops_serving() {
    let mut site = Site::new();
    site.server.close();

    let handle = site.handle.take().unwrap();
    handle.join().unwrap().unwrap();
    assert!(site.server.is_closing());
}
