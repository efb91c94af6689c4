use crate::listing;
use crate::path;
use crate::Error;
use crate::ErrorKind;

/// Headers appended to every response, whatever its status
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

const HTML: &str = "text/html; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";
const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

pub(crate) fn static_file_handler(
    root: &std::path::Path,
    req: tiny_http::Request,
) -> Result<(), Error> {
    let method = req.method().clone();
    let target = req.url().to_owned();

    let reply = route(root, &method, &target);
    let status = reply.status();
    let mut response = reply.into_response()?;
    // every status gets them, errors and redirects included
    for (field, value) in CORS_HEADERS {
        response.add_header(header(field, value)?);
    }

    match req.remote_addr() {
        Some(remote) => log::info!("{remote} \"{method} {target}\" {status}"),
        None => log::info!("\"{method} {target}\" {status}"),
    }
    req.respond(response).map_err(|e| {
        Error::new(
            ErrorKind::Response,
            format!("failed to respond to `{method} {target}`: {e}"),
        )
    })
}

/// What to send back for a request
#[derive(Debug)]
pub(crate) enum Reply {
    File {
        file: std::fs::File,
        content_type: &'static str,
    },
    Listing(String),
    Redirect(String),
    Preflight,
    Error {
        status: u16,
        message: String,
    },
}

impl Reply {
    fn error(status: u16, message: impl Into<String>) -> Self {
        Self::Error {
            status,
            message: message.into(),
        }
    }

    fn not_found() -> Self {
        Self::error(404, "Page not found")
    }

    pub(crate) fn status(&self) -> u16 {
        match self {
            Self::File { .. } | Self::Listing(_) => 200,
            Self::Redirect(_) => 301,
            Self::Preflight => 204,
            Self::Error { status, .. } => *status,
        }
    }

    pub(crate) fn into_response(self) -> Result<tiny_http::ResponseBox, Error> {
        let response = match self {
            Self::File { file, content_type } => tiny_http::Response::from_file(file)
                .with_header(header("Content-Type", content_type)?)
                .boxed(),
            Self::Listing(html) => tiny_http::Response::from_data(html.into_bytes())
                .with_header(header("Content-Type", HTML)?)
                .boxed(),
            Self::Redirect(location) => tiny_http::Response::empty(301)
                .with_header(header("Location", &location)?)
                .boxed(),
            Self::Preflight => tiny_http::Response::empty(204).boxed(),
            Self::Error { status, message } => {
                // write a simple body for the error page
                let body = format!(
                    "<h1> <center> {status}: {} </center> </h1>",
                    listing::escape_html(&message)
                );
                tiny_http::Response::from_data(body.into_bytes())
                    .with_status_code(status)
                    .with_header(header("Content-Type", HTML)?)
                    .boxed()
            }
        };
        Ok(response)
    }
}

/// Decide how to answer `method target` for the files under `root`
///
/// `root` must be canonical.
pub(crate) fn route(root: &std::path::Path, method: &tiny_http::Method, target: &str) -> Reply {
    match method {
        tiny_http::Method::Get | tiny_http::Method::Head => {}
        tiny_http::Method::Options => return Reply::Preflight,
        other => return Reply::error(501, format!("Unsupported method ('{other}')")),
    }

    let Some((raw_path, query)) = path::split_target(target) else {
        return Reply::error(400, "Bad request path");
    };
    let decoded = path::percent_decode(raw_path);
    let candidate = path::resolve(root, &decoded);
    let Some(fs_path) = path::contain(root, &candidate) else {
        return Reply::not_found();
    };

    if fs_path.is_dir() {
        if !decoded.ends_with('/') {
            // relative links only work from behind a trailing slash; start from the cleaned up
            // path so `//host` can't turn into a protocol-relative URL
            let mut location = path::percent_encode(&path::normalize(&decoded), path::PATH_SAFE);
            if !location.ends_with('/') {
                location.push('/');
            }
            if let Some(query) = query {
                location.push('?');
                location.push_str(&path::percent_encode(query, path::QUERY_SAFE));
            }
            return Reply::Redirect(location);
        }

        for index in INDEX_FILES {
            if let Some(index) = path::contain(root, &fs_path.join(index)) {
                if index.is_file() {
                    return serve_file(&index);
                }
            }
        }

        return match listing::render(&fs_path, &decoded) {
            Ok(html) => Reply::Listing(html),
            Err(e) => {
                log::debug!("Failed to list `{}`: {e}", fs_path.display());
                Reply::error(404, "No permission to list directory")
            }
        };
    }

    if decoded.ends_with('/') || !fs_path.is_file() {
        return Reply::not_found();
    }
    serve_file(&fs_path)
}

fn serve_file(path: &std::path::Path) -> Reply {
    match std::fs::File::open(path) {
        Ok(file) => {
            let content_type = mime_guess::from_path(path)
                .first_raw()
                .unwrap_or(OCTET_STREAM);
            Reply::File { file, content_type }
        }
        Err(e) => {
            log::debug!("Failed to open `{}`: {e}", path.display());
            Reply::not_found()
        }
    }
}

fn header(field: &str, value: &str) -> Result<tiny_http::Header, Error> {
    tiny_http::Header::from_bytes(field.as_bytes(), value.as_bytes()).map_err(|()| {
        Error::new(
            ErrorKind::Response,
            format!("invalid header `{field}: {value}`"),
        )
    })
}
