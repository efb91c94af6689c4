//! > An HTTP Static File Server for local development
//!
//! `file-serve` exposes a directory over HTTP and stamps permissive CORS headers
//! onto every response, so pages under development can be fetched from other
//! origins.  It prioritizes small size and compile times over speed, scalability,
//! or security.
//!
//! # Example
//!
//! ```rust,no_run
//! let path = std::env::current_dir().unwrap();
//! let server = file_serve::ServerBuilder::new(&path).build().unwrap();
//!
//! println!("Serving {}", server.root().display());
//! println!("See {}", server.url());
//! println!("Hit CTRL-C to stop");
//!
//! server.serve().unwrap();
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod handler;
mod listing;
mod path;

use std::sync::atomic::{AtomicBool, Ordering};

pub use handler::CORS_HEADERS;

/// Bind to all interfaces
pub const DEFAULT_HOSTNAME: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

/// Custom server settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerBuilder {
    source: std::path::PathBuf,
    hostname: Option<String>,
    port: Option<u16>,
}

impl ServerBuilder {
    pub fn new(source: impl Into<std::path::PathBuf>) -> Self {
        Self {
            source: source.into(),
            hostname: None,
            port: None,
        }
    }

    /// Override the hostname
    ///
    /// By default, all interfaces are bound.  An empty hostname means the same.
    pub fn hostname(&mut self, hostname: impl Into<String>) -> &mut Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Override the port
    ///
    /// By default, [`DEFAULT_PORT`] is used.  `0` asks the OS for a free port, see
    /// [`Server::addr`] for what was picked.
    pub fn port(&mut self, port: u16) -> &mut Self {
        self.port = Some(port);
        self
    }

    /// Bind the listening socket
    ///
    /// A port that is already taken is an [`ErrorKind::Bind`] error; no other port is tried.
    pub fn build(&self) -> Result<Server, Error> {
        let root = dunce::canonicalize(&self.source).map_err(|e| {
            Error::new(
                ErrorKind::Root,
                format!("failed to resolve `{}`: {}", self.source.display(), e),
            )
        })?;
        if !root.is_dir() {
            return Err(Error::new(
                ErrorKind::Root,
                format!("`{}` is not a directory", root.display()),
            ));
        }

        let hostname = match self.hostname.as_deref() {
            None | Some("") => DEFAULT_HOSTNAME,
            Some(hostname) => hostname,
        };
        let port = self.port.unwrap_or(DEFAULT_PORT);
        let listener = tiny_http::Server::http((hostname, port)).map_err(|e| {
            Error::new(
                ErrorKind::Bind,
                format!("failed to bind {hostname}:{port}: {e}"),
            )
        })?;
        let addr = listener.server_addr().to_ip().ok_or_else(|| {
            Error::new(ErrorKind::Bind, "listener is not bound to a TCP address")
        })?;
        log::debug!("Listening on {addr} for `{}`", root.display());

        Ok(Server {
            root,
            addr,
            listener,
            closing: AtomicBool::new(false),
        })
    }

    /// Start the webserver
    pub fn serve(&self) -> Result<(), Error> {
        self.build()?.serve()
    }
}

pub struct Server {
    root: std::path::PathBuf,
    addr: std::net::SocketAddr,
    listener: tiny_http::Server,
    closing: AtomicBool,
}

impl Server {
    /// The canonicalized location being served
    pub fn root(&self) -> &std::path::Path {
        self.root.as_path()
    }

    /// The address the listening socket is bound to
    pub fn addr(&self) -> std::net::SocketAddr {
        self.addr
    }

    /// Where a browser on this machine can reach the server
    pub fn url(&self) -> String {
        let ip = self.addr.ip();
        if ip.is_unspecified() || ip.is_loopback() {
            format!("http://localhost:{}/", self.addr.port())
        } else {
            format!("http://{}/", self.addr)
        }
    }

    /// Whether [`Server::close`] has been requested
    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }

    /// Answer requests until [`Server::close`] is called
    pub fn serve(&self) -> Result<(), Error> {
        if self.is_closing() {
            return Err(Error::new(ErrorKind::Closed, "the server was closed"));
        }

        loop {
            match self.listener.recv() {
                Ok(request) => {
                    // one bad request must not take the loop down
                    if let Err(e) = handler::static_file_handler(self.root(), request) {
                        log::error!("{e}");
                    }
                }
                Err(_) if self.is_closing() => break,
                Err(e) => log::warn!("Failed to accept a connection: {e}"),
            }
        }
        log::debug!("Stopped listening on {}", self.addr);

        Ok(())
    }

    /// Stop [`Server::serve`] from any thread
    ///
    /// Responses already being written are left to finish on their own.
    pub fn close(&self) {
        self.closing.store(true, Ordering::SeqCst);
        self.listener.unblock();
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt.debug_struct("Server")
            .field("root", &self.root)
            .field("addr", &self.addr)
            .field("closing", &self.is_closing())
            .finish_non_exhaustive()
    }
}

/// What went wrong
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The serving root could not be resolved
    Root,
    /// The listening socket could not be bound
    Bind,
    /// [`Server::serve`] was called after [`Server::close`]
    Closed,
    /// A response could not be built or written
    Response,
}

/// Serve Error
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    fn new(kind: ErrorKind, message: impl ToString) -> Self {
        Self {
            kind,
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.message.fmt(fmt)
    }
}

impl std::error::Error for Error {}
