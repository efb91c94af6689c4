use std::sync::Arc;

use anyhow::Context as _;

use crate::browser;
use crate::error::Result;
use crate::signal;

const FAREWELL: &str = "Server stopped";

/// Serve the directory until interrupted
#[derive(Clone, Debug, PartialEq, Eq, clap::Args)]
pub(crate) struct ServeArgs {
    /// Directory to serve
    #[arg(value_name = "DIR", default_value = ".")]
    pub(crate) source: std::path::PathBuf,

    /// Host to serve from
    #[arg(long, value_name = "HOSTNAME_OR_IP", default_value = file_serve::DEFAULT_HOSTNAME)]
    pub(crate) host: String,

    /// Port to serve from
    #[arg(short = 'P', long, value_name = "NUM", default_value_t = file_serve::DEFAULT_PORT)]
    pub(crate) port: u16,

    /// Don't open a browser
    #[arg(long)]
    pub(crate) no_open: bool,
}

impl ServeArgs {
    pub(crate) fn run(&self) -> Result<()> {
        // Before any thread exists so every thread inherits the mask
        let interrupts = signal::Interrupts::block().context("failed to mask interrupts")?;

        let mut server = file_serve::ServerBuilder::new(&self.source);
        server.hostname(&self.host);
        server.port(self.port);
        let server = Arc::new(server.build()?);

        let closer = Arc::clone(&server);
        interrupts
            .on_interrupt(move |count| {
                if count == 1 {
                    log::debug!("Interrupted, closing the server");
                    closer.close();
                } else {
                    // the serve loop can be stuck writing to a client that stopped reading
                    log::warn!("Interrupted again, not waiting on open connections");
                    println!("{FAREWELL}");
                    proc_exit::Code::SUCCESS.process_exit();
                }
            })
            .context("failed to watch for interrupts")?;

        if !self.no_open {
            browser::open_later(server.url(), browser::DELAY);
        }

        serve(&server)?;

        println!("{FAREWELL}");
        Ok(())
    }
}

fn serve(server: &file_serve::Server) -> Result<()> {
    log::debug!(
        "Serving {} through static file server on {}",
        server.root().display(),
        server.addr()
    );
    println!("Serving {} at {}", server.root().display(), server.url());
    println!("Press Ctrl+C to stop");

    Ok(server.serve()?)
}
