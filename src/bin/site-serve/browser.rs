use std::thread;
use std::time::Duration;

/// Head start given to the listener before the browser connects
pub(crate) const DELAY: Duration = Duration::from_secs(1);

/// Open `url` in the default browser after `delay`
///
/// The thread is detached and never joined, so it can't hold up shutdown.
pub(crate) fn open_later(url: String, delay: Duration) {
    spawn_opener(url, delay, |url| open::that(url));
}

fn spawn_opener<F>(url: String, delay: Duration, opener: F) -> Option<thread::JoinHandle<()>>
where
    F: FnOnce(&str) -> std::io::Result<()> + Send + 'static,
{
    let spawned = thread::Builder::new()
        .name("browser".to_owned())
        .spawn(move || {
            thread::sleep(delay);
            match opener(&url) {
                Ok(()) => log::info!("Please check your browser!"),
                Err(why) => log::warn!("Failed to open {url} in a browser: {why}"),
            }
        });
    match spawned {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::warn!("Failed to start the browser opener: {e}");
            None
        }
    }
}
