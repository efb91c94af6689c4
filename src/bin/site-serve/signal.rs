//! Turn Ctrl+C into a graceful shutdown
//!
//! On Unix, SIGINT and SIGTERM are blocked for the whole process and picked up by a
//! dedicated thread with `sigwait`.  Elsewhere the platform's default Ctrl+C handling
//! applies.

pub(crate) use imp::Interrupts;

#[cfg(unix)]
mod imp {
    /// SIGINT and SIGTERM, blocked in the calling thread
    pub(crate) struct Interrupts {
        mask: libc::sigset_t,
    }

    impl Interrupts {
        /// Block interrupts in the calling thread
        ///
        /// Threads spawned afterwards inherit the mask, so call this before spawning any.
        pub(crate) fn block() -> std::io::Result<Self> {
            // SAFETY: `sigemptyset` initializes the set before anything reads it
            let mask = unsafe {
                let mut mask: libc::sigset_t = std::mem::zeroed();
                libc::sigemptyset(&mut mask);
                libc::sigaddset(&mut mask, libc::SIGINT);
                libc::sigaddset(&mut mask, libc::SIGTERM);
                mask
            };
            // SAFETY: `mask` is a valid, initialized set
            let rc = unsafe { libc::pthread_sigmask(libc::SIG_BLOCK, &mask, std::ptr::null_mut()) };
            if rc != 0 {
                return Err(std::io::Error::from_raw_os_error(rc));
            }
            Ok(Self { mask })
        }

        /// Run `handler` on every interrupt, with how many have been received so far
        pub(crate) fn on_interrupt<F>(self, mut handler: F) -> std::io::Result<()>
        where
            F: FnMut(usize) + Send + 'static,
        {
            std::thread::Builder::new()
                .name("interrupts".to_owned())
                .spawn(move || {
                    for count in 1.. {
                        let mut signal: libc::c_int = 0;
                        // SAFETY: `mask` is a valid, initialized set
                        let rc = unsafe { libc::sigwait(&self.mask, &mut signal) };
                        if rc != 0 {
                            log::error!(
                                "Failed to wait for interrupts: {}",
                                std::io::Error::from_raw_os_error(rc)
                            );
                            return;
                        }
                        log::trace!("Received signal {signal}");
                        handler(count);
                    }
                })?;
            Ok(())
        }
    }
}

#[cfg(not(unix))]
mod imp {
    pub(crate) struct Interrupts;

    impl Interrupts {
        pub(crate) fn block() -> std::io::Result<Self> {
            Ok(Self)
        }

        pub(crate) fn on_interrupt<F>(self, _handler: F) -> std::io::Result<()>
        where
            F: FnMut(usize) + Send + 'static,
        {
            log::debug!("Graceful shutdown is not supported on this platform");
            Ok(())
        }
    }
}
