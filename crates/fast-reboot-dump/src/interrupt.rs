//! Run cancellation on SIGINT
//!
//! The artifact writes and the announcement loop are synchronous, so an
//! awaited `ctrl_c()` future cannot observe a signal that lands there. The
//! handler installed by [`Interrupt::sigint`] only sets a process-wide flag;
//! the run checks it between phases and between sent frames.
//!
//! # NIST Controls
//! - SI-11: Error Handling - Interrupted runs end with a distinct exit code

use crate::error::{DumpError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Set by the SIGINT handler; never cleared.
static SIGINT_RECEIVED: AtomicBool = AtomicBool::new(false);

/// How often [`Interrupt::triggered`] re-checks the flags
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(target_os = "linux")]
extern "C" fn on_sigint(_signal: libc::c_int) {
    SIGINT_RECEIVED.store(true, Ordering::SeqCst);
}

/// Cancellation flag shared by the pipeline and the announcer
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
    watch_sigint: bool,
}

impl Interrupt {
    /// A flag only set through [`Interrupt::trigger`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the process SIGINT handler and returns a flag that follows it.
    ///
    /// Once installed, SIGINT no longer terminates the process; callers must
    /// check the flag.
    #[cfg(target_os = "linux")]
    pub fn sigint() -> Result<Self> {
        use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

        let action = SigAction::new(
            SigHandler::Handler(on_sigint),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );
        // SAFETY: the handler performs a single atomic store, which is async-signal-safe.
        unsafe { sigaction(Signal::SIGINT, &action) }.map_err(std::io::Error::from)?;

        Ok(Self {
            flag: Arc::new(AtomicBool::new(false)),
            watch_sigint: true,
        })
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
            || (self.watch_sigint && SIGINT_RECEIVED.load(Ordering::SeqCst))
    }

    /// `Err(DumpError::Interrupted)` once the flag is set
    pub fn check(&self) -> Result<()> {
        if self.is_triggered() {
            return Err(DumpError::Interrupted);
        }
        Ok(())
    }

    /// Completes once the flag is set, for racing against awaited store calls
    pub async fn triggered(&self) {
        while !self.is_triggered() {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}
