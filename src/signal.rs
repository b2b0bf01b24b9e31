//! Flag-based shutdown wiring using `signal-hook`.
//!
//! SIGINT/SIGTERM set an atomic flag that the tail reader samples at its
//! loop boundaries. A second signal while the flag is already set exits
//! the process immediately with code 1, so a wedged reader can always be
//! interrupted.

use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;
use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Register termination signals and return the cancellation handle.
pub fn shutdown_flag() -> io::Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    for sig in TERM_SIGNALS {
        // Order matters: the conditional shutdown only fires when the
        // flag is already true, i.e. on the second signal.
        flag::register_conditional_shutdown(*sig, 1, Arc::clone(&stop))?;
        flag::register(*sig, Arc::clone(&stop))?;
    }
    Ok(stop)
}
