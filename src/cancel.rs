// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Agora Social Dynamics Suite ("The Agora") - Cooperative Cancellation

use std::sync::atomic::{AtomicU32, Ordering};

/// Cancellation requests past this count abort the process outright.
pub const CANCEL_ATTEMPTS_TO_ABORT: u32 = 4;

static CANCEL_ATTEMPTS: AtomicU32 = AtomicU32::new(0);

/// Record one cancellation request. Intended to be called from an external
/// signal handler; the step loop observes the counter between steps and
/// exits cleanly on the first request. A user hammering the request past
/// the abort threshold gets an immediate non-zero exit instead.
pub fn request_cancel() {
    let attempts = CANCEL_ATTEMPTS.fetch_add(1, Ordering::Relaxed) + 1;
    if attempts > CANCEL_ATTEMPTS_TO_ABORT {
        eprintln!("cancellation demanded {} times, aborting", attempts);
        std::process::exit(1);
    }
}

/// Whether at least one cancellation has been requested.
pub fn cancel_requested() -> bool {
    CANCEL_ATTEMPTS.load(Ordering::Relaxed) > 0
}

/// Clear the counter. Test support; a cancelled run does not resume.
pub fn reset() {
    CANCEL_ATTEMPTS.store(0, Ordering::Relaxed);
}
