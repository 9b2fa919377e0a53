//! Termination signals must reach the run-loop so the strip gets blanked.
//!
//! Lives in its own test binary: the handler can only be installed once per
//! process.

#![cfg(unix)]

use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use ledstrip_bridge::server::install_signal_handler;

fn send_signal(name: &str) {
    let status = Command::new("kill")
        .arg(format!("-{}", name))
        .arg(std::process::id().to_string())
        .status()
        .unwrap();
    assert!(status.success());
}

fn wait_for_stop(running: &AtomicBool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if !running.load(Ordering::Relaxed) {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn test_sigint_and_sigterm_stop_the_loop() {
    let running = Arc::new(AtomicBool::new(true));
    install_signal_handler(Arc::clone(&running)).unwrap();

    send_signal("INT");
    assert!(wait_for_stop(&running), "SIGINT did not clear the running flag");

    running.store(true, Ordering::Relaxed);
    send_signal("TERM");
    assert!(wait_for_stop(&running), "SIGTERM did not clear the running flag");
}
