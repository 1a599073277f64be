// Signal delivery for child processes
// reason: nix maps KillSignal onto POSIX signals; other targets only have a hard kill
use tokio::process::Child;
use tracing::warn;

use imobile_core::port::KillSignal;

#[cfg(unix)]
fn to_nix(signal: KillSignal) -> nix::sys::signal::Signal {
    use nix::sys::signal::Signal;
    match signal {
        KillSignal::Term => Signal::SIGTERM,
        KillSignal::Kill => Signal::SIGKILL,
        KillSignal::Int => Signal::SIGINT,
        KillSignal::Hup => Signal::SIGHUP,
        KillSignal::Quit => Signal::SIGQUIT,
    }
}

/// Send `signal` to a still-running child without waiting for it
#[cfg(unix)]
pub(crate) fn send_signal(child: &mut Child, signal: KillSignal) {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    // Reaped children have no pid; nothing to signal
    let Some(pid) = child.id() else {
        return;
    };
    if let Err(e) = kill(Pid::from_raw(pid as i32), to_nix(signal)) {
        warn!(pid = pid, signal = %signal, error = %e, "Failed to signal process");
    }
}

#[cfg(not(unix))]
pub(crate) fn send_signal(child: &mut Child, signal: KillSignal) {
    if let Err(e) = child.start_kill() {
        warn!(pid = ?child.id(), signal = %signal, error = %e, "Failed to kill process");
    }
}
