//! Reaping a child together with its own resource usage

use std::io;
use std::process::ExitStatus;
use tokio::process::Child;

/// Wait for `child` to exit and report its peak resident set size in KiB
///
/// The figure covers the child and every descendant it waited on (cargo's
/// rustc processes included), but nothing else the job ran.
#[cfg(unix)]
pub async fn wait_with_peak_rss(child: &mut Child) -> io::Result<(ExitStatus, Option<u64>)> {
    use std::os::unix::process::ExitStatusExt;

    let pid = match child.id() {
        Some(pid) => pid as libc::pid_t,
        // Already reaped
        None => return Ok((child.wait().await?, None)),
    };

    tokio::task::spawn_blocking(move || {
        let mut status: libc::c_int = 0;
        let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
        loop {
            let rc = unsafe { libc::wait4(pid, &mut status, 0, usage.as_mut_ptr()) };
            if rc != -1 {
                break;
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
        let usage = unsafe { usage.assume_init() };
        Ok((ExitStatus::from_raw(status), maxrss_kib(usage.ru_maxrss)))
    })
    .await
    .map_err(io::Error::other)?
}

#[cfg(not(unix))]
pub async fn wait_with_peak_rss(child: &mut Child) -> io::Result<(ExitStatus, Option<u64>)> {
    Ok((child.wait().await?, None))
}

#[cfg(unix)]
fn maxrss_kib(maxrss: libc::c_long) -> Option<u64> {
    let maxrss = u64::try_from(maxrss).ok()?;
    // macOS reports bytes, everything else KiB
    if cfg!(target_os = "macos") {
        Some(maxrss / 1024)
    } else {
        Some(maxrss)
    }
}
