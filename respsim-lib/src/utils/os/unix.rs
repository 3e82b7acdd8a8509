use rama::telemetry::tracing;

pub use libc::rlim_t;

/// Raise the soft limit of open file descriptors towards `target`,
/// bounded by the hard limit of the process.
///
/// Returns the soft limit in effect once done. A simulator used as load
/// target easily holds more connections open than the common default of 1024.
pub fn raise_nofile(target: rlim_t) -> std::io::Result<rlim_t> {
    let mut lim = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };

    // SAFETY: `lim` is a valid, writable rlimit struct for the duration of the call.
    if unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut lim) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    let wanted = target.min(lim.rlim_max);
    if lim.rlim_cur >= wanted {
        tracing::debug!(
            current = lim.rlim_cur,
            wanted,
            "nofile soft limit already sufficient"
        );
        return Ok(lim.rlim_cur);
    }

    let previous = lim.rlim_cur;
    lim.rlim_cur = wanted;

    // SAFETY: `lim` is initialised from getrlimit and only the soft limit changed.
    if unsafe { libc::setrlimit(libc::RLIMIT_NOFILE, &lim) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    tracing::info!(previous, applied = wanted, "raised nofile soft limit");
    Ok(wanted)
}
