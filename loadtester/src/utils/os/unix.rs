use rama::telemetry::tracing;

pub use libc::rlim_t;

/// Raise the soft `RLIMIT_NOFILE` of this process towards `target`,
/// capped by the hard limit. Every in flight request holds a socket.
pub fn raise_open_file_limit(target: rlim_t) -> std::io::Result<()> {
    use std::{io, mem};

    // SAFETY: `lim` is a plain C struct, fully written by `getrlimit`
    // before being read and passed back to `setrlimit`.
    unsafe {
        let mut lim: libc::rlimit = mem::zeroed();
        if libc::getrlimit(libc::RLIMIT_NOFILE, &mut lim) != 0 {
            return Err(io::Error::last_os_error());
        }

        let soft = target.min(lim.rlim_max);
        if lim.rlim_cur >= soft {
            tracing::debug!(
                current = %lim.rlim_cur,
                requested = %soft,
                "open file limit already sufficient",
            );
            return Ok(());
        }

        let previous = lim.rlim_cur;
        lim.rlim_cur = soft;
        if libc::setrlimit(libc::RLIMIT_NOFILE, &lim) != 0 {
            return Err(io::Error::last_os_error());
        }
        tracing::info!(%previous, current = %soft, "raised open file limit");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[tracing_test::traced_test]
    fn test_raise_open_file_limit_to_current_is_noop() {
        // asking for less than what we have never fails
        assert!(raise_open_file_limit(1).is_ok());
    }
}
