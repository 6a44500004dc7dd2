/// Maps an exit status to a single integer; signal deaths become `128 + sig`.
pub fn normalize_exit(status: std::process::ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(code) = status.code() {
            code
        } else if let Some(sig) = status.signal() {
            128 + sig
        } else {
            1
        }
    }
    #[cfg(windows)]
    {
        status.code().unwrap_or(1)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    #[test]
    fn plain_exit_codes_pass_through() {
        assert_eq!(normalize_exit(std::process::ExitStatus::from_raw(0)), 0);
        assert_eq!(normalize_exit(std::process::ExitStatus::from_raw(2 << 8)), 2);
    }

    #[test]
    fn signals_are_offset() {
        // raw wait status 9 == killed by SIGKILL
        assert_eq!(normalize_exit(std::process::ExitStatus::from_raw(9)), 137);
    }
}
