/// How a worker process ended, with everything it printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitOutcome {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExitOutcome {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Last non-blank stderr line, the usual place for a Python traceback's
    /// actual error.
    pub fn last_stderr_line(&self) -> Option<&str> {
        self.stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
    }
}

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_stderr_line_skips_trailing_blanks() {
        let out = ExitOutcome {
            code: 1,
            stdout: String::new(),
            stderr: "Traceback (most recent call last):\n  File \"x.py\"\nValueError: boom\n\n".into(),
        };
        assert_eq!(out.last_stderr_line(), Some("ValueError: boom"));
        assert!(!out.success());
    }
}
