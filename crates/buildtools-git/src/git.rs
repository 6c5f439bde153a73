#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("git CLI not found, install git and make sure it is on PATH")]
    NotFound { source: std::io::Error },

    #[error("git {} failed: {}", args.join(" "), summarize(stderr))]
    CommandFailed { args: Vec<String>, stderr: String },

    #[error("git output was not valid UTF-8")]
    InvalidUtf8 { source: std::string::FromUtf8Error },
}

/// Collapse git's stderr to one line.
///
/// Keeps the `fatal:`, `error:` and `! [...]` lines when there are any,
/// otherwise every non-empty line, joined with `; `.
pub(crate) fn summarize(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();
    let significant: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|l| {
            let l = l.strip_prefix("remote:").map(str::trim_start).unwrap_or(*l);
            l.starts_with("fatal:") || l.starts_with("error:") || l.starts_with("! [")
        })
        .collect();

    if significant.is_empty() {
        lines.join("; ")
    } else {
        significant.join("; ")
    }
}
