//! Window-title polling: confirm the launched editor actually opened before
//! typing into it.

use std::time::{Duration, Instant};

use regex::Regex;

use crate::errors::{PostpadError, PostpadResult};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Compile the configured title pattern.
pub fn title_pattern(pattern: &str) -> PostpadResult<Regex> {
    Regex::new(pattern)
        .map_err(|e| PostpadError::Config(format!("window title pattern: {e}")))
}

fn any_window_matches(pattern: &Regex) -> bool {
    let windows = match xcap::Window::all() {
        Ok(w) => w,
        Err(e) => {
            tracing::warn!(error = %e, "window enumeration failed");
            return false;
        }
    };

    for window in windows {
        let title = match window.title() {
            Ok(t) => t,
            Err(_) => continue,
        };
        if pattern.is_match(&title) {
            tracing::info!(title = %title, "editor window detected");
            return true;
        }
    }
    false
}

/// Poll window titles until one matches or the timeout elapses. Returns
/// whether a matching window appeared; enumeration errors are logged and
/// treated as "not yet".
pub fn wait_for_window(pattern: &Regex, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if any_window_matches(pattern) {
            // Small grace period for the window to finish initializing.
            std::thread::sleep(POLL_INTERVAL);
            return true;
        }
        std::thread::sleep(POLL_INTERVAL);
    }
    tracing::warn!(timeout_secs = timeout.as_secs(), "editor window not detected");
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pattern_matches_editor_titles() {
        let re = title_pattern("- Notepad$|^Notepad$").unwrap();
        assert!(re.is_match("Untitled - Notepad"));
        assert!(re.is_match("post_3.txt - Notepad"));
        assert!(re.is_match("Notepad"));
        assert!(!re.is_match("Notepad++"));
        assert!(!re.is_match("File Explorer"));
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        assert!(matches!(
            title_pattern("("),
            Err(PostpadError::Config(_))
        ));
    }
}
