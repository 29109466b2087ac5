//! Safari automation through `osascript` (macOS only at runtime).

use super::prober::{AutomationError, BrowserAutomation};
use std::process::Command;

const OSASCRIPT: &str = "/usr/bin/osascript";
/// Returned by the front-URL script when Safari has no window.
pub const NO_WINDOW_SENTINEL: &str = "NO_WINDOW";

const FRONT_URL_SCRIPT: &str = r#"tell application "Safari"
    if not (exists front window) then
        return "NO_WINDOW"
    end if
    set theURL to URL of current tab of front window
    return theURL
end tell"#;

#[derive(Debug, Clone, Default)]
pub struct SafariAutomation;

impl SafariAutomation {
    pub fn new() -> Self {
        Self
    }

    fn run(script: &str) -> Result<String, AutomationError> {
        let output = Command::new(OSASCRIPT).arg("-e").arg(script).output()?;

        if !output.status.success() {
            return Err(AutomationError::Failed {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl BrowserAutomation for SafariAutomation {
    fn front_url(&self) -> Result<Option<String>, AutomationError> {
        let stdout = Self::run(FRONT_URL_SCRIPT)?;
        Ok(parse_front_url(&stdout))
    }

    fn open_tabs(&self, urls: &[String]) -> Result<(), AutomationError> {
        if urls.is_empty() {
            return Ok(());
        }
        Self::run(&open_tabs_script(urls)).map(|_| ())
    }
}

/// Maps raw script output to a URL; the sentinel and blank output mean "no window".
pub fn parse_front_url(stdout: &str) -> Option<String> {
    let url = stdout.trim();
    if url.is_empty() || url == NO_WINDOW_SENTINEL {
        None
    } else {
        Some(url.to_string())
    }
}

/// Script opening each URL in a new tab of the front window, then raising Safari.
pub fn open_tabs_script(urls: &[String]) -> String {
    let url_list = urls
        .iter()
        .map(|u| format!("\"{}\"", escape_applescript(u)))
        .collect::<Vec<_>>()
        .join(",");

    format!(
        r#"set theURLs to {{{url_list}}}

tell application "Safari"
    if not (exists document 1) then
        make new document
    end if
    tell window 1
        repeat with u in theURLs
            make new tab with properties {{URL:u}}
        end repeat
    end tell
    activate
end tell

delay 0.1

tell application "System Events"
    tell process "Safari"
        set frontmost to true
        perform action "AXRaise" of window 1
    end tell
end tell"#
    )
}

fn escape_applescript(input: &str) -> String {
    input.replace('\\', "\\\\").replace('"', "\\\"")
}
