//! System prompt management
//!
//! Builds the single system message that seeds a fresh chat log.

use chrono::{DateTime, Local};

/// Format of the timestamp prefixed to every user message
pub const USER_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Product label; the host name is appended to it
const PRODUCT_LABEL: &str = "CapGit";

/// System prompt configuration and generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPrompt {
    host: String,
    user: String,
}

impl SystemPrompt {
    /// Create a prompt for an explicit host and user
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
        }
    }

    /// Capture host and user names from the running environment
    pub fn from_environment() -> Self {
        let host = hostname::get()
            .ok()
            .map(|h| h.to_string_lossy().into_owned())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "localhost".to_string());
        let user = ["USER", "USERNAME", "LOGNAME"]
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| "unknown".to_string());
        Self::new(host, user)
    }

    /// Build the final system prompt for the given local time
    pub fn build(&self, now: DateTime<Local>) -> String {
        format!(
            "You are a user interface tool for Git called {label}-{host}. You can do a small amount of tasks related to Git.\n\
             The user is named {user}, and the current date is {date}, the time is {time}. \
             The messages from the user will start with the date and time in ISO 8601 format for when the message was sent.",
            label = PRODUCT_LABEL,
            host = self.host,
            user = self.user,
            date = now.format("%Y-%m-%d"),
            time = now.format("%H:%M"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_prompt_mentions_host_user_date_and_time() {
        let now = Local.with_ymd_and_hms(2024, 5, 17, 9, 41, 7).unwrap();
        let prompt = SystemPrompt::new("devbox", "ada").build(now);

        assert!(prompt.contains("CapGit-devbox"));
        assert!(prompt.contains("named ada"));
        assert!(prompt.contains("2024-05-17"));
        assert!(prompt.contains("09:41"));
        assert!(prompt.contains("ISO 8601"));
    }

    #[test]
    fn test_from_environment_is_never_blank() {
        let prompt = SystemPrompt::from_environment();
        assert!(!prompt.host.is_empty());
        assert!(!prompt.user.is_empty());
    }
}
