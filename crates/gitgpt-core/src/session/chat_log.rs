//! Chat log - the persisted conversation transcript
//!
//! A `ChatLog` is value-like: `add_user_message` and `append` return a new log
//! and leave the receiver untouched. The whole log is stored as one
//! pretty-printed JSON array of messages.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, info};

use super::system_prompt::{SystemPrompt, USER_TIMESTAMP_FORMAT};
use super::types::{Message, TurnOutcome};
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatLog {
    messages: Vec<Message>,
}

impl ChatLog {
    /// Wrap an existing message sequence
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Start a new conversation seeded with exactly one system message
    pub fn bootstrap(prompt: &SystemPrompt, now: DateTime<Local>) -> Self {
        Self::from_messages(vec![Message::system(prompt.build(now))])
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Return the log extended by a user message prefixed by its send time
    #[must_use]
    pub fn add_user_message(self, text: &str, now: DateTime<Local>) -> Self {
        let stamped = format!("[{}]: {}", now.format(USER_TIMESTAMP_FORMAT), text);
        self.append(Message::user(stamped))
    }

    /// Return the log extended by `message`.
    ///
    /// Consumes the log and reuses its storage; clone first to keep the
    /// previous state around.
    #[must_use]
    pub fn append(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Load the log stored at `path`.
    ///
    /// Missing parent directories are created. A missing or empty file yields a
    /// freshly bootstrapped log; unparseable content is an error.
    pub async fn load(path: &Path, prompt: &SystemPrompt, now: DateTime<Local>) -> Result<Self> {
        ensure_parent_dir(path).await?;

        let data = match tokio::fs::read(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            debug!(path = %path.display(), "No chat log found, starting a new one");
            return Ok(Self::bootstrap(prompt, now));
        }

        let messages: Vec<Message> = serde_json::from_slice(&data)?;
        debug!(path = %path.display(), messages = messages.len(), "Loaded chat log");
        Ok(Self::from_messages(messages))
    }

    /// Write the full log to `path`, replacing any previous content.
    ///
    /// The JSON is written to a sibling temp file first and renamed over the
    /// target, so an interrupted save never leaves a truncated log behind.
    pub async fn save(&self, path: &Path) -> Result<()> {
        ensure_parent_dir(path).await?;

        let json = serde_json::to_vec_pretty(&self.messages)?;
        let tmp = temp_path(path);
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;

        info!(path = %path.display(), messages = self.messages.len(), "Saved chat log");
        Ok(())
    }

    /// End-of-turn persistence: a restart requested at any point in the turn
    /// deletes the stored log, otherwise the outcome's log replaces it.
    pub async fn persist_outcome(outcome: &TurnOutcome, path: &Path) -> Result<()> {
        if outcome.reset_requested {
            Self::delete(path).await
        } else {
            outcome.log.save(path).await
        }
    }

    /// Remove the log at `path`. A missing file or directory is not an error.
    pub async fn delete(path: &Path) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                info!(path = %path.display(), "Deleted chat log");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

async fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "chatlog.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::Role;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_add_user_message_prefixes_timestamp() {
        let log = ChatLog::default();
        let next = log.clone().add_user_message("hello", at(14, 5, 9));

        assert!(log.is_empty(), "original log must not change");
        assert_eq!(next.len(), 1);
        let msg = next.last().unwrap();
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "[2024-03-01T14:05:09]: hello");
    }

    #[test]
    fn test_append_leaves_receiver_untouched() {
        let base = ChatLog::from_messages(vec![Message::system("sys")]);
        let a = base.clone().append(Message::assistant("one", Vec::new()));
        let b = base.clone().append(Message::assistant("two", Vec::new()));

        assert_eq!(base.len(), 1);
        assert_eq!(a.last().unwrap().text(), "one");
        assert_eq!(b.last().unwrap().text(), "two");
    }

    #[test]
    fn test_append_reuses_storage() {
        let mut messages = Vec::with_capacity(8);
        messages.push(Message::system("sys"));
        let log = ChatLog::from_messages(messages);
        let storage = log.messages().as_ptr();

        let log = log
            .append(Message::user("one"))
            .append(Message::assistant("two", Vec::new()));

        assert_eq!(log.len(), 3);
        assert_eq!(log.messages().as_ptr(), storage);
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let tmp = temp_path(Path::new("/data/gitgpt/chatlog.json"));
        assert_eq!(tmp, PathBuf::from("/data/gitgpt/chatlog.json.tmp"));
    }
}
