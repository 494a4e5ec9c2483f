//! User-facing output
//!
//! The bootstrapper never prints directly. It sends [`Message`]s to an
//! [`OutputSink`], which the CLI renders to the terminal and tests record
//! with [`MemorySink`].

use std::sync::Mutex;

/// Something to show the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A step whose own output is hidden; show a working indicator
    Working(String),
    /// A step whose output follows
    Step(String),
    /// The current step finished
    StepDone(String),
    /// A line from a child's stdout
    Stdout(String),
    /// A line from a child's stderr
    Stderr(String),
    Info(String),
    Success(String),
    Error(String),
    /// Remediation shown under an error
    Hint(String),
}

/// Destination for [`Message`]s
pub trait OutputSink: Send + Sync {
    fn write(&self, message: Message);
}

/// Records messages in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Mutex<Vec<Message>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// True if any message equals `message`
    pub fn contains(&self, message: &Message) -> bool {
        self.messages().iter().any(|m| m == message)
    }
}

impl OutputSink for MemorySink {
    fn write(&self, message: Message) {
        match self.messages.lock() {
            Ok(mut messages) => messages.push(message),
            Err(poisoned) => poisoned.into_inner().push(message),
        }
    }
}
