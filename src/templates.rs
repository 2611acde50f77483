use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

const MESSAGES_FILE_NAME: &str = "messages.json";
const SYSTEM_MESSAGE_FILE_NAME: &str = "system_message.txt";

/// Console strings shown around the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Messages {
    pub greeting: String,
    pub prompt: String,
    pub empty_input: String,
    pub exit: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    pub messages: Messages,
    pub system_message: String,
}

impl Templates {
    pub fn load(dir: &Path) -> Result<Self> {
        let messages_path = dir.join(MESSAGES_FILE_NAME);
        let raw = fs::read_to_string(&messages_path).with_context(|| {
            format!("Could not load messages file '{}'", messages_path.display())
        })?;
        let messages: Messages = serde_json::from_str(&raw).with_context(|| {
            format!("Could not parse messages file '{}'", messages_path.display())
        })?;

        let system_path = dir.join(SYSTEM_MESSAGE_FILE_NAME);
        let system_message = fs::read_to_string(&system_path).with_context(|| {
            format!("Could not load system message '{}'", system_path.display())
        })?;

        Ok(Self {
            messages,
            system_message,
        })
    }
}
