//! Interactive prompts

use crate::shared::error::{JeraError, Result};
use inquire::{Confirm, InquireError, Select, Text};

fn cancelled(err: InquireError) -> JeraError {
    match err {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => JeraError::Cancelled,
        other => JeraError::config_error(format!("Prompt failed: {}", other)),
    }
}

/// Pick one entry of `options`. Esc and Ctrl-C end the command as cancelled.
pub fn select(message: &str, options: Vec<String>) -> Result<String> {
    if options.is_empty() {
        return Err(JeraError::config_error(format!(
            "Nothing to choose from: {}",
            message
        )));
    }
    Select::new(message, options)
        .with_help_message("↑↓ to move, enter to select, type to filter")
        .with_page_size(15)
        .prompt()
        .map_err(cancelled)
}

pub fn confirm(message: &str, default: bool) -> Result<bool> {
    Confirm::new(message)
        .with_default(default)
        .prompt()
        .map_err(cancelled)
}

/// Free text with a pre-filled default.
pub fn text(message: &str, default: Option<&str>) -> Result<String> {
    let mut prompt = Text::new(message);
    if let Some(default) = default {
        prompt = prompt.with_default(default);
    }
    let value = prompt.prompt().map_err(cancelled)?;
    Ok(value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_maps_to_cancelled() {
        assert!(matches!(
            cancelled(InquireError::OperationCanceled),
            JeraError::Cancelled
        ));
        assert!(matches!(
            cancelled(InquireError::OperationInterrupted),
            JeraError::Cancelled
        ));
        assert!(matches!(
            cancelled(InquireError::NotTTY),
            JeraError::ConfigError(_)
        ));
    }

    #[test]
    fn test_select_rejects_empty_options() {
        assert!(select("Pick a pod", Vec::new()).is_err());
    }
}
