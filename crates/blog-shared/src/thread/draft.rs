#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("Comment cannot be empty")]
    Empty,
}

/// Checks a composer buffer before it is sent. The text is returned
/// unchanged; only whitespace-only input is refused.
pub fn validate_content(content: &str) -> Result<&str, DraftError> {
    if content.trim().is_empty() {
        return Err(DraftError::Empty);
    }
    Ok(content)
}
