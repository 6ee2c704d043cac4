//! Operator-facing notices.

/// Alert and confirmation dialogs shown to the operator.
pub trait Prompt: Send + Sync {
    fn alert(&self, message: &str);

    fn confirm(&self, message: &str) -> bool;
}
