//! Input backend port: the only point of contact with OS automation.

use std::future::Future;

use stepwise_domain::error::DomainError;
use stepwise_domain::step::{KeyCombination, MouseButton, PointerPosition};

/// Injects pointer and keyboard input into the desktop session.
///
/// Every call completes before the interpreter issues the next one.
pub trait InputBackend {
    /// Move the pointer to an absolute screen position.
    fn move_pointer(&self, x: u64, y: u64) -> impl Future<Output = Result<(), DomainError>> + Send;

    /// Click `button` at the current pointer position.
    fn click(&self, button: MouseButton) -> impl Future<Output = Result<(), DomainError>> + Send;

    /// Type a single line of text.
    fn send_text(&self, text: &str) -> impl Future<Output = Result<(), DomainError>> + Send;

    /// Press a key with its modifiers. With `use_unicode`, the key is sent
    /// through the character of its name instead of its key code.
    fn send_key_combination(
        &self,
        combination: &KeyCombination,
        use_unicode: bool,
    ) -> impl Future<Output = Result<(), DomainError>> + Send;

    /// Current pointer position.
    fn get_pointer_position(
        &self,
    ) -> impl Future<Output = Result<PointerPosition, DomainError>> + Send;

    /// Whether `position` lies on the screen.
    fn validate_pointer_position(
        &self,
        position: PointerPosition,
    ) -> impl Future<Output = Result<bool, DomainError>> + Send;
}
