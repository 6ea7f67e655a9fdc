//! # stepwise-adapter-virtual
//!
//! Virtual input backend for dry runs and testing.
//!
//! Instead of driving the real desktop, the backend keeps a pointer on a
//! virtual screen and records every call it receives, in order.
//!
//! | Call | Behaviour |
//! |------|-----------|
//! | `move_pointer` | Moves the virtual pointer; fails outside the screen |
//! | `click` / `send_text` / `send_key_combination` | Recorded as a [`Dispatch`] |
//! | `get_pointer_position` | Returns the virtual pointer |
//! | `validate_pointer_position` | Checks the screen bounds |
//!
//! ## Dependency rule
//!
//! Depends on `stepwise-app` (port traits) and `stepwise-domain` only.

mod dispatch;
mod error;

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use stepwise_app::ports::InputBackend;
use stepwise_domain::error::DomainError;
use stepwise_domain::step::{KeyCombination, MouseButton, PointerPosition};

pub use dispatch::Dispatch;
pub use error::VirtualBackendError;

/// Size of the virtual screen, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Screen {
    pub width: u64,
    pub height: u64,
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl Screen {
    #[must_use]
    pub fn contains(self, position: PointerPosition) -> bool {
        position.x < self.width && position.y < self.height
    }
}

/// Simulated input-injection backend.
#[derive(Default)]
pub struct VirtualBackend {
    screen: Screen,
    pointer: Mutex<PointerPosition>,
    dispatches: Mutex<Vec<Dispatch>>,
    offline: AtomicBool,
}

impl VirtualBackend {
    /// Create a backend with the pointer in the top-left corner of `screen`.
    #[must_use]
    pub fn new(screen: Screen) -> Self {
        Self {
            screen,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Every call received so far, oldest first.
    #[must_use]
    pub fn dispatches(&self) -> Vec<Dispatch> {
        self.lock_dispatches().clone()
    }

    /// Make every following call fail (or succeed again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), VirtualBackendError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(VirtualBackendError::Offline);
        }
        Ok(())
    }

    fn record(&self, dispatch: Dispatch) {
        tracing::info!(%dispatch, "input dispatched");
        self.lock_dispatches().push(dispatch);
    }

    fn lock_dispatches(&self) -> std::sync::MutexGuard<'_, Vec<Dispatch>> {
        self.dispatches
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_pointer(&self) -> std::sync::MutexGuard<'_, PointerPosition> {
        self.pointer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl InputBackend for VirtualBackend {
    async fn move_pointer(&self, x: u64, y: u64) -> Result<(), DomainError> {
        self.ensure_online()?;
        let position = PointerPosition { x, y };
        if !self.screen.contains(position) {
            return Err(VirtualBackendError::OutOfBounds {
                x,
                y,
                width: self.screen.width,
                height: self.screen.height,
            }
            .into());
        }
        *self.lock_pointer() = position;
        self.record(Dispatch::Move { x, y });
        Ok(())
    }

    async fn click(&self, button: MouseButton) -> Result<(), DomainError> {
        self.ensure_online()?;
        self.record(Dispatch::Click(button));
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<(), DomainError> {
        self.ensure_online()?;
        self.record(Dispatch::Text(text.to_string()));
        Ok(())
    }

    async fn send_key_combination(
        &self,
        combination: &KeyCombination,
        use_unicode: bool,
    ) -> Result<(), DomainError> {
        self.ensure_online()?;
        self.record(Dispatch::Keys {
            combination: combination.clone(),
            use_unicode,
        });
        Ok(())
    }

    async fn get_pointer_position(&self) -> Result<PointerPosition, DomainError> {
        self.ensure_online()?;
        Ok(*self.lock_pointer())
    }

    async fn validate_pointer_position(
        &self,
        position: PointerPosition,
    ) -> Result<bool, DomainError> {
        Ok(self.screen.contains(position))
    }
}
