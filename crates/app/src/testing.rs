//! Hand-written fakes for the ports, shared by the unit tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use stepwise_domain::document::AutomationDocument;
use stepwise_domain::error::{ConflictError, DomainError};
use stepwise_domain::step::{KeyCombination, MouseButton, PointerPosition};

use crate::ports::{AutomationRepository, InputBackend, StoredAutomation};

// ── Spy backend ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Move(u64, u64),
    Click(MouseButton),
    Text(String),
    Keys(String, bool),
}

pub struct SpyBackend {
    pub calls: Mutex<Vec<Call>>,
    pub pointer: PointerPosition,
    pub screen: PointerPosition,
    pub fail_clicks: bool,
}

impl Default for SpyBackend {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            pointer: PointerPosition { x: 12, y: 34 },
            screen: PointerPosition { x: 800, y: 600 },
            fail_clicks: false,
        }
    }
}

impl SpyBackend {
    pub fn failing_clicks() -> Self {
        Self {
            fail_clicks: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl InputBackend for SpyBackend {
    fn move_pointer(&self, x: u64, y: u64) -> impl Future<Output = Result<(), DomainError>> + Send {
        self.record(Call::Move(x, y));
        async { Ok(()) }
    }

    fn click(&self, button: MouseButton) -> impl Future<Output = Result<(), DomainError>> + Send {
        let result = if self.fail_clicks {
            Err(DomainError::Backend("click rejected".into()))
        } else {
            self.record(Call::Click(button));
            Ok(())
        };
        async { result }
    }

    fn send_text(&self, text: &str) -> impl Future<Output = Result<(), DomainError>> + Send {
        self.record(Call::Text(text.to_string()));
        async { Ok(()) }
    }

    fn send_key_combination(
        &self,
        combination: &KeyCombination,
        use_unicode: bool,
    ) -> impl Future<Output = Result<(), DomainError>> + Send {
        self.record(Call::Keys(combination.to_string(), use_unicode));
        async { Ok(()) }
    }

    fn get_pointer_position(
        &self,
    ) -> impl Future<Output = Result<PointerPosition, DomainError>> + Send {
        let pointer = self.pointer;
        async move { Ok(pointer) }
    }

    fn validate_pointer_position(
        &self,
        position: PointerPosition,
    ) -> impl Future<Output = Result<bool, DomainError>> + Send {
        let valid = position.x < self.screen.x && position.y < self.screen.y;
        async move { Ok(valid) }
    }
}

// ── In-memory repo ────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryAutomationRepo {
    pub store: Mutex<HashMap<String, AutomationDocument>>,
}

impl AutomationRepository for InMemoryAutomationRepo {
    fn create(
        &self,
        document: &AutomationDocument,
    ) -> impl Future<Output = Result<StoredAutomation, DomainError>> + Send {
        let file_name = document.file_name();
        let mut store = self.store.lock().unwrap();
        let result = if store.contains_key(&file_name) {
            Err(ConflictError::FileExists { file_name }.into())
        } else {
            store.insert(file_name.clone(), document.clone());
            Ok(StoredAutomation {
                file_name,
                meta: document.meta.clone(),
            })
        };
        async { result }
    }

    fn get(
        &self,
        file_name: &str,
    ) -> impl Future<Output = Result<Option<AutomationDocument>, DomainError>> + Send {
        let result = self.store.lock().unwrap().get(file_name).cloned();
        async { Ok(result) }
    }

    fn list(&self) -> impl Future<Output = Result<Vec<StoredAutomation>, DomainError>> + Send {
        let store = self.store.lock().unwrap();
        let mut result: Vec<StoredAutomation> = store
            .iter()
            .map(|(file_name, document)| StoredAutomation {
                file_name: file_name.clone(),
                meta: document.meta.clone(),
            })
            .collect();
        result.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        async { Ok(result) }
    }

    fn delete(&self, file_name: &str) -> impl Future<Output = Result<(), DomainError>> + Send {
        self.store.lock().unwrap().remove(file_name);
        async { Ok(()) }
    }
}
