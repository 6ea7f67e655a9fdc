//! Editor session: use-cases for building an automation step by step.
//!
//! The session owns the step tree and the variables of the automation being
//! edited. Every edit either applies completely or leaves both untouched.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use stepwise_domain::document::{AutomationData, AutomationDocument};
use stepwise_domain::error::{ConflictError, DomainError, NotFoundError};
use stepwise_domain::id::StepId;
use stepwise_domain::step::{PointerPosition, Step, StepKind, walk};
use stepwise_domain::time::{Timestamp, now};
use stepwise_domain::tree::StepTree;
use stepwise_domain::variable::Environment;
use tokio_util::sync::CancellationToken;

use crate::interpreter::{Interpreter, RunError};
use crate::ports::InputBackend;

/// Title given to automations saved without one.
pub const DEFAULT_TITLE: &str = "Untitled";

/// Application service holding the automation under edition.
pub struct EditorSession<B> {
    backend: B,
    steps: StepTree,
    variables: Environment,
    created_at: Option<Timestamp>,
}

impl<B: InputBackend + Sync> EditorSession<B> {
    /// Start an empty automation.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            steps: StepTree::new(),
            variables: Environment::new(),
            created_at: None,
        }
    }

    /// Resume editing a stored automation.
    pub fn from_document(backend: B, document: AutomationDocument) -> Self {
        Self {
            backend,
            steps: document.data.steps,
            variables: document.data.variables,
            created_at: Some(document.meta.created_at),
        }
    }

    pub fn steps(&self) -> &StepTree {
        &self.steps
    }

    pub fn variables(&self) -> &Environment {
        &self.variables
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// An id no step of the automation uses.
    pub fn next_id(&self) -> StepId {
        self.steps.next_id()
    }

    /// Append `step` (with any nested steps) to the top level or to the
    /// statement `parent`, then register the variables it declares.
    ///
    /// # Errors
    ///
    /// - [`ConflictError::StepIdTaken`] if an id is already in use
    /// - [`DomainError::NotFound`] / [`ConflictError::NotAContainer`] for a
    ///   bad `parent`
    /// - [`ConflictError::VariableOwned`] if a declared name belongs to
    ///   another step
    /// - [`ConflictError::PointerOutOfBounds`] for a `move` off the screen
    #[tracing::instrument(skip(self, step), fields(step_id = %step.id, kind = step.kind.type_name()))]
    pub async fn add_step(&mut self, step: Step, parent: Option<StepId>) -> Result<(), DomainError> {
        let mut incoming = HashSet::new();
        let mut owners: HashMap<String, StepId> = HashMap::new();
        for nested in walk(std::slice::from_ref(&step)) {
            if self.steps.contains(nested.id) || !incoming.insert(nested.id) {
                return Err(ConflictError::StepIdTaken(nested.id).into());
            }
            for name in nested.declared_names() {
                let owner = *owners.entry(name.to_lowercase()).or_insert(nested.id);
                if owner != nested.id {
                    return Err(ConflictError::VariableOwned {
                        name: name.to_string(),
                        owner,
                    }
                    .into());
                }
            }
        }
        if let Some(parent) = parent {
            let target = self
                .steps
                .find(parent)
                .ok_or_else(|| NotFoundError::step(parent))?;
            if !target.is_container() {
                return Err(ConflictError::NotAContainer(parent).into());
            }
        }
        for nested in walk(std::slice::from_ref(&step)) {
            self.check_declarations(nested)?;
            self.check_pointer(nested).await?;
        }

        let declared: Vec<Step> = walk(std::slice::from_ref(&step)).cloned().collect();
        let inserted = self.steps.insert(step, parent);
        debug_assert!(inserted, "parent was checked above");
        for nested in &declared {
            self.register(nested);
        }
        tracing::debug!("step added");
        Ok(())
    }

    /// Replace step `id` with `step`, keeping its position and id.
    ///
    /// When both versions are the same kind of statement, the nested steps
    /// are kept; otherwise the old nested steps are dropped along with
    /// their variables. Nested steps passed in `step` are ignored. Names
    /// declared by the old version only are removed.
    ///
    /// # Errors
    ///
    /// Same conflicts as [`add_step`](Self::add_step), plus
    /// [`DomainError::NotFound`] when `id` does not exist.
    #[tracing::instrument(skip(self, step), fields(kind = step.kind.type_name()))]
    pub async fn edit_step(&mut self, id: StepId, mut step: Step) -> Result<(), DomainError> {
        step.id = id;
        let old = self.steps.find(id).cloned().ok_or_else(|| NotFoundError::step(id))?;
        let carried = old.kind.same_container_as(&step.kind);
        if let Some(children) = step.children_mut() {
            *children = match old.children() {
                Some(old_children) if carried => old_children.to_vec(),
                _ => Vec::new(),
            };
        }
        self.check_declarations(&step)?;
        self.check_pointer(&step).await?;

        let kept: Vec<String> = step.declared_names().map(str::to_lowercase).collect();
        for name in old.declared_names() {
            if !kept.contains(&name.to_lowercase()) {
                self.delete_owned(name, id);
            }
        }
        if !carried {
            for child in old.children().map(walk).into_iter().flatten() {
                for name in child.declared_names() {
                    self.delete_owned(name, child.id);
                }
            }
        }

        self.register(&step);
        self.steps.replace(id, step);
        tracing::debug!("step edited");
        Ok(())
    }

    /// Delete step `id`, everything nested below it, and every variable
    /// those steps declare.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] when `id` does not exist.
    #[tracing::instrument(skip(self))]
    pub fn remove_step(&mut self, id: StepId) -> Result<Step, DomainError> {
        let deleted = self.variables.delete_by_owner_step(&self.steps, id);
        let removed = self.steps.remove(id).ok_or_else(|| NotFoundError::step(id))?;
        tracing::debug!(?deleted, "step removed");
        Ok(removed)
    }

    /// Move a step within the top level or within statement `container`.
    /// Returns `false` and changes nothing when an index is out of range.
    pub fn reorder(&mut self, source: usize, destination: usize, container: Option<StepId>) -> bool {
        self.steps.reorder(source, destination, container)
    }

    /// Remove every step of the top level, or of statement `from`, with the
    /// variables they declare.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] or [`ConflictError::NotAContainer`]
    /// for a bad `from`.
    #[tracing::instrument(skip(self))]
    pub fn clear(&mut self, from: Option<StepId>) -> Result<Vec<Step>, DomainError> {
        if let Some(id) = from {
            let target = self.steps.find(id).ok_or_else(|| NotFoundError::step(id))?;
            if !target.is_container() {
                return Err(ConflictError::NotAContainer(id).into());
            }
        }
        let removed = self.steps.clear(from).unwrap_or_default();
        for name in walk(&removed).flat_map(Step::declared_names) {
            self.variables.delete(name);
        }
        Ok(removed)
    }

    /// Build a `move` step targeting the current pointer position.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the position cannot be read.
    pub async fn capture_move_step(&self) -> Result<Step, DomainError> {
        let position = self.backend.get_pointer_position().await?;
        Ok(Step::new(
            self.next_id(),
            StepKind::Move {
                x: position.x,
                y: position.y,
            },
        ))
    }

    /// Run the automation on a copy of its variables.
    ///
    /// The session itself is never modified by a run; the variables as
    /// they stand at the end of a successful run are returned.
    ///
    /// # Errors
    ///
    /// Returns the [`RunError`] that aborted the run.
    pub async fn run(
        &self,
        step_delay: Duration,
        cancel: CancellationToken,
    ) -> Result<Environment, RunError> {
        let steps = self.steps.clone();
        let mut env = self.variables.clone();
        Interpreter::new(&self.backend)
            .with_step_delay(step_delay)
            .with_cancellation(cancel)
            .run(steps.steps(), &mut env)
            .await?;
        Ok(env)
    }

    /// Snapshot the automation as a document. A blank title becomes
    /// [`DEFAULT_TITLE`].
    pub fn to_document(&self, title: &str) -> AutomationDocument {
        let title = title.trim();
        let title = if title.is_empty() { DEFAULT_TITLE } else { title };
        AutomationDocument::new(
            title,
            self.created_at.unwrap_or_else(now),
            AutomationData {
                steps: self.steps.clone(),
                variables: self.variables.clone(),
            },
        )
    }

    fn check_declarations(&self, step: &Step) -> Result<(), DomainError> {
        for name in step.declared_names() {
            if let Some(existing) = self.variables.get(name)
                && existing.owner_id != step.id
            {
                return Err(ConflictError::VariableOwned {
                    name: name.to_string(),
                    owner: existing.owner_id,
                }
                .into());
            }
        }
        Ok(())
    }

    async fn check_pointer(&self, step: &Step) -> Result<(), DomainError> {
        if let StepKind::Move { x, y } = step.kind {
            let position = PointerPosition { x, y };
            if !self.backend.validate_pointer_position(position).await? {
                return Err(ConflictError::PointerOutOfBounds { x, y }.into());
            }
        }
        Ok(())
    }

    fn register(&mut self, step: &Step) {
        for (name, variable) in step.declarations() {
            self.variables.set(name, variable);
        }
    }

    fn delete_owned(&mut self, name: &str, owner: StepId) {
        if self
            .variables
            .get(name)
            .is_some_and(|variable| variable.owner_id == owner)
        {
            self.variables.delete(name);
        }
    }
}
