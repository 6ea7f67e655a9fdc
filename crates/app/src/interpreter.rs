//! Interpreter: runs a step sequence against an [`InputBackend`].
//!
//! Steps run strictly one after another, nested sequences included. Before
//! every step the interpreter waits for the configured inter-step delay;
//! that wait, `sleep` steps and every backend call are the only suspension
//! points. Cancellation is checked at each wait.
//!
//! Any error aborts the whole run: no sibling or enclosing step runs after
//! a failure.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use stepwise_domain::error::DomainError;
use stepwise_domain::id::StepId;
use stepwise_domain::step::{ConditionSide, KeyCombination, Step, StepKind};
use stepwise_domain::variable::{Environment, Variable, VariableKind, VariableValue};
use tokio_util::sync::CancellationToken;

use crate::ports::InputBackend;

/// Why a run stopped before the end.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("step {step}: variable `{name}` does not exist")]
    VariableNotFound { step: StepId, name: String },

    #[error("step {step}: variable `{name}` holds {found}, expected {expected}")]
    VariableType {
        step: StepId,
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("step {step}: input backend call failed")]
    Backend {
        step: StepId,
        #[source]
        source: DomainError,
    },

    #[error("run cancelled")]
    Cancelled,
}

impl RunError {
    /// The step that failed, if the run did not stop on cancellation.
    #[must_use]
    pub fn step(&self) -> Option<StepId> {
        match self {
            Self::VariableNotFound { step, .. }
            | Self::VariableType { step, .. }
            | Self::Backend { step, .. } => Some(*step),
            Self::Cancelled => None,
        }
    }
}

type RunFuture<'a> = Pin<Box<dyn Future<Output = Result<(), RunError>> + Send + 'a>>;

/// Sequential step runner.
pub struct Interpreter<'a, B> {
    backend: &'a B,
    step_delay: Duration,
    cancel: CancellationToken,
}

impl<'a, B> Interpreter<'a, B>
where
    B: InputBackend + Sync,
{
    /// Create an interpreter with no inter-step delay.
    pub fn new(backend: &'a B) -> Self {
        Self {
            backend,
            step_delay: Duration::ZERO,
            cancel: CancellationToken::new(),
        }
    }

    /// Wait `delay` before every step.
    #[must_use]
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Stop the run once `cancel` is triggered.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run `steps` in order, reading and writing variables in `env`.
    ///
    /// # Errors
    ///
    /// Returns the first [`RunError`] met; nothing runs after it.
    #[tracing::instrument(skip_all, fields(steps = steps.len(), delay = ?self.step_delay))]
    pub async fn run(&self, steps: &[Step], env: &mut Environment) -> Result<(), RunError> {
        let result = self.run_sequence(steps, env).await;
        match &result {
            Ok(()) => tracing::info!("automation finished"),
            Err(err) => tracing::warn!(error = %err, "automation aborted"),
        }
        result
    }

    fn run_sequence<'s>(&'s self, steps: &'s [Step], env: &'s mut Environment) -> RunFuture<'s> {
        Box::pin(async move {
            for step in steps {
                self.pause(self.step_delay).await?;
                self.run_step(step, env).await?;
            }
            Ok(())
        })
    }

    async fn run_step(&self, step: &Step, env: &mut Environment) -> Result<(), RunError> {
        tracing::debug!(step_id = %step.id, %step, "running step");
        let id = step.id;
        match &step.kind {
            StepKind::Move { x, y } => self
                .backend
                .move_pointer(*x, *y)
                .await
                .map_err(backend_error(id)),
            StepKind::Click { button } => {
                self.backend.click(*button).await.map_err(backend_error(id))
            }
            StepKind::PressKeyboard(combination) => self
                .backend
                .send_key_combination(combination, combination.use_unicode())
                .await
                .map_err(backend_error(id)),
            StepKind::Write { text, read_from } => {
                let text = if text.is_empty() {
                    read_text(env, id, read_from)?.to_string()
                } else {
                    text.clone()
                };
                self.type_text(id, &text).await
            }
            StepKind::ParseString {
                parse_string,
                read_from,
                divider,
                save_as,
            } => {
                let input = if parse_string.is_empty() {
                    read_text(env, id, read_from)?
                } else {
                    parse_string.as_str()
                };
                let pieces = split(input, divider);
                env.set(save_as, Variable::list(id, pieces));
                Ok(())
            }
            StepKind::Sleep { time } => self.pause(Duration::from_millis(*time)).await,
            StepKind::SetVariable { save_as, value } => {
                env.set(save_as, Variable::value(id, value.clone()));
                Ok(())
            }
            StepKind::DestructVariable {
                read_from,
                index,
                save_as,
            } => {
                let items = read_list(env, id, read_from)?;
                let element = usize::try_from(*index)
                    .ok()
                    .and_then(|index| items.get(index))
                    .cloned()
                    .unwrap_or(VariableValue::Null);
                env.set(
                    save_as,
                    Variable {
                        owner_id: id,
                        kind: VariableKind::Value,
                        value: element,
                    },
                );
                Ok(())
            }
            StepKind::Cycle {
                iterable,
                save_items_as,
                steps,
            } => {
                let items = read_list(env, id, iterable)?.to_vec();
                for item in items {
                    env.shadow(
                        save_items_as,
                        Variable {
                            owner_id: id,
                            kind: VariableKind::Value,
                            value: item,
                        },
                    );
                    let result = self.run_sequence(steps, env).await;
                    env.unshadow();
                    result?;
                }
                Ok(())
            }
            StepKind::Conditional { condition, steps } => {
                let left = resolve(env, id, &condition.left_side)?;
                let right = resolve(env, id, &condition.right_side)?;
                let holds = condition.operator.apply(&left, &right);
                tracing::debug!(step_id = %id, %condition, holds, "condition evaluated");
                if holds {
                    self.run_sequence(steps, env).await
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Send `text` one line at a time, pressing Enter between lines.
    async fn type_text(&self, id: StepId, text: &str) -> Result<(), RunError> {
        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                self.backend
                    .send_key_combination(&KeyCombination::enter(), false)
                    .await
                    .map_err(backend_error(id))?;
            }
            let line = line.trim_end_matches('\r');
            if !line.is_empty() {
                self.backend
                    .send_text(line)
                    .await
                    .map_err(backend_error(id))?;
            }
        }
        Ok(())
    }

    async fn pause(&self, duration: Duration) -> Result<(), RunError> {
        if self.cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }
        if duration.is_zero() {
            return Ok(());
        }
        tokio::select! {
            () = self.cancel.cancelled() => Err(RunError::Cancelled),
            () = tokio::time::sleep(duration) => Ok(()),
        }
    }
}

fn backend_error(step: StepId) -> impl FnOnce(DomainError) -> RunError {
    move |source| RunError::Backend { step, source }
}

fn lookup<'e>(env: &'e Environment, step: StepId, name: &str) -> Result<&'e Variable, RunError> {
    env.get(name).ok_or_else(|| RunError::VariableNotFound {
        step,
        name: name.to_string(),
    })
}

fn read_text<'e>(env: &'e Environment, step: StepId, name: &str) -> Result<&'e str, RunError> {
    let variable = lookup(env, step, name)?;
    variable.value.as_text().ok_or_else(|| RunError::VariableType {
        step,
        name: name.to_string(),
        expected: "text",
        found: variable.value.shape(),
    })
}

fn read_list<'e>(
    env: &'e Environment,
    step: StepId,
    name: &str,
) -> Result<&'e [VariableValue], RunError> {
    let variable = lookup(env, step, name)?;
    variable.value.as_list().ok_or_else(|| RunError::VariableType {
        step,
        name: name.to_string(),
        expected: "list",
        found: variable.value.shape(),
    })
}

fn resolve(env: &Environment, step: StepId, side: &ConditionSide) -> Result<VariableValue, RunError> {
    match side {
        ConditionSide::Value { value } => Ok(VariableValue::Text(value.clone())),
        ConditionSide::Variable { read_from } => Ok(lookup(env, step, read_from)?.value.clone()),
    }
}

/// Split on a literal divider. An empty divider splits into characters.
fn split(input: &str, divider: &str) -> Vec<String> {
    if divider.is_empty() {
        input.chars().map(String::from).collect()
    } else {
        input.split(divider).map(str::to_string).collect()
    }
}
