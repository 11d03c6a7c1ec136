use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::answers::{AnswerValue, Answers, Submission};
use crate::spec::{Catalog, Field};
use crate::validate::{answer_error, answer_is_valid};
use crate::visibility::project;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    InProgress,
    Complete,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Complete => "complete",
        }
    }
}

/// Serializable wizard position and answers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct SessionState {
    #[serde(default)]
    pub current_index: usize,
    #[serde(default)]
    pub answers: Answers,
    #[serde(default)]
    pub status: SessionStatus,
}

/// Result of [`Wizard::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Moved to the next visible question.
    Moved { index: usize },
    /// The current answer does not pass its validity check.
    Blocked,
    /// Past the last visible question; carries the sanitized payload.
    Complete(Submission),
}

/// Result of [`Wizard::retreat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retreat {
    Moved { index: usize },
    /// Already on the first question; the caller owns what comes before it.
    Exit,
}

/// Single-question-at-a-time controller over a fixed catalog.
#[derive(Debug, Clone)]
pub struct Wizard<'c> {
    catalog: &'c Catalog,
    state: SessionState,
}

impl<'c> Wizard<'c> {
    /// Starts a session with optional pre-filled answers.
    pub fn new(catalog: &'c Catalog, initial: Answers) -> Self {
        Self::resume(
            catalog,
            SessionState {
                answers: initial,
                ..SessionState::default()
            },
        )
    }

    /// Rebuilds a controller from serialized state, repairing stale answers and positions.
    pub fn resume(catalog: &'c Catalog, state: SessionState) -> Self {
        let mut wizard = Self { catalog, state };
        let before = wizard.state.current_index;
        wizard.reconcile();
        if wizard.state.current_index != before {
            warn!(
                from = before,
                to = wizard.state.current_index,
                "session index was outside the visible set"
            );
        }
        wizard
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn into_state(self) -> SessionState {
        self.state
    }

    pub fn answers(&self) -> &Answers {
        &self.state.answers
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status
    }

    pub fn is_complete(&self) -> bool {
        self.state.status == SessionStatus::Complete
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn visible(&self) -> Vec<&'c Field> {
        project(self.catalog, &self.state.answers)
    }

    /// Field under the cursor, or `None` when nothing is visible.
    pub fn current_field(&self) -> Option<&'c Field> {
        self.visible().get(self.state.current_index).copied()
    }

    pub fn can_proceed(&self) -> bool {
        match self.current_field() {
            Some(field) => answer_is_valid(field, self.state.answers.get(&field.key)),
            None => true,
        }
    }

    /// Why the current answer blocks `advance`, if it does.
    pub fn validation_message(&self) -> Option<String> {
        let field = self.current_field()?;
        answer_error(field, self.state.answers.get(&field.key))
    }

    pub fn set_answer(&mut self, key: &str, value: AnswerValue) {
        if self.catalog.field(key).is_none() {
            warn!(key, "answer for a key that is not in the catalog");
        }
        debug!(key, value = %value, "answer set");
        self.state.answers.insert(key.to_string(), value);
        self.reopen_if_complete();
        self.reconcile();
    }

    pub fn clear_answer(&mut self, key: &str) {
        if self.state.answers.remove(key).is_some() {
            debug!(key, "answer cleared");
            self.reopen_if_complete();
            self.reconcile();
        }
    }

    pub fn advance(&mut self) -> Advance {
        if self.is_complete() {
            return Advance::Complete(self.submission());
        }
        let visible_len = self.visible().len();
        if visible_len == 0 {
            debug!("no visible fields; completing with an empty payload");
            return self.complete();
        }
        if !self.can_proceed() {
            debug!(index = self.state.current_index, "advance blocked");
            return Advance::Blocked;
        }
        if self.state.current_index + 1 >= visible_len {
            return self.complete();
        }
        self.state.current_index += 1;
        debug!(index = self.state.current_index, "advanced");
        Advance::Moved {
            index: self.state.current_index,
        }
    }

    pub fn retreat(&mut self) -> Retreat {
        if self.is_complete() {
            let visible_len = self.visible().len();
            if visible_len == 0 {
                return Retreat::Exit;
            }
            self.state.status = SessionStatus::InProgress;
            self.state.current_index = visible_len - 1;
            debug!(index = self.state.current_index, "reopened completed session");
            return Retreat::Moved {
                index: self.state.current_index,
            };
        }
        if self.state.current_index == 0 {
            return Retreat::Exit;
        }
        self.state.current_index -= 1;
        debug!(index = self.state.current_index, "retreated");
        Retreat::Moved {
            index: self.state.current_index,
        }
    }

    /// Answers restricted to the fields visible right now.
    pub fn submission(&self) -> Submission {
        let visible: HashSet<&str> = self
            .visible()
            .into_iter()
            .map(|field| field.key.as_str())
            .collect();
        let answers = self
            .state
            .answers
            .iter()
            .filter(|(key, _)| visible.contains(key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Submission {
            template_id: self.catalog.id.clone(),
            answers,
        }
    }

    fn complete(&mut self) -> Advance {
        self.state.status = SessionStatus::Complete;
        let submission = self.submission();
        debug!(answers = submission.answers.len(), "wizard complete");
        Advance::Complete(submission)
    }

    fn reopen_if_complete(&mut self) {
        if self.is_complete() {
            debug!("answer changed after completion; session reopened");
            self.state.status = SessionStatus::InProgress;
        }
    }

    /// Drops answers of hidden conditional fields until the visible set is
    /// stable, then clamps the cursor into it.
    fn reconcile(&mut self) {
        loop {
            let visible = project(self.catalog, &self.state.answers);
            let visible_keys: HashSet<&str> =
                visible.iter().map(|field| field.key.as_str()).collect();
            let stale: Vec<String> = self
                .state
                .answers
                .keys()
                .filter(|key| {
                    !visible_keys.contains(key.as_str())
                        && self
                            .catalog
                            .field(key)
                            .is_some_and(Field::is_conditional)
                })
                .cloned()
                .collect();

            if stale.is_empty() {
                if self.state.current_index >= visible.len() {
                    self.state.current_index = visible.len().saturating_sub(1);
                }
                return;
            }

            for key in stale {
                debug!(key = %key, "pruned answer of hidden conditional field");
                self.state.answers.remove(&key);
            }
        }
    }
}
