use api_types::{BranchId, user::Role};
use serde::Serialize;

use crate::{
    backend::{Backend, Resource},
    error::{FormError, SubmitError, ValidationErrors},
    gateway::{self, Mode, Outcome},
    notice::Notice,
};

/// Identity of the person operating the forms.
///
/// Passed in explicitly; nothing is read from ambient state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub username: Option<String>,
    pub role: Option<Role>,
    /// Branch the operator is currently working in, used as a default.
    pub branch: Option<BranchId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// A form that submits to one backend collection.
pub trait Form {
    type Payload: Serialize + PartialEq;

    const RESOURCE: Resource;

    /// Runs every field rule; all failures are reported together.
    fn validate(&self, mode: Mode) -> Result<(), ValidationErrors>;

    /// Shapes the current values into what the backend expects.
    fn payload(&self, mode: Mode) -> Result<Self::Payload, FormError>;
}

/// Values, mode and submission state of one form.
#[derive(Debug)]
pub struct FormSession<F: Form> {
    form: F,
    mode: Mode,
    baseline: Option<F::Payload>,
    state: SubmissionState,
}

impl<F: Form> FormSession<F> {
    pub fn create(form: F) -> Self {
        Self {
            form,
            mode: Mode::Create,
            baseline: None,
            state: SubmissionState::Idle,
        }
    }

    /// Edits record `id`. `form` must hold the values of the record as just
    /// fetched: they become the baseline the edit is compared against.
    pub fn edit(id: i64, form: F) -> Self {
        let mode = Mode::Edit(id);
        let baseline = match form.payload(mode) {
            Ok(payload) => Some(payload),
            Err(err) => {
                tracing::debug!("record does not form a valid payload, every edit counts as a change: {err}");
                None
            }
        };
        Self {
            form,
            mode,
            baseline,
            state: SubmissionState::Idle,
        }
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut F {
        &mut self.form
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == SubmissionState::Submitting
    }

    /// Validates, shapes and submits the form, returning the notice to show.
    ///
    /// The submitting state is left on every path.
    pub async fn submit<B: Backend>(&mut self, backend: &B) -> Notice {
        self.state = SubmissionState::Submitting;
        let result = self.try_submit(backend).await;
        let (state, notice) = match result {
            Ok(Outcome::Unchanged) => (SubmissionState::Idle, outcome_notice(F::RESOURCE, Outcome::Unchanged)),
            Ok(outcome) => (SubmissionState::Succeeded, outcome_notice(F::RESOURCE, outcome)),
            Err(err) => (SubmissionState::Failed, error_notice(F::RESOURCE, self.mode, err)),
        };
        self.state = state;
        notice
    }

    async fn try_submit<B: Backend>(&mut self, backend: &B) -> Result<Outcome, SubmitError> {
        self.form.validate(self.mode)?;
        let payload = self.form.payload(self.mode)?;
        let outcome =
            gateway::submit(backend, F::RESOURCE, self.mode, &payload, self.baseline.as_ref())
                .await?;
        if outcome == Outcome::Updated {
            self.baseline = Some(payload);
        }
        Ok(outcome)
    }
}

fn outcome_notice(resource: Resource, outcome: Outcome) -> Notice {
    let label = resource.label();
    match outcome {
        Outcome::Created => Notice::success(
            format!("{label} Added!"),
            format!("The {} has been added successfully", label.to_lowercase()),
        ),
        Outcome::Updated => Notice::success(
            format!("{label} Updated!"),
            format!("The {} has been updated successfully", label.to_lowercase()),
        ),
        Outcome::Unchanged => {
            Notice::warning("No Changes", "No changes detected, update not required.")
        }
    }
}

/// Applies one value loaded from a record. A value the form cannot take is
/// left unselected: an unknown option becomes a warning notice, while a
/// disabled level already carries the error notice of its failed list.
pub(crate) fn restore_selection<T>(result: Result<T, FormError>, notices: &mut Vec<Notice>) {
    let Err(err) = result else {
        return;
    };
    tracing::warn!("loaded value not restored: {err}");
    if !matches!(err, FormError::Disabled { .. }) {
        notices.push(Notice::warning("Unavailable option", err.to_string()));
    }
}

/// Maps a failed submission to what the operator sees.
pub fn error_notice(resource: Resource, mode: Mode, err: SubmitError) -> Notice {
    let label = resource.label().to_lowercase();
    match err {
        SubmitError::Invalid(errors) => Notice::error("Validation failed", errors.messages()),
        SubmitError::Rejected {
            field: Some("name"),
            detail: Some(detail),
            ..
        } => Notice::error("Duplicate Name", detail),
        SubmitError::Rejected { detail, .. } => {
            let title = if mode.is_edit() {
                format!("Failed to update {label}")
            } else {
                format!("Failed to add {label}")
            };
            Notice::error(title, detail.unwrap_or_else(|| "Please try again".to_string()))
        }
        SubmitError::Backend(err) => Notice::error("Error", err.to_string()),
        SubmitError::Form(err) => Notice::error("Error", err.to_string()),
    }
}
