use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::cache::Reference;
use crate::error::FormError;
use crate::form::availability::SlotStatus;
use crate::form::controller::{FormContext, FormController, FormSnapshot};
use crate::form::notification::Notification;
use crate::form::validation::{Field, FieldError};
use crate::models::branch::Branch;
use crate::models::queue::QueueCount;
use crate::models::timeslot::TimeSlot;
use crate::state::AppState;

/// Everything a client needs to render one form
#[derive(Debug, Serialize)]
pub struct FormView {
    pub id: Uuid,
    pub form: FormSnapshot,
    pub slots: Vec<SlotStatus>,
    pub branches: Reference<Arc<Vec<Branch>>>,
    pub counts: Reference<()>,
}

#[derive(Debug, Serialize)]
pub struct SubmitView {
    pub notification: Notification,
    pub form: FormView,
}

/// Reference lists as they stand right now; missing ones are fetched in the background.
struct References {
    branches: Reference<Arc<Vec<Branch>>>,
    counts: Reference<Arc<Vec<QueueCount>>>,
}

impl References {
    async fn current(state: &AppState) -> Self {
        state.references.revalidate();
        Self {
            branches: state.references.branches().await,
            counts: state.references.counts().await,
        }
    }

    fn branches(&self) -> Option<&[Branch]> {
        self.branches.loaded().map(|b| b.as_slice())
    }

    fn counts(&self) -> Option<&[QueueCount]> {
        self.counts.loaded().map(|c| c.as_slice())
    }
}

/// Runs `op` against the form with availability recomputed for its current
/// (branch, date) selection.
fn with_context<R>(
    state: &AppState,
    refs: &References,
    form: &mut FormController,
    op: impl FnOnce(&mut FormController, &FormContext<'_>) -> R,
) -> R {
    let availability = form.availability(&state.filter, refs.counts());
    let ctx = FormContext {
        now: state.now(),
        branches: refs.branches(),
        availability: Some(&availability),
        reference: state.reference_offset,
    };
    op(form, &ctx)
}

fn view(state: &AppState, refs: References, id: Uuid, form: &FormController) -> FormView {
    FormView {
        id,
        form: form.snapshot(),
        slots: form.availability(&state.filter, refs.counts()).slots(),
        branches: refs.branches,
        counts: refs.counts.map(drop),
    }
}

pub async fn open_form(state: &AppState) -> FormView {
    let (id, session) = state.sessions.open().await;
    info!("opened form {}", id);
    let refs = References::current(state).await;
    let form = session.lock().await;
    view(state, refs, id, &form)
}

pub async fn get_form(state: &AppState, id: Uuid) -> Result<FormView, FormError> {
    let session = state.session(id).await?;
    let refs = References::current(state).await;
    let form = session.lock().await;
    Ok(view(state, refs, id, &form))
}

pub async fn set_field(
    state: &AppState,
    id: Uuid,
    field: Field,
    value: String,
) -> Result<FormView, FormError> {
    let session = state.session(id).await?;
    let refs = References::current(state).await;
    let mut form = session.lock().await;

    with_context(state, &refs, &mut form, |form, ctx| {
        form.set_field(field, value, ctx)
    })?;
    Ok(view(state, refs, id, &form))
}

pub async fn blur(state: &AppState, id: Uuid, field: Field) -> Result<Option<FieldError>, FormError> {
    let session = state.session(id).await?;
    let refs = References::current(state).await;
    let mut form = session.lock().await;

    Ok(with_context(state, &refs, &mut form, |form, ctx| {
        form.blur(field, ctx)
    }))
}

pub async fn select_time(
    state: &AppState,
    id: Uuid,
    slot: Option<TimeSlot>,
) -> Result<FormView, FormError> {
    let session = state.session(id).await?;
    let refs = References::current(state).await;
    let mut form = session.lock().await;

    let availability = form.availability(&state.filter, refs.counts());
    form.select_time(slot, &availability)?;
    Ok(view(state, refs, id, &form))
}

/// Validates under the lock, releases it for the network call, then applies the
/// outcome. The form's own `submitting` flag turns away a second submit meanwhile.
///
/// The create call and its outcome run in their own task, so a client that hangs up
/// mid-request still gets its form reset or released.
pub async fn submit(state: &AppState, id: Uuid) -> Result<SubmitView, FormError> {
    let session = state.session(id).await?;
    let refs = References::current(state).await;

    let request = {
        let mut form = session.lock().await;
        with_context(state, &refs, &mut form, |form, ctx| form.begin_submit(ctx))?
    };

    info!("form {} submitting", id);
    let task = tokio::spawn({
        let references = Arc::clone(&state.references);
        let session = Arc::clone(&session);
        let branches = refs.branches.loaded().cloned();
        let now = state.now();
        let reference = state.reference_offset;

        async move {
            let outcome = references.api().create(&request).await;
            let saved = outcome.is_ok();

            let notification = {
                let mut form = session.lock().await;
                let ctx = FormContext {
                    now,
                    branches: branches.as_deref().map(|b| b.as_slice()),
                    availability: None,
                    reference,
                };
                form.finish_submit(&request, outcome, &ctx)
            };

            if saved {
                references.invalidate_counts().await;
            }
            notification
        }
    });

    let notification = match task.await {
        Ok(notification) => notification,
        Err(e) => {
            error!("submit task for form {} failed: {}", id, e);
            session.lock().await.abandon_submit();
            return Err(FormError::Interrupted(id.to_string()));
        }
    };

    // counts may have just been invalidated
    let refs = References::current(state).await;
    let form = session.lock().await;
    Ok(SubmitView {
        notification,
        form: view(state, refs, id, &form),
    })
}

pub async fn close_form(state: &AppState, id: Uuid) -> Result<(), FormError> {
    if state.sessions.close(&id).await {
        info!("closed form {}", id);
        Ok(())
    } else {
        Err(FormError::UnknownSession(id.to_string()))
    }
}
