//! Rule chain editor session.
//!
//! Owns one variable's chain while it is being edited and drives the
//! `Idle -> Loading -> Editing -> Saving -> Idle` lifecycle. Loads and saves
//! are split into `begin_*` / `finish_*` halves so callers that run the I/O
//! themselves get the same guards as [`ChainEditorSession::open`] and
//! [`ChainEditorSession::save`]:
//!
//! - every load carries a token; a response whose token is no longer current
//!   is discarded instead of overwriting newer edits;
//! - only one save may be in flight, a second one is rejected;
//! - a failed save returns to `Editing` with the chain untouched.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::CoreError;
use crate::types::DbId;
use crate::variable::VariableDraft;

use super::chain::{RuleChain, ValidationRecord};
use super::compiler::{compile_with, CompiledValidation};
use super::gateway::{GatewayError, ValidationGateway};
use super::methods::{CatalogCache, MethodCatalog, ValidationMethod};
use super::observer::{TracingObserver, ValidationObserver};

/// Buffer size of the session event channel.
const EVENT_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// State and events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No chain loaded.
    Idle,
    Loading,
    Editing,
    Saving,
    /// A load failed. Only a new `open` leaves this state.
    Error,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Editing => "editing",
            Self::Saving => "saving",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the session is editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTarget {
    /// The chain of a variable that already exists.
    Existing(DbId),
    /// A variable that will be created together with its chain on save.
    New(VariableDraft),
}

impl SessionTarget {
    pub fn variable_id(&self) -> Option<DbId> {
        match self {
            Self::Existing(id) => Some(*id),
            Self::New(_) => None,
        }
    }
}

/// Notifications delivered through [`ChainEditorSession::subscribe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Loaded { variable_id: Option<DbId> },
    LoadFailed { message: String },
    PreviewUpdated(CompiledValidation),
    Saved { variable_id: DbId },
    SaveFailed { message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Validation method catalog unavailable: {0}")]
    CatalogUnavailable(GatewayError),

    #[error(transparent)]
    Persistence(GatewayError),

    #[error("Cannot {operation} while the session is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    #[error("A save is already in progress")]
    SaveInProgress,

    #[error(transparent)]
    Invalid(#[from] CoreError),
}

/// Outcome of [`ChainEditorSession::finish_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The session is now editing the loaded chain.
    Ready,
    /// The response belonged to a superseded load and was dropped.
    Stale,
}

/// Handle for one in-flight load.
#[derive(Debug)]
pub struct LoadTicket {
    token: u64,
    target: SessionTarget,
}

impl LoadTicket {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn target(&self) -> &SessionTarget {
        &self.target
    }
}

/// Handle for the in-flight save, carrying the payload to send.
#[derive(Debug)]
pub struct SaveTicket {
    target: SessionTarget,
    record: ValidationRecord,
}

impl SaveTicket {
    pub fn target(&self) -> &SessionTarget {
        &self.target
    }

    pub fn record(&self) -> &ValidationRecord {
        &self.record
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Editing session for one variable's rule chain.
pub struct ChainEditorSession<G> {
    gateway: Arc<G>,
    catalog_cache: Arc<CatalogCache>,
    observer: Arc<dyn ValidationObserver>,
    events: broadcast::Sender<SessionEvent>,
    state: SessionState,
    target: Option<SessionTarget>,
    catalog: Option<Arc<MethodCatalog>>,
    chain: RuleChain,
    preview: CompiledValidation,
    load_token: u64,
    last_error: Option<SessionError>,
}

impl<G: ValidationGateway> ChainEditorSession<G> {
    pub fn new(gateway: Arc<G>, catalog_cache: Arc<CatalogCache>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            gateway,
            catalog_cache,
            observer: Arc::new(TracingObserver),
            events,
            state: SessionState::Idle,
            target: None,
            catalog: None,
            chain: RuleChain::new(),
            preview: CompiledValidation::default(),
            load_token: 0,
            last_error: None,
        }
    }

    /// Replace the diagnostics observer used for previews.
    pub fn with_observer(mut self, observer: Arc<dyn ValidationObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn target(&self) -> Option<&SessionTarget> {
        self.target.as_ref()
    }

    pub fn chain(&self) -> &RuleChain {
        &self.chain
    }

    /// The most recent compiled preview.
    ///
    /// Kept across failed loads and closes so a screen can keep showing it
    /// as stale; replaced on every successful load or edit.
    pub fn preview(&self) -> &CompiledValidation {
        &self.preview
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    /// Methods available for selection. Empty when no catalog is loaded.
    pub fn method_options(&self) -> &[ValidationMethod] {
        self.catalog
            .as_deref()
            .map(MethodCatalog::list_methods)
            .unwrap_or_default()
    }

    // -- Loading --------------------------------------------------------------

    /// Load the catalog and the target's chain, then start editing.
    ///
    /// Both fetches run concurrently; the catalog comes from the shared cache
    /// when it has already been fetched.
    pub async fn open(&mut self, target: SessionTarget) -> Result<LoadOutcome, SessionError> {
        let ticket = self.begin_load(target)?;
        let variable_id = ticket.target.variable_id();

        let gateway = Arc::clone(&self.gateway);
        let cache = Arc::clone(&self.catalog_cache);
        let catalog_fut = cache.get_or_fetch(|| gateway.fetch_method_catalog());
        let chain_fut = async {
            match variable_id {
                Some(id) => gateway.fetch_variable_validation(id).await,
                None => Ok(None),
            }
        };
        let (catalog, chain) = tokio::join!(catalog_fut, chain_fut);

        self.finish_load(ticket, catalog, chain)
    }

    /// Enter `Loading` and issue a ticket for the responses.
    pub fn begin_load(&mut self, target: SessionTarget) -> Result<LoadTicket, SessionError> {
        match self.state {
            SessionState::Idle | SessionState::Error => {}
            state => {
                return Err(SessionError::InvalidState {
                    operation: "open",
                    state,
                })
            }
        }
        self.load_token += 1;
        self.state = SessionState::Loading;
        tracing::debug!(token = self.load_token, variable_id = ?target.variable_id(), "Loading rule chain");
        Ok(LoadTicket {
            token: self.load_token,
            target,
        })
    }

    /// Apply the responses of a load started with [`begin_load`](Self::begin_load).
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        catalog: Result<Arc<MethodCatalog>, GatewayError>,
        chain: Result<Option<ValidationRecord>, GatewayError>,
    ) -> Result<LoadOutcome, SessionError> {
        if ticket.token != self.load_token || self.state != SessionState::Loading {
            tracing::debug!(
                token = ticket.token,
                current = self.load_token,
                state = %self.state,
                "Discarding stale rule chain load"
            );
            return Ok(LoadOutcome::Stale);
        }

        let catalog = match catalog {
            Ok(catalog) => catalog,
            Err(err) => {
                return Err(self.fail_load(|| SessionError::CatalogUnavailable(err.clone())));
            }
        };
        let record = match chain {
            Ok(record) => record,
            Err(err) => return Err(self.fail_load(|| SessionError::Persistence(err.clone()))),
        };

        let variable_id = ticket.target.variable_id();
        self.chain = record.map(RuleChain::from_record).unwrap_or_default();
        self.catalog = Some(catalog);
        self.target = Some(ticket.target);
        self.last_error = None;
        self.state = SessionState::Editing;
        self.recompile();

        tracing::info!(?variable_id, entries = self.chain.len(), "Rule chain loaded");
        self.publish(SessionEvent::Loaded { variable_id });
        Ok(LoadOutcome::Ready)
    }

    /// Enter `Error`. No method options are offered until a load succeeds.
    fn fail_load(&mut self, make: impl Fn() -> SessionError) -> SessionError {
        let err = make();
        tracing::warn!(error = %err, "Rule chain load failed");
        self.state = SessionState::Error;
        self.catalog = None;
        self.last_error = Some(make());
        self.publish(SessionEvent::LoadFailed {
            message: err.to_string(),
        });
        err
    }

    // -- Editing --------------------------------------------------------------

    pub fn add_entry(&mut self) -> Result<&CompiledValidation, SessionError> {
        self.edit("add an entry", |chain| {
            chain.add_entry();
            Ok(())
        })
    }

    pub fn remove_entry(&mut self, index: usize) -> Result<&CompiledValidation, SessionError> {
        self.edit("remove an entry", |chain| chain.remove_entry(index))
    }

    pub fn select_method(
        &mut self,
        index: usize,
        method_id: DbId,
    ) -> Result<&CompiledValidation, SessionError> {
        self.edit("select a method", |chain| chain.select_method(index, method_id))
    }

    pub fn set_value(
        &mut self,
        index: usize,
        value: impl Into<String>,
    ) -> Result<&CompiledValidation, SessionError> {
        let value = value.into();
        self.edit("set a value", |chain| chain.set_value(index, value))
    }

    pub fn move_up(&mut self, index: usize) -> Result<&CompiledValidation, SessionError> {
        self.edit("reorder entries", |chain| chain.move_up(index))
    }

    pub fn move_down(&mut self, index: usize) -> Result<&CompiledValidation, SessionError> {
        self.edit("reorder entries", |chain| chain.move_down(index))
    }

    pub fn set_error_message(
        &mut self,
        text: impl Into<String>,
    ) -> Result<&CompiledValidation, SessionError> {
        let text = text.into();
        self.edit("set the error message", |chain| {
            chain.set_error_message(text);
            Ok(())
        })
    }

    /// Apply one chain mutation and recompile the preview.
    fn edit<F>(&mut self, operation: &'static str, f: F) -> Result<&CompiledValidation, SessionError>
    where
        F: FnOnce(&mut RuleChain) -> Result<(), CoreError>,
    {
        if self.state != SessionState::Editing {
            return Err(SessionError::InvalidState {
                operation,
                state: self.state,
            });
        }
        f(&mut self.chain)?;
        Ok(self.recompile())
    }

    fn recompile(&mut self) -> &CompiledValidation {
        self.preview = match self.catalog.as_deref() {
            Some(catalog) => compile_with(&self.chain, catalog, self.observer.as_ref()),
            None => compile_with(&self.chain, &MethodCatalog::default(), self.observer.as_ref()),
        };
        self.publish(SessionEvent::PreviewUpdated(self.preview.clone()));
        &self.preview
    }

    // -- Saving ---------------------------------------------------------------

    /// Send the current chain to the backend.
    ///
    /// Returns the id of the saved (or newly created) variable. Dropping the
    /// future before the backend answers returns the session to `Editing`
    /// with the chain untouched.
    pub async fn save(&mut self) -> Result<DbId, SessionError> {
        let ticket = self.begin_save()?;
        let guard = SaveGuard {
            state: &mut self.state,
            armed: true,
        };
        let result = match &ticket.target {
            SessionTarget::Existing(id) => self
                .gateway
                .save_variable_validation(*id, &ticket.record)
                .await
                .map(|()| *id),
            SessionTarget::New(draft) => self
                .gateway
                .create_variable_with_validation(draft, &ticket.record)
                .await
                .map(|variable| variable.id),
        };
        guard.disarm();
        self.finish_save(ticket, result)
    }

    /// Enter `Saving` and snapshot the payload.
    pub fn begin_save(&mut self) -> Result<SaveTicket, SessionError> {
        match self.state {
            SessionState::Editing => {}
            SessionState::Saving => return Err(SessionError::SaveInProgress),
            state => {
                return Err(SessionError::InvalidState {
                    operation: "save",
                    state,
                })
            }
        }
        let Some(target) = self.target.clone() else {
            return Err(SessionError::InvalidState {
                operation: "save",
                state: self.state,
            });
        };
        if let SessionTarget::New(draft) = &target {
            draft.ensure_valid()?;
        }

        self.state = SessionState::Saving;
        Ok(SaveTicket {
            target,
            record: self.chain.to_record(),
        })
    }

    /// Apply the backend's answer to a save started with
    /// [`begin_save`](Self::begin_save).
    pub fn finish_save(
        &mut self,
        ticket: SaveTicket,
        result: Result<DbId, GatewayError>,
    ) -> Result<DbId, SessionError> {
        if self.state != SessionState::Saving {
            return Err(SessionError::InvalidState {
                operation: "finish a save",
                state: self.state,
            });
        }

        match result {
            Ok(variable_id) => {
                tracing::info!(
                    variable_id,
                    entries = ticket.record.entries.len(),
                    "Rule chain saved"
                );
                self.reset();
                self.publish(SessionEvent::Saved { variable_id });
                Ok(variable_id)
            }
            Err(err) => {
                tracing::warn!(
                    variable_id = ?ticket.target.variable_id(),
                    error = %err,
                    "Rule chain save failed, keeping edits"
                );
                self.state = SessionState::Editing;
                self.last_error = Some(SessionError::Persistence(err.clone()));
                self.publish(SessionEvent::SaveFailed {
                    message: err.to_string(),
                });
                Err(SessionError::Persistence(err))
            }
        }
    }

    /// Abandon a save started with [`begin_save`](Self::begin_save) whose
    /// answer will never be applied. The edits are kept.
    pub fn cancel_save(&mut self, ticket: SaveTicket) -> Result<(), SessionError> {
        if self.state != SessionState::Saving {
            return Err(SessionError::InvalidState {
                operation: "cancel a save",
                state: self.state,
            });
        }
        tracing::info!(
            variable_id = ?ticket.target.variable_id(),
            "Rule chain save cancelled, keeping edits"
        );
        self.state = SessionState::Editing;
        Ok(())
    }

    // -- Closing --------------------------------------------------------------

    /// Abandon the session without saving.
    ///
    /// Any load still in flight is invalidated. Not allowed while saving.
    pub fn close(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Saving {
            return Err(SessionError::InvalidState {
                operation: "close",
                state: self.state,
            });
        }
        self.load_token += 1;
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.target = None;
        self.chain = RuleChain::new();
        self.last_error = None;
    }

    fn publish(&self, event: SessionEvent) {
        // Err only means nobody is subscribed.
        let _ = self.events.send(event);
    }
}

/// Puts a session back into `Editing` when a [`ChainEditorSession::save`]
/// future is dropped mid-flight.
struct SaveGuard<'a> {
    state: &'a mut SessionState,
    armed: bool,
}

impl SaveGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        if self.armed && *self.state == SessionState::Saving {
            tracing::warn!("Rule chain save abandoned before the backend answered, keeping edits");
            *self.state = SessionState::Editing;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
