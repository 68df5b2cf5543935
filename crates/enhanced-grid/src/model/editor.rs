//! Edit session controller.
//!
//! A grid edits at most one row at a time. [`EditController`] is the state
//! machine that owns that session:
//!
//! ```text
//!            edit_item(A)                 edit_item(B) / cancel / navigate / popup
//!   Idle ----------------> Editing(A) ---------------------------------------------+
//!    ^                      |   ^                                                  |
//!    |     save / cancel    |   |  Decline: pending request rolled back            v
//!    +----------------------+   +-------------------------------- ConfirmingSwitch(A, pending)
//!    ^                                                                             |
//!    +------------- Confirm: edits discarded, pending request executed ------------+
//! ```
//!
//! Confirmation is only asked for when the editor is buffered and the cancel
//! confirmation is enabled. Otherwise every conflicting request cancels the
//! current session straight away.
//!
//! Operations return an [`EditorEffect`] describing what the caller has to do
//! next (show a dialog, run a navigation, open or close a filter popup).

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use enhanced_grid_core::Signal;
use enhanced_grid_core::logging::targets;
use serde::{Deserialize, Serialize};

use super::identity::RowIdentity;

/// Predicate deciding whether a row can be edited.
pub type EditableGate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Navigation postponed until a pending confirmation is resolved.
pub type NavigationContinuation = Box<dyn FnOnce() + Send>;

/// Editor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Keep changes in a working copy until they are saved.
    pub buffered: bool,
    /// Ask before discarding a buffered session.
    pub confirm_cancel: bool,
    /// Text of the confirmation dialog.
    pub message: String,
    /// Label of the button that discards the edits.
    pub confirm_label: String,
    /// Label of the button that keeps editing.
    pub cancel_label: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            buffered: true,
            confirm_cancel: true,
            message: "There are unsaved changes. Do you want to discard them?".into(),
            confirm_label: "Discard".into(),
            cancel_label: "Keep editing".into(),
        }
    }
}

impl EditorConfig {
    /// Confirmation is only needed when there is a buffer to lose.
    pub fn requires_confirmation(&self) -> bool {
        self.buffered && self.confirm_cancel
    }
}

/// Identifies one confirmation dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfirmationId(u64);

impl fmt::Display for ConfirmationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "confirmation#{}", self.0)
    }
}

/// The host's answer to a confirmation dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfirmChoice {
    /// Discard the edits and carry out the pending request.
    Confirm,
    /// Keep editing; the pending request is dropped.
    Decline,
}

/// Content of a confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub id: ConfirmationId,
    pub message: String,
    pub confirm_label: String,
    pub cancel_label: String,
}

/// A request that conflicts with the open session.
pub enum PendingRequest<T> {
    /// Open the editor on another row.
    OpenRow(T),
    /// Close the editor.
    CancelEdit,
    /// Navigate away from the grid.
    ContinueNavigation(NavigationContinuation),
    /// Open a column filter popup.
    FilterPopup { column: String },
}

impl<T: fmt::Debug> fmt::Debug for PendingRequest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenRow(row) => f.debug_tuple("OpenRow").field(row).finish(),
            Self::CancelEdit => f.write_str("CancelEdit"),
            Self::ContinueNavigation(_) => f.write_str("ContinueNavigation"),
            Self::FilterPopup { column } => {
                f.debug_struct("FilterPopup").field("column", column).finish()
            }
        }
    }
}

/// The row being edited, with its working copy.
#[derive(Debug, Clone)]
pub struct EditSession<T> {
    original: T,
    buffer: T,
}

impl<T> EditSession<T> {
    /// The row as it was when the editor opened.
    pub fn original(&self) -> &T {
        &self.original
    }

    /// The working copy.
    pub fn buffer(&self) -> &T {
        &self.buffer
    }
}

/// State of the edit session.
#[derive(Debug)]
pub enum EditState<T> {
    Idle,
    Editing(EditSession<T>),
    ConfirmingSwitch {
        current: EditSession<T>,
        pending: PendingRequest<T>,
        id: ConfirmationId,
    },
}

impl<T> EditState<T> {
    /// The open session, including one waiting for confirmation.
    pub fn session(&self) -> Option<&EditSession<T>> {
        match self {
            Self::Idle => None,
            Self::Editing(session)
            | Self::ConfirmingSwitch {
                current: session, ..
            } => Some(session),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_confirming(&self) -> bool {
        matches!(self, Self::ConfirmingSwitch { .. })
    }
}

/// Follow-up work for the caller of an [`EditController`] operation.
pub enum EditorEffect {
    /// Nothing to do.
    None,
    /// Show the confirmation dialog.
    Prompt(ConfirmPrompt),
    /// Run the navigation that was requested.
    Navigate(NavigationContinuation),
    /// Open the filter popup of a column.
    OpenPopup { column: String },
    /// Close the filter popup of a column, it was rolled back.
    ClosePopup { column: String },
}

impl EditorEffect {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn prompt(&self) -> Option<&ConfirmPrompt> {
        match self {
            Self::Prompt(prompt) => Some(prompt),
            _ => None,
        }
    }
}

impl fmt::Debug for EditorEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Prompt(prompt) => f.debug_tuple("Prompt").field(prompt).finish(),
            Self::Navigate(_) => f.write_str("Navigate"),
            Self::OpenPopup { column } => {
                f.debug_struct("OpenPopup").field("column", column).finish()
            }
            Self::ClosePopup { column } => {
                f.debug_struct("ClosePopup").field("column", column).finish()
            }
        }
    }
}

/// Single-session edit controller guarded by an editable gate.
///
/// # Signals
///
/// - `editor_opened`: a session started on the row
/// - `editor_saved`: the session was committed, carries the saved row
/// - `editor_cancelled`: the session was closed without saving
pub struct EditController<T, K> {
    identity: RowIdentity<T, K>,
    gate: EditableGate<T>,
    config: EditorConfig,
    state: EditState<T>,
    next_confirmation: u64,

    pub editor_opened: Signal<T>,
    pub editor_saved: Signal<T>,
    pub editor_cancelled: Signal<T>,
}

impl<T, K> EditController<T, K>
where
    T: Clone + Send + Sync + 'static,
    K: Eq + Hash + Clone,
{
    pub fn new(identity: RowIdentity<T, K>, config: EditorConfig) -> Self {
        Self {
            identity,
            gate: Arc::new(|_| true),
            config,
            state: EditState::Idle,
            next_confirmation: 0,
            editor_opened: Signal::new(),
            editor_saved: Signal::new(),
            editor_cancelled: Signal::new(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Replaces the editor settings. An open session is left alone.
    pub fn set_config(&mut self, config: EditorConfig) {
        self.config = config;
    }

    /// Replaces the editable gate.
    ///
    /// An open session on a row that no longer passes stays open; the gate
    /// only decides whether new sessions may start.
    pub fn set_editable_predicate<F>(&mut self, gate: F)
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.gate = Arc::new(gate);
    }

    pub fn is_editable(&self, row: &T) -> bool {
        (self.gate)(row)
    }

    pub fn state(&self) -> &EditState<T> {
        &self.state
    }

    pub fn is_editing(&self) -> bool {
        !self.state.is_idle()
    }

    /// Returns true if `row` is the one being edited.
    pub fn is_editing_row(&self, row: &T) -> bool {
        self.state
            .session()
            .is_some_and(|session| self.identity.same(&session.original, row))
    }

    /// The working copy of the row being edited.
    pub fn edited_item(&self) -> Option<&T> {
        self.state.session().map(EditSession::buffer)
    }

    /// Id of the confirmation waiting for an answer, if any.
    pub fn pending_confirmation(&self) -> Option<ConfirmationId> {
        match &self.state {
            EditState::ConfirmingSwitch { id, .. } => Some(*id),
            _ => None,
        }
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Opens the editor on `row`.
    pub fn edit_item(&mut self, row: &T) -> EditorEffect {
        if !self.is_editable(row) {
            tracing::debug!(target: targets::EDITOR, "edit rejected: row is not editable");
            return EditorEffect::None;
        }
        if self.is_editing_row(row) {
            return EditorEffect::None;
        }
        self.request(PendingRequest::OpenRow(row.clone()))
    }

    /// Closes the editor without saving.
    pub fn cancel_edit(&mut self) -> EditorEffect {
        if self.state.is_idle() {
            return EditorEffect::None;
        }
        self.request(PendingRequest::CancelEdit)
    }

    /// Asks to navigate away. The continuation runs now or after confirmation.
    pub fn request_navigation(&mut self, continuation: NavigationContinuation) -> EditorEffect {
        self.request(PendingRequest::ContinueNavigation(continuation))
    }

    /// Asks to open the filter popup of `column`.
    pub fn request_filter_popup(&mut self, column: impl Into<String>) -> EditorEffect {
        self.request(PendingRequest::FilterPopup { column: column.into() })
    }

    /// Applies a change to the working copy.
    ///
    /// Returns the modified row when the editor is unbuffered, for the caller
    /// to write through to the data source.
    pub fn modify<F>(&mut self, change: F) -> Option<T>
    where
        F: FnOnce(&mut T),
    {
        let EditState::Editing(session) = &mut self.state else {
            tracing::debug!(target: targets::EDITOR, "modification rejected: no active session");
            return None;
        };
        change(&mut session.buffer);
        if self.config.buffered {
            return None;
        }
        session.original = session.buffer.clone();
        Some(session.buffer.clone())
    }

    /// Commits the session and returns the saved row.
    pub fn save(&mut self) -> Option<T> {
        if !matches!(self.state, EditState::Editing(_)) {
            tracing::debug!(target: targets::EDITOR, "save rejected: no active session");
            return None;
        }
        let EditState::Editing(session) = std::mem::replace(&mut self.state, EditState::Idle) else {
            return None;
        };
        tracing::debug!(target: targets::EDITOR, "edit session saved");
        self.editor_saved.emit(session.buffer.clone());
        Some(session.buffer)
    }

    /// Resolves a confirmation dialog.
    ///
    /// Unknown or already resolved ids are ignored, so each dialog takes
    /// effect at most once.
    pub fn resolve(&mut self, id: ConfirmationId, choice: ConfirmChoice) -> EditorEffect {
        if self.pending_confirmation() != Some(id) {
            tracing::debug!(target: targets::EDITOR, %id, "ignoring stale confirmation");
            return EditorEffect::None;
        }
        let EditState::ConfirmingSwitch { current, pending, .. } =
            std::mem::replace(&mut self.state, EditState::Idle)
        else {
            return EditorEffect::None;
        };

        match choice {
            ConfirmChoice::Confirm => {
                tracing::debug!(target: targets::EDITOR, %id, "confirmed, discarding edits");
                self.close(current);
                self.execute(pending)
            }
            ConfirmChoice::Decline => {
                tracing::debug!(target: targets::EDITOR, %id, "declined, keep editing");
                self.state = EditState::Editing(current);
                Self::roll_back(pending)
            }
        }
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    fn request(&mut self, request: PendingRequest<T>) -> EditorEffect {
        match std::mem::replace(&mut self.state, EditState::Idle) {
            EditState::Idle => self.execute(request),
            EditState::Editing(current) => {
                if self.config.requires_confirmation() {
                    let id = ConfirmationId(self.next_confirmation);
                    self.next_confirmation += 1;
                    tracing::debug!(
                        target: targets::EDITOR,
                        %id,
                        request = request.kind(),
                        "confirmation required"
                    );
                    self.state = EditState::ConfirmingSwitch {
                        current,
                        pending: request,
                        id,
                    };
                    EditorEffect::Prompt(self.prompt(id))
                } else {
                    self.close(current);
                    self.execute(request)
                }
            }
            EditState::ConfirmingSwitch { current, pending, id } => {
                tracing::debug!(
                    target: targets::EDITOR,
                    %id,
                    replaced = pending.kind(),
                    request = request.kind(),
                    "pending request replaced"
                );
                self.state = EditState::ConfirmingSwitch {
                    current,
                    pending: request,
                    id,
                };
                Self::roll_back(pending)
            }
        }
    }

    fn execute(&mut self, request: PendingRequest<T>) -> EditorEffect {
        match request {
            PendingRequest::OpenRow(row) => {
                if self.is_editable(&row) {
                    self.open(row);
                } else {
                    tracing::debug!(
                        target: targets::EDITOR,
                        "edit rejected: row is no longer editable"
                    );
                }
                EditorEffect::None
            }
            PendingRequest::CancelEdit => EditorEffect::None,
            PendingRequest::ContinueNavigation(continuation) => {
                EditorEffect::Navigate(continuation)
            }
            PendingRequest::FilterPopup { column } => EditorEffect::OpenPopup { column },
        }
    }

    fn roll_back(pending: PendingRequest<T>) -> EditorEffect {
        match pending {
            PendingRequest::FilterPopup { column } => EditorEffect::ClosePopup { column },
            _ => EditorEffect::None,
        }
    }

    fn open(&mut self, row: T) {
        tracing::debug!(target: targets::EDITOR, "edit session opened");
        self.state = EditState::Editing(EditSession {
            original: row.clone(),
            buffer: row.clone(),
        });
        self.editor_opened.emit(row);
    }

    fn close(&mut self, session: EditSession<T>) {
        tracing::debug!(target: targets::EDITOR, "edit session cancelled");
        self.editor_cancelled.emit(session.original);
    }

    fn prompt(&self, id: ConfirmationId) -> ConfirmPrompt {
        ConfirmPrompt {
            id,
            message: self.config.message.clone(),
            confirm_label: self.config.confirm_label.clone(),
            cancel_label: self.config.cancel_label.clone(),
        }
    }
}

impl<T> PendingRequest<T> {
    fn kind(&self) -> &'static str {
        match self {
            Self::OpenRow(_) => "open_row",
            Self::CancelEdit => "cancel_edit",
            Self::ContinueNavigation(_) => "continue_navigation",
            Self::FilterPopup { .. } => "filter_popup",
        }
    }
}

impl<T: fmt::Debug, K> fmt::Debug for EditController<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditController")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}
