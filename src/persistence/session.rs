//! Binding of an editor to a stored project
//!
//! Loads are split into [`ProjectSession::begin_load`] and
//! [`ProjectSession::finish_load`] so the storage call can happen anywhere.
//! Each load gets a generation number; a result arriving for anything but
//! the latest request is discarded.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::editor::EditorState;

use super::envelope::{default_persisted_data, PersistedData};
use super::error::StorageError;
use super::store::{ProjectKey, ProjectStore};

/// Handle for one in-flight load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    key: ProjectKey,
}

impl LoadTicket {
    pub fn key(&self) -> &ProjectKey {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Result of applying a load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Stored data was applied
    Loaded,
    /// Nothing usable was stored; the default dataset was applied
    Defaulted,
    /// A newer load superseded this one; nothing was applied
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// First save after a load would write back what was just read
    JustLoaded,
    LoadPending,
    NoProject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Skipped(SkipReason),
}

/// Editor state bound to the active project
#[derive(Debug, Default)]
pub struct ProjectSession {
    editor: EditorState,
    key: Option<ProjectKey>,
    generation: u64,
    pending: Option<LoadTicket>,
    skip_next_save: bool,
}

impl ProjectSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    /// Mutable editor access, refused while a load is in flight
    pub fn editor_mut(&mut self) -> Option<&mut EditorState> {
        if self.pending.is_some() {
            return None;
        }
        Some(&mut self.editor)
    }

    pub fn active_project(&self) -> Option<&ProjectKey> {
        self.key.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Make `key` the active project and start loading it
    ///
    /// Any load still in flight becomes stale.
    pub fn begin_load(&mut self, key: ProjectKey) -> LoadTicket {
        self.generation += 1;
        let ticket = LoadTicket {
            generation: self.generation,
            key: key.clone(),
        };
        debug!(project = %key, generation = self.generation, "loading project");
        self.key = Some(key);
        self.pending = Some(ticket.clone());
        ticket
    }

    /// Apply the result of a load started with `ticket`
    ///
    /// Missing or invalid data and storage errors fall back to the default
    /// dataset so editing can continue.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Option<Value>, StorageError>,
    ) -> LoadOutcome {
        if self.pending.as_ref() != Some(&ticket) {
            debug!(project = %ticket.key, generation = ticket.generation, "discarding stale load");
            return LoadOutcome::Stale;
        }
        self.pending = None;
        self.skip_next_save = true;

        let data = match result {
            Ok(Some(value)) => match PersistedData::from_value(value) {
                Ok(data) => Some(data),
                Err(e) => {
                    warn!(project = %ticket.key, error = %e, "stored project data rejected, using defaults");
                    None
                }
            },
            Ok(None) => {
                info!(project = %ticket.key, "no stored data, using defaults");
                None
            }
            Err(e) => {
                warn!(project = %ticket.key, error = %e, "failed to load project, using defaults");
                None
            }
        };

        match data {
            Some(data) => {
                self.editor.apply_persisted_data(data);
                LoadOutcome::Loaded
            }
            None => {
                self.editor.apply_persisted_data(default_persisted_data());
                LoadOutcome::Defaulted
            }
        }
    }

    /// Load a project synchronously from `store`
    pub fn switch_project<S: ProjectStore + ?Sized>(
        &mut self,
        store: &S,
        key: ProjectKey,
    ) -> LoadOutcome {
        let ticket = self.begin_load(key);
        let result = store.load(ticket.key());
        self.finish_load(ticket, result)
    }

    /// Save the editor state to the active project
    ///
    /// Storage errors are returned as-is and not retried.
    pub fn save<S: ProjectStore + ?Sized>(
        &mut self,
        store: &mut S,
    ) -> Result<SaveOutcome, StorageError> {
        if self.pending.is_some() {
            return Ok(SaveOutcome::Skipped(SkipReason::LoadPending));
        }
        let Some(key) = &self.key else {
            return Ok(SaveOutcome::Skipped(SkipReason::NoProject));
        };
        if self.skip_next_save {
            self.skip_next_save = false;
            debug!(project = %key, "skipping save right after load");
            return Ok(SaveOutcome::Skipped(SkipReason::JustLoaded));
        }

        store.save(key, &self.editor.get_persisted_data())?;
        debug!(project = %key, "saved project");
        Ok(SaveOutcome::Saved)
    }

    /// Detach from the active project, abandoning any pending load
    pub fn close_project(&mut self) {
        self.key = None;
        self.pending = None;
        self.skip_next_save = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryProjectStore;

    #[test]
    fn test_stale_load_discarded() {
        let mut session = ProjectSession::new();
        let first = session.begin_load(ProjectKey::new("u", "a"));
        let second = session.begin_load(ProjectKey::new("u", "b"));

        let mut other = default_persisted_data();
        other.template_style.brand_name = "Stale".to_string();
        let outcome = session.finish_load(first, Ok(Some(other.to_value().unwrap())));
        assert_eq!(outcome, LoadOutcome::Stale);
        assert!(session.is_loading());
        assert!(session.editor_mut().is_none());

        assert_eq!(session.finish_load(second, Ok(None)), LoadOutcome::Defaulted);
        assert_eq!(session.editor().template_style().brand_name, "YourApp");
        assert_eq!(session.active_project(), Some(&ProjectKey::new("u", "b")));
    }

    #[test]
    fn test_save_rules() {
        let mut store = MemoryProjectStore::new();
        let mut session = ProjectSession::new();
        assert_eq!(
            session.save(&mut store).unwrap(),
            SaveOutcome::Skipped(SkipReason::NoProject)
        );

        let summary = store.create("u", "P", &default_persisted_data()).unwrap();
        let ticket = session.begin_load(ProjectKey::new("u", summary.id));
        assert_eq!(
            session.save(&mut store).unwrap(),
            SaveOutcome::Skipped(SkipReason::LoadPending)
        );

        let result = store.load(ticket.key());
        assert_eq!(session.finish_load(ticket, result), LoadOutcome::Loaded);
        assert_eq!(
            session.save(&mut store).unwrap(),
            SaveOutcome::Skipped(SkipReason::JustLoaded)
        );
        assert_eq!(session.save(&mut store).unwrap(), SaveOutcome::Saved);
    }

    #[test]
    fn test_load_error_falls_back_to_defaults() {
        let mut session = ProjectSession::new();
        session.editor_mut().unwrap().set_subject("edited");
        let ticket = session.begin_load(ProjectKey::new("u", "a"));
        let outcome = session.finish_load(ticket, Err(StorageError::EmptyName));
        assert_eq!(outcome, LoadOutcome::Defaulted);
        assert_ne!(session.editor().current_template().unwrap().subject(), "edited");
    }
}
