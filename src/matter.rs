//! Matter (case/client) context.
//!
//! Matters are a small local list the user tags sessions with; only
//! the last selected id survives between runs, written to a file in
//! the platform data dir. Nothing here is remote.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::settings::MatterSettings;

const ACTIVE_MATTER_FILE: &str = "active_matter";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Matter {
    pub id: String,
    pub name: String,
    pub client: String,
}

impl Matter {
    /// Context chip text shown on the general assistant.
    pub fn chip(&self) -> String {
        format!("Matter: {}", self.name)
    }
}

/// The selectable matter list plus the active selection.
#[derive(Debug)]
pub struct MatterBook {
    matters: Vec<Matter>,
    active_id: String,
    state_path: Option<PathBuf>,
}

impl MatterBook {
    /// Seed the book: the built-in "General" matter first, then any
    /// configured extras, then the persisted last selection if it still
    /// resolves.
    pub fn load(settings: &MatterSettings) -> Self {
        let mut matters = vec![Matter {
            id: "default".to_string(),
            name: "General".to_string(),
            client: "Portfolio".to_string(),
        }];
        for entry in &settings.extra {
            if entry.id.trim().is_empty() || matters.iter().any(|m| m.id == entry.id) {
                continue;
            }
            matters.push(Matter {
                id: entry.id.clone(),
                name: entry.name.clone(),
                client: entry.client.clone(),
            });
        }

        let state_path = state_path();
        let mut book = Self {
            matters,
            active_id: "default".to_string(),
            state_path,
        };

        if let Some(stored) = book.read_persisted_id() {
            if book.matters.iter().any(|m| m.id == stored) {
                book.active_id = stored;
            }
        }
        book
    }

    pub fn matters(&self) -> &[Matter] {
        &self.matters
    }

    pub fn active(&self) -> &Matter {
        self.matters
            .iter()
            .find(|m| m.id == self.active_id)
            .unwrap_or(&self.matters[0])
    }

    /// Select a matter by id. Unknown ids are refused so the active
    /// matter always resolves.
    pub fn set_active(&mut self, id: &str) -> bool {
        if !self.matters.iter().any(|m| m.id == id) {
            return false;
        }
        self.active_id = id.to_string();
        self.persist_active_id();
        true
    }

    fn read_persisted_id(&self) -> Option<String> {
        let path = self.state_path.as_ref()?;
        let raw = std::fs::read_to_string(path).ok()?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn persist_active_id(&self) {
        let Some(path) = &self.state_path else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                tracing::warn!(error = %err, "could not create matter state dir");
                return;
            }
        }
        if let Err(err) = std::fs::write(path, &self.active_id) {
            tracing::warn!(error = %err, "could not persist active matter");
        }
    }

    #[cfg(test)]
    fn with_state_path(mut self, path: PathBuf) -> Self {
        self.state_path = Some(path);
        self
    }
}

fn state_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("hakilens").join(ACTIVE_MATTER_FILE))
}
