//! Session persisted between CLI runs as a small JSON file.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

use anyhow::{Context, Result};
use markflow_shared::{models::TokenPair, TokenStore};
use serde::{Deserialize, Serialize};

/// On-disk layout: `{ token, refresh_token, selected_model }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFile {
    /// Bearer token.
    #[serde(default)]
    pub token: Option<String>,
    /// Refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Model picked for the last marking job.
    #[serde(default)]
    pub selected_model: Option<String>,
}

/// [`TokenStore`] that writes through to a [`SessionFile`].
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    state: RwLock<SessionFile>,
}

impl FileTokenStore {
    /// Load `path`, or start empty when it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read session file {}", path.display()))?;
            if raw.trim().is_empty() {
                SessionFile::default()
            } else {
                serde_json::from_str(&raw)
                    .with_context(|| format!("corrupt session file {}", path.display()))?
            }
        } else {
            SessionFile::default()
        };
        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    /// File backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents.
    pub fn snapshot(&self) -> SessionFile {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Model remembered from the last marking job.
    pub fn selected_model(&self) -> Option<String> {
        self.snapshot().selected_model
    }

    /// Remember `model` for the next marking job.
    pub fn set_selected_model(&self, model: &str) -> Result<()> {
        self.update(|state| state.selected_model = Some(model.to_string()))
    }

    fn update(&self, change: impl FnOnce(&mut SessionFile)) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        change(&mut state);
        write_file(&self.path, &state)
    }
}

fn write_file(path: &Path, state: &SessionFile) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(state)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<TokenPair> {
        let state = self.snapshot();
        state.token.map(|token| TokenPair {
            token,
            refresh_token: state.refresh_token,
        })
    }

    fn save(&self, tokens: &TokenPair) {
        let result = self.update(|state| {
            state.token = Some(tokens.token.clone());
            state.refresh_token = tokens.refresh_token.clone();
        });
        if let Err(err) = result {
            tracing::warn!("session not persisted: {err:#}");
        }
    }

    fn clear(&self) {
        let result = self.update(|state| {
            state.token = None;
            state.refresh_token = None;
        });
        if let Err(err) = result {
            tracing::warn!("session not cleared on disk: {err:#}");
        }
    }
}
