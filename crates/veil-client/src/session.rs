//! Bearer-token store.
//!
//! A `Session` is shared by reference between the HTTP client and the shell.
//! Clones share the same token. When a token path is configured the token is
//! mirrored to that file so it survives restarts.

use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use tracing::{debug, warn};

use veil_contracts::error::VeilResult;

/// Sentinel token that disables every backend call and forces demo data.
pub const DEMO_TOKEN: &str = "demo-token-fallback";

#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Arc<RwLock<Option<String>>>,
    path: Option<PathBuf>,
}

impl Session {
    /// A session that forgets its token on exit.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A session persisted at `path`. An existing non-empty file is loaded.
    pub fn persistent(path: impl Into<PathBuf>) -> VeilResult<Self> {
        let path = path.into();
        let token = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), has_token = token.is_some(), "session loaded");
        Ok(Self {
            token: Arc::new(RwLock::new(token)),
            path: Some(path),
        })
    }

    pub fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(token) => token.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_token(&self, token: impl Into<String>) -> VeilResult<()> {
        let token = token.into();
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            write_token_file(path, &token)?;
        }
        self.store(Some(token));
        Ok(())
    }

    /// Forget the token. A failure to remove the token file is logged, not returned.
    pub fn clear(&self) {
        self.store(None);
        if let Some(path) = &self.path {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "failed to remove token file");
                }
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// True when the demo sentinel is stored.
    pub fn is_demo(&self) -> bool {
        self.token().as_deref() == Some(DEMO_TOKEN)
    }

    /// Store the demo sentinel.
    pub fn enter_demo(&self) -> VeilResult<()> {
        self.set_token(DEMO_TOKEN)
    }

    fn store(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut slot) => *slot = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }
}

/// Write `token` to `path`, readable by the owner only on unix.
fn write_token_file(path: &Path, token: &str) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(0o600);
        let mut file = options.open(path)?;
        // `mode` only applies when the file is created.
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        file.write_all(token.as_bytes())
    }
    #[cfg(not(unix))]
    {
        options.open(path)?.write_all(token.as_bytes())
    }
}
