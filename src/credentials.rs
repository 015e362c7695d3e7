use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Owner of the bearer token. The transport only ever calls `get`.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, token: &str) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryCredentials {
    token: RwLock<Option<String>>,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryCredentials {
    fn get(&self) -> Option<String> {
        self.token.read().ok().and_then(|token| token.clone())
    }

    fn set(&self, token: &str) -> io::Result<()> {
        let mut slot = self
            .token
            .write()
            .map_err(|_| io::Error::other("credential lock poisoned"))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        let mut slot = self
            .token
            .write()
            .map_err(|_| io::Error::other("credential lock poisoned"))?;
        *slot = None;
        Ok(())
    }
}

/// Token persisted in a file readable only by the current user.
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: PathBuf,
}

impl FileCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentials {
    fn get(&self) -> Option<String> {
        let token = std::fs::read_to_string(&self.path).ok()?;
        let token = token.trim();
        (!token.is_empty()).then(|| token.to_string())
    }

    fn set(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path)?;

        // `mode` only applies on creation.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }

        use std::io::Write;
        file.write_all(token.as_bytes())?;
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

pub fn default_token_path() -> PathBuf {
    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        return PathBuf::from(home).join(".mealworm").join("access.token");
    }

    PathBuf::from("mealworm.token")
}
