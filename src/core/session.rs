use crate::domain::model::{Role, Session};
use crate::domain::ports::{SessionProvider, Storage};
use crate::utils::error::{FraError, Result};
use serde::{Deserialize, Serialize};

pub const SESSION_KEY: &str = "fra_user.json";

/// A login entry as configured under `[[users]]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntry {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}

/// Credential directory backed by configuration.
#[derive(Debug, Clone, Default)]
pub struct DirectoryProvider {
    users: Vec<UserEntry>,
}

impl DirectoryProvider {
    pub fn new(users: Vec<UserEntry>) -> Self {
        Self { users }
    }
}

impl SessionProvider for DirectoryProvider {
    fn authenticate(&self, username: &str, password: &str) -> Result<Session> {
        let Some(user) = self.users.iter().find(|u| u.username == username) else {
            tracing::warn!("Login rejected for unknown user '{}'", username);
            return Err(FraError::AuthenticationError {
                message: format!("unknown user '{}'", username),
            });
        };
        if user.password != password {
            tracing::warn!("Login rejected for '{}': wrong password", username);
            return Err(FraError::AuthenticationError {
                message: format!("wrong password for '{}'", username),
            });
        }

        tracing::info!("User '{}' signed in as {}", username, user.role);
        Ok(Session {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
            role: user.role,
        })
    }
}

/// Persists the signed-in session between runs. The stored token is not
/// validated or expired.
pub struct SessionStore<S: Storage> {
    storage: S,
}

impl<S: Storage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub async fn save(&self, session: &Session) -> Result<()> {
        let data = serde_json::to_vec(session)?;
        self.storage.write_file(SESSION_KEY, &data).await
    }

    /// `None` when nothing is stored or the stored token cannot be read.
    pub async fn load(&self) -> Result<Option<Session>> {
        let data = match self.storage.read_file(SESSION_KEY).await {
            Ok(data) => data,
            Err(FraError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(None)
            }
            Err(e) => return Err(e),
        };

        match serde_json::from_slice(&data) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable stored session: {}", e);
                Ok(None)
            }
        }
    }

    pub async fn clear(&self) -> Result<()> {
        match self.storage.remove_file(SESSION_KEY).await {
            Err(FraError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    /// Authenticates through `provider` and stores the resulting session.
    pub async fn login<P: SessionProvider>(
        &self,
        provider: &P,
        username: &str,
        password: &str,
    ) -> Result<Session> {
        let session = provider.authenticate(username, password)?;
        self.save(&session).await?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MemoryStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl Storage for MemoryStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                FraError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn remove_file(&self, path: &str) -> Result<()> {
            let mut files = self.files.lock().await;
            files.remove(path).map(|_| ()).ok_or_else(|| {
                FraError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }
    }

    fn directory() -> DirectoryProvider {
        DirectoryProvider::new(vec![
            UserEntry {
                id: 1,
                username: "admin".to_string(),
                password: "password".to_string(),
                name: "Administrator".to_string(),
                role: Role::Admin,
            },
            UserEntry {
                id: 2,
                username: "officer".to_string(),
                password: "password".to_string(),
                name: "District Officer".to_string(),
                role: Role::DistrictOfficer,
            },
        ])
    }

    #[test]
    fn test_authenticate() {
        let provider = directory();
        let session = provider.authenticate("officer", "password").unwrap();
        assert_eq!(session.id, 2);
        assert_eq!(session.role, Role::DistrictOfficer);

        assert!(matches!(
            provider.authenticate("officer", "wrong"),
            Err(FraError::AuthenticationError { .. })
        ));
        assert!(provider.authenticate("nobody", "password").is_err());
    }

    #[tokio::test]
    async fn test_login_persists_until_cleared() {
        let storage = MemoryStorage::default();
        let store = SessionStore::new(storage.clone());
        assert_eq!(store.load().await.unwrap(), None);

        let session = store.login(&directory(), "admin", "password").await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(session));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_login_stores_nothing() {
        let store = SessionStore::new(MemoryStorage::default());
        assert!(store.login(&directory(), "admin", "nope").await.is_err());
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_token_reads_as_signed_out() {
        let storage = MemoryStorage::default();
        storage.write_file(SESSION_KEY, b"{not json").await.unwrap();
        let store = SessionStore::new(storage);
        assert_eq!(store.load().await.unwrap(), None);
    }
}
