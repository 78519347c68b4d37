use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Verifies a user identity against its shared secret. Kept behind a
/// trait so the credential source can be swapped without touching call
/// sites.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, usuario: &str, senha: &str) -> bool;
}

/// Username to password table checked once at login, loaded from
/// configuration. When no users are configured, a single bootstrap
/// admin entry is installed so a fresh install remains reachable.
pub struct StaticCredentials {
    users: HashMap<String, String>,
}

impl StaticCredentials {
    pub const BOOTSTRAP_USER: &'static str = "admin";
    pub const BOOTSTRAP_PASSWORD: &'static str = "senha123";

    pub fn new(mut users: HashMap<String, String>) -> Self {
        if users.is_empty() {
            users.insert(
                Self::BOOTSTRAP_USER.to_string(),
                Self::BOOTSTRAP_PASSWORD.to_string(),
            );
        }
        Self { users }
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, usuario: &str, senha: &str) -> bool {
        self.users.get(usuario).map(String::as_str) == Some(senha)
    }
}

/// Holds the authenticated flag for every open session: an opaque token
/// handed to the client at login, resolved on every gated operation,
/// removed at logout. No expiry.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Opens a session for an authenticated user and returns its token.
    pub fn open(&self, usuario: &str) -> String {
        let token = Uuid::new_v4().to_string();
        self.lock().insert(token.clone(), usuario.to_string());
        token
    }

    /// Resolves a token back to its username, when the session exists.
    pub fn resolve(&self, token: &str) -> Option<String> {
        self.lock().get(token).cloned()
    }

    /// Closes a session. Unknown tokens are ignored.
    pub fn close(&self, token: &str) {
        self.lock().remove(token);
    }
}
