use std::sync::Arc;

use gr10_core::{AppConfig, CredentialVerifier, FormStore, Mailer, SessionStore};

/// Shared state handed to every handler: configuration, the record
/// store, open sessions and the injectable credential/mail seams.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    config: AppConfig,
    store: FormStore,
    sessions: SessionStore,
    verifier: Box<dyn CredentialVerifier>,
    mailer: Box<dyn Mailer>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        verifier: Box<dyn CredentialVerifier>,
        mailer: Box<dyn Mailer>,
    ) -> Self {
        let store = FormStore::new(&config.data_dir);
        Self {
            inner: Arc::new(Inner {
                config,
                store,
                sessions: SessionStore::new(),
                verifier,
                mailer,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &FormStore {
        &self.inner.store
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    pub fn verifier(&self) -> &dyn CredentialVerifier {
        self.inner.verifier.as_ref()
    }

    pub fn mailer(&self) -> &dyn Mailer {
        self.inner.mailer.as_ref()
    }
}
