//! Session initialization from stored credentials.
//!
//! [`AppContext`] is the single process-wide holder of the credential slot and
//! the remote client handles. Only [`AppContext::resume`] and
//! [`AppContext::initialize`] write the session; every other component reads
//! it through [`AppContext::session`] once startup has finished.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::application::credentials::{CredentialSlot, StoreError};
use crate::application::repos::PostsRepo;
use crate::application::uploads::ImageUploader;
use crate::domain::credentials::CredentialBundle;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("credentials missing: {0}; run `postdeck login` to scan a new QR code")]
    CredentialMissing(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to construct remote client: {0}")]
    Client(String),
}

impl SessionError {
    pub fn client(err: impl std::fmt::Display) -> Self {
        Self::Client(err.to_string())
    }
}

/// Client handles for the data store and the image host.
#[derive(Clone)]
pub struct Session {
    pub posts: Arc<dyn PostsRepo>,
    pub uploader: Arc<dyn ImageUploader>,
}

/// Builds client handles from a validated bundle.
pub trait ClientFactory: Send + Sync {
    fn connect(&self, bundle: &CredentialBundle) -> Result<Session, SessionError>;
}

pub struct AppContext {
    store: Arc<dyn CredentialSlot>,
    factory: Arc<dyn ClientFactory>,
    session: Option<Session>,
}

impl AppContext {
    pub fn new(store: Arc<dyn CredentialSlot>, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            store,
            factory,
            session: None,
        }
    }

    /// The credential slot, for the bootstrap flow to write into.
    pub fn credential_slot(&self) -> Arc<dyn CredentialSlot> {
        Arc::clone(&self.store)
    }

    /// Read the slot at startup.
    ///
    /// `Ok(None)` means no credentials were ever stored and the bootstrap flow
    /// must run. A stored payload that cannot be turned into a session yields
    /// `CredentialMissing`, which also routes back to bootstrap.
    pub fn resume(&mut self) -> Result<Option<&Session>, SessionError> {
        let payload = match self.store.load() {
            Ok(Some(payload)) => payload,
            Ok(None) => return Ok(None),
            Err(StoreError::Corrupt(reason)) => {
                warn!(reason = %reason, "stored credentials are unreadable");
                return Err(SessionError::CredentialMissing(reason));
            }
            Err(err) => return Err(err.into()),
        };
        self.initialize(&payload)?;
        self.session().map(Some)
    }

    /// Construct the client handles from a decoded payload.
    pub fn initialize(&mut self, payload: &Value) -> Result<Session, SessionError> {
        let bundle = CredentialBundle::from_value(payload)
            .map_err(|err| SessionError::CredentialMissing(err.to_string()))?;
        let session = self.factory.connect(&bundle)?;
        info!(data_store = %bundle.data_store.url, "session initialized");
        self.session = Some(session.clone());
        Ok(session)
    }

    pub fn session(&self) -> Result<&Session, SessionError> {
        self.session
            .as_ref()
            .ok_or_else(|| SessionError::CredentialMissing("no session initialized".into()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::application::repos::RepoError;
    use crate::application::uploads::UploadError;
    use crate::domain::posts::{Post, PostDraft, PostPatch};
    use crate::domain::uploads::ImageFile;

    struct NullRepo;

    #[async_trait]
    impl PostsRepo for NullRepo {
        async fn count(&self) -> Result<u64, RepoError> {
            Ok(0)
        }
        async fn list(&self, _page: u32, _page_size: u32) -> Result<Vec<Post>, RepoError> {
            Ok(vec![])
        }
        async fn get(&self, _id: i64) -> Result<Option<Post>, RepoError> {
            Ok(None)
        }
        async fn create(&self, _draft: &PostDraft) -> Result<Post, RepoError> {
            Err(RepoError::Transport("unused".into()))
        }
        async fn update(&self, _id: i64, _patch: &PostPatch) -> Result<(), RepoError> {
            Ok(())
        }
        async fn delete(&self, _id: i64) -> Result<(), RepoError> {
            Ok(())
        }
    }

    struct NullUploader;

    #[async_trait]
    impl ImageUploader for NullUploader {
        async fn upload(&self, _file: &ImageFile) -> Result<String, UploadError> {
            Err(UploadError::MissingUrl)
        }
    }

    #[derive(Default)]
    struct RecordingFactory {
        urls: Mutex<Vec<String>>,
    }

    impl ClientFactory for RecordingFactory {
        fn connect(&self, bundle: &CredentialBundle) -> Result<Session, SessionError> {
            self.urls
                .lock()
                .expect("lock")
                .push(bundle.data_store.url.clone());
            Ok(Session {
                posts: Arc::new(NullRepo),
                uploader: Arc::new(NullUploader),
            })
        }
    }

    struct FixedSlot(Result<Option<Value>, &'static str>);

    impl CredentialSlot for FixedSlot {
        fn load(&self) -> Result<Option<Value>, StoreError> {
            self.0
                .clone()
                .map_err(|reason| StoreError::Corrupt(reason.to_string()))
        }

        fn save(&self, _payload: &Value) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn context(slot: FixedSlot) -> (AppContext, Arc<RecordingFactory>) {
        let factory = Arc::new(RecordingFactory::default());
        (AppContext::new(Arc::new(slot), factory.clone()), factory)
    }

    #[test]
    fn empty_slot_requires_bootstrap() {
        let (mut ctx, factory) = context(FixedSlot(Ok(None)));
        assert!(ctx.resume().expect("resume").is_none());
        assert!(factory.urls.lock().expect("lock").is_empty());
        assert!(matches!(ctx.session(), Err(SessionError::CredentialMissing(_))));
    }

    #[test]
    fn stored_bundle_initializes_session() {
        let payload = json!({"dataStore": {"url": "https://db.example", "key": "k"}, "imageHost": {"apiKey": "a"}});
        let (mut ctx, factory) = context(FixedSlot(Ok(Some(payload))));
        assert!(ctx.resume().expect("resume").is_some());
        assert!(ctx.session().is_ok());
        assert_eq!(
            *factory.urls.lock().expect("lock"),
            vec!["https://db.example"]
        );
    }

    #[test]
    fn incomplete_or_corrupt_bundles_route_back_to_bootstrap() {
        let payload = json!({"dataStore": {"url": "u", "key": "k"}});
        let (mut ctx, _) = context(FixedSlot(Ok(Some(payload))));
        assert!(matches!(
            ctx.resume(),
            Err(SessionError::CredentialMissing(_))
        ));
        assert!(ctx.session().is_err());

        let (mut ctx, _) = context(FixedSlot(Err("truncated")));
        assert!(matches!(
            ctx.resume(),
            Err(SessionError::CredentialMissing(_))
        ));
    }

    #[test]
    fn missing_credentials_point_at_login() {
        let (mut ctx, _) = context(FixedSlot(Err("truncated")));
        let message = match ctx.resume() {
            Err(err) => err.to_string(),
            Ok(_) => panic!("corrupt bundle must not resume"),
        };
        assert!(message.contains("truncated"), "{message}");
        assert!(message.contains("postdeck login"), "{message}");
    }
}
