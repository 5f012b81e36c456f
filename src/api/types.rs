//! Shared API context and request-scoped types.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::auth::OtpCache;
use crate::db::{open_database, DatabaseError};
use crate::emergency::BroadcastHub;
use crate::models::Identity;

/// Shared state handed to middleware (via `Extension`) and handlers
/// (via `State`). Cheap to clone; all mutable pieces sit behind `Arc`.
///
/// Handlers open their own SQLite connection per request. WAL mode and
/// a busy timeout (set in the pragmas) keep concurrent handlers from
/// tripping over each other on the shared file.
#[derive(Clone)]
pub struct ApiContext {
    db_path: Arc<PathBuf>,
    token_secret: Arc<Vec<u8>>,
    pub otp_cache: Arc<Mutex<OtpCache>>,
    pub hub: Arc<BroadcastHub>,
}

impl ApiContext {
    pub fn new(db_path: PathBuf, token_secret: Vec<u8>) -> Self {
        Self {
            db_path: Arc::new(db_path),
            token_secret: Arc::new(token_secret),
            otp_cache: Arc::new(Mutex::new(OtpCache::new())),
            hub: Arc::new(BroadcastHub::new()),
        }
    }

    pub fn open_db(&self) -> Result<Connection, DatabaseError> {
        open_database(&self.db_path)
    }

    pub fn token_secret(&self) -> &[u8] {
        &self.token_secret
    }
}

/// Authenticated identity, injected into request extensions by the
/// auth middleware.
#[derive(Clone)]
pub struct CurrentUser(pub Identity);
