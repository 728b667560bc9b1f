//! Session and user administration entry points.

use omnifs_types::{SessionHandle, SessionInfo, UserRecord, UserRole};

use crate::engine::StorageEngine;
use crate::error::FsResult;

impl StorageEngine {
    pub fn login(&mut self, username: &str, secret: &str) -> FsResult<SessionHandle> {
        self.identity.login(username, secret)
    }

    pub fn logout(&mut self, session: SessionHandle) -> FsResult<()> {
        self.identity.logout(session)
    }

    /// Snapshot of the session, this query included in its counters.
    pub fn session_info(&mut self, session: SessionHandle) -> FsResult<SessionInfo> {
        self.authenticate(session)
    }

    pub fn create_user(
        &mut self,
        session: SessionHandle,
        username: &str,
        secret: &str,
        role: UserRole,
    ) -> FsResult<()> {
        self.authenticate(session)?;
        self.identity.create_user(session, username, secret, role)
    }

    pub fn delete_user(&mut self, session: SessionHandle, username: &str) -> FsResult<()> {
        self.authenticate(session)?;
        self.identity.delete_user(session, username)
    }

    pub fn list_users(&mut self, session: SessionHandle) -> FsResult<Vec<UserRecord>> {
        self.authenticate(session)?;
        self.identity.list_users(session)
    }
}
