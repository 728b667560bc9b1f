//! Identity and session store.
//!
//! Holds the user table (in slot order) and the registry of live sessions.
//! Deleted users stay in the table as inactive records until the next save,
//! which persists active users only.

pub mod credential;
pub mod session;

use indexmap::IndexMap;
use omnifs_types::user::MAX_USERNAME_LEN;
use omnifs_types::{SessionHandle, SessionInfo, UserRecord, UserRole, unix_now};

use crate::error::{FsError, FsResult};

pub use credential::{hash_credential, verify_credential};
pub use session::SessionRegistry;

#[derive(Debug)]
pub struct IdentityStore {
    max_users: u32,
    users: IndexMap<String, UserRecord>,
    sessions: SessionRegistry,
}

impl IdentityStore {
    pub fn new(max_users: u32) -> Self {
        Self {
            max_users,
            users: IndexMap::new(),
            sessions: SessionRegistry::new(),
        }
    }

    pub fn max_users(&self) -> u32 {
        self.max_users
    }

    /// Install the administrator of a freshly formatted container.
    pub fn seed_admin(&mut self, username: &str, secret: &str) {
        let record = UserRecord::new(username, hash_credential(secret), UserRole::Admin, unix_now());
        self.users.insert(record.username.clone(), record);
    }

    /// Re-hydrate a record read from the user table. Inactive records and
    /// records beyond `max_users` are dropped.
    pub fn insert_loaded(&mut self, record: UserRecord) -> bool {
        if !record.active
            || record.username.is_empty()
            || self.active_user_count() >= self.max_users as usize
        {
            return false;
        }
        self.users.insert(record.username.clone(), record);
        true
    }

    /// Active user by name.
    pub fn user(&self, username: &str) -> Option<&UserRecord> {
        self.users.get(username).filter(|u| u.active)
    }

    pub fn active_user_count(&self) -> usize {
        self.users.values().filter(|u| u.active).count()
    }

    pub fn active_session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Active records in table order, as they are written to disk.
    pub fn persisted_records(&self) -> impl Iterator<Item = &UserRecord> {
        self.users.values().filter(|u| u.active)
    }

    // ── Sessions ──

    pub fn login(&mut self, username: &str, secret: &str) -> FsResult<SessionHandle> {
        let user = self
            .users
            .get_mut(username)
            .filter(|u| u.active)
            .ok_or_else(|| FsError::not_found(format!("user {}", username)))?;
        if !verify_credential(secret, &user.password_digest) {
            return Err(FsError::permission_denied(format!(
                "bad credentials for {}",
                username
            )));
        }
        let now = unix_now();
        user.last_login = now;
        let snapshot = user.clone();
        let handle = self.sessions.open(snapshot, now);
        tracing::info!(user = %username, session = %handle, "login");
        Ok(handle)
    }

    pub fn logout(&mut self, handle: SessionHandle) -> FsResult<()> {
        let session = self.sessions.close(handle).ok_or(FsError::InvalidSession)?;
        tracing::info!(user = %session.username(), session = %handle, "logout");
        Ok(())
    }

    pub fn session_info(&self, handle: SessionHandle) -> FsResult<SessionInfo> {
        self.sessions.get(handle).cloned().ok_or(FsError::InvalidSession)
    }

    /// Validate a handle and count one operation against it.
    pub fn touch(&mut self, handle: SessionHandle) -> FsResult<SessionInfo> {
        self.sessions
            .touch(handle, unix_now())
            .cloned()
            .ok_or(FsError::InvalidSession)
    }

    fn require_admin(&self, handle: SessionHandle) -> FsResult<SessionInfo> {
        let session = self.session_info(handle)?;
        if !session.is_admin() {
            return Err(FsError::permission_denied(format!(
                "{} is not an administrator",
                session.username()
            )));
        }
        Ok(session)
    }

    // ── User administration ──

    pub fn create_user(
        &mut self,
        admin: SessionHandle,
        username: &str,
        secret: &str,
        role: UserRole,
    ) -> FsResult<()> {
        self.require_admin(admin)?;
        // soft-deleted names stay taken
        if self.users.contains_key(username) {
            return Err(FsError::file_exists(format!("user {}", username)));
        }
        if username.is_empty() || username.len() > MAX_USERNAME_LEN || username.contains('\0') {
            return Err(FsError::invalid_operation(format!(
                "username must be 1..={} bytes without NUL",
                MAX_USERNAME_LEN
            )));
        }
        if self.active_user_count() >= self.max_users as usize {
            return Err(FsError::no_space(format!(
                "user table holds {} users",
                self.max_users
            )));
        }
        let record = UserRecord::new(username, hash_credential(secret), role, unix_now());
        self.users.insert(username.to_string(), record);
        tracing::debug!(user = %username, %role, "user created");
        Ok(())
    }

    pub fn delete_user(&mut self, admin: SessionHandle, username: &str) -> FsResult<()> {
        self.require_admin(admin)?;
        let user = self
            .users
            .get_mut(username)
            .filter(|u| u.active)
            .ok_or_else(|| FsError::not_found(format!("user {}", username)))?;
        user.active = false;
        tracing::debug!(user = %username, "user deactivated");
        Ok(())
    }

    pub fn list_users(&self, admin: SessionHandle) -> FsResult<Vec<UserRecord>> {
        self.require_admin(admin)?;
        Ok(self.persisted_records().cloned().collect())
    }
}

// ============================================================================
// Tests
// ============================================================================
