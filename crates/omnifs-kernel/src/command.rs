//! Typed request surface of the engine.
//!
//! The protocol layer parses client lines into [`Command`]s, queues them,
//! and the worker hands each one to [`StorageEngine::execute`].

use omnifs_types::{
    ConnectionId, DirEntry, FileMetadata, FsStats, SessionHandle, SessionInfo, UserRecord,
    UserRole,
};

use crate::codec;
use crate::engine::StorageEngine;
use crate::error::{FsError, FsResult};

/// One engine operation.
#[derive(Debug, Clone, PartialEq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Command {
    Login {
        username: String,
        secret: String,
    },
    Logout {
        session: SessionHandle,
    },
    SessionInfo {
        session: SessionHandle,
    },
    CreateUser {
        session: SessionHandle,
        username: String,
        secret: String,
        role: UserRole,
    },
    DeleteUser {
        session: SessionHandle,
        username: String,
    },
    ListUsers {
        session: SessionHandle,
    },
    DirCreate {
        session: SessionHandle,
        path: String,
    },
    DirList {
        session: SessionHandle,
        path: String,
    },
    DirDelete {
        session: SessionHandle,
        path: String,
    },
    DirExists {
        session: SessionHandle,
        path: String,
    },
    FileCreate {
        session: SessionHandle,
        path: String,
        data: Vec<u8>,
    },
    FileRead {
        session: SessionHandle,
        path: String,
    },
    FileEdit {
        session: SessionHandle,
        path: String,
        data: Vec<u8>,
        offset: u64,
    },
    FileTruncate {
        session: SessionHandle,
        path: String,
    },
    FileDelete {
        session: SessionHandle,
        path: String,
    },
    FileExists {
        session: SessionHandle,
        path: String,
    },
    FileRename {
        session: SessionHandle,
        old: String,
        new: String,
    },
    GetMetadata {
        session: SessionHandle,
        path: String,
    },
    SetPermissions {
        session: SessionHandle,
        path: String,
        mode: u32,
    },
    SetOwner {
        session: SessionHandle,
        path: String,
        owner: String,
    },
    GetStats {
        session: SessionHandle,
    },
    /// Write the engine to its bound container file.
    Sync,
}

impl Command {
    /// Operation name, e.g. `"dir_create"`.
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// Successful result of a [`Command`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Done,
    Session(SessionHandle),
    SessionInfo(SessionInfo),
    Users(Vec<UserRecord>),
    Entries(Vec<DirEntry>),
    Data(Vec<u8>),
    Metadata(FileMetadata),
    Stats(FsStats),
}

impl StorageEngine {
    /// Run one command to completion.
    pub fn execute(&mut self, connection: ConnectionId, command: Command) -> FsResult<Reply> {
        let _span = tracing::debug_span!("op", %connection, op = command.name()).entered();
        let result = self.dispatch(command);
        if let Err(e) = &result {
            tracing::debug!(code = %e.code(), error = %e, "operation failed");
        }
        result
    }

    fn dispatch(&mut self, command: Command) -> FsResult<Reply> {
        use Command as C;
        let done = |r: FsResult<()>| r.map(|_| Reply::Done);
        match command {
            C::Login { username, secret } => self.login(&username, &secret).map(Reply::Session),
            C::Logout { session } => done(self.logout(session)),
            C::SessionInfo { session } => self.session_info(session).map(Reply::SessionInfo),
            C::CreateUser {
                session,
                username,
                secret,
                role,
            } => done(self.create_user(session, &username, &secret, role)),
            C::DeleteUser { session, username } => done(self.delete_user(session, &username)),
            C::ListUsers { session } => self.list_users(session).map(Reply::Users),
            C::DirCreate { session, path } => done(self.dir_create(session, &path)),
            C::DirList { session, path } => self.dir_list(session, &path).map(Reply::Entries),
            C::DirDelete { session, path } => done(self.dir_delete(session, &path)),
            C::DirExists { session, path } => done(self.dir_exists(session, &path)),
            C::FileCreate {
                session,
                path,
                data,
            } => done(self.file_create(session, &path, &data)),
            C::FileRead { session, path } => self.file_read(session, &path).map(Reply::Data),
            C::FileEdit {
                session,
                path,
                data,
                offset,
            } => done(self.file_edit(session, &path, &data, offset)),
            C::FileTruncate { session, path } => done(self.file_truncate(session, &path)),
            C::FileDelete { session, path } => done(self.file_delete(session, &path)),
            C::FileExists { session, path } => done(self.file_exists(session, &path)),
            C::FileRename { session, old, new } => done(self.file_rename(session, &old, &new)),
            C::GetMetadata { session, path } => {
                self.get_metadata(session, &path).map(Reply::Metadata)
            }
            C::SetPermissions {
                session,
                path,
                mode,
            } => done(self.set_permissions(session, &path, mode)),
            C::SetOwner {
                session,
                path,
                owner,
            } => done(self.set_owner(session, &path, &owner)),
            C::GetStats { session } => self.get_stats(session).map(Reply::Stats),
            C::Sync => done(self.sync()),
        }
    }

    /// Save to the bound container file.
    pub fn sync(&self) -> FsResult<()> {
        let path = self
            .container_path()
            .ok_or_else(|| FsError::invalid_operation("engine is not bound to a container file"))?;
        codec::save(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContainerConfig;
    use omnifs_types::ErrorCode;

    fn login(e: &mut StorageEngine) -> SessionHandle {
        match e.execute(
            ConnectionId(1),
            Command::Login {
                username: "admin".into(),
                secret: "admin123".into(),
            },
        ) {
            Ok(Reply::Session(s)) => s,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(Command::Sync.name(), "sync");
        let c = Command::DirCreate {
            session: SessionHandle::new(0, 0),
            path: "/".into(),
        };
        assert_eq!(c.name(), "dir_create");
    }

    #[test]
    fn test_dispatch() {
        let mut e = StorageEngine::new(&ContainerConfig::default()).unwrap();
        let s = login(&mut e);
        let conn = ConnectionId(1);

        let r = e.execute(
            conn,
            Command::FileCreate {
                session: s,
                path: "/a".into(),
                data: b"xy".to_vec(),
            },
        );
        assert_eq!(r.unwrap(), Reply::Done);

        let r = e.execute(
            conn,
            Command::FileRead {
                session: s,
                path: "/a".into(),
            },
        );
        assert_eq!(r.unwrap(), Reply::Data(b"xy".to_vec()));

        let r = e.execute(
            conn,
            Command::DirList {
                session: s,
                path: "/".into(),
            },
        );
        assert!(matches!(r.unwrap(), Reply::Entries(v) if v.len() == 1));

        match e.execute(conn, Command::GetStats { session: s }).unwrap() {
            Reply::Stats(stats) => assert_eq!(stats.total_files, 1),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_sync_requires_binding() {
        let mut e = StorageEngine::new(&ContainerConfig::default()).unwrap();
        let err = e.execute(ConnectionId(0), Command::Sync).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidOperation);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.omni");
        e.bind(&path);
        e.execute(ConnectionId(0), Command::Sync).unwrap();
        assert!(path.exists());
    }
}
