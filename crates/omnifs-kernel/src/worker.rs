//! The single writer.
//!
//! One dedicated thread owns the [`StorageEngine`] and runs queued commands
//! strictly one at a time in arrival order. Producers never touch the engine;
//! replies leave through a caller-supplied sink tagged with the connection
//! they belong to.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use omnifs_types::ConnectionId;

use crate::command::{Command, Reply};
use crate::engine::StorageEngine;
use crate::error::{FsError, FsResult};
use crate::queue::RequestQueue;

pub type CommandQueue = RequestQueue<Command>;

pub struct Worker {
    queue: Arc<CommandQueue>,
    handle: JoinHandle<StorageEngine>,
}

impl Worker {
    /// Move `engine` onto a new worker thread serving `queue`.
    pub fn spawn<F>(engine: StorageEngine, queue: Arc<CommandQueue>, mut sink: F) -> FsResult<Self>
    where
        F: FnMut(ConnectionId, FsResult<Reply>) + Send + 'static,
    {
        let worker_queue = Arc::clone(&queue);
        let handle = thread::Builder::new()
            .name("omnifs-worker".into())
            .spawn(move || {
                let mut engine = engine;
                let mut served = 0u64;
                while let Some(request) = worker_queue.pop() {
                    let reply = engine.execute(request.connection, request.payload);
                    sink(request.connection, reply);
                    served += 1;
                }
                tracing::info!(served, "worker drained, exiting");
                engine
            })?;
        tracing::info!("worker started");
        Ok(Self { queue, handle })
    }

    pub fn queue(&self) -> &Arc<CommandQueue> {
        &self.queue
    }

    /// Close the queue, let the worker finish what is already queued, and
    /// take the engine back.
    pub fn shutdown(self) -> FsResult<StorageEngine> {
        self.queue.close();
        self.handle
            .join()
            .map_err(|_| FsError::Io(io::Error::other("worker thread panicked")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContainerConfig;
    use parking_lot::Mutex;

    #[test]
    fn test_replies_follow_queue_order() {
        let replies = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let replies = Arc::clone(&replies);
            move |conn: ConnectionId, r: FsResult<Reply>| replies.lock().push((conn, r.is_ok()))
        };

        let queue = Arc::new(CommandQueue::new());
        queue.push(
            ConnectionId(1),
            Command::Login {
                username: "admin".into(),
                secret: "admin123".into(),
            },
        );
        queue.push(
            ConnectionId(2),
            Command::Login {
                username: "admin".into(),
                secret: "wrong".into(),
            },
        );

        let engine = StorageEngine::new(&ContainerConfig::default()).unwrap();
        let worker = Worker::spawn(engine, Arc::clone(&queue), sink).unwrap();
        let engine = worker.shutdown().unwrap();

        assert_eq!(
            *replies.lock(),
            vec![(ConnectionId(1), true), (ConnectionId(2), false)]
        );
        assert_eq!(engine.identity().active_session_count(), 1);
        assert!(queue.is_closed());
    }
}
