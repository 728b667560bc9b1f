//! FIFO admission queue in front of the single writer.
//!
//! Any number of producer threads may `push`; one worker `pop`s. Requests
//! come out in exactly the order their pushes took the lock, which is the
//! order operations run against the engine.

use std::collections::VecDeque;

use omnifs_types::ConnectionId;
use parking_lot::{Condvar, Mutex};

/// A request tagged with the connection it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Request<T> {
    pub connection: ConnectionId,
    pub payload: T,
}

#[derive(Debug)]
struct State<T> {
    items: VecDeque<Request<T>>,
    closed: bool,
}

/// Blocking multi-producer FIFO.
#[derive(Debug)]
pub struct RequestQueue<T> {
    state: Mutex<State<T>>,
    ready: Condvar,
}

impl<T> Default for RequestQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RequestQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    /// Enqueue a request and wake one waiter. Returns `false` (dropping
    /// the request) once the queue is closed.
    pub fn push(&self, connection: ConnectionId, payload: T) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.items.push_back(Request {
            connection,
            payload,
        });
        drop(state);
        self.ready.notify_one();
        true
    }

    /// Block until a request is available. Returns `None` only after
    /// [`close`](Self::close) once every queued request has been taken.
    pub fn pop(&self) -> Option<Request<T>> {
        let mut state = self.state.lock();
        loop {
            if let Some(req) = state.items.pop_front() {
                return Some(req);
            }
            if state.closed {
                return None;
            }
            self.ready.wait(&mut state);
        }
    }

    pub fn try_pop(&self) -> Option<Request<T>> {
        self.state.lock().items.pop_front()
    }

    /// Refuse further pushes and wake every waiter.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_single_producer() {
        let q = RequestQueue::new();
        for i in 0..5 {
            assert!(q.push(ConnectionId(i), i * 10));
        }
        assert_eq!(q.len(), 5);
        let order: Vec<_> = (0..5).map(|_| q.pop().unwrap().payload).collect();
        assert_eq!(order, vec![0, 10, 20, 30, 40]);
        assert!(q.try_pop().is_none());
    }

    #[test]
    fn test_pop_blocks_until_push() {
        let q = Arc::new(RequestQueue::new());
        let consumer = {
            let q = Arc::clone(&q);
            thread::spawn(move || q.pop())
        };
        thread::sleep(Duration::from_millis(20));
        q.push(ConnectionId(7), "hello");
        let req = consumer.join().unwrap().unwrap();
        assert_eq!(req.connection, ConnectionId(7));
        assert_eq!(req.payload, "hello");
    }

    #[test]
    fn test_close_drains_then_ends() {
        let q = RequestQueue::new();
        q.push(ConnectionId(1), 1);
        q.close();
        assert!(!q.push(ConnectionId(1), 2));
        assert_eq!(q.pop().map(|r| r.payload), Some(1));
        assert!(q.pop().is_none());
        assert!(q.is_closed());
    }

    #[test]
    fn test_close_wakes_waiters() {
        let q: Arc<RequestQueue<u8>> = Arc::new(RequestQueue::new());
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let q = Arc::clone(&q);
                thread::spawn(move || q.pop())
            })
            .collect();
        thread::sleep(Duration::from_millis(20));
        q.close();
        for w in waiters {
            assert!(w.join().unwrap().is_none());
        }
    }
}
