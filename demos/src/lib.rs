//! A small in-memory transport used by the examples in this crate: an
//! `Endpoint` that fails its `send`/`receive` on command, and a factory that
//! can be told to reject a fixed number of reconnect attempts before handing
//! back a working endpoint.

use async_trait::async_trait;
use reconnecting_stream::{Endpoint, StreamFactory};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

/// An endpoint that fails every `send`/`receive` once `fail_after` calls have
/// gone through, simulating a connection that dies mid-flight.
pub struct FlakyEndpoint {
    id: usize,
    calls: AtomicUsize,
    fail_after: usize,
}

impl FlakyEndpoint {
    pub fn new(id: usize, fail_after: usize) -> Self {
        Self { id, calls: AtomicUsize::new(0), fail_after }
    }

    fn tick(&self) -> Result<(), io::Error> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n >= self.fail_after {
            Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                format!("endpoint {} reset after {} calls", self.id, self.fail_after),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Endpoint for FlakyEndpoint {
    type Req = String;
    type Res = String;
    type Error = io::Error;

    async fn send(&self, msg: &String) -> Result<(), io::Error> {
        self.tick()?;
        println!("endpoint {} sent {:?}", self.id, msg);
        Ok(())
    }

    async fn receive(&self) -> Result<String, io::Error> {
        self.tick()?;
        Ok(format!("ack from endpoint {}", self.id))
    }

    async fn half_close_send(&self) -> Result<(), io::Error> {
        Ok(())
    }

    async fn half_close_receive(&self) -> Result<(), io::Error> {
        Ok(())
    }
}

/// A factory that hands out numbered [`FlakyEndpoint`]s, each one more durable
/// than the last, so a demo program can watch a handful of restarts settle.
pub struct FlakyFactory {
    next_id: AtomicUsize,
    fail_after: usize,
}

impl FlakyFactory {
    pub fn new(fail_after: usize) -> Self {
        Self { next_id: AtomicUsize::new(0), fail_after }
    }
}

#[async_trait]
impl StreamFactory for FlakyFactory {
    type Endpoint = FlakyEndpoint;

    async fn connect(&self, _scope: CancellationToken) -> Option<FlakyEndpoint> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Some(FlakyEndpoint::new(id, self.fail_after))
    }
}
