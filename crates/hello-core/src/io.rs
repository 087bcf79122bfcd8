//! Connection stream with read and write timeouts
//!
//! hyper only bounds how long request headers may take. [`TimeoutIo`] adds
//! the rest: a read that stays pending for the read timeout (an idle client,
//! including between keep-alive requests) and a write that stays pending for
//! the write timeout (a client that stopped reading) both fail with
//! `ErrorKind::TimedOut`, which makes hyper drop the connection.

use std::future::Future;
use std::io::{self, IoSlice};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::{Instant, Sleep};

/// Timer that starts when an operation first goes pending
#[derive(Debug)]
struct Deadline {
    timeout: Duration,
    sleep: Pin<Box<Sleep>>,
    armed: bool,
}

impl Deadline {
    fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            sleep: Box::pin(tokio::time::sleep(timeout)),
            armed: false,
        }
    }

    /// Arm on first call, then report whether the timeout has elapsed.
    /// Registers the waker when it has not.
    fn poll_expired(&mut self, cx: &mut Context<'_>) -> bool {
        if !self.armed {
            self.sleep.as_mut().reset(Instant::now() + self.timeout);
            self.armed = true;
        }

        if self.sleep.as_mut().poll(cx).is_ready() {
            self.armed = false;
            true
        } else {
            false
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }

    /// Map a poll of the guarded operation through the deadline
    fn guard<T>(&mut self, cx: &mut Context<'_>, poll: Poll<io::Result<T>>, op: &str) -> Poll<io::Result<T>> {
        match poll {
            Poll::Ready(result) => {
                self.disarm();
                Poll::Ready(result)
            }
            Poll::Pending if self.poll_expired(cx) => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("{} timed out after {:?}", op, self.timeout),
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Stream wrapper enforcing read and write timeouts
///
/// Both timeouts measure inactivity: every completed read or write re-arms
/// its timer. A response is therefore not bounded by one deadline as a
/// whole; a client that keeps reading slowly keeps the write side alive.
#[derive(Debug)]
pub struct TimeoutIo<S> {
    inner: S,
    read: Deadline,
    write: Deadline,
}

impl<S> TimeoutIo<S> {
    /// Wrap `inner`. Must be called inside a tokio runtime with time enabled.
    pub fn new(inner: S, read_timeout: Duration, write_timeout: Duration) -> Self {
        Self {
            inner,
            read: Deadline::new(read_timeout),
            write: Deadline::new(write_timeout),
        }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for TimeoutIo<S> {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        this.read.guard(cx, poll, "read")
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for TimeoutIo<S> {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write(cx, buf);
        this.write.guard(cx, poll, "write")
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write_vectored(cx, bufs);
        this.write.guard(cx, poll, "write")
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_flush(cx);
        this.write.guard(cx, poll, "flush")
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_shutdown(cx);
        this.write.guard(cx, poll, "shutdown")
    }
}
