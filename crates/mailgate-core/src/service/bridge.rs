//! Runs blocking protocol calls on a dedicated worker thread.
//!
//! The worker owns the [`Protocol`] value outright and executes jobs in
//! submission order, so two calls never overlap on one connection. Callers
//! await a oneshot reply; a caller that goes away leaves its job to finish
//! on the worker.

use std::thread;

use mailgate_imap::Protocol;
use tokio::sync::{mpsc, oneshot};

use crate::{Error, Result};

type Job<P> = Box<dyn FnOnce(&mut P) + Send>;

/// Handle to the worker that owns one protocol session.
#[derive(Debug)]
pub struct Bridge<P> {
    jobs: mpsc::UnboundedSender<Job<P>>,
}

impl<P: Protocol> Bridge<P> {
    /// Moves the session onto a new worker thread.
    ///
    /// The worker stops, dropping the session, once every handle is gone.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the thread cannot be spawned.
    pub fn spawn(protocol: P) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        thread::Builder::new()
            .name("mailgate-imap".into())
            .spawn(move || Self::run_loop(protocol, rx))
            .map_err(mailgate_imap::Error::Io)?;

        Ok(Self { jobs: tx })
    }

    fn run_loop(mut protocol: P, mut rx: mpsc::UnboundedReceiver<Job<P>>) {
        while let Some(job) = rx.blocking_recv() {
            job(&mut protocol);
        }
        tracing::debug!("bridge worker stopped");
    }

    /// Runs one blocking call on the worker and waits for its result.
    ///
    /// Protocol errors are returned unchanged inside [`Error::Protocol`].
    ///
    /// # Errors
    ///
    /// Returns `Error::SessionClosed` if the worker has stopped, otherwise
    /// whatever the call returned.
    pub async fn run<T, F>(&self, call: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut P) -> mailgate_imap::Result<T> + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let job: Job<P> = Box::new(move |protocol| {
            let _ = reply.send(call(protocol));
        });

        self.jobs.send(job).map_err(|_| Error::SessionClosed)?;
        rx.await.map_err(|_| Error::SessionClosed)?.map_err(Error::from)
    }

    /// Returns true once the worker has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.jobs.is_closed()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::service::mock::Recorder;

    #[tokio::test]
    async fn runs_calls_in_order() {
        let recorder = Recorder::default();
        let calls = Arc::clone(&recorder.calls);
        let bridge = Bridge::spawn(recorder).unwrap();

        let (a, b) = tokio::join!(
            bridge.run(|p| p.create_folder("A")),
            bridge.run(|p| p.create_folder("B")),
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(*calls.lock().unwrap(), vec!["create A", "create B"]);
    }

    #[tokio::test]
    async fn errors_pass_through() {
        let bridge = Bridge::spawn(Recorder::default()).unwrap();
        let err = bridge
            .run(|_| -> mailgate_imap::Result<()> {
                Err(mailgate_imap::Error::Bad("Command unknown".to_string()))
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(mailgate_imap::Error::Bad(text)) if text == "Command unknown"
        ));
    }

    #[tokio::test]
    async fn panicking_call_closes_session() {
        let bridge = Bridge::spawn(Recorder::default()).unwrap();
        let err = bridge
            .run(|_| -> mailgate_imap::Result<()> { panic!("boom") })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SessionClosed));

        let err = bridge.run(|p| p.noop()).await.unwrap_err();
        assert!(matches!(err, Error::SessionClosed));
    }
}
