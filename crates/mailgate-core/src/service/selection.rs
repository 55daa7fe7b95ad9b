//! The selected-mailbox state machine.
//!
//! A connection has at most one selected mailbox. The cache remembers which
//! one, and in which mode, so consecutive operations on the same mailbox
//! skip the SELECT round trip. It is only trusted after a successful
//! selection: the state is cleared before a SELECT is submitted and set
//! once it succeeds, so a failed or abandoned selection leaves it
//! [`SelectionState::Unselected`].

use mailgate_imap::{AccessMode, MailboxStatus, Protocol};
use mailgate_mime::utf7::encode_mailbox_name;
use tracing::{debug, warn};

use super::bridge::Bridge;
use crate::{Error, Result};

/// Server errors that mean the mailbox does not exist, lowercase.
const NOT_FOUND_MARKERS: [&str; 4] = [
    "does not exist",
    "no such mailbox",
    "nonexistent namespace",
    "[nonexistent]",
];

/// What the connection currently has selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SelectionState {
    /// Nothing selected, or the selection is unknown.
    #[default]
    Unselected,
    /// A mailbox is selected.
    Selected {
        /// Mailbox name as given by the caller (not UTF-7 encoded).
        mailbox: String,
        /// Access mode it was selected with.
        mode: AccessMode,
    },
}

/// Tracks the selected mailbox of one session.
#[derive(Debug, Default)]
pub struct SelectionCache {
    state: SelectionState,
}

impl SelectionCache {
    /// Creates an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SelectionState::Unselected,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Returns true if `mailbox` is selected in exactly `mode`.
    #[must_use]
    pub fn is_selected(&self, mailbox: &str, mode: AccessMode) -> bool {
        matches!(&self.state, SelectionState::Selected { mailbox: m, mode: md } if m == mailbox && *md == mode)
    }

    /// Returns true if `mailbox` is selected in any mode.
    #[must_use]
    pub fn holds(&self, mailbox: &str) -> bool {
        matches!(&self.state, SelectionState::Selected { mailbox: m, .. } if m == mailbox)
    }

    /// Forgets the selection.
    pub fn invalidate(&mut self) {
        if self.state != SelectionState::Unselected {
            debug!(state = ?self.state, "selection invalidated");
        }
        self.state = SelectionState::Unselected;
    }

    /// Makes sure `mailbox` is selected in `mode`, issuing SELECT or EXAMINE
    /// only when it is not already.
    ///
    /// # Errors
    ///
    /// Returns `Error::MailboxNotFound` if the server says the mailbox does
    /// not exist; any other failure is passed through. Either way the cache
    /// is left unselected.
    pub async fn ensure<P: Protocol>(
        &mut self,
        bridge: &Bridge<P>,
        mailbox: &str,
        mode: AccessMode,
    ) -> Result<()> {
        if self.is_selected(mailbox, mode) {
            debug!(mailbox, %mode, "selection reused");
            return Ok(());
        }
        self.select(bridge, mailbox, mode).await.map(|_| ())
    }

    /// Issues SELECT or EXAMINE unconditionally and records the result.
    ///
    /// # Errors
    ///
    /// Same as [`SelectionCache::ensure`].
    pub async fn select<P: Protocol>(
        &mut self,
        bridge: &Bridge<P>,
        mailbox: &str,
        mode: AccessMode,
    ) -> Result<MailboxStatus> {
        self.state = SelectionState::Unselected;

        let wire_name = encode_mailbox_name(mailbox);
        match bridge.run(move |p| p.select(&wire_name, mode)).await {
            Ok(status) => {
                debug!(mailbox, %mode, exists = status.exists, "selection issued");
                self.state = SelectionState::Selected {
                    mailbox: mailbox.to_string(),
                    mode,
                };
                Ok(status)
            }
            Err(err) => {
                warn!(mailbox, %mode, error = %err, "selection failed");
                Err(classify_select_error(err, mailbox))
            }
        }
    }
}

/// Maps "mailbox does not exist" server replies to `MailboxNotFound`.
pub(crate) fn classify_select_error(err: Error, mailbox: &str) -> Error {
    let Error::Protocol(inner) = &err else {
        return err;
    };
    let Some(text) = inner.server_text() else {
        return err;
    };
    let text = text.to_lowercase();
    if NOT_FOUND_MARKERS.iter().any(|marker| text.contains(marker)) {
        Error::MailboxNotFound {
            mailbox: mailbox.to_string(),
        }
    } else {
        err
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
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::service::mock::Recorder;

    fn bridge(missing: &[&str]) -> (Bridge<Recorder>, Arc<Mutex<Vec<String>>>) {
        let recorder = Recorder {
            missing: missing.iter().map(ToString::to_string).collect(),
            ..Recorder::default()
        };
        let calls = Arc::clone(&recorder.calls);
        (Bridge::spawn(recorder).unwrap(), calls)
    }

    mod ensure_tests {
        use super::*;

        #[tokio::test]
        async fn same_arguments_select_once() {
            let (bridge, calls) = bridge(&[]);
            let mut cache = SelectionCache::new();

            cache.ensure(&bridge, "INBOX", AccessMode::ReadOnly).await.unwrap();
            cache.ensure(&bridge, "INBOX", AccessMode::ReadOnly).await.unwrap();

            assert_eq!(*calls.lock().unwrap(), vec!["select INBOX read-only"]);
            assert!(cache.is_selected("INBOX", AccessMode::ReadOnly));
        }

        #[tokio::test]
        async fn mode_change_reselects() {
            let (bridge, calls) = bridge(&[]);
            let mut cache = SelectionCache::new();

            cache.ensure(&bridge, "INBOX", AccessMode::ReadOnly).await.unwrap();
            cache.ensure(&bridge, "INBOX", AccessMode::ReadWrite).await.unwrap();
            cache.ensure(&bridge, "Archive", AccessMode::ReadWrite).await.unwrap();

            assert_eq!(
                *calls.lock().unwrap(),
                vec![
                    "select INBOX read-only",
                    "select INBOX read-write",
                    "select Archive read-write",
                ]
            );
        }

        #[tokio::test]
        async fn names_are_sent_as_utf7() {
            let (bridge, calls) = bridge(&[]);
            let mut cache = SelectionCache::new();

            cache.ensure(&bridge, "Entwürfe", AccessMode::ReadOnly).await.unwrap();

            assert_eq!(*calls.lock().unwrap(), vec!["select Entw&APw-rfe read-only"]);
            assert!(cache.holds("Entwürfe"));
        }

        #[tokio::test]
        async fn missing_mailbox_resets_cache() {
            let (bridge, _calls) = bridge(&["Nope"]);
            let mut cache = SelectionCache::new();
            cache.ensure(&bridge, "INBOX", AccessMode::ReadOnly).await.unwrap();

            let err = cache
                .ensure(&bridge, "Nope", AccessMode::ReadOnly)
                .await
                .unwrap_err();

            assert!(matches!(err, Error::MailboxNotFound { mailbox } if mailbox == "Nope"));
            assert_eq!(cache.state(), &SelectionState::Unselected);
        }

        #[tokio::test]
        async fn invalidate_forces_select() {
            let (bridge, calls) = bridge(&[]);
            let mut cache = SelectionCache::new();

            cache.ensure(&bridge, "INBOX", AccessMode::ReadOnly).await.unwrap();
            cache.invalidate();
            cache.ensure(&bridge, "INBOX", AccessMode::ReadOnly).await.unwrap();

            assert_eq!(calls.lock().unwrap().len(), 2);
        }
    }

    mod classify_tests {
        use super::*;

        fn no(text: &str) -> Error {
            Error::Protocol(mailgate_imap::Error::No(text.to_string()))
        }

        #[test]
        fn not_found_markers() {
            for text in [
                "Mailbox does not exist",
                "NO SUCH MAILBOX",
                "[NONEXISTENT] Unknown Mailbox",
                "Nonexistent namespace.",
            ] {
                assert!(matches!(
                    classify_select_error(no(text), "X"),
                    Error::MailboxNotFound { .. }
                ));
            }
        }

        #[test]
        fn other_errors_pass_through() {
            assert!(matches!(
                classify_select_error(no("Permission denied"), "X"),
                Error::Protocol(mailgate_imap::Error::No(_))
            ));
            assert!(matches!(
                classify_select_error(Error::SessionClosed, "X"),
                Error::SessionClosed
            ));
        }
    }
}
