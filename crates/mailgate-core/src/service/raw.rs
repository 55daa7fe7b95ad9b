//! Restricted passthrough to protocol primitives.
//!
//! Callers name a primitive and pass string arguments; only the names in
//! [`RawCommand::parse`] are accepted. Commands that can change the server's
//! selected mailbox clear the selection cache before they run.

use mailgate_imap::{
    AccessMode, MailboxStatus, Protocol, SearchCriteria, StatusAttribute, Uid, is_wire_safe,
};
use mailgate_mime::utf7::encode_mailbox_name;

use super::bridge::Bridge;
use super::parse::{folder_descriptor, status_record};
use super::selection::SelectionCache;
use crate::model::{FolderDescriptor, FolderStatusRecord};
use crate::{Error, Result};

/// A validated raw command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawCommand {
    /// NOOP.
    Noop,
    /// CAPABILITY.
    Capability,
    /// UID SEARCH with the arguments as criteria text (ALL when empty).
    Search(String),
    /// SELECT or EXAMINE.
    Select {
        /// Mailbox name.
        mailbox: String,
        /// Access mode.
        mode: AccessMode,
    },
    /// EXPUNGE.
    Expunge,
    /// LIST "" "*".
    List,
    /// STATUS (MESSAGES UNSEEN UIDNEXT).
    Status(String),
    /// CREATE.
    Create(String),
    /// DELETE.
    Delete(String),
    /// RENAME.
    Rename {
        /// Current name.
        from: String,
        /// New name.
        to: String,
    },
    /// A free-form command line.
    Command(String),
}

/// Result of a raw command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawOutput {
    /// The command completed without data.
    Done,
    /// Capability names.
    Capabilities(Vec<String>),
    /// UIDs in server order.
    Uids(Vec<Uid>),
    /// Selection data.
    Selected(MailboxStatus),
    /// Listed folders.
    Folders(Vec<FolderDescriptor>),
    /// Mailbox counters.
    Status(FolderStatusRecord),
    /// Server response transcript, lossily decoded.
    Text(String),
}

impl RawCommand {
    /// Looks up a command by name (case-insensitive) and checks its arguments.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownCommand` for names outside the table and
    /// `Error::InvalidArguments` for a wrong argument count or mode, or for
    /// an argument containing CR, LF or NUL.
    pub fn parse(name: &str, args: &[&str]) -> Result<Self> {
        let lower = name.trim().to_ascii_lowercase();
        let command = match lower.as_str() {
            "noop" => {
                expect_args(&lower, args, 0)?;
                Self::Noop
            }
            "capability" | "capabilities" => {
                expect_args(&lower, args, 0)?;
                Self::Capability
            }
            "search" => Self::Search(args.join(" ")),
            "select" | "select_folder" => match args {
                [mailbox] => Self::Select {
                    mailbox: (*mailbox).to_string(),
                    mode: AccessMode::ReadWrite,
                },
                [mailbox, mode] => Self::Select {
                    mailbox: (*mailbox).to_string(),
                    mode: parse_mode(&lower, mode)?,
                },
                _ => return Err(invalid(&lower, "expected a mailbox and an optional mode")),
            },
            "examine" => {
                expect_args(&lower, args, 1)?;
                Self::Select {
                    mailbox: args[0].to_string(),
                    mode: AccessMode::ReadOnly,
                }
            }
            "expunge" => {
                expect_args(&lower, args, 0)?;
                Self::Expunge
            }
            "list" | "list_folders" => {
                expect_args(&lower, args, 0)?;
                Self::List
            }
            "status" | "folder_status" => {
                expect_args(&lower, args, 1)?;
                Self::Status(args[0].to_string())
            }
            "create" | "create_folder" => {
                expect_args(&lower, args, 1)?;
                Self::Create(args[0].to_string())
            }
            "delete" | "delete_folder" => {
                expect_args(&lower, args, 1)?;
                Self::Delete(args[0].to_string())
            }
            "rename" | "rename_folder" => {
                expect_args(&lower, args, 2)?;
                Self::Rename {
                    from: args[0].to_string(),
                    to: args[1].to_string(),
                }
            }
            "command" => {
                if args.is_empty() || args.iter().all(|a| a.trim().is_empty()) {
                    return Err(invalid(&lower, "expected a command line"));
                }
                Self::Command(args.join(" "))
            }
            _ => return Err(Error::UnknownCommand(name.to_string())),
        };
        if !args.iter().all(|arg| is_wire_safe(arg)) {
            return Err(invalid(&lower, "arguments must not contain CR, LF or NUL"));
        }
        Ok(command)
    }

    /// Returns true if running the command may leave a different mailbox
    /// selected on the server, or none.
    #[must_use]
    pub const fn affects_selection(&self) -> bool {
        matches!(
            self,
            Self::Select { .. } | Self::Delete(_) | Self::Rename { .. } | Self::Command(_)
        )
    }
}

fn expect_args(command: &str, args: &[&str], count: usize) -> Result<()> {
    if args.len() == count {
        Ok(())
    } else {
        Err(invalid(
            command,
            &format!("expected {count} argument(s), got {}", args.len()),
        ))
    }
}

fn parse_mode(command: &str, mode: &str) -> Result<AccessMode> {
    match mode.to_ascii_lowercase().as_str() {
        "readonly" | "read-only" => Ok(AccessMode::ReadOnly),
        "readwrite" | "read-write" => Ok(AccessMode::ReadWrite),
        _ => Err(invalid(command, "mode must be readonly or readwrite")),
    }
}

fn invalid(command: &str, reason: &str) -> Error {
    Error::InvalidArguments {
        command: command.to_string(),
        reason: reason.to_string(),
    }
}

/// Runs a validated command on the session.
pub(super) async fn execute<P: Protocol>(
    command: RawCommand,
    bridge: &Bridge<P>,
    selection: &mut SelectionCache,
) -> Result<RawOutput> {
    if command.affects_selection() {
        selection.invalidate();
    }
    tracing::debug!(?command, "raw command");

    let output = match command {
        RawCommand::Noop => {
            bridge.run(|p| p.noop()).await?;
            RawOutput::Done
        }
        RawCommand::Capability => {
            let caps = bridge.run(|p| p.capabilities()).await?;
            RawOutput::Capabilities(caps.iter().map(ToString::to_string).collect())
        }
        RawCommand::Search(text) => {
            let criteria = if text.trim().is_empty() {
                SearchCriteria::All
            } else {
                SearchCriteria::Raw(text)
            };
            RawOutput::Uids(bridge.run(move |p| p.search(&criteria)).await?)
        }
        RawCommand::Select { mailbox, mode } => {
            let wire = encode_mailbox_name(&mailbox);
            RawOutput::Selected(bridge.run(move |p| p.select(&wire, mode)).await?)
        }
        RawCommand::Expunge => {
            bridge.run(|p| p.expunge()).await?;
            RawOutput::Done
        }
        RawCommand::List => {
            let entries = bridge.run(|p| p.list_folders()).await?;
            RawOutput::Folders(entries.iter().map(folder_descriptor).collect())
        }
        RawCommand::Status(mailbox) => {
            let wire = encode_mailbox_name(&mailbox);
            let items = bridge
                .run(move |p| p.folder_status(&wire, &STATUS_ITEMS))
                .await?;
            RawOutput::Status(status_record(&items))
        }
        RawCommand::Create(mailbox) => {
            let wire = encode_mailbox_name(&mailbox);
            bridge.run(move |p| p.create_folder(&wire)).await?;
            RawOutput::Done
        }
        RawCommand::Delete(mailbox) => {
            let wire = encode_mailbox_name(&mailbox);
            bridge.run(move |p| p.delete_folder(&wire)).await?;
            RawOutput::Done
        }
        RawCommand::Rename { from, to } => {
            let (from, to) = (encode_mailbox_name(&from), encode_mailbox_name(&to));
            bridge.run(move |p| p.rename_folder(&from, &to)).await?;
            RawOutput::Done
        }
        RawCommand::Command(line) => {
            let transcript = bridge.run(move |p| p.raw_command(&line)).await?;
            RawOutput::Text(String::from_utf8_lossy(&transcript).into_owned())
        }
    };
    Ok(output)
}

/// Items requested by every STATUS the adapter issues.
pub(super) const STATUS_ITEMS: [StatusAttribute; 3] = [
    StatusAttribute::Messages,
    StatusAttribute::Unseen,
    StatusAttribute::UidNext,
];

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
    use super::*;

    mod parse_tests {
        use super::*;

        #[test]
        fn names_are_case_insensitive() {
            assert_eq!(RawCommand::parse("NOOP", &[]).unwrap(), RawCommand::Noop);
            assert_eq!(
                RawCommand::parse("Capabilities", &[]).unwrap(),
                RawCommand::Capability
            );
        }

        #[test]
        fn select_modes() {
            assert_eq!(
                RawCommand::parse("select", &["INBOX"]).unwrap(),
                RawCommand::Select {
                    mailbox: "INBOX".to_string(),
                    mode: AccessMode::ReadWrite
                }
            );
            assert_eq!(
                RawCommand::parse("select_folder", &["INBOX", "readonly"]).unwrap(),
                RawCommand::Select {
                    mailbox: "INBOX".to_string(),
                    mode: AccessMode::ReadOnly
                }
            );
            assert_eq!(
                RawCommand::parse("examine", &["Sent"]).unwrap(),
                RawCommand::Select {
                    mailbox: "Sent".to_string(),
                    mode: AccessMode::ReadOnly
                }
            );
        }

        #[test]
        fn bad_mode() {
            let err = RawCommand::parse("select", &["INBOX", "sometimes"]).unwrap_err();
            assert!(matches!(err, Error::InvalidArguments { command, .. } if command == "select"));
        }

        #[test]
        fn wrong_arity() {
            assert!(matches!(
                RawCommand::parse("rename", &["a"]),
                Err(Error::InvalidArguments { .. })
            ));
            assert!(matches!(
                RawCommand::parse("noop", &["x"]),
                Err(Error::InvalidArguments { .. })
            ));
            assert!(matches!(
                RawCommand::parse("command", &[]),
                Err(Error::InvalidArguments { .. })
            ));
        }

        #[test]
        fn unknown_name() {
            let err = RawCommand::parse("append", &["INBOX"]).unwrap_err();
            assert!(matches!(err, Error::UnknownCommand(name) if name == "append"));
        }

        #[test]
        fn line_breaks_are_rejected() {
            for (name, args) in [
                ("command", vec!["NOOP\r\nZ9 DELETE INBOX"]),
                ("search", vec!["SUBJECT", "\"x\nZ9 LOGOUT\""]),
                ("select", vec!["IN\0BOX"]),
            ] {
                let err = RawCommand::parse(name, &args).unwrap_err();
                assert!(
                    matches!(err, Error::InvalidArguments { ref command, .. } if command == name),
                    "{name}: {err}"
                );
            }
        }

        #[test]
        fn search_joins_arguments() {
            assert_eq!(
                RawCommand::parse("search", &["FROM", "alice"]).unwrap(),
                RawCommand::Search("FROM alice".to_string())
            );
        }

        #[test]
        fn selection_affecting_commands() {
            for (name, args) in [
                ("select", vec!["INBOX"]),
                ("examine", vec!["INBOX"]),
                ("delete", vec!["Old"]),
                ("rename", vec!["Old", "New"]),
                ("command", vec!["UNSELECT"]),
            ] {
                assert!(RawCommand::parse(name, &args).unwrap().affects_selection());
            }
            for (name, args) in [
                ("noop", vec![]),
                ("list", vec![]),
                ("create", vec!["New"]),
                ("status", vec!["INBOX"]),
            ] {
                assert!(!RawCommand::parse(name, &args).unwrap().affects_selection());
            }
        }
    }
}
