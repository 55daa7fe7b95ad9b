//! Account model types.

use std::time::Duration;

use mailgate_imap::{Config, Security};
use serde::{Deserialize, Serialize};

const fn default_connect_timeout() -> u64 {
    30
}

const fn default_io_timeout() -> u64 {
    60
}

fn default_trash_mailbox() -> String {
    "Trash".to_string()
}

/// IMAP account configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImapAccount {
    /// Email address, used for provider detection and as the default username.
    #[serde(default)]
    pub email: String,
    /// Server hostname.
    pub host: String,
    /// Server port (993 for implicit TLS, 143 otherwise).
    pub port: u16,
    /// Security mode.
    #[serde(default)]
    pub security: Security,
    /// Username for authentication.
    pub username: String,
    /// Password for authentication.
    pub password: String,
    /// TCP connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Read/write timeout in seconds.
    #[serde(default = "default_io_timeout")]
    pub io_timeout_secs: u64,
    /// Mailbox that non-permanent deletes copy into.
    #[serde(default = "default_trash_mailbox")]
    pub trash_mailbox: String,
}

impl Default for ImapAccount {
    fn default() -> Self {
        Self {
            email: String::new(),
            host: String::new(),
            port: Security::default().default_port(),
            security: Security::default(),
            username: String::new(),
            password: String::new(),
            connect_timeout_secs: default_connect_timeout(),
            io_timeout_secs: default_io_timeout(),
            trash_mailbox: default_trash_mailbox(),
        }
    }
}

impl ImapAccount {
    /// Create an account with common defaults for well-known providers.
    #[must_use]
    pub fn with_email(email: &str) -> Self {
        let mut account = Self {
            email: email.to_string(),
            username: email.to_string(),
            ..Self::default()
        };

        // Auto-detect provider settings
        if let Some(domain) = email.split('@').nth(1) {
            match domain.to_lowercase().as_str() {
                "gmail.com" | "googlemail.com" => {
                    account.host = "imap.gmail.com".to_string();
                    account.trash_mailbox = "[Gmail]/Trash".to_string();
                }
                "outlook.com" | "hotmail.com" | "live.com" => {
                    account.host = "outlook.office365.com".to_string();
                    account.trash_mailbox = "Deleted Items".to_string();
                }
                "yahoo.com" | "ymail.com" => {
                    account.host = "imap.mail.yahoo.com".to_string();
                }
                "icloud.com" | "me.com" | "mac.com" => {
                    account.host = "imap.mail.me.com".to_string();
                    account.trash_mailbox = "Deleted Messages".to_string();
                }
                _ => {}
            }
        }

        account
    }

    /// Builds the connection configuration for this account.
    #[must_use]
    pub fn connection_config(&self) -> Config {
        Config::builder(self.host.trim())
            .port(self.port)
            .security(self.security)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .io_timeout(Duration::from_secs(self.io_timeout_secs))
            .build()
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
    use super::*;

    mod defaults_tests {
        use super::*;

        #[test]
        fn default_is_implicit_tls() {
            let account = ImapAccount::default();
            assert_eq!(account.security, Security::Implicit);
            assert_eq!(account.port, 993);
            assert_eq!(account.trash_mailbox, "Trash");
        }

        #[test]
        fn connection_config() {
            let account = ImapAccount {
                host: " imap.example.com ".to_string(),
                port: 1143,
                security: Security::None,
                io_timeout_secs: 5,
                ..ImapAccount::default()
            };
            let config = account.connection_config();
            assert_eq!(config.host, "imap.example.com");
            assert_eq!(config.port, 1143);
            assert_eq!(config.security, Security::None);
            assert_eq!(config.io_timeout, Duration::from_secs(5));
            assert_eq!(config.connect_timeout, Duration::from_secs(30));
        }
    }

    mod provider_tests {
        use super::*;

        #[test]
        fn with_email_gmail() {
            let account = ImapAccount::with_email("user@gmail.com");
            assert_eq!(account.host, "imap.gmail.com");
            assert_eq!(account.port, 993);
            assert_eq!(account.username, "user@gmail.com");
            assert_eq!(account.trash_mailbox, "[Gmail]/Trash");
        }

        #[test]
        fn with_email_outlook() {
            for email in ["user@outlook.com", "user@hotmail.com", "user@live.com"] {
                let account = ImapAccount::with_email(email);
                assert_eq!(account.host, "outlook.office365.com");
                assert_eq!(account.trash_mailbox, "Deleted Items");
            }
        }

        #[test]
        fn with_email_yahoo() {
            let account = ImapAccount::with_email("user@ymail.com");
            assert_eq!(account.host, "imap.mail.yahoo.com");
            assert_eq!(account.trash_mailbox, "Trash");
        }

        #[test]
        fn with_email_icloud() {
            let account = ImapAccount::with_email("user@me.com");
            assert_eq!(account.host, "imap.mail.me.com");
        }

        #[test]
        fn with_email_unknown_domain() {
            let account = ImapAccount::with_email("user@example.org");
            assert!(account.host.is_empty());
            assert_eq!(account.username, "user@example.org");
        }
    }

    mod serde_tests {
        use super::*;

        #[test]
        fn deserialize_fills_defaults() {
            let json = r#"{
                "host": "imap.example.com",
                "port": 993,
                "username": "me",
                "password": "secret"
            }"#;
            let account: ImapAccount = serde_json::from_str(json).unwrap();
            assert_eq!(account.security, Security::Implicit);
            assert_eq!(account.connect_timeout_secs, 30);
            assert_eq!(account.io_timeout_secs, 60);
            assert_eq!(account.trash_mailbox, "Trash");
        }

        #[test]
        fn security_is_lowercase() {
            let account = ImapAccount {
                security: Security::None,
                ..ImapAccount::with_email("a@b.com")
            };
            let json = serde_json::to_string(&account).unwrap();
            assert!(json.contains(r#""security":"none""#));
            let back: ImapAccount = serde_json::from_str(&json).unwrap();
            assert_eq!(back, account);
        }
    }
}
