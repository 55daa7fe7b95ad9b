//! Account validation.

use mailgate_imap::Security;

use super::model::ImapAccount;

/// Validation error for account configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Email address format is invalid.
    InvalidEmail,
    /// IMAP host is empty.
    EmptyHost,
    /// IMAP port is invalid.
    InvalidPort,
    /// IMAP username is empty.
    EmptyUsername,
    /// IMAP password is empty.
    EmptyPassword,
    /// A timeout is zero.
    InvalidTimeout,
    /// Trash mailbox name is empty.
    EmptyTrashMailbox,
    /// The security mode cannot be used.
    UnsupportedSecurity,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "Invalid email address format",
            Self::EmptyHost => "IMAP server is required",
            Self::InvalidPort => "IMAP port must be 1-65535",
            Self::EmptyUsername => "IMAP username is required",
            Self::EmptyPassword => "IMAP password is required",
            Self::InvalidTimeout => "Timeouts must be at least one second",
            Self::EmptyTrashMailbox => "Trash mailbox name is required",
            Self::UnsupportedSecurity => "STARTTLS is not supported; use implicit TLS",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "email",
            Self::EmptyHost => "host",
            Self::InvalidPort => "port",
            Self::EmptyUsername => "username",
            Self::EmptyPassword => "password",
            Self::InvalidTimeout => "timeout",
            Self::EmptyTrashMailbox => "trash_mailbox",
            Self::UnsupportedSecurity => "security",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating an account.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate an account configuration.
///
/// Returns `Ok(())` if valid, or `Err(Vec<ValidationError>)` with all errors.
/// The email address is optional; when present it must be well-formed.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any fields are invalid.
pub fn validate_account(account: &ImapAccount) -> ValidationResult {
    let mut errors = Vec::new();

    if !account.email.trim().is_empty() && !is_valid_email(&account.email) {
        errors.push(ValidationError::InvalidEmail);
    }
    if account.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }
    if account.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }
    if account.security == Security::StartTls {
        errors.push(ValidationError::UnsupportedSecurity);
    }
    if account.username.trim().is_empty() {
        errors.push(ValidationError::EmptyUsername);
    }
    if account.password.is_empty() {
        errors.push(ValidationError::EmptyPassword);
    }
    if account.connect_timeout_secs == 0 || account.io_timeout_secs == 0 {
        errors.push(ValidationError::InvalidTimeout);
    }
    if account.trash_mailbox.trim().is_empty() {
        errors.push(ValidationError::EmptyTrashMailbox);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Basic email validation.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.trim().split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|part| !part.is_empty())
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

    fn complete() -> ImapAccount {
        ImapAccount {
            password: "secret".to_string(),
            ..ImapAccount::with_email("test@gmail.com")
        }
    }

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user.name@example.com"));
        assert!(is_valid_email("user@sub.example.com"));
    }

    #[test]
    fn test_invalid_email() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("user"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user@example..com"));
    }

    #[test]
    fn test_validate_empty_account() {
        let errors = validate_account(&ImapAccount::default()).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyHost,
                ValidationError::EmptyUsername,
                ValidationError::EmptyPassword,
            ]
        );
    }

    #[test]
    fn test_validate_complete_account() {
        assert!(validate_account(&complete()).is_ok());
    }

    #[test]
    fn test_email_is_optional() {
        let account = ImapAccount {
            email: String::new(),
            ..complete()
        };
        assert!(validate_account(&account).is_ok());
    }

    #[test]
    fn test_starttls_rejected() {
        let account = ImapAccount {
            security: Security::StartTls,
            port: 143,
            ..complete()
        };
        let errors = validate_account(&account).unwrap_err();
        assert_eq!(errors, vec![ValidationError::UnsupportedSecurity]);
        assert_eq!(errors[0].field(), "security");
    }

    #[test]
    fn test_collects_every_error() {
        let account = ImapAccount {
            email: "broken".to_string(),
            port: 0,
            io_timeout_secs: 0,
            trash_mailbox: "  ".to_string(),
            ..complete()
        };
        let errors = validate_account(&account).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidEmail,
                ValidationError::InvalidPort,
                ValidationError::InvalidTimeout,
                ValidationError::EmptyTrashMailbox,
            ]
        );
    }
}
