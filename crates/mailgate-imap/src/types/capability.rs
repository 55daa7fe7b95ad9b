//! Server capabilities.

/// Server capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1` (RFC 3501)
    Imap4Rev1,
    /// `IMAP4rev2` (RFC 9051)
    Imap4Rev2,
    /// IDLE command support (RFC 2177)
    Idle,
    /// UIDPLUS extension (RFC 4315)
    UidPlus,
    /// MOVE extension (RFC 6851)
    Move,
    /// LITERAL+ extension (RFC 7888)
    LiteralPlus,
    /// STARTTLS support
    StartTls,
    /// LOGIN disabled
    LoginDisabled,
    /// AUTH mechanism
    Auth(String),
    /// CONDSTORE (RFC 7162)
    CondStore,
    /// SPECIAL-USE mailboxes (RFC 6154)
    SpecialUse,
    /// Unknown capability
    Unknown(String),
}

impl Capability {
    /// Parses a capability string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let upper = s.to_uppercase();
        match upper.as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "IMAP4REV2" => Self::Imap4Rev2,
            "IDLE" => Self::Idle,
            "UIDPLUS" => Self::UidPlus,
            "MOVE" => Self::Move,
            "LITERAL+" => Self::LiteralPlus,
            "STARTTLS" => Self::StartTls,
            "LOGINDISABLED" => Self::LoginDisabled,
            "CONDSTORE" => Self::CondStore,
            "SPECIAL-USE" => Self::SpecialUse,
            _ if upper.starts_with("AUTH=") => Self::Auth(s[5..].to_string()),
            _ => Self::Unknown(s.to_string()),
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imap4Rev1 => write!(f, "IMAP4rev1"),
            Self::Imap4Rev2 => write!(f, "IMAP4rev2"),
            Self::Idle => write!(f, "IDLE"),
            Self::UidPlus => write!(f, "UIDPLUS"),
            Self::Move => write!(f, "MOVE"),
            Self::LiteralPlus => write!(f, "LITERAL+"),
            Self::StartTls => write!(f, "STARTTLS"),
            Self::LoginDisabled => write!(f, "LOGINDISABLED"),
            Self::Auth(mech) => write!(f, "AUTH={mech}"),
            Self::CondStore => write!(f, "CONDSTORE"),
            Self::SpecialUse => write!(f, "SPECIAL-USE"),
            Self::Unknown(s) => write!(f, "{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod capability_parse_tests {
        use super::*;

        #[test]
        fn parse_imap4rev1() {
            assert_eq!(Capability::parse("IMAP4REV1"), Capability::Imap4Rev1);
            assert_eq!(Capability::parse("imap4rev1"), Capability::Imap4Rev1);
        }

        #[test]
        fn parse_move() {
            assert_eq!(Capability::parse("MOVE"), Capability::Move);
            assert_eq!(Capability::parse("move"), Capability::Move);
        }

        #[test]
        fn parse_uidplus() {
            assert_eq!(Capability::parse("UIDPLUS"), Capability::UidPlus);
        }

        #[test]
        fn parse_auth() {
            assert_eq!(
                Capability::parse("AUTH=PLAIN"),
                Capability::Auth("PLAIN".to_string())
            );
            assert_eq!(
                Capability::parse("auth=xoauth2"),
                Capability::Auth("xoauth2".to_string())
            );
        }

        #[test]
        fn parse_unknown() {
            assert_eq!(
                Capability::parse("X-GM-EXT-1"),
                Capability::Unknown("X-GM-EXT-1".to_string())
            );
        }
    }

    mod capability_display_tests {
        use super::*;

        #[test]
        fn display_round_trips() {
            for raw in ["IMAP4rev1", "MOVE", "UIDPLUS", "AUTH=PLAIN", "SPECIAL-USE"] {
                assert_eq!(Capability::parse(raw).to_string(), raw);
            }
        }
    }
}
