//! Diagnostics returned alongside the result of an operation.
//!
//! Operations do not rely on a global logger to tell the caller what they
//! did. Everything worth reporting is returned as a [`Notice`] inside the
//! operation's [`Outcome`]; the same notice is also emitted as a `tracing`
//! event for whoever has a subscriber installed.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

/// How loudly a notice should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Expected side effect.
    Info,
    /// Something the operator probably wants to look at.
    Warning,
}

/// What a notice is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// The default port already had the requested value.
    PortUnchanged,
    /// An auto-assigned peer port followed the new default.
    PortUpdated,
    /// A peer received an address from the subnet.
    AddressAssigned,
    /// A pinned address outside the new subnet was replaced.
    ManualAddressReplaced,
    /// An explicit address is also used by another peer.
    AddressShared,
    /// Links still refer to a removed peer.
    DanglingLinks,
    /// A link followed a key rotation and got a new preshared key.
    LinkRekeyed,
    /// Links referring to missing peers were removed.
    LinksPruned,
}

impl NoticeKind {
    /// Severity of this kind of notice.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::PortUnchanged
            | Self::ManualAddressReplaced
            | Self::AddressShared
            | Self::DanglingLinks => Severity::Warning,
            Self::PortUpdated | Self::AddressAssigned | Self::LinkRekeyed | Self::LinksPruned => {
                Severity::Info
            }
        }
    }
}

/// A structured diagnostic produced by an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// What happened.
    pub kind: NoticeKind,
    /// The peer (or other entity) concerned.
    pub subject: String,
    /// Human-readable detail.
    pub message: String,
}

impl Notice {
    /// Creates a notice.
    #[must_use]
    pub fn new(kind: NoticeKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Severity of the notice.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

/// The value an operation produced plus the notices it raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    /// The operation's result.
    pub value: T,
    /// Diagnostics, in the order they were raised.
    pub notices: Vec<Notice>,
}

impl<T> Outcome<T> {
    /// An outcome without notices.
    pub const fn new(value: T) -> Self {
        Self {
            value,
            notices: Vec::new(),
        }
    }

    /// An outcome with the given notices.
    pub const fn with_notices(value: T, notices: Vec<Notice>) -> Self {
        Self { value, notices }
    }

    /// Discards the notices.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Returns true if a notice of `kind` was raised.
    pub fn has(&self, kind: NoticeKind) -> bool {
        self.notices.iter().any(|n| n.kind == kind)
    }

    /// Notices with [`Severity::Warning`].
    pub fn warnings(&self) -> impl Iterator<Item = &Notice> {
        self.notices
            .iter()
            .filter(|n| n.severity() == Severity::Warning)
    }
}

/// Collects notices for one operation.
///
/// Notices are only mirrored to `tracing` when the operation commits, so a
/// failed operation leaves no trace of the changes it planned.
#[derive(Debug, Default)]
pub(crate) struct NoticeLog {
    notices: Vec<Notice>,
}

impl NoticeLog {
    pub(crate) fn push(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub(crate) fn finish<T>(self, value: T) -> Outcome<T> {
        for notice in &self.notices {
            match notice.severity() {
                Severity::Info => {
                    info!(kind = ?notice.kind, subject = %notice.subject, "{}", notice.message);
                }
                Severity::Warning => {
                    warn!(kind = ?notice.kind, subject = %notice.subject, "{}", notice.message);
                }
            }
        }
        Outcome::with_notices(value, self.notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_filters_by_severity() {
        let mut log = NoticeLog::default();
        log.push(Notice::new(NoticeKind::PortUpdated, "a", "port set to 4242"));
        log.push(Notice::new(NoticeKind::ManualAddressReplaced, "b", "moved"));
        let outcome = log.finish(());

        assert_eq!(outcome.notices.len(), 2);
        assert!(outcome.has(NoticeKind::PortUpdated));
        let warnings: Vec<_> = outcome.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].subject, "b");
    }

    #[test]
    fn display_names_subject() {
        let notice = Notice::new(NoticeKind::DanglingLinks, "gw", "1 link still refers to this peer");
        assert_eq!(notice.to_string(), "gw: 1 link still refers to this peer");
    }
}
