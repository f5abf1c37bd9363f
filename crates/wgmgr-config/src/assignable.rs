//! Values that remember whether they were assigned automatically.

use serde::{Deserialize, Serialize};

/// A value together with its provenance.
///
/// An auto-assigned value follows the global default it was derived from
/// (default port, subnet) and is rewritten when that default changes. A
/// manually pinned value is only changed by an explicit operator action, or
/// when it becomes invalid (an address outside a new subnet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignable<T> {
    /// The current value.
    pub value: T,
    /// Whether the value was derived from global defaults.
    #[serde(rename = "auto")]
    pub auto_assigned: bool,
}

impl<T> Assignable<T> {
    /// A value derived from global defaults.
    pub const fn auto(value: T) -> Self {
        Self {
            value,
            auto_assigned: true,
        }
    }

    /// A value pinned by the operator.
    pub const fn manual(value: T) -> Self {
        Self {
            value,
            auto_assigned: false,
        }
    }

    /// Returns true if the value may be rewritten automatically.
    pub const fn is_auto(&self) -> bool {
        self.auto_assigned
    }

    /// Replaces the value and marks it auto-assigned.
    pub fn reassign(&mut self, value: T) {
        self.value = value;
        self.auto_assigned = true;
    }
}
