use std::fmt;

use serde::{Deserialize, Serialize};

/// A single selectable entry in a selector widget.
///
/// `value` is the backend identifier, `label` the display string. The
/// sentinel value `"0"` stands for "all entries".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorOption {
    pub value: String,
    pub label: String,
}

impl SelectorOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// The "All" sentinel that selector lists start out with.
    #[must_use]
    pub fn all() -> Self {
        Self::new("0", "All")
    }
}

impl fmt::Display for SelectorOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.value)
    }
}

/// The service a user has picked in the surrounding application, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedService {
    pub id: String,
    pub name: String,
}

impl SelectedService {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
