//! Colors used in icon descriptors.

use serde::{Deserialize, Serialize};

/// A "#RRGGBB" color, stored uppercase so equal colors compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn hex(s: &str) -> Self {
        let digits = s.trim_start_matches('#');
        Color(format!("#{}", digits.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
