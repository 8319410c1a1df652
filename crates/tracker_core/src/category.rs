use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

/// A named grouping of trackers. The name is the category's identity; two
/// categories with the same name are the same category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    /// Transient UI-selection flag, carried as pass-through state.
    #[serde(default)]
    pub is_selected: bool,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            is_selected: false,
        })
    }
}

pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(TrackerError::Validation(
            "category name must not be empty".into(),
        ));
    }
    Ok(())
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Category {}

impl Hash for Category {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}
