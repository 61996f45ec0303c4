use std::path::Path;

use tracing::info;

use parley_core::{CoreError, Result};

use crate::types::Profile;

impl Profile {
    /// Parses and validates a profile from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let profile: Profile = serde_json::from_str(json)
            .map_err(|e| CoreError::Profile(format!("invalid profile JSON: {}", e)))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Reads, parses, and validates a profile file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let profile = Self::from_json(&content)?;
        info!(
            path = %path.display(),
            roles = profile.experience.len(),
            "Loaded profile"
        );
        Ok(profile)
    }

    /// Fails fast on documents the answer layer cannot render from.
    pub fn validate(&self) -> Result<()> {
        if self.person.name.trim().is_empty() {
            return Err(CoreError::Profile("person.name must not be empty".to_string()));
        }
        if self.experience.is_empty() {
            return Err(CoreError::Profile(
                "profile needs at least one experience entry".to_string(),
            ));
        }
        for role in &self.experience {
            if role.company.trim().is_empty() {
                return Err(CoreError::Profile("role company must not be empty".to_string()));
            }
            validate_date(&role.start)?;
            if let Some(end) = &role.end {
                validate_date(end)?;
            }
        }
        Ok(())
    }
}

/// Dates are `YYYY-MM` so that lexical ordering is chronological.
fn validate_date(date: &str) -> Result<()> {
    let shape = date.len() == 7
        && date.as_bytes()[4] == b'-'
        && date[..4].chars().all(|c| c.is_ascii_digit())
        && date[5..].chars().all(|c| c.is_ascii_digit());
    let ok = shape && matches!(date[5..].parse::<u32>(), Ok(1..=12));
    if ok {
        Ok(())
    } else {
        Err(CoreError::Profile(format!(
            "invalid date '{}': expected YYYY-MM",
            date
        )))
    }
}
