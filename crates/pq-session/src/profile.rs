//! Display-only user profiles sent to the agent as `user_profile_id`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub label: String,
}

impl Profile {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    pub fn display_name(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

/// The configured profiles, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct ProfileDirectory {
    profiles: Vec<Profile>,
}

impl ProfileDirectory {
    /// Blank ids are skipped; for duplicate ids the first entry wins.
    pub fn new(profiles: Vec<Profile>) -> Self {
        let mut kept: Vec<Profile> = Vec::with_capacity(profiles.len());
        for mut profile in profiles {
            profile.id = profile.id.trim().to_string();
            if profile.id.is_empty() {
                tracing::warn!("Ignoring profile with an empty id");
                continue;
            }
            if kept.iter().any(|p| p.id == profile.id) {
                tracing::warn!(id = %profile.id, "Ignoring duplicate profile id");
                continue;
            }
            kept.push(profile);
        }
        Self { profiles: kept }
    }

    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id.trim())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// The profile after `current` in the cycle none → first → … → last → none.
    pub fn next_after(&self, current: Option<&str>) -> Option<&Profile> {
        match current {
            None => self.profiles.first(),
            Some(id) => {
                let pos = self.profiles.iter().position(|p| p.id == id)?;
                self.profiles.get(pos + 1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> ProfileDirectory {
        ProfileDirectory::new(vec![
            Profile::new("mp-1", "Backbench MP"),
            Profile::new(" ", "blank"),
            Profile::new("clerk", ""),
            Profile::new("mp-1", "duplicate"),
        ])
    }

    #[test]
    fn blank_and_duplicate_ids_are_dropped() {
        let dir = directory();
        assert_eq!(dir.len(), 2);
        assert_eq!(dir.get("mp-1").map(Profile::display_name), Some("Backbench MP"));
        assert_eq!(dir.get("clerk").map(Profile::display_name), Some("clerk"));
    }

    #[test]
    fn cycling_passes_through_no_profile() {
        let dir = directory();
        let first = dir.next_after(None).map(|p| p.id.as_str());
        assert_eq!(first, Some("mp-1"));
        assert_eq!(dir.next_after(Some("mp-1")).map(|p| p.id.as_str()), Some("clerk"));
        assert_eq!(dir.next_after(Some("clerk")), None);
        assert_eq!(dir.next_after(Some("unknown")), None);
        assert!(ProfileDirectory::default().next_after(None).is_none());
    }
}
