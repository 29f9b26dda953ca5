//! Sender name resolution.

use std::collections::BTreeMap;

use crate::models::{Author, Group, Profile};

/// Name used when a sender id is not in the fetched metadata.
pub fn placeholder_name(id: i64) -> String {
    format!("Unknown ({})", id)
}

/// Resolve a sender id against profile and group lists.
///
/// Negative ids are communities and are looked up by absolute value in
/// `groups`; positive ids are users.
pub fn resolve_author_name(id: i64, profiles: &[Profile], groups: &[Group]) -> String {
    let resolved = if id < 0 {
        id.checked_neg()
            .and_then(|gid| groups.iter().find(|g| g.id == gid))
            .and_then(Group::display_name)
    } else {
        profiles
            .iter()
            .find(|p| p.id == id)
            .and_then(Profile::display_name)
    };
    resolved.unwrap_or_else(|| placeholder_name(id))
}

/// Deduplicated profiles and groups seen across all fetched pages.
#[derive(Debug, Clone, Default)]
pub struct AuthorDirectory {
    profiles: BTreeMap<i64, Profile>,
    groups: BTreeMap<i64, Group>,
}

impl AuthorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later pages replace earlier entries with the same id.
    pub fn extend(&mut self, profiles: Vec<Profile>, groups: Vec<Group>) {
        for profile in profiles {
            self.profiles.insert(profile.id, profile);
        }
        for group in groups {
            self.groups.insert(group.id, group);
        }
    }

    pub fn resolve(&self, id: i64) -> String {
        let resolved = if id < 0 {
            id.checked_neg()
                .and_then(|gid| self.groups.get(&gid))
                .and_then(Group::display_name)
        } else {
            self.profiles.get(&id).and_then(Profile::display_name)
        };
        resolved.unwrap_or_else(|| placeholder_name(id))
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Users first, then communities, each ordered by id.
    pub fn into_authors(self) -> Vec<Author> {
        self.profiles
            .into_values()
            .map(Author::User)
            .chain(self.groups.into_values().map(Author::Group))
            .collect()
    }
}
