use crate::model::{TagId, UserId};

/// The filter selection kept across reloads: at most one user and one tag.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ActiveFilters {
    pub user: Option<UserId>,
    pub tag: Option<TagId>,
}

impl ActiveFilters {
    /// A card passes when it satisfies both the user and the tag filter.
    pub fn admits(&self, assigned: Option<UserId>, tags: &[TagId]) -> bool {
        let user_ok = self.user.map_or(true, |id| assigned == Some(id));
        let tag_ok = self.tag.map_or(true, |id| tags.contains(&id));
        user_ok && tag_ok
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.tag.is_none()
    }
}

/// Steps a selection through `choices` and back to "none".
pub fn cycle<T: Copy + PartialEq>(current: Option<T>, choices: &[T]) -> Option<T> {
    match current {
        None => choices.first().copied(),
        Some(value) => match choices.iter().position(|c| *c == value) {
            Some(i) => choices.get(i + 1).copied(),
            None => choices.first().copied(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_admits_everything() {
        let filters = ActiveFilters::default();
        assert!(filters.admits(None, &[]));
        assert!(filters.admits(Some(3), &[1, 2]));
    }

    #[test]
    fn user_and_tag_filters_compose() {
        let filters = ActiveFilters {
            user: Some(1),
            tag: Some(9),
        };
        assert!(filters.admits(Some(1), &[4, 9]));
        assert!(!filters.admits(Some(2), &[9]));
        assert!(!filters.admits(Some(1), &[4]));
        assert!(!filters.admits(None, &[9]));
    }

    #[test]
    fn clear_resets_both() {
        let mut filters = ActiveFilters {
            user: Some(1),
            tag: Some(2),
        };
        filters.clear();
        assert!(filters.is_empty());
    }

    #[test]
    fn cycle_wraps_back_to_none() {
        let ids = [5, 8];
        assert_eq!(cycle(None, &ids), Some(5));
        assert_eq!(cycle(Some(5), &ids), Some(8));
        assert_eq!(cycle(Some(8), &ids), None);
        assert_eq!(cycle(Some(42), &ids), Some(5));
        assert_eq!(cycle::<u64>(None, &[]), None);
    }
}
