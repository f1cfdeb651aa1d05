//! Space lifecycle reconciliation.

use spacegate_types::SpaceId;
use std::collections::HashSet;

/// Difference between the spaces the directory lists and the ones running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpaceDiff {
    /// Listed but not running, in directory order.
    pub to_start: Vec<SpaceId>,
    /// Running but no longer listed.
    pub to_stop: Vec<SpaceId>,
}

impl SpaceDiff {
    pub fn is_empty(&self) -> bool {
        self.to_start.is_empty() && self.to_stop.is_empty()
    }
}

/// Compute which spaces to start and which to stop.
///
/// Duplicates in either input are reported once.
pub fn diff<'a, D, R>(directory: D, running: R) -> SpaceDiff
where
    D: IntoIterator<Item = &'a SpaceId>,
    R: IntoIterator<Item = &'a SpaceId>,
{
    let mut listed = HashSet::new();
    let mut to_start_seen = HashSet::new();
    let mut desired = Vec::new();
    for id in directory {
        listed.insert(id);
        desired.push(id);
    }

    let running: Vec<&SpaceId> = running.into_iter().collect();
    let running_set: HashSet<&SpaceId> = running.iter().copied().collect();

    let to_start = desired
        .into_iter()
        .filter(|id| !running_set.contains(id) && to_start_seen.insert(*id))
        .cloned()
        .collect();

    let mut to_stop_seen = HashSet::new();
    let to_stop = running
        .into_iter()
        .filter(|id| !listed.contains(id) && to_stop_seen.insert(*id))
        .cloned()
        .collect();

    SpaceDiff { to_start, to_stop }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<SpaceId> {
        names.iter().map(|n| SpaceId::new(*n)).collect()
    }

    #[test]
    fn test_diff() {
        let directory = ids(&["A", "B", "C"]);
        let running = ids(&["B", "D"]);

        let diff = diff(&directory, &running);
        assert_eq!(diff.to_start, ids(&["A", "C"]));
        assert_eq!(diff.to_stop, ids(&["D"]));
    }

    #[test]
    fn test_diff_in_sync() {
        let directory = ids(&["A", "B"]);
        let running = ids(&["B", "A"]);
        assert!(diff(&directory, &running).is_empty());
    }

    #[test]
    fn test_diff_dedupes() {
        let directory = ids(&["A", "A", "B"]);
        let running = ids(&["C", "C"]);

        let diff = diff(&directory, &running);
        assert_eq!(diff.to_start, ids(&["A", "B"]));
        assert_eq!(diff.to_stop, ids(&["C"]));
    }

    #[test]
    fn test_diff_empty_directory_stops_everything() {
        let running = ids(&["A", "B"]);
        let diff = diff(&ids(&[]), &running);
        assert!(diff.to_start.is_empty());
        assert_eq!(diff.to_stop, ids(&["A", "B"]));
    }
}
