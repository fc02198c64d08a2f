//! Clusters and partitions of original node identifiers.

use std::collections::HashSet;
use std::num::NonZeroUsize;

/// Sorted, deduplicated member set of one community.
///
/// # Examples
/// ```
/// use clustree_core::Cluster;
///
/// let cluster = Cluster::new([3, 1, 3, 2]);
/// assert_eq!(cluster.members(), &[1, 2, 3]);
/// assert!(Cluster::new([1, 3]).is_subset_of(&cluster));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cluster {
    members: Vec<u64>,
}

impl Cluster {
    /// Creates a cluster, sorting and deduplicating `members`.
    #[must_use]
    pub fn new(members: impl IntoIterator<Item = u64>) -> Self {
        let mut members: Vec<u64> = members.into_iter().collect();
        members.sort_unstable();
        members.dedup();
        Self { members }
    }

    /// Members in ascending order.
    #[must_use]
    pub fn members(&self) -> &[u64] {
        &self.members
    }

    /// Number of distinct members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Reports whether the cluster has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Largest member, or `None` for an empty cluster.
    #[must_use]
    pub fn max_member(&self) -> Option<u64> {
        self.members.last().copied()
    }

    /// Reports whether every member of `self` is also a member of `other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        if self.len() > other.len() {
            return false;
        }
        let mut theirs = other.members.iter();
        self.members
            .iter()
            .all(|mine| theirs.by_ref().any(|candidate| candidate == mine))
    }
}

impl FromIterator<u64> for Cluster {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// One level of a coarsening sequence: clusters in input order.
///
/// # Examples
/// ```
/// use std::num::NonZeroUsize;
///
/// use clustree_core::{Cluster, Partition};
///
/// let partition = Partition::new(vec![Cluster::new([1, 2]), Cluster::new([3])]);
/// let filtered = partition.retain_min_size(NonZeroUsize::new(2).expect("non-zero"));
/// assert_eq!(filtered.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    clusters: Vec<Cluster>,
}

impl Partition {
    /// Creates a partition from clusters in input order.
    #[must_use]
    pub const fn new(clusters: Vec<Cluster>) -> Self {
        Self { clusters }
    }

    /// Clusters in input order.
    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Number of clusters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Reports whether the partition has no clusters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Largest member across all clusters.
    #[must_use]
    pub fn max_member(&self) -> Option<u64> {
        self.clusters.iter().filter_map(Cluster::max_member).max()
    }

    /// Drops clusters with fewer than `min_size` members and repeated
    /// clusters, keeping the first occurrence in input order.
    #[must_use]
    pub fn retain_min_size(&self, min_size: NonZeroUsize) -> Self {
        let mut seen = HashSet::new();
        let clusters = self
            .clusters
            .iter()
            .filter(|cluster| cluster.len() >= min_size.get())
            .filter(|cluster| seen.insert(*cluster))
            .cloned()
            .collect();
        Self { clusters }
    }
}

impl FromIterator<Cluster> for Partition {
    fn from_iter<I: IntoIterator<Item = Cluster>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::equal(&[1, 2], &[1, 2], true)]
    #[case::proper(&[2, 5], &[1, 2, 3, 5], true)]
    #[case::missing_member(&[2, 4], &[1, 2, 3, 5], false)]
    #[case::larger(&[1, 2, 3], &[1, 2], false)]
    #[case::disjoint(&[7, 8], &[1, 2], false)]
    #[case::empty(&[], &[1], true)]
    fn subset_checks_walk_sorted_members(
        #[case] left: &[u64],
        #[case] right: &[u64],
        #[case] expected: bool,
    ) {
        let left = Cluster::new(left.iter().copied());
        let right = Cluster::new(right.iter().copied());
        assert_eq!(left.is_subset_of(&right), expected);
    }

    #[rstest]
    #[case(1, 3)]
    #[case(2, 2)]
    #[case(3, 1)]
    #[case(4, 0)]
    fn retain_min_size_filters_small_clusters(#[case] min: usize, #[case] expected: usize) {
        let partition: Partition = [vec![1], vec![2, 3], vec![4, 5, 6]]
            .into_iter()
            .map(Cluster::new)
            .collect();
        let filtered = partition.retain_min_size(NonZeroUsize::new(min).expect("non-zero"));
        assert_eq!(filtered.len(), expected);
    }

    #[test]
    fn duplicate_members_count_once_towards_the_minimum() {
        let partition = Partition::new(vec![Cluster::new([4, 4, 4])]);
        let filtered = partition.retain_min_size(NonZeroUsize::new(2).expect("non-zero"));
        assert!(filtered.is_empty());
    }

    #[test]
    fn repeated_clusters_keep_their_first_occurrence() {
        let partition: Partition = [vec![2, 1], vec![3, 4], vec![1, 2]]
            .into_iter()
            .map(Cluster::new)
            .collect();
        let filtered = partition.retain_min_size(NonZeroUsize::MIN);
        assert_eq!(
            filtered.clusters(),
            &[Cluster::new([1, 2]), Cluster::new([3, 4])]
        );
    }

    #[test]
    fn max_member_spans_all_clusters() {
        let partition: Partition = [vec![9, 1], vec![12, 3]]
            .into_iter()
            .map(Cluster::new)
            .collect();
        assert_eq!(partition.max_member(), Some(12));
        assert_eq!(Partition::default().max_member(), None);
    }
}
