//! Hierarchy reconstruction from a sequence of progressively coarser
//! partitions.
//!
//! Aggregation-based clustering reports one partition per aggregation pass,
//! finest first. The assembler:
//!
//! - drops clusters below the minimum size and levels left empty by that,
//! - numbers the finest clusters `floor + 1, floor + 2, ...`, where the floor
//!   is the largest member id of the unfiltered input, and links each
//!   to its members with `c-m` edges,
//! - for every coarser level, gives each finer cluster the first coarser
//!   cluster (in input order) that contains it as its parent,
//! - numbers each coarser level contiguously above the previous one, and
//! - links members that no finer cluster covered straight to the coarser
//!   cluster, so every cluster's expanded member set equals its own.
//!
//! A coarser cluster identical to a finer one whose first container it is
//! is the same community carried forward: it keeps the finer id and gains no
//! edge to itself. Finer clusters with no container become
//! [`Violation::Orphan`] roots, and finer clusters with several containers
//! raise [`Violation::AmbiguousParent`].

mod partition;

use std::collections::HashSet;
use std::num::NonZeroUsize;

use tracing::{Span, debug, field, info, instrument};

use crate::{
    Assembly, AssemblyError, IdAllocator, Result, Triple, TripleSet, Violation, ViolationPolicy,
};

pub use self::partition::{Cluster, Partition};

/// Smallest cluster that carries a containment relationship.
pub const DEFAULT_MIN_CLUSTER_SIZE: NonZeroUsize = NonZeroUsize::MIN.saturating_add(1);

/// Partitions ordered from finest to coarsest.
///
/// # Examples
/// ```
/// use clustree_core::{Cluster, CoarseningSequence, Partition};
///
/// let sequence = CoarseningSequence::new(vec![
///     Partition::new(vec![Cluster::new([1, 2, 3]), Cluster::new([4, 5])]),
///     Partition::new(vec![Cluster::new([1, 2, 3, 4, 5])]),
/// ])
/// .with_node_ceiling(9);
/// assert_eq!(sequence.levels().len(), 2);
/// assert_eq!(sequence.node_ceiling(), Some(9));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoarseningSequence {
    levels: Vec<Partition>,
    node_ceiling: Option<u64>,
}

impl CoarseningSequence {
    /// Creates a sequence from levels ordered finest first.
    #[must_use]
    pub const fn new(levels: Vec<Partition>) -> Self {
        Self {
            levels,
            node_ceiling: None,
        }
    }

    /// Records the largest node id of the clustered graph, so synthetic ids
    /// also clear nodes that never made it into a cluster.
    #[must_use]
    pub fn with_node_ceiling(mut self, ceiling: u64) -> Self {
        self.node_ceiling = Some(ceiling);
        self
    }

    /// Levels in input order.
    #[must_use]
    pub fn levels(&self) -> &[Partition] {
        &self.levels
    }

    /// Largest node id of the clustered graph, when known.
    #[must_use]
    pub const fn node_ceiling(&self) -> Option<u64> {
        self.node_ceiling
    }
}

impl FromIterator<Partition> for CoarseningSequence {
    fn from_iter<I: IntoIterator<Item = Partition>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Rebuilds hierarchies from coarsening sequences.
///
/// # Examples
/// ```
/// use clustree_core::{Cluster, CoarseningBuilder, CoarseningSequence, Partition};
///
/// let sequence = CoarseningSequence::new(vec![
///     Partition::new(vec![Cluster::new([1, 2, 3]), Cluster::new([4, 5])]),
///     Partition::new(vec![Cluster::new([1, 2, 3, 4, 5])]),
/// ]);
/// let assembly = CoarseningBuilder::new()
///     .build()
///     .expect("configuration is valid")
///     .assemble(&sequence)
///     .expect("sequence is non-empty");
/// assert_eq!(
///     assembly.triples().to_string(),
///     "6,1,c-m;6,2,c-m;6,3,c-m;7,4,c-m;7,5,c-m;8,6,c-c;8,7,c-c;"
/// );
/// assert_eq!(assembly.roots(), &[8]);
/// ```
#[derive(Debug, Clone)]
pub struct CoarseningAssembler {
    min_cluster_size: NonZeroUsize,
    policy: ViolationPolicy,
    apex: bool,
}

/// Per-run state threaded through the level walk.
struct LevelWalk {
    ids: IdAllocator,
    triples: TripleSet,
    violations: Vec<Violation>,
    roots: Vec<u64>,
    policy: ViolationPolicy,
}

impl CoarseningAssembler {
    pub(crate) const fn new(
        min_cluster_size: NonZeroUsize,
        policy: ViolationPolicy,
        apex: bool,
    ) -> Self {
        Self {
            min_cluster_size,
            policy,
            apex,
        }
    }

    /// Returns the minimum number of members a cluster needs to be kept.
    #[must_use]
    pub const fn min_cluster_size(&self) -> NonZeroUsize {
        self.min_cluster_size
    }

    /// Returns the configured violation policy.
    #[must_use]
    pub const fn violation_policy(&self) -> ViolationPolicy {
        self.policy
    }

    /// Reports whether a single apex is placed above the coarsest level.
    #[must_use]
    pub const fn apex(&self) -> bool {
        self.apex
    }

    /// Assembles the hierarchy described by `sequence`.
    ///
    /// # Errors
    /// Returns [`AssemblyError::EmptyResult`] when no cluster survives
    /// filtering, [`AssemblyError::PreconditionViolation`] for orphaned or
    /// ambiguously contained clusters under [`ViolationPolicy::Reject`], and
    /// [`AssemblyError::IdentifierOverflow`] when member ids leave no room
    /// for synthetic ids.
    #[instrument(
        name = "coarsening.assemble",
        skip_all,
        fields(
            levels = sequence.levels().len(),
            retained_levels = field::Empty,
            min_cluster_size = self.min_cluster_size.get(),
        ),
    )]
    pub fn assemble(&self, sequence: &CoarseningSequence) -> Result<Assembly> {
        let levels: Vec<(usize, Partition)> = sequence
            .levels()
            .iter()
            .map(|level| level.retain_min_size(self.min_cluster_size))
            .enumerate()
            .filter(|(index, level)| {
                if level.is_empty() {
                    debug!(index, "level has no cluster at the minimum size");
                }
                !level.is_empty()
            })
            .collect();
        Span::current().record("retained_levels", levels.len());

        let Some(((finest_index, finest), coarser)) = levels.split_first() else {
            return Err(AssemblyError::EmptyResult);
        };
        // Dropped clusters still hold original ids, so they bound the floor too.
        let floor = sequence
            .levels()
            .iter()
            .filter_map(Partition::max_member)
            .chain(sequence.node_ceiling())
            .max()
            .ok_or(AssemblyError::EmptyResult)?;

        let mut walk = LevelWalk {
            ids: IdAllocator::above(floor),
            triples: TripleSet::new(),
            violations: Vec::new(),
            roots: Vec::new(),
            policy: self.policy,
        };

        let mut finer_ids: Vec<u64> = walk.ids.allocate_block(finest.len())?.collect();
        for (cluster, &id) in finest.clusters().iter().zip(&finer_ids) {
            walk.triples
                .extend(cluster.members().iter().map(|&member| Triple::member(id, member)));
        }
        debug!(index = finest_index, clusters = finest.len(), "numbered finest level");

        let mut finer = (*finest_index, finest);
        for (index, level) in coarser {
            finer_ids = walk.link_level(finer, &finer_ids, level)?;
            debug!(index, clusters = level.len(), "linked coarser level");
            finer = (*index, level);
        }

        if self.apex {
            let apex = walk.ids.allocate()?;
            walk.triples
                .extend(finer_ids.iter().map(|&id| Triple::cluster(apex, id)));
            walk.roots.push(apex);
        } else {
            walk.roots.extend(finer_ids);
        }
        walk.finish()
    }
}

impl LevelWalk {
    /// Numbers `coarser`, links every finer cluster to its first container
    /// and returns the ids of the coarser clusters.
    fn link_level(
        &mut self,
        (finer_index, finer): (usize, &Partition),
        finer_ids: &[u64],
        coarser: &Partition,
    ) -> Result<Vec<u64>> {
        let mut parents = Vec::with_capacity(finer.len());
        for (position, cluster) in finer.clusters().iter().enumerate() {
            let mut containers = coarser
                .clusters()
                .iter()
                .enumerate()
                .filter(|(_, candidate)| cluster.is_subset_of(candidate))
                .map(|(k, _)| k);
            let parent = containers.next();
            let others = containers.count();
            if others > 0 {
                let ambiguous = Violation::AmbiguousParent {
                    level: finer_index,
                    cluster: position,
                    containers: others + 1,
                };
                self.policy.handle(ambiguous, &mut self.violations)?;
            }
            parents.push(parent);
        }

        // Only a cluster's own parent may carry its id forward.
        let mut coarser_ids = Vec::with_capacity(coarser.len());
        for (k, cluster) in coarser.clusters().iter().enumerate() {
            let carried = finer
                .clusters()
                .iter()
                .zip(finer_ids)
                .zip(&parents)
                .find(|((candidate, _), parent)| **parent == Some(k) && *candidate == cluster)
                .map(|((_, &id), _)| id);
            let id = match carried {
                Some(id) => id,
                None => self.ids.allocate()?,
            };
            coarser_ids.push(id);
        }

        let mut children: Vec<Vec<&Cluster>> = vec![Vec::new(); coarser.len()];
        for (position, ((cluster, &id), &parent)) in
            finer.clusters().iter().zip(finer_ids).zip(&parents).enumerate()
        {
            let slot = parent.and_then(|k| coarser_ids.get(k).map(|&parent_id| (k, parent_id)));
            match slot {
                Some((k, parent_id)) => {
                    if parent_id != id {
                        self.triples.insert(Triple::cluster(parent_id, id));
                    }
                    if let Some(siblings) = children.get_mut(k) {
                        siblings.push(cluster);
                    }
                }
                None => {
                    let orphan = Violation::Orphan {
                        level: finer_index,
                        cluster: position,
                        id,
                    };
                    self.policy.handle(orphan, &mut self.violations)?;
                    self.roots.push(id);
                }
            }
        }

        for ((cluster, &id), kids) in coarser.clusters().iter().zip(&coarser_ids).zip(&children) {
            let covered: HashSet<u64> = kids
                .iter()
                .flat_map(|kid| kid.members().iter().copied())
                .collect();
            self.triples.extend(
                cluster
                    .members()
                    .iter()
                    .filter(|member| !covered.contains(*member))
                    .map(|&member| Triple::member(id, member)),
            );
        }

        Ok(coarser_ids)
    }

    fn finish(mut self) -> Result<Assembly> {
        self.roots.sort_unstable();
        self.roots.dedup();
        info!(
            clusters = self.ids.allocated(),
            roots = self.roots.len(),
            triples = self.triples.len(),
            violations = self.violations.len(),
            "coarsening sequence assembled"
        );
        Ok(Assembly::new(
            self.triples,
            self.roots,
            self.ids,
            self.violations,
        ))
    }
}

/// Convenience wrapper that assembles `levels` with the default minimum
/// cluster size, policy and no apex.
///
/// # Errors
/// See [`CoarseningAssembler::assemble`].
pub fn assemble_coarsening(levels: Vec<Partition>) -> Result<Assembly> {
    CoarseningAssembler::new(DEFAULT_MIN_CLUSTER_SIZE, ViolationPolicy::default(), false)
        .assemble(&CoarseningSequence::new(levels))
}
