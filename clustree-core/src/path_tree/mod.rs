//! Hierarchy reconstruction from per-leaf ancestor paths.
//!
//! Information-flow clustering reports its hierarchy one leaf per line: the
//! colon-separated chain of modules from the root down to the leaf, the
//! leaf's flow and the leaf's identifier. The assembler:
//!
//! - discards records without flow,
//! - lays the remaining records out as a [`PathMatrix`],
//! - walks its columns from the deepest to the shallowest, giving every
//!   contiguous run of rows that share an ancestor prefix its own synthetic
//!   id above the largest leaf id,
//! - places a single root one above the last id handed out, and
//! - emits `c-c` edges root → shallowest ancestor → ... → deepest ancestor
//!   and a `c-m` edge deepest ancestor → leaf for every row.
//!
//! Input must be grouped by path so that rows sharing an ancestor are
//! contiguous. Groups that reappear after a different group are reported as
//! [`crate::Violation::ScatteredGroup`].

mod matrix;
mod record;

use tracing::{Span, field, info, instrument};

use crate::{
    Assembly, AssemblyError, IdAllocator, Result, Triple, TripleSet, ViolationPolicy,
};

pub use self::matrix::{PADDING, PathMatrix, PathRow};
pub use self::record::{COMMENT_MARKER, LeafRecord, parse_records};

/// Rebuilds hierarchies from path-tree output.
///
/// # Examples
/// ```
/// use clustree_core::PathTreeBuilder;
///
/// let assembler = PathTreeBuilder::new().build();
/// let assembly = assembler
///     .assemble("# path flow name\n1:2:3 0.4 \"10\"\n1:2:4 0.3 \"11\"\n")
///     .expect("input is well formed");
/// assert_eq!(
///     assembly.triples().to_string(),
///     "12,10,c-m;12,11,c-m;13,12,c-c;14,13,c-c;"
/// );
/// assert_eq!(assembly.roots(), &[14]);
/// ```
#[derive(Debug, Clone)]
pub struct PathTreeAssembler {
    policy: ViolationPolicy,
}

impl PathTreeAssembler {
    pub(crate) const fn new(policy: ViolationPolicy) -> Self {
        Self { policy }
    }

    /// Returns the configured violation policy.
    #[must_use]
    pub const fn violation_policy(&self) -> ViolationPolicy {
        self.policy
    }

    /// Parses `text` and assembles the hierarchy it describes.
    ///
    /// # Errors
    /// Returns [`AssemblyError::MalformedRecord`] for unparseable lines and
    /// otherwise the errors of [`Self::assemble_records`].
    #[instrument(
        name = "path_tree.assemble",
        skip_all,
        fields(bytes = text.len()),
    )]
    pub fn assemble(&self, text: &str) -> Result<Assembly> {
        let records = parse_records(text)?;
        self.assemble_records(records)
    }

    /// Assembles the hierarchy described by already-parsed records.
    ///
    /// # Errors
    /// Returns [`AssemblyError::EmptyResult`] when no record carries flow,
    /// [`AssemblyError::PreconditionViolation`] for scattered groups under
    /// [`ViolationPolicy::Reject`], and
    /// [`AssemblyError::IdentifierOverflow`] when leaf ids leave no room for
    /// synthetic ids.
    #[instrument(
        name = "path_tree.assemble_records",
        skip_all,
        fields(records = records.len(), retained = field::Empty, width = field::Empty),
    )]
    pub fn assemble_records(&self, records: Vec<LeafRecord>) -> Result<Assembly> {
        let retained: Vec<LeafRecord> = records
            .into_iter()
            .filter(LeafRecord::is_retained)
            .collect();
        let matrix = PathMatrix::from_records(&retained);
        let span = Span::current();
        span.record("retained", retained.len());
        span.record("width", matrix.width());

        let max_leaf = matrix.max_leaf().ok_or(AssemblyError::EmptyResult)?;
        let mut ids = IdAllocator::above(max_leaf);
        let mut violations = Vec::new();
        let policy = self.policy;
        let assigned = matrix.assign(&mut ids, |violation| {
            policy.handle(violation, &mut violations)
        })?;
        let root = ids.allocate()?;

        let triples = link_rows(root, matrix.rows(), &assigned);
        info!(
            root,
            leaves = matrix.rows().len(),
            clusters = ids.allocated(),
            triples = triples.len(),
            violations = violations.len(),
            "path tree assembled"
        );
        Ok(Assembly::new(triples, vec![root], ids, violations))
    }
}

fn link_rows(root: u64, rows: &[PathRow], assigned: &[Vec<u64>]) -> TripleSet {
    let mut triples = TripleSet::new();
    for (row, ancestors) in rows.iter().zip(assigned) {
        let Some((&deepest, _)) = ancestors.split_last() else {
            triples.insert(Triple::member(root, row.leaf()));
            continue;
        };
        let mut parent = root;
        for &cluster in ancestors {
            triples.insert(Triple::cluster(parent, cluster));
            parent = cluster;
        }
        triples.insert(Triple::member(deepest, row.leaf()));
    }
    triples
}

/// Convenience wrapper that assembles `text` with the default policy.
///
/// # Errors
/// See [`PathTreeAssembler::assemble`].
pub fn assemble_path_tree(text: &str) -> Result<Assembly> {
    PathTreeAssembler::new(ViolationPolicy::default()).assemble(text)
}
