//! Result of assembling a hierarchy and the policy for precondition breaches.

use tracing::warn;

use crate::{AssemblyError, IdAllocator, Result, TripleSet, Violation};

/// How an assembler reacts to a [`Violation`].
///
/// # Examples
/// ```
/// use clustree_core::ViolationPolicy;
///
/// assert_eq!(ViolationPolicy::default(), ViolationPolicy::Tolerate);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViolationPolicy {
    /// Log the violation, record it on the [`Assembly`] and continue with a
    /// partial hierarchy.
    #[default]
    Tolerate,
    /// Abort the run with [`AssemblyError::PreconditionViolation`].
    Reject,
}

impl ViolationPolicy {
    pub(crate) fn handle(self, violation: Violation, log: &mut Vec<Violation>) -> Result<()> {
        match self {
            Self::Tolerate => {
                warn!(%violation, "tolerating input precondition violation");
                log.push(violation);
                Ok(())
            }
            Self::Reject => Err(AssemblyError::PreconditionViolation { violation }),
        }
    }
}

/// A reconstructed hierarchy: its triples plus what the assembler learned
/// while building them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    triples: TripleSet,
    roots: Vec<u64>,
    ids: IdAllocator,
    violations: Vec<Violation>,
}

impl Assembly {
    pub(crate) fn new(
        triples: TripleSet,
        roots: Vec<u64>,
        ids: IdAllocator,
        violations: Vec<Violation>,
    ) -> Self {
        Self {
            triples,
            roots,
            ids,
            violations,
        }
    }

    /// The canonical triple set.
    #[must_use]
    pub const fn triples(&self) -> &TripleSet {
        &self.triples
    }

    /// Consumes the assembly, keeping only the triple set.
    #[must_use]
    pub fn into_triples(self) -> TripleSet {
        self.triples
    }

    /// Synthetic clusters without a parent, in ascending order.
    #[must_use]
    pub fn roots(&self) -> &[u64] {
        &self.roots
    }

    /// Largest original identifier seen; every synthetic id is above it.
    #[must_use]
    pub const fn id_floor(&self) -> u64 {
        self.ids.floor()
    }

    /// Number of synthetic cluster identifiers allocated for the run.
    #[must_use]
    pub const fn synthetic_count(&self) -> u64 {
        self.ids.allocated()
    }

    /// Reports whether `id` names a synthetic cluster of this run.
    #[must_use]
    pub const fn is_synthetic(&self, id: u64) -> bool {
        self.ids.is_synthetic(id)
    }

    /// Violations tolerated while assembling.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orphan() -> Violation {
        Violation::Orphan {
            level: 0,
            cluster: 1,
            id: 7,
        }
    }

    #[test]
    fn tolerate_records_the_violation() {
        let mut log = Vec::new();
        ViolationPolicy::Tolerate
            .handle(orphan(), &mut log)
            .expect("tolerated violations do not fail");
        assert_eq!(log, vec![orphan()]);
    }

    #[test]
    fn reject_fails_without_recording() {
        let mut log = Vec::new();
        let err = ViolationPolicy::Reject
            .handle(orphan(), &mut log)
            .expect_err("rejected violations fail");
        assert_eq!(
            err,
            AssemblyError::PreconditionViolation {
                violation: orphan()
            }
        );
        assert!(log.is_empty());
    }
}
