//! Builder utilities for configuring the hierarchy assemblers.
//!
//! Options are validated here so that assemblers only ever see a usable
//! configuration.

use std::num::NonZeroUsize;

use crate::{
    AssemblyError, CoarseningAssembler, DEFAULT_MIN_CLUSTER_SIZE, PathTreeAssembler, Result,
    ViolationPolicy,
};

/// Configures and constructs [`PathTreeAssembler`] instances.
///
/// # Examples
/// ```
/// use clustree_core::{PathTreeBuilder, ViolationPolicy};
///
/// let assembler = PathTreeBuilder::new()
///     .with_violation_policy(ViolationPolicy::Reject)
///     .build();
/// assert_eq!(assembler.violation_policy(), ViolationPolicy::Reject);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PathTreeBuilder {
    policy: ViolationPolicy,
}

impl PathTreeBuilder {
    /// Creates a builder that tolerates violations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how scattered groups are handled.
    #[must_use]
    pub const fn with_violation_policy(mut self, policy: ViolationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the configured violation policy.
    #[must_use]
    pub const fn violation_policy(&self) -> ViolationPolicy {
        self.policy
    }

    /// Constructs the assembler. Every path-tree configuration is valid.
    #[must_use]
    pub const fn build(self) -> PathTreeAssembler {
        PathTreeAssembler::new(self.policy)
    }
}

/// Configures and constructs [`CoarseningAssembler`] instances.
///
/// # Examples
/// ```
/// use clustree_core::{CoarseningBuilder, ViolationPolicy};
///
/// let assembler = CoarseningBuilder::new()
///     .with_min_cluster_size(3)
///     .with_violation_policy(ViolationPolicy::Reject)
///     .with_apex(true)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(assembler.min_cluster_size().get(), 3);
/// assert_eq!(assembler.violation_policy(), ViolationPolicy::Reject);
/// assert!(assembler.apex());
/// ```
#[derive(Debug, Clone)]
pub struct CoarseningBuilder {
    min_cluster_size: usize,
    policy: ViolationPolicy,
    apex: bool,
}

impl Default for CoarseningBuilder {
    fn default() -> Self {
        Self {
            min_cluster_size: DEFAULT_MIN_CLUSTER_SIZE.get(),
            policy: ViolationPolicy::default(),
            apex: false,
        }
    }
}

impl CoarseningBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use clustree_core::{CoarseningBuilder, ViolationPolicy};
    ///
    /// let builder = CoarseningBuilder::new();
    /// assert_eq!(builder.min_cluster_size(), 2);
    /// assert_eq!(builder.violation_policy(), ViolationPolicy::Tolerate);
    /// assert!(!builder.apex());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the minimum number of distinct members a cluster needs.
    #[must_use]
    pub const fn with_min_cluster_size(mut self, size: usize) -> Self {
        self.min_cluster_size = size;
        self
    }

    /// Returns the configured minimum cluster size.
    #[must_use]
    pub const fn min_cluster_size(&self) -> usize {
        self.min_cluster_size
    }

    /// Sets how orphaned clusters are handled.
    #[must_use]
    pub const fn with_violation_policy(mut self, policy: ViolationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the configured violation policy.
    #[must_use]
    pub const fn violation_policy(&self) -> ViolationPolicy {
        self.policy
    }

    /// Places a single apex above every coarsest cluster when `apex` is set.
    #[must_use]
    pub const fn with_apex(mut self, apex: bool) -> Self {
        self.apex = apex;
        self
    }

    /// Reports whether an apex will be placed.
    #[must_use]
    pub const fn apex(&self) -> bool {
        self.apex
    }

    /// Validates the configuration and constructs a [`CoarseningAssembler`].
    ///
    /// # Errors
    /// Returns [`AssemblyError::InvalidMinClusterSize`] when the minimum
    /// cluster size is zero.
    ///
    /// # Examples
    /// ```
    /// use clustree_core::{AssemblyError, CoarseningBuilder};
    ///
    /// let err = CoarseningBuilder::new()
    ///     .with_min_cluster_size(0)
    ///     .build()
    ///     .expect_err("zero is rejected");
    /// assert!(matches!(err, AssemblyError::InvalidMinClusterSize { got: 0 }));
    /// ```
    pub fn build(self) -> Result<CoarseningAssembler> {
        let min_cluster_size = NonZeroUsize::new(self.min_cluster_size).ok_or(
            AssemblyError::InvalidMinClusterSize {
                got: self.min_cluster_size,
            },
        )?;
        Ok(CoarseningAssembler::new(
            min_cluster_size,
            self.policy,
            self.apex,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    use crate::AssemblyErrorCode;

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(64)]
    fn accepts_positive_min_cluster_sizes(#[case] size: usize) {
        let assembler = CoarseningBuilder::new()
            .with_min_cluster_size(size)
            .build()
            .expect("positive sizes are valid");
        assert_eq!(assembler.min_cluster_size().get(), size);
    }

    #[test]
    fn rejects_zero_min_cluster_size() {
        let err = CoarseningBuilder::new()
            .with_min_cluster_size(0)
            .build()
            .expect_err("zero must be rejected");
        assert_eq!(err.code(), AssemblyErrorCode::InvalidMinClusterSize);
        assert_eq!(
            err.code().as_str(),
            "ASSEMBLY_INVALID_MIN_CLUSTER_SIZE"
        );
    }

    #[test]
    fn defaults_match_the_convenience_wrappers() {
        let builder = CoarseningBuilder::default();
        assert_eq!(builder.min_cluster_size(), DEFAULT_MIN_CLUSTER_SIZE.get());
        assert_eq!(builder.violation_policy(), ViolationPolicy::Tolerate);
        assert!(!builder.apex());
        assert_eq!(
            PathTreeBuilder::default().violation_policy(),
            ViolationPolicy::Tolerate
        );
    }

    #[test]
    fn path_tree_builder_carries_policy_through() {
        let assembler = PathTreeBuilder::new()
            .with_violation_policy(ViolationPolicy::Reject)
            .build();
        assert_eq!(assembler.violation_policy(), ViolationPolicy::Reject);
    }
}
