//! Error types for the clustree core library.
//!
//! Defines the assembly error enum exposed by the public API, the reasons a
//! single input record can be rejected, the precondition violations the
//! assemblers tolerate, and a convenient result alias.

use std::fmt;

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Why a single input record could not be parsed.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum MalformedReason {
    /// The record split into fewer fields than the format requires.
    #[error("expected at least {expected} fields but found {found}")]
    MissingFields {
        /// Minimum number of fields for the format.
        expected: usize,
        /// Number of fields present on the record.
        found: usize,
    },
    /// The record split into a different number of fields than the format allows.
    #[error("expected exactly {expected} fields but found {found}")]
    WrongArity {
        /// Exact number of fields for the format.
        expected: usize,
        /// Number of fields present on the record.
        found: usize,
    },
    /// A colon-separated path segment was not a non-negative integer.
    #[error("path segment `{segment}` is not a non-negative integer")]
    InvalidPathSegment {
        /// Raw text of the offending segment.
        segment: String,
    },
    /// The flow weight was not a finite number.
    #[error("weight `{raw}` is not a finite number")]
    InvalidWeight {
        /// Raw text of the weight field.
        raw: String,
    },
    /// A node identifier was not a non-negative integer.
    #[error("identifier `{raw}` is not a non-negative integer")]
    InvalidIdentifier {
        /// Raw text of the identifier field.
        raw: String,
    },
    /// A relation token was neither `c-c` nor `c-m`.
    #[error("relation `{raw}` is neither `c-c` nor `c-m`")]
    UnknownRelation {
        /// Raw text of the relation field.
        raw: String,
    },
}

/// A precondition breach that assemblers can tolerate.
///
/// Under [`crate::ViolationPolicy::Tolerate`] these are logged and recorded on
/// the [`crate::Assembly`]; under [`crate::ViolationPolicy::Reject`] the first
/// one aborts the run as [`AssemblyError::PreconditionViolation`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Violation {
    /// A cluster had no containing cluster in the next coarser level and was
    /// left without a parent.
    Orphan {
        /// Zero-based index of the level holding the orphaned cluster.
        level: usize,
        /// Position of the cluster within its level.
        cluster: usize,
        /// Synthetic identifier given to the orphaned cluster.
        id: u64,
    },
    /// A cluster was contained in more than one cluster of the next coarser
    /// level; the first container in input order became its parent.
    AmbiguousParent {
        /// Zero-based index of the level holding the contained cluster.
        level: usize,
        /// Position of the cluster within its level.
        cluster: usize,
        /// Number of coarser clusters containing it.
        containers: usize,
    },
    /// An ancestor group reappeared after a different group in the same
    /// column, so the input was not grouped by path.
    ScatteredGroup {
        /// Zero-based path column where the group reappeared.
        column: usize,
        /// Zero-based row (among retained records) that reopened the group.
        row: usize,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Orphan { level, cluster, id } => write!(
                f,
                "cluster {cluster} (id {id}) at level {level} has no containing cluster in level {}",
                level + 1
            ),
            Self::AmbiguousParent {
                level,
                cluster,
                containers,
            } => write!(
                f,
                "cluster {cluster} at level {level} is contained in {containers} clusters of level {}; the first one is its parent",
                level + 1
            ),
            Self::ScatteredGroup { column, row } => write!(
                f,
                "ancestor group in column {column} reappears at row {row} after a different group"
            ),
        }
    }
}

/// Error type produced while assembling a cluster hierarchy.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum AssemblyError {
    /// An input line or record could not be parsed.
    #[error("record {record} is malformed: {reason}")]
    MalformedRecord {
        /// One-based line (or wire record) number of the offending input.
        record: usize,
        /// What was wrong with the record.
        #[source]
        reason: MalformedReason,
    },
    /// No clusters survived filtering.
    #[error("no clusters survived filtering; clustering parameters may be too strict")]
    EmptyResult,
    /// A precondition of the input did not hold and the caller asked for
    /// violations to be fatal.
    #[error("input precondition violated: {violation}")]
    PreconditionViolation {
        /// The violation that aborted the run.
        violation: Violation,
    },
    /// The synthetic identifier space above the input ids was exhausted.
    #[error("no synthetic identifiers remain above {last}")]
    IdentifierOverflow {
        /// Last identifier handed out before exhaustion.
        last: u64,
    },
    /// Minimum cluster size must be greater than zero.
    #[error("min_cluster_size must be at least 1 (got {got})")]
    InvalidMinClusterSize {
        /// The invalid minimum cluster size supplied by the caller.
        got: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`AssemblyError`] variants.
    enum AssemblyErrorCode for AssemblyError {
        /// An input line or record could not be parsed.
        MalformedRecord => MalformedRecord { .. } => "ASSEMBLY_MALFORMED_RECORD",
        /// No clusters survived filtering.
        EmptyResult => EmptyResult => "ASSEMBLY_EMPTY_RESULT",
        /// A precondition of the input did not hold.
        PreconditionViolation => PreconditionViolation { .. } => "ASSEMBLY_PRECONDITION_VIOLATION",
        /// The synthetic identifier space was exhausted.
        IdentifierOverflow => IdentifierOverflow { .. } => "ASSEMBLY_IDENTIFIER_OVERFLOW",
        /// Minimum cluster size must be greater than zero.
        InvalidMinClusterSize => InvalidMinClusterSize { .. } => "ASSEMBLY_INVALID_MIN_CLUSTER_SIZE",
    }
}

impl AssemblyError {
    pub(crate) const fn malformed(record: usize, reason: MalformedReason) -> Self {
        Self::MalformedRecord { record, reason }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, AssemblyError>;
