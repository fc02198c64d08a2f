//! Clustree core library.
//!
//! Rebuilds cluster hierarchies from the flat outputs of community-detection
//! tools and encodes them as canonical containment triples.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod allocator;
mod assembly;
mod builder;
mod coarsening;
mod error;
mod path_tree;
mod term_edges;
mod triples;

pub use crate::{
    allocator::IdAllocator,
    assembly::{Assembly, ViolationPolicy},
    builder::{CoarseningBuilder, PathTreeBuilder},
    coarsening::{
        Cluster, CoarseningAssembler, CoarseningSequence, DEFAULT_MIN_CLUSTER_SIZE, Partition,
        assemble_coarsening,
    },
    error::{AssemblyError, AssemblyErrorCode, MalformedReason, Result, Violation},
    path_tree::{
        COMMENT_MARKER, LeafRecord, PADDING, PathMatrix, PathRow, PathTreeAssembler,
        assemble_path_tree, parse_records,
    },
    term_edges::parse_term_edges,
    triples::{Relation, Triple, TripleSet, WireMode},
};
