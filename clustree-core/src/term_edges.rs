//! Conversion of term-edge listings into containment triples.
//!
//! Ontology-building tools report their hierarchy as already-numbered edges,
//! one `<source> <target> <type>` line each, terms before genes. The
//! relation is a running toggle rather than a per-line property: it starts
//! at `c-c`, a `gene` line switches it to `c-m` and a `default` line
//! switches it back. Any other type keeps the current relation.

use tracing::{Span, field, info, instrument};

use crate::path_tree::COMMENT_MARKER;
use crate::triples::parse_identifier;
use crate::{AssemblyError, MalformedReason, Relation, Result, Triple, TripleSet};

const MIN_FIELDS: usize = 3;
const MEMBER_TYPE: &str = "gene";
const CLUSTER_TYPE: &str = "default";

/// Parses a term-edge listing into a canonical triple set.
///
/// # Errors
/// Returns [`AssemblyError::MalformedRecord`] for lines with fewer than three
/// fields or non-integer identifiers, and [`AssemblyError::EmptyResult`]
/// when the listing holds no edges.
///
/// # Examples
/// ```
/// use clustree_core::parse_term_edges;
///
/// let listing = "# terms\n10 11 default\n11 3 gene\n11 4 gene\n";
/// let triples = parse_term_edges(listing).expect("listing is well formed");
/// assert_eq!(triples.to_string(), "10,11,c-c;11,3,c-m;11,4,c-m;");
/// ```
#[instrument(
    name = "term_edges.parse",
    skip_all,
    fields(bytes = text.len(), edges = field::Empty),
)]
pub fn parse_term_edges(text: &str) -> Result<TripleSet> {
    let mut relation = Relation::ClusterCluster;
    let mut triples = TripleSet::new();
    let lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && !line.starts_with(COMMENT_MARKER));
    for (index, line) in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [source, target, kind, ..] = fields.as_slice() else {
            return Err(AssemblyError::malformed(
                index + 1,
                MalformedReason::MissingFields {
                    expected: MIN_FIELDS,
                    found: fields.len(),
                },
            ));
        };
        relation = match *kind {
            MEMBER_TYPE => Relation::ClusterMember,
            CLUSTER_TYPE => Relation::ClusterCluster,
            _ => relation,
        };
        let source =
            parse_identifier(source).map_err(|reason| AssemblyError::malformed(index + 1, reason))?;
        let target =
            parse_identifier(target).map_err(|reason| AssemblyError::malformed(index + 1, reason))?;
        triples.insert(Triple::new(source, target, relation));
    }

    Span::current().record("edges", triples.len());
    if triples.is_empty() {
        return Err(AssemblyError::EmptyResult);
    }
    info!(
        clusters = triples.count_relation(Relation::ClusterCluster),
        members = triples.count_relation(Relation::ClusterMember),
        "term edges converted"
    );
    Ok(triples)
}
