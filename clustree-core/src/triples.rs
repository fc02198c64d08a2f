//! Containment triples and their `source,target,relation;` wire format.
//!
//! A [`TripleSet`] is the canonical output of every assembler: an ordered
//! set, so duplicates collapse on insertion and serialisation is
//! byte-for-byte reproducible.

use std::collections::BTreeSet;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use tracing::warn;

use crate::{AssemblyError, MalformedReason, Result};

const RECORD_TERMINATOR: char = ';';
const FIELD_SEPARATOR: char = ',';
const FIELDS_PER_RECORD: usize = 3;

/// Kind of containment a triple expresses.
///
/// # Examples
/// ```
/// use clustree_core::Relation;
///
/// assert_eq!(Relation::ClusterMember.as_str(), "c-m");
/// assert_eq!("c-c".parse::<Relation>(), Ok(Relation::ClusterCluster));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    /// A cluster directly contains a finer cluster (`c-c`).
    ClusterCluster,
    /// A cluster directly contains an original member (`c-m`).
    ClusterMember,
}

impl Relation {
    /// Returns the wire token for the relation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClusterCluster => "c-c",
            Self::ClusterMember => "c-m",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relation {
    type Err = MalformedReason;

    fn from_str(raw: &str) -> core::result::Result<Self, Self::Err> {
        match raw {
            "c-c" => Ok(Self::ClusterCluster),
            "c-m" => Ok(Self::ClusterMember),
            other => Err(MalformedReason::UnknownRelation {
                raw: other.to_owned(),
            }),
        }
    }
}

/// A directed containment edge `(source, target, relation)`.
///
/// Displays as a single wire record, terminator included.
///
/// # Examples
/// ```
/// use clustree_core::Triple;
///
/// assert_eq!(Triple::cluster(7, 6).to_string(), "7,6,c-c;");
/// assert_eq!(Triple::member(6, 1).to_string(), "6,1,c-m;");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    source: u64,
    target: u64,
    relation: Relation,
}

impl Triple {
    /// Creates a triple from its parts.
    #[must_use]
    pub const fn new(source: u64, target: u64, relation: Relation) -> Self {
        Self {
            source,
            target,
            relation,
        }
    }

    /// Creates a `c-c` triple.
    #[must_use]
    pub const fn cluster(source: u64, target: u64) -> Self {
        Self::new(source, target, Relation::ClusterCluster)
    }

    /// Creates a `c-m` triple.
    #[must_use]
    pub const fn member(source: u64, target: u64) -> Self {
        Self::new(source, target, Relation::ClusterMember)
    }

    /// Containing node.
    #[must_use]
    pub const fn source(&self) -> u64 {
        self.source
    }

    /// Contained node.
    #[must_use]
    pub const fn target(&self) -> u64 {
        self.target
    }

    /// Kind of containment.
    #[must_use]
    pub const fn relation(&self) -> Relation {
        self.relation
    }

    fn parse_record(raw: &str) -> core::result::Result<Self, MalformedReason> {
        let fields: Vec<&str> = raw.split(FIELD_SEPARATOR).map(str::trim).collect();
        let [source, target, relation] = fields.as_slice() else {
            return Err(MalformedReason::WrongArity {
                expected: FIELDS_PER_RECORD,
                found: fields.len(),
            });
        };
        Ok(Self::new(
            parse_identifier(source)?,
            parse_identifier(target)?,
            relation.parse()?,
        ))
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}{RECORD_TERMINATOR}",
            self.source, self.target, self.relation
        )
    }
}

pub(crate) fn parse_identifier(raw: &str) -> core::result::Result<u64, MalformedReason> {
    raw.parse().map_err(|_| MalformedReason::InvalidIdentifier {
        raw: raw.to_owned(),
    })
}

/// How [`TripleSet::parse_wire`] treats records it cannot parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WireMode {
    /// Fail on the first malformed record.
    #[default]
    Strict,
    /// Skip malformed records with a warning.
    Lenient,
}

/// Deduplicated, deterministically ordered set of containment triples.
///
/// Displays as the complete wire encoding: every triple once, ordered by
/// source, target and relation, with no separator between records.
///
/// # Examples
/// ```
/// use clustree_core::{Triple, TripleSet};
///
/// let mut triples = TripleSet::new();
/// assert!(triples.insert(Triple::member(3, 1)));
/// assert!(!triples.insert(Triple::member(3, 1)));
/// triples.insert(Triple::cluster(4, 3));
/// assert_eq!(triples.to_string(), "3,1,c-m;4,3,c-c;");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripleSet {
    triples: BTreeSet<Triple>,
}

impl TripleSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `triple`, returning `false` when it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        self.triples.insert(triple)
    }

    /// Reports whether `triple` is present.
    #[must_use]
    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    /// Number of distinct triples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// Reports whether the set holds no triples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Iterates the triples in wire order.
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Counts the triples carrying `relation`.
    #[must_use]
    pub fn count_relation(&self, relation: Relation) -> usize {
        self.iter()
            .filter(|triple| triple.relation() == relation)
            .count()
    }

    /// Writes the wire encoding to `writer`.
    ///
    /// # Errors
    /// Returns [`io::Error`] if writing to the supplied writer fails.
    pub fn write_wire(&self, mut writer: impl Write) -> io::Result<()> {
        for triple in self.iter() {
            write!(writer, "{triple}")?;
        }
        Ok(())
    }

    /// Parses a wire-encoded stream, collapsing duplicate records.
    ///
    /// Empty records (such as the one after the final terminator) are
    /// ignored and whitespace around fields is trimmed.
    ///
    /// # Errors
    /// In [`WireMode::Strict`], returns [`AssemblyError::MalformedRecord`]
    /// with the one-based record number of the first record that does not
    /// hold two integer identifiers and a known relation.
    ///
    /// # Examples
    /// ```
    /// use clustree_core::{TripleSet, WireMode};
    ///
    /// let triples = TripleSet::parse_wire("5,1,c-m;5,1,c-m;6,5,c-c;", WireMode::Strict)
    ///     .expect("stream is well formed");
    /// assert_eq!(triples.len(), 2);
    /// ```
    pub fn parse_wire(raw: &str, mode: WireMode) -> Result<Self> {
        let mut triples = Self::new();
        let records = raw
            .split(RECORD_TERMINATOR)
            .enumerate()
            .filter(|(_, record)| !record.trim().is_empty());
        for (index, record) in records {
            match (Triple::parse_record(record), mode) {
                (Ok(triple), _) => {
                    triples.insert(triple);
                }
                (Err(reason), WireMode::Strict) => {
                    return Err(AssemblyError::malformed(index + 1, reason));
                }
                (Err(reason), WireMode::Lenient) => {
                    warn!(record = index + 1, %reason, "skipping malformed triple");
                }
            }
        }
        Ok(triples)
    }
}

impl fmt::Display for TripleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.iter().try_for_each(|triple| write!(f, "{triple}"))
    }
}

impl Extend<Triple> for TripleSet {
    fn extend<I: IntoIterator<Item = Triple>>(&mut self, iter: I) {
        self.triples.extend(iter);
    }
}

impl FromIterator<Triple> for TripleSet {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        Self {
            triples: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TripleSet {
    type Item = &'a Triple;
    type IntoIter = std::collections::btree_set::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[test]
    fn identical_triples_collapse_to_one() {
        let mut triples = TripleSet::new();
        triples.insert(Triple::member(9, 4));
        triples.insert(Triple::cluster(10, 9));
        triples.insert(Triple::member(9, 4));
        assert_eq!(triples.len(), 2);
        assert_eq!(triples.to_string(), "9,4,c-m;10,9,c-c;");
    }

    #[test]
    fn same_endpoints_with_different_relations_are_distinct() {
        let triples: TripleSet = [Triple::member(3, 2), Triple::cluster(3, 2)]
            .into_iter()
            .collect();
        assert_eq!(triples.len(), 2);
        assert_eq!(triples.count_relation(Relation::ClusterCluster), 1);
    }

    #[test]
    fn write_wire_matches_display() {
        let triples: TripleSet = [Triple::cluster(12, 11), Triple::member(11, 2)]
            .into_iter()
            .collect();
        let mut buffer = Vec::new();
        triples.write_wire(&mut buffer).expect("writing to a Vec succeeds");
        assert_eq!(String::from_utf8(buffer).expect("ascii"), triples.to_string());
    }

    #[test]
    fn empty_set_serialises_to_empty_string() {
        assert_eq!(TripleSet::new().to_string(), "");
    }

    #[rstest]
    #[case::trailing_whitespace("4,1,c-m;4,2,c-m;\n", 2)]
    #[case::no_final_terminator("4,1,c-m;5,4,c-c", 2)]
    #[case::duplicates("4,1,c-m;4,1,c-m;4,1,c-m;", 1)]
    #[case::padded_fields(" 4 , 1 , c-m ;", 1)]
    #[case::empty("", 0)]
    fn parse_wire_accepts_well_formed_streams(#[case] raw: &str, #[case] expected: usize) {
        let triples = TripleSet::parse_wire(raw, WireMode::Strict).expect("stream is well formed");
        assert_eq!(triples.len(), expected);
    }

    #[rstest]
    #[case::missing_relation("4,1;", 1, MalformedReason::WrongArity { expected: 3, found: 2 })]
    #[case::unknown_relation(
        "4,1,c-m;4,2,member;",
        2,
        MalformedReason::UnknownRelation { raw: "member".into() }
    )]
    #[case::float_identifier(
        "4.0,1,c-m;",
        1,
        MalformedReason::InvalidIdentifier { raw: "4.0".into() }
    )]
    fn parse_wire_strict_reports_first_bad_record(
        #[case] raw: &str,
        #[case] record: usize,
        #[case] reason: MalformedReason,
    ) {
        let err = TripleSet::parse_wire(raw, WireMode::Strict).expect_err("stream is malformed");
        assert_eq!(err, AssemblyError::MalformedRecord { record, reason });
    }

    #[test]
    fn parse_wire_lenient_skips_bad_records() {
        let triples = TripleSet::parse_wire("4,1,c-m;garbage;4,x,c-m;5,4,c-c;", WireMode::Lenient)
            .expect("lenient parsing never fails");
        let expected: TripleSet = [Triple::member(4, 1), Triple::cluster(5, 4)]
            .into_iter()
            .collect();
        assert_eq!(triples, expected);
    }
}
