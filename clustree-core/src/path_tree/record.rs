//! Parsing of per-leaf path records.
//!
//! A data line reads `<path> <weight> <label>`, for example
//! `1:2:3 0.4 "10"`. The path's final segment is the leaf's position inside
//! its innermost module, so only the segments before it are ancestors.

use crate::triples::parse_identifier;
use crate::{AssemblyError, MalformedReason, Result};

/// First character of lines that carry no record.
pub const COMMENT_MARKER: char = '#';

const PATH_SEPARATOR: char = ':';
const MIN_FIELDS: usize = 3;
const LABEL_DELIMITERS: [(char, char); 5] =
    [('"', '"'), ('\'', '\''), ('(', ')'), ('[', ']'), ('{', '}')];

/// One leaf of a path tree.
///
/// # Examples
/// ```
/// use clustree_core::LeafRecord;
///
/// let record = LeafRecord::parse(r#"1:2:3 0.4 "10""#).expect("line is well formed");
/// assert_eq!(record.path(), &[1, 2]);
/// assert_eq!(record.leaf_id(), 10);
/// assert!(record.is_retained());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LeafRecord {
    path: Vec<u64>,
    weight: f64,
    leaf_id: u64,
}

impl LeafRecord {
    /// Creates a record from an ancestor path (root first), a flow weight and
    /// a leaf identifier.
    #[must_use]
    pub fn new(path: Vec<u64>, weight: f64, leaf_id: u64) -> Self {
        Self {
            path,
            weight,
            leaf_id,
        }
    }

    /// Parses one data line.
    ///
    /// # Errors
    /// Returns [`MalformedReason`] when the line has fewer than three fields,
    /// a path segment or the leaf label is not a non-negative integer, or the
    /// weight is not a finite number.
    pub fn parse(line: &str) -> core::result::Result<Self, MalformedReason> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [path, weight, label, ..] = fields.as_slice() else {
            return Err(MalformedReason::MissingFields {
                expected: MIN_FIELDS,
                found: fields.len(),
            });
        };

        let mut segments = path
            .split(PATH_SEPARATOR)
            .map(|segment| {
                segment
                    .parse::<u64>()
                    .map_err(|_| MalformedReason::InvalidPathSegment {
                        segment: segment.to_owned(),
                    })
            })
            .collect::<core::result::Result<Vec<_>, _>>()?;
        // Drop the leaf's position within its module.
        segments.pop();

        let weight = weight
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| MalformedReason::InvalidWeight {
                raw: (*weight).to_owned(),
            })?;

        Ok(Self::new(segments, weight, parse_identifier(strip_label(label))?))
    }

    /// Ancestor module ids, root first.
    #[must_use]
    pub fn path(&self) -> &[u64] {
        &self.path
    }

    /// Flow weight reported for the leaf.
    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }

    /// Original identifier of the leaf.
    #[must_use]
    pub const fn leaf_id(&self) -> u64 {
        self.leaf_id
    }

    /// Reports whether the record takes part in hierarchy construction;
    /// records carrying no flow are discarded.
    #[must_use]
    pub fn is_retained(&self) -> bool {
        self.weight != 0.0
    }
}

fn strip_label(label: &str) -> &str {
    LABEL_DELIMITERS
        .iter()
        .find_map(|&(open, close)| {
            label
                .strip_prefix(open)
                .and_then(|rest| rest.strip_suffix(close))
        })
        .unwrap_or(label)
}

/// Parses every data line of `text`, skipping blank and comment lines.
///
/// # Errors
/// Returns [`AssemblyError::MalformedRecord`] carrying the one-based line
/// number of the first line that fails [`LeafRecord::parse`].
pub fn parse_records(text: &str) -> Result<Vec<LeafRecord>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && !line.starts_with(COMMENT_MARKER))
        .map(|(index, line)| {
            LeafRecord::parse(line).map_err(|reason| AssemblyError::malformed(index + 1, reason))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::quoted(r#"1:2:3 0.4 "10""#, vec![1, 2], 10)]
    #[case::single_quoted("4:1 0.1 '7'", vec![4], 7)]
    #[case::bracketed("2:5:1:9 0.25 (33)", vec![2, 5, 1], 33)]
    #[case::bare_label("3:1 0.5 8", vec![3], 8)]
    #[case::top_level_leaf(r#"6 0.5 "2""#, vec![], 2)]
    #[case::trailing_fields(r#"1:1 0.5 "2" 17"#, vec![1], 2)]
    fn parses_data_lines(#[case] line: &str, #[case] path: Vec<u64>, #[case] leaf: u64) {
        let record = LeafRecord::parse(line).expect("line is well formed");
        assert_eq!(record.path(), path.as_slice());
        assert_eq!(record.leaf_id(), leaf);
    }

    #[rstest]
    #[case::too_few_fields("1:2 0.4", MalformedReason::MissingFields { expected: 3, found: 2 })]
    #[case::bad_segment(
        r#"1:x:3 0.4 "10""#,
        MalformedReason::InvalidPathSegment { segment: "x".into() }
    )]
    #[case::bad_weight(
        r#"1:2 heavy "10""#,
        MalformedReason::InvalidWeight { raw: "heavy".into() }
    )]
    #[case::infinite_weight(
        r#"1:2 inf "10""#,
        MalformedReason::InvalidWeight { raw: "inf".into() }
    )]
    #[case::bad_leaf(
        r#"1:2 0.4 "ten""#,
        MalformedReason::InvalidIdentifier { raw: "ten".into() }
    )]
    fn rejects_malformed_lines(#[case] line: &str, #[case] expected: MalformedReason) {
        let err = LeafRecord::parse(line).expect_err("line is malformed");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case("0", false)]
    #[case("0.000", false)]
    #[case("1e-9", true)]
    fn zero_weight_records_are_not_retained(#[case] weight: &str, #[case] retained: bool) {
        let record = LeafRecord::parse(&format!("1:1 {weight} \"4\"")).expect("line is well formed");
        assert_eq!(record.is_retained(), retained);
    }

    #[test]
    fn parse_records_skips_comments_and_reports_line_numbers() {
        let text = "# Codelength 3.2 bits\n# path flow name\n1:1 0.5 \"1\"\n\n1:2 oops \"2\"\n";
        let err = parse_records(text).expect_err("line 5 is malformed");
        assert_eq!(
            err,
            AssemblyError::MalformedRecord {
                record: 5,
                reason: MalformedReason::InvalidWeight { raw: "oops".into() },
            }
        );
    }

    #[test]
    fn parse_records_returns_every_data_line() {
        let records = parse_records("# header\n1:1 0.5 \"1\"\n1:2 0 \"2\"\n").expect("well formed");
        assert_eq!(records.len(), 2);
        assert!(!records.iter().all(LeafRecord::is_retained));
    }
}
