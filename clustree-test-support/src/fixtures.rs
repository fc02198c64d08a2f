//! Canned inputs shared by the core and CLI test suites.

/// Path-tree output with two top-level modules, one of them split into two
/// submodules, and a leaf without flow.
pub const SAMPLE_TREE: &str = "# Codelength = 3.46 bits.\n\
# path flow name node_id\n\
1:1:1 0.1 \"1\" 1\n\
1:1:2 0.1 \"2\" 2\n\
1:2:1 0.1 \"3\" 3\n\
1:2:2 0.1 \"4\" 4\n\
2:1 0.2 \"5\" 5\n\
2:2 0.2 \"6\" 6\n\
2:3 0 \"7\" 7\n";

/// Wire encoding of the hierarchy in [`SAMPLE_TREE`].
pub const SAMPLE_TREE_TRIPLES: &str =
    "7,1,c-m;7,2,c-m;8,3,c-m;8,4,c-m;9,7,c-c;9,8,c-c;10,5,c-m;10,6,c-m;11,9,c-c;11,10,c-c;";

/// Two-level coarsening document as accepted by the command line.
pub const SAMPLE_COARSENING: &str = r#"{"levels": [[[1, 2, 3], [4, 5]], [[1, 2, 3, 4, 5]]]}"#;

/// Wire encoding of the hierarchy in [`SAMPLE_COARSENING`].
pub const SAMPLE_COARSENING_TRIPLES: &str =
    "6,1,c-m;6,2,c-m;6,3,c-m;7,4,c-m;7,5,c-m;8,6,c-c;8,7,c-c;";

/// Term-edge listing with two terms and three genes.
pub const SAMPLE_TERM_EDGES: &str = "# parent child type\n\
20 21 default\n\
20 22 default\n\
21 1 gene\n\
21 2 gene\n\
22 3 gene\n";

/// Wire encoding of [`SAMPLE_TERM_EDGES`].
pub const SAMPLE_TERM_EDGES_TRIPLES: &str = "20,21,c-c;20,22,c-c;21,1,c-m;21,2,c-m;22,3,c-m;";

/// Renders `(ancestor path, leaf id)` rows as path-tree lines.
///
/// Each line gets a flow of `0.1` and the leaf position `1` inside its
/// innermost module.
///
/// # Examples
/// ```
/// use clustree_test_support::fixtures::render_path_tree;
///
/// let text = render_path_tree(&[(vec![2, 1], 9), (vec![], 4)]);
/// assert_eq!(text, "2:1:1 0.1 \"9\"\n1 0.1 \"4\"\n");
/// ```
#[must_use]
pub fn render_path_tree(rows: &[(Vec<u64>, u64)]) -> String {
    rows.iter()
        .map(|(path, leaf)| {
            let mut segments: Vec<String> = path.iter().map(u64::to_string).collect();
            segments.push("1".to_owned());
            format!("{} 0.1 \"{leaf}\"\n", segments.join(":"))
        })
        .collect()
}
