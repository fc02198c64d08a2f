//! Structural checks over wire-encoded hierarchies.
//!
//! The checks read the wire text directly instead of the library's own
//! types, so they stay an independent oracle for the assemblers. Each one
//! returns `Err` with a human-readable reason on the first breach.

use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One decoded `source,target,relation;` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    /// Containing cluster.
    pub source: u64,
    /// Contained cluster or member.
    pub target: u64,
    /// `true` for `c-m`, `false` for `c-c`.
    pub member: bool,
}

/// Decodes every record of `wire`, keeping duplicates.
///
/// # Errors
/// Returns a description of the first record that is not
/// `<u64>,<u64>,c-c|c-m`.
///
/// # Examples
/// ```
/// use clustree_test_support::hierarchy::parse_edges;
///
/// let edges = parse_edges("3,1,c-m;4,3,c-c;").expect("wire is valid");
/// assert_eq!(edges.len(), 2);
/// assert!(edges[0].member);
/// ```
pub fn parse_edges(wire: &str) -> Result<Vec<Edge>, String> {
    let Some(body) = wire.strip_suffix(';') else {
        return if wire.is_empty() {
            Ok(Vec::new())
        } else {
            Err(format!("wire does not end with a terminator: {wire:?}"))
        };
    };
    body.split(';')
        .map(|record| {
            let fields: Vec<&str> = record.split(',').collect();
            let [source, target, relation] = fields.as_slice() else {
                return Err(format!("record {record:?} does not have three fields"));
            };
            let member = match *relation {
                "c-m" => true,
                "c-c" => false,
                other => return Err(format!("unknown relation {other:?}")),
            };
            let parse = |raw: &str| {
                raw.parse::<u64>()
                    .map_err(|err| format!("identifier {raw:?} in {record:?}: {err}"))
            };
            Ok(Edge {
                source: parse(*source)?,
                target: parse(*target)?,
                member,
            })
        })
        .collect()
}

/// Original ids reached through `c-m` edges.
///
/// # Panics
/// Panics when `wire` cannot be decoded.
#[must_use]
pub fn member_ids(wire: &str) -> BTreeSet<u64> {
    parse_edges(wire)
        .unwrap_or_else(|reason| panic!("undecodable wire: {reason}"))
        .into_iter()
        .filter(|edge| edge.member)
        .map(|edge| edge.target)
        .collect()
}

/// Checks that no record appears twice.
///
/// # Errors
/// Names the first repeated record.
pub fn check_no_duplicates(wire: &str) -> Result<(), String> {
    let mut seen = BTreeSet::new();
    for edge in parse_edges(wire)? {
        if !seen.insert(edge) {
            return Err(format!("duplicate record {edge:?}"));
        }
    }
    Ok(())
}

/// Checks that no cluster id collides with an original id.
///
/// # Errors
/// Names the first cluster id found in `originals`.
pub fn check_disjoint(wire: &str, originals: &BTreeSet<u64>) -> Result<(), String> {
    for edge in parse_edges(wire)? {
        let clusters = if edge.member {
            vec![edge.source]
        } else {
            vec![edge.source, edge.target]
        };
        if let Some(id) = clusters.into_iter().find(|id| originals.contains(id)) {
            return Err(format!("cluster id {id} is also an original id"));
        }
    }
    Ok(())
}

/// Checks for a single root from which every member's parent is reachable
/// through `c-c` edges, with every member held by exactly one cluster.
///
/// # Errors
/// Describes the missing root, the extra roots, the shared member or the
/// unreachable cluster.
pub fn check_rooted(wire: &str) -> Result<(), String> {
    let edges = parse_edges(wire)?;
    let mut children: HashMap<u64, Vec<u64>> = HashMap::new();
    let mut contained = BTreeSet::new();
    let mut sources = BTreeSet::new();
    let mut owners: BTreeMap<u64, Vec<u64>> = BTreeMap::new();
    for edge in &edges {
        sources.insert(edge.source);
        if edge.member {
            owners.entry(edge.target).or_default().push(edge.source);
        } else {
            children.entry(edge.source).or_default().push(edge.target);
            contained.insert(edge.target);
        }
    }

    let roots: Vec<u64> = sources.difference(&contained).copied().collect();
    let [root] = roots.as_slice() else {
        return Err(format!("expected exactly one root, found {roots:?}"));
    };

    let mut reachable = BTreeSet::from([*root]);
    let mut stack = vec![*root];
    while let Some(cluster) = stack.pop() {
        for &child in children.get(&cluster).into_iter().flatten() {
            if reachable.insert(child) {
                stack.push(child);
            }
        }
    }

    for (member, parents) in owners {
        let [parent] = parents.as_slice() else {
            return Err(format!("member {member} has parents {parents:?}"));
        };
        if !reachable.contains(parent) {
            return Err(format!("cluster {parent} holding {member} is not reachable from {root}"));
        }
    }
    Ok(())
}

/// Checks that every `c-c` child covers strictly fewer original ids than its
/// parent.
///
/// # Errors
/// Names the first parent/child pair whose expanded member sets are not in
/// strict containment, or a cycle.
pub fn check_strict_containment(wire: &str) -> Result<(), String> {
    let edges = parse_edges(wire)?;
    let mut expanded: HashMap<u64, BTreeSet<u64>> = HashMap::new();
    for edge in &edges {
        expanded.entry(edge.source).or_default();
    }
    let clusters: Vec<u64> = expanded.keys().copied().collect();
    for cluster in clusters {
        expand(cluster, &edges, &mut expanded, &mut BTreeSet::new())?;
    }

    for edge in edges.iter().filter(|edge| !edge.member) {
        let parent = expanded.get(&edge.source).cloned().unwrap_or_default();
        let child = expanded.get(&edge.target).cloned().unwrap_or_default();
        if !(child.is_subset(&parent) && child.len() < parent.len()) {
            return Err(format!(
                "cluster {} {child:?} is not strictly inside {} {parent:?}",
                edge.target, edge.source
            ));
        }
    }
    Ok(())
}

fn expand(
    cluster: u64,
    edges: &[Edge],
    expanded: &mut HashMap<u64, BTreeSet<u64>>,
    visiting: &mut BTreeSet<u64>,
) -> Result<BTreeSet<u64>, String> {
    if !visiting.insert(cluster) {
        return Err(format!("cycle through cluster {cluster}"));
    }
    let mut members = BTreeSet::new();
    for edge in edges.iter().filter(|edge| edge.source == cluster) {
        if edge.member {
            members.insert(edge.target);
        } else {
            members.extend(expand(edge.target, edges, expanded, visiting)?);
        }
    }
    visiting.remove(&cluster);
    expanded.insert(cluster, members.clone());
    Ok(members)
}
