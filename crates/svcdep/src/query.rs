//! The dependency query engine: breadth-first closure over the registry.
//!
//! Given a set of root services, a set of relations to follow, and a
//! runlevel context, [`depends`] answers "which services are related" as a
//! deduplicated sequence in first-discovery order. The walk is an explicit
//! work queue plus a visited set keyed by service name, so cyclic graphs
//! terminate and stack depth stays flat regardless of graph size.
//!
//! The engine is a pure function over a loaded [`Registry`]; it performs
//! no I/O and never mutates the snapshot.

use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::relation::Relation;
use crate::types::ServiceName;
use std::collections::{HashSet, VecDeque};

/// Traversal options.
///
/// `trace` and `strict` are independent toggles; any combination is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOpts {
    /// Follow transitive relationships (`false` stops at direct neighbors)
    pub trace: bool,

    /// Only include neighbors that are members of the given runlevel
    pub strict: bool,
}

impl Default for QueryOpts {
    fn default() -> Self {
        Self {
            trace: true,
            strict: false,
        }
    }
}

/// Compute the services related to `roots` through `relations`.
///
/// An empty `relations` slice means the default set (`need` plus `use`,
/// forward). Roots are emitted first, in caller order; each hop's
/// neighbors follow grouped by relation, declaration order within each,
/// breadth-first. A name is emitted at most once.
///
/// Roots without a registry entry are skipped so the caller can diagnose
/// them individually. Dangling neighbors are emitted but never expanded.
/// In strict mode a neighbor outside `runlevel` is dropped entirely, not
/// traversed through; strict with no runlevel yields no neighbors at all.
/// With `trace` off, traversal stops after the roots' direct neighbors.
///
/// # Errors
///
/// Returns [`Error::NoDependencyInfo`] when not a single root has a
/// registry entry (an empty root set included).
pub fn depends(
    registry: &Registry,
    relations: &[Relation],
    roots: &[ServiceName],
    runlevel: Option<&str>,
    opts: QueryOpts,
) -> Result<Vec<ServiceName>> {
    let relations = if relations.is_empty() {
        &Relation::DEFAULT[..]
    } else {
        relations
    };
    let max_depth = if opts.trace { None } else { Some(1) };

    let mut result = Vec::new();
    let mut visited: HashSet<ServiceName> = HashSet::new();
    let mut queue: VecDeque<(ServiceName, usize)> = VecDeque::new();

    for root in roots {
        if !registry.contains(root.as_str()) {
            continue;
        }
        if visited.insert(root.clone()) {
            result.push(root.clone());
            queue.push_back((root.clone(), 0));
        }
    }

    if queue.is_empty() {
        return Err(Error::NoDependencyInfo {
            roots: roots.iter().map(ToString::to_string).collect(),
        });
    }

    while let Some((current, depth)) = queue.pop_front() {
        if let Some(max) = max_depth {
            if depth >= max {
                continue;
            }
        }
        // Dangling names are emitted when discovered but never expanded,
        // not even backwards through declarations that point at them.
        if !registry.contains(current.as_str()) {
            continue;
        }

        for &relation in relations {
            for neighbor in registry.related(current.as_str(), relation) {
                if opts.strict
                    && !runlevel.is_some_and(|level| registry.in_runlevel(neighbor.as_str(), level))
                {
                    continue;
                }
                if visited.insert(neighbor.clone()) {
                    result.push(neighbor.clone());
                    queue.push_back((neighbor.clone(), depth + 1));
                }
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::DepTree;
    use crate::types::{RawEntry, RunlevelSource, ServiceSource};
    use chrono::Utc;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn source(name: &str, entries: &[(&str, &str)]) -> ServiceSource {
        ServiceSource {
            name: name.into(),
            mtime: Utc::now(),
            entries: entries
                .iter()
                .map(|(tag, target)| RawEntry::new(*tag, *target))
                .collect(),
        }
    }

    fn runlevel(name: &str, members: &[&str]) -> RunlevelSource {
        RunlevelSource {
            name: name.to_string(),
            mtime: Utc::now(),
            members: members.iter().map(|m| ServiceName::from(*m)).collect(),
        }
    }

    fn registry(services: Vec<ServiceSource>, runlevels: Vec<RunlevelSource>) -> Registry {
        Registry::new(DepTree::build(services, runlevels, &[]).unwrap())
    }

    fn names(result: &[ServiceName]) -> Vec<&str> {
        result.iter().map(ServiceName::as_str).collect()
    }

    fn roots(names: &[&str]) -> Vec<ServiceName> {
        names.iter().map(|n| ServiceName::from(*n)).collect()
    }

    #[test]
    fn closure_follows_requested_relations_transitively() {
        // sshd -need-> net -need-> localmount
        //   \-use-> dns
        let reg = registry(
            vec![
                source("sshd", &[("need", "net"), ("use", "dns")]),
                source("net", &[("need", "localmount")]),
                source("dns", &[]),
                source("localmount", &[]),
            ],
            Vec::new(),
        );

        let result = depends(
            &reg,
            &[],
            &roots(&["sshd"]),
            None,
            QueryOpts::default(),
        )
        .unwrap();
        assert_eq!(names(&result), ["sshd", "net", "dns", "localmount"]);
    }

    #[test]
    fn cycle_terminates_without_repeats() {
        // a -need-> b -need-> c -need-> a
        let reg = registry(
            vec![
                source("a", &[("need", "b")]),
                source("b", &[("need", "c")]),
                source("c", &[("need", "a")]),
            ],
            Vec::new(),
        );

        let result = depends(
            &reg,
            &[Relation::Need],
            &roots(&["a"]),
            None,
            QueryOpts::default(),
        )
        .unwrap();
        assert_eq!(names(&result), ["a", "b", "c"]);
    }

    #[test]
    fn no_trace_stops_at_direct_neighbors() {
        let reg = registry(
            vec![
                source("a", &[("need", "b")]),
                source("b", &[("need", "c")]),
                source("c", &[]),
            ],
            Vec::new(),
        );

        let direct = depends(
            &reg,
            &[Relation::Need],
            &roots(&["a"]),
            None,
            QueryOpts {
                trace: false,
                strict: false,
            },
        )
        .unwrap();
        assert_eq!(names(&direct), ["a", "b"]);

        let full = depends(
            &reg,
            &[Relation::Need],
            &roots(&["a"]),
            None,
            QueryOpts::default(),
        )
        .unwrap();
        let full: BTreeSet<&str> = full.iter().map(ServiceName::as_str).collect();
        for name in names(&direct) {
            assert!(full.contains(name));
        }
    }

    #[test]
    fn dangling_targets_are_terminal_but_present() {
        let reg = registry(vec![source("a", &[("need", "ghost")])], Vec::new());

        let result = depends(
            &reg,
            &[Relation::Need],
            &roots(&["a"]),
            None,
            QueryOpts::default(),
        )
        .unwrap();
        assert_eq!(names(&result), ["a", "ghost"]);
    }

    #[test]
    fn dangling_names_are_not_expanded_backwards() {
        // a and b both need ghost; walking need+needed-by from a must not
        // reach b through the dangling name.
        let reg = registry(
            vec![
                source("a", &[("need", "ghost")]),
                source("b", &[("need", "ghost")]),
            ],
            Vec::new(),
        );

        let result = depends(
            &reg,
            &[Relation::Need, Relation::NeededBy],
            &roots(&["a"]),
            None,
            QueryOpts::default(),
        )
        .unwrap();
        assert_eq!(names(&result), ["a", "ghost"]);
    }

    #[test]
    fn unknown_roots_are_skipped_until_none_remain() {
        let reg = registry(vec![source("a", &[("need", "b")])], Vec::new());

        // One known root: the unknown one is skipped, the query proceeds.
        let result = depends(
            &reg,
            &[Relation::Need],
            &roots(&["ghost", "a"]),
            None,
            QueryOpts::default(),
        )
        .unwrap();
        assert_eq!(names(&result), ["a", "b"]);

        // No known roots at all: the query fails with every name listed.
        let err = depends(
            &reg,
            &[Relation::Need],
            &roots(&["ghost", "phantom"]),
            None,
            QueryOpts::default(),
        )
        .unwrap_err();
        match err {
            Error::NoDependencyInfo { roots } => {
                assert_eq!(roots, ["ghost", "phantom"]);
            }
            other => panic!("expected NoDependencyInfo, got {other:?}"),
        }
    }

    #[test]
    fn empty_root_set_is_a_caller_error() {
        let reg = registry(vec![source("a", &[])], Vec::new());

        let err = depends(&reg, &[], &[], None, QueryOpts::default()).unwrap_err();
        assert!(matches!(err, Error::NoDependencyInfo { .. }));
    }

    #[test]
    fn strict_drops_non_members_entirely() {
        // a -need-> b -need-> c, with only a and c in the runlevel.
        // b is dropped, and the walk must not reach c through it.
        let reg = registry(
            vec![
                source("a", &[("need", "b")]),
                source("b", &[("need", "c")]),
                source("c", &[]),
            ],
            vec![runlevel("default", &["a", "c"])],
        );

        let result = depends(
            &reg,
            &[Relation::Need],
            &roots(&["a"]),
            Some("default"),
            QueryOpts {
                trace: true,
                strict: true,
            },
        )
        .unwrap();
        assert_eq!(names(&result), ["a"]);
    }

    #[test]
    fn strict_without_runlevel_yields_roots_only() {
        let reg = registry(
            vec![source("a", &[("need", "b")]), source("b", &[])],
            Vec::new(),
        );

        let result = depends(
            &reg,
            &[Relation::Need],
            &roots(&["a"]),
            None,
            QueryOpts {
                trace: true,
                strict: true,
            },
        )
        .unwrap();
        assert_eq!(names(&result), ["a"]);
    }

    #[test]
    fn cross_domain_reference_respects_strictness() {
        // "boot" names a runlevel, not a service: a dangling reference.
        let reg = registry(
            vec![source("a", &[("before", "boot")])],
            vec![
                runlevel("boot", &["clock"]),
                runlevel("default", &["a", "boot"]),
            ],
        );
        let r = &[Relation::Before];

        let loose = depends(&reg, r, &roots(&["a"]), None, QueryOpts::default()).unwrap();
        assert_eq!(names(&loose), ["a", "boot"]);

        // Strict against a runlevel that does not list "boot" as a member.
        let strict = QueryOpts {
            trace: true,
            strict: true,
        };
        let excluded = depends(&reg, r, &roots(&["a"]), Some("boot"), strict).unwrap();
        assert_eq!(names(&excluded), ["a"]);

        // Strict against a runlevel that does list it.
        let included = depends(&reg, r, &roots(&["a"]), Some("default"), strict).unwrap();
        assert_eq!(names(&included), ["a", "boot"]);
    }

    #[test]
    fn root_order_is_preserved() {
        let reg = registry(
            vec![
                source("b", &[("need", "x")]),
                source("a", &[("need", "y")]),
                source("x", &[]),
                source("y", &[]),
            ],
            Vec::new(),
        );

        let result = depends(
            &reg,
            &[Relation::Need],
            &roots(&["a", "b"]),
            None,
            QueryOpts::default(),
        )
        .unwrap();
        assert_eq!(names(&result), ["a", "b", "y", "x"]);
    }

    #[test]
    fn duplicate_roots_collapse() {
        let reg = registry(vec![source("a", &[("need", "b")])], Vec::new());

        let result = depends(
            &reg,
            &[Relation::Need],
            &roots(&["a", "a"]),
            None,
            QueryOpts::default(),
        )
        .unwrap();
        assert_eq!(names(&result), ["a", "b"]);
    }

    #[test]
    fn reverse_relations_traverse_dependents() {
        // apache and sshd need net; monitor needs sshd.
        let reg = registry(
            vec![
                source("apache", &[("need", "net")]),
                source("sshd", &[("need", "net")]),
                source("monitor", &[("need", "sshd")]),
                source("net", &[]),
            ],
            Vec::new(),
        );

        let result = depends(
            &reg,
            &[Relation::NeededBy],
            &roots(&["net"]),
            None,
            QueryOpts::default(),
        )
        .unwrap();
        assert_eq!(names(&result), ["net", "apache", "sshd", "monitor"]);
    }

    #[test]
    fn default_relation_set_is_need_and_use() {
        let reg = registry(
            vec![
                source("a", &[("need", "b"), ("use", "c"), ("after", "d")]),
                source("b", &[]),
                source("c", &[]),
                source("d", &[]),
            ],
            Vec::new(),
        );

        let result = depends(&reg, &[], &roots(&["a"]), None, QueryOpts::default()).unwrap();
        assert_eq!(names(&result), ["a", "b", "c"]);
    }

    #[test]
    fn trace_and_strict_combine_independently() {
        // a -need-> b -need-> c, everyone in the runlevel.
        let reg = registry(
            vec![
                source("a", &[("need", "b")]),
                source("b", &[("need", "c")]),
                source("c", &[]),
            ],
            vec![runlevel("default", &["a", "b", "c"])],
        );
        let r = &[Relation::Need];
        let root = roots(&["a"]);
        let level = Some("default");

        let run = |trace: bool, strict: bool| {
            let result =
                depends(&reg, r, &root, level, QueryOpts { trace, strict }).unwrap();
            names(&result).join(" ")
        };

        assert_eq!(run(true, true), "a b c");
        assert_eq!(run(true, false), "a b c");
        assert_eq!(run(false, true), "a b");
        assert_eq!(run(false, false), "a b");
    }

    proptest! {
        /// Random graphs over eight services: the walk terminates, emits
        /// no duplicates, starts with the root, and depth-1 results are a
        /// subset of the full closure.
        #[test]
        fn traversal_invariants_hold_on_random_graphs(
            edges in proptest::collection::vec((0usize..8, 0usize..5, 0usize..8), 0..64)
        ) {
            let mut entries: Vec<Vec<(String, String)>> = vec![Vec::new(); 8];
            for (from, kind, to) in edges {
                let tag = crate::relation::DepKind::ALL[kind].as_str().to_string();
                entries[from].push((tag, format!("s{to}")));
            }
            let sources: Vec<ServiceSource> = entries
                .into_iter()
                .enumerate()
                .map(|(i, raw)| ServiceSource {
                    name: format!("s{i}").into(),
                    mtime: Utc::now(),
                    entries: raw
                        .into_iter()
                        .map(|(tag, target)| RawEntry::new(tag, target))
                        .collect(),
                })
                .collect();
            let reg = registry(sources, Vec::new());
            let root = roots(&["s0"]);
            let relations = [Relation::Need, Relation::Use, Relation::ProvidedBy];

            let full = depends(&reg, &relations, &root, None, QueryOpts::default()).unwrap();
            let unique: HashSet<&ServiceName> = full.iter().collect();
            prop_assert_eq!(unique.len(), full.len());
            prop_assert_eq!(full[0].as_str(), "s0");

            let direct = depends(
                &reg,
                &relations,
                &root,
                None,
                QueryOpts { trace: false, strict: false },
            )
            .unwrap();
            let full_set: HashSet<&ServiceName> = full.iter().collect();
            for name in &direct {
                prop_assert!(full_set.contains(name));
            }
        }
    }
}
