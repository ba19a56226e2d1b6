//! Configuration hierarchy - the inheritance DAG of a module.
//!
//! Edges point from parent to child, so a topological walk visits every
//! parent before the configurations inheriting from it.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::core::configuration::ConfigurationLine;
use crate::resolver::ResolveError;

/// Name of the conventional default configuration.
pub const FULL_BUILD: &str = "full-build";

/// The configuration DAG of one module.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationHierarchy {
    /// Parent -> child edges
    graph: DiGraph<String, ()>,

    /// Map from configuration name to node index
    nodes: HashMap<String, NodeIndex>,

    /// Direct parents of declared configurations, in source order
    parents: HashMap<String, Vec<String>>,

    /// Configurations that have their own header line
    declared: HashSet<String>,

    /// Configuration carrying the `*default` marker
    explicit_default: Option<String>,
}

impl ConfigurationHierarchy {
    /// Build the hierarchy from parsed header lines.
    pub fn build(lines: &[ConfigurationLine]) -> Result<Self, ResolveError> {
        let mut hierarchy = ConfigurationHierarchy::default();

        for line in lines {
            let name = line.config_name.as_str();
            if !hierarchy.declared.insert(name.to_string()) {
                return Err(ResolveError::DuplicateConfiguration {
                    configuration: name.to_string(),
                });
            }

            let child = hierarchy.node(name);
            for parent in &line.parent_names {
                if parent == name {
                    return Err(ResolveError::Cycle {
                        configurations: vec![name.to_string(), name.to_string()],
                    });
                }
                let parent_node = hierarchy.node(parent);
                hierarchy.graph.update_edge(parent_node, child, ());
            }
            hierarchy
                .parents
                .insert(name.to_string(), line.parent_names.clone());

            if line.is_default {
                match hierarchy.explicit_default {
                    None => hierarchy.explicit_default = Some(name.to_string()),
                    Some(ref existing) => tracing::warn!(
                        "configuration `{}` is marked default, keeping `{}`",
                        name,
                        existing
                    ),
                }
            }
        }

        hierarchy.check_acyclic()?;
        Ok(hierarchy)
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(&node) = self.nodes.get(name) {
            return node;
        }
        let node = self.graph.add_node(name.to_string());
        self.nodes.insert(name.to_string(), node);
        node
    }

    fn check_acyclic(&self) -> Result<(), ResolveError> {
        if toposort(&self.graph, None).is_ok() {
            return Ok(());
        }

        let component = tarjan_scc(&self.graph)
            .into_iter()
            .find(|scc| scc.len() > 1)
            .unwrap_or_default();

        let mut configurations: Vec<String> = component
            .iter()
            .rev()
            .map(|&node| self.graph[node].clone())
            .collect();
        if let Some(first) = configurations.first().cloned() {
            configurations.push(first);
        }

        Err(ResolveError::Cycle { configurations })
    }

    /// Every configuration name that is declared or referenced as a parent,
    /// in order of first appearance.
    pub fn all_configurations(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .map(|node| self.graph[node].as_str())
            .collect()
    }

    /// Check if a name is known, either declared or referenced as a parent.
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Check if a configuration has its own header line.
    pub fn is_declared(&self, name: &str) -> bool {
        self.declared.contains(name)
    }

    /// Direct parents of a configuration, as declared.
    ///
    /// Names that are only referenced as parents have no parents of their own.
    pub fn closest_parents(&self, name: &str) -> Result<&[String], ResolveError> {
        if !self.contains(name) {
            return Err(ResolveError::UnknownConfiguration {
                module: String::new(),
                configuration: name.to_string(),
            });
        }
        Ok(self.parents.get(name).map(Vec::as_slice).unwrap_or(&[]))
    }

    /// All ancestors of a configuration, breadth-first over closest parents.
    pub fn ancestors(&self, name: &str) -> Result<Vec<&str>, ResolveError> {
        let mut seen: HashSet<&str> = HashSet::from([name]);
        let mut ancestors = Vec::new();
        let mut queue: VecDeque<&str> = self
            .closest_parents(name)?
            .iter()
            .map(String::as_str)
            .collect();

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            ancestors.push(current);
            queue.extend(self.closest_parents(current)?.iter().map(String::as_str));
        }

        Ok(ancestors)
    }

    /// Configurations ordered so that parents come before their children.
    pub fn topological_order(&self) -> Vec<&str> {
        // Acyclic by construction.
        toposort(&self.graph, None)
            .map(|order| {
                order
                    .into_iter()
                    .map(|node| self.graph[node].as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The explicitly marked default, else `full-build` when present.
    pub fn default_configuration(&self) -> Result<&str, ResolveError> {
        if let Some(ref name) = self.explicit_default {
            return Ok(name);
        }
        if self.contains(FULL_BUILD) {
            return Ok(FULL_BUILD);
        }
        Err(ResolveError::NoDefaultConfiguration {
            module: String::new(),
        })
    }

    /// Number of known configurations.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Check if no configuration is known.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<ConfigurationLine> {
        raw.iter()
            .map(|line| ConfigurationLine::parse(line).unwrap())
            .collect()
    }

    #[test]
    fn test_all_configurations_includes_parent_references() {
        let hierarchy = ConfigurationHierarchy::build(&lines(&["child > p1,p2", "p1"])).unwrap();

        assert_eq!(hierarchy.all_configurations(), vec!["child", "p1", "p2"]);
        assert!(hierarchy.is_declared("p1"));
        assert!(!hierarchy.is_declared("p2"));
        assert!(hierarchy.contains("p2"));
    }

    #[test]
    fn test_closest_parents_are_direct_only() {
        let hierarchy =
            ConfigurationHierarchy::build(&lines(&["base", "mid > base", "top > mid"])).unwrap();

        assert_eq!(hierarchy.closest_parents("top").unwrap(), ["mid"]);
        assert_eq!(hierarchy.closest_parents("mid").unwrap(), ["base"]);
        assert!(hierarchy.closest_parents("base").unwrap().is_empty());
        assert!(matches!(
            hierarchy.closest_parents("nope"),
            Err(ResolveError::UnknownConfiguration { .. })
        ));
    }

    #[test]
    fn test_ancestors_breadth_first() {
        let hierarchy = ConfigurationHierarchy::build(&lines(&[
            "config0",
            "config1 > config0",
            "config2",
            "full-build > config1,config2",
        ]))
        .unwrap();

        assert_eq!(
            hierarchy.ancestors("full-build").unwrap(),
            vec!["config1", "config2", "config0"]
        );
    }

    #[test]
    fn test_ancestors_of_diamond_visit_base_once() {
        let hierarchy = ConfigurationHierarchy::build(&lines(&[
            "base",
            "p1 > base",
            "p2 > base",
            "child > p1,p2",
        ]))
        .unwrap();

        assert_eq!(hierarchy.ancestors("child").unwrap(), vec!["p1", "p2", "base"]);
    }

    #[test]
    fn test_topological_order_puts_parents_first() {
        let hierarchy = ConfigurationHierarchy::build(&lines(&[
            "child > p1,p2",
            "p1 > base",
            "p2 > base",
            "base",
        ]))
        .unwrap();

        let order = hierarchy.topological_order();
        let pos = |name: &str| order.iter().position(|n| *n == name).unwrap();

        assert_eq!(order.len(), 4);
        assert!(pos("base") < pos("p1"));
        assert!(pos("base") < pos("p2"));
        assert!(pos("p1") < pos("child"));
        assert!(pos("p2") < pos("child"));
    }

    #[test]
    fn test_cycle_is_rejected() {
        let result = ConfigurationHierarchy::build(&lines(&["a > b", "b > c", "c > a"]));
        match result {
            Err(ResolveError::Cycle { configurations }) => {
                assert_eq!(configurations.len(), 4);
                assert_eq!(configurations.first(), configurations.last());
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_self_parent_is_a_cycle() {
        assert!(matches!(
            ConfigurationHierarchy::build(&lines(&["a > a"])),
            Err(ResolveError::Cycle { .. })
        ));
    }

    #[test]
    fn test_duplicate_configuration_is_rejected() {
        assert!(matches!(
            ConfigurationHierarchy::build(&lines(&["a", "a > b"])),
            Err(ResolveError::DuplicateConfiguration { .. })
        ));
    }

    #[test]
    fn test_default_configuration() {
        let explicit =
            ConfigurationHierarchy::build(&lines(&["full-build", "sdk *default"])).unwrap();
        assert_eq!(explicit.default_configuration().unwrap(), "sdk");

        let conventional = ConfigurationHierarchy::build(&lines(&["client > full-build"])).unwrap();
        assert_eq!(conventional.default_configuration().unwrap(), "full-build");

        let missing = ConfigurationHierarchy::build(&lines(&["client"])).unwrap();
        assert!(matches!(
            missing.default_configuration(),
            Err(ResolveError::NoDefaultConfiguration { .. })
        ));
    }
}
