//! Dependency graph construction and traversal.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use pakt_core::manifest::ComposerJson;

use crate::resolver::ResolvedPackage;

/// Name used for the project node when the manifest has no `name`.
pub const ROOT_NAME: &str = "__root__";

/// A node in the resolved dependency graph.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct PackageNode {
    pub name: String,
    pub version: String,
    pub dev: bool,
}

impl PackageNode {
    pub fn key(&self) -> String {
        self.name.to_ascii_lowercase()
    }
}

impl fmt::Display for PackageNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.name, self.version)
        }
    }
}

/// Edge label: the constraint the dependent declared.
#[derive(Debug, Clone)]
pub struct DepEdge {
    pub constraint: String,
    pub dev: bool,
}

/// A resolved dependency graph backed by petgraph.
pub struct DependencyGraph {
    graph: DiGraph<PackageNode, DepEdge>,
    /// Lookup from lowercase package name to node index.
    index: HashMap<String, NodeIndex>,
    pub root: Option<NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            root: None,
        }
    }

    /// Graph of `packages` rooted at the project described by `manifest`.
    /// Requirements on names outside `packages` (platform packages,
    /// metapackages) have no node.
    pub fn from_packages(manifest: &ComposerJson, packages: &[ResolvedPackage]) -> Self {
        let mut g = Self::new();
        let root = g.add_node(PackageNode {
            name: manifest.name.clone().unwrap_or_else(|| ROOT_NAME.to_string()),
            version: String::new(),
            dev: false,
        });
        g.set_root(root);

        for p in packages {
            g.add_node(PackageNode {
                name: p.name.clone(),
                version: p.version.clone(),
                dev: p.dev,
            });
        }

        for (section, dev) in [(&manifest.require, false), (&manifest.require_dev, true)] {
            for (name, constraint) in section {
                if let Some(idx) = g.find(name) {
                    g.add_edge(
                        root,
                        idx,
                        DepEdge {
                            constraint: constraint.clone(),
                            dev,
                        },
                    );
                }
            }
        }

        for p in packages {
            let Some(from) = g.find(&p.name) else {
                continue;
            };
            for (name, constraint) in &p.require {
                if let Some(to) = g.find(name) {
                    g.add_edge(
                        from,
                        to,
                        DepEdge {
                            constraint: constraint.clone(),
                            dev: p.dev,
                        },
                    );
                }
            }
        }
        g
    }

    /// Add or retrieve a node. If the name already exists, returns the existing index.
    pub fn add_node(&mut self, node: PackageNode) -> NodeIndex {
        let key = node.key();
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(node);
        self.index.insert(key, idx);
        idx
    }

    pub fn set_root(&mut self, idx: NodeIndex) {
        self.root = Some(idx);
    }

    /// Add a dependency edge from `from` to `to`.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, edge: DepEdge) {
        if from != to && !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, edge);
        }
    }

    pub fn find(&self, name: &str) -> Option<NodeIndex> {
        self.index.get(&name.to_ascii_lowercase()).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &PackageNode {
        &self.graph[idx]
    }

    /// All packages (excluding root).
    pub fn all_nodes(&self) -> Vec<&PackageNode> {
        self.graph
            .node_indices()
            .filter(|&idx| Some(idx) != self.root)
            .map(|idx| &self.graph[idx])
            .collect()
    }

    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &DepEdge)> {
        let mut deps: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), e.weight()))
            .collect();
        deps.sort_by(|a, b| self.graph[a.0].name.cmp(&self.graph[b.0].name));
        deps
    }

    /// Reverse dependencies (who depends on this node).
    pub fn dependents_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &DepEdge)> {
        let mut deps: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (e.source(), e.weight()))
            .collect();
        deps.sort_by(|a, b| self.graph[a.0].name.cmp(&self.graph[b.0].name));
        deps
    }

    /// Print the dependency tree to a string, grouping `require` and
    /// `require-dev` roots when both are present.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        let root = match self.root {
            Some(r) => r,
            None => return output,
        };

        output.push_str(&format!("{}\n", self.graph[root]));

        let (dev_deps, prod_deps): (Vec<_>, Vec<_>) = self
            .dependencies_of(root)
            .into_iter()
            .partition(|(_, edge)| edge.dev);
        let show_headers = !dev_deps.is_empty();
        let mut visited = HashSet::new();
        visited.insert(root);

        let sections: Vec<_> = [("[require]", prod_deps), ("[require-dev]", dev_deps)]
            .into_iter()
            .filter(|(_, deps)| !deps.is_empty())
            .collect();
        let total_sections = sections.len();

        for (n, (label, deps_list)) in sections.iter().enumerate() {
            if show_headers {
                output.push_str(&format!("{label}\n"));
            }
            let is_last_section = n + 1 == total_sections;
            let count = deps_list.len();
            for (i, (idx, edge)) in deps_list.iter().enumerate() {
                let is_last = i == count - 1 && is_last_section;
                self.print_subtree(
                    &mut output,
                    *idx,
                    &edge.constraint,
                    "",
                    is_last,
                    1,
                    max_depth,
                    &mut visited,
                );
            }
        }

        output
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        constraint: &str,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let node = &self.graph[idx];
        output.push_str(&format!("{prefix}{connector}{node} ({constraint})\n"));

        if let Some(max) = max_depth {
            if depth >= max {
                return;
            }
        }

        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let deps = self.dependencies_of(idx);
        let count = deps.len();
        for (i, (child, edge)) in deps.iter().enumerate() {
            self.print_subtree(
                output,
                *child,
                &edge.constraint,
                &child_prefix,
                i == count - 1,
                depth + 1,
                max_depth,
                visited,
            );
        }

        visited.remove(&idx);
    }

    /// Path from the project to `name`, both ends included.
    ///
    /// Accepts a full `vendor/package` name or just the package part.
    pub fn find_path(&self, name: &str) -> Option<Vec<&PackageNode>> {
        let root = self.root?;
        let target = self.resolve_key(name)?;
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        if self.dfs_path(root, target, &mut path, &mut visited) {
            Some(path.iter().map(|&idx| &self.graph[idx]).collect())
        } else {
            None
        }
    }

    /// Exact name first, then the first package whose part after the `/`
    /// matches.
    fn resolve_key(&self, key: &str) -> Option<NodeIndex> {
        if let Some(idx) = self.find(key) {
            return Some(idx);
        }
        let key = key.to_ascii_lowercase();
        let mut candidates: Vec<(&String, &NodeIndex)> = self
            .index
            .iter()
            .filter(|(full, _)| full.rsplit('/').next() == Some(key.as_str()))
            .collect();
        candidates.sort();
        candidates.first().map(|(_, idx)| **idx)
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            path.pop();
            return false;
        }
        for (child, _) in self.dependencies_of(current) {
            if self.dfs_path(child, target, path, visited) {
                return true;
            }
        }
        path.pop();
        visited.remove(&current);
        false
    }

    /// Inverted tree (who requires what) for a single package.
    pub fn print_inverted_tree(&self, name: &str) -> String {
        let mut output = String::new();
        let Some(idx) = self.resolve_key(name) else {
            return output;
        };

        output.push_str(&format!("{}\n", self.graph[idx]));

        let mut visited = HashSet::new();
        visited.insert(idx);

        let dependents = self.dependents_of(idx);
        let count = dependents.len();
        for (i, (dep_idx, edge)) in dependents.iter().enumerate() {
            self.print_inverted_subtree(
                &mut output,
                *dep_idx,
                &edge.constraint,
                "",
                i == count - 1,
                &mut visited,
            );
        }

        output
    }

    fn print_inverted_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        constraint: &str,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let node = &self.graph[idx];
        output.push_str(&format!("{prefix}{connector}{node} (requires {constraint})\n"));

        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let dependents = self.dependents_of(idx);
        let count = dependents.len();
        for (i, (dep_idx, edge)) in dependents.iter().enumerate() {
            self.print_inverted_subtree(
                output,
                *dep_idx,
                &edge.constraint,
                &child_prefix,
                i == count - 1,
                visited,
            );
        }

        visited.remove(&idx);
    }

    /// Every package followed by its direct dependents.
    pub fn print_full_inverted_tree(&self) -> String {
        let mut output = String::new();
        let root = match self.root {
            Some(r) => r,
            None => return output,
        };

        let mut nodes: Vec<(NodeIndex, &PackageNode)> = self
            .graph
            .node_indices()
            .filter(|&idx| idx != root)
            .map(|idx| (idx, &self.graph[idx]))
            .collect();
        nodes.sort_by(|a, b| a.1.key().cmp(&b.1.key()));

        for (idx, node) in &nodes {
            let dependents = self.dependents_of(*idx);
            if dependents.is_empty() {
                continue;
            }
            output.push_str(&format!("{node}\n"));
            let count = dependents.len();
            for (i, (dep_idx, edge)) in dependents.iter().enumerate() {
                let connector = if i == count - 1 { "└── " } else { "├── " };
                let dep_node = &self.graph[*dep_idx];
                output.push_str(&format!("{connector}{dep_node} ({})\n", edge.constraint));
            }
            output.push('\n');
        }

        output
    }

    /// Number of packages (excluding root).
    pub fn len(&self) -> usize {
        let total = self.graph.node_count();
        if self.root.is_some() {
            total.saturating_sub(1)
        } else {
            total
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(name: &str, version: &str, require: &[(&str, &str)], dev: bool) -> ResolvedPackage {
        ResolvedPackage {
            name: name.to_string(),
            version: version.to_string(),
            url: format!("https://example.com/{name}.zip"),
            require: require
                .iter()
                .map(|(n, c)| (n.to_string(), c.to_string()))
                .collect(),
            dev,
            ..ResolvedPackage::default()
        }
    }

    fn sample() -> DependencyGraph {
        let manifest = ComposerJson::from_str(
            r#"{
                "name": "acme/app",
                "require": {"php": ">=8.1", "monolog/monolog": "^3.0", "acme/http": "^1.0"},
                "require-dev": {"phpunit/phpunit": "^10.0"}
            }"#,
        )
        .unwrap();
        let packages = vec![
            package("psr/log", "3.0.0", &[("php", ">=8.0")], false),
            package("monolog/monolog", "3.5.0", &[("psr/log", "^2.0 || ^3.0")], false),
            package("acme/http", "1.2.0", &[("psr/log", "^3.0")], false),
            package("sebastian/diff", "5.1.0", &[], true),
            package("phpunit/phpunit", "10.5.0", &[("sebastian/diff", "^5.0")], true),
        ];
        DependencyGraph::from_packages(&manifest, &packages)
    }

    #[test]
    fn add_and_find_is_case_insensitive() {
        let mut g = DependencyGraph::new();
        let idx = g.add_node(PackageNode {
            name: "PSR/Log".into(),
            version: "3.0.0".into(),
            dev: false,
        });
        assert_eq!(g.find("psr/log"), Some(idx));
        assert_eq!(g.node(idx).version, "3.0.0");
    }

    #[test]
    fn duplicate_add_returns_same_index() {
        let mut g = DependencyGraph::new();
        let node = PackageNode {
            name: "psr/log".into(),
            version: "3.0.0".into(),
            dev: false,
        };
        assert_eq!(g.add_node(node.clone()), g.add_node(node));
    }

    #[test]
    fn platform_requirements_have_no_nodes() {
        let g = sample();
        assert_eq!(g.len(), 5);
        assert!(g.find("php").is_none());
    }

    #[test]
    fn tree_groups_require_and_require_dev() {
        let tree = sample().print_tree(None);
        assert!(tree.starts_with("acme/app\n[require]\n"));
        assert!(tree.contains("├── acme/http 1.2.0 (^1.0)"));
        assert!(tree.contains("monolog/monolog 3.5.0 (^3.0)"));
        assert!(tree.contains("psr/log 3.0.0 (^2.0 || ^3.0)"));
        let req = tree.find("[require]").unwrap();
        let dev = tree.find("[require-dev]").unwrap();
        assert!(req < dev);
        assert!(tree.contains("└── phpunit/phpunit 10.5.0 (^10.0)"));
    }

    #[test]
    fn tree_depth_limit() {
        let tree = sample().print_tree(Some(1));
        assert!(tree.contains("monolog/monolog"));
        assert!(!tree.contains("psr/log"));
    }

    #[test]
    fn find_path_through_dependents() {
        let g = sample();
        let path = g.find_path("sebastian/diff").unwrap();
        let names: Vec<_> = path.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["acme/app", "phpunit/phpunit", "sebastian/diff"]);
    }

    #[test]
    fn find_path_by_short_name() {
        let g = sample();
        let path = g.find_path("log").unwrap();
        assert_eq!(path.last().unwrap().name, "psr/log");
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn find_path_not_found() {
        assert!(sample().find_path("acme/missing").is_none());
    }

    #[test]
    fn inverted_tree_lists_every_requirer() {
        let inv = sample().print_inverted_tree("psr/log");
        assert!(inv.starts_with("psr/log 3.0.0\n"));
        assert!(inv.contains("├── acme/http 1.2.0 (requires ^3.0)"));
        assert!(inv.contains("└── monolog/monolog 3.5.0 (requires ^2.0 || ^3.0)"));
        assert!(inv.contains("acme/app (requires ^3.0)"));
    }

    #[test]
    fn full_inverted_tree_lists_direct_dependents() {
        let g = sample();
        let full = g.print_full_inverted_tree();
        assert!(full.contains("psr/log 3.0.0\n├── acme/http 1.2.0 (^3.0)\n└── monolog/monolog 3.5.0 (^2.0 || ^3.0)\n"));
        assert!(full.contains("sebastian/diff 5.1.0\n└── phpunit/phpunit 10.5.0 (^5.0)\n"));
    }
}
