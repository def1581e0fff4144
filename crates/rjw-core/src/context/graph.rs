use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Class,
    Function,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Class => f.write_str("class"),
            ElementKind::Function => f.write_str("function"),
        }
    }
}

/// A class-like or function-like definition found by static analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeElement {
    pub name: String,
    pub kind: ElementKind,
    /// Project-relative file path.
    pub location: String,
    pub line_start: usize,
    pub line_end: usize,
    pub signature: String,
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
}

impl CodeElement {
    pub fn node_id(&self) -> String {
        format!("{}::{}", self.location, self.name)
    }
}

// ---------------------------------------------------------------------------
// Edge resolution
// ---------------------------------------------------------------------------

/// Decides whether a declared dependency name refers to a graph node.
pub trait EdgeResolver: fmt::Debug {
    fn resolves(&self, dependency: &str, node_id: &str) -> bool;
}

/// Matches when the dependency name occurs anywhere in the node key. Cheap and
/// approximate: a dependency named `id` links to every key containing `id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringResolver;

impl EdgeResolver for SubstringResolver {
    fn resolves(&self, dependency: &str, node_id: &str) -> bool {
        node_id.contains(dependency)
    }
}

/// Matches only the element whose name equals the dependency.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactNameResolver;

impl EdgeResolver for ExactNameResolver {
    fn resolves(&self, dependency: &str, node_id: &str) -> bool {
        node_id
            .rsplit_once("::")
            .is_some_and(|(_, name)| name == dependency)
    }
}

/// The built-in resolvers, as stored in a session snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverKind {
    #[default]
    Substring,
    ExactName,
}

impl EdgeResolver for ResolverKind {
    fn resolves(&self, dependency: &str, node_id: &str) -> bool {
        match self {
            ResolverKind::Substring => SubstringResolver.resolves(dependency, node_id),
            ResolverKind::ExactName => ExactNameResolver.resolves(dependency, node_id),
        }
    }
}

// ---------------------------------------------------------------------------
// Discovery seam
// ---------------------------------------------------------------------------

pub trait CodeDiscovery {
    /// Elements related to `target` by name or declared dependency, expanded
    /// through the dependency edges up to `depth` levels.
    fn find_related(&self, target: &str, depth: usize) -> Vec<CodeElement>;

    fn dependencies(&self, node_id: &str, depth: usize) -> BTreeSet<String>;
}

// ---------------------------------------------------------------------------
// DependencyGraph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
    nodes: BTreeMap<String, CodeElement>,
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, element: CodeElement) -> String {
        let id = element.node_id();
        self.edges.entry(id.clone()).or_default();
        self.nodes.insert(id.clone(), element);
        id
    }

    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.edges
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
    }

    /// Link `node_id` to every other node one of its dependencies resolves to.
    pub fn link_dependencies(&mut self, node_id: &str, resolver: &dyn EdgeResolver) -> usize {
        let Some(element) = self.nodes.get(node_id) else {
            return 0;
        };
        let targets: Vec<String> = self
            .nodes
            .keys()
            .filter(|key| key.as_str() != node_id)
            .filter(|key| element.dependencies.iter().any(|d| resolver.resolves(d, key)))
            .cloned()
            .collect();
        for target in &targets {
            self.add_edge(node_id, target);
        }
        targets.len()
    }

    /// Nodes reachable from `node_id` in at most `depth` hops.
    pub fn get_dependencies(&self, node_id: &str, depth: usize) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        let mut frontier = vec![node_id.to_string()];
        for _ in 0..depth {
            let mut next = Vec::new();
            for id in &frontier {
                for dep in self.edges.get(id).into_iter().flatten() {
                    if found.insert(dep.clone()) {
                        next.push(dep.clone());
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        found
    }

    /// Node ids whose element name contains `target` or that declare `target`
    /// as a dependency. Case-sensitive.
    pub fn find_related(&self, target: &str) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|(_, e)| e.name.contains(target) || e.dependencies.contains(target))
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn node(&self, id: &str) -> Option<&CodeElement> {
        self.nodes.get(id)
    }

    pub fn elements(&self) -> impl Iterator<Item = &CodeElement> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl CodeDiscovery for DependencyGraph {
    fn find_related(&self, target: &str, depth: usize) -> Vec<CodeElement> {
        let direct = DependencyGraph::find_related(self, target);
        let mut ids: BTreeSet<String> = direct.iter().cloned().collect();
        for id in &direct {
            ids.extend(self.get_dependencies(id, depth));
        }
        ids.iter()
            .filter_map(|id| self.nodes.get(id))
            .cloned()
            .collect()
    }

    fn dependencies(&self, node_id: &str, depth: usize) -> BTreeSet<String> {
        self.get_dependencies(node_id, depth)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn element(location: &str, name: &str, kind: ElementKind, deps: &[&str]) -> CodeElement {
        CodeElement {
            name: name.to_string(),
            kind,
            location: location.to_string(),
            line_start: 1,
            line_end: 1,
            signature: match kind {
                ElementKind::Class => format!("class {name}"),
                ElementKind::Function => format!("def {name}()"),
            },
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            docstring: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::element;
    use super::*;

    fn graph(resolver: &dyn EdgeResolver) -> DependencyGraph {
        let mut g = DependencyGraph::new();
        let ids: Vec<String> = [
            element("auth/session.py", "SessionStore", ElementKind::Class, &[]),
            element("auth/login.py", "login", ElementKind::Function, &["SessionStore", "hash_password"]),
            element("auth/crypto.py", "hash_password", ElementKind::Function, &[]),
            element("api/routes.py", "login_route", ElementKind::Function, &["login"]),
        ]
        .into_iter()
        .map(|e| g.add_node(e))
        .collect();
        for id in &ids {
            g.link_dependencies(id, resolver);
        }
        g
    }

    #[test]
    fn node_ids_join_file_and_name() {
        let e = element("a/b.py", "f", ElementKind::Function, &[]);
        assert_eq!(e.node_id(), "a/b.py::f");
    }

    #[test]
    fn dependencies_respect_depth() {
        let g = graph(&SubstringResolver);
        let one = g.get_dependencies("api/routes.py::login_route", 1);
        assert!(one.contains("auth/login.py::login"));
        assert!(!one.contains("auth/crypto.py::hash_password"));

        let two = g.get_dependencies("api/routes.py::login_route", 2);
        assert!(two.contains("auth/crypto.py::hash_password"));
        assert!(two.contains("auth/session.py::SessionStore"));
        assert!(g.get_dependencies("api/routes.py::login_route", 0).is_empty());
    }

    #[test]
    fn self_edges_are_skipped() {
        // "login" is a substring of login_route's own key.
        let g = graph(&SubstringResolver);
        let deps = g.get_dependencies("api/routes.py::login_route", 1);
        assert!(deps.contains("auth/login.py::login"));
        assert!(!deps.contains("api/routes.py::login_route"));
    }

    #[test]
    fn exact_resolver_links_by_name_only() {
        let mut g = DependencyGraph::new();
        let a = g.add_node(element("x.py", "id", ElementKind::Function, &[]));
        let b = g.add_node(element("y.py", "user_id", ElementKind::Function, &[]));
        let c = g.add_node(element("z.py", "caller", ElementKind::Function, &["id"]));
        assert_eq!(g.link_dependencies(&c, &ExactNameResolver), 1);
        let deps = g.get_dependencies(&c, 1);
        assert!(deps.contains(&a));
        assert!(!deps.contains(&b));

        let mut loose = g.clone();
        assert_eq!(loose.link_dependencies(&c, &SubstringResolver), 2);
    }

    #[test]
    fn find_related_matches_name_or_dependency() {
        let g = graph(&SubstringResolver);
        let related = g.find_related("SessionStore");
        assert_eq!(
            related,
            vec!["auth/login.py::login".to_string(), "auth/session.py::SessionStore".to_string()]
        );
        assert!(g.find_related("sessionstore").is_empty());
    }

    #[test]
    fn discovery_expands_through_edges() {
        let g = graph(&SubstringResolver);
        let names: Vec<String> = CodeDiscovery::find_related(&g, "login_route", 1)
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert!(names.contains(&"login_route".to_string()));
        assert!(names.contains(&"login".to_string()));
    }
}
