//! Dependency graphs.
//!
//! [`DependencyGraph`] holds the products of every resolved third-party
//! package. [`UnifiedGraph`] is the result of merging it with the targets of
//! the workspace's own projects. Both are directed and acyclic; an edge
//! `a -> b` means "a requires b".

pub mod generator;
pub mod merge;

pub use generator::GraphGenerator;
pub use merge::merge;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use semver::Version;
use serde::Serialize;
use thiserror::Error;

use crate::core::platform::{OsVersion, Platform};
use crate::core::product::ProductType;
use crate::core::target::{Target, TargetReference};
use crate::resolver::ResolverFailure;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Errors building or merging dependency graphs.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum GraphError {
    #[error("`{package}` depends on unknown product `{product}`")]
    #[diagnostic(
        code(quay::graph::unresolved_product),
        help("Declare the package that provides `{product}` in Quay.toml")
    )]
    UnresolvedProductReference { package: String, product: String },

    #[error("product `{product}` is exported by more than one package")]
    #[diagnostic(code(quay::graph::ambiguous_product))]
    AmbiguousProductReference {
        product: String,
        packages: Vec<String>,
    },

    #[error("conflicting product types for `{product}`: {first} and {second}")]
    #[diagnostic(
        code(quay::graph::conflicting_product_type),
        help("Declare the same product type for `{product}` in every project")
    )]
    ConflictingProductType {
        product: String,
        first: ProductType,
        second: ProductType,
    },

    #[error("target `{target}` is declared more than once")]
    #[diagnostic(code(quay::graph::duplicate_target))]
    DuplicateTargetReference { target: TargetReference },

    #[error("`{from}` depends on unknown target `{target}`")]
    #[diagnostic(code(quay::graph::unresolved_target))]
    UnresolvedTargetReference { from: String, target: TargetReference },

    #[error("dependency cycle detected: {}", .path.join(" -> "))]
    #[diagnostic(code(quay::graph::cycle))]
    CycleDetected { path: Vec<String> },

    #[error("invalid workspace state {}: {message}", .path.display())]
    #[diagnostic(code(quay::graph::invalid_workspace_state))]
    InvalidWorkspaceState { path: PathBuf, message: String },

    #[error("invalid package description for `{package}`: {message}")]
    #[diagnostic(code(quay::graph::invalid_package_info))]
    InvalidPackageInfo { package: String, message: String },

    #[error(transparent)]
    #[diagnostic(code(quay::graph::resolver))]
    Resolver(#[from] ResolverFailure),
}

impl GraphError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            GraphError::UnresolvedProductReference { package, product } => {
                Diagnostic::error(self.to_string())
                    .with_context(format!("no included package exports `{}`", product))
                    .with_suggestion(format!(
                        "Declare the package that provides `{}` as a dependency of `{}`",
                        product, package
                    ))
                    .with_suggestion(
                        "Check that the package supports the workspace platforms",
                    )
                    .with_suggestion(suggestions::PRODUCT_NOT_FOUND)
            }

            GraphError::AmbiguousProductReference { product, packages } => {
                let mut diag = Diagnostic::error(self.to_string());
                for package in packages {
                    diag = diag.with_context(format!("`{}` exports `{}`", package, product));
                }
                diag.with_suggestion("Remove one of the packages from Quay.toml")
            }

            GraphError::ConflictingProductType {
                product,
                first,
                second,
            } => Diagnostic::error(format!("conflicting product types for `{}`", product))
                .with_context(format!("one project declares {}", first))
                .with_context(format!("another project declares {}", second))
                .with_suggestion(format!(
                    "Declare the same product type for `{}` in every project",
                    product
                )),

            GraphError::DuplicateTargetReference { target } => Diagnostic::error(self.to_string())
                .with_context(format!("project: {}", target.project_path.display()))
                .with_suggestion("Rename one of the targets"),

            GraphError::UnresolvedTargetReference { from, target } => {
                Diagnostic::error(self.to_string())
                    .with_context(format!("referenced from `{}`", from))
                    .with_suggestion(format!(
                        "Check that `{}` declares a target named `{}`",
                        target.project_path.display(),
                        target.name
                    ))
            }

            GraphError::CycleDetected { path } => {
                Diagnostic::error("dependency cycle detected")
                    .with_context(format!("cycle: {}", path.join(" -> ")))
                    .with_suggestion(
                        "Break the cycle by removing or restructuring dependencies",
                    )
            }

            GraphError::InvalidWorkspaceState { path, message } => {
                Diagnostic::error("the package manager left an unreadable workspace state")
                    .with_location(path)
                    .with_context(message.clone())
                    .with_suggestion(suggestions::REINSTALL)
            }

            GraphError::InvalidPackageInfo { package, message } => {
                Diagnostic::error(format!("could not read package `{}`", package))
                    .with_context(message.clone())
                    .with_suggestion(suggestions::REINSTALL)
            }

            GraphError::Resolver(failure) => failure.to_diagnostic(),
        }
    }
}

/// A third-party package as resolved by the package manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPackage {
    /// Package identity
    pub identity: String,

    /// Package name from its manifest
    pub name: String,

    /// Resolved version, branch or revision, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Checkout directory
    pub path: PathBuf,

    /// Names of the products the graph includes
    pub products: Vec<String>,

    /// Supported platforms
    pub platforms: BTreeSet<Platform>,

    /// Effective deployment target per platform
    pub deployment_targets: BTreeMap<Platform, OsVersion>,
}

/// A product exported by a resolved package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalProduct {
    pub name: String,

    /// Identity of the exporting package
    pub package: String,

    pub product_type: ProductType,

    pub platforms: BTreeSet<Platform>,

    pub deployment_targets: BTreeMap<Platform, OsVersion>,
}

/// The graph of third-party products.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<ExternalProduct, ()>,
    product_to_node: HashMap<String, NodeIndex>,
    packages: BTreeMap<String, ResolvedPackage>,
    tools_version: Option<Version>,
}

impl DependencyGraph {
    pub fn new(tools_version: Option<Version>) -> Self {
        DependencyGraph {
            tools_version,
            ..Default::default()
        }
    }

    /// Record a resolved package.
    pub fn add_package(&mut self, package: ResolvedPackage) {
        self.packages.insert(package.identity.clone(), package);
    }

    /// Add a product node. Product names are unique across packages.
    pub fn add_product(&mut self, product: ExternalProduct) -> Result<NodeIndex, GraphError> {
        if let Some(&existing) = self.product_to_node.get(&product.name) {
            let mut packages = vec![self.graph[existing].package.clone(), product.package];
            packages.sort();
            return Err(GraphError::AmbiguousProductReference {
                product: product.name,
                packages,
            });
        }

        let name = product.name.clone();
        let node = self.graph.add_node(product);
        self.product_to_node.insert(name, node);
        Ok(node)
    }

    /// Add a "from requires to" edge between two existing products.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        if let (Some(&a), Some(&b)) = (self.product_to_node.get(from), self.product_to_node.get(to)) {
            if !self.graph.contains_edge(a, b) {
                self.graph.add_edge(a, b, ());
            }
        }
    }

    pub fn product(&self, name: &str) -> Option<&ExternalProduct> {
        self.product_to_node.get(name).map(|&n| &self.graph[n])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.product_to_node.contains_key(name)
    }

    /// Products sorted by (package, name).
    pub fn products(&self) -> Vec<&ExternalProduct> {
        let mut products: Vec<_> = self.graph.node_weights().collect();
        products.sort_by(|a, b| a.package.cmp(&b.package).then(a.name.cmp(&b.name)));
        products
    }

    /// Resolved packages sorted by identity.
    pub fn packages(&self) -> impl Iterator<Item = &ResolvedPackage> {
        self.packages.values()
    }

    pub fn package(&self, identity: &str) -> Option<&ResolvedPackage> {
        self.packages.get(identity)
    }

    /// Direct dependencies of a product, sorted by name.
    pub fn dependencies(&self, name: &str) -> Vec<&ExternalProduct> {
        let Some(&node) = self.product_to_node.get(name) else {
            return Vec::new();
        };
        let mut deps: Vec<_> = self.graph.neighbors(node).map(|n| &self.graph[n]).collect();
        deps.sort_by(|a, b| a.name.cmp(&b.name));
        deps
    }

    pub fn tools_version(&self) -> Option<&Version> {
        self.tools_version.as_ref()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Fail with the offending path if the graph has a cycle.
    pub fn check_acyclic(&self) -> Result<(), GraphError> {
        check_acyclic(&self.graph, |p| p.name.clone())
    }

    /// Serializable view with sorted packages, products and edges.
    pub fn summary(&self) -> DependencyGraphSummary<'_> {
        DependencyGraphSummary {
            tools_version: self.tools_version.as_ref().map(ToString::to_string),
            packages: self.packages().collect(),
            products: self
                .products()
                .into_iter()
                .map(|p| ProductSummary {
                    product: p,
                    dependencies: self
                        .dependencies(&p.name)
                        .into_iter()
                        .map(|d| d.name.clone())
                        .collect(),
                })
                .collect(),
        }
    }
}

/// A workspace target placed in the unified graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappedTarget {
    pub reference: TargetReference,

    #[serde(flatten)]
    pub target: Target,
}

impl MappedTarget {
    pub fn platform(&self) -> Platform {
        self.target.platform
    }

    pub fn product(&self) -> ProductType {
        self.target.product
    }
}

/// Key identifying a node of the unified graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKey {
    Product(String),
    Target(TargetReference),
}

impl std::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKey::Product(name) => write!(f, "product:{}", name),
            NodeKey::Target(reference) => write!(f, "target:{}", reference),
        }
    }
}

/// A node of the unified graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphNode {
    Product(ExternalProduct),
    Target(MappedTarget),
}

impl GraphNode {
    pub fn key(&self) -> NodeKey {
        match self {
            GraphNode::Product(p) => NodeKey::Product(p.name.clone()),
            GraphNode::Target(t) => NodeKey::Target(t.reference.clone()),
        }
    }
}

/// Third-party products and workspace targets in one graph.
#[derive(Debug, Clone, Default)]
pub struct UnifiedGraph {
    graph: DiGraph<GraphNode, ()>,
    nodes: HashMap<NodeKey, NodeIndex>,
    tools_version: Option<Version>,
}

impl UnifiedGraph {
    pub fn new(tools_version: Option<Version>) -> Self {
        UnifiedGraph {
            tools_version,
            ..Default::default()
        }
    }

    /// Add a node. Returns `None` if a node with the same key exists.
    pub fn add_node(&mut self, node: GraphNode) -> Option<NodeIndex> {
        let key = node.key();
        if self.nodes.contains_key(&key) {
            return None;
        }
        let index = self.graph.add_node(node);
        self.nodes.insert(key, index);
        Some(index)
    }

    /// Add a "from requires to" edge between existing nodes.
    pub fn add_edge(&mut self, from: &NodeKey, to: &NodeKey) -> bool {
        match (self.nodes.get(from), self.nodes.get(to)) {
            (Some(&a), Some(&b)) => {
                if !self.graph.contains_edge(a, b) {
                    self.graph.add_edge(a, b, ());
                }
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn node(&self, key: &NodeKey) -> Option<&GraphNode> {
        self.nodes.get(key).map(|&n| &self.graph[n])
    }

    pub fn target(&self, reference: &TargetReference) -> Option<&MappedTarget> {
        match self.node(&NodeKey::Target(reference.clone()))? {
            GraphNode::Target(t) => Some(t),
            GraphNode::Product(_) => None,
        }
    }

    pub fn product(&self, name: &str) -> Option<&ExternalProduct> {
        match self.node(&NodeKey::Product(name.to_string()))? {
            GraphNode::Product(p) => Some(p),
            GraphNode::Target(_) => None,
        }
    }

    /// Targets sorted by (project path, name).
    pub fn targets(&self) -> Vec<&MappedTarget> {
        let mut targets: Vec<_> = self
            .graph
            .node_weights()
            .filter_map(|n| match n {
                GraphNode::Target(t) => Some(t),
                GraphNode::Product(_) => None,
            })
            .collect();
        targets.sort_by(|a, b| a.reference.cmp(&b.reference));
        targets
    }

    /// Products sorted by (package, name).
    pub fn products(&self) -> Vec<&ExternalProduct> {
        let mut products: Vec<_> = self
            .graph
            .node_weights()
            .filter_map(|n| match n {
                GraphNode::Product(p) => Some(p),
                GraphNode::Target(_) => None,
            })
            .collect();
        products.sort_by(|a, b| a.package.cmp(&b.package).then(a.name.cmp(&b.name)));
        products
    }

    /// Direct dependencies of a node, sorted.
    pub fn dependencies(&self, key: &NodeKey) -> Vec<NodeKey> {
        let Some(&node) = self.nodes.get(key) else {
            return Vec::new();
        };
        let mut deps: Vec<_> = self.graph.neighbors(node).map(|n| self.graph[n].key()).collect();
        deps.sort();
        deps
    }

    /// Every third-party product a target links, directly or through other
    /// targets and products. Sorted by (package, name).
    pub fn transitive_products(&self, reference: &TargetReference) -> Vec<&ExternalProduct> {
        let Some(&start) = self.nodes.get(&NodeKey::Target(reference.clone())) else {
            return Vec::new();
        };

        let mut visited = HashSet::new();
        let mut stack = vec![start];
        let mut products = Vec::new();

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let GraphNode::Product(p) = &self.graph[current] {
                products.push(p);
            }
            stack.extend(self.graph.neighbors(current));
        }

        products.sort_by(|a, b| a.package.cmp(&b.package).then(a.name.cmp(&b.name)));
        products
    }

    pub fn tools_version(&self) -> Option<&Version> {
        self.tools_version.as_ref()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Fail with the offending path if the graph has a cycle.
    pub fn check_acyclic(&self) -> Result<(), GraphError> {
        check_acyclic(&self.graph, |n| n.key().to_string())
    }

    /// Serializable view with sorted products, targets and edges.
    pub fn summary(&self) -> UnifiedGraphSummary<'_> {
        let deps = |key: NodeKey| -> Vec<String> {
            self.dependencies(&key).iter().map(ToString::to_string).collect()
        };

        UnifiedGraphSummary {
            tools_version: self.tools_version.as_ref().map(ToString::to_string),
            products: self
                .products()
                .into_iter()
                .map(|p| ProductSummary {
                    product: p,
                    dependencies: deps(NodeKey::Product(p.name.clone())),
                })
                .collect(),
            targets: self
                .targets()
                .into_iter()
                .map(|t| TargetSummary {
                    reference: t.reference.to_string(),
                    name: &t.target.name,
                    platform: t.platform(),
                    product: t.product(),
                    dependencies: deps(NodeKey::Target(t.reference.clone())),
                })
                .collect(),
        }
    }
}

/// JSON view of a [`DependencyGraph`].
#[derive(Debug, Serialize)]
pub struct DependencyGraphSummary<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools_version: Option<String>,
    pub packages: Vec<&'a ResolvedPackage>,
    pub products: Vec<ProductSummary<'a>>,
}

/// JSON view of a [`UnifiedGraph`].
#[derive(Debug, Serialize)]
pub struct UnifiedGraphSummary<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools_version: Option<String>,
    pub products: Vec<ProductSummary<'a>>,
    pub targets: Vec<TargetSummary<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ProductSummary<'a> {
    #[serde(flatten)]
    pub product: &'a ExternalProduct,
    pub dependencies: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TargetSummary<'a> {
    pub reference: String,
    pub name: &'a str,
    pub platform: Platform,
    pub product: ProductType,
    pub dependencies: Vec<String>,
}

fn check_acyclic<N>(graph: &DiGraph<N, ()>, label: impl Fn(&N) -> String) -> Result<(), GraphError> {
    match toposort(graph, None) {
        Ok(_) => Ok(()),
        Err(cycle) => Err(GraphError::CycleDetected {
            path: cycle_path(graph, cycle.node_id())
                .into_iter()
                .map(|n| label(&graph[n]))
                .collect(),
        }),
    }
}

/// Shortest path from `start` back to itself, both ends included.
fn cycle_path<N>(graph: &DiGraph<N, ()>, start: NodeIndex) -> Vec<NodeIndex> {
    let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue = VecDeque::from([start]);

    while let Some(node) = queue.pop_front() {
        for next in graph.neighbors(node) {
            if next == start {
                let mut path = vec![node];
                let mut current = node;
                while current != start {
                    match parent.get(&current) {
                        Some(&p) => {
                            path.push(p);
                            current = p;
                        }
                        None => break,
                    }
                }
                path.reverse();
                path.push(start);
                return path;
            }
            if next != start && !parent.contains_key(&next) {
                parent.insert(next, node);
                queue.push_back(next);
            }
        }
    }

    vec![start]
}
