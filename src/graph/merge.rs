//! Merge third-party products with the workspace's own targets.

use std::collections::BTreeMap;

use crate::core::product::ProductType;
use crate::core::project::Project;
use crate::core::target::{TargetDependency, TargetReference};
use crate::graph::{DependencyGraph, GraphError, GraphNode, MappedTarget, NodeKey, UnifiedGraph};

/// Merge `external` with the targets of `projects`.
///
/// Product type overrides declared by projects are applied to the external
/// products; two projects that disagree on a product's type are an error.
/// The result contains every external product and every target, and is
/// guaranteed acyclic.
pub fn merge(external: &DependencyGraph, projects: &[Project]) -> Result<UnifiedGraph, GraphError> {
    let overrides = collect_overrides(projects)?;
    let mut graph = UnifiedGraph::new(external.tools_version().cloned());

    for product in external.products() {
        let mut product = product.clone();
        if let Some(&ty) = overrides.get(&product.name) {
            product.product_type = ty;
        }
        graph.add_node(GraphNode::Product(product));
    }

    for product in external.products() {
        let from = NodeKey::Product(product.name.clone());
        for dependency in external.dependencies(&product.name) {
            graph.add_edge(&from, &NodeKey::Product(dependency.name.clone()));
        }
    }

    for name in overrides.keys() {
        if !external.contains(name) {
            tracing::warn!("product type override for `{}` matches no dependency product", name);
        }
    }

    for project in projects {
        for target in &project.targets {
            let reference = target.reference(&project.path);
            let node = GraphNode::Target(MappedTarget {
                reference: reference.clone(),
                target: target.clone(),
            });
            if graph.add_node(node).is_none() {
                return Err(GraphError::DuplicateTargetReference { target: reference });
            }
        }
    }

    for project in projects {
        for target in &project.targets {
            let reference = target.reference(&project.path);
            let from = NodeKey::Target(reference.clone());

            for dependency in &target.dependencies {
                let to = match dependency {
                    TargetDependency::Target { target: name } => {
                        NodeKey::Target(TargetReference::new(&project.path, name))
                    }
                    TargetDependency::Project { project: path, target: name } => {
                        NodeKey::Target(TargetReference::new(path, name))
                    }
                    TargetDependency::External { external } => NodeKey::Product(external.clone()),
                };

                if graph.contains(&to) {
                    graph.add_edge(&from, &to);
                    continue;
                }

                return Err(match to {
                    NodeKey::Target(target) => GraphError::UnresolvedTargetReference {
                        from: reference.to_string(),
                        target,
                    },
                    NodeKey::Product(product) => GraphError::UnresolvedProductReference {
                        package: reference.to_string(),
                        product,
                    },
                });
            }
        }
    }

    graph.check_acyclic()?;

    tracing::debug!(
        "unified graph: {} products, {} targets",
        graph.products().len(),
        graph.targets().len()
    );

    Ok(graph)
}

/// Product type overrides across all projects.
fn collect_overrides(projects: &[Project]) -> Result<BTreeMap<String, ProductType>, GraphError> {
    let mut overrides: BTreeMap<String, ProductType> = BTreeMap::new();

    for project in projects {
        for (product, &ty) in &project.product_type_overrides {
            match overrides.get(product) {
                Some(&first) if first != ty => {
                    return Err(GraphError::ConflictingProductType {
                        product: product.clone(),
                        first,
                        second: ty,
                    });
                }
                Some(_) => {}
                None => {
                    overrides.insert(product.clone(), ty);
                }
            }
        }
    }

    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    use crate::core::platform::Platform;
    use crate::core::target::Target;
    use crate::graph::ExternalProduct;
    use crate::test_support::{app_target, project};

    fn external() -> DependencyGraph {
        let mut graph = DependencyGraph::new(None);
        for (package, name) in [("alamofire", "Alamofire"), ("swift-log", "Logging")] {
            graph
                .add_product(ExternalProduct {
                    name: name.to_string(),
                    package: package.to_string(),
                    product_type: ProductType::StaticFramework,
                    platforms: BTreeSet::from([Platform::Ios]),
                    deployment_targets: BTreeMap::new(),
                })
                .unwrap();
        }
        graph.add_edge("Alamofire", "Logging");
        graph
    }

    #[test]
    fn test_merge_links_targets_and_products() {
        let app = Project::new("/work/App", "App")
            .with_target(app_target("App", Platform::Ios, &["Alamofire"]).with_dependency(
                TargetDependency::project("/work/Kit", "Kit"),
            ))
            .with_target(
                Target::new("AppTests", Platform::Ios, ProductType::UnitTests)
                    .with_dependency(TargetDependency::target("App")),
            );
        let kit = project("/work/Kit", &[("Kit", Platform::Ios, ProductType::Framework)]);

        let graph = merge(&external(), &[app, kit]).unwrap();

        let targets: Vec<_> = graph.targets().iter().map(|t| t.reference.to_string()).collect();
        assert_eq!(
            targets,
            vec!["/work/App:App", "/work/App:AppTests", "/work/Kit:Kit"]
        );

        let app_ref = TargetReference::new("/work/App", "App");
        assert_eq!(
            graph.dependencies(&NodeKey::Target(app_ref.clone())),
            vec![
                NodeKey::Product("Alamofire".into()),
                NodeKey::Target(TargetReference::new("/work/Kit", "Kit")),
            ]
        );

        let transitive: Vec<_> = graph
            .transitive_products(&TargetReference::new("/work/App", "AppTests"))
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(transitive, vec!["Alamofire", "Logging"]);
    }

    #[test]
    fn test_consistent_overrides_are_applied() {
        let app = Project::new("/work/App", "App").with_product_type("Alamofire", ProductType::Framework);
        let kit = Project::new("/work/Kit", "Kit").with_product_type("Alamofire", ProductType::Framework);

        let graph = merge(&external(), &[app, kit]).unwrap();
        assert_eq!(
            graph.product("Alamofire").unwrap().product_type,
            ProductType::Framework
        );
        assert_eq!(
            graph.product("Logging").unwrap().product_type,
            ProductType::StaticFramework
        );
    }

    #[test]
    fn test_conflicting_overrides() {
        let app = Project::new("/work/App", "App").with_product_type("Alamofire", ProductType::Framework);
        let kit = Project::new("/work/Kit", "Kit")
            .with_product_type("Alamofire", ProductType::StaticFramework);

        match merge(&external(), &[app, kit]).unwrap_err() {
            GraphError::ConflictingProductType {
                product,
                first,
                second,
            } => {
                assert_eq!(product, "Alamofire");
                assert_eq!(first, ProductType::Framework);
                assert_eq!(second, ProductType::StaticFramework);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_target() {
        let a = project("/work/App", &[("App", Platform::Ios, ProductType::App)]);
        let b = project("/work/App", &[("App", Platform::Macos, ProductType::App)]);

        assert!(matches!(
            merge(&external(), &[a, b]).unwrap_err(),
            GraphError::DuplicateTargetReference { ref target } if target.name == "App"
        ));
    }

    #[test]
    fn test_unresolved_references() {
        let app = Project::new("/work/App", "App")
            .with_target(Target::new("App", Platform::Ios, ProductType::App).with_dependency(
                TargetDependency::project("/work/Missing", "Missing"),
            ));
        assert!(matches!(
            merge(&external(), &[app]).unwrap_err(),
            GraphError::UnresolvedTargetReference { .. }
        ));

        let app = Project::new("/work/App", "App")
            .with_target(app_target("App", Platform::Ios, &["Kingfisher"]));
        match merge(&external(), &[app]).unwrap_err() {
            GraphError::UnresolvedProductReference { package, product } => {
                assert_eq!(package, "/work/App:App");
                assert_eq!(product, "Kingfisher");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_target_cycle() {
        let app = Project::new("/work/App", "App")
            .with_target(
                Target::new("A", Platform::Ios, ProductType::Framework)
                    .with_dependency(TargetDependency::target("B")),
            )
            .with_target(
                Target::new("B", Platform::Ios, ProductType::Framework)
                    .with_dependency(TargetDependency::target("A")),
            );

        assert!(matches!(
            merge(&external(), &[app]).unwrap_err(),
            GraphError::CycleDetected { .. }
        ));
    }

    #[test]
    fn test_merge_is_deterministic() {
        let build = || {
            let app = Project::new("/work/App", "App")
                .with_target(app_target("App", Platform::Ios, &["Logging", "Alamofire"]));
            let graph = merge(&external(), &[app]).unwrap();
            serde_json::to_string(&graph.summary()).unwrap()
        };
        assert_eq!(build(), build());
    }
}
