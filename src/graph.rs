// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Dependency Graph
//!
//! Collects the creation-order edges of a [`Stack`] and checks them.
//!
//! # Edge Kinds
//!
//! - **Reference**: implicit from data use (`Ref` / `Fn::GetAtt`). The
//!   engine infers these from the template on its own.
//! - **Explicit**: a declared `DependsOn`. Required wherever a resource
//!   names another one only through a literal physical name, because the
//!   engine cannot see that edge in the data.
//!
//! # Ordering Rule
//!
//! A resource is never scheduled before every resource it depends on.
//! [`DependencyGraph::waves`] groups resources into layers whose members
//! are mutually independent; layer `n` only depends on layers `< n`.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::domain::LogicalId;
use crate::errors::{StackError, StackResult};
use crate::stack::Stack;

/// How an edge was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Reference,
    Explicit,
}

/// `from` must be created after `to`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Edge {
    pub from: LogicalId,
    pub to: LogicalId,
    pub kind: EdgeKind,
}

/// Validated, acyclic dependency graph of a stack
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    edges: BTreeSet<Edge>,
    dependencies: BTreeMap<LogicalId, BTreeSet<LogicalId>>,
    dependents: BTreeMap<LogicalId, BTreeSet<LogicalId>>,
    waves: Vec<Vec<LogicalId>>,
}

impl DependencyGraph {
    /// Build and validate the graph
    ///
    /// # Errors
    /// - [`StackError::UnknownReference`] for a reference to an undeclared id
    /// - [`StackError::SelfDependency`] for a resource depending on itself
    /// - [`StackError::MissingExplicitDependency`] for a name reference
    ///   without a matching `DependsOn`
    /// - [`StackError::DependencyCycle`] if the graph is not acyclic
    pub fn build(stack: &Stack) -> StackResult<Self> {
        let mut edges = BTreeSet::new();
        let mut dependencies: BTreeMap<LogicalId, BTreeSet<LogicalId>> = BTreeMap::new();
        let mut dependents: BTreeMap<LogicalId, BTreeSet<LogicalId>> = BTreeMap::new();

        for resource in stack.resources() {
            let from = resource.logical_id();
            dependencies.entry(from.clone()).or_default();
            dependents.entry(from.clone()).or_default();

            let references = resource
                .references()
                .into_iter()
                .map(|to| (to, EdgeKind::Reference));
            let explicit = resource
                .depends_on()
                .iter()
                .cloned()
                .map(|to| (to, EdgeKind::Explicit));

            for (to, kind) in references.chain(explicit) {
                if &to == from {
                    return Err(StackError::SelfDependency(from.clone()));
                }
                if stack.resource(&to).is_none() {
                    // Parameters are resolved by the engine before any resource
                    if kind == EdgeKind::Reference && stack.has_parameter(&to) {
                        continue;
                    }
                    return Err(StackError::UnknownReference {
                        from: from.clone(),
                        to,
                    });
                }
                dependencies
                    .entry(from.clone())
                    .or_default()
                    .insert(to.clone());
                dependents
                    .entry(to.clone())
                    .or_default()
                    .insert(from.clone());
                edges.insert(Edge {
                    from: from.clone(),
                    to,
                    kind,
                });
            }

            for target in resource.name_references() {
                if stack.resource(&target).is_none() {
                    return Err(StackError::UnknownReference {
                        from: from.clone(),
                        to: target,
                    });
                }
                if !resource.depends_on().contains(&target) {
                    return Err(StackError::MissingExplicitDependency {
                        from: from.clone(),
                        to: target,
                    });
                }
            }
        }

        for (output, declared) in stack.outputs() {
            for to in declared.value.references() {
                if stack.resource(&to).is_none() && !stack.has_parameter(&to) {
                    return Err(StackError::UnknownReference {
                        from: output.clone(),
                        to,
                    });
                }
            }
        }

        let waves = layer(&dependencies)?;
        debug!(
            "Dependency graph: {} resources, {} edges, {} waves",
            dependencies.len(),
            edges.len(),
            waves.len()
        );

        Ok(Self {
            edges,
            dependencies,
            dependents,
            waves,
        })
    }

    /// All edges, ordered by `(from, to, kind)`
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Whether `from` has an edge of any kind to `to`
    pub fn has_edge(&self, from: &LogicalId, to: &LogicalId) -> bool {
        self.dependencies
            .get(from)
            .is_some_and(|deps| deps.contains(to))
    }

    /// Whether `from` has an edge of the given kind to `to`
    pub fn has_edge_of_kind(&self, from: &LogicalId, to: &LogicalId, kind: EdgeKind) -> bool {
        self.edges.contains(&Edge {
            from: from.clone(),
            to: to.clone(),
            kind,
        })
    }

    /// Direct dependencies of a resource
    pub fn dependencies_of(&self, id: &LogicalId) -> Option<&BTreeSet<LogicalId>> {
        self.dependencies.get(id)
    }

    /// Resources that directly depend on `id`
    pub fn dependents_of(&self, id: &LogicalId) -> Option<&BTreeSet<LogicalId>> {
        self.dependents.get(id)
    }

    /// Layers of mutually independent resources in creation order
    pub fn waves(&self) -> &[Vec<LogicalId>] {
        &self.waves
    }

    /// Deterministic creation order (ties broken by logical id)
    pub fn topological_order(&self) -> Vec<LogicalId> {
        self.waves.iter().flatten().cloned().collect()
    }

    /// Every resource transitively required by `id`
    pub fn transitive_dependencies(&self, id: &LogicalId) -> BTreeSet<LogicalId> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<&LogicalId> = vec![id];
        while let Some(node) = stack.pop() {
            if let Some(deps) = self.dependencies.get(node) {
                for dep in deps {
                    if seen.insert(dep.clone()) {
                        stack.push(dep);
                    }
                }
            }
        }
        seen
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}

/// Kahn layering; leftovers mean a cycle
fn layer(
    dependencies: &BTreeMap<LogicalId, BTreeSet<LogicalId>>,
) -> StackResult<Vec<Vec<LogicalId>>> {
    let mut remaining: BTreeMap<&LogicalId, BTreeSet<&LogicalId>> = dependencies
        .iter()
        .map(|(id, deps)| (id, deps.iter().collect()))
        .collect();
    let mut waves = Vec::new();

    while !remaining.is_empty() {
        let ready: Vec<&LogicalId> = remaining
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(id, _)| *id)
            .collect();

        if ready.is_empty() {
            return Err(StackError::DependencyCycle(find_cycle(&remaining)));
        }

        for id in &ready {
            remaining.remove(id);
        }
        for deps in remaining.values_mut() {
            for id in &ready {
                deps.remove(id);
            }
        }
        waves.push(ready.into_iter().cloned().collect());
    }

    Ok(waves)
}

/// Walk unresolved dependencies until a node repeats
fn find_cycle(remaining: &BTreeMap<&LogicalId, BTreeSet<&LogicalId>>) -> Vec<LogicalId> {
    let Some(start) = remaining.keys().next().copied() else {
        return Vec::new();
    };
    let mut path: Vec<&LogicalId> = vec![start];
    let mut current = start;

    loop {
        // Every node left over from layering has an unresolved dependency
        let Some(next) = remaining
            .get(current)
            .and_then(|deps| deps.iter().next().copied())
        else {
            return path.into_iter().cloned().collect();
        };

        if let Some(pos) = path.iter().position(|id| *id == next) {
            let mut cycle: Vec<LogicalId> = path[pos..].iter().map(|id| (*id).clone()).collect();
            cycle.push(next.clone());
            return cycle;
        }
        path.push(next);
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceType;
    use crate::stack::{Resource, Value};
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).unwrap()
    }

    fn chain_stack() -> Stack {
        let mut stack = Stack::new("test");
        stack
            .add(Resource::new(id("Vpc"), ResourceType::Vpc))
            .unwrap();
        stack
            .add(
                Resource::new(id("SubnetA"), ResourceType::Subnet)
                    .with_property("VpcId", Value::reference(&id("Vpc"))),
            )
            .unwrap();
        stack
            .add(
                Resource::new(id("SubnetB"), ResourceType::Subnet)
                    .with_property("VpcId", Value::reference(&id("Vpc"))),
            )
            .unwrap();
        stack
            .add(
                Resource::new(id("Group"), ResourceType::NeptuneDbSubnetGroup).with_property(
                    "SubnetIds",
                    Value::List(vec![
                        Value::reference(&id("SubnetA")),
                        Value::reference(&id("SubnetB")),
                    ]),
                ),
            )
            .unwrap();
        stack
            .add(
                Resource::new(id("Cluster"), ResourceType::NeptuneDbCluster)
                    .with_property(
                        "DBSubnetGroupName",
                        Value::NameOf {
                            target: id("Group"),
                            name: "mysubnetgroup".into(),
                        },
                    )
                    .with_dependency(&id("Group")),
            )
            .unwrap();
        stack
    }

    #[test]
    fn test_waves_respect_edges() {
        let graph = DependencyGraph::build(&chain_stack()).unwrap();
        assert_eq!(
            graph.waves().to_vec(),
            vec![
                vec![id("Vpc")],
                vec![id("SubnetA"), id("SubnetB")],
                vec![id("Group")],
                vec![id("Cluster")],
            ]
        );

        let order = graph.topological_order();
        for edge in graph.edges() {
            let from = order.iter().position(|i| i == &edge.from).unwrap();
            let to = order.iter().position(|i| i == &edge.to).unwrap();
            assert!(to < from, "{} must precede {}", edge.to, edge.from);
        }
    }

    #[test]
    fn test_edge_kinds() {
        let graph = DependencyGraph::build(&chain_stack()).unwrap();
        assert!(graph.has_edge_of_kind(&id("SubnetA"), &id("Vpc"), EdgeKind::Reference));
        assert!(graph.has_edge_of_kind(&id("Cluster"), &id("Group"), EdgeKind::Explicit));
        assert!(!graph.has_edge_of_kind(&id("Cluster"), &id("Group"), EdgeKind::Reference));
        assert_eq!(
            graph.transitive_dependencies(&id("Cluster")),
            [id("Group"), id("SubnetA"), id("SubnetB"), id("Vpc")]
                .into_iter()
                .collect()
        );
        assert_eq!(
            graph.dependents_of(&id("Vpc")).unwrap().len(),
            2
        );
    }

    #[test]
    fn test_name_reference_requires_explicit_dependency() {
        let mut stack = chain_stack();
        stack
            .add(Resource::new(id("Instance"), ResourceType::NeptuneDbInstance).with_property(
                "DBClusterIdentifier",
                Value::NameOf {
                    target: id("Cluster"),
                    name: "myDbCluster".into(),
                },
            ))
            .unwrap();

        let err = DependencyGraph::build(&stack).unwrap_err();
        assert!(matches!(
            err,
            StackError::MissingExplicitDependency { ref from, ref to }
                if from == &id("Instance") && to == &id("Cluster")
        ));

        stack
            .add_dependency(&id("Instance"), &id("Cluster"))
            .unwrap();
        assert!(DependencyGraph::build(&stack).is_ok());
    }

    #[test]
    fn test_unknown_reference() {
        let mut stack = Stack::new("test");
        stack
            .add(
                Resource::new(id("Subnet"), ResourceType::Subnet)
                    .with_property("VpcId", Value::reference(&id("Vpc"))),
            )
            .unwrap();
        assert!(matches!(
            DependencyGraph::build(&stack),
            Err(StackError::UnknownReference { .. })
        ));
    }

    #[test]
    fn test_cycle_detected() {
        let mut stack = Stack::new("test");
        stack
            .add(
                Resource::new(id("A"), ResourceType::Subnet)
                    .with_property("X", Value::reference(&id("B"))),
            )
            .unwrap();
        stack
            .add(
                Resource::new(id("B"), ResourceType::Subnet)
                    .with_property("X", Value::get_att(&id("A"), "Arn")),
            )
            .unwrap();

        match DependencyGraph::build(&stack) {
            Err(StackError::DependencyCycle(cycle)) => {
                assert_eq!(cycle, vec![id("A"), id("B"), id("A")]);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }
}
