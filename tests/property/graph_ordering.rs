// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Dependency Ordering
//!
//! Generates random acyclic stacks whose resources link to earlier ones
//! through every kind of dependency the declaration supports, and checks
//! that the graph orders them correctly.

use neptune_stack::domain::{LogicalId, ResourceType};
use neptune_stack::{DependencyGraph, Resource, Stack, StackError, Value};
use proptest::prelude::*;

// ============================================================================
// Stack Generation
// ============================================================================

/// How resource `i` relates to an earlier resource `j`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    None,
    Ref,
    GetAtt,
    Explicit,
    NamedWithHint,
}

fn link() -> impl Strategy<Value = Link> {
    prop_oneof![
        3 => Just(Link::None),
        1 => Just(Link::Ref),
        1 => Just(Link::GetAtt),
        1 => Just(Link::Explicit),
        1 => Just(Link::NamedWithHint),
    ]
}

/// Row `i` holds the links of resource `i` to resources `0..i`
fn link_matrix() -> impl Strategy<Value = Vec<Vec<Link>>> {
    (1usize..16).prop_flat_map(|n| {
        (0..n)
            .map(|i| prop::collection::vec(link(), i))
            .collect::<Vec<_>>()
    })
}

fn node(i: usize) -> LogicalId {
    LogicalId::new(format!("Node{}", i)).unwrap()
}

fn declare(matrix: &[Vec<Link>]) -> Stack {
    let mut stack = Stack::new("generated");
    for (i, row) in matrix.iter().enumerate() {
        let mut links = Vec::new();
        let mut resource = Resource::new(node(i), ResourceType::Subnet);
        for (j, link) in row.iter().enumerate() {
            match link {
                Link::None => {}
                Link::Ref => links.push(Value::reference(&node(j))),
                Link::GetAtt => links.push(Value::get_att(&node(j), "Id")),
                Link::Explicit => resource = resource.with_dependency(&node(j)),
                Link::NamedWithHint => {
                    links.push(Value::NameOf {
                        target: node(j),
                        name: format!("node-{}", j),
                    });
                    resource = resource.with_dependency(&node(j));
                }
            }
        }
        stack
            .add(resource.with_property("Links", Value::List(links)))
            .unwrap();
    }
    stack
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: Every declared link becomes an edge
    #[test]
    fn prop_every_link_is_an_edge(matrix in link_matrix()) {
        let stack = declare(&matrix);
        let graph = DependencyGraph::build(&stack).unwrap();

        for (i, row) in matrix.iter().enumerate() {
            for (j, link) in row.iter().enumerate() {
                if *link != Link::None {
                    prop_assert!(graph.has_edge(&node(i), &node(j)), "missing edge {} -> {}", i, j);
                }
            }
        }
    }

    /// Property: Every resource lies in a strictly later wave than its dependencies
    #[test]
    fn prop_waves_respect_edges(matrix in link_matrix()) {
        let stack = declare(&matrix);
        let graph = DependencyGraph::build(&stack).unwrap();

        let wave_of = |id: &LogicalId| {
            graph.waves().iter().position(|wave| wave.contains(id)).unwrap()
        };
        for edge in graph.edges() {
            prop_assert!(wave_of(&edge.from) > wave_of(&edge.to));
        }

        let placed: usize = graph.waves().iter().map(Vec::len).sum();
        prop_assert_eq!(placed, stack.len());
        for id in &graph.waves()[0] {
            prop_assert!(graph.dependencies_of(id).unwrap().is_empty());
        }
    }

    /// Property: Ordering is deterministic
    #[test]
    fn prop_order_is_deterministic(matrix in link_matrix()) {
        let stack = declare(&matrix);
        let first = DependencyGraph::build(&stack).unwrap().topological_order();
        let second = DependencyGraph::build(&stack).unwrap().topological_order();
        prop_assert_eq!(first, second);
    }

    /// Property: Closing a chain into a loop is reported as a cycle
    #[test]
    fn prop_closed_chain_is_a_cycle(n in 2usize..12) {
        let mut stack = Stack::new("chain");
        for i in 0..n {
            let mut resource = Resource::new(node(i), ResourceType::Subnet);
            if i > 0 {
                resource = resource.with_property("Prev", Value::reference(&node(i - 1)));
            }
            stack.add(resource).unwrap();
        }
        stack.add_dependency(&node(0), &node(n - 1)).unwrap();

        match DependencyGraph::build(&stack) {
            Err(StackError::DependencyCycle(path)) => {
                prop_assert_eq!(path.first(), path.last());
                prop_assert_eq!(path.len(), n + 1);
            }
            other => prop_assert!(false, "expected a cycle, got {:?}", other.map(|g| g.len())),
        }
    }
}
