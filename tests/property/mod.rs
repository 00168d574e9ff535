// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! This module contains property-based tests using proptest to verify the
//! ordering guarantees of the dependency graph for arbitrary stacks.

mod graph_ordering;
