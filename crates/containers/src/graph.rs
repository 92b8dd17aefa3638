// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Directed graph over ordered vertices.
//!
//! Vertices and edges are both kept in `BTreeSet`s, so iteration order is
//! deterministic. Self-loops are allowed. Adding an existing edge or
//! removing a missing one is a no-op that reports `false` rather than an
//! error; only references to unknown vertices fail.

use crate::GraphError;
use std::collections::BTreeSet;

/// A set of vertices and a set of directed edges between them.
#[derive(Debug, Clone)]
pub struct DirectedGraph<V: Ord + Clone> {
    vertices: BTreeSet<V>,
    /// `(from, to)` pairs.
    edges: BTreeSet<(V, V)>,
}

impl<V: Ord + Clone> DirectedGraph<V> {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            vertices: BTreeSet::new(),
            edges: BTreeSet::new(),
        }
    }

    /// Adds `vertex`; fails if it is already present.
    pub fn add_vertex(&mut self, vertex: V) -> Result<(), GraphError> {
        if !self.vertices.insert(vertex) {
            return Err(GraphError::VertexAlreadyExists);
        }
        Ok(())
    }

    /// Removes `vertex` together with every edge entering or leaving it.
    pub fn remove_vertex(&mut self, vertex: &V) -> Result<(), GraphError> {
        if !self.vertices.remove(vertex) {
            return Err(GraphError::VertexNotFound);
        }
        self.edges.retain(|(from, to)| from != vertex && to != vertex);
        Ok(())
    }

    /// Returns `true` if `vertex` is in the graph.
    pub fn vertex_exists(&self, vertex: &V) -> bool {
        self.vertices.contains(vertex)
    }

    /// Adds the edge `from → to`. Returns `false` if it was already present.
    pub fn add_edge(&mut self, from: &V, to: &V) -> Result<bool, GraphError> {
        self.require(from, to)?;
        Ok(self.edges.insert((from.clone(), to.clone())))
    }

    /// Removes the edge `from → to`. Returns `false` if it was absent.
    pub fn remove_edge(&mut self, from: &V, to: &V) -> Result<bool, GraphError> {
        self.require(from, to)?;
        Ok(self.edges.remove(&(from.clone(), to.clone())))
    }

    /// Returns `true` if the edge `from → to` exists.
    pub fn edge_exists(&self, from: &V, to: &V) -> bool {
        self.edges.contains(&(from.clone(), to.clone()))
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Removes all vertices and edges.
    pub fn clear(&mut self) {
        self.edges.clear();
        self.vertices.clear();
    }

    fn require(&self, from: &V, to: &V) -> Result<(), GraphError> {
        if !self.vertex_exists(from) || !self.vertex_exists(to) {
            return Err(GraphError::VertexNotFound);
        }
        Ok(())
    }
}

impl<V: Ord + Clone> Default for DirectedGraph<V> {
    fn default() -> Self {
        Self::new()
    }
}
