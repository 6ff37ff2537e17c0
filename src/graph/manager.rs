use std::collections::BTreeMap;

use tracing::{debug, error, warn};

use super::node::{GraphNode, NodeKind};
use crate::{
    engine::{AudioEngine, UnitId},
    error::{Error, Result},
};

/*
Named-Edge Graph over a Node-Granular Engine
============================================

The graph manager owns the edge set. The engine only mirrors it, and the
engine's primitive is coarse:

    connect(a, b)        add one route
    disconnect_all(a)    drop EVERY route leaving a

So removing a single edge a→b is done as teardown-then-rebuild:

    before:   a ──▶ b        disconnect(a, b):
              a ──▶ c          1. disconnect_all(a)      a     b
              a ──▶ d          2. forget a→b             a     c
                               3. re-connect a→c, a→d    a ──▶ c
                                                         a ──▶ d

Between steps 1 and 3 the remaining outputs of `a` are briefly silent, which
is why speaker-facing edges must be disconnected before source-facing ones.

Invariant: an edge (from, to) is recorded in both from.outputs and to.inputs,
or in neither, and exactly the recorded edges exist in the engine. If the
engine refuses a re-connect during rebuild, the edge is forgotten too.
*/

pub struct SignalGraph<E> {
    nodes: BTreeMap<String, GraphNode>,
    engine: E,
}

impl<E: AudioEngine> SignalGraph<E> {
    /// Build a graph with a fixed node set and no edges.
    ///
    /// Fails if a name repeats or a tag disagrees with what the engine
    /// reports for that unit.
    pub fn new<S: Into<String>>(
        engine: E,
        nodes: impl IntoIterator<Item = (S, NodeKind, UnitId)>,
    ) -> Result<Self> {
        let mut map = BTreeMap::new();
        for (name, kind, unit) in nodes {
            let node = GraphNode::new(name, kind, unit);
            let name = node.name().to_owned();
            if let Some(actual) = engine.unit_kind(unit) {
                if actual != kind {
                    return Err(Error::GraphWiring(format!(
                        "node '{name}' tagged {kind:?} but unit {} is {actual:?}",
                        unit.0
                    )));
                }
            }
            if map.insert(name.clone(), node).is_some() {
                return Err(Error::GraphWiring(format!("duplicate node '{name}'")));
            }
        }
        Ok(Self { nodes: map, engine })
    }

    /// Wire `from → to`.
    ///
    /// Returns `Ok(false)` if the edge already exists. Unknown names, an
    /// illegal direction or an engine refusal are logged, leave the graph
    /// untouched and come back as [`Error::GraphWiring`].
    pub fn connect(&mut self, from: &str, to: &str) -> Result<bool> {
        let result = self.try_connect(from, to);
        if let Err(err) = &result {
            warn!(from, to, "connect skipped: {err}");
        }
        result
    }

    fn try_connect(&mut self, from: &str, to: &str) -> Result<bool> {
        let (from_node, to_node) = self.pair(from, to)?;
        if !from_node.kind().has_output() {
            return Err(Error::GraphWiring(format!("'{from}' has no output")));
        }
        if !to_node.kind().has_input() {
            return Err(Error::GraphWiring(format!("'{to}' has no input")));
        }
        if from_node.outputs.iter().any(|o| o == to) {
            return Ok(false);
        }

        let (from_unit, to_unit) = (from_node.unit(), to_node.unit());
        self.engine.connect(from_unit, to_unit)?;
        self.record(from, to);
        debug!(from, to, "connected");
        Ok(true)
    }

    /// Remove `from → to`, rebuilding the other outputs of `from`.
    ///
    /// Returns `Ok(false)` when the edge was not connected.
    pub fn disconnect(&mut self, from: &str, to: &str) -> Result<bool> {
        let result = self.try_disconnect(from, to);
        if let Err(err) = &result {
            warn!(from, to, "disconnect skipped: {err}");
        }
        result
    }

    fn try_disconnect(&mut self, from: &str, to: &str) -> Result<bool> {
        let (from_node, _) = self.pair(from, to)?;
        if !from_node.outputs.iter().any(|o| o == to) {
            return Ok(false);
        }

        let from_unit = from_node.unit();
        self.engine.disconnect_all(from_unit)?;
        self.forget(from, to);

        let remaining = self.nodes[from].outputs.clone();
        for other in remaining {
            let other_unit = self.nodes[&other].unit();
            if let Err(err) = self.engine.connect(from_unit, other_unit) {
                error!(from, to = %other, "rebuild failed, dropping edge: {err}");
                self.forget(from, &other);
            }
        }
        debug!(from, to, "disconnected");
        Ok(true)
    }

    fn pair(&self, from: &str, to: &str) -> Result<(&GraphNode, &GraphNode)> {
        let from_node = self
            .nodes
            .get(from)
            .ok_or_else(|| Error::GraphWiring(format!("unknown node '{from}'")))?;
        let to_node = self
            .nodes
            .get(to)
            .ok_or_else(|| Error::GraphWiring(format!("unknown node '{to}'")))?;
        Ok((from_node, to_node))
    }

    fn record(&mut self, from: &str, to: &str) {
        if let Some(node) = self.nodes.get_mut(from) {
            node.outputs.push(to.to_owned());
        }
        if let Some(node) = self.nodes.get_mut(to) {
            node.inputs.push(from.to_owned());
        }
    }

    fn forget(&mut self, from: &str, to: &str) {
        if let Some(node) = self.nodes.get_mut(from) {
            node.outputs.retain(|o| o != to);
        }
        if let Some(node) = self.nodes.get_mut(to) {
            node.inputs.retain(|i| i != from);
        }
    }

    pub fn is_connected(&self, from: &str, to: &str) -> bool {
        self.nodes
            .get(from)
            .is_some_and(|n| n.outputs.iter().any(|o| o == to))
    }

    pub fn node(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.get(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// Every recorded edge, grouped by source node name.
    pub fn edges(&self) -> Vec<(String, String)> {
        self.nodes
            .values()
            .flat_map(|n| n.outputs.iter().map(|o| (n.name().to_owned(), o.clone())))
            .collect()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}
