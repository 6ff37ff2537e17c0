use crate::engine::UnitId;

/// Which directions a node can be wired in. Checked from the tag when an edge
/// is requested, never by probing the underlying unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Produces audio only (file player, microphone).
    Source,
    /// Consumes audio only (speakers).
    Sink,
    /// Processing stage with both an input and an output.
    SourceSink,
}

impl NodeKind {
    pub fn has_output(self) -> bool {
        matches!(self, NodeKind::Source | NodeKind::SourceSink)
    }

    pub fn has_input(self) -> bool {
        matches!(self, NodeKind::Sink | NodeKind::SourceSink)
    }
}

/// A named stage of the signal graph and its recorded edges.
#[derive(Debug, Clone)]
pub struct GraphNode {
    name: String,
    kind: NodeKind,
    unit: UnitId,
    pub(super) outputs: Vec<String>,
    pub(super) inputs: Vec<String>,
}

impl GraphNode {
    pub fn new(name: impl Into<String>, kind: NodeKind, unit: UnitId) -> Self {
        Self {
            name: name.into(),
            kind,
            unit,
            outputs: Vec::new(),
            inputs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn unit(&self) -> UnitId {
        self.unit
    }

    /// Names of nodes this one feeds, in connection order.
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Names of nodes feeding this one.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }
}
