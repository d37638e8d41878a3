use crate::{Innovation, NodeId};

use std::error::Error;
use std::fmt;

/// An error type indicating a genome could not be built
/// from the parameters or genes supplied.
#[derive(Debug, Clone, PartialEq)]
pub enum GenomeError {
    /// Genomes need at least one input and one output node.
    InvalidNodeCount { inputs: usize, outputs: usize },
    /// The gene targets an input node.
    InputEndpoint(Innovation, NodeId),
    /// The gene originates at an output node.
    OutputEndpoint(Innovation, NodeId),
    /// The gene connects a node to itself.
    SelfLoop(Innovation, NodeId),
    /// Another gene already has this innovation number.
    DuplicateInnovation(Innovation),
    /// Another gene already connects the same endpoints.
    DuplicateEndpoints(Innovation, (NodeId, NodeId)),
    /// Enabling the gene closes a cycle through enabled genes.
    Cycle(Innovation, (NodeId, NodeId)),
}

impl fmt::Display for GenomeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNodeCount { inputs, outputs } => write!(
                f,
                "genome requires at least one input and one output node, got {} inputs and {} outputs",
                inputs, outputs
            ),
            Self::InputEndpoint(innovation, node) => write!(
                f,
                "gene {} targets input node {}",
                innovation, node
            ),
            Self::OutputEndpoint(innovation, node) => write!(
                f,
                "gene {} originates at output node {}",
                innovation, node
            ),
            Self::SelfLoop(innovation, node) => {
                write!(f, "gene {} connects node {} to itself", innovation, node)
            }
            Self::DuplicateInnovation(innovation) => {
                write!(f, "duplicate gene with innovation {}", innovation)
            }
            Self::DuplicateEndpoints(innovation, (input, output)) => write!(
                f,
                "gene {} duplicates the connection {} -> {}",
                innovation, input, output
            ),
            Self::Cycle(innovation, (input, output)) => write!(
                f,
                "gene {} ({} -> {}) closes a cycle through enabled genes",
                innovation, input, output
            ),
        }
    }
}

impl Error for GenomeError {}
