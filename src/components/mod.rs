//! Element models for magnetic circuit simulation.
//!
//! This module provides the three branch elements a magnetic equivalent
//! circuit is built from:
//! - Permeance: linear or saturable flux path
//! - Sources: MMF source, flux source
//!
//! Every element is a two-terminal branch `(n1, n2)`; a positive branch
//! quantity flows from `n1` to `n2`.

mod permeance;
mod sources;

pub use permeance::Permeance;
pub use sources::{MmfSource, PhiSource};

use crate::circuit::NodeId;

/// A circuit element.
#[derive(Debug, Clone)]
pub enum Element {
    Permeance(Permeance),
    MmfSource(MmfSource),
    PhiSource(PhiSource),
}

impl Element {
    /// Get the element name.
    pub fn name(&self) -> &str {
        match self {
            Element::Permeance(p) => &p.name,
            Element::MmfSource(v) => &v.name,
            Element::PhiSource(f) => &f.name,
        }
    }

    /// Get the terminals `[n1, n2]`.
    pub fn nodes(&self) -> [NodeId; 2] {
        match self {
            Element::Permeance(p) => p.nodes,
            Element::MmfSource(v) => v.nodes,
            Element::PhiSource(f) => f.nodes,
        }
    }

    /// Check if this element is nonlinear (bound to a B-H model).
    pub fn is_nonlinear(&self) -> bool {
        matches!(self, Element::Permeance(p) if p.is_nonlinear())
    }

    /// Get the permeance if this element is one.
    pub fn as_permeance(&self) -> Option<&Permeance> {
        match self {
            Element::Permeance(p) => Some(p),
            _ => None,
        }
    }

    /// Element parameters as they appear after the node list in a netlist line.
    pub fn netlist_params(&self) -> String {
        match self {
            Element::Permeance(p) => {
                let mut s = format!(
                    "mur={} w={} d={} l={}",
                    p.mur, p.width, p.depth, p.length
                );
                if let Some(model) = &p.model {
                    s.push_str(&format!(" model={}", model));
                }
                s
            }
            Element::MmfSource(v) => format!("type=MMF value={}", v.value),
            Element::PhiSource(f) => format!("type=phi value={}", f.value),
        }
    }
}
