//! XSD Model Groups
//!
//! Content models are trees of model groups:
//! - xs:sequence - ordered content
//! - xs:choice - alternative content
//! - xs:all - unordered content, each element at most once

use crate::namespaces::QName;
use crate::validators::particles::Particle;
use std::fmt;

/// Model group compositor type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compositor {
    /// Ordered sequence of particles
    #[default]
    Sequence,
    /// One of multiple alternatives
    Choice,
    /// Unordered set of particles
    All,
}

impl Compositor {
    /// Parse from the local name of a schema element
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "sequence" => Some(Self::Sequence),
            "choice" => Some(Self::Choice),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

impl fmt::Display for Compositor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequence => write!(f, "sequence"),
            Self::Choice => write!(f, "choice"),
            Self::All => write!(f, "all"),
        }
    }
}

/// A sequence, choice or all group
#[derive(Debug, Clone, Default)]
pub struct ModelGroup {
    /// Compositor
    pub compositor: Compositor,
    /// Member particles in declaration order
    pub particles: Vec<Particle>,
}

impl ModelGroup {
    /// Create a new model group
    pub fn new(compositor: Compositor, particles: Vec<Particle>) -> Self {
        Self {
            compositor,
            particles,
        }
    }

    /// Check if the group has no particles
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

/// A named top-level `xs:group`
#[derive(Debug, Clone)]
pub struct ModelGroupDefinition {
    /// Qualified name
    pub name: QName,
    /// The group body
    pub group: ModelGroup,
}
