//! XSD Particle Schema Components
//!
//! A particle is a term (element declaration, model group or wildcard)
//! together with its occurrence bounds.

use crate::error::CompileError;
use crate::validators::grammar::{ElementId, GroupId};
use crate::validators::groups::ModelGroup;
use crate::validators::wildcards::Wildcard;

/// Occurrence bounds for a particle (minOccurs, maxOccurs)
/// None for max means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum number of occurrences (default 1)
    pub min: u32,
    /// Maximum number of occurrences (None = unbounded, default 1)
    pub max: Option<u32>,
}

impl Occurs {
    /// Create new occurrence bounds
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self { min: 0, max: None }
    }

    /// Check if this particle can be empty (minOccurs == 0)
    pub fn is_emptiable(&self) -> bool {
        self.min == 0
    }

    /// Check if this particle is empty (maxOccurs == 0)
    pub fn is_empty(&self) -> bool {
        self.max == Some(0)
    }

    /// Check if occurrence count is under the minimum
    pub fn is_missing(&self, count: u32) -> bool {
        count < self.min
    }

    /// Check if occurrence count is at or over the maximum
    pub fn is_over(&self, count: u32) -> bool {
        match self.max {
            Some(max) => count >= max,
            None => false,
        }
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

/// Parse minOccurs/maxOccurs from XML attribute values
pub fn parse_occurs(
    min_occurs: Option<&str>,
    max_occurs: Option<&str>,
) -> Result<Occurs, CompileError> {
    let mut occurs = Occurs::once();

    if let Some(min_str) = min_occurs {
        occurs.min = min_str.trim().parse::<u32>().map_err(|_| {
            CompileError::invalid(format!(
                "minOccurs value '{}' is not a valid non-negative integer",
                min_str
            ))
        })?;
    }

    if let Some(max_str) = max_occurs {
        let max_str = max_str.trim();
        if max_str == "unbounded" {
            occurs.max = None;
        } else {
            let max = max_str.parse::<u32>().map_err(|_| {
                CompileError::invalid(format!(
                    "maxOccurs value '{}' must be a non-negative integer or 'unbounded'",
                    max_str
                ))
            })?;
            occurs.max = Some(max);
        }
    }

    if let Some(max) = occurs.max {
        if occurs.min > max {
            return Err(CompileError::invalid(format!(
                "minOccurs ({}) must not be greater than maxOccurs ({})",
                occurs.min, max
            )));
        }
    }

    Ok(occurs)
}

/// What a particle matches
#[derive(Debug, Clone)]
pub enum Term {
    /// An element declaration (global or local)
    Element(ElementId),
    /// An inline model group
    Group(ModelGroup),
    /// A reference to a named model group
    GroupRef(GroupId),
    /// An element wildcard
    Any(Wildcard),
}

/// A term with occurrence bounds
#[derive(Debug, Clone)]
pub struct Particle {
    /// Occurrence bounds
    pub occurs: Occurs,
    /// The term
    pub term: Term,
}

impl Particle {
    /// Create a new particle
    pub fn new(term: Term, occurs: Occurs) -> Self {
        Self { occurs, term }
    }

    /// A particle that occurs exactly once
    pub fn once(term: Term) -> Self {
        Self::new(term, Occurs::once())
    }

    /// Named groups referenced directly from this particle tree
    pub fn group_refs(&self) -> Vec<GroupId> {
        let mut refs = Vec::new();
        self.collect_group_refs(&mut refs);
        refs
    }

    fn collect_group_refs(&self, refs: &mut Vec<GroupId>) {
        match &self.term {
            Term::GroupRef(id) => refs.push(*id),
            Term::Group(group) => {
                for particle in &group.particles {
                    particle.collect_group_refs(refs);
                }
            }
            Term::Element(_) | Term::Any(_) => {}
        }
    }
}
