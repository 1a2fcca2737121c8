//! XSD Wildcards
//!
//! `xs:any` and `xs:anyAttribute`: a namespace constraint plus the
//! processContents mode deciding how matched items are validated.

use crate::error::CompileError;
use std::collections::BTreeSet;
use std::fmt;

/// Process contents mode for wildcards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessContents {
    /// Validate strictly - element/attribute must be declared
    #[default]
    Strict,
    /// Validate if declaration found, otherwise accept
    Lax,
    /// Skip validation entirely
    Skip,
}

impl ProcessContents {
    /// Parse from string value
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "strict" => Some(Self::Strict),
            "lax" => Some(Self::Lax),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

impl fmt::Display for ProcessContents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Lax => write!(f, "lax"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

/// Namespace constraint for wildcards.
///
/// The empty string stands for "no namespace" inside the sets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NamespaceConstraint {
    /// Any namespace is allowed (##any)
    #[default]
    Any,
    /// Any namespace except the target namespace and no namespace (##other)
    Other(Option<String>),
    /// Specific set of allowed namespaces
    Enumeration(BTreeSet<String>),
}

impl NamespaceConstraint {
    /// Create from a `namespace` attribute value
    pub fn parse(value: &str, target_namespace: Option<&str>) -> Result<Self, CompileError> {
        match value.trim() {
            "##any" => Ok(Self::Any),
            "##other" => Ok(Self::Other(target_namespace.map(String::from))),
            value => {
                let mut namespaces = BTreeSet::new();
                for ns in value.split_whitespace() {
                    match ns {
                        "##local" => {
                            namespaces.insert(String::new());
                        }
                        "##targetNamespace" => {
                            namespaces.insert(target_namespace.unwrap_or_default().to_string());
                        }
                        s if s.starts_with("##") => {
                            return Err(CompileError::invalid(format!(
                                "wrong value '{}' in 'namespace' attribute",
                                s
                            )));
                        }
                        uri => {
                            namespaces.insert(uri.to_string());
                        }
                    }
                }
                Ok(Self::Enumeration(namespaces))
            }
        }
    }

    /// Check if a namespace is allowed
    pub fn admits(&self, namespace: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::Other(target) => match namespace {
                None => false,
                Some(ns) => target.as_deref() != Some(ns),
            },
            Self::Enumeration(set) => set.contains(namespace.unwrap_or_default()),
        }
    }

    /// Intersection of two constraints, used when attribute wildcards
    /// from several attribute groups meet in one type
    pub fn intersect(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Any, c) | (c, Self::Any) => c.clone(),
            (Self::Enumeration(a), b) => {
                Self::Enumeration(a.iter().filter(|ns| b.admits(as_ns(ns))).cloned().collect())
            }
            (a, Self::Enumeration(b)) => {
                Self::Enumeration(b.iter().filter(|ns| a.admits(as_ns(ns))).cloned().collect())
            }
            (Self::Other(a), Self::Other(b)) if a == b => self.clone(),
            // Two different ##other constraints admit no single expressible set
            (Self::Other(_), Self::Other(_)) => Self::Enumeration(BTreeSet::new()),
        }
    }
}

fn as_ns(ns: &str) -> Option<&str> {
    if ns.is_empty() {
        None
    } else {
        Some(ns)
    }
}

impl fmt::Display for NamespaceConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "##any"),
            Self::Other(_) => write!(f, "##other"),
            Self::Enumeration(set) => {
                let items: Vec<&str> = set
                    .iter()
                    .map(|ns| if ns.is_empty() { "##local" } else { ns.as_str() })
                    .collect();
                write!(f, "{}", items.join(" "))
            }
        }
    }
}

/// An element or attribute wildcard
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Wildcard {
    /// Allowed namespaces
    pub namespaces: NamespaceConstraint,
    /// How matched items are validated
    pub process_contents: ProcessContents,
}

impl Wildcard {
    /// Build a wildcard from its `namespace` and `processContents` attributes
    pub fn parse(
        namespace: Option<&str>,
        process_contents: Option<&str>,
        target_namespace: Option<&str>,
    ) -> Result<Self, CompileError> {
        let namespaces = match namespace {
            Some(value) => NamespaceConstraint::parse(value, target_namespace)?,
            None => NamespaceConstraint::Any,
        };
        let process_contents = match process_contents {
            Some(value) => ProcessContents::parse(value).ok_or_else(|| {
                CompileError::invalid(format!("invalid processContents value '{}'", value))
            })?,
            None => ProcessContents::Strict,
        };
        Ok(Self {
            namespaces,
            process_contents,
        })
    }

    /// Check if an item in the given namespace matches
    pub fn admits(&self, namespace: Option<&str>) -> bool {
        self.namespaces.admits(namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any() {
        let w = Wildcard::parse(None, None, Some("urn:t")).unwrap();
        assert!(w.admits(None));
        assert!(w.admits(Some("urn:x")));
        assert_eq!(w.process_contents, ProcessContents::Strict);
    }

    #[test]
    fn test_other_excludes_target_and_local() {
        let w = Wildcard::parse(Some("##other"), Some("lax"), Some("urn:t")).unwrap();
        assert!(!w.admits(Some("urn:t")));
        assert!(!w.admits(None));
        assert!(w.admits(Some("urn:x")));
        assert_eq!(w.process_contents, ProcessContents::Lax);
    }

    #[test]
    fn test_enumeration() {
        let w = Wildcard::parse(Some("##local ##targetNamespace urn:a"), Some("skip"), Some("urn:t"))
            .unwrap();
        assert!(w.admits(None));
        assert!(w.admits(Some("urn:t")));
        assert!(w.admits(Some("urn:a")));
        assert!(!w.admits(Some("urn:b")));
    }

    #[test]
    fn test_invalid_values() {
        assert!(NamespaceConstraint::parse("##bogus", None).is_err());
        assert!(Wildcard::parse(None, Some("sometimes"), None).is_err());
    }

    #[test]
    fn test_intersect() {
        let any = NamespaceConstraint::Any;
        let local = NamespaceConstraint::parse("##local urn:a", None).unwrap();
        let other = NamespaceConstraint::parse("##other", Some("urn:t")).unwrap();
        assert_eq!(any.intersect(&local), local);
        let both = local.intersect(&other);
        assert!(both.admits(Some("urn:a")));
        assert!(!both.admits(None));
    }
}
