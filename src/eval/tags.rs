//! Entity tags and the tables that relate them.
//!
//! - [`Tag`]: the four entity categories, in bucket order
//! - [`TagTable`]: which (reference, system) tag pairs may be compared

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Entity category label.
///
/// The declaration order is the bucket order used for per-tag metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    /// Person (PER)
    Person,
    /// Location (LOC)
    Location,
    /// Organization (ORG)
    Organization,
    /// Organization acting as a location, e.g. a country as a political body (LOCORG)
    LocOrg,
}

impl Tag {
    /// All tags in bucket order.
    pub const ALL: [Tag; 4] = [Tag::Person, Tag::Location, Tag::Organization, Tag::LocOrg];

    /// Short uppercase label.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            Tag::Person => "PER",
            Tag::Location => "LOC",
            Tag::Organization => "ORG",
            Tag::LocOrg => "LOCORG",
        }
    }

    /// Parse a label in short (`per`) or long (`Person`) form, any case.
    pub fn from_label(label: &str) -> Result<Self> {
        match label.trim().to_lowercase().as_str() {
            "per" | "person" => Ok(Tag::Person),
            "loc" | "location" => Ok(Tag::Location),
            "org" | "organization" | "organisation" => Ok(Tag::Organization),
            "locorg" => Ok(Tag::LocOrg),
            other => Err(Error::invalid_input(format!("unknown tag '{}'", other))),
        }
    }

    /// Rank used when two items share a span: the higher rank is the one
    /// that counts.
    #[must_use]
    pub fn dominance(&self) -> u8 {
        match self {
            Tag::Organization => 2,
            Tag::LocOrg => 1,
            Tag::Location | Tag::Person => 0,
        }
    }

    /// Tags whose items can embed an item of this tag.
    #[must_use]
    pub fn parent_tags(&self) -> &'static [Tag] {
        match self {
            Tag::Person => &[Tag::Person],
            Tag::Location => &[Tag::Location, Tag::LocOrg],
            Tag::Organization => &[Tag::Organization, Tag::LocOrg],
            Tag::LocOrg => &[Tag::LocOrg, Tag::Organization, Tag::Location],
        }
    }

    /// The tag with LocOrg folded into Location when locorg is disabled.
    #[must_use]
    pub fn folded(self, locorg_enabled: bool) -> Tag {
        if !locorg_enabled && self == Tag::LocOrg {
            Tag::Location
        } else {
            self
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl std::str::FromStr for Tag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Tag::from_label(s)
    }
}

/// Compatibility of (reference tag, system tag) pairs.
///
/// Lookups of pairs that are not in the table fail instead of defaulting to
/// "incompatible".
///
/// # Example
///
/// ```rust
/// use anno_score::eval::{Tag, TagTable};
///
/// let strict = TagTable::strict();
/// assert!(strict.compatible(Tag::Person, Tag::Person).unwrap());
/// assert!(!strict.compatible(Tag::LocOrg, Tag::Location).unwrap());
///
/// let lenient = TagTable::lenient();
/// assert!(lenient.compatible(Tag::LocOrg, Tag::Location).unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagTable {
    entries: BTreeMap<(Tag, Tag), bool>,
}

impl TagTable {
    /// Empty table; every lookup fails until entries are set.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Only identical tags are compatible.
    #[must_use]
    pub fn strict() -> Self {
        let mut table = Self::empty();
        for reference in Tag::ALL {
            for system in Tag::ALL {
                table.set(reference, system, reference == system);
            }
        }
        table
    }

    /// Identical tags, plus LocOrg against Location or Organization in
    /// either direction.
    #[must_use]
    pub fn lenient() -> Self {
        let mut table = Self::strict();
        for other in [Tag::Location, Tag::Organization] {
            table.set(Tag::LocOrg, other, true);
            table.set(other, Tag::LocOrg, true);
        }
        table
    }

    /// Set one entry.
    pub fn set(&mut self, reference: Tag, system: Tag, compatible: bool) {
        self.entries.insert((reference, system), compatible);
    }

    /// Look up a pair.
    pub fn compatible(&self, reference: Tag, system: Tag) -> Result<bool> {
        self.entries
            .get(&(reference, system))
            .copied()
            .ok_or_else(|| Error::missing_tag_pair(reference.as_label(), system.as_label()))
    }
}

impl Default for TagTable {
    fn default() -> Self {
        Self::strict()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip() {
        for tag in Tag::ALL {
            assert_eq!(Tag::from_label(tag.as_label()).unwrap(), tag);
        }
        assert_eq!("Person".parse::<Tag>().unwrap(), Tag::Person);
        assert!(Tag::from_label("misc").is_err());
    }

    #[test]
    fn test_bucket_order() {
        let mut tags = vec![Tag::LocOrg, Tag::Person, Tag::Organization, Tag::Location];
        tags.sort();
        assert_eq!(tags, Tag::ALL.to_vec());
    }

    #[test]
    fn test_organization_dominates() {
        assert!(Tag::Organization.dominance() > Tag::Person.dominance());
        assert!(Tag::Organization.dominance() > Tag::Location.dominance());
        assert_eq!(Tag::Person.dominance(), Tag::Location.dominance());
    }

    #[test]
    fn test_folded() {
        assert_eq!(Tag::LocOrg.folded(false), Tag::Location);
        assert_eq!(Tag::LocOrg.folded(true), Tag::LocOrg);
        assert_eq!(Tag::Person.folded(false), Tag::Person);
    }

    #[test]
    fn test_missing_pair_is_an_error() {
        let mut table = TagTable::empty();
        table.set(Tag::Person, Tag::Person, true);
        assert!(table.compatible(Tag::Person, Tag::Person).unwrap());
        let err = table.compatible(Tag::Person, Tag::Location).unwrap_err();
        assert!(matches!(err, Error::MissingTagPair { .. }));
    }
}
