//! Semantic roles of well-known drainage attributes.
//!
//! Attribute names are resolved to roles once, when a dataset is opened for
//! drainage work. Anything without a role stays reachable by name.

use r2c_parser::AttributeSpec;
use std::collections::HashMap;
use std::fmt;

/// Attributes the drainage algorithms understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeRole {
    Rank,
    Next,
    GridArea,
    Latitude,
    Longitude,
    DrainageArea,
    ChannelSlope,
    ChannelLength,
    Elevation,
    RiverClass,
}

impl AttributeRole {
    pub const ALL: [AttributeRole; 10] = [
        AttributeRole::Rank,
        AttributeRole::Next,
        AttributeRole::GridArea,
        AttributeRole::Latitude,
        AttributeRole::Longitude,
        AttributeRole::DrainageArea,
        AttributeRole::ChannelSlope,
        AttributeRole::ChannelLength,
        AttributeRole::Elevation,
        AttributeRole::RiverClass,
    ];

    /// Attribute name as written in drainage databases.
    pub fn attribute_name(&self) -> &'static str {
        match self {
            AttributeRole::Rank => "Rank",
            AttributeRole::Next => "Next",
            AttributeRole::GridArea => "GridArea",
            AttributeRole::Latitude => "Latitude",
            AttributeRole::Longitude => "Longitude",
            AttributeRole::DrainageArea => "DA",
            AttributeRole::ChannelSlope => "ChnlSlope",
            AttributeRole::ChannelLength => "ChnlLength",
            AttributeRole::Elevation => "Elev",
            AttributeRole::RiverClass => "IAK",
        }
    }

    /// Role of an attribute name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|role| role.attribute_name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for AttributeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute_name())
    }
}

/// Attribute positions by role, with a name index for everything else.
#[derive(Debug, Clone, Default)]
pub struct RoleIndex {
    roles: HashMap<AttributeRole, usize>,
    others: HashMap<String, usize>,
}

impl RoleIndex {
    /// Resolve roles for a list of attributes. The first match wins.
    pub fn resolve(attributes: &[AttributeSpec]) -> Self {
        let mut index = Self::default();
        for (position, attribute) in attributes.iter().enumerate() {
            match AttributeRole::from_name(&attribute.name) {
                Some(role) => {
                    index.roles.entry(role).or_insert(position);
                }
                None => {
                    index
                        .others
                        .entry(attribute.name.to_ascii_lowercase())
                        .or_insert(position);
                }
            }
        }
        index
    }

    /// Position of the attribute with this role.
    pub fn get(&self, role: AttributeRole) -> Option<usize> {
        self.roles.get(&role).copied()
    }

    /// Position of an attribute without a role, by name.
    pub fn lookup(&self, name: &str) -> Option<usize> {
        match AttributeRole::from_name(name) {
            Some(role) => self.get(role),
            None => self.others.get(&name.to_ascii_lowercase()).copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_ignores_case() {
        assert_eq!(AttributeRole::from_name("RANK"), Some(AttributeRole::Rank));
        assert_eq!(AttributeRole::from_name("chnlslope"), Some(AttributeRole::ChannelSlope));
        assert_eq!(AttributeRole::from_name("da"), Some(AttributeRole::DrainageArea));
        assert_eq!(AttributeRole::from_name("forest"), None);
    }

    #[test]
    fn test_resolve_roles_and_others() {
        let attrs = vec![
            AttributeSpec::new("Rank"),
            AttributeSpec::new("Next"),
            AttributeSpec::new("Forest"),
            AttributeSpec::new("rank"),
        ];
        let index = RoleIndex::resolve(&attrs);
        assert_eq!(index.get(AttributeRole::Rank), Some(0));
        assert_eq!(index.get(AttributeRole::Next), Some(1));
        assert_eq!(index.get(AttributeRole::GridArea), None);
        assert_eq!(index.lookup("forest"), Some(2));
        assert_eq!(index.lookup("NEXT"), Some(1));
    }
}
