//! Adapters between entities and the generic property map.

use std::collections::BTreeMap;

use crate::error::AdapterError;
use crate::schema::NodeLabel;
use crate::types::{Character, User};

/// Node properties as exchanged with the graph layer.
///
/// Every value is text regardless of how the store holds it. A `BTreeMap`
/// keeps iteration (and therefore generated statement text) deterministic.
pub type PropertyMap = BTreeMap<String, String>;

/// An entity that can be stored as a single node.
pub trait GraphEntity: Sized + Send + Sync + 'static {
    const LABEL: NodeLabel;

    /// Value of the label's key property.
    fn id(&self) -> &str;

    fn to_properties(&self) -> PropertyMap;

    fn from_properties(props: &PropertyMap) -> Result<Self, AdapterError>;
}

impl GraphEntity for User {
    const LABEL: NodeLabel = NodeLabel::User;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_properties(&self) -> PropertyMap {
        PropertyMap::from([
            ("uuid".to_string(), self.id.clone()),
            ("name".to_string(), self.name.clone()),
            ("userType".to_string(), self.user_type.to_string()),
        ])
    }

    fn from_properties(props: &PropertyMap) -> Result<Self, AdapterError> {
        Ok(Self {
            id: required(props, Self::LABEL, "uuid")?.to_string(),
            name: required(props, Self::LABEL, "name")?.to_string(),
            user_type: parsed(props, Self::LABEL, "userType")?,
        })
    }
}

impl GraphEntity for Character {
    const LABEL: NodeLabel = NodeLabel::Character;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_properties(&self) -> PropertyMap {
        PropertyMap::from([
            ("id".to_string(), self.id.clone()),
            ("name".to_string(), self.name.clone()),
            ("isHero".to_string(), self.is_hero.to_string()),
            ("cliqueType".to_string(), self.clique_type.to_string()),
        ])
    }

    fn from_properties(props: &PropertyMap) -> Result<Self, AdapterError> {
        Ok(Self {
            id: required(props, Self::LABEL, "id")?.to_string(),
            name: required(props, Self::LABEL, "name")?.to_string(),
            is_hero: parsed(props, Self::LABEL, "isHero")?,
            clique_type: parsed(props, Self::LABEL, "cliqueType")?,
        })
    }
}

fn required<'a>(
    props: &'a PropertyMap,
    label: NodeLabel,
    property: &'static str,
) -> Result<&'a str, AdapterError> {
    props
        .get(property)
        .map(String::as_str)
        .ok_or(AdapterError::MissingProperty {
            label: label.as_str(),
            property,
        })
}

fn parsed<T: std::str::FromStr>(
    props: &PropertyMap,
    label: NodeLabel,
    property: &'static str,
) -> Result<T, AdapterError> {
    let raw = required(props, label, property)?;
    raw.parse().map_err(|_| AdapterError::InvalidValue {
        label: label.as_str(),
        property,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CliqueType, UserType};

    #[test]
    fn user_properties_use_schema_names() {
        let user = User {
            id: "u1".to_string(),
            name: "Ann".to_string(),
            user_type: UserType::Student,
        };
        let props = user.to_properties();
        assert_eq!(props.get("uuid").map(String::as_str), Some("u1"));
        assert_eq!(props.get("userType").map(String::as_str), Some("STUDENT"));
        for key in props.keys() {
            assert!(User::LABEL.property(key).is_some(), "{key} not in schema");
        }
        assert_eq!(User::from_properties(&props).unwrap(), user);
    }

    #[test]
    fn character_properties_use_schema_names() {
        let character = Character {
            id: "c1".to_string(),
            name: "Sam".to_string(),
            is_hero: false,
            clique_type: CliqueType::Nerds,
        };
        let props = character.to_properties();
        assert_eq!(props.get("isHero").map(String::as_str), Some("false"));
        for key in props.keys() {
            assert!(Character::LABEL.property(key).is_some(), "{key} not in schema");
        }
        assert_eq!(Character::from_properties(&props).unwrap(), character);
    }

    #[test]
    fn missing_property_is_reported() {
        let props = PropertyMap::from([("uuid".to_string(), "u1".to_string())]);
        let err = User::from_properties(&props).unwrap_err();
        assert_eq!(
            err,
            AdapterError::MissingProperty {
                label: "User",
                property: "name"
            }
        );
    }

    #[test]
    fn invalid_enum_value_is_reported() {
        let props = PropertyMap::from([
            ("uuid".to_string(), "u1".to_string()),
            ("name".to_string(), "Ann".to_string()),
            ("userType".to_string(), "ALIEN".to_string()),
        ]);
        let err = User::from_properties(&props).unwrap_err();
        assert!(matches!(err, AdapterError::InvalidValue { property: "userType", .. }));
        assert!(err.to_string().contains("ALIEN"));
    }
}
