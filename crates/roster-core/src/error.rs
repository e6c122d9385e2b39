use thiserror::Error;

/// Errors raised while rebuilding an entity from its property map.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("{label} is missing required property {property}")]
    MissingProperty {
        label: &'static str,
        property: &'static str,
    },

    #[error("{label}.{property} has invalid value {value:?}")]
    InvalidValue {
        label: &'static str,
        property: &'static str,
        value: String,
    },
}
