//! Identifier types for model entities.
//!
//! Newtypes keep organization, scenario, variable and parameter identifiers
//! from being mixed up when they travel through the engine as plain strings.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[inline]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id! {
    /// Identifier of the organization owning parameters and variables.
    ///
    /// # Examples
    ///
    /// ```
    /// use scenario_core::types::OrganizationId;
    ///
    /// let id = OrganizationId::new("acme");
    /// assert_eq!(id.as_str(), "acme");
    /// ```
    OrganizationId
}

string_id! {
    /// Identifier of a scenario.
    ScenarioId
}

string_id! {
    /// Identifier of a variable definition.
    VariableId
}

string_id! {
    /// Identifier of a parameter.
    ParameterId
}
