//! Scalar vocabulary shared by specs, observed state, and the store client.
//!
//! Every enum renders to and parses from the exact string DynamoDB uses on
//! the wire, so persisted state stays readable by other tooling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::GsiError;

/// Attribute type of a key attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    #[serde(rename = "S")]
    String,
    #[serde(rename = "N")]
    Number,
    #[serde(rename = "B")]
    Binary,
}

impl ScalarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::String => "S",
            ScalarType::Number => "N",
            ScalarType::Binary => "B",
        }
    }
}

impl FromStr for ScalarType {
    type Err = GsiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S" => Ok(ScalarType::String),
            "N" => Ok(ScalarType::Number),
            "B" => Ok(ScalarType::Binary),
            other => Err(GsiError::Validation(format!(
                "invalid attribute type '{}'. Must be one of: S, N, B",
                other
            ))),
        }
    }
}

/// Role of an attribute inside an index key schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyRole {
    Hash,
    Range,
}

impl KeyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyRole::Hash => "HASH",
            KeyRole::Range => "RANGE",
        }
    }
}

/// Which table attributes are copied into the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectionType {
    All,
    KeysOnly,
    Include,
}

impl ProjectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectionType::All => "ALL",
            ProjectionType::KeysOnly => "KEYS_ONLY",
            ProjectionType::Include => "INCLUDE",
        }
    }
}

impl FromStr for ProjectionType {
    type Err = GsiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ALL" => Ok(ProjectionType::All),
            "KEYS_ONLY" => Ok(ProjectionType::KeysOnly),
            "INCLUDE" => Ok(ProjectionType::Include),
            other => Err(GsiError::Validation(format!(
                "invalid projection_type '{}'. Must be one of: ALL, KEYS_ONLY, INCLUDE",
                other
            ))),
        }
    }
}

/// Billing mode of the parent table, mirrored on the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingMode {
    #[default]
    Provisioned,
    PayPerRequest,
}

impl BillingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingMode::Provisioned => "PROVISIONED",
            BillingMode::PayPerRequest => "PAY_PER_REQUEST",
        }
    }
}

impl FromStr for BillingMode {
    type Err = GsiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROVISIONED" => Ok(BillingMode::Provisioned),
            "PAY_PER_REQUEST" => Ok(BillingMode::PayPerRequest),
            other => Err(GsiError::Validation(format!(
                "invalid billing_mode '{}'. Must be PROVISIONED or PAY_PER_REQUEST",
                other
            ))),
        }
    }
}

/// Remote lifecycle status of an index. Absence is modelled as `None` by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexStatus {
    Creating,
    Updating,
    Active,
    Deleting,
}

impl IndexStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexStatus::Creating => "CREATING",
            IndexStatus::Updating => "UPDATING",
            IndexStatus::Active => "ACTIVE",
            IndexStatus::Deleting => "DELETING",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(ScalarType, KeyRole, ProjectionType, BillingMode, IndexStatus);
