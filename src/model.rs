//! Desired, observed, and persisted records for one global secondary index.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::errors::GsiError;
use crate::store::{KeySchemaElement, Projection, Throughput};
use crate::types::{BillingMode, IndexStatus, KeyRole, ProjectionType, ScalarType};

/// Separator between table and index name. Neither name may contain it.
pub const ID_DELIMITER: char = ':';

/// Declared index, populated and validated once at the front-end boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub table_name: String,
    pub name: String,
    pub hash_key: String,
    pub hash_key_type: ScalarType,
    #[serde(default)]
    pub range_key: Option<String>,
    #[serde(default)]
    pub range_key_type: Option<ScalarType>,
    pub projection_type: ProjectionType,
    #[serde(default)]
    pub non_key_attributes: BTreeSet<String>,
    #[serde(default)]
    pub billing_mode: BillingMode,
    #[serde(default)]
    pub read_capacity: Option<i64>,
    #[serde(default)]
    pub write_capacity: Option<i64>,
    #[serde(default)]
    pub autoscaling_enabled: bool,
}

impl IndexSpec {
    pub fn identity(&self) -> IndexIdentity {
        IndexIdentity::new(&self.table_name, &self.name)
    }

    /// Range key name and type, once both halves are known to be present.
    pub fn range(&self) -> Option<(&str, ScalarType)> {
        match (&self.range_key, self.range_key_type) {
            (Some(name), Some(ty)) => Some((name.as_str(), ty)),
            _ => None,
        }
    }

    pub fn key_schema(&self) -> Vec<KeySchemaElement> {
        let mut schema = vec![KeySchemaElement {
            attribute_name: self.hash_key.clone(),
            role: KeyRole::Hash,
        }];
        if let Some(range_key) = &self.range_key {
            schema.push(KeySchemaElement {
                attribute_name: range_key.clone(),
                role: KeyRole::Range,
            });
        }
        schema
    }

    pub fn projection(&self) -> Projection {
        Projection {
            projection_type: self.projection_type,
            non_key_attributes: self.non_key_attributes.iter().cloned().collect(),
        }
    }

    /// Initial throughput for the create call; `None` for on-demand billing.
    pub fn throughput(&self) -> Option<Throughput> {
        match self.billing_mode {
            BillingMode::Provisioned => Some(Throughput {
                read_capacity_units: self.read_capacity.unwrap_or(0),
                write_capacity_units: self.write_capacity.unwrap_or(0),
            }),
            BillingMode::PayPerRequest => None,
        }
    }
}

/// Composite identity `(table, index)`, rendered as `table:index`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IndexIdentity {
    pub table_name: String,
    pub index_name: String,
}

impl IndexIdentity {
    pub fn new(table_name: impl Into<String>, index_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            index_name: index_name.into(),
        }
    }
}

impl fmt::Display for IndexIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.table_name, ID_DELIMITER, self.index_name)
    }
}

impl FromStr for IndexIdentity {
    type Err = GsiError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        match id.split_once(ID_DELIMITER) {
            Some((table, index)) if !table.is_empty() && !index.is_empty() => {
                Ok(IndexIdentity::new(table, index))
            }
            _ => Err(GsiError::validation(format!(
                "invalid DynamoDB GSI ID ({}), expected <table>{}<index>",
                id, ID_DELIMITER
            ))),
        }
    }
}

impl TryFrom<String> for IndexIdentity {
    type Error = GsiError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        id.parse()
    }
}

impl From<IndexIdentity> for String {
    fn from(id: IndexIdentity) -> Self {
        id.to_string()
    }
}

/// Remote truth for an index, projected from DescribeTable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedIndex {
    pub arn: Option<String>,
    pub hash_key: String,
    pub hash_key_type: ScalarType,
    pub range_key: Option<(String, ScalarType)>,
    pub projection: Option<Projection>,
    pub throughput: Option<Throughput>,
    pub status: Option<IndexStatus>,
}

/// What the front-end persists between invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexState {
    pub id: IndexIdentity,
    #[serde(default)]
    pub arn: Option<String>,
    pub table_name: String,
    pub name: String,
    pub hash_key: String,
    pub hash_key_type: ScalarType,
    #[serde(default)]
    pub range_key: Option<String>,
    #[serde(default)]
    pub range_key_type: Option<ScalarType>,
    #[serde(default)]
    pub projection_type: Option<ProjectionType>,
    #[serde(default)]
    pub non_key_attributes: BTreeSet<String>,
    #[serde(default)]
    pub billing_mode: BillingMode,
    #[serde(default)]
    pub read_capacity: Option<i64>,
    #[serde(default)]
    pub write_capacity: Option<i64>,
    #[serde(default)]
    pub autoscaling_enabled: bool,
    #[serde(default)]
    pub status: Option<IndexStatus>,
}

impl IndexState {
    /// State as declared, before anything has been observed remotely.
    pub fn from_spec(spec: &IndexSpec) -> Self {
        Self {
            id: spec.identity(),
            arn: None,
            table_name: spec.table_name.clone(),
            name: spec.name.clone(),
            hash_key: spec.hash_key.clone(),
            hash_key_type: spec.hash_key_type,
            range_key: spec.range_key.clone(),
            range_key_type: spec.range_key_type,
            projection_type: Some(spec.projection_type),
            non_key_attributes: spec.non_key_attributes.clone(),
            billing_mode: spec.billing_mode,
            read_capacity: spec.read_capacity,
            write_capacity: spec.write_capacity,
            autoscaling_enabled: spec.autoscaling_enabled,
            status: None,
        }
    }

    /// State built purely from remote truth, used by import.
    pub fn from_observed(id: IndexIdentity, observed: &ObservedIndex) -> Self {
        let billing_mode = match observed.throughput {
            Some(_) => BillingMode::Provisioned,
            None => BillingMode::PayPerRequest,
        };
        let mut state = Self {
            table_name: id.table_name.clone(),
            name: id.index_name.clone(),
            id,
            arn: None,
            hash_key: observed.hash_key.clone(),
            hash_key_type: observed.hash_key_type,
            range_key: None,
            range_key_type: None,
            projection_type: None,
            non_key_attributes: BTreeSet::new(),
            billing_mode,
            read_capacity: None,
            write_capacity: None,
            autoscaling_enabled: false,
            status: None,
        };
        state.apply_observed(observed);
        state
    }

    /// Overwrite observed fields with remote truth.
    ///
    /// Optional fields are cleared first so a value missing remotely never
    /// survives from an earlier observation. Capacity is left alone while an
    /// autoscaler owns it, and never recorded for on-demand billing.
    pub fn apply_observed(&mut self, observed: &ObservedIndex) {
        self.range_key = None;
        self.range_key_type = None;
        self.projection_type = None;
        self.non_key_attributes.clear();

        self.arn = observed.arn.clone();
        self.status = observed.status;
        self.hash_key = observed.hash_key.clone();
        self.hash_key_type = observed.hash_key_type;

        if let Some((name, ty)) = &observed.range_key {
            self.range_key = Some(name.clone());
            self.range_key_type = Some(*ty);
        }

        if let Some(projection) = &observed.projection {
            self.projection_type = Some(projection.projection_type);
            self.non_key_attributes = projection.non_key_attributes.iter().cloned().collect();
        }

        if let Some(throughput) = observed.throughput
            && !self.autoscaling_enabled
            && self.billing_mode == BillingMode::Provisioned
        {
            self.read_capacity = Some(throughput.read_capacity_units);
            self.write_capacity = Some(throughput.write_capacity_units);
        }
    }

    pub fn to_json(&self) -> Result<String, GsiError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, GsiError> {
        Ok(serde_json::from_str(json)?)
    }
}
