//! Remote store client interface.
//!
//! Lifecycle operations only ever talk to the table through [`TableStore`]:
//! a point-in-time describe and a single-index update. The AWS implementation
//! lives in [`crate::client`]; tests supply their own.

use std::sync::Arc;

use crate::errors::StoreError;
use crate::types::{IndexStatus, KeyRole, ProjectionType, ScalarType};

/// Table-level name → type binding shared by all of a table's indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDefinition {
    pub name: String,
    pub scalar_type: ScalarType,
}

impl AttributeDefinition {
    pub fn new(name: impl Into<String>, scalar_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            scalar_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchemaElement {
    pub attribute_name: String,
    pub role: KeyRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub projection_type: ProjectionType,
    pub non_key_attributes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throughput {
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
}

/// One global secondary index as reported by DescribeTable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDescription {
    pub name: String,
    pub arn: Option<String>,
    pub key_schema: Vec<KeySchemaElement>,
    pub projection: Option<Projection>,
    /// Absent for on-demand tables.
    pub throughput: Option<Throughput>,
    pub status: Option<IndexStatus>,
}

/// Result of DescribeTable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescription {
    pub name: String,
    pub status: Option<String>,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub indexes: Vec<IndexDescription>,
}

impl TableDescription {
    /// Locate a global secondary index by name.
    pub fn index(&self, name: &str) -> Option<&IndexDescription> {
        self.indexes.iter().find(|i| i.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIndexAction {
    pub index_name: String,
    pub key_schema: Vec<KeySchemaElement>,
    pub projection: Projection,
    /// Only sent for provisioned billing.
    pub throughput: Option<Throughput>,
}

/// Capacity change for an existing index. DynamoDB takes both units even
/// when only one of them moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateIndexAction {
    pub index_name: String,
    pub throughput: Throughput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexUpdate {
    Create(CreateIndexAction),
    Update(UpdateIndexAction),
    Delete { index_name: String },
}

/// UpdateTable carrying exactly one index action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTableRequest {
    pub table_name: String,
    /// Required by DynamoDB when an index is created.
    pub attribute_definitions: Option<Vec<AttributeDefinition>>,
    pub index_update: IndexUpdate,
}

/// Point-in-time access to the table store.
pub trait TableStore {
    /// Describe a table. A missing table is reported as a `NotFound` error.
    fn describe_table(&self, table_name: &str) -> Result<TableDescription, StoreError>;

    /// Submit an UpdateTable call. Returns once the store has acknowledged it;
    /// the index transition itself continues asynchronously.
    fn update_table(&self, request: UpdateTableRequest) -> Result<(), StoreError>;
}

impl<S: TableStore + ?Sized> TableStore for &S {
    fn describe_table(&self, table_name: &str) -> Result<TableDescription, StoreError> {
        (**self).describe_table(table_name)
    }

    fn update_table(&self, request: UpdateTableRequest) -> Result<(), StoreError> {
        (**self).update_table(request)
    }
}

impl<S: TableStore + ?Sized> TableStore for Arc<S> {
    fn describe_table(&self, table_name: &str) -> Result<TableDescription, StoreError> {
        (**self).describe_table(table_name)
    }

    fn update_table(&self, request: UpdateTableRequest) -> Result<(), StoreError> {
        (**self).update_table(request)
    }
}
