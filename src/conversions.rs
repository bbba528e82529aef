//! Type conversions between aws-sdk-dynamodb models and the store records.

use aws_sdk_dynamodb::error::BuildError;
use aws_sdk_dynamodb::types as sdk;

use crate::errors::{StoreError, StoreErrorKind};
use crate::store::{
    AttributeDefinition, CreateIndexAction, IndexDescription, IndexUpdate, KeySchemaElement,
    Projection, TableDescription, Throughput,
};
use crate::types::{IndexStatus, KeyRole, ProjectionType, ScalarType};

fn unrecognized(what: &str, value: &str) -> StoreError {
    StoreError::other(format!("Unrecognized {} from DynamoDB: '{}'", what, value))
}

fn build_failed(what: &str, err: BuildError) -> StoreError {
    StoreError::new(
        StoreErrorKind::Validation,
        format!("Failed to build {}: {}", what, err),
    )
}

// ========== SDK -> STORE ==========

pub fn scalar_type_from_sdk(value: &sdk::ScalarAttributeType) -> Result<ScalarType, StoreError> {
    match value {
        sdk::ScalarAttributeType::S => Ok(ScalarType::String),
        sdk::ScalarAttributeType::N => Ok(ScalarType::Number),
        sdk::ScalarAttributeType::B => Ok(ScalarType::Binary),
        other => Err(unrecognized("attribute type", other.as_str())),
    }
}

pub fn key_role_from_sdk(value: &sdk::KeyType) -> Result<KeyRole, StoreError> {
    match value {
        sdk::KeyType::Hash => Ok(KeyRole::Hash),
        sdk::KeyType::Range => Ok(KeyRole::Range),
        other => Err(unrecognized("key type", other.as_str())),
    }
}

pub fn projection_type_from_sdk(value: &sdk::ProjectionType) -> Result<ProjectionType, StoreError> {
    match value {
        sdk::ProjectionType::All => Ok(ProjectionType::All),
        sdk::ProjectionType::KeysOnly => Ok(ProjectionType::KeysOnly),
        sdk::ProjectionType::Include => Ok(ProjectionType::Include),
        other => Err(unrecognized("projection type", other.as_str())),
    }
}

pub fn index_status_from_sdk(value: &sdk::IndexStatus) -> Result<IndexStatus, StoreError> {
    match value {
        sdk::IndexStatus::Creating => Ok(IndexStatus::Creating),
        sdk::IndexStatus::Updating => Ok(IndexStatus::Updating),
        sdk::IndexStatus::Active => Ok(IndexStatus::Active),
        sdk::IndexStatus::Deleting => Ok(IndexStatus::Deleting),
        other => Err(unrecognized("index status", other.as_str())),
    }
}

/// Convert a DynamoDB GSI description.
///
/// On-demand indexes report zero throughput, which is treated as absent.
pub fn index_from_sdk(
    index: &sdk::GlobalSecondaryIndexDescription,
) -> Result<IndexDescription, StoreError> {
    let key_schema = index
        .key_schema()
        .iter()
        .map(|k| {
            Ok(KeySchemaElement {
                attribute_name: k.attribute_name().to_string(),
                role: key_role_from_sdk(k.key_type())?,
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

    let projection = match index.projection() {
        Some(p) => match p.projection_type() {
            Some(pt) => Some(Projection {
                projection_type: projection_type_from_sdk(pt)?,
                non_key_attributes: p.non_key_attributes().to_vec(),
            }),
            None => None,
        },
        None => None,
    };

    let throughput = index.provisioned_throughput().and_then(|t| {
        let read = t.read_capacity_units().unwrap_or(0);
        let write = t.write_capacity_units().unwrap_or(0);
        if read == 0 && write == 0 {
            None
        } else {
            Some(Throughput {
                read_capacity_units: read,
                write_capacity_units: write,
            })
        }
    });

    let status = index.index_status().map(index_status_from_sdk).transpose()?;

    Ok(IndexDescription {
        name: index.index_name().unwrap_or_default().to_string(),
        arn: index.index_arn().map(|s| s.to_string()),
        key_schema,
        projection,
        throughput,
        status,
    })
}

pub fn table_from_sdk(table: &sdk::TableDescription) -> Result<TableDescription, StoreError> {
    let attribute_definitions = table
        .attribute_definitions()
        .iter()
        .map(|d| {
            Ok(AttributeDefinition::new(
                d.attribute_name(),
                scalar_type_from_sdk(d.attribute_type())?,
            ))
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

    let indexes = table
        .global_secondary_indexes()
        .iter()
        .map(index_from_sdk)
        .collect::<Result<Vec<_>, StoreError>>()?;

    Ok(TableDescription {
        name: table.table_name().unwrap_or_default().to_string(),
        status: table.table_status().map(|s| s.as_str().to_string()),
        attribute_definitions,
        indexes,
    })
}

// ========== STORE -> SDK ==========

pub fn scalar_type_to_sdk(value: ScalarType) -> sdk::ScalarAttributeType {
    match value {
        ScalarType::String => sdk::ScalarAttributeType::S,
        ScalarType::Number => sdk::ScalarAttributeType::N,
        ScalarType::Binary => sdk::ScalarAttributeType::B,
    }
}

pub fn projection_type_to_sdk(value: ProjectionType) -> sdk::ProjectionType {
    match value {
        ProjectionType::All => sdk::ProjectionType::All,
        ProjectionType::KeysOnly => sdk::ProjectionType::KeysOnly,
        ProjectionType::Include => sdk::ProjectionType::Include,
    }
}

pub fn attribute_definition_to_sdk(
    def: &AttributeDefinition,
) -> Result<sdk::AttributeDefinition, StoreError> {
    sdk::AttributeDefinition::builder()
        .attribute_name(&def.name)
        .attribute_type(scalar_type_to_sdk(def.scalar_type))
        .build()
        .map_err(|e| build_failed("attribute definition", e))
}

fn key_schema_to_sdk(key: &KeySchemaElement) -> Result<sdk::KeySchemaElement, StoreError> {
    let key_type = match key.role {
        KeyRole::Hash => sdk::KeyType::Hash,
        KeyRole::Range => sdk::KeyType::Range,
    };
    sdk::KeySchemaElement::builder()
        .attribute_name(&key.attribute_name)
        .key_type(key_type)
        .build()
        .map_err(|e| build_failed("key schema", e))
}

fn projection_to_sdk(projection: &Projection) -> sdk::Projection {
    let non_key_attributes = if projection.non_key_attributes.is_empty() {
        None
    } else {
        Some(projection.non_key_attributes.clone())
    };
    sdk::Projection::builder()
        .projection_type(projection_type_to_sdk(projection.projection_type))
        .set_non_key_attributes(non_key_attributes)
        .build()
}

fn throughput_to_sdk(throughput: Throughput) -> Result<sdk::ProvisionedThroughput, StoreError> {
    sdk::ProvisionedThroughput::builder()
        .read_capacity_units(throughput.read_capacity_units)
        .write_capacity_units(throughput.write_capacity_units)
        .build()
        .map_err(|e| build_failed("provisioned throughput", e))
}

fn create_action_to_sdk(
    action: &CreateIndexAction,
) -> Result<sdk::CreateGlobalSecondaryIndexAction, StoreError> {
    let key_schema = action
        .key_schema
        .iter()
        .map(key_schema_to_sdk)
        .collect::<Result<Vec<_>, StoreError>>()?;
    let throughput = action.throughput.map(throughput_to_sdk).transpose()?;

    sdk::CreateGlobalSecondaryIndexAction::builder()
        .index_name(&action.index_name)
        .set_key_schema(Some(key_schema))
        .projection(projection_to_sdk(&action.projection))
        .set_provisioned_throughput(throughput)
        .build()
        .map_err(|e| build_failed("create index action", e))
}

/// Build the single GSI update carried by an UpdateTable request.
pub fn index_update_to_sdk(
    update: &IndexUpdate,
) -> Result<sdk::GlobalSecondaryIndexUpdate, StoreError> {
    let builder = sdk::GlobalSecondaryIndexUpdate::builder();
    let builder = match update {
        IndexUpdate::Create(action) => builder.create(create_action_to_sdk(action)?),
        IndexUpdate::Update(action) => builder.update(
            sdk::UpdateGlobalSecondaryIndexAction::builder()
                .index_name(&action.index_name)
                .provisioned_throughput(throughput_to_sdk(action.throughput)?)
                .build()
                .map_err(|e| build_failed("update index action", e))?,
        ),
        IndexUpdate::Delete { index_name } => builder.delete(
            sdk::DeleteGlobalSecondaryIndexAction::builder()
                .index_name(index_name)
                .build()
                .map_err(|e| build_failed("delete index action", e))?,
        ),
    };
    Ok(builder.build())
}
