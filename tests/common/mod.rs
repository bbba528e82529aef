//! In-memory `TableStore` with scripted index status transitions.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use dynamo_gsi::store::{
    AttributeDefinition, IndexDescription, IndexUpdate, TableDescription, UpdateTableRequest,
};
use dynamo_gsi::{
    BillingMode, ControllerSettings, IndexSpec, IndexStatus, PollSettings, ProjectionType,
    ScalarType, StoreError, StoreErrorKind, TableStore, Timeouts,
};

/// What the next describe of an index reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Status(IndexStatus),
    Gone,
}

struct FakeIndex {
    description: IndexDescription,
    script: VecDeque<Step>,
}

struct FakeTable {
    attribute_definitions: Vec<AttributeDefinition>,
    indexes: Vec<FakeIndex>,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<String, FakeTable>,
    updates: Vec<UpdateTableRequest>,
    describes: usize,
    create_script: Vec<Step>,
    update_script: Vec<Step>,
    delete_script: Vec<Step>,
    update_error: Option<StoreError>,
}

pub struct FakeStore {
    inner: Mutex<Inner>,
}

impl FakeStore {
    /// Store where creates, updates and deletes settle on the first poll.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                create_script: vec![Step::Status(IndexStatus::Active)],
                update_script: vec![Step::Status(IndexStatus::Active)],
                delete_script: vec![Step::Gone],
                ..Default::default()
            }),
        }
    }

    pub fn with_table(self, name: &str, definitions: &[(&str, ScalarType)]) -> Self {
        self.inner.lock().unwrap().tables.insert(
            name.to_string(),
            FakeTable {
                attribute_definitions: definitions
                    .iter()
                    .map(|(n, t)| AttributeDefinition::new(*n, *t))
                    .collect(),
                indexes: Vec::new(),
            },
        );
        self
    }

    /// Seed an existing ACTIVE index and its key definitions.
    pub fn with_index(self, table: &str, description: IndexDescription) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            let t = inner.tables.get_mut(table).expect("table must exist");
            t.indexes.push(FakeIndex {
                description,
                script: VecDeque::new(),
            });
        }
        self
    }

    pub fn with_create_script(self, script: &[Step]) -> Self {
        self.inner.lock().unwrap().create_script = script.to_vec();
        self
    }

    pub fn with_update_script(self, script: &[Step]) -> Self {
        self.inner.lock().unwrap().update_script = script.to_vec();
        self
    }

    pub fn with_delete_script(self, script: &[Step]) -> Self {
        self.inner.lock().unwrap().delete_script = script.to_vec();
        self
    }

    /// Fail every UpdateTable with `error`.
    pub fn failing_updates(self, error: StoreError) -> Self {
        self.inner.lock().unwrap().update_error = Some(error);
        self
    }

    pub fn updates(&self) -> Vec<UpdateTableRequest> {
        self.inner.lock().unwrap().updates.clone()
    }

    pub fn describe_count(&self) -> usize {
        self.inner.lock().unwrap().describes
    }

    pub fn attribute_definitions(&self, table: &str) -> Vec<AttributeDefinition> {
        self.inner.lock().unwrap().tables[table]
            .attribute_definitions
            .clone()
    }

    pub fn index(&self, table: &str, index: &str) -> Option<IndexDescription> {
        self.inner.lock().unwrap().tables[table]
            .indexes
            .iter()
            .find(|i| i.description.name == index)
            .map(|i| i.description.clone())
    }

    pub fn remove_index(&self, table: &str, index: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(t) = inner.tables.get_mut(table) {
            t.indexes.retain(|i| i.description.name != index);
        }
    }
}

fn table_not_found(table: &str) -> StoreError {
    StoreError::not_found(format!("Table '{}' not found", table))
}

impl TableStore for FakeStore {
    fn describe_table(&self, table_name: &str) -> Result<TableDescription, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.describes += 1;
        let table = inner
            .tables
            .get_mut(table_name)
            .ok_or_else(|| table_not_found(table_name))?;

        table.indexes.retain_mut(|index| match index.script.pop_front() {
            Some(Step::Gone) => false,
            Some(Step::Status(status)) => {
                index.description.status = Some(status);
                true
            }
            None => true,
        });

        Ok(TableDescription {
            name: table_name.to_string(),
            status: Some("ACTIVE".to_string()),
            attribute_definitions: table.attribute_definitions.clone(),
            indexes: table.indexes.iter().map(|i| i.description.clone()).collect(),
        })
    }

    fn update_table(&self, request: UpdateTableRequest) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.updates.push(request.clone());
        if let Some(err) = inner.update_error.clone() {
            return Err(err);
        }

        let create_script = inner.create_script.clone();
        let update_script = inner.update_script.clone();
        let delete_script = inner.delete_script.clone();
        let table = inner
            .tables
            .get_mut(&request.table_name)
            .ok_or_else(|| table_not_found(&request.table_name))?;
        let index_missing = |name: &str| {
            StoreError::not_found(format!(
                "Requested resource not found: Index: {} not found",
                name
            ))
        };

        match request.index_update {
            IndexUpdate::Create(action) => {
                if table.indexes.iter().any(|i| i.description.name == action.index_name) {
                    return Err(StoreError::new(
                        StoreErrorKind::Validation,
                        format!("Index {} already exists", action.index_name),
                    ));
                }
                if let Some(defs) = request.attribute_definitions {
                    table.attribute_definitions = defs;
                }
                table.indexes.push(FakeIndex {
                    description: IndexDescription {
                        name: action.index_name.clone(),
                        arn: Some(format!(
                            "arn:aws:dynamodb:us-east-1:000000000000:table/{}/index/{}",
                            request.table_name, action.index_name
                        )),
                        key_schema: action.key_schema,
                        projection: Some(action.projection),
                        throughput: action.throughput,
                        status: Some(IndexStatus::Creating),
                    },
                    script: create_script.into(),
                });
            }
            IndexUpdate::Update(action) => {
                let index = table
                    .indexes
                    .iter_mut()
                    .find(|i| i.description.name == action.index_name)
                    .ok_or_else(|| index_missing(&action.index_name))?;
                index.description.throughput = Some(action.throughput);
                index.description.status = Some(IndexStatus::Updating);
                index.script = update_script.into();
            }
            IndexUpdate::Delete { index_name } => {
                let index = table
                    .indexes
                    .iter_mut()
                    .find(|i| i.description.name == index_name)
                    .ok_or_else(|| index_missing(&index_name))?;
                index.description.status = Some(IndexStatus::Deleting);
                index.script = delete_script.into();
            }
        }
        Ok(())
    }
}

/// Settings that never sleep between polls.
pub fn fast_settings() -> ControllerSettings {
    ControllerSettings {
        auto_import: false,
        timeouts: Timeouts {
            create: Duration::from_secs(5),
            update: Duration::from_secs(5),
            delete: Duration::from_secs(5),
        },
        poll: PollSettings::immediate(),
    }
}

pub fn provisioned_spec() -> IndexSpec {
    IndexSpec {
        table_name: "orders".into(),
        name: "by_customer".into(),
        hash_key: "customer_id".into(),
        hash_key_type: ScalarType::String,
        range_key: Some("created_at".into()),
        range_key_type: Some(ScalarType::Number),
        projection_type: ProjectionType::Include,
        non_key_attributes: BTreeSet::from(["total".to_string()]),
        billing_mode: BillingMode::Provisioned,
        read_capacity: Some(5),
        write_capacity: Some(5),
        autoscaling_enabled: false,
    }
}

pub fn on_demand_spec() -> IndexSpec {
    IndexSpec {
        projection_type: ProjectionType::KeysOnly,
        non_key_attributes: BTreeSet::new(),
        billing_mode: BillingMode::PayPerRequest,
        read_capacity: None,
        write_capacity: None,
        ..provisioned_spec()
    }
}

pub fn orders_store() -> FakeStore {
    FakeStore::new().with_table("orders", &[("order_id", ScalarType::String)])
}
