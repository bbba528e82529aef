//! DynamoDB client module.
//!
//! Builds the AWS SDK client from a [`ProviderConfig`] and exposes it as a
//! blocking [`TableStore`]. Supports multiple credential sources:
//! - Hardcoded credentials
//! - AWS profiles
//! - The default chain (environment variables, instance profile, etc.)
//!
//! An optional IAM role is assumed on top of whichever source resolves.

use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_config::sts::AssumeRoleProvider;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::retry::RetryConfig;
use aws_sdk_dynamodb::config::timeout::TimeoutConfig;
use aws_sdk_dynamodb::config::{Credentials, Region};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::debug;

use crate::conversions::{attribute_definition_to_sdk, index_update_to_sdk, table_from_sdk};
use crate::errors::{GsiError, StoreError, map_sdk_error};
use crate::store::{TableDescription, TableStore, UpdateTableRequest};

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_ROLE_SESSION_NAME: &str = "dynamo-gsi";

/// Provider-level configuration, usually deserialized from the front-end's
/// provider block and completed from the environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub session_token: Option<String>,
    pub profile: Option<String>,
    /// Custom endpoint for DynamoDB Local or LocalStack.
    pub endpoint_url: Option<String>,
    pub role_arn: Option<String>,
    pub role_session_name: Option<String>,
    /// Seconds.
    pub connect_timeout: Option<f64>,
    /// Seconds.
    pub read_timeout: Option<f64>,
    pub max_retries: Option<u32>,
    /// Adopt an existing index of the same name instead of creating it.
    pub auto_import: bool,
    /// Seconds.
    pub create_timeout: Option<u64>,
    /// Seconds.
    pub update_timeout: Option<u64>,
    /// Seconds.
    pub delete_timeout: Option<u64>,
    pub poll_min_interval_ms: Option<u64>,
    pub poll_max_interval_ms: Option<u64>,
}

impl ProviderConfig {
    /// Configuration taken entirely from the process environment.
    pub fn from_env() -> Self {
        Self::default().with_env_defaults(|key| std::env::var(key).ok())
    }

    /// Fill every unset field from `lookup`, which maps environment variable
    /// names to values.
    pub fn with_env_defaults<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        self.access_key = self.access_key.or_else(|| get("AWS_ACCESS_KEY_ID"));
        self.secret_key = self.secret_key.or_else(|| get("AWS_SECRET_ACCESS_KEY"));
        self.session_token = self.session_token.or_else(|| get("AWS_SESSION_TOKEN"));
        self.profile = self.profile.or_else(|| get("AWS_PROFILE"));
        self.endpoint_url = self
            .endpoint_url
            .or_else(|| get("AWS_DYNAMODB_ENDPOINT"));
        self.region = self
            .region
            .or_else(|| get("AWS_REGION"))
            .or_else(|| get("AWS_DEFAULT_REGION"))
            .or_else(|| Some(DEFAULT_REGION.to_string()));
        self
    }
}

/// Build the AWS SDK DynamoDB client with the given configuration.
async fn build_client(config: &ProviderConfig) -> Result<Client, GsiError> {
    // Region priority: config > env var > default
    let region_provider = RegionProviderChain::first_try(config.region.clone().map(Region::new))
        .or_default_provider()
        .or_else(DEFAULT_REGION);

    let mut config_loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);

    // Credentials priority: hardcoded > profile > env/default chain
    if let (Some(ak), Some(sk)) = (&config.access_key, &config.secret_key) {
        let creds = Credentials::new(
            ak,
            sk,
            config.session_token.clone(),
            None,
            "dynamo-gsi-hardcoded",
        );
        config_loader = config_loader.credentials_provider(creds);
    } else if let Some(profile_name) = &config.profile {
        let profile_provider = ProfileFileCredentialsProvider::builder()
            .profile_name(profile_name)
            .build();
        config_loader = config_loader.credentials_provider(profile_provider);
    }

    let sdk_config = config_loader.load().await;
    let mut dynamo_config = aws_sdk_dynamodb::config::Builder::from(&sdk_config);

    if let Some(role_arn) = &config.role_arn {
        let session_name = config
            .role_session_name
            .clone()
            .unwrap_or_else(|| DEFAULT_ROLE_SESSION_NAME.to_string());
        let provider = AssumeRoleProvider::builder(role_arn)
            .session_name(session_name)
            .configure(&sdk_config)
            .build()
            .await;
        dynamo_config = dynamo_config.credentials_provider(provider);
    }

    if let Some(url) = &config.endpoint_url {
        dynamo_config = dynamo_config.endpoint_url(url);
    }

    if config.connect_timeout.is_some() || config.read_timeout.is_some() {
        let mut timeouts = TimeoutConfig::builder();
        if let Some(secs) = config.connect_timeout {
            timeouts = timeouts.connect_timeout(seconds(secs, "connect_timeout")?);
        }
        if let Some(secs) = config.read_timeout {
            timeouts = timeouts.read_timeout(seconds(secs, "read_timeout")?);
        }
        dynamo_config = dynamo_config.timeout_config(timeouts.build());
    }

    if let Some(max_retries) = config.max_retries {
        dynamo_config =
            dynamo_config.retry_config(RetryConfig::standard().with_max_attempts(max_retries + 1));
    }

    Ok(Client::from_conf(dynamo_config.build()))
}

fn seconds(value: f64, field: &str) -> Result<Duration, GsiError> {
    Duration::try_from_secs_f64(value)
        .map_err(|e| GsiError::Client(format!("invalid {} ({}): {}", field, value, e)))
}

/// `TableStore` backed by the AWS SDK.
///
/// Each call blocks the calling thread on a Tokio runtime owned by the store.
#[derive(Clone)]
pub struct DynamoTableStore {
    client: Client,
    runtime: Arc<Runtime>,
}

impl DynamoTableStore {
    /// Build a client from `config` on a fresh runtime.
    pub fn connect(config: &ProviderConfig) -> Result<Self, GsiError> {
        let runtime = Runtime::new()
            .map_err(|e| GsiError::Client(format!("Failed to create tokio runtime: {}", e)))?;
        let client = runtime.block_on(build_client(config))?;

        Ok(Self {
            client,
            runtime: Arc::new(runtime),
        })
    }

    /// Wrap a pre-built client, e.g. one pointed at DynamoDB Local.
    pub fn from_client(client: Client, runtime: Arc<Runtime>) -> Self {
        Self { client, runtime }
    }
}

impl TableStore for DynamoTableStore {
    fn describe_table(&self, table_name: &str) -> Result<TableDescription, StoreError> {
        debug!(table = table_name, "DescribeTable");
        let client = self.client.clone();
        let result = self
            .runtime
            .block_on(async { client.describe_table().table_name(table_name).send().await });

        match result {
            Ok(output) => match output.table() {
                Some(table) => table_from_sdk(table),
                None => Err(StoreError::not_found(format!(
                    "Table '{}' not found",
                    table_name
                ))),
            },
            Err(e) => Err(map_sdk_error(e, Some(table_name))),
        }
    }

    fn update_table(&self, request: UpdateTableRequest) -> Result<(), StoreError> {
        debug!(table = %request.table_name, update = ?request.index_update, "UpdateTable");
        let attribute_definitions = request
            .attribute_definitions
            .as_ref()
            .map(|defs| {
                defs.iter()
                    .map(attribute_definition_to_sdk)
                    .collect::<Result<Vec<_>, StoreError>>()
            })
            .transpose()?;
        let index_update = index_update_to_sdk(&request.index_update)?;

        let client = self.client.clone();
        let result = self.runtime.block_on(async {
            client
                .update_table()
                .table_name(&request.table_name)
                .set_attribute_definitions(attribute_definitions)
                .global_secondary_index_updates(index_update)
                .send()
                .await
        });

        match result {
            Ok(_) => Ok(()),
            Err(e) => Err(map_sdk_error(e, Some(&request.table_name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn environment_fills_unset_fields() {
        let config = ProviderConfig::default().with_env_defaults(env(&[
            ("AWS_ACCESS_KEY_ID", "AKIA"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("AWS_DEFAULT_REGION", "eu-west-1"),
            ("AWS_DYNAMODB_ENDPOINT", "http://localhost:8000"),
        ]));

        assert_eq!(config.access_key.as_deref(), Some("AKIA"));
        assert_eq!(config.secret_key.as_deref(), Some("secret"));
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:8000"));
        assert!(config.profile.is_none());
    }

    #[test]
    fn explicit_values_win_over_environment() {
        let config = ProviderConfig {
            region: Some("ap-south-1".into()),
            profile: Some("ops".into()),
            ..Default::default()
        }
        .with_env_defaults(env(&[("AWS_REGION", "us-west-2"), ("AWS_PROFILE", "dev")]));

        assert_eq!(config.region.as_deref(), Some("ap-south-1"));
        assert_eq!(config.profile.as_deref(), Some("ops"));
    }

    #[test]
    fn region_defaults_when_nothing_is_set() {
        let config = ProviderConfig::default().with_env_defaults(env(&[("AWS_REGION", "")]));
        assert_eq!(config.region.as_deref(), Some(DEFAULT_REGION));
    }

    #[test]
    fn deserializes_partial_provider_block() {
        let config: ProviderConfig = serde_json::from_str(
            r#"{"auto_import": true, "role_arn": "arn:aws:iam::1:role/ops", "create_timeout": 60}"#,
        )
        .unwrap();
        assert!(config.auto_import);
        assert_eq!(config.create_timeout, Some(60));
        assert!(config.region.is_none());
    }

    #[test]
    fn negative_timeout_is_rejected() {
        assert!(seconds(-1.0, "read_timeout").is_err());
        assert_eq!(seconds(1.5, "read_timeout").unwrap(), Duration::from_millis(1500));
    }
}
