//! Merge of index key attributes into the table's attribute definitions.
//!
//! Attribute definitions belong to the table and are shared by all of its
//! indexes. An index may append a definition for a new attribute or reuse a
//! matching one; it never rewrites an existing binding.

use crate::errors::GsiError;
use crate::store::AttributeDefinition;
use crate::types::{KeyRole, ScalarType};

/// Key attribute an index wants defined on its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyAttribute<'a> {
    pub name: &'a str,
    pub scalar_type: ScalarType,
    pub role: KeyRole,
}

/// Outcome of a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledDefinitions {
    /// Full list to send with UpdateTable: existing entries first, then additions.
    pub definitions: Vec<AttributeDefinition>,
    /// Entries appended by this reconciliation.
    pub staged: Vec<AttributeDefinition>,
}

/// Look up the type bound to `name`, if any.
pub fn attribute_type(definitions: &[AttributeDefinition], name: &str) -> Option<ScalarType> {
    definitions
        .iter()
        .find(|d| d.name == name)
        .map(|d| d.scalar_type)
}

/// Reconcile key attributes against the table's current definitions.
///
/// Keys are checked in order against the growing list, so a hash and range
/// key sharing a name with different types also conflict.
pub fn reconcile_attribute_definitions(
    existing: &[AttributeDefinition],
    keys: &[KeyAttribute<'_>],
) -> Result<ReconciledDefinitions, GsiError> {
    let mut definitions = existing.to_vec();
    let mut staged = Vec::new();

    for key in keys {
        match attribute_type(&definitions, key.name) {
            None => {
                let def = AttributeDefinition::new(key.name, key.scalar_type);
                definitions.push(def.clone());
                staged.push(def);
            }
            Some(current) if current != key.scalar_type => {
                return Err(GsiError::Conflict {
                    attribute: key.name.to_string(),
                    role: key.role,
                    existing: current,
                    requested: key.scalar_type,
                });
            }
            Some(_) => {}
        }
    }

    Ok(ReconciledDefinitions {
        definitions,
        staged,
    })
}
