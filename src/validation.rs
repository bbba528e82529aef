//! Boundary validation for index specs.
//!
//! Everything here is pure and runs before any remote call.

use crate::errors::GsiError;
use crate::model::{ID_DELIMITER, IndexSpec};
use crate::types::{BillingMode, ProjectionType};

/// Enforce the billing-mode/capacity/autoscaling rules.
///
/// Unset capacities count as zero.
pub fn validate_billing_mode(
    billing_mode: BillingMode,
    read_capacity: Option<i64>,
    write_capacity: Option<i64>,
    autoscaling_enabled: bool,
) -> Result<(), GsiError> {
    let read = read_capacity.unwrap_or(0);
    let write = write_capacity.unwrap_or(0);

    match billing_mode {
        BillingMode::PayPerRequest => {
            if read != 0 || write != 0 {
                return Err(GsiError::validation(
                    "read_capacity / write_capacity must not be set for billing_mode = PAY_PER_REQUEST",
                ));
            }
            if autoscaling_enabled {
                return Err(GsiError::validation(
                    "autoscaling cannot be enabled with billing_mode = PAY_PER_REQUEST",
                ));
            }
        }
        BillingMode::Provisioned => {
            if read == 0 || write == 0 {
                return Err(GsiError::validation(
                    "read_capacity / write_capacity must be set to a value >= 1 for billing_mode = PROVISIONED",
                ));
            }
        }
    }
    Ok(())
}

fn validate_name(field: &str, value: &str) -> Result<(), GsiError> {
    if value.is_empty() {
        return Err(GsiError::validation(format!("{} must not be empty", field)));
    }
    if value.contains(ID_DELIMITER) {
        return Err(GsiError::validation(format!(
            "{} '{}' must not contain '{}'",
            field, value, ID_DELIMITER
        )));
    }
    Ok(())
}

/// Full structural + billing validation of a declared spec.
pub fn validate_spec(spec: &IndexSpec) -> Result<(), GsiError> {
    validate_name("table_name", &spec.table_name)?;
    validate_name("name", &spec.name)?;

    if spec.hash_key.is_empty() {
        return Err(GsiError::validation("hash_key must not be empty"));
    }

    match (&spec.range_key, spec.range_key_type) {
        (Some(key), _) if key.is_empty() => {
            return Err(GsiError::validation("range_key must not be empty"));
        }
        (Some(_), None) => return Err(GsiError::validation("Missing range_key_type")),
        (None, Some(_)) => {
            return Err(GsiError::validation(
                "range_key_type is set but range_key is not",
            ));
        }
        _ => {}
    }

    match spec.projection_type {
        ProjectionType::Include if spec.non_key_attributes.is_empty() => {
            return Err(GsiError::validation(
                "non_key_attributes is required for projection_type = INCLUDE",
            ));
        }
        ProjectionType::All | ProjectionType::KeysOnly if !spec.non_key_attributes.is_empty() => {
            return Err(GsiError::validation(format!(
                "non_key_attributes can only be set for projection_type = INCLUDE, not {}",
                spec.projection_type
            )));
        }
        _ => {}
    }

    for (field, value) in [
        ("read_capacity", spec.read_capacity),
        ("write_capacity", spec.write_capacity),
    ] {
        if let Some(v) = value
            && v < 0
        {
            return Err(GsiError::validation(format!(
                "{} must be >= 0, got {}",
                field, v
            )));
        }
    }

    validate_billing_mode(
        spec.billing_mode,
        spec.read_capacity,
        spec.write_capacity,
        spec.autoscaling_enabled,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScalarType;
    use std::collections::BTreeSet;

    fn spec() -> IndexSpec {
        IndexSpec {
            table_name: "orders".into(),
            name: "by_customer".into(),
            hash_key: "customer_id".into(),
            hash_key_type: ScalarType::String,
            range_key: None,
            range_key_type: None,
            projection_type: ProjectionType::KeysOnly,
            non_key_attributes: BTreeSet::new(),
            billing_mode: BillingMode::Provisioned,
            read_capacity: Some(5),
            write_capacity: Some(5),
            autoscaling_enabled: false,
        }
    }

    #[test]
    fn on_demand_fails_iff_capacity_or_autoscaling() {
        for read in [None, Some(0), Some(3)] {
            for write in [None, Some(0), Some(3)] {
                for autoscaling in [false, true] {
                    let should_fail = read.unwrap_or(0) != 0
                        || write.unwrap_or(0) != 0
                        || autoscaling;
                    let result = validate_billing_mode(
                        BillingMode::PayPerRequest,
                        read,
                        write,
                        autoscaling,
                    );
                    assert_eq!(result.is_err(), should_fail, "{read:?} {write:?} {autoscaling}");
                }
            }
        }
    }

    #[test]
    fn provisioned_fails_iff_a_capacity_is_zero() {
        for read in [None, Some(0), Some(1)] {
            for write in [None, Some(0), Some(1)] {
                for autoscaling in [false, true] {
                    let should_fail = read.unwrap_or(0) == 0 || write.unwrap_or(0) == 0;
                    let result =
                        validate_billing_mode(BillingMode::Provisioned, read, write, autoscaling);
                    assert_eq!(result.is_err(), should_fail, "{read:?} {write:?} {autoscaling}");
                }
            }
        }
    }

    #[test]
    fn on_demand_capacity_is_checked_before_autoscaling() {
        let err = validate_billing_mode(BillingMode::PayPerRequest, Some(1), None, true)
            .unwrap_err()
            .to_string();
        assert!(err.contains("must not be set"));
    }

    #[test]
    fn valid_spec_passes() {
        assert!(validate_spec(&spec()).is_ok());
    }

    #[test]
    fn range_key_requires_type() {
        let mut s = spec();
        s.range_key = Some("created_at".into());
        let err = validate_spec(&s).unwrap_err();
        assert!(err.to_string().contains("Missing range_key_type"));

        s.range_key_type = Some(ScalarType::Number);
        assert!(validate_spec(&s).is_ok());
    }

    #[test]
    fn include_requires_non_key_attributes() {
        let mut s = spec();
        s.projection_type = ProjectionType::Include;
        assert!(validate_spec(&s).is_err());

        s.non_key_attributes.insert("total".into());
        assert!(validate_spec(&s).is_ok());

        s.projection_type = ProjectionType::All;
        assert!(validate_spec(&s).is_err());
    }

    #[test]
    fn names_may_not_contain_the_delimiter() {
        let mut s = spec();
        s.name = "by:customer".into();
        assert!(matches!(validate_spec(&s), Err(GsiError::Validation(_))));
    }

    #[test]
    fn negative_capacity_is_rejected() {
        let mut s = spec();
        s.read_capacity = Some(-1);
        assert!(validate_spec(&s).is_err());
    }
}
