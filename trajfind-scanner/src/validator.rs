use serde_json::Value;

pub const ID_FIELD: &str = "uuid";
pub const STEPS_FIELD: &str = "steps";

/// Structural check for a trajectory payload.
///
/// Only the presence of both keys matters; their values may be anything,
/// including `null`. Arrays and primitives are never trajectories.
pub fn is_valid_trajectory(candidate: &Value) -> bool {
    candidate
        .as_object()
        .is_some_and(|map| map.contains_key(ID_FIELD) && map.contains_key(STEPS_FIELD))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_minimal_record() {
        assert!(is_valid_trajectory(&json!({"uuid": "x", "steps": []})));
    }

    #[test]
    fn test_field_types_are_unconstrained() {
        assert!(is_valid_trajectory(&json!({"uuid": null, "steps": "not a list"})));
        assert!(is_valid_trajectory(&json!({"uuid": 7, "steps": {}, "extra": true})));
    }

    #[test]
    fn test_missing_fields() {
        assert!(!is_valid_trajectory(&json!({"uuid": "x"})));
        assert!(!is_valid_trajectory(&json!({"steps": []})));
        assert!(!is_valid_trajectory(&json!({})));
    }

    #[test]
    fn test_non_objects_rejected() {
        assert!(!is_valid_trajectory(&json!(null)));
        assert!(!is_valid_trajectory(&json!("uuid steps")));
        assert!(!is_valid_trajectory(&json!(42)));
        assert!(!is_valid_trajectory(&json!(["uuid", "steps"])));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let inputs = [
            json!({"uuid": "x", "steps": []}),
            json!({"uuid": "x"}),
            json!([1, 2]),
        ];
        for input in &inputs {
            assert_eq!(is_valid_trajectory(input), is_valid_trajectory(input));
        }
    }
}
