use proptest::prelude::*;
use sdk::errors::{EngineError, EngineErrorExt};
use sdk::types::{Observation, ToolInput};

// Every error carries a static, non-empty hint that never echoes the raw message
proptest! {
    #[test]
    fn test_error_user_hint_completeness(error_str in "[0-9]{4,8}\\PC{0,16}") {
        let errs = vec![
            EngineError::Config(error_str.clone()),
            EngineError::ToolNotFound(error_str.clone()),
            EngineError::ToolError(error_str.clone()),
            EngineError::Reasoning(error_str.clone()),
            EngineError::Planning(error_str.clone()),
            EngineError::Memory(error_str.clone()),
            EngineError::RoleNotFound(error_str.clone()),
            EngineError::SubtaskTimeout { subtask_id: error_str.clone(), timeout_ms: 1 },
        ];

        for err in errs {
            let hint = err.user_hint();
            prop_assert!(!hint.is_empty());
            prop_assert!(!hint.contains(error_str.as_str()));
        }
    }
}

// Observations keep their status tag when serialized to JSON
proptest! {
    #[test]
    fn test_observation_status_tag(tool in "[a-z]{1,12}", msg in "[a-zA-Z0-9 ]{0,40}", ok in any::<bool>()) {
        let obs = if ok {
            Observation::success(tool.clone(), serde_json::json!({ "result": msg.clone() }))
        } else {
            Observation::error(tool.clone(), msg.clone())
        };

        let value = obs.to_value();
        prop_assert_eq!(value["status"].as_str(), Some(if ok { "success" } else { "error" }));
        prop_assert_eq!(value["tool"].as_str(), Some(tool.as_str()));

        let parsed: Observation = serde_json::from_value(value).unwrap();
        prop_assert_eq!(parsed, obs);
    }
}

// Object inputs map one-to-one onto the parameter map
proptest! {
    #[test]
    fn test_tool_input_from_object(keys in prop::collection::hash_set("[a-z]{1,8}", 0..6)) {
        let mut map = serde_json::Map::new();
        for (i, key) in keys.iter().enumerate() {
            map.insert(key.clone(), serde_json::json!(i));
        }

        let input = ToolInput::from_value(serde_json::Value::Object(map.clone()));
        prop_assert_eq!(input.params.len(), keys.len());
        prop_assert_eq!(input.to_value(), serde_json::Value::Object(map));
    }
}
