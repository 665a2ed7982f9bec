//! Raw tabular records, as handed over by whatever fetched the catalog.
//!
//! Every field is optional text. Documents produced by other systems are not
//! consistent about typing (`"10"` vs `10`, `"true"` vs `true`), so scalar
//! values of any kind are accepted and kept as their textual form. Validation
//! happens in the loader.

use serde::{Deserialize, Serialize};

/// One state row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    #[serde(default, alias = "workflowId", deserialize_with = "scalar_text")]
    pub workflow_id: Option<String>,

    #[serde(default, alias = "stateId", deserialize_with = "scalar_text")]
    pub state_id: Option<String>,

    #[serde(default, alias = "sortOrder", deserialize_with = "scalar_text")]
    pub sort_order: Option<String>,

    #[serde(default, alias = "validityToken", deserialize_with = "scalar_text")]
    pub validity_token: Option<String>,
}

impl StateRecord {
    pub fn new(workflow_id: &str, state_id: &str, sort_order: &str, validity_token: &str) -> Self {
        Self {
            workflow_id: Some(workflow_id.to_string()),
            state_id: Some(state_id.to_string()),
            sort_order: Some(sort_order.to_string()),
            validity_token: Some(validity_token.to_string()),
        }
    }
}

/// One transition row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    #[serde(default, alias = "workflowId", deserialize_with = "scalar_text")]
    pub workflow_id: Option<String>,

    #[serde(default, alias = "transitionId", deserialize_with = "scalar_text")]
    pub transition_id: Option<String>,

    #[serde(default, alias = "fromStateId", deserialize_with = "scalar_text")]
    pub from_state_id: Option<String>,

    #[serde(default, alias = "toStateId", deserialize_with = "scalar_text")]
    pub to_state_id: Option<String>,

    #[serde(default, alias = "isDefault", deserialize_with = "scalar_text")]
    pub is_default: Option<String>,
}

impl TransitionRecord {
    pub fn new(
        workflow_id: &str,
        transition_id: &str,
        from_state_id: &str,
        to_state_id: &str,
        is_default: Option<&str>,
    ) -> Self {
        Self {
            workflow_id: Some(workflow_id.to_string()),
            transition_id: Some(transition_id.to_string()),
            from_state_id: Some(from_state_id.to_string()),
            to_state_id: Some(to_state_id.to_string()),
            is_default: is_default.map(|s| s.to_string()),
        }
    }
}

fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct ScalarVisitor;

    impl<'de> Visitor<'de> for ScalarVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, number, boolean or null")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_char<E>(self, v: char) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            deserializer.deserialize_any(ScalarVisitor)
        }
    }

    deserializer.deserialize_any(ScalarVisitor)
}
