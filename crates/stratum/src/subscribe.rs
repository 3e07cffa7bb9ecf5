use super::*;

/// A `mining.subscribe` request: `params: [user_agent?, session_id?]`.
/// Session id is the resume token offered by a server that supports
/// extranonce subscription resumption.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Subscribe {
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
}

impl Subscribe {
    pub fn new(user_agent: Option<String>, session_id: Option<String>) -> Self {
        Self {
            user_agent,
            session_id,
        }
    }

    pub fn to_params(&self) -> Value {
        match (&self.user_agent, &self.session_id) {
            (Some(agent), Some(session)) => serde_json::json!([agent, session]),
            (Some(agent), None) => serde_json::json!([agent]),
            (None, Some(session)) => serde_json::json!([Value::Null, session]),
            (None, None) => serde_json::json!([]),
        }
    }
}

/// The response to `mining.subscribe`:
/// `[[[subscription_type, subscription_id], ...], extranonce1, extranonce2_size]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscribeResponse {
    pub subscriptions: Vec<(String, String)>,
    pub extranonce1: Extranonce,
    pub extranonce2_size: usize,
}

impl SubscribeResponse {
    pub fn from_result(result: &Value) -> Result<Self> {
        let (subscriptions, extranonce1, extranonce2_size) =
            serde_json::from_value::<(Vec<(String, String)>, String, usize)>(result.clone())
                .map_err(|source| Error::Malformed {
                    reason: format!("bad mining.subscribe result: {source}"),
                })?;

        Ok(Self {
            subscriptions,
            extranonce1: extranonce1.parse()?,
            extranonce2_size,
        })
    }

    pub fn to_result(&self) -> Value {
        serde_json::json!([
            self.subscriptions,
            self.extranonce1.to_string(),
            self.extranonce2_size,
        ])
    }
}
