use super::*;

/// One line of the Stratum wire protocol: either a request/notification
/// (carries a `method`) or a response to a previously sent request (carries
/// `result`/`error`). Notifications are requests with `id: null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request {
        id: Option<Value>,
        method: String,
        params: Value,
    },
    Response {
        id: Value,
        result: Value,
        error: Option<Value>,
    },
}

impl Message {
    pub fn request(id: Option<Value>, method: impl Into<String>, params: Value) -> Self {
        Message::Request {
            id,
            method: method.into(),
            params,
        }
    }

    pub fn encode(&self) -> Result<String> {
        let value = match self {
            Message::Request { id, method, params } => serde_json::json!({
                "id": id,
                "method": method,
                "params": params,
            }),
            Message::Response { id, result, error } => serde_json::json!({
                "id": id,
                "result": result,
                "error": error,
            }),
        };

        serde_json::to_string(&value).map_err(|source| Error::Malformed {
            reason: source.to_string(),
        })
    }

    pub fn decode(line: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(line.trim()).map_err(|source| Error::Malformed {
            reason: source.to_string(),
        })?;

        let object = value.as_object().ok_or_else(|| Error::Malformed {
            reason: "top-level JSON value is not an object".into(),
        })?;

        if let Some(method) = object.get("method").and_then(Value::as_str) {
            return Ok(Message::Request {
                id: object.get("id").cloned(),
                method: method.to_string(),
                params: object.get("params").cloned().unwrap_or(Value::Null),
            });
        }

        if object.contains_key("result") || object.contains_key("error") {
            return Ok(Message::Response {
                id: object.get("id").cloned().unwrap_or(Value::Null),
                result: object.get("result").cloned().unwrap_or(Value::Null),
                error: object.get("error").cloned().filter(|v| !v.is_null()),
            });
        }

        Err(Error::Malformed {
            reason: "message has neither `method` nor `result`/`error`".into(),
        })
    }
}

/// Recursively locates a `mining.notify` descriptor tuple inside an
/// arbitrary JSON value, up to [`MAX_NOTIFY_SEARCH_DEPTH`] levels of
/// nesting: an array whose first element is the literal string
/// `"mining.notify"`, e.g. an entry of a `mining.subscribe` response's
/// subscriptions list (`[["mining.notify", "subid"], ...]`). Returns the
/// whole matching array, or `None` if no such array exists at any depth.
pub fn find_notify(value: &Value) -> Option<&Value> {
    find_notify_at_depth(value, 0)
}

fn find_notify_at_depth(value: &Value, depth: usize) -> Option<&Value> {
    if depth > MAX_NOTIFY_SEARCH_DEPTH {
        return None;
    }

    match value {
        Value::Array(items) => {
            if items.first() == Some(&Value::String("mining.notify".to_string())) {
                return Some(value);
            }
            items.iter().find_map(|v| find_notify_at_depth(v, depth + 1))
        }
        Value::Object(map) => map.values().find_map(|v| find_notify_at_depth(v, depth + 1)),
        _ => None,
    }
}
