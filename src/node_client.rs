use {
    crate::settings::NodeEndpoint,
    anyhow::{bail, Context, Result},
    base64::{engine::general_purpose::STANDARD, Engine},
    serde_json::{json, Value},
};

/// The bitcoin-node adapter: a minimal JSON-RPC-over-HTTP client speaking
/// the capability surface a work generator needs (template fetch, tip and
/// height lookups, block submission, address validation). Raw HTTP with a
/// hand-built Basic-auth header, matching the wire handshake described for
/// this adapter rather than pulling in a heavier node RPC crate.
#[derive(Debug, Clone)]
pub struct NodeClient {
    base_url: String,
    auth_header: String,
    http: reqwest::Client,
}

impl NodeClient {
    pub fn new(endpoint: &NodeEndpoint) -> Self {
        Self {
            base_url: endpoint.base_url.clone(),
            auth_header: basic_auth_header(&endpoint.rpc_user, &endpoint.rpc_password),
            http: reqwest::Client::new(),
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let body = json!({
            "jsonrpc": "1.0",
            "id": "ckgen",
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.base_url)
            .header("Authorization", &self.auth_header)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("RPC call `{method}` to {} failed", self.base_url))?;

        let status = response.status();

        let payload: Value = response
            .json()
            .await
            .with_context(|| format!("RPC call `{method}` returned a non-JSON body"))?;

        extract_result(method, status.as_u16(), &payload)
    }

    pub async fn gen_gbtbase(&self) -> Result<Value> {
        self.call("getblocktemplate", json!([{ "rules": ["segwit"] }])).await
    }

    pub async fn get_bestblockhash(&self) -> Result<String> {
        self.call("getbestblockhash", json!([]))
            .await?
            .as_str()
            .map(str::to_string)
            .context("getbestblockhash did not return a string")
    }

    pub async fn get_blockcount(&self) -> Result<u64> {
        self.call("getblockcount", json!([]))
            .await?
            .as_u64()
            .context("getblockcount did not return an integer")
    }

    pub async fn get_blockhash(&self, height: u64) -> Result<String> {
        self.call("getblockhash", json!([height]))
            .await?
            .as_str()
            .map(str::to_string)
            .context("getblockhash did not return a string")
    }

    pub async fn submit_block(&self, block_hex: &str) -> Result<()> {
        let result = self.call("submitblock", json!([block_hex])).await?;
        if result.is_null() {
            Ok(())
        } else {
            bail!("submitblock rejected: {result}")
        }
    }

    pub async fn validate_address(&self, address: &str) -> Result<bool> {
        let result = self.call("validateaddress", json!([address])).await?;
        Ok(result.get("isvalid").and_then(Value::as_bool).unwrap_or(false))
    }
}

fn basic_auth_header(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

fn extract_result(method: &str, status: u16, payload: &Value) -> Result<Value> {
    if let Some(error) = payload.get("error").filter(|error| !error.is_null()) {
        bail!("RPC call `{method}` returned error: {error}");
    }

    if !(200..300).contains(&status) {
        bail!("RPC call `{method}` failed with HTTP status {status}");
    }

    Ok(payload.get("result").cloned().unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_auth_header_encodes_user_and_password() {
        let header = basic_auth_header("alice", "s3cret");
        assert_eq!(header, format!("Basic {}", STANDARD.encode("alice:s3cret")));
    }

    #[test]
    fn extracts_result_on_success() {
        let payload = json!({"result": {"height": 800000}, "error": null, "id": "ckgen"});
        let result = extract_result("getblockcount", 200, &payload).unwrap();
        assert_eq!(result["height"], 800000);
    }

    #[test]
    fn rejects_rpc_level_error_even_with_200_status() {
        let payload = json!({"result": null, "error": {"code": -5, "message": "not found"}});
        assert!(extract_result("getblockhash", 200, &payload).is_err());
    }

    #[test]
    fn rejects_non_2xx_http_status() {
        let payload = json!({"result": null, "error": null});
        assert!(extract_result("getblockcount", 401, &payload).is_err());
    }

    #[test]
    fn missing_result_field_defaults_to_null() {
        let payload = json!({"error": null});
        let result = extract_result("submitblock", 200, &payload).unwrap();
        assert!(result.is_null());
    }
}
