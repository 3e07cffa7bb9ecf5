use super::*;

/// A `mining.authorize` request: `params: [username, password]`.
/// Most upstreams ignore the password; it is still round-tripped verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Authorize {
    pub username: Username,
    pub password: String,
}

impl Authorize {
    pub fn new(username: Username, password: impl Into<String>) -> Self {
        Self {
            username,
            password: password.into(),
        }
    }

    pub fn to_params(&self) -> Value {
        serde_json::json!([self.username.as_str(), self.password])
    }

    pub fn from_params(params: &Value) -> Result<Self> {
        let (username, password) = serde_json::from_value::<(String, String)>(params.clone())
            .map_err(|source| Error::Malformed {
                reason: format!("bad mining.authorize params: {source}"),
            })?;

        Ok(Self {
            username: username.parse()?,
            password,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_params() {
        let authorize = Authorize::new("bc1qexample.worker1".parse().unwrap(), "x");
        let params = authorize.to_params();
        let back = Authorize::from_params(&params).unwrap();
        assert_eq!(authorize, back);
    }

    #[test]
    fn rejects_wrong_arity() {
        assert!(Authorize::from_params(&serde_json::json!(["only_one"])).is_err());
    }
}
