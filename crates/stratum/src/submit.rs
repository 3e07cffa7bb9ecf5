use super::*;

/// A `mining.submit` request:
/// `params: [username, job_id, extranonce2, ntime, nonce]`.
/// The generator forwards shares upstream and surfaces the accept/reject
/// result; it never verifies proof of work itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Submit {
    pub username: Username,
    pub job_id: JobId,
    pub extranonce2: Extranonce,
    pub ntime: Ntime,
    pub nonce: String,
}

impl Submit {
    pub fn to_params(&self) -> Value {
        serde_json::json!([
            self.username.as_str(),
            self.job_id.to_string(),
            self.extranonce2.to_string(),
            self.ntime.to_string(),
            self.nonce,
        ])
    }

    pub fn from_params(params: &Value) -> Result<Self> {
        let (username, job_id, extranonce2, ntime, nonce) =
            serde_json::from_value::<(String, String, String, String, String)>(params.clone())
                .map_err(|source| Error::Malformed {
                    reason: format!("bad mining.submit params: {source}"),
                })?;

        Ok(Self {
            username: username.parse()?,
            job_id: job_id.parse()?,
            extranonce2: extranonce2.parse()?,
            ntime: ntime.parse()?,
            nonce,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Submit {
        Submit {
            username: "bc1qexample.worker1".parse().unwrap(),
            job_id: "bf".parse().unwrap(),
            extranonce2: "deadbeef".parse().unwrap(),
            ntime: "504e86b9".parse().unwrap(),
            nonce: "0000af3c".into(),
        }
    }

    #[test]
    fn roundtrips_through_params() {
        let submit = sample();
        let params = submit.to_params();
        let back = Submit::from_params(&params).unwrap();
        assert_eq!(submit, back);
    }

    #[test]
    fn rejects_wrong_arity() {
        assert!(Submit::from_params(&serde_json::json!(["only", "three", "fields"])).is_err());
    }

    #[test]
    fn rejects_bad_job_id() {
        let mut params = sample().to_params();
        params[1] = Value::String("not-hex".into());
        assert!(Submit::from_params(&params).is_err());
    }
}
