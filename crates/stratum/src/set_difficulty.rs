use super::*;

/// A `mining.set_difficulty` notification: `params: [difficulty]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetDifficulty {
    pub difficulty: Difficulty,
}

impl SetDifficulty {
    pub fn new(difficulty: Difficulty) -> Self {
        Self { difficulty }
    }

    pub fn to_params(self) -> Value {
        serde_json::json!([self.difficulty])
    }

    pub fn from_params(params: &Value) -> Result<Self> {
        let (difficulty,) = serde_json::from_value::<(Difficulty,)>(params.clone()).map_err(|source| {
            Error::Malformed {
                reason: format!("bad mining.set_difficulty params: {source}"),
            }
        })?;

        Ok(Self { difficulty })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_params() {
        let set = SetDifficulty::new(Difficulty::from(1024.0));
        let params = set.to_params();
        let back = SetDifficulty::from_params(&params).unwrap();
        assert_eq!(set, back);
    }

    #[test]
    fn rejects_non_positive_difficulty() {
        assert!(SetDifficulty::from_params(&serde_json::json!([0])).is_err());
    }
}
