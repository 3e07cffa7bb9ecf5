use super::*;

/// Stratum mining difficulty. The generator only tracks this value well
/// enough to detect changes and forward `mining.set_difficulty`; share
/// verification against it is the stratifier's job.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Difficulty(f64);

impl Difficulty {
    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(1.0)
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<f64> for Difficulty {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl Serialize for Difficulty {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        if self.0 < 1.0 {
            ser.serialize_f64(self.0)
        } else {
            ser.serialize_u64(self.0.floor() as u64)
        }
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Int(u64),
            Float(f64),
        }

        let value = match Wire::deserialize(de)? {
            Wire::Int(u) => u as f64,
            Wire::Float(x) => x,
        };

        if !value.is_finite() || value <= 0.0 {
            return Err(de::Error::custom("difficulty must be finite and > 0"));
        }

        Ok(Difficulty(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_sub_one_as_float() {
        let json = serde_json::to_string(&Difficulty::from(0.5)).unwrap();
        assert!(json.contains('.'));
    }

    #[test]
    fn serializes_whole_as_int() {
        let json = serde_json::to_string(&Difficulty::from(42.0)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn rejects_non_positive() {
        assert!(serde_json::from_str::<Difficulty>("0").is_err());
        assert!(serde_json::from_str::<Difficulty>("-1").is_err());
    }

    #[test]
    fn equality_detects_change() {
        let a = Difficulty::from(1024.0);
        let b = Difficulty::from(1024.0);
        let c = Difficulty::from(2048.0);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
