use super::*;

/// Pool-assigned per-session extranonce1, or a miner/proxy-chosen
/// extranonce2. Stored as raw bytes; hex on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct Extranonce(Vec<u8>);

impl Extranonce {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    pub fn random(len: usize) -> Self {
        let mut bytes = vec![0u8; len];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for Extranonce {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl FromStr for Extranonce {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        snafu::ensure!(
            s.len() % 2 == 0,
            InvalidSnafu {
                field: "extranonce",
                reason: format!("odd-length hex string `{s}`"),
            }
        );
        let bytes = Vec::from_hex(s).context(HexSnafu { field: "extranonce" })?;
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips() {
        let e = Extranonce::from_bytes(&[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(e.to_string(), "deadbeef");
        assert_eq!("deadbeef".parse::<Extranonce>().unwrap(), e);
    }

    #[test]
    fn rejects_odd_length_hex() {
        assert!("abc".parse::<Extranonce>().is_err());
    }

    #[test]
    fn random_has_requested_length() {
        assert_eq!(Extranonce::random(8).len(), 8);
    }
}
