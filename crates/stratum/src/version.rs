use super::*;

const LEN: usize = 8;

/// The block-header version field of a `mining.notify` payload: an
/// 8-hex-char string. The generator never interprets the bits; version
/// rolling negotiation is a stratifier/miner concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct Version([u8; 4]);

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        snafu::ensure!(
            s.len() == LEN,
            WrongLengthSnafu {
                field: "version",
                expected: LEN,
                got: s.len(),
            }
        );
        let bytes = <[u8; 4]>::from_hex(s).context(HexSnafu { field: "version" })?;
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips() {
        let v: Version = "00000002".parse().unwrap();
        assert_eq!(v.to_string(), "00000002");
    }
}
