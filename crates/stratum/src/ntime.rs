use super::*;

const LEN: usize = 8;

/// The block-header timestamp field of a `mining.notify` payload: an
/// 8-hex-char string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct Ntime([u8; 4]);

impl Display for Ntime {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for Ntime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        snafu::ensure!(
            s.len() == LEN,
            WrongLengthSnafu {
                field: "ntime",
                expected: LEN,
                got: s.len(),
            }
        );
        let bytes = <[u8; 4]>::from_hex(s).context(HexSnafu { field: "ntime" })?;
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips() {
        let n: Ntime = "504e86b9".parse().unwrap();
        assert_eq!(n.to_string(), "504e86b9");
    }
}
