use super::*;

const LEN: usize = 8;

/// The compact-target `nbits` field: an 8-hex-char string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct Nbits([u8; 4]);

impl Display for Nbits {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for Nbits {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        snafu::ensure!(
            s.len() == LEN,
            WrongLengthSnafu {
                field: "nbits",
                expected: LEN,
                got: s.len(),
            }
        );
        let bytes = <[u8; 4]>::from_hex(s).context(HexSnafu { field: "nbits" })?;
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips() {
        let n: Nbits = "1c2ac4af".parse().unwrap();
        assert_eq!(n.to_string(), "1c2ac4af");
    }

    #[test]
    fn rejects_wrong_length() {
        assert!("1c2a".parse::<Nbits>().is_err());
    }
}
