use super::*;

const LEN: usize = 64;

/// The previous-block-hash field of a `mining.notify` payload: a
/// fixed-width 64-hex-char string. Stored and forwarded opaquely; the
/// generator never interprets it or validates the block it names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct PrevHash(String);

impl Display for PrevHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PrevHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        snafu::ensure!(
            s.len() == LEN,
            WrongLengthSnafu {
                field: "prevhash",
                expected: LEN,
                got: s.len(),
            }
        );
        Vec::from_hex(s).context(HexSnafu { field: "prevhash" })?;
        Ok(Self(s.to_lowercase()))
    }
}
