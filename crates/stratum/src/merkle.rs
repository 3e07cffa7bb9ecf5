use super::*;

const LEN: usize = 64;

/// One entry of a `mining.notify` merkle branch: a 64-hex-char hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct MerkleNode(String);

impl Display for MerkleNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MerkleNode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        snafu::ensure!(
            s.len() == LEN,
            WrongLengthSnafu {
                field: "merkle_branch_entry",
                expected: LEN,
                got: s.len(),
            }
        );
        Vec::from_hex(s).context(HexSnafu {
            field: "merkle_branch_entry",
        })?;
        Ok(Self(s.to_lowercase()))
    }
}
