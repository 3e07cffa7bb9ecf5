use super::*;

/// The username sent in `mining.authorize` (often `address.workername`).
/// The generator passes this through opaquely; it does not parse the
/// worker suffix (that's the stratifier's concern).
#[derive(Debug, Clone, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct Username(String);

impl Username {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Username {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        snafu::ensure!(
            !s.is_empty(),
            InvalidSnafu {
                field: "username",
                reason: "must not be empty",
            }
        );
        snafu::ensure!(
            !s.chars().any(char::is_control),
            InvalidSnafu {
                field: "username",
                reason: "must not contain control characters",
            }
        );
        Ok(Self(s.to_string()))
    }
}
