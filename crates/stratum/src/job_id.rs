use super::*;

/// A job identifier. On the wire it is an opaque hex string; locally the
/// generator assigns these monotonically per upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, DeserializeFromStr, SerializeDisplay)]
pub struct JobId(u64);

impl JobId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

impl FromStr for JobId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| Error::Invalid {
                field: "job_id",
                reason: format!("`{s}` is not a hex integer"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex() {
        assert_eq!("bf".parse::<JobId>().unwrap(), JobId::new(0xbf));
    }

    #[test]
    fn displays_as_hex() {
        assert_eq!(JobId::new(0xbf).to_string(), "bf");
    }

    #[test]
    fn next_is_monotonic() {
        let a = JobId::new(0);
        let b = a.next();
        let c = b.next();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn roundtrips_through_json() {
        let id = JobId::new(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"2a\"");
        let back: JobId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
