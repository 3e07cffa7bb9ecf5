use super::*;

/// Maximum merkle branch entries accepted: well beyond what a real block
/// header produces, guarding against a hostile or broken upstream forcing
/// unbounded allocation.
pub const MAX_MERKLE_BRANCHES: usize = 16;

/// A decoded `mining.notify` payload. Field order on the wire is positional
/// and mandatory: `[jobid, prevhash, coinb1, coinb2, merkle_branch,
/// version, nbits, ntime, clean_jobs]`.
#[derive(Debug, PartialEq, Clone)]
pub struct Notify {
    pub job_id: JobId,
    pub prevhash: PrevHash,
    pub coinb1: String,
    pub coinb2: String,
    pub merkle_branches: Vec<MerkleNode>,
    pub version: Version,
    pub nbits: Nbits,
    pub ntime: Ntime,
    pub clean_jobs: bool,
}

impl Serialize for Notify {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(9))?;
        seq.serialize_element(&self.job_id)?;
        seq.serialize_element(&self.prevhash)?;
        seq.serialize_element(&self.coinb1)?;
        seq.serialize_element(&self.coinb2)?;
        seq.serialize_element(&self.merkle_branches)?;
        seq.serialize_element(&self.version)?;
        seq.serialize_element(&self.nbits)?;
        seq.serialize_element(&self.ntime)?;
        seq.serialize_element(&self.clean_jobs)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Notify {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (job_id, prevhash, coinb1, coinb2, mut merkle_branches, version, nbits, ntime, clean_jobs) =
            <(
                JobId,
                PrevHash,
                String,
                String,
                Vec<MerkleNode>,
                Version,
                Nbits,
                Ntime,
                bool,
            )>::deserialize(deserializer)?;

        if merkle_branches.len() > MAX_MERKLE_BRANCHES {
            #[cfg(feature = "client")]
            tracing::warn!(
                count = merkle_branches.len(),
                limit = MAX_MERKLE_BRANCHES,
                "mining.notify merkle branch overflows the entry limit, truncating"
            );
            merkle_branches.truncate(MAX_MERKLE_BRANCHES);
        }

        Ok(Notify {
            job_id,
            prevhash,
            coinb1,
            coinb2,
            merkle_branches,
            version,
            nbits,
            ntime,
            clean_jobs,
        })
    }
}
