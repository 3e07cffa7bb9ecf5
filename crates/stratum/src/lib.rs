use {
    hex::FromHex,
    rand::RngCore,
    serde::{
        Deserialize, Serialize, Serializer,
        de::{self, Deserializer},
        ser::SerializeSeq,
    },
    serde_json::Value,
    serde_with::{DeserializeFromStr, SerializeDisplay},
    snafu::{ResultExt, Snafu},
    std::{
        fmt::{self, Display, Formatter},
        str::FromStr,
    },
};

pub use {
    authorize::Authorize,
    difficulty::Difficulty,
    error::{Error, Result},
    extranonce::Extranonce,
    job_id::JobId,
    merkle::MerkleNode,
    message::{Message, find_notify},
    nbits::Nbits,
    notify::Notify,
    ntime::Ntime,
    prevhash::PrevHash,
    set_difficulty::SetDifficulty,
    submit::Submit,
    subscribe::{Subscribe, SubscribeResponse},
    username::Username,
    version::Version,
};

#[cfg(feature = "client")]
pub use connection::{Connection, LineEvent, ReadHalf, WriteHalf};

mod authorize;
mod difficulty;
mod error;
mod extranonce;
mod job_id;
mod merkle;
mod message;
mod nbits;
mod notify;
mod ntime;
mod prevhash;
mod set_difficulty;
mod submit;
mod subscribe;
mod username;
mod version;

#[cfg(feature = "client")]
mod connection;

/// Maximum length of a single Stratum protocol line, including its JSON
/// payload.
pub const MAX_MESSAGE_SIZE: usize = 32 * 1024;

/// Depth cap for the reentrant `mining.notify` locator (see [`find_notify`]).
/// Guards against a malicious or buggy upstream forcing unbounded
/// recursion on a deeply nested array.
pub const MAX_NOTIFY_SEARCH_DEPTH: usize = 32;
