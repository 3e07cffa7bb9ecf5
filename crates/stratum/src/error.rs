use super::*;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("invalid hex in {field}: {source}"))]
    Hex {
        field: &'static str,
        source: hex::FromHexError,
    },
    #[snafu(display("{field} has wrong length: expected {expected} hex chars, got {got}"))]
    WrongLength {
        field: &'static str,
        expected: usize,
        got: usize,
    },
    #[snafu(display("invalid {field}: {reason}"))]
    Invalid {
        field: &'static str,
        reason: String,
    },
    #[snafu(display("malformed JSON-RPC message: {reason}"))]
    Malformed { reason: String },
    #[snafu(display("io error: {source}"))]
    Io { source: std::io::Error },
    #[snafu(display("connection timed out after {elapsed:?}"))]
    Timeout { elapsed: std::time::Duration },
}
