//! Serialization codecs turn a source's record list into one text blob and
//! back. The blob is what gets encrypted and written by the storage layer.
//!
//! Every codec supports two modes. Strict mode fails on the first malformed
//! element. Brute-force mode repairs what it can, drops what it cannot, and
//! reports the damage as [`Status::Warning`].

pub mod plain_text;

pub use plain_text::{PlainTextCodec, Separators, HEADER};

use crate::error::{Result, Status};
use crate::model::AccountRecord;
use zeroize::Zeroizing;

/// Encoder output. The text holds secrets in clear, so it is scrubbed on drop.
pub struct Encoded {
    pub text: Zeroizing<String>,
    pub status: Status,
}

#[derive(Debug)]
pub struct Decoded {
    pub records: Vec<AccountRecord>,
    pub status: Status,
}

pub trait Codec {
    /// Locator format tag this codec was selected for.
    fn format(&self) -> &str;

    fn encode(&self, records: &[AccountRecord], brute_force: bool) -> Result<Encoded>;

    /// Records come back unlocked and without account ids.
    fn decode(&self, text: &str, brute_force: bool) -> Result<Decoded>;
}
