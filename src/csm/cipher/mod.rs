//! Encryption of whole source blobs.
//!
//! The service layer only sees [`CipherProvider`]: encrypt under a key id,
//! decrypt and learn which key id was used. The bundled implementation is
//! [`PassphraseCipher`]; passphrases are obtained on demand from a
//! [`PassphraseSource`] so the library never prompts by itself.

pub mod passphrase;

pub use passphrase::{
    EnvPassphrase, KdfParams, PassphraseCipher, PassphraseSource, StaticPassphrases,
    MAX_ATTEMPTS,
};

use crate::error::Result;
use zeroize::Zeroizing;

pub struct Decrypted {
    pub plaintext: Zeroizing<Vec<u8>>,
    pub key_used: String,
}

pub trait CipherProvider {
    /// Key id this provider was built for, if any.
    fn key(&self) -> Option<&str>;

    fn encrypt(&self, plaintext: &[u8], key: &str) -> Result<Vec<u8>>;

    /// Retries up to [`MAX_ATTEMPTS`] times when the passphrase is wrong;
    /// every other failure is returned at once.
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Decrypted>;
}
