//! Passphrase-based encryption using Argon2id and ChaCha20-Poly1305.
//!
//! Output is an ASCII envelope that names the key id and the KDF settings,
//! so a source can be decrypted without knowing in advance which key
//! protected it:
//!
//! ```text
//! -----BEGIN CSM ENCRYPTED DATA-----
//! Key: alice@example.org
//! Kdf: argon2id m=19456 t=2 p=1
//! <base64 of salt | nonce | ciphertext>
//! -----END CSM ENCRYPTED DATA-----
//! ```

use super::{CipherProvider, Decrypted};
use crate::error::{CsmError, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Attempts made on a wrong passphrase before decryption gives up.
pub const MAX_ATTEMPTS: u32 = 3;

pub const KEY_SIZE: usize = 32;
pub const SALT_SIZE: usize = 16;
pub const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;

/// Refuse envelopes asking for more than 1 GiB of KDF memory.
const MAX_MEMORY_COST: u32 = 1024 * 1024;

const ARMOR_BEGIN: &str = "-----BEGIN CSM ENCRYPTED DATA-----";
const ARMOR_END: &str = "-----END CSM ENCRYPTED DATA-----";
const ARMOR_WIDTH: usize = 64;

/// Key derivation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Time cost (iterations).
    pub time_cost: u32,
    /// Parallelism factor.
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        // OWASP recommendations for Argon2id
        Self {
            memory_cost: 19 * 1024,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// Fast but insecure parameters for tests.
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    fn describe(&self) -> String {
        format!(
            "argon2id m={} t={} p={}",
            self.memory_cost, self.time_cost, self.parallelism
        )
    }

    fn parse(text: &str) -> Result<Self> {
        let mut parts = text.split_whitespace();
        if parts.next() != Some("argon2id") {
            return Err(CsmError::Cipher(format!("unsupported KDF '{}'", text)));
        }
        let mut params = KdfParams {
            memory_cost: 0,
            time_cost: 0,
            parallelism: 0,
        };
        for part in parts {
            let (name, value) = part
                .split_once('=')
                .ok_or_else(|| CsmError::Cipher(format!("bad KDF parameter '{}'", part)))?;
            let value: u32 = value
                .parse()
                .map_err(|_| CsmError::Cipher(format!("bad KDF parameter '{}'", part)))?;
            match name {
                "m" => params.memory_cost = value,
                "t" => params.time_cost = value,
                "p" => params.parallelism = value,
                _ => return Err(CsmError::Cipher(format!("unknown KDF parameter '{}'", name))),
            }
        }
        if params.memory_cost > MAX_MEMORY_COST {
            return Err(CsmError::Cipher("KDF memory cost too large".to_string()));
        }
        Ok(params)
    }
}

/// Supplies the passphrase protecting a key id. `attempt` starts at 1 and
/// grows each time the previous answer turned out to be wrong.
pub trait PassphraseSource {
    fn passphrase(&self, key_id: &str, attempt: u32) -> Result<Zeroizing<String>>;
}

/// Fixed passphrases per key id, with an optional catch-all.
#[derive(Default)]
pub struct StaticPassphrases {
    entries: HashMap<String, Zeroizing<String>>,
    fallback: Option<Zeroizing<String>>,
}

impl StaticPassphrases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key_id: &str, passphrase: &str) -> Self {
        self.entries
            .insert(key_id.to_string(), Zeroizing::new(passphrase.to_string()));
        self
    }

    pub fn any(passphrase: &str) -> Self {
        Self {
            entries: HashMap::new(),
            fallback: Some(Zeroizing::new(passphrase.to_string())),
        }
    }
}

impl PassphraseSource for StaticPassphrases {
    fn passphrase(&self, key_id: &str, _attempt: u32) -> Result<Zeroizing<String>> {
        self.entries
            .get(key_id)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| CsmError::Cipher(format!("no passphrase known for key '{}'", key_id)))
    }
}

/// Reads the passphrase from an environment variable, `CSM_PASSPHRASE` by
/// default.
pub struct EnvPassphrase {
    var: String,
}

impl Default for EnvPassphrase {
    fn default() -> Self {
        Self::new("CSM_PASSPHRASE")
    }
}

impl EnvPassphrase {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl PassphraseSource for EnvPassphrase {
    fn passphrase(&self, key_id: &str, _attempt: u32) -> Result<Zeroizing<String>> {
        std::env::var(&self.var)
            .map(Zeroizing::new)
            .map_err(|_| {
                CsmError::Cipher(format!(
                    "{} is not set, cannot unlock key '{}'",
                    self.var, key_id
                ))
            })
    }
}

pub struct PassphraseCipher {
    key: Option<String>,
    passphrases: Rc<dyn PassphraseSource>,
    params: KdfParams,
}

impl PassphraseCipher {
    pub fn new(key: Option<&str>, passphrases: Rc<dyn PassphraseSource>, params: KdfParams) -> Self {
        Self {
            key: key.map(str::to_string),
            passphrases,
            params,
        }
    }

    fn derive_key(
        passphrase: &str,
        salt: &[u8],
        params: &KdfParams,
    ) -> Result<Zeroizing<[u8; KEY_SIZE]>> {
        let argon2_params = Params::new(
            params.memory_cost,
            params.time_cost,
            params.parallelism,
            Some(KEY_SIZE),
        )
        .map_err(|e| CsmError::Cipher(format!("key derivation: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        argon2
            .hash_password_into(passphrase.as_bytes(), salt, &mut *key)
            .map_err(|e| CsmError::Cipher(format!("key derivation: {}", e)))?;
        Ok(key)
    }

    fn aead(key: &[u8; KEY_SIZE]) -> Result<ChaCha20Poly1305> {
        ChaCha20Poly1305::new_from_slice(key)
            .map_err(|e| CsmError::Cipher(format!("cipher init: {}", e)))
    }
}

impl CipherProvider for PassphraseCipher {
    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn encrypt(&self, plaintext: &[u8], key: &str) -> Result<Vec<u8>> {
        let key_id = key.trim();
        if key_id.is_empty() || key_id.contains('\n') {
            return Err(CsmError::Cipher("a single-line key id is required".to_string()));
        }

        let passphrase = self.passphrases.passphrase(key_id, 1)?;

        let mut salt = [0u8; SALT_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut salt);
        let mut nonce = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut nonce);

        let derived = Self::derive_key(&passphrase, &salt, &self.params)?;
        let ciphertext = Self::aead(&derived)?
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| CsmError::Cipher(format!("encryption failed: {}", e)))?;

        let mut payload = Vec::with_capacity(SALT_SIZE + NONCE_SIZE + ciphertext.len());
        payload.extend_from_slice(&salt);
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);
        let encoded = STANDARD.encode(&payload);

        let mut out = String::with_capacity(encoded.len() + encoded.len() / ARMOR_WIDTH + 128);
        out.push_str(ARMOR_BEGIN);
        out.push('\n');
        out.push_str(&format!("Key: {}\n", key_id));
        out.push_str(&format!("Kdf: {}\n", self.params.describe()));
        for chunk in encoded.as_bytes().chunks(ARMOR_WIDTH) {
            // base64 output is ASCII
            out.push_str(&String::from_utf8_lossy(chunk));
            out.push('\n');
        }
        out.push_str(ARMOR_END);
        out.push('\n');

        debug!(key = key_id, bytes = plaintext.len(), "Encrypted blob");
        Ok(out.into_bytes())
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Decrypted> {
        let envelope = Envelope::parse(ciphertext)?;
        let nonce = Nonce::from_slice(&envelope.nonce);

        for attempt in 1..=MAX_ATTEMPTS {
            let passphrase = self.passphrases.passphrase(&envelope.key_id, attempt)?;
            let derived = Self::derive_key(&passphrase, &envelope.salt, &envelope.params)?;
            match Self::aead(&derived)?.decrypt(nonce, envelope.ciphertext.as_ref()) {
                Ok(plaintext) => {
                    debug!(key = %envelope.key_id, attempt, "Decrypted blob");
                    return Ok(Decrypted {
                        plaintext: Zeroizing::new(plaintext),
                        key_used: envelope.key_id,
                    });
                }
                Err(_) => {
                    warn!(key = %envelope.key_id, attempt, "Bad passphrase");
                }
            }
        }
        Err(CsmError::BadPassphrase(envelope.key_id))
    }
}

struct Envelope {
    key_id: String,
    params: KdfParams,
    salt: [u8; SALT_SIZE],
    nonce: [u8; NONCE_SIZE],
    ciphertext: Vec<u8>,
}

impl Envelope {
    fn parse(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|_| CsmError::Cipher("encrypted data is not an armored envelope".to_string()))?;
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

        if lines.next() != Some(ARMOR_BEGIN) {
            return Err(CsmError::Cipher(
                "encrypted data is not an armored envelope".to_string(),
            ));
        }

        let key_id = lines
            .next()
            .and_then(|l| l.strip_prefix("Key:"))
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| CsmError::Cipher("envelope has no key id".to_string()))?;
        let params = lines
            .next()
            .and_then(|l| l.strip_prefix("Kdf:"))
            .ok_or_else(|| CsmError::Cipher("envelope has no KDF line".to_string()))
            .and_then(|kdf| KdfParams::parse(kdf.trim()))?;

        let mut encoded = String::new();
        let mut closed = false;
        for line in lines {
            if line == ARMOR_END {
                closed = true;
                break;
            }
            encoded.push_str(line);
        }
        if !closed {
            return Err(CsmError::Cipher("envelope is truncated".to_string()));
        }

        let payload = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| CsmError::Cipher(format!("invalid base64: {}", e)))?;
        if payload.len() < SALT_SIZE + NONCE_SIZE + TAG_SIZE {
            return Err(CsmError::Cipher("envelope payload too short".to_string()));
        }

        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&payload[..SALT_SIZE]);
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&payload[SALT_SIZE..SALT_SIZE + NONCE_SIZE]);
        let ciphertext = payload[SALT_SIZE + NONCE_SIZE..].to_vec();

        Ok(Self {
            key_id,
            params,
            salt,
            nonce,
            ciphertext,
        })
    }
}
