use crate::cipher::{CipherProvider, KdfParams, PassphraseCipher, PassphraseSource};
use crate::codec::{Codec, PlainTextCodec, Separators};
use crate::error::{CsmError, Result};
use crate::store::fs::LocalFileBackend;
use crate::store::memory::MemBackend;
use crate::store::StorageBackend;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::warn;

/// Codec chosen for a locator format, plus what the format asks of the
/// pipeline around it.
pub struct FormatChoice {
    pub codec: Box<dyn Codec>,
    pub encrypt: bool,
    pub compress: bool,
}

/// Builds the storage, codec and cipher a source needs from the medium and
/// format tags of its locator.
///
/// | medium | backend              |   | format | codec      | encrypted |
/// |--------|----------------------|---|--------|------------|-----------|
/// | `file` | [`LocalFileBackend`] |   | `t`    | plain text | no        |
/// | `mem`  | [`MemBackend`]       |   | `ct`   | plain text | yes       |
///
/// `czx` (compressed XML) is a known format that is not implemented; any
/// other tag is unknown. Both fail with [`CsmError::NotImplemented`].
pub struct ToolKit {
    file_root: Option<PathBuf>,
    memory: MemBackend,
    separators: Separators,
    passphrases: Rc<dyn PassphraseSource>,
    kdf: KdfParams,
}

impl ToolKit {
    pub fn new(passphrases: Rc<dyn PassphraseSource>) -> Self {
        Self {
            file_root: None,
            memory: MemBackend::new(),
            separators: Separators::default(),
            passphrases,
            kdf: KdfParams::default(),
        }
    }

    pub fn with_file_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.file_root = Some(root.into());
        self
    }

    pub fn with_separators(mut self, separators: Separators) -> Result<Self> {
        separators.validate()?;
        self.separators = separators;
        Ok(self)
    }

    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn with_memory(mut self, memory: MemBackend) -> Self {
        self.memory = memory;
        self
    }

    pub fn memory(&self) -> &MemBackend {
        &self.memory
    }

    pub fn storage(&self, medium: &str) -> Result<Box<dyn StorageBackend>> {
        match medium {
            "file" => Ok(Box::new(match &self.file_root {
                Some(root) => LocalFileBackend::with_root(root),
                None => LocalFileBackend::new(),
            })),
            "mem" => Ok(Box::new(self.memory.clone())),
            other => Err(CsmError::NotImplemented(format!(
                "storage medium '{}'",
                other
            ))),
        }
    }

    pub fn format(&self, format: &str) -> Result<FormatChoice> {
        let (encrypt, compress) = match format {
            "t" => {
                warn!("Using a non-encrypted source, secrets are stored in clear text");
                (false, false)
            }
            "ct" => (true, false),
            "czx" => {
                return Err(CsmError::NotImplemented(
                    "compressed XML format 'czx'".to_string(),
                ))
            }
            other => {
                return Err(CsmError::NotImplemented(format!(
                    "source format '{}'",
                    other
                )))
            }
        };
        let codec = PlainTextCodec::new(format, self.separators.clone())?;
        Ok(FormatChoice {
            codec: Box::new(codec),
            encrypt,
            compress,
        })
    }

    pub fn cipher(&self, key: Option<&str>) -> Box<dyn CipherProvider> {
        Box::new(PassphraseCipher::new(
            key,
            self.passphrases.clone(),
            self.kdf.clone(),
        ))
    }
}

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::cipher::StaticPassphrases;
    use crate::locator::{LocatorDefaults, SourceLocator};

    pub const PASSPHRASE: &str = "correct horse";

    pub fn fast_kdf() -> KdfParams {
        KdfParams {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    /// Tool kit with the in-memory medium, one passphrase for every key and
    /// cheap key derivation.
    pub fn mem_toolkit() -> Rc<ToolKit> {
        Rc::new(ToolKit::new(Rc::new(StaticPassphrases::any(PASSPHRASE))).with_kdf(fast_kdf()))
    }

    pub fn loc(raw: &str) -> SourceLocator {
        SourceLocator::parse(raw, &LocatorDefaults::default())
    }

    /// Router over the in-memory medium with `raw` as its default source and
    /// `alice` as its key.
    pub fn mem_router(raw: &str) -> crate::service::MultiSourceService {
        let mut multi = crate::service::MultiSourceService::new(mem_toolkit());
        multi.set_key(Some("alice"));
        // A fresh router cannot already manage the source.
        let _ = multi.new_source(loc(raw), None, None);
        multi
    }
}
