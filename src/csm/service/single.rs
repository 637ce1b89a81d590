use super::tools::ToolKit;
use crate::cipher::CipherProvider;
use crate::codec::Codec;
use crate::error::{CsmError, Result, Status};
use crate::locator::SourceLocator;
use crate::model::AccountRecord;
use crate::registry::SharedRegistry;
use crate::search::{smatch, AccountSorting, SearchType};
use crate::store::StorageBackend;
use std::collections::BTreeSet;
use std::rc::Rc;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Which parts of a record a search looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MatchScope {
    /// Name, then labels, then field titles and values.
    Any,
    Name,
    Label,
}

/// Owns the in-memory records of one source and the storage, codec and
/// cipher used to persist them.
///
/// Records read by the finders are loaded lazily: the first search on an
/// empty service loads the source once, and never again afterwards.
pub struct SingleSourceService {
    locator: SourceLocator,
    records: Vec<AccountRecord>,
    registry: SharedRegistry,
    tools: Rc<ToolKit>,
    storage: Option<Box<dyn StorageBackend>>,
    codec: Option<Box<dyn Codec>>,
    cipher: Option<Box<dyn CipherProvider>>,
    encrypt: bool,
    compress: bool,
    owner: Option<String>,
    key: Option<String>,
    brute_force: bool,
    load_attempted: bool,
}

impl SingleSourceService {
    pub fn new(locator: SourceLocator, registry: SharedRegistry, tools: Rc<ToolKit>) -> Self {
        Self {
            locator,
            records: Vec::new(),
            registry,
            tools,
            storage: None,
            codec: None,
            cipher: None,
            encrypt: false,
            compress: false,
            owner: None,
            key: None,
            brute_force: false,
            load_attempted: false,
        }
    }

    pub fn locator(&self) -> &SourceLocator {
        &self.locator
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn set_owner(&mut self, owner: Option<&str>) {
        self.owner = owner.map(str::to_string);
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn set_key(&mut self, key: Option<&str>) {
        self.key = key.map(str::to_string);
    }

    pub fn brute_force(&self) -> bool {
        self.brute_force
    }

    pub fn set_brute_force(&mut self, brute_force: bool) {
        self.brute_force = brute_force;
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypt
    }

    pub fn is_compressed(&self) -> bool {
        self.compress
    }

    /// Compression is reserved; only turning it off is accepted.
    pub fn set_compress(&mut self, compress: bool) -> Result<()> {
        if compress {
            return Err(CsmError::NotImplemented("compressed sources".to_string()));
        }
        self.compress = false;
        Ok(())
    }

    pub fn records(&self) -> &[AccountRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Binds storage, codec and cipher for the current locator and key,
    /// replacing whichever no longer fits.
    pub fn load_tools(&mut self) -> Result<()> {
        if self.locator.is_empty() {
            return Err(CsmError::Source("no source selected".to_string()));
        }

        let medium = self.locator.medium();
        if self.storage.as_ref().map(|s| s.medium()) != Some(medium) {
            self.storage = Some(self.tools.storage(medium)?);
        }

        let format = self.locator.format();
        if self.codec.as_ref().map(|c| c.format()) != Some(format) {
            let choice = self.tools.format(format)?;
            self.codec = Some(choice.codec);
            self.encrypt = choice.encrypt;
            self.compress = choice.compress;
        }

        if self.encrypt {
            let stale = match &self.cipher {
                Some(cipher) => cipher.key() != self.key.as_deref(),
                None => true,
            };
            if stale {
                self.cipher = Some(self.tools.cipher(self.key.as_deref()));
            }
        }
        Ok(())
    }

    fn storage(&self) -> Result<&dyn StorageBackend> {
        self.storage
            .as_deref()
            .ok_or_else(|| CsmError::Source("storage not initialised".to_string()))
    }

    fn codec(&self) -> Result<&dyn Codec> {
        self.codec
            .as_deref()
            .ok_or_else(|| CsmError::Source("codec not initialised".to_string()))
    }

    fn cipher(&self) -> Result<&dyn CipherProvider> {
        self.cipher
            .as_deref()
            .ok_or_else(|| CsmError::Source("cipher not initialised".to_string()))
    }

    pub fn exists(&mut self) -> Result<bool> {
        if self.locator.is_empty() {
            return Err(CsmError::Source("no source selected".to_string()));
        }
        if self.storage.as_ref().map(|s| s.medium()) != Some(self.locator.medium()) {
            self.storage = Some(self.tools.storage(self.locator.medium())?);
        }
        self.storage()?.exists(&self.locator)
    }

    /// Reads, decrypts and decodes the source, replacing the in-memory
    /// records. On failure the in-memory records are left untouched.
    pub fn load(&mut self) -> Result<Status> {
        self.load_tools()?;

        let raw = self.storage()?.load(&self.locator)?;
        let plaintext: Zeroizing<Vec<u8>> = if self.encrypt {
            let decrypted = self.cipher()?.decrypt(&raw)?;
            drop(raw);
            if self.key.is_none() {
                info!(source = %self.locator, key = %decrypted.key_used, "Adopting key found in source");
                self.key = Some(decrypted.key_used.clone());
            }
            decrypted.plaintext
        } else {
            raw
        };

        let text = std::str::from_utf8(&plaintext)
            .map_err(|_| CsmError::Format("source is not valid UTF-8 text".to_string()))?;
        let decoded = self.codec()?.decode(text, self.brute_force)?;
        if !decoded.status.is_ok() {
            warn!(source = %self.locator, "Source loaded with recoverable format errors");
        }

        let stale = self.registry.borrow_mut().free_all(self.locator.as_str());
        if stale > 0 {
            debug!(source = %self.locator, stale, "Dropping previously loaded records");
        }
        self.records.clear();

        let count = decoded.records.len();
        for record in decoded.records {
            self.add(record, false)?;
        }
        self.load_attempted = true;
        info!(source = %self.locator, records = count, "Loaded source");
        Ok(decoded.status)
    }

    /// Encodes, encrypts and writes every in-memory record.
    pub fn store(&mut self) -> Result<Status> {
        self.load_tools()?;

        let encoded = self.codec()?.encode(&self.records, self.brute_force)?;
        if !encoded.status.is_ok() {
            warn!(source = %self.locator, "Records were repaired while encoding");
        }

        let stored = if self.encrypt {
            let key = self.key.as_deref().ok_or_else(|| {
                CsmError::Cipher(format!("no key selected for encrypted source {}", self.locator))
            })?;
            let ciphertext = self.cipher()?.encrypt(encoded.text.as_bytes(), key)?;
            drop(encoded.text);
            self.storage()?.store(&self.locator, &ciphertext)?
        } else {
            self.storage()?.store(&self.locator, encoded.text.as_bytes())?
        };
        if !stored.is_ok() {
            warn!(source = %self.locator, "Source written without a backup copy");
        }

        debug!(source = %self.locator, records = self.records.len(), "Stored source");
        Ok(encoded.status.worst(stored))
    }

    /// Accepts a record: stamps a fresh id, locks it and appends it.
    ///
    /// A record carrying an id this source already holds replaces that entry
    /// in place; the old id is freed and the new one returned.
    pub fn add(&mut self, mut record: AccountRecord, flush: bool) -> Result<u64> {
        if record.account_name().trim().is_empty() {
            return Err(CsmError::Format("account name cannot be empty".to_string()));
        }
        // Flushing an unread source would drop what is already stored.
        if flush {
            self.ensure_loaded()?;
        }

        let id = self
            .registry
            .borrow_mut()
            .new_id(self.locator.as_str())?;

        let previous = match record.account_id() {
            0 => None,
            old => self.position(old),
        };

        match previous {
            Some(pos) => {
                let old_id = self.records[pos].account_id();
                if let Err(e) = self.registry.borrow_mut().free(old_id) {
                    warn!(id = old_id, error = %e, "Replaced record had no registered id");
                }
                record.touch();
                record.accept(id);
                debug!(source = %self.locator, old_id, id, "Updated record");
                self.records[pos] = record;
            }
            None => {
                record.accept(id);
                self.records.push(record);
            }
        }

        if flush {
            self.store()?;
        }
        Ok(id)
    }

    pub fn remove(&mut self, id: u64) -> Result<Status> {
        let pos = self
            .position(id)
            .ok_or_else(|| CsmError::NotFound(format!("account id {}", id)))?;
        self.records.remove(pos);
        if let Err(e) = self.registry.borrow_mut().free(id) {
            warn!(id, error = %e, "Removed record had no registered id");
        }
        self.store()
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.records.iter().position(|r| r.account_id() == id)
    }

    /// Loads the source on first use if nothing is in memory yet. A source
    /// that does not exist yet counts as empty; one that fails to load is
    /// retried on the next call.
    pub(crate) fn ensure_loaded(&mut self) -> Result<()> {
        if self.load_attempted || !self.records.is_empty() || self.locator.is_empty() {
            return Ok(());
        }
        match self.load() {
            Ok(_) => Ok(()),
            Err(CsmError::NotFound(what)) => {
                debug!(source = %self.locator, missing = %what, "Source does not exist yet");
                self.load_attempted = true;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub(crate) fn matching(
        &self,
        pattern: &str,
        kind: SearchType,
        scope: MatchScope,
    ) -> Vec<&AccountRecord> {
        self.records
            .iter()
            .filter(|r| record_matches(r, pattern, kind, scope))
            .collect()
    }

    pub fn find(&mut self, pattern: &str, kind: SearchType) -> Result<Vec<&AccountRecord>> {
        self.ensure_loaded()?;
        Ok(self.matching(pattern, kind, MatchScope::Any))
    }

    pub fn find_by_account_name(
        &mut self,
        pattern: &str,
        kind: SearchType,
    ) -> Result<Vec<&AccountRecord>> {
        self.ensure_loaded()?;
        Ok(self.matching(pattern, kind, MatchScope::Name))
    }

    pub fn find_by_label(&mut self, pattern: &str, kind: SearchType) -> Result<Vec<&AccountRecord>> {
        self.ensure_loaded()?;
        Ok(self.matching(pattern, kind, MatchScope::Label))
    }

    /// First record with this id. Ids only exist once a source is loaded,
    /// so this never triggers a load.
    pub fn find_by_account_id(&self, id: u64) -> Option<&AccountRecord> {
        self.records.iter().find(|r| r.account_id() == id)
    }

    /// Mutable handle on a live record. Live records are locked, so every
    /// mutation through it is refused; use a clone and [`add`](Self::add) to
    /// update.
    pub fn record_mut(&mut self, id: u64) -> Option<&mut AccountRecord> {
        self.records.iter_mut().find(|r| r.account_id() == id)
    }

    pub fn all_accounts(&mut self, sorting: AccountSorting) -> Result<Vec<&AccountRecord>> {
        self.ensure_loaded()?;
        let mut all: Vec<&AccountRecord> = self.records.iter().collect();
        sort_records(&mut all, sorting);
        Ok(all)
    }

    /// Sorted, duplicate-free union of every record's labels.
    pub fn labels(&mut self) -> Result<Vec<String>> {
        self.ensure_loaded()?;
        Ok(self.label_set().into_iter().collect())
    }

    pub(crate) fn label_set(&self) -> BTreeSet<String> {
        self.records
            .iter()
            .flat_map(|r| r.labels().iter().cloned())
            .collect()
    }
}

fn record_matches(
    record: &AccountRecord,
    pattern: &str,
    kind: SearchType,
    scope: MatchScope,
) -> bool {
    let name = || smatch(pattern, record.account_name(), kind);
    let label = || record.labels().iter().any(|l| smatch(pattern, l, kind));
    let field = || {
        record
            .fields()
            .iter()
            .any(|f| smatch(pattern, &f.title, kind) || smatch(pattern, &f.value, kind))
    };
    match scope {
        MatchScope::Any => name() || label() || field(),
        MatchScope::Name => name(),
        MatchScope::Label => label(),
    }
}

pub(crate) fn sort_records(records: &mut [&AccountRecord], sorting: AccountSorting) {
    match sorting {
        AccountSorting::NoSort => {}
        AccountSorting::ByName => records.sort_by(|a, b| {
            a.account_name()
                .to_lowercase()
                .cmp(&b.account_name().to_lowercase())
        }),
        AccountSorting::ByDate => records.sort_by_key(|r| r.created_at()),
    }
}

#[cfg(test)]
mod tests {
    use super::super::tools::fixtures::*;
    use super::*;
    use crate::error::StatusCode;
    use crate::model::LockStatus;
    use crate::registry::IdRegistry;

    fn service(raw: &str) -> SingleSourceService {
        let mut svc = SingleSourceService::new(loc(raw), IdRegistry::shared(), mem_toolkit());
        svc.set_key(Some("alice"));
        svc
    }

    fn login() -> AccountRecord {
        let mut rec = AccountRecord::new("Login");
        rec.add_field("User", "alice");
        rec.add_field("Pass", "MyPassword123");
        rec.add_essential("Pass", false);
        rec
    }

    fn card() -> AccountRecord {
        let mut rec = AccountRecord::new("Card");
        rec.add_field("Number", "4111");
        rec.add_label("finance");
        rec
    }

    #[test]
    fn add_stamps_id_and_locks() {
        let mut svc = service("mem://vault.t");
        let id = svc.add(login(), false).unwrap();
        assert!(id > 0);
        let rec = svc.find_by_account_id(id).unwrap();
        assert_eq!(rec.lock_status(), LockStatus::Locked);

        let live = svc.record_mut(id).unwrap();
        assert_eq!(live.set_account_name("Hacked"), StatusCode::Error);
        assert_eq!(svc.find_by_account_id(id).unwrap().account_name(), "Login");
    }

    #[test]
    fn add_with_flush_persists() {
        let mut svc = service("mem://vault.t");
        svc.add(login(), true).unwrap();
        let raw = svc.tools.memory().raw(&loc("mem://vault.t")).unwrap();
        let text = String::from_utf8(raw).unwrap();
        assert!(text.contains("---->>Login"));
    }

    #[test]
    fn encrypted_round_trip_through_fresh_service() {
        let tools = mem_toolkit();
        let mut writer = SingleSourceService::new(loc("mem://vault.ct"), IdRegistry::shared(), tools.clone());
        writer.set_key(Some("alice"));
        writer.add(login(), false).unwrap();
        writer.add(card(), true).unwrap();

        let raw = tools.memory().raw(&loc("mem://vault.ct")).unwrap();
        assert!(!String::from_utf8_lossy(&raw).contains("MyPassword123"));

        let mut reader = SingleSourceService::new(loc("mem://vault.ct"), IdRegistry::shared(), tools);
        assert_eq!(reader.key(), None);
        assert_eq!(reader.load().unwrap(), Status::Ok);
        assert_eq!(reader.key(), Some("alice"));
        assert_eq!(reader.len(), 2);
        assert!(reader.records().iter().all(|r| r.is_locked() && r.account_id() > 0));
    }

    #[test]
    fn adopted_key_does_not_override_explicit_key() {
        let tools = mem_toolkit();
        let mut writer = SingleSourceService::new(loc("mem://v.ct"), IdRegistry::shared(), tools.clone());
        writer.set_key(Some("alice"));
        writer.add(login(), true).unwrap();

        let mut reader = SingleSourceService::new(loc("mem://v.ct"), IdRegistry::shared(), tools);
        reader.set_key(Some("bob"));
        reader.load().unwrap();
        assert_eq!(reader.key(), Some("bob"));
    }

    #[test]
    fn store_encrypted_without_key_fails() {
        let mut svc = SingleSourceService::new(loc("mem://v.ct"), IdRegistry::shared(), mem_toolkit());
        let err = svc.add(login(), true).unwrap_err();
        assert!(matches!(err, CsmError::Cipher(_)));
    }

    #[test]
    fn reload_replaces_records_and_ids() {
        let mut svc = service("mem://vault.t");
        let first = svc.add(login(), true).unwrap();
        svc.load().unwrap();
        assert_eq!(svc.len(), 1);
        assert!(svc.find_by_account_id(first).is_none());
        assert_eq!(svc.registry.borrow().len(), 1);
    }

    #[test]
    fn failed_load_keeps_records() {
        let mut svc = service("mem://vault.t");
        svc.add(login(), true).unwrap();
        svc.tools.memory().put_raw(&loc("mem://vault.t"), b"garbage");
        assert!(svc.load().is_err());
        assert_eq!(svc.len(), 1);
    }

    #[test]
    fn brute_force_load_reports_warning() {
        let mut svc = service("mem://vault.t");
        let text = format!("{}\n---->>Login\n@@LABELS\n@@User\nalice\n", crate::codec::HEADER);
        svc.tools.memory().put_raw(&loc("mem://vault.t"), text.as_bytes());
        assert!(svc.load().is_err());
        svc.set_brute_force(true);
        assert_eq!(svc.load().unwrap(), Status::Warning);
        assert_eq!(svc.len(), 1);
    }

    #[test]
    fn flushed_add_keeps_stored_records() {
        let tools = mem_toolkit();
        let mut first = SingleSourceService::new(loc("mem://v.t"), IdRegistry::shared(), tools.clone());
        first.add(login(), true).unwrap();

        let mut second = SingleSourceService::new(loc("mem://v.t"), IdRegistry::shared(), tools);
        second.add(card(), true).unwrap();
        assert_eq!(second.len(), 2);
        let raw = second.tools.memory().raw(&loc("mem://v.t")).unwrap();
        let text = String::from_utf8(raw).unwrap();
        assert!(text.contains("Login") && text.contains("Card"));
    }

    #[test]
    fn unreadable_source_is_never_overwritten() {
        let mut svc = service("mem://v.t");
        let damaged = format!("{}\n---->>Login\n@@LABELS\n@@User\nalice\n", crate::codec::HEADER);
        svc.tools.memory().put_raw(&loc("mem://v.t"), damaged.as_bytes());

        assert!(svc.find("login", SearchType::Txt).is_err());
        assert!(svc.add(card(), true).is_err());
        assert!(svc.add(card(), true).is_err());
        assert!(svc.is_empty());
        let raw = svc.tools.memory().raw(&loc("mem://v.t")).unwrap();
        assert_eq!(raw, damaged.as_bytes());

        svc.set_brute_force(true);
        svc.add(card(), true).unwrap();
        let names: Vec<&str> = svc.records().iter().map(|r| r.account_name()).collect();
        assert_eq!(names, vec!["Login", "Card"]);
    }

    #[test]
    fn empty_account_name_is_refused() {
        let mut svc = service("mem://vault.t");
        for name in ["", "   "] {
            let mut rec = AccountRecord::new(name);
            rec.add_field("User", "alice");
            assert_eq!(svc.add(rec, true).unwrap_err().code(), StatusCode::Error);
        }
        assert!(svc.is_empty());
        assert!(svc.tools.memory().raw(&loc("mem://vault.t")).is_none());
        assert!(svc.registry.borrow().is_empty());
    }

    #[test]
    fn update_replaces_in_place() {
        let mut svc = service("mem://vault.t");
        let a = svc.add(login(), false).unwrap();
        svc.add(card(), false).unwrap();

        let mut copy = svc.find_by_account_id(a).unwrap().clone();
        copy.set_field("Pass", "new-secret");
        let b = svc.add(copy, true).unwrap();

        assert_ne!(a, b);
        assert_eq!(svc.len(), 2);
        assert_eq!(svc.records()[0].field("Pass"), Some("new-secret"));
        assert_eq!(svc.records()[0].account_id(), b);
        assert!(svc.find_by_account_id(a).is_none());
        assert_eq!(svc.registry.borrow().source(a), None);
    }

    #[test]
    fn remove_frees_id_and_stores() {
        let mut svc = service("mem://vault.t");
        let id = svc.add(login(), true).unwrap();
        svc.add(card(), true).unwrap();
        assert_eq!(svc.remove(id).unwrap(), Status::Ok);
        assert_eq!(svc.len(), 1);
        assert_eq!(svc.registry.borrow().source(id), None);

        let raw = svc.tools.memory().raw(&loc("mem://vault.t")).unwrap();
        assert!(!String::from_utf8(raw).unwrap().contains("Login"));
        assert_eq!(svc.remove(id).unwrap_err().code(), StatusCode::NotFound);
    }

    #[test]
    fn find_uses_priority_without_duplicates() {
        let mut svc = service("mem://vault.t");
        let mut rec = AccountRecord::new("Pass keeper");
        rec.add_label("passwords");
        rec.add_field("Pass", "pass");
        svc.add(rec, false).unwrap();
        svc.add(login(), false).unwrap();
        svc.add(card(), false).unwrap();

        let found = svc.find("PASS", SearchType::Txt).unwrap();
        let names: Vec<&str> = found.iter().map(|r| r.account_name()).collect();
        assert_eq!(names, vec!["Pass keeper", "Login"]);
    }

    #[test]
    fn scoped_finders() {
        let mut svc = service("mem://vault.t");
        svc.add(login(), false).unwrap();
        svc.add(card(), false).unwrap();

        assert_eq!(svc.find_by_account_name("log", SearchType::Txt).unwrap().len(), 1);
        assert!(svc.find_by_account_name("alice", SearchType::Txt).unwrap().is_empty());
        assert_eq!(svc.find_by_label("finance", SearchType::Exact).unwrap().len(), 1);
        assert!(svc.find("4111", SearchType::Regex).unwrap().is_empty());
    }

    #[test]
    fn finders_load_lazily_once() {
        let tools = mem_toolkit();
        let mut writer = SingleSourceService::new(loc("mem://v.t"), IdRegistry::shared(), tools.clone());
        writer.add(login(), true).unwrap();

        let mut reader = SingleSourceService::new(loc("mem://v.t"), IdRegistry::shared(), tools.clone());
        assert_eq!(reader.find("login", SearchType::Txt).unwrap().len(), 1);

        writer.add(card(), true).unwrap();
        // Already loaded: the new record on disk is not picked up.
        assert!(reader.find("card", SearchType::Txt).unwrap().is_empty());
    }

    #[test]
    fn lazy_load_of_missing_source_is_empty() {
        let mut svc = service("mem://nothing.t");
        assert!(svc.find("x", SearchType::Txt).unwrap().is_empty());
        assert_eq!(svc.load().unwrap_err().code(), StatusCode::NotFound);
    }

    #[test]
    fn labels_are_sorted_and_unique() {
        let mut svc = service("mem://vault.t");
        let mut a = AccountRecord::new("a");
        a.add_labels(["work", "mail"]);
        let mut b = AccountRecord::new("b");
        b.add_labels(["mail", "bank"]);
        svc.add(a, false).unwrap();
        svc.add(b, false).unwrap();
        assert_eq!(svc.labels().unwrap(), vec!["bank", "mail", "work"]);
    }

    #[test]
    fn all_accounts_sorting() {
        let mut svc = service("mem://vault.t");
        let mut z = AccountRecord::new("zeta");
        z.set_creation_time("1/1/2001");
        let mut a = AccountRecord::new("Alpha");
        a.set_creation_time("1/1/2010");
        svc.add(a, false).unwrap();
        svc.add(z, false).unwrap();

        let names = |v: Vec<&AccountRecord>| -> Vec<String> {
            v.iter().map(|r| r.account_name().to_string()).collect()
        };
        assert_eq!(names(svc.all_accounts(AccountSorting::NoSort).unwrap()), vec!["Alpha", "zeta"]);
        assert_eq!(names(svc.all_accounts(AccountSorting::ByName).unwrap()), vec!["Alpha", "zeta"]);
        assert_eq!(names(svc.all_accounts(AccountSorting::ByDate).unwrap()), vec!["zeta", "Alpha"]);
    }

    #[test]
    fn unknown_medium_and_format() {
        let mut svc = service("ftp://vault.t");
        assert_eq!(svc.load_tools().unwrap_err().code(), StatusCode::NotImplemented);
        let mut svc = service("mem://vault.czx");
        assert_eq!(svc.load_tools().unwrap_err().code(), StatusCode::NotImplemented);
        assert_eq!(svc.store().unwrap_err().code(), StatusCode::NotImplemented);
    }

    #[test]
    fn exists_checks_without_loading() {
        let mut svc = service("mem://vault.t");
        assert!(!svc.exists().unwrap());
        svc.add(login(), true).unwrap();
        assert!(svc.exists().unwrap());
    }

    #[test]
    fn compression_is_reserved() {
        let mut svc = service("mem://vault.t");
        assert!(svc.set_compress(true).is_err());
        assert!(svc.set_compress(false).is_ok());
        assert!(!svc.is_compressed());
    }

    #[test]
    fn failed_store_keeps_previous_blob() {
        let mut svc = service("mem://vault.t");
        svc.add(login(), true).unwrap();
        svc.tools.memory().set_simulate_write_error(true);
        assert!(svc.add(card(), true).is_err());
        let raw = svc.tools.memory().raw(&loc("mem://vault.t")).unwrap();
        assert!(!String::from_utf8(raw).unwrap().contains("Card"));
    }
}
