use super::single::{sort_records, MatchScope, SingleSourceService};
use super::tools::ToolKit;
use crate::error::{CsmError, Result, Status};
use crate::locator::SourceLocator;
use crate::model::AccountRecord;
use crate::registry::{IdRegistry, SharedRegistry};
use crate::search::{AccountSorting, SearchType};
use std::collections::BTreeSet;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Routes record operations across several sources sharing one id space.
///
/// The router is the only owner of the [`IdRegistry`]; each managed
/// [`SingleSourceService`] receives a handle to it when created, so ids stay
/// unique across every source and always resolve back to their owner.
pub struct MultiSourceService {
    services: Vec<SingleSourceService>,
    registry: SharedRegistry,
    tools: Rc<ToolKit>,
    default: Option<SourceLocator>,
    owner: Option<String>,
    key: Option<String>,
    brute_force: bool,
}

impl MultiSourceService {
    pub fn new(tools: Rc<ToolKit>) -> Self {
        Self {
            services: Vec::new(),
            registry: IdRegistry::shared(),
            tools,
            default: None,
            owner: None,
            key: None,
            brute_force: false,
        }
    }

    pub fn set_owner(&mut self, owner: Option<&str>) {
        self.owner = owner.map(str::to_string);
    }

    pub fn set_key(&mut self, key: Option<&str>) {
        self.key = key.map(str::to_string);
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Applies to every managed source and to sources created later.
    pub fn set_brute_force(&mut self, brute_force: bool) {
        self.brute_force = brute_force;
        for svc in &mut self.services {
            svc.set_brute_force(brute_force);
        }
    }

    /// The registry is created with the router and cannot be replaced.
    pub fn set_id_registry(&mut self, _registry: SharedRegistry) -> Result<()> {
        warn!("Refusing to replace the id registry of a multi-source service");
        Err(CsmError::Registry(
            "the id registry is shared by construction and cannot be replaced".to_string(),
        ))
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn managed_sources(&self) -> Vec<&SourceLocator> {
        self.services.iter().map(|s| s.locator()).collect()
    }

    pub fn is_source_managed(&self, locator: &SourceLocator) -> bool {
        self.index_of(locator).is_some()
    }

    pub fn default_source(&self) -> Option<&SourceLocator> {
        self.default.as_ref()
    }

    pub fn service(&self, locator: &SourceLocator) -> Option<&SingleSourceService> {
        self.index_of(locator).map(|i| &self.services[i])
    }

    fn index_of(&self, locator: &SourceLocator) -> Option<usize> {
        self.services.iter().position(|s| s.locator() == locator)
    }

    fn index_of_key(&self, key: &str) -> Option<usize> {
        self.services.iter().position(|s| s.locator().as_str() == key)
    }

    /// Starts managing `locator` and makes it the default source. Owner and
    /// key fall back to the router's own when not given.
    pub fn new_source(
        &mut self,
        locator: SourceLocator,
        owner: Option<&str>,
        key: Option<&str>,
    ) -> Result<()> {
        if locator.is_empty() {
            return Err(CsmError::Source("no source name given".to_string()));
        }
        if self.is_source_managed(&locator) {
            return Err(CsmError::Source(format!("source {} is already managed", locator)));
        }

        let mut svc =
            SingleSourceService::new(locator.clone(), self.registry.clone(), self.tools.clone());
        svc.set_owner(owner.or(self.owner.as_deref()));
        svc.set_key(key.or(self.key.as_deref()));
        svc.set_brute_force(self.brute_force);
        self.services.push(svc);

        debug!(source = %locator, "Managing new source");
        self.default = Some(locator);
        Ok(())
    }

    pub fn set_source(&mut self, locator: &SourceLocator) -> Result<()> {
        if !self.is_source_managed(locator) {
            return Err(CsmError::Source(format!("source {} is not managed", locator)));
        }
        self.default = Some(locator.clone());
        Ok(())
    }

    /// Loads `locator`, managing it first if needed. On success it becomes
    /// the default source; on failure the previous default is restored.
    pub fn load(&mut self, locator: &SourceLocator) -> Result<Status> {
        let previous = self.default.clone();
        let idx = match self.index_of(locator) {
            Some(idx) => idx,
            None => {
                self.new_source(locator.clone(), None, None)?;
                self.services.len() - 1
            }
        };

        match self.services[idx].load() {
            Ok(status) => {
                self.default = Some(locator.clone());
                Ok(status)
            }
            Err(e) => {
                warn!(source = %locator, error = %e, "Load failed, keeping previous default source");
                self.default = previous;
                Err(e)
            }
        }
    }

    fn default_index(&self) -> Result<usize> {
        let locator = self
            .default
            .as_ref()
            .ok_or_else(|| CsmError::Source("no default source selected".to_string()))?;
        self.index_of(locator)
            .ok_or_else(|| CsmError::Source(format!("lost track of source {}", locator)))
    }

    /// Index of the source owning `id`, if the registry knows it.
    fn owner_index(&self, id: u64) -> Result<Option<usize>> {
        let registry = self.registry.borrow();
        let Some(key) = registry.source(id) else {
            return Ok(None);
        };
        let idx = self
            .index_of_key(key)
            .ok_or_else(|| CsmError::Source(format!("lost track of source {}", key)))?;
        Ok(Some(idx))
    }

    /// Adds a record and flushes its source. A record that already carries an
    /// id goes back to the source owning that id; new records go to the
    /// default source.
    pub fn add(&mut self, record: AccountRecord) -> Result<u64> {
        let idx = match record.account_id() {
            0 => self.default_index()?,
            id => self.owner_index(id)?.ok_or_else(|| {
                CsmError::Source(format!("lost track of the source of account id {}", id))
            })?,
        };
        let svc = &mut self.services[idx];
        info!(source = %svc.locator(), account = record.account_name(), "Adding account");
        svc.add(record, true)
    }

    pub fn remove(&mut self, id: u64) -> Result<Status> {
        let idx = self
            .owner_index(id)?
            .ok_or_else(|| CsmError::NotFound(format!("account id {}", id)))?;
        self.services[idx].remove(id)
    }

    pub fn find_by_account_id(&self, id: u64) -> Option<&AccountRecord> {
        let idx = self.owner_index(id).ok().flatten()?;
        self.services[idx].find_by_account_id(id)
    }

    /// Clone of a record for editing; live records are locked.
    pub fn record_copy(&self, id: u64) -> Result<AccountRecord> {
        self.find_by_account_id(id)
            .cloned()
            .ok_or_else(|| CsmError::NotFound(format!("account id {}", id)))
    }

    /// Loads every managed source that has not been read yet.
    pub fn ensure_loaded(&mut self) -> Result<()> {
        for svc in &mut self.services {
            svc.ensure_loaded()?;
        }
        Ok(())
    }

    fn fan_out(&mut self, pattern: &str, kind: SearchType, scope: MatchScope) -> Result<Vec<&AccountRecord>> {
        self.ensure_loaded()?;
        Ok(self
            .services
            .iter()
            .flat_map(|s| s.matching(pattern, kind, scope))
            .collect())
    }

    pub fn find(&mut self, pattern: &str, kind: SearchType) -> Result<Vec<&AccountRecord>> {
        self.fan_out(pattern, kind, MatchScope::Any)
    }

    pub fn find_by_account_name(
        &mut self,
        pattern: &str,
        kind: SearchType,
    ) -> Result<Vec<&AccountRecord>> {
        self.fan_out(pattern, kind, MatchScope::Name)
    }

    pub fn find_by_label(&mut self, pattern: &str, kind: SearchType) -> Result<Vec<&AccountRecord>> {
        self.fan_out(pattern, kind, MatchScope::Label)
    }

    pub fn all_accounts(&mut self, sorting: AccountSorting) -> Result<Vec<&AccountRecord>> {
        self.ensure_loaded()?;
        let mut all: Vec<&AccountRecord> =
            self.services.iter().flat_map(|s| s.records().iter()).collect();
        sort_records(&mut all, sorting);
        Ok(all)
    }

    pub fn labels(&mut self) -> Result<Vec<String>> {
        self.ensure_loaded()?;
        let all: BTreeSet<String> = self.services.iter().flat_map(|s| s.label_set()).collect();
        Ok(all.into_iter().collect())
    }

    /// Writes the in-memory records of the default source as they are.
    pub fn store(&mut self) -> Result<Status> {
        let idx = self.default_index()?;
        self.services[idx].store()
    }

    /// Stores one managed source. The default source is left as it was.
    pub fn store_source(&mut self, locator: &SourceLocator) -> Result<Status> {
        let previous = self.default.clone();
        self.set_source(locator)?;
        let result = self.store();
        self.default = previous;
        result
    }

    /// Stores every managed source, reading unread ones first so nothing
    /// stored is lost.
    pub fn store_all(&mut self) -> Result<Status> {
        let mut status = Status::Ok;
        for svc in &mut self.services {
            svc.ensure_loaded()?;
            status = status.worst(svc.store()?);
        }
        Ok(status)
    }

    /// Whether the physical source exists, without managing or reading it.
    pub fn source_exists(&self, locator: &SourceLocator) -> Result<bool> {
        let mut probe =
            SingleSourceService::new(locator.clone(), IdRegistry::shared(), self.tools.clone());
        probe.exists()
    }
}
