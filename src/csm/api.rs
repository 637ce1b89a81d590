//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer and the single
//! entry point for every csm operation, whatever the UI.
//!
//! The facade:
//! - **Dispatches** to the command functions in `commands/`
//! - **Normalizes inputs**: locator strings are parsed with the configured
//!   defaults, template names are resolved, the configured search type is
//!   used when none is given
//! - **Returns structured types** (`Result<CmdResult>`), never strings
//!
//! It does no terminal I/O and holds no business logic.

use crate::commands::{self, find::FindScope, CmdResult, RecordEdit};
use crate::config::CsmConfig;
use crate::error::{CsmError, Result};
use crate::locator::SourceLocator;
use crate::search::{AccountSorting, SearchType};
use crate::service::{MultiSourceService, ToolKit};
use std::path::Path;
use std::rc::Rc;

pub struct CsmApi {
    svc: MultiSourceService,
    config: CsmConfig,
}

impl CsmApi {
    /// Builds the router with the configured user, key and brute-force
    /// preference. No source is managed yet.
    pub fn new(tools: Rc<ToolKit>, config: CsmConfig) -> Self {
        let mut svc = MultiSourceService::new(tools);
        svc.set_owner(config.user_name.as_deref());
        svc.set_key(config.user_key.as_deref());
        svc.set_brute_force(config.brute_force);
        Self { svc, config }
    }

    pub fn config(&self) -> &CsmConfig {
        &self.config
    }

    pub fn service(&self) -> &MultiSourceService {
        &self.svc
    }

    pub fn service_mut(&mut self) -> &mut MultiSourceService {
        &mut self.svc
    }

    pub fn locator(&self, raw: &str) -> SourceLocator {
        self.config.locator(raw)
    }

    pub fn set_key(&mut self, key: Option<&str>) {
        self.svc.set_key(key);
    }

    pub fn set_brute_force(&mut self, brute_force: bool) {
        self.svc.set_brute_force(brute_force);
    }

    /// Manages the given sources without reading them; the last one becomes
    /// the default. With none given, the configured sources are used, and
    /// failing that the default source.
    pub fn use_sources<I: AsRef<str>>(&mut self, raws: &[I]) -> Result<()> {
        let mut locators: Vec<SourceLocator> =
            raws.iter().map(|r| self.locator(r.as_ref())).collect();
        if locators.is_empty() {
            locators = self.config.sources.iter().map(|r| self.locator(r)).collect();
        }
        if locators.is_empty() {
            locators.push(self.config.default_locator());
        }

        for locator in locators {
            if self.svc.is_source_managed(&locator) {
                self.svc.set_source(&locator)?;
            } else {
                self.svc.new_source(locator, None, None)?;
            }
        }
        Ok(())
    }

    pub fn create_source(&mut self, raw: &str, key: Option<&str>) -> Result<CmdResult> {
        let locator = self.locator(raw);
        commands::create::run(&mut self.svc, locator, key)
    }

    pub fn open_source(&mut self, raw: &str) -> Result<CmdResult> {
        let locator = self.locator(raw);
        commands::open::run(&mut self.svc, &locator)
    }

    pub fn sources(&self) -> CmdResult {
        CmdResult::default().with_sources(commands::open::source_list(&self.svc))
    }

    pub fn find(
        &mut self,
        pattern: &str,
        kind: Option<SearchType>,
        scope: FindScope,
    ) -> Result<CmdResult> {
        let kind = kind.unwrap_or(self.config.search_type);
        commands::find::run(&mut self.svc, pattern, kind, scope)
    }

    pub fn list(&mut self, sorting: AccountSorting) -> Result<CmdResult> {
        commands::list::run(&mut self.svc, sorting)
    }

    pub fn show(&mut self, ids: &[u64]) -> Result<CmdResult> {
        commands::show::run(&mut self.svc, ids)
    }

    pub fn add(
        &mut self,
        name: &str,
        template: Option<&str>,
        edit: &RecordEdit,
    ) -> Result<CmdResult> {
        let spec = match template {
            Some(t) => Some(
                self.config
                    .template(t)
                    .ok_or_else(|| CsmError::Api(format!("unknown template '{}'", t)))?
                    .to_string(),
            ),
            None => None,
        };
        commands::add::run(&mut self.svc, name, spec.as_deref(), edit)
    }

    pub fn update(&mut self, id: u64, edit: &RecordEdit) -> Result<CmdResult> {
        commands::update::run(&mut self.svc, id, edit)
    }

    pub fn remove(&mut self, ids: &[u64]) -> Result<CmdResult> {
        commands::remove::run(&mut self.svc, ids)
    }

    pub fn labels(&mut self) -> Result<CmdResult> {
        commands::labels::run(&mut self.svc)
    }

    pub fn export(&mut self, out: &Path) -> Result<CmdResult> {
        commands::export::run(&mut self.svc, out)
    }
}
