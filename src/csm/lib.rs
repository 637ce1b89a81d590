//! # csm Architecture
//!
//! csm keeps account records (named sets of title/value fields with labels)
//! in one or more **sources**, each addressed by a locator such as
//! `file://work.ct`. It is a library that happens to have a CLI client.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, reads the environment, prints output   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API + Command Layer (api.rs, commands/*.rs)                │
//! │  - Resolves locators and templates, returns CmdResult       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Service Layer (service/)                                   │
//! │  - MultiSourceService routes by id across sources           │
//! │  - SingleSourceService owns one source's records            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────┬──────────────────┬───────────────────────┐
//! │ store/           │ codec/           │ cipher/               │
//! │ bytes <-> medium │ records <-> text │ text <-> armored blob │
//! └──────────────────┴──────────────────┴───────────────────────┘
//! ```
//!
//! A source is loaded as `storage -> cipher -> codec` and stored in the
//! reverse order. The medium (`file`, `mem`) and format (`t`, `ct`) of the
//! locator pick the backends.
//!
//! ## Record identity
//!
//! Ids are handed out by one [`registry::IdRegistry`] shared by every source
//! of a router, so an id names exactly one record in one source. Ids are not
//! persisted: loading a source assigns fresh ids in file order.
//!
//! Accepted records are locked. To change one, clone it (the clone is
//! unlocked and keeps the id), edit the clone and add it back; the router
//! sends it to the source that owns the id.
//!
//! ## Secrets in memory
//!
//! Decrypted text, field values and derived keys live in zeroizing buffers
//! and are scrubbed when dropped.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade, entry point for all operations
//! - [`commands`]: Business logic for each command
//! - [`service`]: Single-source service, multi-source router, tool kit
//! - [`store`]: Storage backends
//! - [`codec`]: Plain-text serialization
//! - [`cipher`]: Passphrase based encryption
//! - [`model`]: Account records
//! - [`locator`]: Source locators
//! - [`registry`]: Record id registry
//! - [`search`]: Search types and sorting
//! - [`config`]: Configuration management
//! - [`error`]: Error and status types
//! - `cli`: Argument parsing, logging set-up and rendering for the binary (not part of the lib API)

pub mod api;
pub mod cipher;
pub mod codec;
pub mod commands;
pub mod config;
pub mod error;
pub mod locator;
pub mod model;
pub mod registry;
pub mod search;
pub mod service;
pub mod store;
