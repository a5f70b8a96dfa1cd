//! # kb-ingest
//!
//! Stores a knowledge-base text file as a single document in a persistent
//! local collection, embedding it on the way in.
//!
//! ```text
//! ┌─────────┐   ┌──────────┐   ┌───────────┐   ┌──────────────┐
//! │ kb.txt  │──▶│  Ingest  │──▶│ Embedding │──▶│ SQLite store │
//! └─────────┘   └──────────┘   └───────────┘   │   ./db/      │
//!                                              └──────────────┘
//! ```
//!
//! ```bash
//! kb-ingest                     # store ./kb.txt as `kb` in collection `docs`
//! kb-ingest --upsert            # replace the stored document
//! kb-ingest get                 # print the stored document
//! kb-ingest collections         # list collections and document counts
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and defaults |
//! | [`models`] | Collections, documents, write outcomes |
//! | [`store`] | Storage trait, SQLite and in-memory backends |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema |
//! | [`embedding`] | Embedding providers |
//! | [`ingest`] | The read → embed → store pipeline |
//! | [`get`] | Read-side commands |

pub mod config;
pub mod db;
pub mod embedding;
pub mod get;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod store;
