//! # packfs
//!
//! A single-file hierarchical archive: a tree of folders holding files
//! and sub-folders, persisted in one seekable binary file, with
//! in-memory mutation batched and committed by an explicit `sync`.
//!
//! - Folder slab with tombstone slot reuse
//! - Dirty tracking from entry to folder to archive
//! - Compact-on-sync storage: deleted byte ranges are reclaimed in
//!   place, new payloads appended, the folder table rewritten, and the
//!   file truncated to minimal size
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Shell (optional)                      │
//! │            name → index resolution, dispatch loop           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Archive                              │
//! │     folder slab · detached buffer · dirty flag · sync       │
//! └────────┬────────────────────────┬───────────────────────────┘
//!          │                        │
//!          ▼                        ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │Folder/Entry │          │    Codec    │
//!   │ (in-memory  │          │ (big-endian │
//!   │  tree state)│          │  + names)   │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │ Backing File│
//!                           │ (one, owned)│
//!                           └─────────────┘
//! ```
//!
//! The archive is strictly single-threaded and single-writer: every
//! operation either mutates memory or performs blocking file I/O, and
//! all of it goes through the `Archive` value.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod archive;
pub mod shell;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{PackError, Result};
pub use config::Config;
pub use archive::{Archive, Entry, EntryKind, FolderId};
pub use shell::Shell;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of packfs
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
