//! Directory entries
//!
//! An [`Entry`] is one record in a folder's sequence: either a file
//! (a byte range in the archive's data region) or a reference to a
//! child folder slot. Entries own no resources; they are value types
//! serialized inline in their folder's record.

use std::io::{Read, Write};
use std::path::PathBuf;

use crate::codec;
use crate::error::{PackError, Result};

/// Entry discriminant as stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File = 0,
    Folder = 1,
}

/// Payload of an entry, by kind
///
/// The on-disk format overlays these on one offset field; in memory
/// they are distinct variants.
#[derive(Debug, Clone)]
pub(crate) enum EntryPayload {
    /// A file: byte range in the data region. `source` is the external
    /// path to copy from, present only until the entry is committed.
    File {
        offset: u64,
        size: u64,
        source: Option<PathBuf>,
    },

    /// A sub-folder: slab slot of the referenced folder.
    Folder { slot: u16 },
}

/// One record in a folder's entry sequence
#[derive(Debug, Clone)]
pub struct Entry {
    pub(crate) name: String,
    pub(crate) payload: EntryPayload,

    /// True from construction until the first successful sync commits
    /// the entry to disk.
    pub(crate) created: bool,

    /// Tombstone: logically removed, surviving until the next sync
    /// frees its disk resources.
    pub(crate) deleted: bool,
}

impl Entry {
    /// Build a fresh file entry recording its external source path
    pub(crate) fn new_file(name: String, source: PathBuf) -> Self {
        Self {
            name,
            payload: EntryPayload::File {
                offset: 0,
                size: 0,
                source: Some(source),
            },
            created: true,
            deleted: false,
        }
    }

    /// Build a fresh folder entry referencing a slab slot
    pub(crate) fn new_folder(name: String, slot: u16) -> Self {
        Self {
            name,
            payload: EntryPayload::Folder { slot },
            created: true,
            deleted: false,
        }
    }

    /// Entry name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entry kind (file or folder)
    pub fn kind(&self) -> EntryKind {
        match self.payload {
            EntryPayload::File { .. } => EntryKind::File,
            EntryPayload::Folder { .. } => EntryKind::Folder,
        }
    }

    /// Payload size in bytes; zero for folders and uncommitted files
    pub fn size(&self) -> u64 {
        match self.payload {
            EntryPayload::File { size, .. } => size,
            EntryPayload::Folder { .. } => 0,
        }
    }

    /// Byte offset in the data region; meaningful only for committed
    /// file entries
    pub fn offset(&self) -> u64 {
        match self.payload {
            EntryPayload::File { offset, .. } => offset,
            EntryPayload::Folder { .. } => 0,
        }
    }

    /// Whether the entry has been written to the archive file
    pub fn is_committed(&self) -> bool {
        !self.created
    }

    /// Child slot for folder entries
    pub(crate) fn child_slot(&self) -> Option<u16> {
        match self.payload {
            EntryPayload::Folder { slot } => Some(slot),
            EntryPayload::File { .. } => None,
        }
    }

    // =========================================================================
    // Wire Format
    // =========================================================================

    /// Deserialize one entry from a folder record
    ///
    /// `slot_limit` is the folder count from the trailer; a child slot
    /// at or past it means the record is corrupt.
    pub(crate) fn read<R: Read>(reader: &mut R, slot_limit: u16) -> Result<Self> {
        let tag = codec::read_u8(reader)?;
        let payload = match tag {
            0 => {
                let offset = codec::read_u64(reader)?;
                let size = codec::read_u64(reader)?;
                EntryPayload::File {
                    offset,
                    size,
                    source: None,
                }
            }
            1 => {
                let slot = codec::read_u32(reader)?;
                if slot >= slot_limit as u32 {
                    return Err(PackError::Corruption(format!(
                        "folder entry references slot {} of {}",
                        slot, slot_limit
                    )));
                }
                EntryPayload::Folder { slot: slot as u16 }
            }
            _ => {
                return Err(PackError::Corruption(format!(
                    "unknown entry type tag: 0x{:02x}",
                    tag
                )));
            }
        };
        let name = codec::read_name(reader)?;

        Ok(Self {
            name,
            payload,
            created: false,
            deleted: false,
        })
    }

    /// Serialize one entry into a folder record
    ///
    /// Only committed entries are ever written: the sync phases clear
    /// `created` (and the source path) before folder records are built.
    pub(crate) fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        codec::write_u8(writer, self.kind() as u8)?;
        match self.payload {
            EntryPayload::File { offset, size, .. } => {
                codec::write_u64(writer, offset)?;
                codec::write_u64(writer, size)?;
            }
            EntryPayload::Folder { slot } => {
                codec::write_u32(writer, slot as u32)?;
            }
        }
        codec::write_name(writer, &self.name)
    }
}
