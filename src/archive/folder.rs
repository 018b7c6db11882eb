//! Folder nodes and handles
//!
//! A [`Folder`] is one node of the archive tree, owned by the archive's
//! slab and identified by its slot index. Callers never hold a folder
//! directly; they hold a [`FolderId`] and resolve it through the
//! archive on every call, so slab growth or compaction cannot leave a
//! dangling reference.

use std::io::{Read, Write};

use crate::archive::entry::Entry;
use crate::codec;
use crate::error::{PackError, Result};

/// Handle to a folder: a slab slot index resolved through the archive
///
/// Copyable and cheap. A `FolderId` stays valid across in-memory
/// mutation, but slots are remapped by [`Archive::sync`]
/// (compaction); ids obtained before a sync must be re-derived from
/// the root afterwards. Using a stale id is a programming error and
/// panics rather than corrupting data.
///
/// [`Archive::sync`]: crate::Archive::sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FolderId(pub(crate) u16);

impl FolderId {
    /// The raw slab slot index
    pub fn slot(&self) -> u16 {
        self.0
    }
}

/// One node of the folder tree
#[derive(Debug, Clone)]
pub(crate) struct Folder {
    /// Slot index of the parent; the root is its own parent.
    pub(crate) parent: u16,

    /// Ordered entry sequence. Insertion order is significant and is
    /// preserved across compaction.
    pub(crate) entries: Vec<Entry>,

    /// True until the first successful sync writes this folder's record.
    pub(crate) created: bool,

    /// Tombstone: the slot is free for reuse and will be compacted out
    /// by the next sync.
    pub(crate) deleted: bool,

    /// False when this folder's entries differ from their on-disk image.
    pub(crate) synced: bool,
}

impl Folder {
    /// Build a fresh, empty folder under the given parent
    pub(crate) fn fresh(parent: u16) -> Self {
        Self {
            parent,
            entries: Vec::new(),
            created: true,
            deleted: false,
            synced: false,
        }
    }

    /// Build an empty tombstone placeholder for a released slot
    pub(crate) fn tombstone() -> Self {
        Self {
            parent: 0,
            entries: Vec::new(),
            created: false,
            deleted: true,
            synced: false,
        }
    }

    /// Iterate live (non-tombstoned) entries with their raw sequence
    /// positions
    pub(crate) fn live_entries(&self) -> impl Iterator<Item = (usize, &Entry)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.deleted)
    }

    // =========================================================================
    // Wire Format
    // =========================================================================

    /// Deserialize one folder record
    pub(crate) fn read<R: Read>(reader: &mut R, slot_limit: u16) -> Result<Self> {
        let parent = codec::read_u16(reader)?;
        if parent >= slot_limit {
            return Err(PackError::Corruption(format!(
                "folder record references parent slot {} of {}",
                parent, slot_limit
            )));
        }
        let entry_count = codec::read_u16(reader)?;

        let mut entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            entries.push(Entry::read(reader, slot_limit)?);
        }

        Ok(Self {
            parent,
            entries,
            created: false,
            deleted: false,
            synced: true,
        })
    }

    /// Serialize this folder's record: parent, entry count, entries
    pub(crate) fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        codec::write_u16(writer, self.parent)?;
        codec::write_u16(writer, self.entries.len() as u16)?;
        for entry in &self.entries {
            entry.write(writer)?;
        }
        Ok(())
    }
}
