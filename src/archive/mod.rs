//! Archive Module
//!
//! The container engine: owns the backing file, the folder slab, and
//! the dirty-tracking state that the sync algorithm reconciles with
//! disk.
//!
//! ## Responsibilities
//! - Open or create the backing file, loading the folder tree from the
//!   trailer-anchored records
//! - Resolve [`FolderId`] handles and navigate the tree
//! - Batch mutations (add/remove entries, allocate/release folder
//!   slots) purely in memory, propagating dirty flags upward
//! - Commit batched edits with [`Archive::sync`] (see `sync.rs`)
//!
//! ## Identity Model
//! Folders are identified by slab slot; entries are identified by their
//! position in the owning folder's sequence, as yielded by
//! [`Archive::entries`]. Both are re-resolved through the archive on
//! every call, so no raw references dangle when the slab or a sequence
//! is mutated underneath the caller.

mod entry;
mod folder;
mod format;
mod sync;

use std::fs::{File, OpenOptions};
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::codec;
use crate::config::Config;
use crate::error::{PackError, Result};

pub use entry::{Entry, EntryKind};
pub use folder::FolderId;
pub use format::{trailer_offset, OFFSET_SLOT_SIZE, TRAILER_SIZE};

use entry::EntryPayload;
use folder::Folder;

/// A single-file hierarchical archive
///
/// All folder/entry state lives in memory; the backing file is touched
/// only by [`Archive::open`], [`Archive::extract`] and
/// [`Archive::sync`]. The archive owns its file handle exclusively and
/// is strictly single-threaded.
pub struct Archive {
    /// Path of the backing file (reopened read-only during reclaim)
    path: PathBuf,

    /// The backing file handle, exclusively owned
    file: File,

    /// End of the contiguous data region / start of the folder records
    end_data: u64,

    /// Folder slab: slot-indexed, tombstone slots reusable
    folders: Vec<Folder>,

    /// Folders removed wholesale this session that existed on disk;
    /// kept so the reclaim phase still sees their file byte ranges
    detached: Vec<Folder>,

    /// True whenever in-memory state differs from the synced disk image
    dirty: bool,

    config: Config,
}

impl Archive {
    // =========================================================================
    // Open / Load
    // =========================================================================

    /// Open an archive with the default [`Config`]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, Config::default())
    }

    /// Open an archive, creating it if missing when the config says so
    ///
    /// A newly created archive holds a single empty root folder and is
    /// dirty: it must be synced once before it can be reloaded.
    pub fn open_with(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(mut file) => {
                // A zero-length file is an archive that was created but
                // never synced; start it over rather than reject it.
                if file.metadata()?.len() == 0 {
                    tracing::info!("initializing empty archive {}", path.display());
                    return Ok(Self {
                        path,
                        file,
                        end_data: 0,
                        folders: vec![Folder::fresh(0)],
                        detached: Vec::new(),
                        dirty: true,
                        config,
                    });
                }

                let (folders, end_data) = Self::load(&mut file)?;
                tracing::info!(
                    "opened archive {} ({} folders, {} data bytes)",
                    path.display(),
                    folders.len(),
                    end_data
                );
                Ok(Self {
                    path,
                    file,
                    end_data,
                    folders,
                    detached: Vec::new(),
                    dirty: false,
                    config,
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound && config.create_if_missing => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .open(&path)?;
                tracing::info!("creating new archive {}", path.display());

                // Root folder: slot 0, its own parent.
                Ok(Self {
                    path,
                    file,
                    end_data: 0,
                    folders: vec![Folder::fresh(0)],
                    detached: Vec::new(),
                    dirty: true,
                    config,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Load the folder tree from the trailer-anchored records
    ///
    /// Mirror of the sync algorithm's output: read the fixed trailer
    /// assuming zero folders, re-seek with the now-known folder count,
    /// read the offset table, then deserialize each record.
    fn load(file: &mut File) -> Result<(Vec<Folder>, u64)> {
        let file_len = file.metadata()?.len();
        if file_len < TRAILER_SIZE {
            return Err(PackError::Corruption(format!(
                "file too small to hold a trailer ({} bytes)",
                file_len
            )));
        }

        let mut reader = BufReader::new(file);

        reader.seek(SeekFrom::End(trailer_offset(0)))?;
        let folder_count = codec::read_u16(&mut reader)?;
        let end_data = codec::read_u64(&mut reader)?;

        if folder_count == 0 {
            return Err(PackError::Corruption("archive has no folders".to_string()));
        }
        if end_data > file_len {
            return Err(PackError::Corruption(format!(
                "data region end {} past file end {}",
                end_data, file_len
            )));
        }

        reader.seek(SeekFrom::End(trailer_offset(folder_count)))?;
        let mut record_offsets = Vec::with_capacity(folder_count as usize);
        for _ in 0..folder_count {
            record_offsets.push(codec::read_i32(&mut reader)?);
        }

        let mut folders = Vec::with_capacity(folder_count as usize);
        for offset in record_offsets {
            reader.seek(SeekFrom::End(offset as i64))?;
            folders.push(Folder::read(&mut reader, folder_count)?);
        }

        Ok((folders, end_data))
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Handle to the root folder (slot 0)
    pub fn root(&self) -> FolderId {
        FolderId(0)
    }

    /// Handle to a folder's parent; the root resolves to itself
    pub fn parent(&self, folder: FolderId) -> FolderId {
        FolderId(self.folder(folder).parent)
    }

    /// Resolve the folder referenced by the entry at `index`
    ///
    /// Fails with `NotAFolder` if the addressed entry is a file.
    pub fn child_folder(&self, folder: FolderId, index: usize) -> Result<FolderId> {
        self.folder(folder).entries[index]
            .child_slot()
            .map(FolderId)
            .ok_or(PackError::NotAFolder)
    }

    /// Iterate a folder's live entries with their sequence positions
    ///
    /// Tombstoned entries are skipped; order is preserved. The yielded
    /// positions address entries in [`Archive::remove`],
    /// [`Archive::extract`] and [`Archive::child_folder`], and are
    /// valid only until the next mutation of this folder.
    pub fn entries(&self, folder: FolderId) -> impl Iterator<Item = (usize, &Entry)> {
        self.folder(folder).live_entries()
    }

    // =========================================================================
    // Mutation (in-memory only; committed by sync)
    // =========================================================================

    /// Add an empty sub-folder, returning its handle
    ///
    /// Reuses the first tombstoned slab slot if one exists, otherwise
    /// grows the slab.
    pub fn add_folder(&mut self, folder: FolderId, name: &str) -> Result<FolderId> {
        validate_name(name)?;
        self.folder(folder); // resolve before allocating, to fail loudly on a stale id

        let slot = self.alloc_slot(folder.0);
        let entry = Entry::new_folder(name.to_string(), slot);
        self.folder_mut(folder).entries.push(entry);
        self.mark_unsynced(folder);
        Ok(FolderId(slot))
    }

    /// Add a file entry recording the external source to copy on sync
    ///
    /// No bytes move until [`Archive::sync`]; until then the entry is
    /// uncommitted and cannot be extracted.
    pub fn add_file(&mut self, folder: FolderId, name: &str, source: impl AsRef<Path>) -> Result<()> {
        validate_name(name)?;
        let entry = Entry::new_file(name.to_string(), source.as_ref().to_path_buf());
        self.folder_mut(folder).entries.push(entry);
        self.mark_unsynced(folder);
        Ok(())
    }

    /// Remove the entry at `index` from a folder's sequence
    ///
    /// A folder entry tears down the referenced subtree deepest-first
    /// and releases its slot. Entries never committed are erased
    /// immediately; committed entries are tombstoned until the next
    /// sync reclaims their disk resources.
    pub fn remove(&mut self, folder: FolderId, index: usize) {
        self.folder(folder); // fail loudly on a stale id
        self.remove_at(folder.0, index);
    }

    /// Copy a committed file entry's bytes to a new file at `destination`
    ///
    /// Fails with `NotAFile` on a folder entry and `NotCommitted` on a
    /// file entry that has not been synced yet (it has no on-disk byte
    /// range to copy).
    pub fn extract(
        &mut self,
        folder: FolderId,
        index: usize,
        destination: impl AsRef<Path>,
    ) -> Result<()> {
        let entry = &self.folder(folder).entries[index];
        let (offset, size) = match entry.payload {
            EntryPayload::Folder { .. } => return Err(PackError::NotAFile),
            EntryPayload::File { offset, size, .. } => {
                if entry.created {
                    return Err(PackError::NotCommitted);
                }
                (offset, size)
            }
        };

        let mut destination = File::create(destination)?;
        self.file.seek(SeekFrom::Start(offset))?;
        codec::copy_limited(
            &mut self.file,
            &mut destination,
            size,
            self.config.copy_buffer_size,
        )?;
        Ok(())
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of slab slots, live and tombstoned
    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    /// Size of the data region in bytes
    pub fn data_size(&self) -> u64 {
        self.end_data
    }

    /// Whether in-memory state differs from the synced disk image
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Resolve a handle to its slab slot, failing loudly on misuse
    fn folder(&self, id: FolderId) -> &Folder {
        let folder = &self.folders[id.0 as usize];
        debug_assert!(!folder.deleted, "stale FolderId: slot {} is tombstoned", id.0);
        folder
    }

    fn folder_mut(&mut self, id: FolderId) -> &mut Folder {
        let folder = &mut self.folders[id.0 as usize];
        debug_assert!(!folder.deleted, "stale FolderId: slot {} is tombstoned", id.0);
        folder
    }

    /// Mark a folder out of step with its disk image
    fn mark_unsynced(&mut self, folder: FolderId) {
        self.folders[folder.0 as usize].synced = false;
        self.dirty = true;
    }

    /// Allocate a slab slot: revive the first tombstone or grow
    fn alloc_slot(&mut self, parent: u16) -> u16 {
        if let Some(slot) = self.folders.iter().position(|f| f.deleted) {
            self.folders[slot] = Folder::fresh(parent);
            slot as u16
        } else {
            assert!(
                self.folders.len() < u16::MAX as usize,
                "folder slab exceeds {} slots",
                u16::MAX
            );
            self.folders.push(Folder::fresh(parent));
            (self.folders.len() - 1) as u16
        }
    }

    /// Release a folder slot, detaching committed content for reclaim
    ///
    /// A slot that was never synced has nothing on disk; it resets in
    /// place. A committed slot moves its content to the detached buffer
    /// so the next reclaim phase can still see its file byte ranges.
    fn release_slot(&mut self, slot: u16) {
        let folder = &mut self.folders[slot as usize];
        if folder.created {
            *folder = Folder::tombstone();
        } else {
            let detached = std::mem::replace(folder, Folder::tombstone());
            self.detached.push(detached);
        }
    }

    /// Remove the entry at `index` of the folder in `slot`
    ///
    /// Folder entries recurse deepest-first so nested folders are torn
    /// down before their own slot is released. Reverse iteration keeps
    /// positions stable while fresh entries are erased in place.
    fn remove_at(&mut self, slot: u16, index: usize) {
        if let Some(child) = self.folders[slot as usize].entries[index].child_slot() {
            let entry_count = self.folders[child as usize].entries.len();
            for i in (0..entry_count).rev() {
                self.remove_at(child, i);
            }
            self.release_slot(child);
        }

        let folder = &mut self.folders[slot as usize];
        let entry = &mut folder.entries[index];
        if entry.created {
            folder.entries.remove(index);
        } else {
            entry.deleted = true;
        }
        folder.synced = false;
        self.dirty = true;
    }
}

/// Reject names the on-disk format cannot represent
fn validate_name(name: &str) -> Result<()> {
    if name.contains('\0') {
        return Err(PackError::InvalidName(name.replace('\0', "\\0")));
    }
    Ok(())
}

// =============================================================================
// Unit Tests: trailer arithmetic (pure, no I/O)
// =============================================================================
