//! Synchronization: the compaction algorithm
//!
//! [`Archive::sync`] reconciles the in-memory tree with the backing
//! file in four ordered phases, each picking up the file cursor where
//! the previous one left it:
//!
//! 1. **Reclaim**: overwrite tombstoned file byte ranges by shifting
//!    the surviving data leftward in place, then re-target every live
//!    offset to its compacted position.
//! 2. **Append**: copy still-uncommitted file payloads to the end of
//!    the data region.
//! 3. **Rewrite**: compact tombstoned slots out of the slab, remap
//!    every slot reference, and write the folder records, offset table
//!    and trailer.
//! 4. **Truncate**: shrink the file to the write position and clear
//!    the dirty state.
//!
//! There is no journal: a failure mid-sync leaves the file at whatever
//! sequential point writing stopped. Callers that need atomicity must
//! snapshot the file before syncing.

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};

use crate::codec;
use crate::error::Result;

use super::entry::EntryPayload;
use super::folder::Folder;
use super::format::trailer_offset;
use super::Archive;

impl Archive {
    /// Commit all batched in-memory edits to the backing file
    ///
    /// No-op when nothing changed since the last sync. On success the
    /// file is compacted to minimal size, every folder is marked
    /// synced, and previously held [`FolderId`](super::FolderId)s are
    /// stale (slots may have been remapped); re-derive them from
    /// [`Archive::root`].
    pub fn sync(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        self.reclaim_deleted()?;
        self.append_created()?;
        self.rewrite_folders()?;
        self.finalize()
    }

    // =========================================================================
    // Phase 1 : Reclaim Deleted File Byte Ranges
    // =========================================================================

    /// Overwrite tombstoned byte ranges with the data that follows them
    ///
    /// Collects `(start, end)` intervals from every unsynced live
    /// folder and from the detached side buffer, sorts them, and
    /// stream-copies each gap between consecutive intervals leftward
    /// through a second read-only handle on the pre-sync file contents.
    /// The shift is strictly leftward, so writes always trail the read
    /// cursor. Surviving committed offsets are then re-targeted by the
    /// cumulative reclaimed bytes preceding them.
    fn reclaim_deleted(&mut self) -> Result<()> {
        let mut intervals: Vec<(u64, u64)> = Vec::new();

        for folder in self.folders.iter().filter(|f| !f.deleted && !f.created) {
            collect_tombstoned(folder, &mut intervals);
        }
        for folder in &self.detached {
            collect_tombstoned(folder, &mut intervals);
        }

        if intervals.is_empty() {
            return Ok(());
        }

        intervals.sort_unstable_by_key(|interval| interval.0);
        intervals.push((self.end_data, self.end_data)); // sentinel

        let chunk = self.config.copy_buffer_size;
        let mut old_file = File::open(&self.path)?;

        self.file.seek(SeekFrom::Start(intervals[0].0))?;
        let mut write_pos = intervals[0].0;

        for i in 1..intervals.len() {
            let gap_start = intervals[i - 1].1;
            let gap_end = intervals[i].0;
            old_file.seek(SeekFrom::Start(gap_start))?;
            write_pos += codec::copy_limited(
                &mut old_file,
                &mut self.file,
                gap_end - gap_start,
                chunk,
            )?;
        }

        // Cumulative reclaimed bytes up to each interval boundary. The
        // prefix sum includes every interval, first one included; an
        // offset past interval k has exactly reclaimed[k+1] bytes
        // removed in front of it.
        let mut reclaimed = vec![0u64; intervals.len() + 1];
        for (i, interval) in intervals.iter().enumerate() {
            reclaimed[i + 1] = reclaimed[i] + (interval.1 - interval.0);
        }

        for folder in self.folders.iter_mut().filter(|f| !f.deleted && !f.created) {
            for entry in folder.entries.iter_mut().filter(|e| !e.deleted && !e.created) {
                if let EntryPayload::File { offset, .. } = &mut entry.payload {
                    let preceding = intervals.partition_point(|interval| interval.1 <= *offset);
                    *offset -= reclaimed[preceding];
                }
            }
        }

        tracing::debug!(
            "reclaimed {} bytes across {} deleted ranges",
            reclaimed[intervals.len()],
            intervals.len() - 1
        );

        self.end_data = write_pos;
        Ok(())
    }

    // =========================================================================
    // Phase 2 : Append New File Payloads
    // =========================================================================

    /// Copy every still-uncommitted file payload to the data region end
    ///
    /// Each source is opened, copied whole, and closed within this
    /// pass; the recorded offset/size make the entry committed. A
    /// vanished source fails the sync here, leaving the file at this
    /// sequential point.
    fn append_created(&mut self) -> Result<()> {
        let chunk = self.config.copy_buffer_size;

        self.file.seek(SeekFrom::Start(self.end_data))?;
        let mut write_pos = self.end_data;
        let mut appended_files = 0u64;

        for folder in self.folders.iter_mut().filter(|f| !f.deleted && !f.synced) {
            for entry in folder.entries.iter_mut().filter(|e| e.created) {
                if let EntryPayload::File { offset, size, source } = &mut entry.payload {
                    let source_path = source
                        .as_deref()
                        .expect("uncommitted file entry must carry its source path");

                    let mut source_file = File::open(source_path)?;
                    *offset = write_pos;
                    *size = codec::copy_limited(
                        &mut source_file,
                        &mut self.file,
                        u64::MAX,
                        chunk,
                    )?;
                    write_pos += *size;
                    appended_files += 1;
                    *source = None;
                } else {
                    continue;
                }
                entry.created = false;
            }
        }

        tracing::debug!(
            "appended {} new files ({} bytes)",
            appended_files,
            write_pos - self.end_data
        );

        self.end_data = write_pos;
        Ok(())
    }

    // =========================================================================
    // Phase 3 : Rewrite the Folder Table
    // =========================================================================

    /// Compact the slab and write folder records, offset table, trailer
    ///
    /// Tombstoned slots are dropped via swap-with-last; the resulting
    /// old→new remap rewrites every parent and child-slot reference.
    /// Tombstoned entries are physically erased, survivors keep their
    /// relative order. The records segment is assembled in memory and
    /// written in one pass after the data region, followed by the
    /// per-folder end-of-file-relative offsets, the folder count, and
    /// the data region end.
    fn rewrite_folders(&mut self) -> Result<()> {
        // Already reclaimed (phase 1) or superseded by the remap below.
        self.detached.clear();

        let remap = self.compact_slots();

        for folder in &mut self.folders {
            folder.parent = remap[folder.parent as usize];
            folder.entries.retain(|entry| !entry.deleted);
            for entry in &mut folder.entries {
                if let EntryPayload::Folder { slot } = &mut entry.payload {
                    *slot = remap[*slot as usize];
                }
            }
        }

        let folder_count = self.folders.len() as u16;
        let mut segment: Vec<u8> = Vec::new();
        let mut record_offsets = Vec::with_capacity(self.folders.len());

        for folder in &self.folders {
            record_offsets.push(segment.len() as i64);
            folder.write(&mut segment)?;
        }
        let records_len = segment.len() as i64;

        // Each record located relative to the final end of file, which
        // sits one offset table + fixed trailer past the records.
        for record_offset in record_offsets {
            let eof_relative = trailer_offset(folder_count) - records_len + record_offset;
            codec::write_i32(&mut segment, eof_relative as i32)?;
        }
        codec::write_u16(&mut segment, folder_count)?;
        codec::write_u64(&mut segment, self.end_data)?;

        self.file.write_all(&segment)?;

        tracing::debug!(
            "rewrote folder table: {} records, {} bytes",
            folder_count,
            segment.len()
        );
        Ok(())
    }

    /// Drop tombstoned slab slots, swapping the last live slot into
    /// each hole, and return the old→new index remap
    ///
    /// Slots that vanish (tombstones) keep their identity mapping in
    /// the remap; nothing surviving references them.
    fn compact_slots(&mut self) -> Vec<u16> {
        while self.folders.last().map_or(false, |f| f.deleted) {
            self.folders.pop();
        }

        let mut remap: Vec<u16> = (0..self.folders.len() as u16).collect();
        let mut slot = 0;
        while slot < self.folders.len() {
            if self.folders[slot].deleted {
                // The trailing pops guarantee the last slot is live, so
                // swap_remove always moves a live folder into the hole.
                let moved_from = self.folders.len() - 1;
                self.folders.swap_remove(slot);
                remap[moved_from] = slot as u16;

                while self.folders.last().map_or(false, |f| f.deleted) {
                    self.folders.pop();
                }
            }
            slot += 1;
        }
        remap
    }

    // =========================================================================
    // Phase 4 : Truncate and Finalize
    // =========================================================================

    /// Shrink the file to the write position and settle the state flags
    ///
    /// Compaction only ever shrinks the file. Every surviving folder
    /// and entry becomes committed and synced; the archive is clean.
    fn finalize(&mut self) -> Result<()> {
        self.file.flush()?;
        let file_len = self.file.stream_position()?;
        self.file.set_len(file_len)?;
        self.file.sync_all()?;

        self.dirty = false;
        for folder in &mut self.folders {
            folder.created = false;
            folder.synced = true;
            for entry in &mut folder.entries {
                entry.created = false;
            }
        }

        tracing::debug!("sync complete, archive is {} bytes", file_len);
        Ok(())
    }
}

/// Collect `(start, end)` intervals of tombstoned file entries from a
/// folder that is out of step with its disk image
fn collect_tombstoned(folder: &Folder, intervals: &mut Vec<(u64, u64)>) {
    if folder.synced {
        return;
    }
    for entry in &folder.entries {
        if !entry.deleted {
            continue;
        }
        if let EntryPayload::File { offset, size, .. } = entry.payload {
            intervals.push((offset, offset + size));
        }
    }
}
