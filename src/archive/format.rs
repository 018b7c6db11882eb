//! On-disk layout
//!
//! The archive is one seekable file, anchored from its tail:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Data Region [0 .. end_data)                             │
//! │   concatenated payload bytes of all committed files     │
//! ├─────────────────────────────────────────────────────────┤
//! │ Folder Records (variable), one per slab slot:           │
//! │   Parent: u16 | EntryCount: u16                         │
//! │   EntryCount × Entry:                                   │
//! │     Type: u8 (0 = File, 1 = Folder)                     │
//! │     File:   Offset: u64 | Size: u64                     │
//! │     Folder: ChildSlot: u32                              │
//! │     Name: bytes + NUL                                   │
//! ├─────────────────────────────────────────────────────────┤
//! │ Offset Table: FolderCount × i32, each locating one      │
//! │   folder record relative to the end of the file         │
//! ├─────────────────────────────────────────────────────────┤
//! │ Trailer: FolderCount: u16 | EndData: u64  (= EOF)       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! All multi-byte integers are big-endian. There is no magic number:
//! the fixed-size trailer sits at a computable distance from the end of
//! the file, and everything else is located from it.

/// Size of the fixed trailer: FolderCount (2) + EndData (8)
pub const TRAILER_SIZE: u64 = 10;

/// Size of one offset-table slot
pub const OFFSET_SLOT_SIZE: u64 = 4;

/// Seek offset of the offset table + trailer, relative to end of file
///
/// With `folder_count` set to zero this locates the fixed trailer
/// itself, which is how loading bootstraps before the count is known.
pub const fn trailer_offset(folder_count: u16) -> i64 {
    -((TRAILER_SIZE + OFFSET_SLOT_SIZE * folder_count as u64) as i64)
}
