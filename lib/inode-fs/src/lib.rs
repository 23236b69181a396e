//! An in-memory hierarchical filesystem for shell-like front ends.
//!
//! The filesystem is a tree of directories and plain files addressed by
//! an inode table. Plain files hold a sequence of words, directories hold
//! a name-ordered mapping of entries, including the special `.` and `..`
//! entries.
//!
//! ```text
//! InodeState   root, cwd, prompt, listing, path reconstruction
//!     │
//! InodeTable   slab of nodes, allocation, linking, reclamation
//!     │
//! Content      PlainFile (words) | Directory (name -> inode)
//! ```
//!
//! The crate is single-threaded: nothing here is `Sync`-aware and a
//! caller sharing a filesystem across threads must wrap the whole
//! [`InodeState`] in a lock.
//!
//! # Example
//!
//! ```
//! use inode_fs::InodeState;
//!
//! let mut fs = InodeState::new();
//! let root = fs.root();
//! let a = fs.table_mut().mkdir(root, "a").unwrap();
//! let b = fs.table_mut().mkdir(a, "b").unwrap();
//! assert_eq!(fs.get_path(b).unwrap(), "/a/b");
//! ```

use std::io;
use thiserror::Error;

pub mod config;
pub mod content;
pub mod inode;
pub mod state;
pub mod table;

pub use config::FsConfig;
pub use content::{Content, Directory, PlainFile};
pub use inode::{FileType, Inode, InodeNr, ROOT_INODE_NR};
pub use state::{InodeState, ListEntry};
pub use table::InodeTable;

pub type Result<T> = std::result::Result<T, FsError>;

/// Error type for external users
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum FsError {
    /// A file-only operation was used on a directory, or the other way around
    #[error("is a {0}")]
    WrongFileType(FileType),
    /// The name is already present in the directory
    #[error("{0}: already exists")]
    AlreadyExists(String),
    /// The name is not present in the directory
    #[error("{0}: no such file or directory")]
    NoSuchEntry(String),
    /// The directory still has entries besides `.` and `..`
    #[error("{0}: directory not empty")]
    NotEmpty(String),
    /// The directory is pinned, e.g. it is the current directory
    #[error("{0}: directory is in use")]
    Busy(String),
    /// The name cannot be used as a directory entry
    #[error("{0:?}: invalid name")]
    InvalidName(String),
    /// The handle refers to an inode that has been reclaimed
    #[error("inode {0} no longer exists")]
    StaleInode(InodeNr),
    /// The configured inode ceiling has been reached
    #[error("inode limit of {0} reached")]
    InodeLimit(usize),
    /// Writing output failed
    #[error("io error: {0}")]
    Io(String),
}

impl From<io::Error> for FsError {
    fn from(io_error: io::Error) -> Self {
        FsError::Io(io_error.to_string())
    }
}
