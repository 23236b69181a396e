//! Type-specific payload of an inode.
//!
//! Operations that only touch one node's payload live here. Operations
//! that allocate or free inodes (`mkdir`, `mkfile`, `remove`) need the
//! whole arena and live on [`InodeTable`](crate::InodeTable).

use std::collections::BTreeMap;

use crate::inode::{FileType, Inode};
use crate::{FsError, Result};

/// Payload of an inode: a word sequence or a directory mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Plain(PlainFile),
    Directory(Directory),
}

impl Content {
    /// Empty content of the given type.
    pub fn new(file_type: FileType) -> Self {
        match file_type {
            FileType::Plain => Content::Plain(PlainFile::default()),
            FileType::Directory => Content::Directory(Directory::default()),
        }
    }

    pub fn file_type(&self) -> FileType {
        match self {
            Content::Plain(_) => FileType::Plain,
            Content::Directory(_) => FileType::Directory,
        }
    }

    /// Word count for a plain file, entry count for a directory.
    pub fn size(&self) -> usize {
        match self {
            Content::Plain(file) => file.size(),
            Content::Directory(dir) => dir.size(),
        }
    }

    pub fn read_file(&self) -> Result<&[String]> {
        self.as_plain().map(PlainFile::read_file)
    }

    pub fn write_file<S: AsRef<str>>(&mut self, words: &[S]) -> Result<()> {
        self.as_plain_mut()?.write_file(words);
        Ok(())
    }

    /// Owned copy of a plain file's words.
    pub fn data(&self) -> Result<Vec<String>> {
        self.read_file().map(<[String]>::to_vec)
    }

    /// All entries of a directory, `.` and `..` included, in name order.
    pub fn dirents(&self) -> Result<&BTreeMap<String, Inode>> {
        self.as_directory().map(Directory::entries)
    }

    pub fn as_plain(&self) -> Result<&PlainFile> {
        match self {
            Content::Plain(file) => Ok(file),
            Content::Directory(_) => Err(FsError::WrongFileType(FileType::Directory)),
        }
    }

    pub fn as_plain_mut(&mut self) -> Result<&mut PlainFile> {
        match self {
            Content::Plain(file) => Ok(file),
            Content::Directory(_) => Err(FsError::WrongFileType(FileType::Directory)),
        }
    }

    pub fn as_directory(&self) -> Result<&Directory> {
        match self {
            Content::Directory(dir) => Ok(dir),
            Content::Plain(_) => Err(FsError::WrongFileType(FileType::Plain)),
        }
    }

    pub(crate) fn as_directory_mut(&mut self) -> Result<&mut Directory> {
        match self {
            Content::Directory(dir) => Ok(dir),
            Content::Plain(_) => Err(FsError::WrongFileType(FileType::Plain)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlainFile {
    words: Vec<String>,
}

impl PlainFile {
    pub fn size(&self) -> usize {
        self.words.len()
    }

    pub fn read_file(&self) -> &[String] {
        &self.words
    }

    /// Replace the contents with `words` minus its first two elements,
    /// which are the command tokens of the caller.
    ///
    /// An empty `words` leaves a single empty word behind, marking the
    /// file as touched but empty.
    pub fn write_file<S: AsRef<str>>(&mut self, words: &[S]) {
        if words.is_empty() {
            self.words = vec![String::new()];
            return;
        }
        self.words = words
            .iter()
            .skip(2)
            .map(|word| word.as_ref().to_owned())
            .collect();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    entries: BTreeMap<String, Inode>,
}

impl Directory {
    pub const SELF: &'static str = ".";
    pub const PARENT: &'static str = "..";

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &BTreeMap<String, Inode> {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<Inode> {
        self.entries.get(name).copied()
    }

    /// The `..` entry. Every initialized directory has one.
    pub fn parent(&self) -> Option<Inode> {
        self.get(Self::PARENT)
    }

    /// Entries other than `.` and `..`.
    pub fn children(&self) -> impl Iterator<Item = (&str, Inode)> {
        self.entries
            .iter()
            .filter(|(name, _)| !is_special(name))
            .map(|(name, inode)| (name.as_str(), *inode))
    }

    /// Name under which `child` is registered, ignoring `.` and `..`.
    pub fn name_of(&self, child: Inode) -> Option<&str> {
        self.children()
            .find(|(_, inode)| *inode == child)
            .map(|(name, _)| name)
    }

    /// True when only `.` and `..` are present.
    pub fn is_empty(&self) -> bool {
        self.children().next().is_none()
    }

    pub(crate) fn initialize_root(&mut self, root: Inode) {
        self.entries.insert(Self::PARENT.to_owned(), root);
        self.entries.insert(Self::SELF.to_owned(), root);
    }

    pub(crate) fn initialize_directory(&mut self, parent: Inode, current: Inode) {
        self.entries.insert(Self::PARENT.to_owned(), parent);
        self.entries.insert(Self::SELF.to_owned(), current);
    }

    pub(crate) fn insert(&mut self, name: &str, inode: Inode) -> Option<Inode> {
        self.entries.insert(name.to_owned(), inode)
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Inode> {
        self.entries.remove(name)
    }
}

/// `.` or `..`.
pub fn is_special(name: &str) -> bool {
    name == Directory::SELF || name == Directory::PARENT
}
