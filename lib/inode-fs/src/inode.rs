//! Inode identity types and the node record stored in the table.

use std::fmt;

use crate::content::Content;

/// Inode number shown to users. Assigned from a counter starting at 1,
/// never reused while the table lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct InodeNr(pub u64);

impl InodeNr {
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InodeNr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The root directory is always the first inode allocated.
pub const ROOT_INODE_NR: InodeNr = InodeNr(1);

/// Type tag of an inode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileType {
    Plain,
    Directory,
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::Plain => f.write_str("plain file"),
            FileType::Directory => f.write_str("directory"),
        }
    }
}

/// Handle to an inode in an [`InodeTable`](crate::InodeTable).
///
/// `slot` locates the node in the arena, `nr` is checked against the node
/// found there so that a handle outliving its inode is detected instead of
/// aliasing whatever was allocated into the same slot afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Inode {
    pub(crate) slot: usize,
    pub(crate) nr: InodeNr,
}

impl Inode {
    /// The user-visible inode number.
    #[inline]
    pub fn nr(self) -> InodeNr {
        self.nr
    }
}

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) nr: InodeNr,
    pub(crate) content: Content,
    /// Directory entries naming this node (its own `.` excluded) plus
    /// external pins. The node is reclaimed when this reaches zero.
    pub(crate) links: usize,
}

impl Node {
    pub(crate) fn new(nr: InodeNr, content: Content) -> Self {
        Self {
            nr,
            content,
            links: 0,
        }
    }

    pub(crate) fn file_type(&self) -> FileType {
        self.content.file_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(InodeNr(42).to_string(), "42");
        assert_eq!(FileType::Plain.to_string(), "plain file");
        assert_eq!(FileType::Directory.to_string(), "directory");
    }

    #[test]
    fn test_node_type_follows_content() {
        let file = Node::new(InodeNr(2), Content::new(FileType::Plain));
        let dir = Node::new(InodeNr(3), Content::new(FileType::Directory));

        assert_eq!(file.file_type(), FileType::Plain);
        assert_eq!(dir.file_type(), FileType::Directory);
        assert_eq!(file.links, 0, "a fresh node is unreferenced");
    }
}
