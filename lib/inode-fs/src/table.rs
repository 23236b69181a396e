//! The inode table: every node of one filesystem, indexed in a slab.
//!
//! Directory entries hold [`Inode`] handles rather than owning their
//! targets, so the `.`/`..` back-edges are plain data. Ownership is kept
//! with a link count per node: each directory entry naming a node (its
//! own `.` excepted) counts once, and so does each external pin such as
//! the root or the current directory. A node whose count drops to zero is
//! taken out of the slab and the references it held are dropped in turn.

use std::collections::BTreeMap;
use std::fmt;

use slab::Slab;

use crate::content::{is_special, Content, Directory};
use crate::inode::{FileType, Inode, InodeNr, Node, ROOT_INODE_NR};
use crate::{FsError, Result};

pub struct InodeTable {
    storage: Slab<Node>,
    root: Inode,
    next_nr: u64,
    max_inodes: Option<usize>,
}

impl InodeTable {
    /// Create a table holding only a self-referential root directory.
    ///
    /// `max_inodes` caps the number of live inodes besides the root.
    pub fn new(max_inodes: Option<usize>) -> Self {
        let mut storage = Slab::new();
        let slot = storage.insert(Node::new(
            ROOT_INODE_NR,
            Content::new(FileType::Directory),
        ));
        let root = Inode {
            slot,
            nr: ROOT_INODE_NR,
        };

        let node = &mut storage[slot];
        if let Content::Directory(dir) = &mut node.content {
            dir.initialize_root(root);
        }
        // The table itself holds the root.
        node.links = 1;

        tracing::trace!(inode = %root.nr, "root initialized");

        Self {
            storage,
            root,
            next_nr: ROOT_INODE_NR.get() + 1,
            max_inodes,
        }
    }

    pub fn root(&self) -> Inode {
        self.root
    }

    /// Number of live inodes, root included.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Whether `inode` still refers to a live node.
    pub fn contains(&self, inode: Inode) -> bool {
        self.node(inode).is_ok()
    }

    pub fn content(&self, inode: Inode) -> Result<&Content> {
        self.node(inode).map(|node| &node.content)
    }

    pub fn file_type(&self, inode: Inode) -> Result<FileType> {
        self.node(inode).map(Node::file_type)
    }

    /// Word count for a plain file, entry count for a directory.
    pub fn size(&self, inode: Inode) -> Result<usize> {
        self.content(inode).map(Content::size)
    }

    pub fn read_file(&self, inode: Inode) -> Result<&[String]> {
        self.content(inode)?.read_file()
    }

    /// See [`PlainFile::write_file`](crate::PlainFile::write_file).
    pub fn write_file<S: AsRef<str>>(&mut self, inode: Inode, words: &[S]) -> Result<()> {
        let node = self.node_mut(inode)?;
        node.content.write_file(words)?;
        tracing::trace!(inode = %node.nr, size = node.content.size(), "writefile");
        Ok(())
    }

    pub fn data(&self, inode: Inode) -> Result<Vec<String>> {
        self.content(inode)?.data()
    }

    pub fn dirents(&self, inode: Inode) -> Result<&BTreeMap<String, Inode>> {
        self.content(inode)?.dirents()
    }

    pub fn directory(&self, inode: Inode) -> Result<&Directory> {
        self.content(inode)?.as_directory()
    }

    /// Look `name` up in directory `dir`.
    pub fn lookup(&self, dir: Inode, name: &str) -> Result<Inode> {
        self.directory(dir)?
            .get(name)
            .ok_or_else(|| FsError::NoSuchEntry(name.to_owned()))
    }

    /// Create an empty directory `name` inside `dir`.
    ///
    /// The new directory's `..` is `dir` itself.
    pub fn mkdir(&mut self, dir: Inode, name: &str) -> Result<Inode> {
        validate_name(name)?;
        if self.directory(dir)?.get(name).is_some() {
            return Err(FsError::AlreadyExists(name.to_owned()));
        }

        let new_dir = self.alloc(FileType::Directory)?;
        self.node_mut(new_dir)?
            .content
            .as_directory_mut()?
            .initialize_directory(dir, new_dir);
        self.link(dir)?;
        self.insert_entry(dir, name, new_dir)?;

        tracing::trace!(parent = %dir.nr, inode = %new_dir.nr, name, "mkdir");
        Ok(new_dir)
    }

    /// Create an empty plain file `name` inside `dir`.
    ///
    /// When `name` already names a plain file that file is returned
    /// untouched, so a following [`write_file`](Self::write_file)
    /// overwrites it. A directory of that name is an error.
    pub fn mkfile(&mut self, dir: Inode, name: &str) -> Result<Inode> {
        validate_name(name)?;
        if let Some(existing) = self.directory(dir)?.get(name) {
            return match self.file_type(existing)? {
                FileType::Plain => {
                    tracing::trace!(inode = %existing.nr, name, "mkfile reuses existing file");
                    Ok(existing)
                }
                FileType::Directory => Err(FsError::AlreadyExists(name.to_owned())),
            };
        }

        let new_file = self.alloc(FileType::Plain)?;
        self.insert_entry(dir, name, new_file)?;

        tracing::trace!(parent = %dir.nr, inode = %new_file.nr, name, "mkfile");
        Ok(new_file)
    }

    /// Remove entry `name` from `dir`.
    ///
    /// Plain files are always removed. A directory is removed only when
    /// it holds nothing but `.` and `..` and nothing else pins it (it is
    /// not somebody's current directory).
    pub fn remove(&mut self, dir: Inode, name: &str) -> Result<()> {
        validate_name(name)?;
        if is_special(name) {
            return Err(FsError::InvalidName(name.to_owned()));
        }
        let target = self.lookup(dir, name)?;

        let node = self.node(target)?;
        if let Content::Directory(target_dir) = &node.content {
            if !target_dir.is_empty() {
                return Err(FsError::NotEmpty(name.to_owned()));
            }
            if node.links > 1 {
                return Err(FsError::Busy(name.to_owned()));
            }
        }

        self.node_mut(dir)?.content.as_directory_mut()?.remove(name);
        tracing::trace!(parent = %dir.nr, inode = %target.nr, name, "remove");
        self.release(target)
    }

    /// Add an external reference to `inode`, keeping it alive.
    pub(crate) fn pin(&mut self, inode: Inode) -> Result<()> {
        self.link(inode)
    }

    pub(crate) fn pin_root(&mut self) {
        if let Some(node) = self.storage.get_mut(self.root.slot) {
            node.links += 1;
        }
    }

    /// Drop an external reference taken with [`pin`](Self::pin).
    pub(crate) fn unpin(&mut self, inode: Inode) -> Result<()> {
        self.release(inode)
    }

    fn node(&self, inode: Inode) -> Result<&Node> {
        self.storage
            .get(inode.slot)
            .filter(|node| node.nr == inode.nr)
            .ok_or(FsError::StaleInode(inode.nr))
    }

    fn node_mut(&mut self, inode: Inode) -> Result<&mut Node> {
        self.storage
            .get_mut(inode.slot)
            .filter(|node| node.nr == inode.nr)
            .ok_or(FsError::StaleInode(inode.nr))
    }

    fn alloc(&mut self, file_type: FileType) -> Result<Inode> {
        if let Some(max) = self.max_inodes {
            // The root is not counted.
            if self.storage.len() > max {
                return Err(FsError::InodeLimit(max));
            }
        }

        let nr = InodeNr(self.next_nr);
        self.next_nr += 1;
        let slot = self.storage.insert(Node::new(nr, Content::new(file_type)));

        Ok(Inode { slot, nr })
    }

    fn insert_entry(&mut self, dir: Inode, name: &str, inode: Inode) -> Result<()> {
        self.node_mut(dir)?
            .content
            .as_directory_mut()?
            .insert(name, inode);
        self.link(inode)
    }

    fn link(&mut self, inode: Inode) -> Result<()> {
        self.node_mut(inode)?.links += 1;
        Ok(())
    }

    /// Drop one reference to `inode`, reclaiming every node that ends up
    /// unreferenced as a result.
    fn release(&mut self, inode: Inode) -> Result<()> {
        let mut pending = vec![inode];

        while let Some(inode) = pending.pop() {
            let node = self.node_mut(inode)?;
            node.links = node.links.saturating_sub(1);
            if node.links > 0 {
                continue;
            }

            let node = self.storage.remove(inode.slot);
            tracing::debug!(inode = %node.nr, file_type = %node.file_type(), "reclaimed");

            if let Content::Directory(dir) = node.content {
                pending.extend(
                    dir.entries()
                        .iter()
                        .filter(|(name, _)| name.as_str() != Directory::SELF)
                        .map(|(_, target)| *target)
                        .filter(|target| *target != inode),
                );
            }
        }

        Ok(())
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Entry names are non-empty and never contain `/`.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') {
        return Err(FsError::InvalidName(name.to_owned()));
    }
    Ok(())
}

impl fmt::Debug for InodeTable {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            formatter,
            "\n{inode:<8}    {ty:<4}    name",
            inode = "inode",
            ty = "type",
        )?;

        fn debug(
            nodes: Vec<(&str, &Node)>,
            slf: &InodeTable,
            formatter: &mut fmt::Formatter<'_>,
            indentation: usize,
        ) -> fmt::Result {
            for (name, node) in nodes {
                writeln!(
                    formatter,
                    "{inode:<8}    {ty:<4}   {indentation_symbol:indentation_width$}{name}",
                    inode = node.nr,
                    ty = match node.file_type() {
                        FileType::Plain => "file",
                        FileType::Directory => "dir",
                    },
                    indentation_symbol = " ",
                    indentation_width = indentation * 2 + 1,
                )?;

                if let Content::Directory(dir) = &node.content {
                    debug(
                        dir.children()
                            .filter_map(|(name, inode)| {
                                slf.node(inode).ok().map(|node| (name, node))
                            })
                            .collect(),
                        slf,
                        formatter,
                        indentation + 1,
                    )?;
                }
            }

            Ok(())
        }

        match self.node(self.root) {
            Ok(root) => debug(vec![("/", root)], self, formatter, 0),
            Err(_) => Ok(()),
        }
    }
}
