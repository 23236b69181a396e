//! Filesystem state: the inode table plus the current directory and the
//! prompt, with the listing and path operations a shell front end needs.

use std::fmt;
use std::io::Write;

use crate::config::FsConfig;
use crate::content::is_special;
use crate::inode::{FileType, Inode, InodeNr};
use crate::table::InodeTable;
use crate::{FsError, Result};

#[derive(Debug)]
pub struct InodeState {
    table: InodeTable,
    cwd: Inode,
    prompt: String,
}

impl InodeState {
    pub fn new() -> Self {
        Self::with_config(FsConfig::default())
    }

    pub fn with_config(config: FsConfig) -> Self {
        let mut table = InodeTable::new(config.max_inodes);
        let root = table.root();
        // The initial cwd pin.
        table.pin_root();

        tracing::trace!(root = %root.nr(), prompt = %config.prompt, "inode state initialized");

        Self {
            table,
            cwd: root,
            prompt: config.prompt,
        }
    }

    pub fn root(&self) -> Inode {
        self.table.root()
    }

    pub fn cwd(&self) -> Inode {
        self.cwd
    }

    /// Move the current directory to `dir`, which must be a live directory.
    pub fn set_cwd(&mut self, dir: Inode) -> Result<()> {
        if self.table.file_type(dir)? != FileType::Directory {
            return Err(FsError::WrongFileType(FileType::Plain));
        }
        if dir == self.cwd {
            return Ok(());
        }

        self.table.pin(dir)?;
        let old = std::mem::replace(&mut self.cwd, dir);
        self.table.unpin(old)?;

        tracing::debug!(from = %old.nr(), to = %dir.nr(), "cwd changed");
        Ok(())
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Set the prompt to `words` joined by single spaces, followed by a
    /// space.
    pub fn set_prompt<S: AsRef<str>>(&mut self, words: &[S]) {
        let mut prompt = words
            .iter()
            .map(|word| word.as_ref())
            .collect::<Vec<&str>>()
            .join(" ");
        prompt.push(' ');
        self.prompt = prompt;
    }

    pub fn table(&self) -> &InodeTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut InodeTable {
        &mut self.table
    }

    /// Resolve `path` to an inode.
    ///
    /// Absolute paths start at the root, anything else at the current
    /// directory. Empty components are skipped, `.` and `..` are followed
    /// as the directory entries they are.
    pub fn resolve(&self, path: &str) -> Result<Inode> {
        let start = if path.starts_with('/') {
            self.root()
        } else {
            self.cwd
        };

        path.split('/')
            .filter(|component| !component.is_empty())
            .try_fold(start, |current, component| {
                self.table.lookup(current, component)
            })
    }

    /// Resolve everything but the last component of `path`, returning the
    /// containing directory and the final name.
    pub fn resolve_parent(&self, path: &str) -> Result<(Inode, String)> {
        let trimmed = path.trim_end_matches('/');
        let (dir, name) = match trimmed.rsplit_once('/') {
            Some(("", name)) => (self.root(), name),
            Some((dir, name)) => (self.resolve(dir)?, name),
            None => (self.cwd, trimmed),
        };
        if name.is_empty() {
            return Err(FsError::InvalidName(path.to_owned()));
        }

        // The parent must be a directory even if the caller only creates.
        self.table.directory(dir)?;
        Ok((dir, name.to_owned()))
    }

    /// Entries of `dir` in name order, `.` and `..` included.
    pub fn list(&self, dir: Inode) -> Result<Vec<ListEntry>> {
        self.table
            .dirents(dir)?
            .iter()
            .map(|(name, inode)| {
                let content = self.table.content(*inode)?;
                Ok(ListEntry {
                    inode: inode.nr(),
                    size: content.size(),
                    name: name.clone(),
                    is_dir: content.file_type() == FileType::Directory,
                })
            })
            .collect()
    }

    /// Write one line per entry of `dir` to `out`.
    pub fn print_list<W: Write>(&self, dir: Inode, out: &mut W) -> Result<()> {
        for entry in self.list(dir)? {
            writeln!(out, "{entry}")?;
        }
        Ok(())
    }

    /// Write a `label:` header and the listing of `dir`, then do the same
    /// for every subdirectory below it, depth first in name order.
    pub fn print_list_recursive<W: Write>(
        &self,
        label: &str,
        dir: Inode,
        out: &mut W,
    ) -> Result<()> {
        if is_special(label) {
            writeln!(out, "{label}:")?;
        } else {
            writeln!(out, "/{label}:")?;
        }
        self.print_list(dir, out)?;

        for (name, child) in self.table.directory(dir)?.children() {
            if self.table.file_type(child)? == FileType::Directory {
                self.print_list_recursive(name, child, out)?;
            }
        }
        Ok(())
    }

    /// Absolute path of directory `dir`, rebuilt by following `..` up to
    /// the root and looking up each step's name in its parent.
    pub fn get_path(&self, dir: Inode) -> Result<String> {
        let root = self.root();
        if dir == root {
            return Ok("/".to_owned());
        }

        let mut names = Vec::new();
        let mut current = dir;
        while current != root {
            let parent = self
                .table
                .directory(current)?
                .parent()
                .ok_or(FsError::StaleInode(current.nr()))?;
            let name = self
                .table
                .directory(parent)?
                .name_of(current)
                .ok_or_else(|| FsError::NoSuchEntry(format!("inode {}", current.nr())))?;
            names.push(name);
            current = parent;
        }

        Ok(names
            .into_iter()
            .rev()
            .fold(String::new(), |path, name| path + "/" + name))
    }
}

impl Default for InodeState {
    fn default() -> Self {
        Self::new()
    }
}

/// One line of a directory listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListEntry {
    pub inode: InodeNr,
    /// Word count of a plain file, entry count of a directory.
    pub size: usize,
    pub name: String,
    pub is_dir: bool,
}

impl fmt::Display for ListEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = if self.is_dir && !is_special(&self.name) {
            "/"
        } else {
            ""
        };
        write!(
            f,
            "     {}       {}  {}{}",
            self.inode, self.size, self.name, suffix
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(fs: &InodeState, dir: Inode) -> String {
        let mut out = Vec::new();
        fs.print_list(dir, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_new_state() {
        let fs = InodeState::new();
        let root = fs.root();

        assert_eq!(fs.cwd(), root, "cwd starts at the root");
        assert_eq!(fs.table().size(root), Ok(2));
        assert_eq!(fs.table().lookup(root, "."), Ok(root));
        assert_eq!(fs.table().lookup(root, ".."), Ok(root));
        assert_eq!(fs.get_path(root).unwrap(), "/");
        assert_eq!(fs.prompt(), "% ");
    }

    #[test]
    fn test_with_config() {
        let mut fs = InodeState::with_config(FsConfig {
            prompt: "$ ".to_owned(),
            max_inodes: Some(0),
        });
        let root = fs.root();

        assert_eq!(fs.prompt(), "$ ");
        assert_eq!(fs.table_mut().mkdir(root, "a"), Err(FsError::InodeLimit(0)));
    }

    #[test]
    fn test_set_prompt() {
        let mut fs = InodeState::new();
        fs.set_prompt(&["my", "shell>"]);
        assert_eq!(fs.prompt(), "my shell> ");
    }

    #[test]
    fn test_set_cwd() {
        let mut fs = InodeState::new();
        let root = fs.root();
        let dir = fs.table_mut().mkdir(root, "d").unwrap();
        let file = fs.table_mut().mkfile(root, "f").unwrap();

        assert_eq!(
            fs.set_cwd(file),
            Err(FsError::WrongFileType(FileType::Plain)),
        );
        assert_eq!(fs.cwd(), root, "a failed set_cwd does not move");

        fs.set_cwd(dir).unwrap();
        assert_eq!(fs.cwd(), dir);
        assert_eq!(
            fs.table_mut().remove(root, "d"),
            Err(FsError::Busy("d".to_owned())),
            "the current directory cannot be removed",
        );

        fs.set_cwd(root).unwrap();
        assert_eq!(fs.table_mut().remove(root, "d"), Ok(()));
        assert_eq!(
            fs.set_cwd(dir),
            Err(FsError::StaleInode(dir.nr())),
            "a removed directory cannot become the cwd",
        );
    }

    #[test]
    fn test_print_list() {
        let mut fs = InodeState::new();
        let root = fs.root();
        let dir = fs.table_mut().mkdir(root, "dir").unwrap();
        let file = fs.table_mut().mkfile(root, "file").unwrap();
        fs.table_mut()
            .write_file(file, &["make", "file", "a", "b", "c"])
            .unwrap();
        fs.table_mut().mkfile(dir, "inner").unwrap();

        assert_eq!(
            listing(&fs, root),
            "     1       4  .\n\
             \x20    1       4  ..\n\
             \x20    2       3  dir/\n\
             \x20    3       3  file\n",
        );
        assert_eq!(
            listing(&fs, dir),
            "     2       3  .\n\
             \x20    1       4  ..\n\
             \x20    4       0  inner\n",
        );
        assert_eq!(
            fs.print_list(file, &mut Vec::new()),
            Err(FsError::WrongFileType(FileType::Plain)),
        );
    }

    #[test]
    fn test_print_list_recursive() {
        let mut fs = InodeState::new();
        let root = fs.root();
        let a = fs.table_mut().mkdir(root, "a").unwrap();
        fs.table_mut().mkdir(a, "b").unwrap();
        fs.table_mut().mkfile(root, "f").unwrap();

        let mut out = Vec::new();
        fs.print_list_recursive(".", root, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        let headers: Vec<_> = out.lines().filter(|line| line.ends_with(':')).collect();

        assert_eq!(headers, [".:", "/a:", "/b:"]);
        assert_eq!(out.lines().count(), 5 + 4 + 3, "each header plus its entries");
    }

    #[test]
    fn test_get_path() {
        let mut fs = InodeState::new();
        let root = fs.root();
        let a = fs.table_mut().mkdir(root, "a").unwrap();
        let b = fs.table_mut().mkdir(a, "b").unwrap();
        let c = fs.table_mut().mkdir(b, "c").unwrap();

        assert_eq!(fs.get_path(a).unwrap(), "/a");
        assert_eq!(fs.get_path(b).unwrap(), "/a/b");
        assert_eq!(fs.get_path(c).unwrap(), "/a/b/c");
        assert_eq!(fs.get_path(c).unwrap(), "/a/b/c", "get_path does not mutate");

        let file = fs.table_mut().mkfile(a, "f").unwrap();
        assert_eq!(fs.get_path(file), Err(FsError::WrongFileType(FileType::Plain)));
    }

    #[test]
    fn test_resolve() {
        let mut fs = InodeState::new();
        let root = fs.root();
        let a = fs.table_mut().mkdir(root, "a").unwrap();
        let b = fs.table_mut().mkdir(a, "b").unwrap();
        let file = fs.table_mut().mkfile(b, "f").unwrap();

        assert_eq!(fs.resolve("/"), Ok(root));
        assert_eq!(fs.resolve(""), Ok(root));
        assert_eq!(fs.resolve("/a/b/f"), Ok(file));
        assert_eq!(fs.resolve("a//b/"), Ok(b));
        assert_eq!(fs.resolve("/a/b/../.."), Ok(root));
        assert_eq!(fs.resolve("/.."), Ok(root), "the root is its own parent");

        fs.set_cwd(b).unwrap();
        assert_eq!(fs.resolve("f"), Ok(file));
        assert_eq!(fs.resolve("../b/./f"), Ok(file));
        assert_eq!(fs.resolve("x"), Err(FsError::NoSuchEntry("x".to_owned())));
        assert_eq!(
            fs.resolve("f/x"),
            Err(FsError::WrongFileType(FileType::Plain)),
        );
    }

    #[test]
    fn test_resolve_parent() {
        let mut fs = InodeState::new();
        let root = fs.root();
        let a = fs.table_mut().mkdir(root, "a").unwrap();
        fs.table_mut().mkfile(a, "f").unwrap();

        assert_eq!(fs.resolve_parent("/x"), Ok((root, "x".to_owned())));
        assert_eq!(fs.resolve_parent("a/x/"), Ok((a, "x".to_owned())));
        assert_eq!(fs.resolve_parent("x"), Ok((root, "x".to_owned())));
        assert_eq!(fs.resolve_parent("/"), Err(FsError::InvalidName("/".to_owned())));
        assert_eq!(
            fs.resolve_parent("/a/f/x"),
            Err(FsError::WrongFileType(FileType::Plain)),
        );
        assert_eq!(
            fs.resolve_parent("/nope/x"),
            Err(FsError::NoSuchEntry("nope".to_owned())),
        );
    }

    #[test]
    fn test_list_entry_display() {
        let entry = ListEntry {
            inode: InodeNr(7),
            size: 12,
            name: "docs".to_owned(),
            is_dir: true,
        };
        assert_eq!(entry.to_string(), "     7       12  docs/");

        let parent = ListEntry {
            name: "..".to_owned(),
            ..entry
        };
        assert_eq!(parent.to_string(), "     7       12  ..");
    }
}
