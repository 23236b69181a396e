/// Construction options for an [`InodeState`](crate::InodeState).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FsConfig {
    /// Prompt shown by the front end until it is changed.
    pub prompt: String,
    /// Optional max count of live inodes, not counting the root.
    pub max_inodes: Option<usize>,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            prompt: "% ".to_owned(),
            max_inodes: None,
        }
    }
}
