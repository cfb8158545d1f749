/// Result of applying a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub changed: Vec<std::ops::Range<usize>>,
    pub cursor: usize,
    pub version: u64,
}
