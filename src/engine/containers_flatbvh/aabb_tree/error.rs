use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError
{
    AlreadyTracked { slot: usize },
    Untracked,
    // the handle map and the node store disagree about a key
    SlotMismatch { slot: usize },
}
impl Display for TreeError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { Debug::fmt(self, f) }
}
impl Error for TreeError { }

// Structural faults found by `AabbTree::validate`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError
{
    EscapeOutOfRange { slot: usize, escape_offset: usize },
    BadLeafOffset { slot: usize, escape_offset: usize },
    NotContained { container: usize, leaf: usize },
    HandleMismatch { slot: usize },
    LeafCountMismatch { expected: usize, found: usize },
    TombstoneCountMismatch { expected: usize, found: usize },
}
impl Display for ValidationError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { Debug::fmt(self, f) }
}
impl Error for ValidationError { }
