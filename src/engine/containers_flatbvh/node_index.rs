// Slot in a flat node store, with a sentinel for 'no slot'
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeIndex(pub usize);
impl NodeIndex
{
    const NONE: usize = usize::MAX;

    #[inline] #[must_use] pub const fn none() -> Self { Self(Self::NONE) }
    #[inline] #[must_use] pub const fn some(n: usize) -> Self { Self(n) }

    #[inline] #[must_use] pub const fn is_none(self) -> bool { self.0 == Self::NONE }
    #[inline] #[must_use] pub const fn is_some(self) -> bool { self.0 != Self::NONE }

    #[inline] #[must_use]
    pub const fn get(self) -> Option<usize>
    {
        match self.is_some()
        {
            true => Some(self.0),
            false => None,
        }
    }
}
impl Default for NodeIndex
{
    fn default() -> Self { Self::none() }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn basic()
    {
        assert!(NodeIndex::none().is_none());
        assert!(NodeIndex::default().is_none());
        assert!(NodeIndex::some(0).is_some());
        assert!(NodeIndex::some(usize::MAX - 1).is_some());

        assert_eq!(NodeIndex::some(7).get(), Some(7));
        assert_eq!(NodeIndex::none().get(), None);
    }
}
