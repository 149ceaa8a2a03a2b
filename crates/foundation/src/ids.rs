/// Identifies one render cycle.
///
/// Ids are handed out in strictly increasing order, so comparing two ids tells
/// which cycle was started later.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CycleId(pub u64);

impl CycleId {
    pub fn new(n: u64) -> Self {
        CycleId(n)
    }

    pub fn next(self) -> Self {
        CycleId(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for CycleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cycle#{}", self.0)
    }
}
