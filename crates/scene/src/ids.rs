//! Entity and component id ranges.
//!
//! Ids are `u32` and split into three ranges by their high bits:
//!
//! | Range | Ids | Allocated by |
//! |---|---|---|
//! | replicated | `1 .. 0x4000_0000` | the authority |
//! | unacked | `0x4000_0000 .. 0x8000_0000` | a client, until the authority assigns a replicated id |
//! | local | `0x8000_0000 ..= u32::MAX` | anyone; never replicated |
//!
//! `0` means "no id".

/// First id of the unacked range.
pub const FIRST_UNACKED_ID: u32 = 0x4000_0000;

/// First id of the local range.
pub const FIRST_LOCAL_ID: u32 = 0x8000_0000;

/// Which range an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdRange {
    Replicated,
    Unacked,
    Local,
}

impl IdRange {
    /// Classify `id`. `0` is reported as replicated.
    #[must_use]
    pub const fn of(id: u32) -> Self {
        if id >= FIRST_LOCAL_ID {
            Self::Local
        } else if id >= FIRST_UNACKED_ID {
            Self::Unacked
        } else {
            Self::Replicated
        }
    }

    const fn bounds(self) -> (u32, u32) {
        match self {
            Self::Replicated => (1, FIRST_UNACKED_ID - 1),
            Self::Unacked => (FIRST_UNACKED_ID, FIRST_LOCAL_ID - 1),
            Self::Local => (FIRST_LOCAL_ID, u32::MAX),
        }
    }
}

/// Monotonic per-range id counters.
///
/// Each range wraps to its first id after its last one. The generator does
/// not know which ids are taken; callers skip ids that are in use.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    replicated: u32,
    unacked: u32,
    local: u32,
}

impl IdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&mut self, range: IdRange) -> &mut u32 {
        match range {
            IdRange::Replicated => &mut self.replicated,
            IdRange::Unacked => &mut self.unacked,
            IdRange::Local => &mut self.local,
        }
    }

    /// The next id in `range`.
    pub fn allocate(&mut self, range: IdRange) -> u32 {
        let (first, last) = range.bounds();
        let counter = self.counter(range);
        *counter = if *counter < first || *counter >= last {
            first
        } else {
            *counter + 1
        };
        *counter
    }

    pub fn allocate_replicated(&mut self) -> u32 {
        self.allocate(IdRange::Replicated)
    }

    pub fn allocate_unacked(&mut self) -> u32 {
        self.allocate(IdRange::Unacked)
    }

    pub fn allocate_local(&mut self) -> u32 {
        self.allocate(IdRange::Local)
    }

    /// Record an id that was assigned from outside, so later allocations in
    /// its range continue above it.
    pub fn observe(&mut self, id: u32) {
        if id == 0 {
            return;
        }
        let counter = self.counter(IdRange::of(id));
        *counter = (*counter).max(id);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
