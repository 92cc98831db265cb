//! Byte ranges into a schema file.
//!
//! Line and column lookup lives in `capn_diagnostic::span_utils`, next to
//! the source text it needs.

use std::fmt;
use std::num::TryFromIntError;
use std::ops::Range;

/// Half-open byte range `start..end` within one file.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Placeholder where no position applies.
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Empty span at `offset`, where end of input is reported.
    #[inline]
    pub const fn point(offset: u32) -> Span {
        Span {
            start: offset,
            end: offset,
        }
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both, e.g. a declaration from keyword to `}`.
    #[inline]
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// The spanned text, or `None` if the span is not within `source`.
    pub fn slice(self, source: &str) -> Option<&str> {
        source.get(self.start as usize..self.end as usize)
    }
}

impl TryFrom<Range<usize>> for Span {
    type Error = TryFromIntError;

    fn try_from(range: Range<usize>) -> Result<Self, Self::Error> {
        Ok(Span {
            start: u32::try_from(range.start)?,
            end: u32::try_from(range.end)?,
        })
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::Span;
    crate::static_assert_size!(Span, 8);
}
