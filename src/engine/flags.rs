use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Outcome of a reconciliation step, OR-ed together up the recursion.
///
/// `ERROR` and `WARN` decide the exit status. `NONEMPTY` only tells the
/// caller that a collection directory still holds something and must not be
/// removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResultFlags(u8);

impl ResultFlags {
    /// A per-entry operation failed.
    pub const ERROR: Self = Self(1);
    /// Something was left untouched that deserves attention.
    pub const WARN: Self = Self(2);
    /// The directory still contains entries.
    pub const NONEMPTY: Self = Self(4);

    /// No flags set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw bit representation.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether no flag is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether every flag in `other` is also set here.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether the run should exit with a failure status.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        self.0 & (Self::ERROR.0 | Self::WARN.0) != 0
    }
}

impl BitOr for ResultFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ResultFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ResultFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::ERROR, "ERROR"),
            (Self::WARN, "WARN"),
            (Self::NONEMPTY, "NONEMPTY"),
        ];
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("(empty)")?;
        }
        Ok(())
    }
}
