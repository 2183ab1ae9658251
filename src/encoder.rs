//! Resistance encoder: maps a requested load resistance onto the relay bank.
//!
//! The board carries a fixed resistor network switched by five relays.
//! Only a handful of combinations are wired up, so a request is matched
//! **exactly** against a static breakpoint table:
//!
//! ```text
//!   requested Ω ──▶ < POT_MIN_OHMS ? ──yes──▶ table lookup ──▶ Discrete(lines)
//!                          │                       │
//!                          no                      └── miss ──▶ Unmapped
//!                          ▼
//!                      Continuous
//! ```
//!
//! The encoder is pure: it never touches hardware.  The output driver
//! turns a [`RelayPattern`] into pin writes.

/// Ceiling of the discrete relay bank, in ohms.  Requests at or above this
/// value are routed to the continuous (potentiometer) path.
pub const POT_MIN_OHMS: f64 = 20_000.0;

// ───────────────────────────────────────────────────────────────
// Pattern types
// ───────────────────────────────────────────────────────────────

/// Levels of relay lines 1–5 (`true` = energised).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankLines([bool; 5]);

impl BankLines {
    /// Build from a 5-bit mask where bit 4 is relay 1 and bit 0 is relay 5,
    /// so the literal reads left-to-right in relay order.
    pub const fn from_mask(mask: u8) -> Self {
        Self([
            mask & 0b1_0000 != 0,
            mask & 0b0_1000 != 0,
            mask & 0b0_0100 != 0,
            mask & 0b0_0010 != 0,
            mask & 0b0_0001 != 0,
        ])
    }

    pub const fn levels(&self) -> [bool; 5] {
        self.0
    }

    /// Level of relay line `n` (1-based, matching the board silkscreen).
    pub fn line(&self, n: usize) -> Option<bool> {
        n.checked_sub(1).and_then(|i| self.0.get(i).copied())
    }
}

/// Result of encoding a resistance request.
///
/// Exactly one of the discrete bank or the continuous path is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayPattern {
    /// Discrete bank selected; lines 1–5 driven to these levels.
    Discrete(BankLines),
    /// Discrete bank selected but the request matched no breakpoint.
    /// Lines 1–5 keep whatever levels they already hold.
    Unmapped,
    /// Request at or above [`POT_MIN_OHMS`]; bank select released.
    Continuous,
}

impl RelayPattern {
    /// Whether relay 0 (bank select) is asserted.
    pub fn bank_select(&self) -> bool {
        !matches!(self, Self::Continuous)
    }

    pub fn use_continuous_mode(&self) -> bool {
        matches!(self, Self::Continuous)
    }

    /// Line levels to drive, or `None` when lines 1–5 must be left alone.
    pub fn lines(&self) -> Option<BankLines> {
        match self {
            Self::Discrete(lines) => Some(*lines),
            Self::Unmapped | Self::Continuous => None,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Breakpoint table
// ───────────────────────────────────────────────────────────────

/// A wired resistor combination.
#[derive(Debug, Clone, Copy)]
pub struct Breakpoint {
    /// Request value that selects this combination (exact match).
    pub ohms: u32,
    /// Measured resistance of the combination, in ohms.
    pub nominal_ohms: f32,
    pub lines: BankLines,
}

const fn bp(ohms: u32, nominal_ohms: f32, mask: u8) -> Breakpoint {
    Breakpoint {
        ohms,
        nominal_ohms,
        lines: BankLines::from_mask(mask),
    }
}

/// Ordered by request value.
static BREAKPOINTS: [Breakpoint; 14] = [
    bp(4, 2.1, 0b11111),
    bp(5, 2.7, 0b10000),
    bp(8, 3.3, 0b01110),
    bp(9, 5.8, 0b01100),
    bp(10, 6.6, 0b01010),
    bp(11, 8.2, 0b01001),
    bp(15, 10.0, 0b00111),
    bp(16, 14.0, 0b00110),
    bp(20, 19.0, 0b00101),
    bp(23, 22.0, 0b00100),
    bp(36, 35.0, 0b00011),
    bp(47, 46.0, 0b00010),
    bp(144, 145.0, 0b00001),
    bp(4000, 4000.0, 0b00000),
];

/// The full breakpoint table, ordered by request value.
pub fn breakpoints() -> &'static [Breakpoint] {
    &BREAKPOINTS
}

/// Encode a resistance request into a relay pattern.
///
/// NaN is not below the ceiling and therefore encodes as
/// [`RelayPattern::Continuous`].
pub fn encode(requested: f64) -> RelayPattern {
    if requested.is_nan() || requested >= POT_MIN_OHMS {
        return RelayPattern::Continuous;
    }

    BREAKPOINTS
        .iter()
        .find(|b| f64::from(b.ohms) == requested)
        .map_or(RelayPattern::Unmapped, |b| RelayPattern::Discrete(b.lines))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_breakpoint_selects_bank_with_documented_lines() {
        let expected: [(f64, [bool; 5]); 14] = [
            (4.0, [true, true, true, true, true]),
            (5.0, [true, false, false, false, false]),
            (8.0, [false, true, true, true, false]),
            (9.0, [false, true, true, false, false]),
            (10.0, [false, true, false, true, false]),
            (11.0, [false, true, false, false, true]),
            (15.0, [false, false, true, true, true]),
            (16.0, [false, false, true, true, false]),
            (20.0, [false, false, true, false, true]),
            (23.0, [false, false, true, false, false]),
            (36.0, [false, false, false, true, true]),
            (47.0, [false, false, false, true, false]),
            (144.0, [false, false, false, false, true]),
            (4000.0, [false, false, false, false, false]),
        ];
        for (ohms, levels) in expected {
            let p = encode(ohms);
            assert!(p.bank_select(), "{ohms} should select the bank");
            assert!(!p.use_continuous_mode());
            assert_eq!(p.lines().map(|l| l.levels()), Some(levels), "{ohms}");
        }
    }

    #[test]
    fn table_is_strictly_ordered() {
        assert!(breakpoints().windows(2).all(|w| w[0].ohms < w[1].ohms));
    }

    #[test]
    fn ceiling_and_above_is_continuous() {
        for ohms in [POT_MIN_OHMS, 20_000.5, 1e9, f64::INFINITY] {
            let p = encode(ohms);
            assert_eq!(p, RelayPattern::Continuous);
            assert!(!p.bank_select());
            assert!(p.lines().is_none());
        }
    }

    #[test]
    fn near_misses_are_unmapped() {
        for ohms in [4.000_001, 3.999_999, 0.0, -4.0, 19_999.0, 12.0] {
            let p = encode(ohms);
            assert_eq!(p, RelayPattern::Unmapped, "{ohms}");
            assert!(p.bank_select());
        }
    }

    #[test]
    fn nan_takes_continuous_branch() {
        assert_eq!(encode(f64::NAN), RelayPattern::Continuous);
    }

    #[test]
    fn line_accessor_is_one_based() {
        let lines = BankLines::from_mask(0b10000);
        assert_eq!(lines.line(1), Some(true));
        assert_eq!(lines.line(5), Some(false));
        assert_eq!(lines.line(0), None);
        assert_eq!(lines.line(6), None);
    }
}
