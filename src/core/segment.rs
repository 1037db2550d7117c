/// Occupancy -> tier lookup for counts 0..=15
const SEGMENT_TABLE: [u8; 16] = [0, 1, 1, 1, 2, 2, 2, 3, 3, 3, 3, 3, 3, 3, 3, 3];

/// Highest tier; occupancy past the table clamps here
pub const MAX_SEGMENT: u8 = 3;

/// Quantize an occupancy count (active mic slots) into a tier 0-3
#[inline]
pub fn segment_for(occupancy: u16) -> u8 {
    SEGMENT_TABLE
        .get(occupancy as usize)
        .copied()
        .unwrap_or(MAX_SEGMENT)
}

/// Absolute distance between two tiers
#[inline]
pub fn segment_gap(a: u8, b: u8) -> u8 {
    a.abs_diff(b)
}
