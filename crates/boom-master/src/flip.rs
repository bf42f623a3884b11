//! Flippit: seeded start-time shuffles.

use boom_ir::Pattern;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Most note pairs swapped by one flip.
pub const MAX_FLIP_SWAPS: usize = 3;

/// Swap the start ticks of up to [`MAX_FLIP_SWAPS`] random note pairs.
///
/// The number of swaps is `min(3, len / 2)`; patterns with fewer than two
/// notes are left untouched. The same seed always picks the same pairs.
/// Returns how many swaps were made.
pub fn flip_pattern(pattern: &mut Pattern, seed: u32) -> usize {
    let len = pattern.len();
    if len < 2 {
        return 0;
    }

    let mut rng = StdRng::seed_from_u64(seed as u64);
    let swaps = MAX_FLIP_SWAPS.min(len / 2);
    let notes = pattern.notes_mut();
    for _ in 0..swaps {
        let a = rng.gen_range(0..len);
        // Pick from the other len - 1 notes so a != b
        let mut b = rng.gen_range(0..len - 1);
        if b >= a {
            b += 1;
        }
        let start_a = notes[a].start_tick;
        notes[a].start_tick = notes[b].start_tick;
        notes[b].start_tick = start_a;
    }
    swaps
}
