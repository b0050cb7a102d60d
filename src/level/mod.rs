use rand::Rng;

/// Number of forward chains the sentinel head carries. Every node height lies
/// in `1..=MAX_LEVEL`.
pub const MAX_LEVEL: usize = 4;

/// Picks a node height by flipping fair coins: the first failed flip at level
/// `L` yields height `L`, and a run of successes is capped at `MAX_LEVEL`.
pub fn random_height<R>(rng: &mut R) -> usize
where
    R: Rng + ?Sized,
{
    for height in 1..MAX_LEVEL {
        if !rng.gen_bool(0.5) {
            return height;
        }
    }
    MAX_LEVEL
}
