use crate::model::WorkerId;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// Départage pur : même (seed, contexte, worker) ⇒ même valeur.
///
/// Pas d'état aléatoire ambiant : un run reste une fonction de ses entrées.
pub(crate) fn tiebreak<C: Hash + ?Sized>(seed: u64, context: &C, worker: &WorkerId) -> u64 {
    let mut hasher = FxHasher::default();
    context.hash(&mut hasher);
    worker.hash(&mut hasher);
    splitmix64(hasher.finish() ^ splitmix64(seed))
}

/// Finaliseur splitmix64 (FxHasher seul mélange mal les bits de poids faible).
pub(crate) fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}
