//! Permutation operators shared by the genetic and annealing optimizers.
//!
//! All operators take and return permutations of `0..n` and keep them valid:
//! no job is ever dropped or duplicated.

use rand::Rng;

/// Order crossover (OX).
///
/// Copies a random contiguous slice of `parent_a` into the same positions of
/// the child, then fills the remaining positions left to right with the jobs
/// of `parent_b` in their order, skipping those already copied.
pub fn order_crossover<R: Rng + ?Sized>(parent_a: &[usize], parent_b: &[usize], rng: &mut R) -> Vec<usize> {
    let n = parent_a.len();
    if n < 2 || parent_b.len() != n {
        return parent_a.to_vec();
    }
    let (start, end) = random_segment(n, rng);
    ox_child(parent_a, parent_b, start, end)
}

fn ox_child(parent_a: &[usize], parent_b: &[usize], start: usize, end: usize) -> Vec<usize> {
    let n = parent_a.len();
    let mut taken = vec![false; n];
    for &job in &parent_a[start..=end] {
        taken[job] = true;
    }

    let mut donors = parent_b.iter().copied().filter(|&job| !taken[job]);
    (0..n)
        .map(|pos| {
            if (start..=end).contains(&pos) {
                parent_a[pos]
            } else {
                // Both parents are permutations of the same set, so the donor
                // supplies exactly the missing jobs.
                donors.next().unwrap_or(parent_a[pos])
            }
        })
        .collect()
}

/// Exchange two distinct random positions.
pub fn swap<R: Rng + ?Sized>(perm: &mut [usize], rng: &mut R) {
    let n = perm.len();
    if n < 2 {
        return;
    }
    let i = rng.gen_range(0..n);
    let j = (i + rng.gen_range(1..n)) % n;
    perm.swap(i, j);
}

/// Reverse a random contiguous segment (a 2-opt move).
pub fn reverse_segment<R: Rng + ?Sized>(perm: &mut [usize], rng: &mut R) {
    let n = perm.len();
    if n < 2 {
        return;
    }
    let (start, end) = random_segment(n, rng);
    perm[start..=end].reverse();
}

/// Remove a random job and reinsert it at a random position.
pub fn reinsert<R: Rng + ?Sized>(perm: &mut Vec<usize>, rng: &mut R) {
    let n = perm.len();
    if n < 2 {
        return;
    }
    let from = rng.gen_range(0..n);
    let job = perm.remove(from);
    let to = rng.gen_range(0..n);
    perm.insert(to, job);
}

/// A random segment `[start, end]` within `0..n`, `start <= end`.
fn random_segment<R: Rng + ?Sized>(n: usize, rng: &mut R) -> (usize, usize) {
    let a = rng.gen_range(0..n);
    let b = rng.gen_range(0..n);
    if a <= b { (a, b) } else { (b, a) }
}
