//! Stateful permutation generators.
//!
//! A permutor owns its state and advances with `permute(&mut self)`; the
//! slice returned by `permutation()` borrows that state, so it cannot be held
//! across the next call. Parallel callers build one permutor each.

/// Common protocol of the permutation generators.
pub trait Permutor {
    /// Number of elements being permuted.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total permutations the generator yields, saturating at `u128::MAX`.
    fn number_of_permutations(&self) -> u128;

    /// Current arrangement.
    fn permutation(&self) -> &[usize];

    /// Advance to the next arrangement. The first call yields the initial
    /// arrangement; returns false once every arrangement has been produced.
    fn permute(&mut self) -> bool;

    /// Rewind to the state before the first `permute`.
    fn reset(&mut self);
}

/// All orderings of `{0..n-1}` by the non-recursive form of Heap's algorithm.
#[derive(Clone, Debug)]
pub struct IndexPermutor {
    perm: Vec<usize>,
    counters: Vec<usize>,
    cursor: usize,
    started: bool,
}

impl IndexPermutor {
    pub fn new(n: usize) -> Self {
        IndexPermutor {
            perm: (0..n).collect(),
            counters: vec![0; n],
            cursor: 1,
            started: false,
        }
    }
}

impl Permutor for IndexPermutor {
    fn len(&self) -> usize {
        self.perm.len()
    }

    fn number_of_permutations(&self) -> u128 {
        factorial(self.perm.len())
    }

    fn permutation(&self) -> &[usize] {
        &self.perm
    }

    fn permute(&mut self) -> bool {
        if !self.started {
            self.started = true;
            return true;
        }

        let n = self.perm.len();
        while self.cursor < n {
            let i = self.cursor;
            if self.counters[i] < i {
                if i % 2 == 0 {
                    self.perm.swap(0, i);
                } else {
                    self.perm.swap(self.counters[i], i);
                }
                self.counters[i] += 1;
                self.cursor = 1;
                return true;
            }
            self.counters[i] = 0;
            self.cursor += 1;
        }
        false
    }

    fn reset(&mut self) {
        let n = self.perm.len();
        self.perm = (0..n).collect();
        self.counters = vec![0; n];
        self.cursor = 1;
        self.started = false;
    }
}

/// Distinct arrangements of a multiset holding `counts[k]` copies of `k`.
///
/// Walks arrangements in lexicographic order starting from the sorted one,
/// so repeated elements never produce duplicate arrangements.
#[derive(Clone, Debug)]
pub struct IdenticalPermutor {
    counts: Vec<usize>,
    perm: Vec<usize>,
    started: bool,
    exhausted: bool,
}

impl IdenticalPermutor {
    pub fn new(counts: &[usize]) -> Self {
        IdenticalPermutor {
            counts: counts.to_vec(),
            perm: sorted_multiset(counts),
            started: false,
            exhausted: false,
        }
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }
}

impl Permutor for IdenticalPermutor {
    fn len(&self) -> usize {
        self.perm.len()
    }

    fn number_of_permutations(&self) -> u128 {
        multinomial(&self.counts)
    }

    fn permutation(&self) -> &[usize] {
        &self.perm
    }

    fn permute(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        if !self.started {
            self.started = true;
            return true;
        }
        if next_lexicographic(&mut self.perm) {
            true
        } else {
            self.exhausted = true;
            false
        }
    }

    fn reset(&mut self) {
        self.perm = sorted_multiset(&self.counts);
        self.started = false;
        self.exhausted = false;
    }
}

fn sorted_multiset(counts: &[usize]) -> Vec<usize> {
    counts
        .iter()
        .enumerate()
        .flat_map(|(k, &n)| std::iter::repeat(k).take(n))
        .collect()
}

/// Rearranges `values` into the next lexicographically greater arrangement.
/// Returns false, leaving `values` untouched, when it is already the last.
fn next_lexicographic(values: &mut [usize]) -> bool {
    let n = values.len();
    if n < 2 {
        return false;
    }

    let mut i = n - 1;
    while i > 0 && values[i - 1] >= values[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }

    let pivot = i - 1;
    let mut j = n - 1;
    while values[j] <= values[pivot] {
        j -= 1;
    }
    values.swap(pivot, j);
    values[i..].reverse();
    true
}

/// n!, saturating.
pub fn factorial(n: usize) -> u128 {
    (1..=n as u128).try_fold(1u128, |acc, k| acc.checked_mul(k)).unwrap_or(u128::MAX)
}

/// (Σ c)! / Π c!, saturating.
pub fn multinomial(counts: &[usize]) -> u128 {
    let mut result: u128 = 1;
    let mut total: u128 = 0;
    for &count in counts {
        for j in 1..=count as u128 {
            total += 1;
            result = match result.checked_mul(total) {
                Some(product) => product / j,
                None => return u128::MAX,
            };
        }
    }
    result
}
