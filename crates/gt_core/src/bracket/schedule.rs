//! Round-robin pairing schedule (circle method)
//!
//! Competitor `m - 1` stays fixed while the rest rotate one step per cycle.
//! An odd field gets a phantom competitor whose pairings are dropped, which
//! gives every real competitor one rest cycle.

/// 리그전 인원
pub const LEAGUE_SIZE: usize = 6;

/// Largest field the compile-time check covers
const MAX_CHECKED: usize = 16;

/// Field size after padding an odd count with a phantom
pub const fn padded(n: usize) -> usize {
    if n % 2 == 0 {
        n
    } else {
        n + 1
    }
}

/// Number of cycles for `n` competitors
pub const fn cycle_count(n: usize) -> usize {
    if n < 2 {
        0
    } else {
        padded(n) - 1
    }
}

/// Pairing `slot` of `cycle` for an even field of `m`.
pub const fn circle_pairing(m: usize, cycle: usize, slot: usize) -> (usize, usize) {
    let rot = m - 1;
    if slot == 0 {
        (rot, cycle % rot)
    } else {
        ((cycle + slot) % rot, (cycle + rot - slot) % rot)
    }
}

/// Every pair meets exactly once and nobody plays twice in a cycle.
pub const fn is_one_factorization(m: usize) -> bool {
    if m < 2 || m % 2 != 0 || m > MAX_CHECKED {
        return false;
    }
    let mut met = [[false; MAX_CHECKED]; MAX_CHECKED];
    let mut cycle = 0;
    while cycle < m - 1 {
        let mut busy = [false; MAX_CHECKED];
        let mut slot = 0;
        while slot < m / 2 {
            let (a, b) = circle_pairing(m, cycle, slot);
            if a == b || busy[a] || busy[b] || met[a][b] {
                return false;
            }
            busy[a] = true;
            busy[b] = true;
            met[a][b] = true;
            met[b][a] = true;
            slot += 1;
        }
        cycle += 1;
    }
    let mut i = 0;
    while i < m {
        let mut j = i + 1;
        while j < m {
            if !met[i][j] {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

const _: () = assert!(is_one_factorization(LEAGUE_SIZE));
const _: () = assert!(is_one_factorization(padded(5)));
const _: () = assert!(is_one_factorization(8));
const _: () = assert!(cycle_count(LEAGUE_SIZE) == 5);

/// Index pairs per cycle for `n` competitors. Phantom pairings are dropped.
pub fn round_robin_schedule(n: usize) -> Vec<Vec<(usize, usize)>> {
    let m = padded(n);
    (0..cycle_count(n))
        .map(|cycle| {
            (0..m / 2)
                .map(|slot| circle_pairing(m, cycle, slot))
                .filter(|(a, b)| *a < n && *b < n)
                .map(|(a, b)| if a < b { (a, b) } else { (b, a) })
                .collect()
        })
        .collect()
}
