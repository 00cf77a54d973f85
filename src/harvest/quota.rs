// src/harvest/quota.rs
//! Pure quota arithmetic for a harvest run: the initial split of the target
//! across adapters and the single redistribution round for shortfall.

/// Split `target` across `n` adapters as evenly as integer division allows.
/// The remainder goes to the first adapters in priority order, so the
/// allocations always sum to exactly `target`.
pub fn allocate(target: usize, n: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let base = target / n;
    let remainder = target % n;
    (0..n)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// Distribute `shortfall` among eligible adapters proportionally to their
/// original quota share, using largest-remainder rounding with priority
/// order as the tie-break. Ineligible adapters get 0. The returned extras
/// sum to exactly `shortfall` when any adapter is eligible, so the final
/// allocation total never exceeds the original target.
pub fn redistribute(shortfall: usize, original: &[usize], eligible: &[bool]) -> Vec<usize> {
    debug_assert_eq!(original.len(), eligible.len());
    let mut extras = vec![0usize; original.len()];
    if shortfall == 0 {
        return extras;
    }

    let total_weight: usize = original
        .iter()
        .zip(eligible)
        .filter(|(_, &e)| e)
        .map(|(&q, _)| q)
        .sum();
    if total_weight == 0 {
        return extras;
    }

    // Floor shares first, then hand out the remainder by largest fractional
    // part (priority order breaks ties).
    let mut fractions: Vec<(usize, usize)> = Vec::new(); // (index, numerator remainder)
    let mut assigned = 0usize;
    for (i, (&q, &e)) in original.iter().zip(eligible).enumerate() {
        if !e || q == 0 {
            continue;
        }
        let num = shortfall * q;
        extras[i] = num / total_weight;
        assigned += extras[i];
        fractions.push((i, num % total_weight));
    }

    let mut leftover = shortfall - assigned;
    fractions.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    for (i, _) in fractions {
        if leftover == 0 {
            break;
        }
        extras[i] += 1;
        leftover -= 1;
    }

    extras
}
