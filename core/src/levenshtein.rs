//! Bounded edit distance for typo-tolerant term matching.
//!
//! `|len(a) - len(b)|` is a lower bound on the edit distance, so most
//! vocabulary entries are rejected before any DP row is allocated.

/// Are these strings within `max` insertions, deletions or substitutions of each other?
pub fn within(a: &str, b: &str, max: usize) -> bool {
    // character counts, not byte lengths
    let a_len = a.chars().count();
    let b_len = b.chars().count();

    if a_len.abs_diff(b_len) > max {
        return false;
    }

    let mut dp: Vec<usize> = (0..=b_len).collect();
    for (i, ac) in a.chars().enumerate() {
        let mut prev = dp[0];
        dp[0] = i + 1;
        let mut min_row = dp[0];

        for (j, bc) in b.chars().enumerate() {
            let temp = dp[j + 1];
            let cost = usize::from(ac != bc);
            dp[j + 1] = (dp[j + 1] + 1).min(dp[j] + 1).min(prev + cost);
            prev = temp;
            min_row = min_row.min(dp[j + 1]);
        }

        // the row minimum never decreases, give up once it is out of reach
        if min_row > max {
            return false;
        }
    }

    dp[b_len] <= max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        assert!(within("install", "install", 0));
    }

    #[test]
    fn single_edits() {
        assert!(within("instal", "install", 1));
        assert!(within("install", "instal", 1));
        assert!(within("config", "conf1g", 1));
    }

    #[test]
    fn two_edits() {
        assert!(within("uninstall", "install", 2));
        assert!(within("cnofig", "config", 2));
        assert!(!within("instal", "uninstall", 2));
    }

    #[test]
    fn length_gap_exits_early() {
        assert!(!within("a", "abcdef", 2));
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert!(within("cafe", "café", 1));
    }
}
