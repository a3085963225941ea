//! Line shuffling for the Code Shuffle mode

use rand::Rng;
use rand::seq::SliceRandom;

/// Shuffle the non-blank lines of a snippet into a uniformly random order.
///
/// Escaped newlines from seed data (`\n` as two characters) are
/// normalized first. Line content is preserved exactly; only blank lines
/// are dropped.
pub fn shuffle_lines<R: Rng + ?Sized>(code: &str, rng: &mut R) -> Vec<String> {
    let normalized = code.replace("\\n", "\n");
    let mut lines: Vec<String> = normalized
        .trim()
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(String::from)
        .collect();
    lines.shuffle(rng);
    lines
}

/// Production entry point drawing fresh randomness
pub fn shuffle_code(code: &str) -> Vec<String> {
    shuffle_lines(code, &mut rand::rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    const SNIPPET: &str = "def twoSum(nums, target):\n    seen = {}\n\n    for i, n in enumerate(nums):\n        if target - n in seen:\n            return [seen[target - n], i]\n        seen[n] = i\n";

    fn multiset(lines: &[String]) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for line in lines {
            *counts.entry(line.as_str()).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_shuffle_is_a_permutation_of_non_blank_lines() {
        let mut rng = StdRng::seed_from_u64(7);
        let shuffled = shuffle_lines(SNIPPET, &mut rng);
        let original: Vec<String> = SNIPPET
            .trim()
            .split('\n')
            .filter(|l| !l.trim().is_empty())
            .map(String::from)
            .collect();
        assert_eq!(shuffled.len(), original.len());
        assert_eq!(multiset(&shuffled), multiset(&original));
    }

    #[test]
    fn test_escaped_newlines_are_normalized() {
        let mut rng = StdRng::seed_from_u64(1);
        let shuffled = shuffle_lines("a = 1\\nb = 2\\nc = 3", &mut rng);
        assert_eq!(shuffled.len(), 3);
        assert!(shuffled.contains(&"b = 2".to_string()));
    }

    #[test]
    fn test_line_content_kept_verbatim() {
        let mut rng = StdRng::seed_from_u64(3);
        let shuffled = shuffle_lines("    indented = True\nplain = False", &mut rng);
        assert!(shuffled.contains(&"    indented = True".to_string()));
    }

    #[test]
    fn test_same_seed_same_order() {
        let a = shuffle_lines(SNIPPET, &mut StdRng::seed_from_u64(42));
        let b = shuffle_lines(SNIPPET, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
