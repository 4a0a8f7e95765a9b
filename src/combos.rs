use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::error::EncodeError;
use crate::filters::FilterKey;

/// Round codes 0-6 (Final through R128) combine freely; the ATP-only
/// "first round"/"first match" codes never combine.
static ROUND_COMBOS: Lazy<HashSet<String>> = Lazy::new(|| {
    const LATE_ROUNDS: [&str; 7] = ["0", "1", "2", "3", "4", "5", "6"];
    let mut combos = HashSet::new();
    for mask in 1u32..(1 << LATE_ROUNDS.len()) {
        if mask.count_ones() < 2 {
            continue;
        }
        let key: String = LATE_ROUNDS
            .iter()
            .enumerate()
            .filter(|(bit, _)| mask & (1 << bit) != 0)
            .map(|(_, code)| *code)
            .collect();
        combos.insert(key);
    }
    combos
});

// straight: deciding, 4/5, 5/5, 3/3
// deciding: 3/5, 4/5, 2/3
// best of 5: 2/3, 3/3
// 3/5: 4/5, 5/5, bo3, 3/3
// 4/5: 5/5, bo3, 2/3, 3/3
// 5/5: bo3, 2/3
static SETS_COMBOS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "01", "04", "05", "08", "13", "14", "17", "27", "28", "34", "35", "36", "38", "45", "46",
        "47", "48", "56", "57",
    ]
    .into_iter()
    .collect()
});

/// Up to one "Under", one "Over" and one of Shorter/Taller. Kept as data while
/// list-valued heights stay disabled: the site ORs them incorrectly.
pub static HEIGHT_COMBOS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "02", "03", "04", "05", "12", "13", "14", "15", "24", "25", "34", "35", "024", "025",
        "034", "035", "124", "125", "134", "135",
    ]
    .into_iter()
    .collect()
});

const ROUND_MESSAGE: &str = "Valid 'round' lists that combine categories may only include round \
     names for late rounds ('Quarterfinal' or later) and those based on the number of remaining \
     players ('Round of 16'/'R16' or earlier).";

const SETS_MESSAGE: &str = "Valid 'sets' lists can include up to two categories that aren't \
     already covered by an existing category. For example, ['4 of 5 sets', 'straight sets'] is \
     valid. However, ['3 of 3 sets', '5 of 5 sets'] is not, since this combination is just \
     'deciding set'.";

const HEIGHT_MESSAGE: &str = "Valid 'height' lists that combine categories can include up to one \
     'Under' category, up to one 'Over' category, and up to one of 'Shorter'/'Taller'.";

pub fn combo_key<S: AsRef<str>>(codes: &[S]) -> String {
    let mut sorted: Vec<&str> = codes.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();
    sorted.concat()
}

fn allows(key: FilterKey, joint: &str) -> Option<bool> {
    match key {
        FilterKey::Round => Some(ROUND_COMBOS.contains(joint)),
        FilterKey::Sets => Some(SETS_COMBOS.contains(joint)),
        FilterKey::VsHeight => Some(HEIGHT_COMBOS.contains(joint)),
        _ => None,
    }
}

/// Checks a list of per-value codes against the key's allow-list. Keys without
/// an allow-list, and single values, always pass.
pub fn validate_combo<S: AsRef<str>>(key: FilterKey, codes: &[S]) -> Result<(), EncodeError> {
    if codes.len() < 2 {
        return Ok(());
    }
    let joint = combo_key(codes);
    match allows(key, &joint) {
        Some(false) => Err(EncodeError::IllegalCombination {
            key,
            message: match key {
                FilterKey::Round => ROUND_MESSAGE,
                FilterKey::Sets => SETS_MESSAGE,
                _ => HEIGHT_MESSAGE,
            },
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn illegal(key: FilterKey, codes: &[&str]) -> bool {
        matches!(
            validate_combo(key, codes),
            Err(EncodeError::IllegalCombination { .. })
        )
    }

    #[test]
    fn round_combos_cover_every_late_round_subset() {
        assert_eq!(ROUND_COMBOS.len(), 120);
        assert!(!illegal(FilterKey::Round, &["2", "0", "1"]));
        assert!(!illegal(FilterKey::Round, &["6", "3"]));
    }

    #[test]
    fn early_round_names_never_combine() {
        assert!(illegal(FilterKey::Round, &["10", "7"]));
        assert!(illegal(FilterKey::Round, &["0", "9"]));
        // duplicates collapse to a redundant list
        assert!(illegal(FilterKey::Round, &["0", "0"]));
    }

    #[test]
    fn sets_combos_reject_lists_that_spell_out_a_category() {
        // 3/3 + 4/5
        assert!(!illegal(FilterKey::Sets, &["8", "4"]));
        // 2/3 + 3/3 is best of 3
        assert!(illegal(FilterKey::Sets, &["7", "8"]));
        // 3/3 + 5/5 is deciding set
        assert!(illegal(FilterKey::Sets, &["8", "5"]));
        // three values never pass
        assert!(illegal(FilterKey::Sets, &["3", "4", "5"]));
    }

    /// Match outcomes each sets code covers, as (sets won by the winner, best of).
    fn set_outcomes(code: &str) -> HashSet<(u8, u8)> {
        let outcomes: &[(u8, u8)] = match code {
            "0" => &[(2, 3), (3, 5)],
            "1" => &[(3, 3), (5, 5)],
            "2" => &[(3, 5), (4, 5), (5, 5)],
            "3" => &[(3, 5)],
            "4" => &[(4, 5)],
            "5" => &[(5, 5)],
            "6" => &[(2, 3), (3, 3)],
            "7" => &[(2, 3)],
            "8" => &[(3, 3)],
            _ => unreachable!("no sets code {code}"),
        };
        outcomes.iter().copied().collect()
    }

    #[test]
    fn sets_pairs_are_legal_exactly_when_they_add_a_new_category() {
        const CODES: [&str; 9] = ["0", "1", "2", "3", "4", "5", "6", "7", "8"];
        let every: HashSet<(u8, u8)> = CODES.iter().flat_map(|c| set_outcomes(c)).collect();
        let categories: Vec<HashSet<(u8, u8)>> = CODES.iter().map(|c| set_outcomes(c)).collect();

        let mut legal = 0;
        for (i, a) in CODES.iter().enumerate() {
            for b in &CODES[i..] {
                let (left, right) = (set_outcomes(a), set_outcomes(b));
                let union: HashSet<(u8, u8)> = left.union(&right).copied().collect();
                let expected = left.is_disjoint(&right)
                    && !categories.contains(&union)
                    && union != every;
                let joint = combo_key(&[*a, *b]);
                assert_eq!(SETS_COMBOS.contains(joint.as_str()), expected, "{joint}");
                assert_eq!(!illegal(FilterKey::Sets, &[*b, *a]), expected, "{joint}");
                legal += usize::from(expected);
            }
        }
        assert_eq!(legal, SETS_COMBOS.len());
    }

    #[test]
    fn height_combos_pair_at_most_one_of_each_kind() {
        for joint in HEIGHT_COMBOS.iter() {
            let shorter_taller = joint.chars().filter(|c| *c == '0' || *c == '1').count();
            let under = joint.chars().filter(|c| *c == '2' || *c == '3').count();
            let over = joint.chars().filter(|c| *c == '4' || *c == '5').count();
            assert!(shorter_taller <= 1 && under <= 1 && over <= 1, "{joint}");
        }
        assert!(illegal(FilterKey::VsHeight, &["2", "3"]));
        assert!(!illegal(FilterKey::VsHeight, &["5", "1", "3"]));
    }

    #[test]
    fn keys_without_allow_lists_pass() {
        assert!(validate_combo(FilterKey::Surface, &["0", "0", "3"]).is_ok());
        assert!(validate_combo(FilterKey::Sets, &["2"]).is_ok());
    }
}
