use std::collections::{BTreeSet, HashSet};

use strsim::normalized_levenshtein;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::sources::BettingLine;

/// Minimum normalized edit similarity for a sportsbook key to be rewritten
/// onto a live key.
pub const FUZZY_MATCH_CUTOFF: f64 = 0.85;

#[derive(Debug, Clone, PartialEq)]
pub struct KeyRewrite {
    pub from: String,
    pub to: String,
    pub score: f64,
}

/// Folds a display name into the join key shared by all three sources.
///
/// Diacritics are stripped, case is folded, periods and apostrophes are
/// deleted and hyphens become a single space, so "Karl-Anthony Towns" and
/// "karl anthony towns" share a key. Absent input yields an empty key.
pub fn normalize_name(name: Option<&str>) -> String {
    let Some(name) = name else {
        return String::new();
    };
    let mut cleaned = String::with_capacity(name.len());
    for ch in name.nfd() {
        if is_combining_mark(ch) {
            continue;
        }
        match ch {
            '.' | '\'' | '\u{2019}' => {}
            '-' => cleaned.push(' '),
            _ => cleaned.extend(ch.to_lowercase()),
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Best candidate at or above the cutoff. Ties keep the smallest key so the
/// result does not depend on iteration order.
pub fn closest_key<'a, I>(key: &str, candidates: I) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, f64)> = None;
    for candidate in candidates {
        let score = normalized_levenshtein(key, candidate);
        if score < FUZZY_MATCH_CUTOFF {
            continue;
        }
        best = match best {
            Some((cur, cur_score))
                if cur_score > score || (cur_score == score && cur <= candidate) =>
            {
                Some((cur, cur_score))
            }
            _ => Some((candidate, score)),
        };
    }
    best
}

/// Rewrites sportsbook keys that have no exact live counterpart onto their
/// closest live key. Runs once per cycle, before the lines are pivoted.
///
/// A live key already carried by an exact sportsbook key is never a target,
/// and each live key receives at most one rewritten key: the best scoring one,
/// ties broken by the smaller sportsbook key.
pub fn reconcile_line_keys(
    lines: &mut [BettingLine],
    live_keys: &HashSet<String>,
) -> Vec<KeyRewrite> {
    let book_keys: BTreeSet<String> = lines
        .iter()
        .map(|line| line.key.clone())
        .filter(|key| !key.is_empty())
        .collect();
    let open_targets: BTreeSet<&str> = live_keys
        .iter()
        .map(String::as_str)
        .filter(|key| !book_keys.contains(*key))
        .collect();

    let mut proposals: Vec<KeyRewrite> = book_keys
        .iter()
        .filter(|key| !live_keys.contains(*key))
        .filter_map(|key| {
            let (target, score) = closest_key(key, open_targets.iter().copied())?;
            Some(KeyRewrite {
                from: key.clone(),
                to: target.to_string(),
                score,
            })
        })
        .collect();
    proposals.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.from.cmp(&b.from)));

    let mut claimed: HashSet<String> = HashSet::new();
    let mut rewrites = Vec::new();
    for proposal in proposals {
        if claimed.insert(proposal.to.clone()) {
            rewrites.push(proposal);
        }
    }
    rewrites.sort_by(|a, b| a.from.cmp(&b.from));

    for rewrite in &rewrites {
        for line in lines.iter_mut().filter(|line| line.key == rewrite.from) {
            line.key = rewrite.to.clone();
        }
    }
    rewrites
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{closest_key, normalize_name, reconcile_line_keys};
    use crate::sources::{BettingLine, StatCategory};

    fn line(player: &str, line: f64) -> BettingLine {
        BettingLine {
            player: player.to_string(),
            key: normalize_name(Some(player)),
            category: StatCategory::Points,
            line: Some(line),
        }
    }

    #[test]
    fn diacritics_and_case_fold_to_same_key() {
        assert_eq!(
            normalize_name(Some("Nikola Jokić")),
            normalize_name(Some("nikola jokic"))
        );
        assert_eq!(normalize_name(Some("Luka Dončić")), "luka doncic");
    }

    #[test]
    fn absent_and_empty_names_yield_empty_key() {
        assert_eq!(normalize_name(None), "");
        assert_eq!(normalize_name(Some("")), "");
        assert_eq!(normalize_name(Some("   ")), "");
    }

    #[test]
    fn punctuation_rules() {
        assert_eq!(
            normalize_name(Some("Karl-Anthony Towns")),
            "karl anthony towns"
        );
        assert_eq!(normalize_name(Some("De'Aaron Fox")), "deaaron fox");
        assert_eq!(normalize_name(Some("  P.J.   Washington ")), "pj washington");
        assert_eq!(normalize_name(Some("D\u{2019}Angelo Russell")), "dangelo russell");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in [
            "Nikola Jokić",
            "Karl-Anthony Towns",
            "  Shai Gilgeous-Alexander  ",
            "Jonas Valančiūnas",
            "O.G. Anunoby",
        ] {
            let once = normalize_name(Some(raw));
            assert_eq!(normalize_name(Some(&once)), once, "input {raw}");
        }
    }

    #[test]
    fn one_char_insertion_is_rewritten() {
        let live: HashSet<String> = ["nikola jokic".to_string()].into_iter().collect();
        let mut lines = vec![line("Nikola Jokick", 27.5)];
        let rewrites = reconcile_line_keys(&mut lines, &live);
        assert_eq!(rewrites.len(), 1);
        assert!(rewrites[0].score >= 0.85);
        assert_eq!(lines[0].key, "nikola jokic");
        assert_eq!(lines[0].player, "Nikola Jokick");
    }

    #[test]
    fn dissimilar_key_is_left_alone() {
        let live: HashSet<String> = ["lebron james".to_string()].into_iter().collect();
        let mut lines = vec![line("Giannis Antetokounmpo", 30.5)];
        let rewrites = reconcile_line_keys(&mut lines, &live);
        assert!(rewrites.is_empty());
        assert_eq!(lines[0].key, "giannis antetokounmpo");
    }

    #[test]
    fn exact_keys_are_not_touched() {
        let live: HashSet<String> = ["jalen brunson".to_string(), "jalen bronson".to_string()]
            .into_iter()
            .collect();
        let mut lines = vec![line("Jalen Brunson", 26.5)];
        assert!(reconcile_line_keys(&mut lines, &live).is_empty());
        assert_eq!(lines[0].key, "jalen brunson");
    }

    #[test]
    fn every_row_with_the_key_is_rewritten() {
        let live: HashSet<String> = ["nikola jokic".to_string()].into_iter().collect();
        let mut lines = vec![line("Nikola Jokick", 27.5), line("Nikola Jokick", 11.5)];
        reconcile_line_keys(&mut lines, &live);
        assert!(lines.iter().all(|l| l.key == "nikola jokic"));
    }

    #[test]
    fn live_key_with_exact_line_is_not_a_target() {
        let live: HashSet<String> = ["jalen brunson".to_string()].into_iter().collect();
        let mut lines = vec![line("Jalen Bronson", 10.5), line("Jalen Brunson", 26.5)];
        let rewrites = reconcile_line_keys(&mut lines, &live);
        assert!(rewrites.is_empty());
        assert_eq!(lines[0].key, "jalen bronson");
        assert_eq!(lines[1].key, "jalen brunson");
    }

    #[test]
    fn competing_keys_leave_one_winner() {
        let live: HashSet<String> = ["nikola jokic".to_string()].into_iter().collect();
        let mut lines = vec![line("Nikola Jokicc", 11.5), line("Nikola Jokick", 27.5)];
        let rewrites = reconcile_line_keys(&mut lines, &live);
        assert_eq!(rewrites.len(), 1);
        assert_eq!(rewrites[0].from, "nikola jokicc");
        let rewritten = lines.iter().filter(|l| l.key == "nikola jokic").count();
        assert_eq!(rewritten, 1);
    }

    #[test]
    fn closest_key_picks_top_candidate() {
        let candidates = ["anthony davis", "anthony edwards", "anthony black"];
        let (best, _) = closest_key("anthony edward", candidates).expect("candidate");
        assert_eq!(best, "anthony edwards");
        assert!(closest_key("zion williamson", candidates).is_none());
    }
}
