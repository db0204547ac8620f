//! Read-only views over the ledger and their chat rendering.

use medal_core::ids::MemberId;
use medal_core::stats::MemberStats;
use medal_store::Ledger;

/// Platform limit for a single message.
pub const MESSAGE_LIMIT: usize = 2000;

pub const NO_DATA: &str = "There is no data yet.";

/// Members by total medals, highest first. Equal totals keep ascending id
/// order.
pub fn leaderboard(ledger: &Ledger) -> Vec<(MemberId, MemberStats)> {
    let mut entries: Vec<(MemberId, MemberStats)> =
        ledger.iter().map(|(id, stats)| (id, *stats)).collect();
    entries.sort_by(|a, b| b.1.total_medals().cmp(&a.1.total_medals()));
    entries
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GrandTotals {
    pub auto: u64,
    pub manual: u64,
    pub total: u64,
}

pub fn grand_totals(ledger: &Ledger) -> GrandTotals {
    let (auto, manual) = ledger.iter().fold((0u64, 0u64), |(a, m), (_, stats)| {
        (
            a.saturating_add(stats.auto_medals),
            m.saturating_add(stats.manual_medals),
        )
    });
    GrandTotals {
        auto,
        manual,
        total: auto.saturating_add(manual),
    }
}

pub fn fallback_name(member: MemberId) -> String {
    format!("ID {member}")
}

/// One line per entry, names already resolved.
pub fn render_leaderboard(entries: &[(String, MemberStats)]) -> String {
    if entries.is_empty() {
        return NO_DATA.to_string();
    }
    let mut out = String::from("**Medal overview:**\n");
    for (name, stats) in entries {
        out.push_str(&format!(
            "**{name}** - {} medals (Auto: {}, Manual: {}, PvM: {}, PvP: {})\n",
            stats.total_medals(),
            stats.auto_medals,
            stats.manual_medals,
            stats.pvm_runs,
            stats.pvp_runs,
        ));
    }
    out
}

pub fn render_totals(totals: &GrandTotals) -> String {
    format!(
        "**Total medals of all players:**\n- Automatic: **{}**\n- Manual: **{}**\n- Total: **{}**",
        totals.auto, totals.manual, totals.total
    )
}

/// Split on line boundaries into pieces of at most `limit` bytes. A single
/// line longer than `limit` is cut at char boundaries.
pub fn chunk_lines(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        let needed = if current.is_empty() { line.len() } else { line.len() + 1 };
        if current.len() + needed > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if line.len() > limit {
            let mut rest = line;
            while rest.len() > limit {
                let mut cut = limit;
                while !rest.is_char_boundary(cut) {
                    cut -= 1;
                }
                chunks.push(rest[..cut].to_string());
                rest = &rest[cut..];
            }
            current.push_str(rest);
            continue;
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(auto: u64, manual: u64) -> MemberStats {
        MemberStats {
            auto_medals: auto,
            manual_medals: manual,
            ..Default::default()
        }
    }

    fn ledger(rows: &[(u64, u64, u64)]) -> Ledger {
        rows.iter()
            .map(|&(id, auto, manual)| (MemberId::new(id), stats(auto, manual)))
            .collect()
    }

    #[test]
    fn leaderboard_sorted_by_total() {
        let l = ledger(&[(1, 10, 0), (2, 5, 0), (3, 3, 3)]);
        let ids: Vec<u64> = leaderboard(&l).iter().map(|(id, _)| id.get()).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn ties_by_ascending_id() {
        let l = ledger(&[(30, 4, 0), (10, 0, 4), (20, 2, 2), (5, 1, 0)]);
        let ids: Vec<u64> = leaderboard(&l).iter().map(|(id, _)| id.get()).collect();
        assert_eq!(ids, vec![10, 20, 30, 5]);
    }

    #[test]
    fn totals_sum_both_kinds() {
        let l = ledger(&[(1, 10, 2), (2, 5, 0), (3, 0, 7)]);
        assert_eq!(
            grand_totals(&l),
            GrandTotals {
                auto: 15,
                manual: 9,
                total: 24
            }
        );
        assert_eq!(grand_totals(&Ledger::new()), GrandTotals::default());
    }

    #[test]
    fn render_empty_is_no_data() {
        assert_eq!(render_leaderboard(&[]), NO_DATA);
    }

    #[test]
    fn render_line_format() {
        let s = MemberStats {
            auto_medals: 14,
            pvm_runs: 3,
            pvp_runs: 1,
            manual_medals: 2,
        };
        let text = render_leaderboard(&[("Mira".to_string(), s), (fallback_name(MemberId::new(7)), MemberStats::default())]);
        assert_eq!(
            text,
            "**Medal overview:**\n\
             **Mira** - 16 medals (Auto: 14, Manual: 2, PvM: 3, PvP: 1)\n\
             **ID 7** - 0 medals (Auto: 0, Manual: 0, PvM: 0, PvP: 0)\n"
        );
    }

    #[test]
    fn render_totals_format() {
        let text = render_totals(&GrandTotals { auto: 15, manual: 9, total: 24 });
        assert!(text.contains("Automatic: **15**"));
        assert!(text.contains("Total: **24**"));
    }

    #[test]
    fn chunking_respects_limit_and_lines() {
        let text: String = (0..300).map(|i| format!("line number {i:04}\n")).collect();
        let chunks = chunk_lines(&text, MESSAGE_LIMIT);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.len() <= MESSAGE_LIMIT));
        assert!(chunks.iter().all(|c| c.starts_with("line number")));
        assert_eq!(chunks.join("\n"), text.trim_end());
    }

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_lines("a\nb", 10), vec!["a\nb".to_string()]);
        assert!(chunk_lines("", 10).is_empty());
    }

    #[test]
    fn overlong_line_is_cut() {
        let line = "é".repeat(10);
        let chunks = chunk_lines(&line, 5);
        assert!(chunks.iter().all(|c| c.len() <= 5));
        assert_eq!(chunks.concat(), line);
    }
}
