//! Performance statistics over canonical trades.
//!
//! Every ratio is a percentage in `0.0..=100.0` at full precision; a zero
//! denominator yields `0.0`.

use std::collections::HashMap;

use super::trade::{Outcome, PLACEHOLDER, Trade, TriState};

/// `part / whole * 100`, or zero for an empty denominator.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BucketStats {
    pub trades: usize,
    pub wins: usize,
    pub win_rate: f64,
}

impl BucketStats {
    fn collect<'t>(trades: impl IntoIterator<Item = &'t Trade>) -> Self {
        let (mut count, mut wins) = (0usize, 0usize);
        for trade in trades {
            count += 1;
            if trade.is_win() {
                wins += 1;
            }
        }
        Self {
            trades: count,
            wins,
            win_rate: percentage(wins, count),
        }
    }
}

/// Dashboard headline figures.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JournalMetrics {
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
    pub breakevens: usize,
    pub win_rate: f64,
    /// Mean over every trade, unset ratios counted as zero.
    pub avg_rr: f64,
    pub total_pnl: f64,
    pub rules_followed: usize,
    pub rules_broken: usize,
    /// Followed over answered; unanswered trades are excluded.
    pub rule_adherence: f64,
    pub rule_break_pct: f64,
    pub followed_win_rate: f64,
    pub broken_win_rate: f64,
    pub full_confirmation: BucketStats,
    pub partial_confirmation: BucketStats,
}

impl JournalMetrics {
    pub fn compute(trades: &[Trade]) -> Self {
        let total = trades.len();
        let count = |outcome: Outcome| trades.iter().filter(|t| t.outcome == outcome).count();
        let wins = count(Outcome::Win);
        let losses = count(Outcome::Loss);
        let breakevens = count(Outcome::BreakEven);

        let avg_rr = if total > 0 {
            trades.iter().map(|t| t.rr_ratio).sum::<f64>() / total as f64
        } else {
            0.0
        };
        let total_pnl = trades.iter().map(Trade::pnl).sum();

        let followed = BucketStats::collect(
            trades.iter().filter(|t| t.followed_rules == TriState::Yes),
        );
        let broken = BucketStats::collect(
            trades.iter().filter(|t| t.followed_rules == TriState::No),
        );
        let answered = followed.trades + broken.trades;

        Self {
            total,
            wins,
            losses,
            breakevens,
            win_rate: percentage(wins, total),
            avg_rr,
            total_pnl,
            rules_followed: followed.trades,
            rules_broken: broken.trades,
            rule_adherence: percentage(followed.trades, answered),
            rule_break_pct: percentage(broken.trades, answered),
            followed_win_rate: followed.win_rate,
            broken_win_rate: broken.win_rate,
            full_confirmation: BucketStats::collect(
                trades.iter().filter(|t| t.is_fully_confirmed()),
            ),
            partial_confirmation: BucketStats::collect(
                trades.iter().filter(|t| t.is_partially_confirmed()),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: String,
    pub equity: f64,
}

/// Running P&L total in the order given. Callers sort chronologically first.
pub fn equity_curve(trades: &[Trade]) -> Vec<EquityPoint> {
    let mut cumulative = 0.0;
    trades
        .iter()
        .map(|t| {
            cumulative += t.pnl();
            EquityPoint {
                date: t.date.clone(),
                equity: cumulative,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Pair,
    TradeType,
}

impl GroupKey {
    fn of(self, trade: &Trade) -> &str {
        match self {
            GroupKey::Pair => &trade.pair,
            GroupKey::TradeType => &trade.trade_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupPerformance {
    pub name: String,
    pub trade_count: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub pnl: f64,
}

/// Per-key totals, best P&L first. Placeholder keys are skipped; equal P&L
/// keeps first-seen order.
pub fn group_performance(trades: &[Trade], key: GroupKey) -> Vec<GroupPerformance> {
    let mut groups: Vec<GroupPerformance> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for trade in trades {
        let name = key.of(trade);
        if name == PLACEHOLDER {
            continue;
        }
        let slot = *index.entry(name).or_insert_with(|| {
            groups.push(GroupPerformance {
                name: name.to_string(),
                trade_count: 0,
                wins: 0,
                win_rate: 0.0,
                pnl: 0.0,
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.trade_count += 1;
        group.pnl += trade.pnl();
        if trade.is_win() {
            group.wins += 1;
        }
    }

    for group in &mut groups {
        group.win_rate = percentage(group.wins, group.trade_count);
    }
    groups.sort_by(|a, b| b.pnl.total_cmp(&a.pnl));
    groups
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MistakeTally {
    pub text: String,
    pub count: usize,
}

/// Fragments shorter than this are noise ("late", "fomo").
const MIN_MISTAKE_LEN: usize = 6;

fn mistake_fragments(notes: &str) -> impl Iterator<Item = String> + '_ {
    notes
        .split([',', '.', ';', '\n'])
        .map(|s| s.trim().to_lowercase())
        .filter(|s| s.chars().count() >= MIN_MISTAKE_LEN)
}

/// Most frequent mistake phrase across all notes. Ties go to the phrase seen
/// first.
pub fn top_mistake(trades: &[Trade]) -> Option<MistakeTally> {
    let mut tallies: Vec<MistakeTally> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for fragment in trades.iter().flat_map(|t| mistake_fragments(&t.mistakes)) {
        match index.get(&fragment) {
            Some(&slot) => tallies[slot].count += 1,
            None => {
                index.insert(fragment.clone(), tallies.len());
                tallies.push(MistakeTally {
                    text: fragment,
                    count: 1,
                });
            }
        }
    }

    tallies.into_iter().fold(None, |best, tally| match best {
        Some(b) if b.count >= tally.count => Some(b),
        _ => Some(tally),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmotionCount {
    pub label: String,
    pub count: usize,
}

/// Trades per emotion label in first-seen order, placeholder excluded.
pub fn emotion_distribution(trades: &[Trade]) -> Vec<EmotionCount> {
    let mut counts: Vec<EmotionCount> = Vec::new();
    for trade in trades {
        if trade.emotion.is_empty() || trade.emotion == PLACEHOLDER {
            continue;
        }
        match counts.iter_mut().find(|c| c.label == trade.emotion) {
            Some(c) => c.count += 1,
            None => counts.push(EmotionCount {
                label: trade.emotion.clone(),
                count: 1,
            }),
        }
    }
    counts
}

/// Summary row of the trade log.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogStats {
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub avg_rr: f64,
    pub rule_breaks: usize,
    /// Longest run of consecutive wins in the order given.
    pub best_win_streak: usize,
}

impl LogStats {
    pub fn compute<'t>(trades: impl IntoIterator<Item = &'t Trade>) -> Self {
        let mut stats = LogStats::default();
        let mut rr_sum = 0.0;
        let mut streak = 0usize;

        for trade in trades {
            stats.total += 1;
            stats.total_pnl += trade.pnl();
            rr_sum += trade.rr_ratio;
            match trade.outcome {
                Outcome::Win => {
                    stats.wins += 1;
                    streak += 1;
                    stats.best_win_streak = stats.best_win_streak.max(streak);
                }
                Outcome::Loss => {
                    stats.losses += 1;
                    streak = 0;
                }
                _ => streak = 0,
            }
            if trade.followed_rules == TriState::No {
                stats.rule_breaks += 1;
            }
        }

        stats.win_rate = percentage(stats.wins, stats.total);
        if stats.total > 0 {
            stats.avg_rr = rr_sum / stats.total as f64;
        }
        stats
    }
}
