//! End-to-end tests across the storage port, the merge/normalize pipeline,
//! metrics and the checklist-to-journal hand-off.

mod common;

use approx::assert_relative_eq;
use chrono::{TimeZone, Utc};
use common::*;
use serde_json::json;
use tradeflow::adapters::memory_store::MemoryStore;
use tradeflow::domain::checklist::{Checklist, ExecutionMode, Verdict};
use tradeflow::domain::journal::{JournalDraft, create_entry, take_pending};
use tradeflow::domain::metrics::{
    GroupKey, JournalMetrics, LogStats, equity_curve, group_performance, top_mistake,
};
use tradeflow::domain::pair::find_pair;
use tradeflow::domain::repository::{
    Collection, RecordRepository, SortOrder, TradeFilter, load_trades,
};
use tradeflow::domain::sizing::{Direction, compute_position_size, SizingInput};
use tradeflow::domain::trade::{Outcome, TriState};

mod merge_pipeline {
    use super::*;

    #[test]
    fn journal_and_legacy_records_are_merged_without_duplicates() {
        let store = seeded_store(
            vec![
                journal_record("1", "2024-03-01", "Win", "100"),
                journal_record("2", "2024-03-02", "Loss", "-50"),
            ],
            vec![
                legacy_record("2", "2024-03-02", "Loss", -50.0),
                legacy_record("3", "2024-02-28", "Win", 80.0),
            ],
        );
        let repo = RecordRepository::new(&store);

        let trades = load_trades(&repo, SortOrder::Chronological).unwrap();
        let ids: Vec<&str> = trades.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
        assert_eq!(trades[0].pair, "GU");
        assert_eq!(trades[0].outcome, Outcome::Win);
    }

    #[test]
    fn loading_twice_gives_identical_results() {
        let store = seeded_store(
            vec![journal_record("1", "2024-03-01", "Win", "100")],
            vec![legacy_record("1", "2024-03-01", "Win", 100.0)],
        );
        let repo = RecordRepository::new(&store);
        let first = load_trades(&repo, SortOrder::ReverseChronological).unwrap();
        let second = load_trades(&repo, SortOrder::ReverseChronological).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn corrupt_collection_reads_as_empty() {
        let store = MemoryStore::new();
        store.insert(Collection::JournalEntries.key(), "{not json");
        store.insert(
            Collection::LegacyTrades.key(),
            &json!([legacy_record("9", "2024-01-01", "Loss", -20.0)]).to_string(),
        );
        let repo = RecordRepository::new(&store);
        let trades = load_trades(&repo, SortOrder::Chronological).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].id, "9");
    }

    #[test]
    fn empty_store_loads_no_trades() {
        let store = MemoryStore::new();
        let repo = RecordRepository::new(&store);
        assert!(load_trades(&repo, SortOrder::Chronological).unwrap().is_empty());
    }
}

mod dashboard {
    use super::*;

    #[test]
    fn win_rate_of_two_wins_in_three() {
        let store = seeded_store(
            vec![
                journal_record("1", "2024-03-01", "Win", "100"),
                journal_record("2", "2024-03-02", "Loss", "-50"),
                journal_record("3", "2024-03-03", "Win", "150"),
            ],
            vec![],
        );
        let repo = RecordRepository::new(&store);
        let trades = load_trades(&repo, SortOrder::Chronological).unwrap();
        let m = JournalMetrics::compute(&trades);

        assert_eq!(m.total, 3);
        assert_eq!(format!("{:.1}", m.win_rate), "66.7");
        assert_relative_eq!(m.total_pnl, 200.0);
        assert_relative_eq!(m.avg_rr, 5.0);
        assert_relative_eq!(m.rule_adherence, 100.0);
    }

    #[test]
    fn equity_curve_follows_chronological_order() {
        let store = seeded_store(
            vec![
                journal_record("2", "2024-03-02", "Loss", "-50"),
                journal_record("1", "2024-03-01", "Win", "100"),
            ],
            vec![legacy_record("3", "2024-03-03", "Win", 25.0)],
        );
        let repo = RecordRepository::new(&store);
        let trades = load_trades(&repo, SortOrder::Chronological).unwrap();
        let equity: Vec<f64> = equity_curve(&trades).iter().map(|p| p.equity).collect();
        assert_eq!(equity, vec![100.0, 50.0, 75.0]);
    }

    #[test]
    fn pair_grouping_mixes_journal_and_legacy_symbols() {
        let store = seeded_store(
            vec![journal_record("1", "2024-03-01", "Win", "100")],
            vec![
                legacy_record("2", "2024-03-02", "Win", 300.0),
                legacy_record("3", "2024-03-03", "Loss", -100.0),
            ],
        );
        let repo = RecordRepository::new(&store);
        let trades = load_trades(&repo, SortOrder::Chronological).unwrap();
        let groups = group_performance(&trades, GroupKey::Pair);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "GU");
        assert_eq!(groups[0].trade_count, 2);
        assert_relative_eq!(groups[0].pnl, 200.0);
        assert_eq!(groups[1].name, "EU");
    }

    #[test]
    fn trade_log_filter_and_summary() {
        let store = seeded_store(
            vec![
                journal_record("1", "2024-03-01", "Win", "100"),
                journal_record("2", "2024-03-02", "Win", "40"),
                journal_record("3", "2024-03-03", "Loss", "-30"),
            ],
            vec![legacy_record("4", "2024-03-04", "Win", 10.0)],
        );
        let repo = RecordRepository::new(&store);
        let trades = load_trades(&repo, SortOrder::ReverseChronological).unwrap();

        let filter = TradeFilter {
            pair: Some("EU".into()),
            ..TradeFilter::default()
        };
        let shown = filter.apply(&trades);
        assert_eq!(shown.len(), 3);

        let stats = LogStats::compute(shown.iter().copied());
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.best_win_streak, 2);
        assert_relative_eq!(stats.total_pnl, 110.0);
    }
}

mod checklist_to_journal {
    use super::*;

    fn answer_all(checklist: &mut Checklist, failing: &[&str]) {
        let ids: Vec<&'static str> = checklist
            .sections()
            .iter()
            .flat_map(|s| s.items.iter().map(|i| i.id))
            .collect();
        for id in ids {
            checklist.answer(id, !failing.contains(&id)).unwrap();
        }
    }

    fn draft() -> JournalDraft {
        JournalDraft {
            pair: "GJ".into(),
            trade_type: "15min CT".into(),
            date: "2024-05-10".into(),
            bias: "Bullish".into(),
            entry_price: "190.00".into(),
            stop_loss: "189.80".into(),
            take_profit: "191.00".into(),
            outcome: "Win".into(),
            profit_loss: "250".into(),
            emotion: "Confident".into(),
            followed_rules: TriState::Yes,
            ..JournalDraft::default()
        }
    }

    #[test]
    fn override_execution_marks_next_entry_as_rule_break() {
        let store = MemoryStore::new();
        let repo = RecordRepository::new(&store);
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 18, 0, 0).unwrap();

        let mut checklist = Checklist::sop();
        answer_all(&mut checklist, &["rv-1"]);
        let (log, pending) = checklist.execute(ExecutionMode::Override, now).unwrap();
        assert_eq!(log.checklist_result, Verdict::Invalid);
        repo.save_value(
            Collection::PendingChecklist,
            &serde_json::to_value(&pending).unwrap(),
        )
        .unwrap();

        let mut draft = draft();
        let pending = take_pending(&repo).unwrap().unwrap();
        draft.apply_pending(&pending);
        let trade = create_entry(&repo, &draft, now).unwrap();

        assert_eq!(trade.followed_rules, TriState::No);
        assert_eq!(trade.mistakes, "Rule violations: RR ≥ 5R");
        assert_relative_eq!(trade.rr_ratio, 5.0);
        assert_eq!(take_pending(&repo).unwrap(), None);

        let trades = load_trades(&repo, SortOrder::Chronological).unwrap();
        assert_eq!(trades.len(), 1);
        let m = JournalMetrics::compute(&trades);
        assert_eq!(m.rules_broken, 1);
        assert_eq!(top_mistake(&trades).unwrap().text, "rule violations: rr ≥ 5r");
    }

    #[test]
    fn valid_execution_leaves_rules_untouched() {
        let store = MemoryStore::new();
        let repo = RecordRepository::new(&store);
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 18, 0, 0).unwrap();

        let mut checklist = Checklist::sop();
        answer_all(&mut checklist, &[]);
        let (_, pending) = checklist.execute(ExecutionMode::Normal, now).unwrap();
        assert!(!pending.is_rule_break);

        let mut draft = draft();
        draft.apply_pending(&pending);
        let trade = create_entry(&repo, &draft, now).unwrap();
        assert_eq!(trade.followed_rules, TriState::Yes);
        assert_eq!(trade.mistakes, "");
    }

    #[test]
    fn new_entry_is_mirrored_into_legacy_collection() {
        let store = MemoryStore::new();
        let repo = RecordRepository::new(&store);
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 18, 0, 0).unwrap();
        create_entry(&repo, &draft(), now).unwrap();

        assert_eq!(repo.load(Collection::JournalEntries).unwrap().len(), 1);
        let legacy = repo.load(Collection::LegacyTrades).unwrap();
        assert_eq!(legacy.len(), 1);
        assert_eq!(legacy[0]["symbol"], "GJ");
        assert_eq!(legacy[0]["status"], "Win");
    }
}

mod sizing {
    use super::*;

    #[test]
    fn eurusd_reference_example() {
        let pair = find_pair("EUR/USD").unwrap();
        let input = SizingInput {
            account_balance: "10000",
            risk_percent: "1",
            entry_price: "1.0850",
            stop_loss: "1.0800",
        };
        let result = compute_position_size(&input, pair).unwrap().unwrap();
        assert_relative_eq!(result.risk_amount, 100.0);
        assert_relative_eq!(result.pip_count, 50.0);
        assert_relative_eq!(result.lot_size, 0.2);
        assert_eq!(result.direction, Direction::Long);
        assert!(!result.small_pip_warning);
    }
}
