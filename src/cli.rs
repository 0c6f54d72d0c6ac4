//! CLI definition and dispatch.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, info, warn};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_export;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::file_store::FileStore;
use crate::adapters::memory_store::MemoryStore;
use crate::domain::calendar::{CalendarFeed, load_calendar};
use crate::domain::checklist::{Checklist, ChecklistLog, ExecutionMode, Verdict};
use crate::domain::error::TradeflowError;
use crate::domain::journal::{JournalDraft, create_entry, take_pending};
use crate::domain::metrics::{
    GroupKey, JournalMetrics, LogStats, emotion_distribution, equity_curve, group_performance,
    top_mistake,
};
use crate::domain::pair::{ForexPair, all_pairs, resolve_pair};
use crate::domain::repository::{
    Collection, RecordRepository, SortOrder, TradeFilter, load_trades,
};
use crate::domain::settings::{Settings, StoreBackend};
use crate::domain::sizing::{
    PositionSizeResult, SizingInput, compute_position_size, is_high_risk, parse_decimal,
};
use crate::domain::trade::{Outcome, Trade, TriState};
use crate::ports::blob_store::BlobStore;
use crate::ports::calendar_source::CalendarSource;

#[derive(Parser, Debug)]
#[command(name = "tradeflow", about = "Trading journal analytics and risk calculator")]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute a position size from balance, risk and price levels
    Size(SizeArgs),
    /// List supported pairs
    Pairs,
    /// Work through the pre-trade SOP checklist
    Checklist {
        #[command(subcommand)]
        action: ChecklistAction,
    },
    /// Log a journal entry
    Log(LogArgs),
    /// Show the trade log
    Trades(TradesArgs),
    /// Show dashboard statistics
    Stats,
    /// Show today's economic calendar
    Calendar,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SizeArgs {
    #[arg(long)]
    pub entry: String,
    #[arg(long)]
    pub stop: String,
    #[arg(long)]
    pub balance: Option<String>,
    /// Risk per trade in percent
    #[arg(long)]
    pub risk: Option<String>,
    /// Symbol (EURUSD, GBP/JPY) or journal key (EU, GJ)
    #[arg(long)]
    pub pair: Option<String>,
    /// Remember the balance for later runs
    #[arg(long)]
    pub remember: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ChecklistAction {
    /// Print every item and the current verdict
    Show,
    /// Answer one item
    Answer { item: String, answer: Answer },
    /// Log the checklist and hand its result to the next journal entry
    Execute {
        /// Log even though some items were answered no
        #[arg(long = "override")]
        log_anyway: bool,
    },
    /// Clear every answer
    Reset,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeArg {
    Win,
    Loss,
    Be,
}

impl From<OutcomeArg> for Outcome {
    fn from(arg: OutcomeArg) -> Self {
        match arg {
            OutcomeArg::Win => Outcome::Win,
            OutcomeArg::Loss => Outcome::Loss,
            OutcomeArg::Be => Outcome::BreakEven,
        }
    }
}

/// Flags given on the command line must be an actual answer.
fn parse_answer(text: &str) -> Result<TriState, String> {
    match TriState::parse(text) {
        Some(state) if state.is_answered() => Ok(state),
        _ => Err(format!("expected yes or no, got '{}'", text)),
    }
}

#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    #[arg(long)]
    pub pair: String,
    #[arg(long)]
    pub trade_type: String,
    /// Trade date, defaults to today
    #[arg(long)]
    pub date: Option<String>,
    #[arg(long)]
    pub bias: String,
    #[arg(long)]
    pub entry: String,
    #[arg(long)]
    pub stop: String,
    #[arg(long)]
    pub tp: String,
    #[arg(long, value_enum)]
    pub outcome: OutcomeArg,
    #[arg(long)]
    pub emotion: String,
    #[arg(long)]
    pub time: Option<String>,
    #[arg(long)]
    pub range_type: Option<String>,
    #[arg(long)]
    pub poi_type: Option<String>,
    #[arg(long)]
    pub entry_type: Option<String>,
    #[arg(long)]
    pub lot_size: Option<String>,
    #[arg(long, value_parser = parse_answer)]
    pub poi_tapped: Option<TriState>,
    #[arg(long, value_parser = parse_answer)]
    pub choch_confirmed: Option<TriState>,
    #[arg(long, value_parser = parse_answer)]
    pub followed_rules: Option<TriState>,
    #[arg(long, allow_hyphen_values = true)]
    pub pnl: Option<String>,
    #[arg(long)]
    pub mistakes: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct TradesArgs {
    #[arg(long)]
    pub pair: Option<String>,
    #[arg(long)]
    pub trade_type: Option<String>,
    #[arg(long, value_enum)]
    pub outcome: Option<OutcomeArg>,
    /// Write the filtered log to a CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

pub fn run(cli: Cli) -> ExitCode {
    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn dispatch(cli: Cli) -> Result<(), TradeflowError> {
    if let Command::Pairs = cli.command {
        print_pairs();
        return Ok(());
    }

    let settings = load_settings(cli.config.as_ref())?;

    if let Command::Calendar = cli.command {
        return run_calendar(&settings);
    }

    let store = open_store(&settings)?;
    let repo = RecordRepository::new(store.as_ref());

    match cli.command {
        Command::Size(args) => run_size(&repo, &settings, &args),
        Command::Checklist { action } => run_checklist(&repo, action, Utc::now()),
        Command::Log(args) => run_log(&repo, &args, Utc::now()),
        Command::Trades(args) => run_trades(&repo, &args),
        Command::Stats => run_stats(&repo),
        Command::Pairs | Command::Calendar => Ok(()),
    }
}

/// Resolve settings from an optional INI file.
pub fn load_settings(path: Option<&PathBuf>) -> Result<Settings, TradeflowError> {
    let adapter = match path {
        Some(p) => {
            eprintln!("Loading config from {}", p.display());
            FileConfigAdapter::from_file(p)?
        }
        None => FileConfigAdapter::empty(),
    };
    Settings::from_config(&adapter)
}

pub fn open_store(settings: &Settings) -> Result<Box<dyn BlobStore>, TradeflowError> {
    debug!(
        "opening {:?} store at {}",
        settings.backend,
        settings.store_path.display()
    );
    match settings.backend {
        StoreBackend::File => Ok(Box::new(FileStore::open(&settings.store_path)?)),
        StoreBackend::Memory => Ok(Box::new(MemoryStore::new())),
        #[cfg(feature = "sqlite")]
        StoreBackend::Sqlite => {
            use crate::adapters::sqlite_store::SqliteStore;
            Ok(Box::new(SqliteStore::open(&settings.store_path)?))
        }
        #[cfg(not(feature = "sqlite"))]
        StoreBackend::Sqlite => Err(TradeflowError::ConfigInvalid {
            section: "store".into(),
            key: "backend".into(),
            reason: "sqlite feature is required for the sqlite backend".into(),
        }),
    }
}

fn print_pairs() {
    for pair in all_pairs() {
        println!(
            "{}\t{}\t{}\tpip {}\t${}/lot",
            pair.symbol,
            pair.display_label,
            pair.journal_key,
            pair.pip_step,
            pair.pip_value_per_standard_lot
        );
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizingReport {
    pub pair: &'static ForexPair,
    pub result: PositionSizeResult,
    /// Risk percent above the configured threshold.
    pub high_risk: bool,
}

/// Balance saved by an earlier `--remember` run.
pub fn remembered_balance(repo: &RecordRepository<'_>) -> Result<Option<String>, TradeflowError> {
    Ok(match repo.load_value(Collection::AccountBalance)? {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Size a position. Returns `Ok(None)` for incomplete (non-numeric) input.
pub fn compute_size(
    repo: &RecordRepository<'_>,
    settings: &Settings,
    args: &SizeArgs,
) -> Result<Option<SizingReport>, TradeflowError> {
    let balance = match &args.balance {
        Some(b) => b.clone(),
        None => match remembered_balance(repo)? {
            Some(b) => b,
            None => settings
                .account_balance
                .map(|b| b.to_string())
                .ok_or_else(|| TradeflowError::MissingField {
                    field: "balance".into(),
                })?,
        },
    };
    let risk = args
        .risk
        .clone()
        .unwrap_or_else(|| settings.default_risk_pct.to_string());
    let pair = match &args.pair {
        Some(name) => resolve_pair(name).ok_or_else(|| TradeflowError::UnknownPair(name.clone()))?,
        None => settings.default_pair,
    };

    let input = SizingInput {
        account_balance: &balance,
        risk_percent: &risk,
        entry_price: &args.entry,
        stop_loss: &args.stop,
    };
    let Some(result) = compute_position_size(&input, pair)? else {
        return Ok(None);
    };

    if args.remember {
        repo.save_value(
            Collection::AccountBalance,
            &Value::String(balance.trim().to_string()),
        )?;
        info!("remembered account balance {}", balance.trim());
    }

    let high_risk =
        parse_decimal(&risk).is_some_and(|r| is_high_risk(r, settings.high_risk_pct));
    Ok(Some(SizingReport {
        pair,
        result,
        high_risk,
    }))
}

fn run_size(
    repo: &RecordRepository<'_>,
    settings: &Settings,
    args: &SizeArgs,
) -> Result<(), TradeflowError> {
    let Some(report) = compute_size(repo, settings, args)? else {
        eprintln!("Incomplete input: balance, risk, entry and stop must all be numbers");
        return Ok(());
    };
    let r = &report.result;

    eprintln!("Pair:            {}", report.pair.display_label);
    eprintln!("Direction:       {}", r.direction);
    eprintln!("Risk amount:     ${:.2}", r.risk_amount);
    eprintln!("Stop distance:   {:.1} pips", r.pip_count);
    if report.high_risk {
        eprintln!(
            "warning: risk exceeds {}% of the account",
            settings.high_risk_pct
        );
    }
    if r.small_pip_warning {
        eprintln!("warning: stop is less than one pip away, lot size is unrealistic");
    }
    println!("{:.2}", r.lot_size);
    Ok(())
}

pub fn load_checklist(repo: &RecordRepository<'_>) -> Result<Checklist, TradeflowError> {
    Ok(repo
        .load_value(Collection::ChecklistState)?
        .map(|saved| Checklist::restore(&saved))
        .unwrap_or_default())
}

pub fn save_checklist(
    repo: &RecordRepository<'_>,
    checklist: &Checklist,
) -> Result<(), TradeflowError> {
    let value = serde_json::to_value(checklist).map_err(|e| TradeflowError::Store {
        reason: format!("failed to serialize checklist: {}", e),
    })?;
    repo.save_value(Collection::ChecklistState, &value)
}

/// Execute the saved checklist: log it, leave the pending hand-off, reset.
pub fn execute_checklist(
    repo: &RecordRepository<'_>,
    mode: ExecutionMode,
    now: DateTime<Utc>,
) -> Result<ChecklistLog, TradeflowError> {
    let mut checklist = load_checklist(repo)?;
    let (log, pending) = checklist.execute(mode, now)?;

    let to_value = |v: serde_json::Result<Value>| {
        v.map_err(|e| TradeflowError::Store {
            reason: format!("failed to serialize checklist log: {}", e),
        })
    };
    repo.prepend(Collection::ChecklistLogs, to_value(serde_json::to_value(&log))?)?;
    repo.save_value(
        Collection::PendingChecklist,
        &to_value(serde_json::to_value(&pending))?,
    )?;
    save_checklist(repo, &checklist)?;
    Ok(log)
}

fn print_checklist(checklist: &Checklist) {
    for section in checklist.sections() {
        let stats = section.stats();
        println!("{} [{}/{}]", section.title, stats.yes, stats.total);
        for item in &section.items {
            let mark = match item.state {
                TriState::Yes => "YES",
                TriState::No => "NO ",
                TriState::Unanswered => " - ",
            };
            println!("  [{}] {:<5} {}", mark, item.id, item.label);
        }
    }
    eprintln!(
        "\nProgress: {:.0}% ({}/{} answered), verdict: {}",
        checklist.progress(),
        checklist.answered(),
        checklist.total(),
        checklist.verdict().label()
    );
}

fn run_checklist(
    repo: &RecordRepository<'_>,
    action: ChecklistAction,
    now: DateTime<Utc>,
) -> Result<(), TradeflowError> {
    match action {
        ChecklistAction::Show => print_checklist(&load_checklist(repo)?),
        ChecklistAction::Answer { item, answer } => {
            let mut checklist = load_checklist(repo)?;
            checklist.answer(&item, answer == Answer::Yes)?;
            save_checklist(repo, &checklist)?;
            eprintln!(
                "{}/{} answered, verdict: {}",
                checklist.answered(),
                checklist.total(),
                checklist.verdict().label()
            );
        }
        ChecklistAction::Execute { log_anyway } => {
            let mode = if log_anyway {
                ExecutionMode::Override
            } else {
                ExecutionMode::Normal
            };
            let log = execute_checklist(repo, mode, now)?;
            match log.checklist_result {
                Verdict::Valid => eprintln!("Checklist VALID, logged as {}", log.id),
                Verdict::Invalid => {
                    eprintln!("Checklist INVALID, logged as rule break {}", log.id);
                    for failed in &log.failed_items {
                        eprintln!("  failed: {}", failed);
                    }
                }
            }
            eprintln!("Run `tradeflow log ...` to record the trade.");
        }
        ChecklistAction::Reset => {
            repo.clear(Collection::ChecklistState)?;
            eprintln!("Checklist reset");
        }
    }
    Ok(())
}

/// Build a draft from CLI values. Pair symbols are stored as journal keys.
pub fn build_draft(args: &LogArgs, today: &str) -> Result<JournalDraft, TradeflowError> {
    let pair =
        resolve_pair(&args.pair).ok_or_else(|| TradeflowError::UnknownPair(args.pair.clone()))?;
    let text = |v: &Option<String>| v.clone().unwrap_or_default();

    Ok(JournalDraft {
        pair: pair.journal_key.to_string(),
        trade_type: args.trade_type.clone(),
        date: args.date.clone().unwrap_or_else(|| today.to_string()),
        time: text(&args.time),
        bias: args.bias.clone(),
        range_type: text(&args.range_type),
        poi_type: text(&args.poi_type),
        entry_type: text(&args.entry_type),
        entry_price: args.entry.clone(),
        stop_loss: args.stop.clone(),
        take_profit: args.tp.clone(),
        lot_size: text(&args.lot_size),
        poi_tapped: args.poi_tapped.unwrap_or_default(),
        choch_confirmed: args.choch_confirmed.unwrap_or_default(),
        outcome: Outcome::from(args.outcome).label().to_string(),
        profit_loss: text(&args.pnl),
        emotion: args.emotion.clone(),
        followed_rules: TriState::Unanswered,
        mistakes: String::new(),
    })
}

/// Create a journal entry, picking up any pending checklist result first.
/// Explicit `--followed-rules` and `--mistakes` values win over the hand-off.
pub fn log_trade(
    repo: &RecordRepository<'_>,
    args: &LogArgs,
    now: DateTime<Utc>,
) -> Result<Trade, TradeflowError> {
    let mut draft = build_draft(args, &now.format("%Y-%m-%d").to_string())?;
    if let Some(pending) = take_pending(repo)? {
        draft.apply_pending(&pending);
    }
    if let Some(followed) = args.followed_rules {
        draft.followed_rules = followed;
    }
    if let Some(mistakes) = &args.mistakes {
        draft.mistakes = mistakes.clone();
    }
    create_entry(repo, &draft, now)
}

fn run_log(
    repo: &RecordRepository<'_>,
    args: &LogArgs,
    now: DateTime<Utc>,
) -> Result<(), TradeflowError> {
    let trade = log_trade(repo, args, now)?;
    eprintln!(
        "Logged {} {} {} on {} (RR {:.2})",
        trade.pair, trade.trade_type, trade.outcome, trade.date, trade.rr_ratio
    );
    if trade.followed_rules == TriState::No {
        eprintln!("Marked as rule break: {}", trade.mistakes);
    }
    println!("{}", trade.id);
    Ok(())
}

pub fn filter_from_args(args: &TradesArgs) -> TradeFilter {
    TradeFilter {
        pair: args.pair.clone(),
        trade_type: args.trade_type.clone(),
        outcome: args.outcome.map(Outcome::from),
    }
}

fn flag_label(state: TriState) -> &'static str {
    match state {
        TriState::Yes => "yes",
        TriState::No => "no",
        TriState::Unanswered => "-",
    }
}

fn run_trades(repo: &RecordRepository<'_>, args: &TradesArgs) -> Result<(), TradeflowError> {
    let trades = load_trades(repo, SortOrder::ReverseChronological)?;
    let filtered = filter_from_args(args).apply(&trades);

    for t in &filtered {
        println!(
            "{}\t{}\t{}\t{}\t{}\tRR {:.2}\tP&L {}\trules {}",
            t.date,
            t.pair,
            t.trade_type,
            t.bias,
            t.outcome,
            t.rr_ratio,
            t.profit_loss,
            flag_label(t.followed_rules)
        );
    }

    let stats = LogStats::compute(filtered.iter().copied());
    eprintln!(
        "\n{} trades, {} wins, {} losses, win rate {:.1}%, P&L {:.2}, avg RR {:.1}, {} rule breaks, best streak {}",
        stats.total,
        stats.wins,
        stats.losses,
        stats.win_rate,
        stats.total_pnl,
        stats.avg_rr,
        stats.rule_breaks,
        stats.best_win_streak
    );

    if let Some(path) = &args.export {
        let count = csv_export::export_trades(path, filtered.iter().copied())?;
        eprintln!("Exported {} trades to {}", count, path.display());
    }
    Ok(())
}

fn run_stats(repo: &RecordRepository<'_>) -> Result<(), TradeflowError> {
    let trades = load_trades(repo, SortOrder::Chronological)?;
    if trades.is_empty() {
        eprintln!("No trades logged yet");
        return Ok(());
    }

    let m = JournalMetrics::compute(&trades);
    println!("Trades:            {} ({} W / {} L / {} BE)", m.total, m.wins, m.losses, m.breakevens);
    println!("Win rate:          {:.1}%", m.win_rate);
    println!("Average RR:        {:.2}", m.avg_rr);
    println!("Total P&L:         {:.2}", m.total_pnl);
    println!(
        "Rule adherence:    {:.1}% ({} followed / {} broken, {:.1}% breaks)",
        m.rule_adherence, m.rules_followed, m.rules_broken, m.rule_break_pct
    );
    println!(
        "Win rate by rules: followed {:.1}%, broken {:.1}%",
        m.followed_win_rate, m.broken_win_rate
    );
    println!(
        "Confirmation:      full {:.1}% of {}, partial {:.1}% of {}",
        m.full_confirmation.win_rate,
        m.full_confirmation.trades,
        m.partial_confirmation.win_rate,
        m.partial_confirmation.trades
    );

    println!("\nEquity curve:");
    for point in equity_curve(&trades) {
        println!("  {}\t{:.2}", point.date, point.equity);
    }

    for (title, key) in [("pair", GroupKey::Pair), ("trade type", GroupKey::TradeType)] {
        println!("\nBy {}:", title);
        for g in group_performance(&trades, key) {
            println!(
                "  {:<12} {:>3} trades  {:>5.1}% win  P&L {:.1}",
                g.name, g.trade_count, g.win_rate, g.pnl
            );
        }
    }

    let emotions = emotion_distribution(&trades);
    if !emotions.is_empty() {
        println!("\nEmotions:");
        for e in emotions {
            println!("  {:<12} {}", e.label, e.count);
        }
    }

    if let Some(mistake) = top_mistake(&trades) {
        println!("\nMost common mistake: \"{}\" ({}x)", mistake.text, mistake.count);
    }
    Ok(())
}

/// Live source for the configured key, if the feature is built in.
/// Live source for the configured key, if the feature is built in. Any
/// failure to set it up falls back to sample data.
pub fn calendar_source(settings: &Settings) -> Option<Box<dyn CalendarSource>> {
    let Some(key) = settings.live_calendar_key() else {
        debug!("no calendar API key configured, using sample data");
        return None;
    };

    #[cfg(feature = "live-calendar")]
    {
        use crate::adapters::fmp_calendar::FmpCalendarSource;
        match FmpCalendarSource::new(&settings.calendar_base_url, key) {
            Ok(source) => Some(Box::new(source)),
            Err(e) => {
                warn!("calendar source unavailable, using sample data: {}", e);
                None
            }
        }
    }

    #[cfg(not(feature = "live-calendar"))]
    {
        let _ = key;
        warn!("live-calendar feature is not built in, using sample data");
        None
    }
}

fn print_calendar(feed: &CalendarFeed) {
    for event in &feed.events {
        let when = event
            .local_time()
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| "--:--".to_string());
        let signal = match event.surprise() {
            Some(s) => format!("{:?}", s),
            None => String::new(),
        };
        println!(
            "{}\t{}\t{:<6}\t{}\tactual {}\tforecast {}\tprevious {}\t{}",
            when,
            event.currency,
            event.impact,
            event.event,
            event.actual.as_deref().unwrap_or("-"),
            event.forecast.as_deref().unwrap_or("-"),
            event.previous.as_deref().unwrap_or("-"),
            signal
        );
    }
}

fn run_calendar(settings: &Settings) -> Result<(), TradeflowError> {
    let source = calendar_source(settings);
    let feed = load_calendar(source.as_deref(), Utc::now().date_naive());
    print_calendar(&feed);
    eprintln!("\n{} events ({} data)", feed.events.len(), feed.source);
    Ok(())
}
