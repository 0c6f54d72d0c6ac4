//! Forex pair reference table.

/// Static reference data for one tradable pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForexPair {
    pub symbol: &'static str,
    pub display_label: &'static str,
    /// Shorthand the journal form records in its `pair` field.
    pub journal_key: &'static str,
    /// Price movement that counts as one pip.
    pub pip_step: f64,
    /// Account-currency value of one pip on one standard lot.
    pub pip_value_per_standard_lot: f64,
    pub is_yen_quoted: bool,
}

const fn pair(
    symbol: &'static str,
    display_label: &'static str,
    journal_key: &'static str,
    pip_step: f64,
    pip_value_per_standard_lot: f64,
    is_yen_quoted: bool,
) -> ForexPair {
    ForexPair {
        symbol,
        display_label,
        journal_key,
        pip_step,
        pip_value_per_standard_lot,
        is_yen_quoted,
    }
}

pub const PAIR_TABLE: [ForexPair; 13] = [
    pair("EURUSD", "EUR/USD", "EU", 0.0001, 10.0, false),
    pair("GBPUSD", "GBP/USD", "GU", 0.0001, 10.0, false),
    pair("AUDUSD", "AUD/USD", "AU", 0.0001, 10.0, false),
    pair("NZDUSD", "NZD/USD", "NU", 0.0001, 10.0, false),
    pair("USDCAD", "USD/CAD", "UCAD", 0.0001, 10.0, false),
    pair("USDCHF", "USD/CHF", "UF", 0.0001, 10.0, false),
    pair("EURGBP", "EUR/GBP", "EG", 0.0001, 10.0, false),
    pair("EURAUD", "EUR/AUD", "EA", 0.0001, 10.0, false),
    pair("USDJPY", "USD/JPY", "UJ", 0.01, 6.67, true),
    pair("EURJPY", "EUR/JPY", "EJ", 0.01, 6.67, true),
    pair("GBPJPY", "GBP/JPY", "GJ", 0.01, 6.67, true),
    pair("AUDJPY", "AUD/JPY", "AJ", 0.01, 6.67, true),
    pair("XAUUSD", "XAU/USD", "XAUUSD", 0.01, 1.0, false),
];

pub fn all_pairs() -> &'static [ForexPair] {
    &PAIR_TABLE
}

pub fn default_pair() -> &'static ForexPair {
    &PAIR_TABLE[0]
}

/// Look up a pair by symbol, ignoring case and an optional `/` separator.
pub fn find_pair(symbol: &str) -> Option<&'static ForexPair> {
    let wanted: String = symbol
        .trim()
        .chars()
        .filter(|c| *c != '/')
        .collect::<String>()
        .to_uppercase();
    PAIR_TABLE.iter().find(|p| p.symbol == wanted)
}

pub fn find_by_journal_key(key: &str) -> Option<&'static ForexPair> {
    let key = key.trim();
    PAIR_TABLE.iter().find(|p| p.journal_key == key)
}

/// Resolve either a full symbol or a journal shorthand.
pub fn resolve_pair(name: &str) -> Option<&'static ForexPair> {
    find_pair(name).or_else(|| find_by_journal_key(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_entry_has_positive_pip_data() {
        for p in all_pairs() {
            assert!(p.pip_step > 0.0, "{} pip step", p.symbol);
            assert!(p.pip_value_per_standard_lot > 0.0, "{} pip value", p.symbol);
        }
    }

    #[test]
    fn symbols_and_journal_keys_are_unique() {
        let symbols: HashSet<_> = all_pairs().iter().map(|p| p.symbol).collect();
        let keys: HashSet<_> = all_pairs().iter().map(|p| p.journal_key).collect();
        assert_eq!(symbols.len(), PAIR_TABLE.len());
        assert_eq!(keys.len(), PAIR_TABLE.len());
    }

    #[test]
    fn yen_pairs_use_two_decimal_pips() {
        for p in all_pairs().iter().filter(|p| p.is_yen_quoted) {
            assert_eq!(p.pip_step, 0.01);
            assert!(p.symbol.ends_with("JPY"));
        }
    }

    #[test]
    fn find_pair_is_case_and_separator_insensitive() {
        assert_eq!(find_pair("eurusd").map(|p| p.symbol), Some("EURUSD"));
        assert_eq!(find_pair("GBP/JPY").map(|p| p.symbol), Some("GBPJPY"));
        assert!(find_pair("BTCUSD").is_none());
    }

    #[test]
    fn journal_key_lookup() {
        assert_eq!(find_by_journal_key("UJ").map(|p| p.symbol), Some("USDJPY"));
        assert_eq!(resolve_pair("UCAD").map(|p| p.symbol), Some("USDCAD"));
        assert_eq!(resolve_pair("xauusd").map(|p| p.symbol), Some("XAUUSD"));
    }

    #[test]
    fn default_is_eurusd() {
        assert_eq!(default_pair().symbol, "EURUSD");
    }
}
