use std::sync::LazyLock;

use common::models::{Direction, SignalRecord};
use regex::Regex;

/// Cheap pre-filter: a message with none of these never reaches the regex
/// tables. Not a correctness guarantee on its own.
const GATE_KEYWORDS: &[&str] = &[
    "BUY", "SELL", "LONG", "SHORT", "TP", "SL", "ENTRY", "XAUUSD", "GOLD", "BTC",
];

fn rules(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
}

// Ordered rule tables. Instrument, entry, stop-loss and leverage are scanned
// first-match-wins: the first rule in the table that matches anywhere in the
// text settles the field. Take-profits are the deliberate exception below.
static PAIR_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    rules(&[
        r"XAU[A-Z]+|BTC[A-Z]+|ETH[A-Z]+|EUR[A-Z]+|GBP[A-Z]+|USD[A-Z]+|AUD[A-Z]+|CAD[A-Z]+|JPY[A-Z]+",
        r"[A-Z]{3,}USD[A-Z]?",
        r"GOLD|US30|CYBER|WOO|STORJ|GAS|SUSHI|ID|ICP",
    ])
});

static ENTRY_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    rules(&[
        r"ENTRY[:\s@-]*([0-9.]+)",
        r"ENTER[:\s@]*([0-9.]+)",
        r"ENTRY PRICE[:\s]*([0-9.]+)",
        r"ENTRY ZONE[:\s]*([0-9.-]+)",
        r"BUY[:\s@]*([0-9.]+)",
        r"SELL[:\s@]*([0-9.]+)",
        r"@ ?([0-9.]+)",
    ])
});

static TP_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    rules(&[
        r"TP[:\s]*?([1-6])[:\s-]*([0-9.]+)",
        r"TAKE PROFIT[:\s]*?([1-6])[:\s-]*([0-9.]+)",
        r"TARGET[:\s]*?([1-6])[:\s-]*([0-9.]+)",
    ])
});

static SL_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    rules(&[
        r"SL[:\s@-]*([0-9.]+)",
        r"STOP LOSS[:\s@-]*([0-9.]+)",
        r"STOPLOSS[:\s@]*([0-9.]+)",
    ])
});

// The bare X<number> rule is maximally permissive and will happily pick up
// incidental "X" tokens in unrelated text. Known limitation, kept as-is.
static LEVERAGE_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    rules(&[
        r"LEVERAGE[:\s]*X?([0-9.]+)",
        r"CROSS[:\s]*X?([0-9.]+)",
        r"X([0-9.]+)",
    ])
});

fn passes_gate(upper: &str) -> bool {
    GATE_KEYWORDS.iter().any(|kw| upper.contains(kw))
}

/// First rule that matches anywhere wins; within that rule, the leftmost
/// occurrence wins. Rules are never merged or scored.
fn first_rule_match(table: &[Regex], text: &str) -> Option<String> {
    table
        .iter()
        .find_map(|rule| rule.find(text).map(|m| m.as_str().to_string()))
}

fn first_capture(table: &[Regex], text: &str) -> Option<String> {
    table
        .iter()
        .find_map(|rule| rule.captures(text).map(|caps| caps[1].to_string()))
}

/// Maps one raw broadcast message to a candidate signal, or `None` when the
/// keyword gate rejects it. Whether the candidate is worth persisting is the
/// caller's call (`SignalRecord::is_persistable`).
pub fn extract(text: &str, source_label: &str) -> Option<SignalRecord> {
    let upper = text.to_uppercase();
    if !passes_gate(&upper) {
        return None;
    }

    let mut record = SignalRecord::empty(source_label, &upper);

    record.pair = first_rule_match(&PAIR_RULES, &upper);

    // BUY is checked before SELL, so a message containing both resolves to
    // BUY. Documented tie-break.
    record.direction = if upper.contains("BUY") || upper.contains("LONG") {
        Some(Direction::Buy)
    } else if upper.contains("SELL") || upper.contains("SHORT") {
        Some(Direction::Sell)
    } else {
        None
    };

    record.entry = first_capture(&ENTRY_RULES, &upper);

    // Take-profits are NOT first-match-wins: every label variant is applied
    // over the whole text in table order, and a later variant overwrites
    // slots a previous one already filled. Intentional asymmetry.
    for rule in TP_RULES.iter() {
        for caps in rule.captures_iter(&upper) {
            if let Ok(slot) = caps[1].parse::<usize>() {
                if (1..=6).contains(&slot) {
                    record.take_profits[slot - 1] = Some(caps[2].to_string());
                }
            }
        }
    }

    record.sl = first_capture(&SL_RULES, &upper);
    record.leverage = first_capture(&LEVERAGE_RULES, &upper);

    Some(record)
}
