use chrono::Local;
use serde::{Deserialize, Serialize};

pub const TP_SLOTS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Direction::Buy => "🟢 BUY",
            Direction::Sell => "🔴 SELL",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "BUY" => Some(Direction::Buy),
            "SELL" => Some(Direction::Sell),
            _ => None,
        }
    }
}

/// One parsed trading signal, as produced by the extractor. Immutable after
/// creation; identity for dedup purposes is (pair, entry) only.
#[derive(Debug, Clone)]
pub struct SignalRecord {
    pub channel: String,
    pub pair: Option<String>,
    pub direction: Option<Direction>,
    pub entry: Option<String>,
    /// Sparse TP slots 1..=6, indexed as `take_profits[slot - 1]`.
    pub take_profits: [Option<String>; TP_SLOTS],
    pub sl: Option<String>,
    pub leverage: Option<String>,
    /// Local wall-clock at parse, minute precision ("HH:MM").
    pub timestamp: String,
    /// Local calendar date at parse ("25 AUGUST 2026").
    pub date: String,
    pub raw_text: String,
}

impl SignalRecord {
    pub fn empty(channel: &str, raw_text: &str) -> Self {
        let now = Local::now();
        Self {
            channel: channel.to_string(),
            pair: None,
            direction: None,
            entry: None,
            take_profits: Default::default(),
            sl: None,
            leverage: None,
            timestamp: now.format("%H:%M").to_string(),
            date: now.format("%d %B %Y").to_string().to_uppercase(),
            raw_text: raw_text.to_string(),
        }
    }

    /// TP slot accessor, 1-based like the analyst convention.
    pub fn tp(&self, slot: usize) -> Option<&str> {
        self.take_profits
            .get(slot.checked_sub(1)?)
            .and_then(|v| v.as_deref())
    }

    pub fn populated_tps(&self) -> Vec<&str> {
        self.take_profits
            .iter()
            .filter_map(|tp| tp.as_deref())
            .collect()
    }

    /// A record is only worth persisting when it names a pair and carries
    /// either an entry price or a first take-profit.
    pub fn is_persistable(&self) -> bool {
        self.pair.is_some() && (self.entry.is_some() || self.tp(1).is_some())
    }
}

/// A persisted signal as read back from the store.
#[derive(Debug, Clone, Serialize)]
pub struct SignalRow {
    pub id: i64,
    pub channel: String,
    pub pair: Option<String>,
    pub direction: Option<Direction>,
    pub entry: Option<String>,
    pub take_profits: [Option<String>; TP_SLOTS],
    pub sl: Option<String>,
    pub leverage: Option<String>,
    pub timestamp: String,
    pub date: String,
    pub dedup_key: String,
    pub raw_text: String,
}

impl SignalRow {
    pub fn tp(&self, slot: usize) -> Option<&str> {
        self.take_profits
            .get(slot.checked_sub(1)?)
            .and_then(|v| v.as_deref())
    }
}
