use crate::records::{EdgeBucket, Side};

pub const STRONG_EDGE: f64 = 5.0;
pub const GOOD_EDGE: f64 = 2.0;
/// Standard two-way prop pricing.
pub const DEFAULT_AMERICAN_ODDS: i32 = -110;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub value: f64,
    pub bucket: EdgeBucket,
    pub side: Option<Side>,
}

/// `projected - line`, bucketed on magnitude so under plays classify the same
/// way as over plays.
pub fn compute(projected: f64, line: f64) -> Edge {
    let value = projected - line;
    Edge {
        value,
        bucket: bucket(value),
        side: side(value),
    }
}

pub fn bucket(edge: f64) -> EdgeBucket {
    let magnitude = edge.abs();
    if magnitude > STRONG_EDGE {
        EdgeBucket::StrongValue
    } else if magnitude > GOOD_EDGE {
        EdgeBucket::GoodValue
    } else {
        EdgeBucket::Marginal
    }
}

pub fn side(edge: f64) -> Option<Side> {
    if edge > 0.0 {
        Some(Side::Over)
    } else if edge < 0.0 {
        Some(Side::Under)
    } else {
        None
    }
}

pub fn implied_probability(american_odds: i32) -> f64 {
    if american_odds > 0 {
        100.0 / (f64::from(american_odds) + 100.0)
    } else {
        let abs = f64::from(american_odds).abs();
        abs / (abs + 100.0)
    }
}

/// Expected profit per unit staked.
pub fn expected_value(win_probability: f64, american_odds: i32) -> f64 {
    let payout = if american_odds > 0 {
        f64::from(american_odds) / 100.0
    } else {
        100.0 / f64::from(american_odds).abs()
    };
    win_probability * payout - (1.0 - win_probability)
}
