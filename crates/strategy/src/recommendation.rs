use std::cmp::Ordering::{self, Equal, Greater, Less};

use common::models::{Action, RiskProfile};

/// Maps the last actual close `p0` and the two-step forecast `p1`, `p2` to an action.
///
/// | p1 vs p0 | p2 vs p1 | p2 vs p0 | High                  | Low  |
/// |----------|----------|----------|-----------------------|------|
/// | >        | >        |          | BUY                   | BUY  |
/// | >        | <        | <        | HOLD                  | HOLD |
/// | >        | <        | >=       | BUY_AND_SELL_NEXT_DAY | HOLD |
/// | <        | <        |          | SELL                  | SELL |
/// | <        | >        | >        | BUY                   | BUY  |
/// | <        | >        | <=       | BUY_AND_SELL_NEXT_DAY | HOLD |
///
/// Everything else, including every tie and any NaN, is HOLD.
pub fn recommend(p0: f64, p1: f64, p2: f64, risk_profile: RiskProfile) -> Action {
    let day_trade = match risk_profile {
        RiskProfile::High => Action::BuyAndSellNextDay,
        RiskProfile::Low => Action::Hold,
    };

    match (compare(p1, p0), compare(p2, p1), compare(p2, p0)) {
        (Some(Greater), Some(Greater), _) => Action::Buy,
        (Some(Greater), Some(Less), Some(Less)) => Action::Hold,
        (Some(Greater), Some(Less), Some(Equal | Greater)) => day_trade,
        (Some(Less), Some(Less), _) => Action::Sell,
        (Some(Less), Some(Greater), Some(Greater)) => Action::Buy,
        (Some(Less), Some(Greater), Some(Less | Equal)) => day_trade,
        _ => Action::Hold,
    }
}

fn compare(a: f64, b: f64) -> Option<Ordering> {
    a.partial_cmp(&b)
}
