//! Static mock stock market. Prices are fixed demo data; the history
//! series is derived deterministically from the symbol so charts are
//! stable across calls without a market-data integration.

use bigdecimal::BigDecimal;
use chrono::{Duration, NaiveDate, Utc};

/// One listed symbol. Prices are kept in integer minor units so the
/// table can be a plain const.
#[derive(Debug, Clone, Copy)]
pub struct StockQuote {
    pub symbol: &'static str,
    pub company_name: &'static str,
    price_cents: i64,
    change_cents: i64,
}

pub const MARKET: [StockQuote; 10] = [
    StockQuote { symbol: "RELIANCE", company_name: "Reliance Industries", price_cents: 245_050, change_cents: 1_230 },
    StockQuote { symbol: "TCS", company_name: "Tata Consultancy Services", price_cents: 342_075, change_cents: -1_525 },
    StockQuote { symbol: "INFY", company_name: "Infosys Limited", price_cents: 152_030, change_cents: 850 },
    StockQuote { symbol: "HDFCBANK", company_name: "HDFC Bank", price_cents: 168_090, change_cents: -520 },
    StockQuote { symbol: "ICICIBANK", company_name: "ICICI Bank", price_cents: 112_045, change_cents: 1_875 },
    StockQuote { symbol: "BHARTIARTL", company_name: "Bharti Airtel", price_cents: 132_060, change_cents: 2_240 },
    StockQuote { symbol: "SBIN", company_name: "State Bank of India", price_cents: 78_025, change_cents: 515 },
    StockQuote { symbol: "WIPRO", company_name: "Wipro Limited", price_cents: 48_580, change_cents: -320 },
    StockQuote { symbol: "LT", company_name: "Larsen & Toubro", price_cents: 342_000, change_cents: 4_550 },
    StockQuote { symbol: "AXISBANK", company_name: "Axis Bank", price_cents: 125_075, change_cents: 1_030 },
];

fn from_cents(cents: i64) -> BigDecimal {
    (BigDecimal::from(cents) / BigDecimal::from(100)).with_scale(2)
}

impl StockQuote {
    pub fn price(&self) -> BigDecimal {
        from_cents(self.price_cents)
    }

    pub fn change(&self) -> BigDecimal {
        from_cents(self.change_cents)
    }

    pub fn change_percent(&self) -> BigDecimal {
        let previous = self.price_cents - self.change_cents;
        if previous == 0 {
            return BigDecimal::from(0).with_scale(2);
        }
        (BigDecimal::from(self.change_cents * 100) / BigDecimal::from(previous)).with_scale(2)
    }
}

pub fn find(symbol: &str) -> Option<&'static StockQuote> {
    MARKET.iter().find(|quote| quote.symbol == symbol)
}

#[derive(Debug, Clone)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: BigDecimal,
    pub volume: i64,
}

/// Mock daily closes for the last `days` days, newest last. Variation is
/// a hash of symbol and day index kept within ±5% of the quote price.
pub fn history(quote: &StockQuote, days: u32) -> Vec<PricePoint> {
    let today = Utc::now().date_naive();
    let mut points = Vec::with_capacity(days as usize);

    for offset in (0..days as i64).rev() {
        let noise = mix(quote.symbol, offset);
        let basis_points = (noise % 1001) as i64 - 500;
        let price_cents = quote.price_cents + quote.price_cents * basis_points / 10_000;
        points.push(PricePoint {
            date: today - Duration::days(offset),
            price: from_cents(price_cents),
            volume: 500_000 + (noise / 7 % 1_000_000) as i64,
        });
    }

    points
}

/// Small xorshift-style mixer; only needs to look noisy, not be random.
fn mix(symbol: &str, day: i64) -> u64 {
    let mut state = 0x9E37_79B9_7F4A_7C15u64 ^ day as u64;
    for byte in symbol.bytes() {
        state = state.wrapping_mul(0x100_0000_01B3).wrapping_add(byte as u64);
        state ^= state >> 27;
    }
    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;
    state
}
