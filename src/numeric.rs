use serde_json::Value;

/// Unit suffix to multiplier, converting a reading into the base unit.
pub type Multipliers<'a> = [(&'a str, f64)];

/// Energy readings, normalized to kWh.
pub const ENERGY: &Multipliers<'static> = &[("MWh", 1000.0), ("kWh", 1.0)];
/// Power readings, normalized to kW.
pub const POWER: &Multipliers<'static> = &[("kW", 1.0), ("MW", 1000.0)];
/// Installed capacity, normalized to kW(p).
pub const CAPACITY: &Multipliers<'static> = &[("kWp", 1.0), ("kW", 1.0), ("MWp", 1000.0)];

/* Checked in order, prefix match only */
const CURRENCY_PREFIXES: [&str; 4] = ["R$", "$", "€", "£"];

fn multiplier(multipliers: Option<&Multipliers>, unit: &str) -> Option<f64> {
    multipliers?
        .iter()
        .find(|(suffix, _)| *suffix == unit)
        .map(|(_, m)| *m)
}

fn parse_str(value: &str, multipliers: Option<&Multipliers>) -> Option<f64> {
    let mut cleaned = value;
    for prefix in CURRENCY_PREFIXES.iter() {
        if let Some(rest) = cleaned.strip_prefix(*prefix) {
            cleaned = rest;
        }
    }

    let mut parts = cleaned.split_whitespace();
    let number = parts.next()?.replace(',', ".").parse::<f64>().ok()?;

    match parts.next().and_then(|unit| multiplier(multipliers, unit)) {
        Some(m) => Some(number * m),
        None => Some(number),
    }
}

/// Extract a float from a raw API field.
///
/// Numbers are returned as they are. Strings such as `"11.72 MWh"` or
/// `"R$ 1234.5"` lose their currency prefix, and the unit (if any) is looked up
/// in `multipliers` to convert the number. Anything that cannot be read as a
/// number yields `None`.
pub fn parse_numeric(value: Option<&Value>, multipliers: Option<&Multipliers>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_str(s, multipliers),
        _ => None,
    }
}
