use rust_decimal::{Decimal, RoundingStrategy};

fn currency_symbol(currency: &str) -> Option<&'static str> {
    match currency.to_ascii_uppercase().as_str() {
        "USD" | "CAD" | "AUD" | "NZD" | "SGD" | "HKD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" | "CNY" => Some("¥"),
        _ => None,
    }
}

fn with_currency(amount: Decimal, currency: &str) -> String {
    match currency_symbol(currency) {
        Some(symbol) => format!("{symbol}{amount}"),
        None => format!("{amount} {currency}"),
    }
}

/// Format a total for display (always 2 decimal places)
pub fn format_price(price: Decimal, currency: &str) -> String {
    let mut amount = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    amount.rescale(2);
    with_currency(amount, currency)
}

/// Format a unit price, keeping sub-cent precision
pub fn format_unit_price(price: Decimal, currency: &str) -> String {
    let mut amount = price.normalize();
    if amount.scale() < 2 {
        amount.rescale(2);
    }
    with_currency(amount, currency)
}

/// Format a number with comma separators
pub fn format_number_with_commas(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(dec!(16), "USD"), "$16.00");
        assert_eq!(format_price(dec!(19.80000), "USD"), "$19.80");
        assert_eq!(format_price(dec!(0.005), "EUR"), "€0.01");
        assert_eq!(format_price(dec!(4.2), "CHF"), "4.20 CHF");
    }

    #[test]
    fn test_format_unit_price() {
        assert_eq!(format_unit_price(dec!(0.1), "USD"), "$0.10");
        assert_eq!(format_unit_price(dec!(0.00495), "USD"), "$0.00495");
        assert_eq!(format_unit_price(dec!(1.50000), "GBP"), "£1.50");
    }

    #[test]
    fn test_format_number_with_commas() {
        assert_eq!(format_number_with_commas(0), "0");
        assert_eq!(format_number_with_commas(999), "999");
        assert_eq!(format_number_with_commas(5_596_613), "5,596,613");
    }
}
