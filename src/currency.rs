// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Currencies the app knows how to name and display. Rates fetched for codes
//! outside this table are dropped.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyInfo {
    pub name: &'static str,
    pub symbol: &'static str,
}

static CURRENCIES: Lazy<BTreeMap<&'static str, CurrencyInfo>> = Lazy::new(|| {
    [
        ("AED", "UAE Dirham", "د.إ"),
        ("ARS", "Argentine Peso", "$"),
        ("AUD", "Australian Dollar", "A$"),
        ("BRL", "Brazilian Real", "R$"),
        ("CAD", "Canadian Dollar", "C$"),
        ("CHF", "Swiss Franc", "CHF"),
        ("CLP", "Chilean Peso", "$"),
        ("CNY", "Chinese Yuan", "¥"),
        ("COP", "Colombian Peso", "$"),
        ("CZK", "Czech Koruna", "Kč"),
        ("DKK", "Danish Krone", "kr"),
        ("EGP", "Egyptian Pound", "E£"),
        ("EUR", "Euro", "€"),
        ("GBP", "British Pound", "£"),
        ("HKD", "Hong Kong Dollar", "HK$"),
        ("HUF", "Hungarian Forint", "Ft"),
        ("IDR", "Indonesian Rupiah", "Rp"),
        ("ILS", "Israeli Shekel", "₪"),
        ("INR", "Indian Rupee", "₹"),
        ("JPY", "Japanese Yen", "¥"),
        ("KES", "Kenyan Shilling", "KSh"),
        ("KRW", "South Korean Won", "₩"),
        ("MXN", "Mexican Peso", "$"),
        ("MYR", "Malaysian Ringgit", "RM"),
        ("NGN", "Nigerian Naira", "₦"),
        ("NOK", "Norwegian Krone", "kr"),
        ("NZD", "New Zealand Dollar", "NZ$"),
        ("PHP", "Philippine Peso", "₱"),
        ("PLN", "Polish Zloty", "zł"),
        ("RUB", "Russian Ruble", "₽"),
        ("SAR", "Saudi Riyal", "﷼"),
        ("SEK", "Swedish Krona", "kr"),
        ("SGD", "Singapore Dollar", "S$"),
        ("THB", "Thai Baht", "฿"),
        ("TRY", "Turkish Lira", "₺"),
        ("TWD", "New Taiwan Dollar", "NT$"),
        ("UAH", "Ukrainian Hryvnia", "₴"),
        ("USD", "US Dollar", "$"),
        ("VND", "Vietnamese Dong", "₫"),
        ("ZAR", "South African Rand", "R"),
    ]
    .into_iter()
    .map(|(code, name, symbol)| (code, CurrencyInfo { name, symbol }))
    .collect()
});

pub fn info(code: &str) -> Option<&'static CurrencyInfo> {
    CURRENCIES.get(code)
}

pub fn is_known(code: &str) -> bool {
    CURRENCIES.contains_key(code)
}

/// Symbol for display; unknown codes render as the code itself.
pub fn symbol(code: &str) -> &str {
    match info(code) {
        Some(i) => i.symbol,
        None => code,
    }
}

pub fn display_name(code: &str) -> String {
    match info(code) {
        Some(i) => format!("{} - {}", code, i.name),
        None => code.to_string(),
    }
}

pub fn known_codes() -> Vec<&'static str> {
    CURRENCIES.keys().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_and_fallbacks() {
        assert_eq!(symbol("EUR"), "€");
        assert_eq!(symbol("ZZZ"), "ZZZ");
        assert_eq!(display_name("JPY"), "JPY - Japanese Yen");
        assert_eq!(display_name("ZZZ"), "ZZZ");
        assert!(is_known("USD"));
        assert!(!is_known("usd"));
    }

    #[test]
    fn codes_are_sorted() {
        let codes = known_codes();
        let mut sorted = codes.clone();
        sorted.sort();
        assert_eq!(codes, sorted);
    }
}
