use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Squad market values in EUR, keyed by team code. Loaded once and never
/// mutated; the strength model normalizes against the table maximum.
pub static CLUB_MARKET_VALUE_EUR: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    HashMap::from([
        ("lech_poznan", 42_500_000),
        ("rakow_czestochowa", 42_300_000),
        ("widzew_lodz", 40_900_000),
        ("legia_warszawa", 32_780_000),
        ("jagiellonia_bialystok", 32_350_000),
        ("cracovia", 23_150_000),
        ("lechia_gdansk", 21_150_000),
        ("gornik_zabrze", 20_080_000),
        ("pogon_szczecin", 19_330_000),
        ("zaglebie_lubin", 15_800_000),
        ("korona_kielce", 15_680_000),
        ("radomiak_radom", 14_130_000),
        ("motor_lublin", 12_980_000),
        ("wisla_plock", 11_400_000),
        ("gks_katowice", 9_330_000),
        ("piast_gliwice", 8_150_000),
        ("bruk_bet_termalica_nieciecza", 7_850_000),
        ("arka_gdynia", 7_600_000),
    ])
});

pub fn market_value(code: &str) -> Option<u32> {
    CLUB_MARKET_VALUE_EUR.get(code).copied()
}

pub fn max_market_value() -> u32 {
    CLUB_MARKET_VALUE_EUR.values().copied().max().unwrap_or(0)
}
