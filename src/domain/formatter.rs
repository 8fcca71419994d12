//! Pair Formatter
//!
//! Renders a [`PairRecord`] as a deterministic markdown document. The output
//! feeds the content hash, so identical input must always produce
//! byte-identical output: no timestamps, no locale, fixed field order.

use std::fmt::Write;

use super::pair::PairRecord;

/// Placeholder for missing text fields
pub const UNKNOWN: &str = "Unknown";
/// Placeholder for missing price fields
pub const NOT_AVAILABLE: &str = "N/A";

/// Render a trading pair as markdown.
///
/// `display_name` overrides the base token name and adds a `**Token:**` line.
pub fn format_pair_markdown(pair: &PairRecord, display_name: Option<&str>) -> String {
    let display_name = display_name.filter(|n| !n.is_empty());

    let pair_address = pair.pair_address.as_deref().unwrap_or(UNKNOWN);
    let chain_id = pair.chain_id.as_deref().unwrap_or(UNKNOWN);
    let dex_id = pair.dex_id.as_deref().unwrap_or(UNKNOWN);
    let base_symbol = pair.base_symbol().unwrap_or(UNKNOWN);
    let quote_symbol = pair.quote_symbol().unwrap_or(UNKNOWN);

    let price_usd = pair.price_usd.as_deref().unwrap_or(NOT_AVAILABLE);
    let price_native = pair.price_native.as_deref().unwrap_or(NOT_AVAILABLE);
    let price_change_24h = pair.price_change_24h().unwrap_or(0.0);

    let volume = pair.volume.clone().unwrap_or_default();
    let buys = pair.txns_24h().and_then(|t| t.buys).unwrap_or(0);
    let sells = pair.txns_24h().and_then(|t| t.sells).unwrap_or(0);

    let mut md = String::with_capacity(1024);

    // Writing into a String cannot fail
    let _ = write!(md, "# {}/{} Trading Pair\n\n", base_symbol, quote_symbol);

    if let Some(name) = display_name {
        let _ = writeln!(md, "**Token:** {} ({})", name, base_symbol);
    }

    let _ = writeln!(md, "**Chain:** {}", chain_id);
    let _ = writeln!(md, "**DEX:** {}", dex_id);
    let _ = write!(md, "**Pair Address:** `{}`\n\n", pair_address);

    md.push_str("## Price Information\n\n");
    let _ = writeln!(md, "- **Price (USD):** ${}", price_usd);
    let _ = writeln!(md, "- **Price (Native):** {} {}", price_native, quote_symbol);
    let _ = write!(md, "- **24h Change:** {}%\n\n", format_signed(price_change_24h));

    md.push_str("## Liquidity\n\n");
    let _ = write!(
        md,
        "- **Total Liquidity:** ${}\n\n",
        format_amount(pair.liquidity_usd().unwrap_or(0.0))
    );

    md.push_str("## Trading Volume\n\n");
    let _ = writeln!(md, "- **24h Volume:** ${}", format_amount(volume.h24.unwrap_or(0.0)));
    let _ = writeln!(md, "- **6h Volume:** ${}", format_amount(volume.h6.unwrap_or(0.0)));
    let _ = write!(md, "- **1h Volume:** ${}\n\n", format_amount(volume.h1.unwrap_or(0.0)));

    md.push_str("## Market Metrics\n\n");
    let _ = writeln!(md, "- **Market Cap:** ${}", format_amount(pair.market_cap.unwrap_or(0.0)));
    let _ = write!(
        md,
        "- **FDV (Fully Diluted Valuation):** ${}\n\n",
        format_amount(pair.fdv.unwrap_or(0.0))
    );

    md.push_str("## Transactions (24h)\n\n");
    let _ = writeln!(md, "- **Buys:** {}", buys);
    let _ = writeln!(md, "- **Sells:** {}", sells);
    let _ = write!(md, "- **Total:** {}\n\n", buys.saturating_add(sells));

    if let Some(url) = pair.url.as_deref().filter(|u| !u.is_empty()) {
        let _ = write!(md, "**View on DexScreener:** {}\n\n", url);
    }

    md
}

/// Plain-text summary used when no long-context summarizer is available.
///
/// `chain` is the configured chain of the tracked token, not the pair's own
/// `chainId`.
pub fn format_fallback_summary(pair: &PairRecord, chain: &str) -> String {
    let base_symbol = pair.base_symbol().unwrap_or(UNKNOWN);
    let quote_symbol = pair.quote_symbol().unwrap_or(UNKNOWN);

    let mut summary = String::with_capacity(256);
    let _ = write!(summary, "DexScreener Pair: {}/{}\n\n", base_symbol, quote_symbol);
    let _ = writeln!(summary, "Chain: {}", chain);
    let _ = writeln!(summary, "DEX: {}", pair.dex_id.as_deref().unwrap_or(UNKNOWN));
    let _ = writeln!(summary, "Pair Address: {}", pair.pair_address.as_deref().unwrap_or(UNKNOWN));
    let _ = writeln!(summary, "Price (USD): ${}", pair.price_usd.as_deref().unwrap_or(NOT_AVAILABLE));
    let _ = writeln!(summary, "Liquidity: ${}", format_amount(pair.liquidity_usd().unwrap_or(0.0)));
    let _ = writeln!(summary, "24h Volume: ${}", format_amount(pair.volume_24h().unwrap_or(0.0)));
    let _ = writeln!(summary, "24h Change: {}%", format_signed(pair.price_change_24h().unwrap_or(0.0)));
    summary
}

/// Two decimals with thousands separators: `1234567.891` -> `1,234,567.89`
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }

    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if value < 0.0 && fixed != "0.00" {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push('.');
    out.push_str(frac_part);
    out
}

/// Two decimals with an explicit sign: `2.5` -> `+2.50`
pub fn format_signed(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    format!("{:+.2}", value)
}
