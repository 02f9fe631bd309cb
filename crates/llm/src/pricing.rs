//! Static per-model price table for estimated cost accounting.
//!
//! Prices are USD per million tokens. The table is read-only and
//! consulted by prefix match so dated model ids (`gpt-4o-2024-…`)
//! still resolve. Unknown models fall back to a conservative default
//! rather than failing the call.

struct ModelPrice {
    prefix: &'static str,
    input_per_mtok: f64,
    output_per_mtok: f64,
}

const PRICES: &[ModelPrice] = &[
    ModelPrice { prefix: "anthropic/claude-sonnet", input_per_mtok: 3.0, output_per_mtok: 15.0 },
    ModelPrice { prefix: "anthropic/claude-3-5-haiku", input_per_mtok: 0.8, output_per_mtok: 4.0 },
    ModelPrice { prefix: "anthropic/claude-opus", input_per_mtok: 15.0, output_per_mtok: 75.0 },
    ModelPrice { prefix: "openai/gpt-4o-mini", input_per_mtok: 0.15, output_per_mtok: 0.6 },
    ModelPrice { prefix: "openai/gpt-4o", input_per_mtok: 2.5, output_per_mtok: 10.0 },
    ModelPrice { prefix: "google/gemini-2.0-flash", input_per_mtok: 0.1, output_per_mtok: 0.4 },
    ModelPrice { prefix: "meta-llama/llama-3.3-70b", input_per_mtok: 0.2, output_per_mtok: 0.6 },
];

/// Conservative default for models missing from the table.
const DEFAULT_PRICE: ModelPrice = ModelPrice {
    prefix: "",
    input_per_mtok: 10.0,
    output_per_mtok: 30.0,
};

/// Estimated USD cost for one call, from reported token usage.
pub fn estimate_cost_usd(model: &str, prompt_tokens: u32, completion_tokens: u32) -> f64 {
    let price = PRICES
        .iter()
        .find(|p| model.starts_with(p.prefix))
        .unwrap_or(&DEFAULT_PRICE);
    (prompt_tokens as f64 * price.input_per_mtok + completion_tokens as f64 * price.output_per_mtok)
        / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_uses_table_price() {
        // 1M in + 1M out on gpt-4o-mini: 0.15 + 0.60.
        let cost = estimate_cost_usd("openai/gpt-4o-mini", 1_000_000, 1_000_000);
        assert!((cost - 0.75).abs() < 1e-9);
    }

    #[test]
    fn dated_model_id_resolves_by_prefix() {
        let plain = estimate_cost_usd("anthropic/claude-sonnet-4", 1000, 1000);
        let dated = estimate_cost_usd("anthropic/claude-sonnet-4-20250514", 1000, 1000);
        assert_eq!(plain, dated);
    }

    #[test]
    fn unknown_model_falls_back_to_default() {
        let cost = estimate_cost_usd("somelab/mystery-model", 1_000_000, 0);
        assert_eq!(cost, 10.0);
    }

    #[test]
    fn zero_usage_costs_nothing() {
        assert_eq!(estimate_cost_usd("openai/gpt-4o", 0, 0), 0.0);
    }
}
