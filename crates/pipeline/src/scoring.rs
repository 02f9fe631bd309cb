//! Per-layer anomaly scoring over a collected signal bundle.
//!
//! Scoring runs only after collection has fully merged the bundle
//! into memory: population mean/stddev needs the whole population up
//! front and cannot be streamed.

use serde::Serialize;
use tracing::debug;

use narradar_anomaly::{detect_multi_metric_anomalies, enrich_with_z_scores, MetricSpec};
use narradar_core::signal::{Protocol, Scored, SignalBundle, SocialTopic, TokenMarket, TrackedRepo};

/// One flagged metric on one entity, as fed to the clustering prompt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSignal {
    pub metric: String,
    pub z_score: f64,
    pub raw: f64,
    pub delta: f64,
}

/// One anomalous entity with every metric that flagged it. An entity
/// anomalous on several dimensions appears once, not once per metric.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityAnomalies {
    pub name: String,
    /// Signal layer the entity belongs to (dev, defi, market, social).
    pub layer: String,
    pub signals: Vec<MetricSignal>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalySummary {
    pub entities: Vec<EntityAnomalies>,
}

impl AnomalySummary {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Compact JSON condensation for the clustering prompt.
    pub fn condense(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{\"entities\":[]}".to_string())
    }
}

/// Enrich every metric's z-score in place and return the deduplicated
/// per-entity anomaly summary across all four layers. Z-scores are
/// computed over the delta (change vs. the prior window) so the
/// question answered is "whose movement is unusual among its peers
/// this period".
pub fn score_signals(bundle: &mut SignalBundle, threshold: f64) -> AnomalySummary {
    let mut summary = AnomalySummary::default();

    // Developer activity.
    enrich_with_z_scores(&mut bundle.repos, |r| r.commits.delta, |r, z| r.commits.z_score = z);
    enrich_with_z_scores(&mut bundle.repos, |r| r.stars.delta, |r, z| r.stars.z_score = z);
    enrich_with_z_scores(&mut bundle.repos, |r| r.forks.delta, |r, z| r.forks.z_score = z);
    let repo_metrics = [
        MetricSpec::<TrackedRepo> { name: "commits", extract: |r| r.commits.delta },
        MetricSpec::<TrackedRepo> { name: "stars", extract: |r| r.stars.delta },
        MetricSpec::<TrackedRepo> { name: "forks", extract: |r| r.forks.delta },
    ];
    summary.entities.extend(layer_entities(
        &bundle.repos,
        &repo_metrics,
        threshold,
        "dev",
        |r| r.name.clone(),
        |r, metric| match metric {
            "commits" => r.commits,
            "stars" => r.stars,
            _ => r.forks,
        },
    ));

    // Capital flows.
    enrich_with_z_scores(&mut bundle.protocols, |p| p.tvl_usd.delta, |p, z| {
        p.tvl_usd.z_score = z
    });
    let protocol_metrics = [MetricSpec::<Protocol> { name: "tvlUsd", extract: |p| p.tvl_usd.delta }];
    summary.entities.extend(layer_entities(
        &bundle.protocols,
        &protocol_metrics,
        threshold,
        "defi",
        |p| p.name.clone(),
        |p, _| p.tvl_usd,
    ));

    // Market data.
    enrich_with_z_scores(&mut bundle.tokens, |t| t.volume_usd.delta, |t, z| {
        t.volume_usd.z_score = z
    });
    enrich_with_z_scores(&mut bundle.tokens, |t| t.price_change_pct.delta, |t, z| {
        t.price_change_pct.z_score = z
    });
    let token_metrics = [
        MetricSpec::<TokenMarket> { name: "volumeUsd", extract: |t| t.volume_usd.delta },
        MetricSpec::<TokenMarket> { name: "priceChangePct", extract: |t| t.price_change_pct.delta },
    ];
    summary.entities.extend(layer_entities(
        &bundle.tokens,
        &token_metrics,
        threshold,
        "market",
        |t| t.symbol.clone(),
        |t, metric| match metric {
            "volumeUsd" => t.volume_usd,
            _ => t.price_change_pct,
        },
    ));

    // Social chatter.
    enrich_with_z_scores(&mut bundle.social, |s| s.mentions.delta, |s, z| {
        s.mentions.z_score = z
    });
    let social_metrics =
        [MetricSpec::<SocialTopic> { name: "mentions", extract: |s| s.mentions.delta }];
    summary.entities.extend(layer_entities(
        &bundle.social,
        &social_metrics,
        threshold,
        "social",
        |s| s.topic.clone(),
        |s, _| s.mentions,
    ));

    debug!("scored bundle: {} anomalous entities", summary.entities.len());
    summary
}

fn layer_entities<T>(
    items: &[T],
    metrics: &[MetricSpec<T>],
    threshold: f64,
    layer: &str,
    name_of: impl Fn(&T) -> String,
    scored_of: impl Fn(&T, &str) -> Scored,
) -> Vec<EntityAnomalies> {
    detect_multi_metric_anomalies(items, metrics, threshold)
        .into_iter()
        .map(|(index, anomalies)| {
            let item = &items[index];
            EntityAnomalies {
                name: name_of(item),
                layer: layer.to_string(),
                signals: anomalies
                    .into_iter()
                    .map(|a| {
                        let scored = scored_of(item, &a.metric);
                        MetricSignal {
                            metric: a.metric,
                            z_score: a.z_score,
                            raw: scored.raw,
                            delta: scored.delta,
                        }
                    })
                    .collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(name: &str, commits_delta: f64) -> TrackedRepo {
        TrackedRepo {
            name: name.to_string(),
            commits: Scored::new(100.0, commits_delta),
            stars: Scored::new(50.0, 1.0),
            forks: Scored::new(10.0, 0.0),
        }
    }

    #[test]
    fn outlier_repo_is_summarized_once() {
        let mut bundle = SignalBundle {
            repos: vec![
                repo("steady-1", 5.0),
                repo("steady-2", 6.0),
                repo("steady-3", 4.0),
                repo("steady-4", 5.0),
                repo("steady-5", 6.0),
                repo("spiking", 500.0),
            ],
            ..Default::default()
        };

        let summary = score_signals(&mut bundle, 2.0);

        assert_eq!(summary.entities.len(), 1);
        let entity = &summary.entities[0];
        assert_eq!(entity.name, "spiking");
        assert_eq!(entity.layer, "dev");
        assert_eq!(entity.signals.len(), 1);
        assert_eq!(entity.signals[0].metric, "commits");
        assert!(entity.signals[0].z_score > 2.0);
        assert_eq!(entity.signals[0].delta, 500.0);
        // Z-scores were written back into the bundle.
        assert!(bundle.repos[5].commits.z_score > 2.0);
        assert_eq!(bundle.repos[0].forks.z_score, 0.0);
    }

    #[test]
    fn entity_anomalous_on_two_metrics_groups_signals() {
        let mut tokens: Vec<TokenMarket> = (0..6)
            .map(|i| TokenMarket {
                symbol: format!("TOK{i}"),
                volume_usd: Scored::new(1000.0, 10.0),
                price_change_pct: Scored::new(0.0, 1.0),
            })
            .collect();
        tokens[0].volume_usd.delta = 100_000.0;
        tokens[0].price_change_pct.delta = 90.0;
        let mut bundle = SignalBundle {
            tokens,
            ..Default::default()
        };

        let summary = score_signals(&mut bundle, 1.5);

        assert_eq!(summary.entities.len(), 1);
        assert_eq!(summary.entities[0].signals.len(), 2);
    }

    #[test]
    fn quiet_bundle_yields_empty_summary() {
        let mut bundle = SignalBundle {
            repos: vec![repo("a", 5.0), repo("b", 5.0), repo("c", 5.0)],
            ..Default::default()
        };
        let summary = score_signals(&mut bundle, 2.0);
        assert!(summary.is_empty());
    }

    #[test]
    fn condense_is_compact_json() {
        let summary = AnomalySummary {
            entities: vec![EntityAnomalies {
                name: "spiking".into(),
                layer: "dev".into(),
                signals: vec![],
            }],
        };
        let json = summary.condense();
        assert!(json.contains("\"spiking\""));
        assert!(!json.contains('\n'));
    }
}
