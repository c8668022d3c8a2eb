//! crates/exam_grading_core/src/kpi.rs
//!
//! Derives the final exam report from aggregated statistics: overall score,
//! per-domain percentages, timing summaries, best/worst domain and
//! recommendations.

use crate::domain::{DetailedFeedback, DomainStat, ExamReport};
use std::collections::BTreeMap;

/// Domains scoring strictly below this percentage get a recommendation.
pub const RECOMMENDATION_THRESHOLD: f64 = 70.0;

/// Name rendered for best/worst domain when there are no domains at all.
pub const NO_DOMAIN: &str = "N/A";

/// Emitted when no domain falls below the threshold.
pub const POSITIVE_FEEDBACK: &str =
    "¡Excelente desempeño! Sigue practicando para mantener el nivel.";

// Sentinels that any real percentage beats.
const BEST_SENTINEL: f64 = -1.0;
const WORST_SENTINEL: f64 = 101.0;

/// Rounds to the given number of decimals using the exact decimal expansion
/// of `value`, so `0.175` (stored as 0.17499..) becomes `0.17`.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{:.*}", decimals, value)
        .parse::<f64>()
        .unwrap_or(value)
}

/// Percentage of `correct` over `total`, `0` when `total` is zero.
pub fn percentage(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (correct as f64 / total as f64) * 100.0
}

fn render_domain(name: &str, score: f64) -> String {
    format!("{} ({}%)", name, score.round_ties_even() as i64)
}

fn recommendation(domain: &str, score: f64) -> String {
    format!(
        "Reforzar: {} ({}% aciertos)",
        domain,
        score.round_ties_even() as i64
    )
}

/// Computes the report for one exam.
///
/// Domains are visited in name order, so the first-seen winner of a tie is the
/// alphabetically smallest domain.
pub fn synthesize(
    total_questions: u32,
    correct_count: u32,
    total_time_ms: u64,
    domain_stats: &BTreeMap<String, DomainStat>,
) -> ExamReport {
    let score = percentage(correct_count, total_questions);
    let avg_time_per_question_sec = if total_questions > 0 {
        round_to((total_time_ms as f64 / total_questions as f64) / 1000.0, 2)
    } else {
        0.0
    };
    let total_time_min = round_to(total_time_ms as f64 / 1000.0 / 60.0, 2);

    let mut domain_weakness = BTreeMap::new();
    let mut best = (NO_DOMAIN, BEST_SENTINEL);
    let mut worst = (NO_DOMAIN, WORST_SENTINEL);
    let mut recommendations = Vec::new();

    for (domain, stats) in domain_stats {
        let domain_score = percentage(stats.correct, stats.total);
        domain_weakness.insert(domain.clone(), round_to(domain_score, 2));

        if domain_score > best.1 {
            best = (domain.as_str(), domain_score);
        }
        if domain_score < worst.1 {
            worst = (domain.as_str(), domain_score);
        }
        if domain_score < RECOMMENDATION_THRESHOLD {
            recommendations.push(recommendation(domain, domain_score));
        }
    }

    if recommendations.is_empty() {
        recommendations.push(POSITIVE_FEEDBACK.to_string());
    }

    ExamReport {
        score,
        domain_weakness,
        detailed_feedback: DetailedFeedback {
            avg_time_per_question_sec,
            total_time_min,
            best_domain: render_domain(best.0, best.1),
            worst_domain: render_domain(worst.0, worst.1),
            recommendations,
        },
    }
}
