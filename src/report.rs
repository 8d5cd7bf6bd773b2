//! Run aggregation and the final ranked report.
//!
//! Turns each server's raw run sequence into an average, computes every
//! server's percentage deviation from the mean of all averages, and renders
//! the ranked console table.

use serde::Serialize;

/// How a server's test ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The sampling window collected the full run sequence.
    Completed,
    /// The deadline elapsed before enough nonzero windows occurred.
    Unreachable,
}

/// Final statistics for one benchmark subject.
#[derive(Debug, Clone, Serialize)]
pub struct ServerResult {
    pub name: String,
    /// Arithmetic mean of the accepted runs (messages per window).
    pub average: f64,
    /// Failed sends plus empty sampling windows.
    pub lost_packets: u64,
    /// Deviation from the global mean of averages, in percent. Filled in by
    /// [`rank`]; zero for unreachable servers.
    pub percentage: f64,
    pub outcome: Outcome,
}

/// Arithmetic mean of a run sequence; 0.0 when empty.
pub fn mean(runs: &[u64]) -> f64 {
    if runs.is_empty() {
        return 0.0;
    }
    runs.iter().sum::<u64>() as f64 / runs.len() as f64
}

/// Fill in each completed server's percentage deviation from the global mean
/// and sort descending by average (stable, so ties keep input order).
///
/// The global mean is taken over completed servers only: an unreachable
/// target's zero average would skew the relative comparison the percentage
/// column exists for.
pub fn rank(mut results: Vec<ServerResult>) -> Vec<ServerResult> {
    let completed: Vec<f64> = results
        .iter()
        .filter(|r| r.outcome == Outcome::Completed)
        .map(|r| r.average)
        .collect();

    if !completed.is_empty() {
        let global_mean = completed.iter().sum::<f64>() / completed.len() as f64;
        if global_mean > 0.0 {
            for result in &mut results {
                if result.outcome == Outcome::Completed {
                    result.percentage = (result.average - global_mean) / global_mean * 100.0;
                }
            }
        }
    }

    results.sort_by(|a, b| b.average.total_cmp(&a.average));
    results
}

/// Render the ranked results as a fixed-width console table.
pub fn render_table(results: &[ServerResult]) -> String {
    let name_width = results
        .iter()
        .map(|r| r.name.len())
        .chain(std::iter::once("Server".len()))
        .max()
        .unwrap_or(6);

    let mut out = String::new();
    out.push_str(&format!(
        "{:<name_width$} | {:>16} | {:>12} | {:>12}\n",
        "Server", "Avg Messages/sec", "Lost Packets", "% Difference"
    ));
    out.push_str(&format!(
        "{:-<name_width$}-|-{:->16}-|-{:->12}-|-{:->12}\n",
        "", "", "", ""
    ));
    for result in results {
        let diff = match result.outcome {
            Outcome::Completed => format!("{:+.2}%", result.percentage),
            Outcome::Unreachable => "unreachable".to_string(),
        };
        out.push_str(&format!(
            "{:<name_width$} | {:>16.2} | {:>12} | {:>12}\n",
            result.name, result.average, result.lost_packets, diff
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(name: &str, average: f64) -> ServerResult {
        ServerResult {
            name: name.to_string(),
            average,
            lost_packets: 0,
            percentage: 0.0,
            outcome: Outcome::Completed,
        }
    }

    #[test]
    fn mean_of_five_runs() {
        assert_eq!(mean(&[2000, 1900, 2100, 2000, 2000]), 2000.0);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[7]), 7.0);
    }

    #[test]
    fn rank_orders_descending_and_fills_percentages() {
        let ranked = rank(vec![
            completed("slow", 1000.0),
            completed("fast", 3000.0),
            completed("mid", 2000.0),
        ]);

        let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["fast", "mid", "slow"]);

        // Global mean is 2000; percentage_i = (avg_i - 2000) / 2000 * 100.
        assert!((ranked[0].percentage - 50.0).abs() < 1e-9);
        assert!((ranked[1].percentage - 0.0).abs() < 1e-9);
        assert!((ranked[2].percentage - -50.0).abs() < 1e-9);

        // Monotonically non-increasing in average.
        for pair in ranked.windows(2) {
            assert!(pair[0].average >= pair[1].average);
        }
    }

    #[test]
    fn single_server_sits_at_the_global_mean() {
        let ranked = rank(vec![completed("only", 1234.5)]);
        assert_eq!(ranked.len(), 1);
        assert!((ranked[0].percentage).abs() < 1e-9);
    }

    #[test]
    fn ties_keep_input_order() {
        let ranked = rank(vec![completed("first", 500.0), completed("second", 500.0)]);
        assert_eq!(ranked[0].name, "first");
        assert_eq!(ranked[1].name, "second");
    }

    #[test]
    fn unreachable_servers_are_excluded_from_the_global_mean() {
        let ranked = rank(vec![
            ServerResult {
                name: "dead".to_string(),
                average: 0.0,
                lost_packets: 60,
                percentage: 0.0,
                outcome: Outcome::Unreachable,
            },
            completed("alive", 2000.0),
        ]);

        // The live server equals the global mean despite the dead one.
        assert_eq!(ranked[0].name, "alive");
        assert!((ranked[0].percentage).abs() < 1e-9);
        assert_eq!(ranked[1].outcome, Outcome::Unreachable);
        assert_eq!(ranked[1].percentage, 0.0);
    }

    #[test]
    fn table_lists_every_server_with_formatted_difference() {
        let ranked = rank(vec![
            completed("Rust UDP", 2000.0),
            ServerResult {
                name: "dead".to_string(),
                average: 0.0,
                lost_packets: 60,
                percentage: 0.0,
                outcome: Outcome::Unreachable,
            },
        ]);
        let table = render_table(&ranked);
        assert!(table.contains("Server"));
        assert!(table.contains("Avg Messages/sec"));
        assert!(table.contains("Rust UDP"));
        assert!(table.contains("+0.00%"));
        assert!(table.contains("unreachable"));
    }
}
