//! Text builders for CLI output.
//!
//! Formats the end-of-run report and the `--list` table as human-readable lines.

use crate::model::{round_to_secs, ProfileSummary, RunReport};
use crate::profiles::ProfileTable;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build the end-of-run summary. The last line always names the output directory.
pub(crate) fn build_text_summary(report: &RunReport) -> TextSummary {
    let mut lines = Vec::new();

    lines.push(format!(
        "Profile: {} ({}), started {}",
        report.key, report.method, report.started_utc
    ));
    if !report.dry_run {
        let mut timing = format!(
            "Train: {}",
            humantime::format_duration(round_to_secs(report.train_duration))
        );
        if let Some(render) = report.render_duration {
            timing.push_str(&format!(
                ", render: {}",
                humantime::format_duration(round_to_secs(render))
            ));
        }
        lines.push(timing);
    }

    lines.push(String::new());
    if report.dry_run {
        lines.push(format!(
            "Dry run complete. Results would be saved to {}",
            report.output_dir.display()
        ));
    } else {
        lines.push(format!(
            "Done. Results saved to {}",
            report.output_dir.display()
        ));
    }

    TextSummary { lines }
}

/// One summary row per profile, in key order.
pub(crate) fn profile_summaries(table: &ProfileTable) -> Vec<ProfileSummary> {
    table
        .iter()
        .map(|(key, profile)| ProfileSummary {
            key: key.to_string(),
            is_default: key == table.default_key(),
            method: profile.method.clone(),
            data: profile.data.clone(),
            output_dir: table
                .resolve_output_dir(key)
                .unwrap_or_else(|| table.default_root().join(key)),
            trajectory: profile.trajectory.clone(),
        })
        .collect()
}

/// Column-aligned listing of the profile table; the default key is starred.
pub(crate) fn build_profile_listing(table: &ProfileTable) -> TextSummary {
    let rows = profile_summaries(table);
    let key_w = rows.iter().map(|r| r.key.len()).max().unwrap_or(0).max(3);
    let method_w = rows.iter().map(|r| r.method.len()).max().unwrap_or(0).max(6);

    let mut lines = vec![format!(
        "  {:key_w$}  {:method_w$}  DATA -> OUTPUT [TRAJECTORY]",
        "KEY", "METHOD"
    )];
    for row in rows {
        let marker = if row.is_default { '*' } else { ' ' };
        let trajectory = row
            .trajectory
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!(
            "{marker} {:key_w$}  {:method_w$}  {} -> {} [{}]",
            row.key,
            row.method,
            row.data.display(),
            row.output_dir.display(),
            trajectory
        ));
    }
    TextSummary { lines }
}
