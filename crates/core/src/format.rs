use crate::{
    trends::{Finding, TrendReport},
    types::EnrichedRecord,
};

/// Abbreviate a count as `999`, `1.2K`, `3.4M` or `1.0B`.
pub fn format_count(count: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(1_000_000_000, "B"), (1_000_000, "M"), (1_000, "K")];

    for (scale, suffix) in UNITS {
        if count >= scale {
            return format!("{:.1}{}", count as f64 / scale as f64, suffix);
        }
    }
    count.to_string()
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// One line of the ranked table, `rank` starting at 1.
pub fn format_ranked_line(rank: usize, record: &EnrichedRecord) -> String {
    format!(
        "{:>3}. {:<48} {:<24} {:>8} {:>7} {:>7} {:>6.2}% {:>12.2}",
        rank,
        truncate(record.title(), 48),
        truncate(record.channel_title(), 24),
        record.formatted_duration(),
        format_count(record.video.view_count),
        format_count(record.subscriber_count),
        record.engagement_rate(),
        record.engagement_score,
    )
}

pub fn format_ranked_table(records: &[EnrichedRecord]) -> String {
    let mut output = format!(
        "{:>3}  {:<48} {:<24} {:>8} {:>7} {:>7} {:>7} {:>12}\n",
        "#", "Title", "Channel", "Length", "Views", "Subs", "Rate", "Score"
    );
    for (i, record) in records.iter().enumerate() {
        output.push_str(&format_ranked_line(i + 1, record));
        output.push('\n');
    }
    output
}

pub fn format_report_readable(report: &TrendReport) -> String {
    let mut output = String::new();
    output.push_str("# Trend analysis\n\n");
    output.push_str(&format!("**Videos analyzed:** {}\n\n", report.record_count));

    output.push_str("## Findings\n\n");
    output.push_str(&format!("• Optimal duration: {}\n", report.optimal_duration));
    output.push_str(&format!("• Best publish time (UTC): {}\n", report.best_publish_time));
    match &report.top_video {
        Finding::Found(top) => output.push_str(&format!(
            "• Top video: {} ({:.2})\n",
            top, top.engagement_score
        )),
        other => output.push_str(&format!("• Top video: {}\n", other)),
    }
    output.push('\n');

    output.push_str("## Trending keywords\n\n");
    if report.trend_keywords.is_empty() {
        output.push_str("none\n");
    } else {
        output.push_str(&report.trend_keywords.join(", "));
        output.push('\n');
    }
    output.push('\n');

    output.push_str("## Insights\n\n");
    output.push_str(&report.performance_insights());
    output.push_str("\n\n");

    output
}
