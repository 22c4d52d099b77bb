//! Report rendering.

use std::io::{self, Write};

use chrono::SecondsFormat;
use phishscan_core::ScanReport;

use crate::cli::OutputFormat;

/// Write the report in the requested format.
pub fn render(report: &ScanReport, format: OutputFormat, out: &mut impl Write) -> io::Result<()> {
    match format {
        OutputFormat::Text => render_text(report, out),
        OutputFormat::Json => render_json(report, out),
    }
}

fn render_text(report: &ScanReport, out: &mut impl Write) -> io::Result<()> {
    let rule = "=".repeat(70);
    let elapsed = (report.finished_at - report.started_at)
        .to_std()
        .unwrap_or_default();

    writeln!(out, "{rule}")?;
    writeln!(out, "PHISHING SCAN: {}", report.folder)?;
    writeln!(
        out,
        "started {}, took {:.1}s",
        report.started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        elapsed.as_secs_f64()
    )?;
    writeln!(out, "{rule}")?;

    if !report.flagged.is_empty() {
        writeln!(out, "\nFLAGGED ({}):", report.flagged.len())?;
        for result in &report.flagged {
            let score = result
                .score
                .map_or_else(|| "  -  ".to_string(), |s| format!("{s:+.2}"));
            writeln!(
                out,
                "  [{score}] {} {} -- {}",
                result.id,
                result.subject.as_deref().unwrap_or("(no subject)"),
                result.reason
            )?;
        }
    }

    if !report.skipped.is_empty() {
        writeln!(out, "\nSKIPPED ({}):", report.skipped.len())?;
        for skipped in &report.skipped {
            writeln!(out, "  [SKIP ] {} -- {}", skipped.id, skipped.reason)?;
        }
    }

    let summary = &report.summary;
    writeln!(out, "\nSUMMARY:")?;
    writeln!(out, "  Messages scanned: {}", summary.scanned)?;
    writeln!(out, "  Flagged:          {}", summary.flagged)?;
    writeln!(out, "  Clean:            {}", summary.unflagged)?;
    writeln!(out, "  Skipped:          {}", summary.skipped)?;
    writeln!(out, "{rule}")
}

fn render_json(report: &ScanReport, out: &mut impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use phishscan_core::{
        ClassificationResult, MessageId, ScanSummary, SkipReason, SkippedMessage,
    };

    use super::*;

    fn report() -> ScanReport {
        let started_at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        ScanReport {
            folder: "INBOX".into(),
            started_at,
            finished_at: started_at + chrono::Duration::milliseconds(2500),
            flagged: vec![
                ClassificationResult {
                    id: MessageId::new("12"),
                    subject: Some("Verify your account".into()),
                    flagged: true,
                    score: Some(-0.6),
                    reason: "sentiment: polarity -0.60 below 0.00".into(),
                },
                ClassificationResult {
                    id: MessageId::new("40"),
                    subject: None,
                    flagged: true,
                    score: None,
                    reason: "keyword: matched keyword \"urgent\"".into(),
                },
            ],
            skipped: vec![SkippedMessage {
                id: MessageId::new("31"),
                reason: SkipReason::Timeout(Duration::from_secs(30)),
            }],
            summary: ScanSummary {
                scanned: 5,
                flagged: 2,
                unflagged: 2,
                skipped: 1,
            },
        }
    }

    fn rendered(format: OutputFormat) -> String {
        let mut out = Vec::new();
        render(&report(), format, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_text_lists_flagged_and_skipped() {
        let text = rendered(OutputFormat::Text);
        assert!(text.contains("PHISHING SCAN: INBOX"));
        assert!(text.contains("started 2026-03-01T09:30:00Z, took 2.5s"));
        assert!(text.contains("  [-0.60] 12 Verify your account -- sentiment: polarity -0.60 below 0.00"));
        assert!(text.contains("  [  -  ] 40 (no subject) -- keyword: matched keyword \"urgent\""));
        assert!(text.contains("  [SKIP ] 31 -- fetch timed out after 30s"));
        assert!(text.contains("  Messages scanned: 5"));
    }

    #[test]
    fn test_text_without_findings() {
        let mut report = report();
        report.flagged.clear();
        report.skipped.clear();
        let mut out = Vec::new();
        render(&report, OutputFormat::Text, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("FLAGGED"));
        assert!(!text.contains("SKIPPED"));
    }

    #[test]
    fn test_json_is_the_whole_report() {
        let json: serde_json::Value = serde_json::from_str(&rendered(OutputFormat::Json)).unwrap();
        assert_eq!(json["folder"], "INBOX");
        assert_eq!(json["flagged"][0]["id"], "12");
        assert_eq!(json["flagged"][0]["score"], -0.6);
        assert!(json["flagged"][1].get("score").is_none());
        assert_eq!(json["skipped"][0]["reason"], "fetch timed out after 30s");
        assert_eq!(json["summary"]["scanned"], 5);
        assert_eq!(json["started_at"], "2026-03-01T09:30:00Z");
    }
}
