//! Terminal rendering for scans, vitals, and history records.
//!
//! Everything renders into a `String` so the layout can be tested; `main`
//! decides where it goes.

use std::fmt::{self, Write};

use medscan_core::vitals::VitalReading;
use medscan_core::{DiagnosisRecord, PatientStats, ScanType, Trend, VitalKind};

use crate::scan::ScanReport;

const BAR_WIDTH: usize = 20;
const MAX_TITLE: usize = 32;

/// Strength shown next to a confidence bar. Independent of severity tiers.
pub fn confidence_band(confidence: u8) -> &'static str {
    if confidence > 70 {
        "strong"
    } else if confidence > 40 {
        "fair"
    } else {
        "weak"
    }
}

/// `[#########-----------]` scaled to [`BAR_WIDTH`].
pub fn confidence_bar(confidence: u8) -> String {
    let filled = (confidence.min(100) as usize * BAR_WIDTH + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

pub fn render_scan(report: &ScanReport) -> String {
    render(|out| write_scan(out, report))
}

fn write_scan(out: &mut String, report: &ScanReport) -> fmt::Result {
    let result = &report.result;
    writeln!(out, "=== Analysis Results ===")?;
    if let Some(t) = report.scan_type {
        writeln!(out, "{}", t.name())?;
    }
    writeln!(out, "  {:<14} {} ({} bytes)", "file", report.file_name, report.size_bytes)?;
    writeln!(out)?;

    writeln!(out, "Primary Detection")?;
    writeln!(out, "  {}", result.predicted_label)?;
    writeln!(
        out,
        "  {} {:>3}%  {}  [{}]",
        confidence_bar(result.confidence),
        result.confidence,
        confidence_band(result.confidence),
        result.severity.badge()
    )?;
    writeln!(out)?;

    writeln!(out, "All Predictions")?;
    for p in &result.all_predictions {
        writeln!(
            out,
            "  {:<32} {} {:>3}%",
            truncate(&p.label, MAX_TITLE),
            confidence_bar(p.confidence),
            p.confidence
        )?;
    }
    writeln!(out)?;

    writeln!(out, "Recommendations")?;
    for r in &result.recommendations {
        writeln!(out, "  * {r}")?;
    }

    if let Some(info) = &report.model_info {
        writeln!(out)?;
        writeln!(out, "Model")?;
        writeln!(out, "  {:<14} {}", "name", info.name)?;
        writeln!(out, "  {:<14} {}", "architecture", info.architecture)?;
        for (key, value) in [
            ("approach", &info.approach),
            ("parameters", &info.parameters),
            ("layers", &info.layers),
            ("activation", &info.activation),
        ] {
            if !value.is_empty() {
                writeln!(out, "  {key:<14} {value}")?;
            }
        }
        writeln!(out, "  {:<14} {}", "input", info.input_shape_display())?;
        writeln!(out, "  {:<14} {}", "classes", info.classes)?;
        writeln!(out, "  {:<14} {}", "runtime", info.runtime)?;
        writeln!(out, "  {:<14} {} ms", "inference", report.inference_time_ms)?;

        if !info.pipeline.is_empty() {
            writeln!(out)?;
            writeln!(out, "Preprocessing Pipeline")?;
            for step in &info.pipeline {
                writeln!(out, "  {}. {:<12} {}", step.step, step.label, step.detail)?;
            }
        }
    }
    Ok(())
}

pub fn render_reading(reading: &VitalReading, trend: Trend) -> String {
    render(|out| {
        let status = reading.status();
        writeln!(out, "{}", reading.kind.name())?;
        writeln!(out, "  {:<14} {}", "value", reading.display_value())?;
        writeln!(out, "  {:<14} {}", "status", status.label())?;
        if let Some(range) = reading.kind.range() {
            writeln!(
                out,
                "  {:<14} {}-{} {}",
                "normal",
                range.min,
                range.max,
                reading.kind.unit()
            )?;
        }
        writeln!(out, "  {:<14} {}", "trend", trend_arrow(trend))?;
        writeln!(
            out,
            "  {:<14} {}",
            "recorded",
            reading.recorded_at.format("%Y-%m-%d %H:%M")
        )?;
        if !reading.kind.is_text() && !reading.notes.is_empty() {
            writeln!(out, "  {:<14} {}", "notes", reading.notes)?;
        }
        Ok(())
    })
}

fn trend_arrow(trend: Trend) -> &'static str {
    match trend {
        Trend::Up => "up",
        Trend::Down => "down",
        Trend::Stable => "stable",
    }
}

/// Reference table of every vital kind.
pub fn render_kinds() -> String {
    render(|out| {
        writeln!(out, "  {:<16} {:<20} {:<8} {}", "ID", "NAME", "UNIT", "NORMAL")?;
        for kind in VitalKind::ALL {
            let normal = match (kind.range(), kind.secondary_range()) {
                (Some(r), Some(s)) => format!("{}-{} / {}-{}", r.min, r.max, s.min, s.max),
                (Some(r), None) => format!("{}-{}", r.min, r.max),
                _ => "-".into(),
            };
            writeln!(
                out,
                "  {:<16} {:<20} {:<8} {}",
                kind.id(),
                kind.name(),
                kind.unit(),
                normal
            )?;
        }
        Ok(())
    })
}

pub fn render_scan_types() -> String {
    render(|out| {
        for t in ScanType::ALL {
            writeln!(out, "  {:<12} {:<20} {}", t.id(), t.name(), t.description())?;
        }
        Ok(())
    })
}

pub fn render_history(records: &[&DiagnosisRecord]) -> String {
    render(|out| {
        if records.is_empty() {
            return writeln!(out, "No diagnosis records found.");
        }
        writeln!(
            out,
            "  {:<10} {:<12} {:<14} {:<32} {:>5}  {}",
            "ID", "DATE", "SCAN", "DIAGNOSIS", "CONF", "SEVERITY"
        )?;
        for r in records {
            writeln!(
                out,
                "  {:<10} {:<12} {:<14} {:<32} {:>4}%  {}",
                truncate(&r.id, 10),
                r.created_at.format("%Y-%m-%d"),
                truncate(&r.scan_type, 14),
                truncate(&r.disease, MAX_TITLE),
                r.confidence.round() as i64,
                r.severity.label()
            )?;
        }
        writeln!(out, "  {} record(s)", records.len())
    })
}

/// Card for one stored diagnosis.
pub fn render_record(record: &DiagnosisRecord) -> String {
    render(|out| {
        writeln!(out, "=== Diagnosis {} ===", record.id)?;
        writeln!(out, "  {:<14} {}", "disease", record.disease)?;
        writeln!(out, "  {:<14} {}", "scan type", record.scan_type)?;
        writeln!(out, "  {:<14} {:.0}%", "confidence", record.confidence)?;
        writeln!(out, "  {:<14} {}", "severity", record.severity.label())?;
        writeln!(
            out,
            "  {:<14} {}",
            "date",
            record.created_at.format("%Y-%m-%d %H:%M")
        )?;
        writeln!(out, "  {:<14} {}", "report", record.report_file_name())
    })
}

pub fn render_stats(stats: &PatientStats) -> String {
    render(|out| {
        writeln!(out, "Patient Summary")?;
        writeln!(out, "  {:<16} {}", "total scans", stats.total_scans)?;
        writeln!(
            out,
            "  {:<16} {}",
            "last diagnosis",
            stats.last_diagnosis.as_deref().unwrap_or("-")
        )?;
        writeln!(out, "  {:<16} {:.0}", "health score", stats.health_score)?;
        writeln!(
            out,
            "  {:<16} {}",
            "next checkup",
            stats.next_checkup.as_deref().unwrap_or("-")
        )
    })
}

fn render(f: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = f(&mut out);
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{head}...")
}
