//! Dossier rendering and persistence.
//!
//! The core produces structured values; this module is the edge that turns
//! them into JSON, Markdown, and CSV artifacts on disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::compare::Verdict;
use crate::dossier::Dossier;
use crate::error::AnalysisError;
use crate::evidence::Relationship;
use crate::pipeline::BatchRecord;

/// How much excerpt text a markdown evidence block shows.
const MARKDOWN_EXCERPT_LEN: usize = 300;

/// Evidence links shown per dimension in markdown.
const MARKDOWN_LINKS_PER_DIMENSION: usize = 5;

/// Write `dossier.json` and `dossier.md` under `output_dir`, creating it if
/// needed. Returns both paths.
pub fn save_dossier(
    dossier: &Dossier,
    output_dir: &Path,
) -> Result<(PathBuf, PathBuf), AnalysisError> {
    fs::create_dir_all(output_dir)?;

    let json_path = output_dir.join("dossier.json");
    fs::write(&json_path, serde_json::to_string_pretty(dossier)?)?;

    let md_path = output_dir.join("dossier.md");
    fs::write(&md_path, render_markdown(dossier))?;

    Ok((json_path, md_path))
}

/// Render batch records as a `story_id,prediction,rationale` CSV document.
pub fn render_batch_csv(records: &[BatchRecord]) -> String {
    let mut out = String::from("story_id,prediction,rationale\n");
    for record in records {
        // Quote the free-text field; double any embedded quotes.
        let rationale = record.rationale.replace('"', "\"\"");
        out.push_str(&format!(
            "{},{},\"{}\"\n",
            record.id, record.prediction, rationale
        ));
    }
    out
}

/// Render the dossier as human-readable Markdown.
pub fn render_markdown(dossier: &Dossier) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("# Narrative Consistency Dossier".to_string());
    lines.push(String::new());
    lines.push(format!("**Generated:** {}", dossier.metadata.generated_at));
    lines.push(String::new());

    // Decision banner
    match dossier.verdict {
        Verdict::Consistent => lines.push("> [!NOTE]".to_string()),
        Verdict::Inconsistent => lines.push("> [!WARNING]".to_string()),
    }
    lines.push(format!(
        "> **Decision: {}**",
        dossier.verdict.to_string().to_uppercase()
    ));
    lines.push(format!("> {}", dossier.reason));
    lines.push(String::new());

    lines.push("## Executive Summary".to_string());
    lines.push(String::new());
    lines.push(dossier.summary.clone());
    lines.push(String::new());

    lines.push("## Analysis Statistics".to_string());
    lines.push(String::new());
    lines.push("| Metric | Value |".to_string());
    lines.push("|--------|-------|".to_string());
    lines.push(format!(
        "| Total Excerpts Analyzed | {} |",
        dossier.metadata.total_excerpts_analyzed
    ));
    lines.push(format!(
        "| Total Backstory Claims | {} |",
        dossier.metadata.total_backstory_claims
    ));
    lines.push(format!(
        "| Total Evidence Links | {} |",
        dossier.metadata.total_evidence_links
    ));
    lines.push(String::new());

    lines.push("## Backstory Claims Analyzed".to_string());
    lines.push(String::new());
    for (i, claim) in dossier.backstory_claims.iter().enumerate() {
        lines.push(format!("### Claim {} ({})", i + 1, claim.dimension));
        lines.push(format!("**ID:** `{}`", claim.id));
        lines.push(format!("**Polarity:** {}", claim.polarity));
        lines.push(String::new());
        lines.push(format!("> {}", claim.text));
        lines.push(String::new());
    }

    lines.push("## Dimension-by-Dimension Analysis".to_string());
    lines.push(String::new());
    for report in &dossier.dimension_analysis {
        lines.push(format!("### {}", capitalize(report.dimension.label())));
        lines.push(String::new());
        lines.push(format!("*{}*", report.description));
        lines.push(String::new());

        match (report.is_conflict, report.story_polarity, report.backstory_polarity) {
            (true, story, back) => {
                lines.push("> [!CAUTION]".to_string());
                lines.push(format!(
                    "> **CONFLICT**: Story shows `{}` vs Backstory shows `{}`",
                    polarity_label(story),
                    polarity_label(back)
                ));
            }
            (false, story, _) => {
                lines.push("> [!TIP]".to_string());
                lines.push(format!(
                    "> **ALIGNED**: Both story and backstory show `{}` polarity",
                    polarity_label(story)
                ));
            }
        }
        lines.push(String::new());

        lines.push("| Metric | Count |".to_string());
        lines.push("|--------|-------|".to_string());
        lines.push(format!("| Total Excerpts | {} |", report.total_links));
        lines.push(format!("| Supporting | {} |", report.supporting_count));
        lines.push(format!("| Contradicting | {} |", report.contradicting_count));
        lines.push(String::new());

        if report.links.is_empty() {
            continue;
        }
        lines.push("#### Evidence Links".to_string());
        lines.push(String::new());
        for (j, link) in report
            .links
            .iter()
            .take(MARKDOWN_LINKS_PER_DIMENSION)
            .enumerate()
        {
            let icon = match link.relationship {
                Relationship::Supports => "✓",
                Relationship::Contradicts => "✗",
            };
            let chapter = link
                .chapter
                .map(|c| c.to_string())
                .unwrap_or_else(|| "?".to_string());
            lines.push(format!(
                "**{}. [{}] {}** (Chapter {}, Confidence: {})",
                j + 1,
                icon,
                link.relationship.to_string().to_uppercase(),
                chapter,
                link.confidence
            ));
            lines.push(String::new());
            lines.push("**Excerpt:**".to_string());
            lines.push(format!("> {}", ellipsize(&link.experience_text)));
            lines.push(String::new());
            lines.push("**Linked Backstory Claim:**".to_string());
            lines.push(format!("> {}", link.claim_text));
            lines.push(String::new());
            lines.push("**Analysis:**".to_string());
            lines.push(link.analysis.clone());
            lines.push(String::new());
            lines.push("---".to_string());
            lines.push(String::new());
        }
    }

    if !dossier.conflicts.is_empty() {
        lines.push("## Detected Conflicts".to_string());
        lines.push(String::new());
        for (i, conflict) in dossier.conflicts.iter().enumerate() {
            lines.push(format!(
                "### Conflict {}: {}",
                i + 1,
                capitalize(conflict.dimension_label())
            ));
            lines.push(String::new());
            lines.push(format!("**Severity:** {}", conflict.severity));
            lines.push(String::new());
            lines.push(conflict.explanation.clone());
            lines.push(String::new());
        }
    }

    lines.join("\n")
}

fn polarity_label(polarity: Option<crate::polarity::Polarity>) -> String {
    polarity
        .map(|p| p.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn ellipsize(text: &str) -> String {
    if text.len() <= MARKDOWN_EXCERPT_LEN {
        return text.to_string();
    }
    let mut end = MARKDOWN_EXCERPT_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
