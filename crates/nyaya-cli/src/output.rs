//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use nyaya_domain::{Article, ClauseMatch, ComplianceLevel, DimensionScore, Neighbor};
use nyaya_engine::{AnalysisReport, FrameworkMatch};
use nyaya_store::GraphStats;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format an analysis report.
    pub fn format_report(&self, report: &AnalysisReport, explain: bool) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(report.to_json()?),
            OutputFormat::Table => Ok(self.format_report_table(report, explain)),
        }
    }

    fn format_report_table(&self, report: &AnalysisReport, explain: bool) -> String {
        let mut out = Vec::new();

        out.push(format!(
            "Document {}  (run {}, knowledge base v{}, provider {}{})",
            report.document_id,
            report.run_id,
            report.knowledge_base_version,
            report.provider,
            if report.cached { ", cached" } else { "" }
        ));
        out.push(self.overall_line(report));
        out.push(String::new());

        if report.frameworks.is_empty() {
            out.push(self.warning("No framework applies to this document."));
            return out.join("\n");
        }

        let mut frameworks = Builder::default();
        frameworks.push_record(["Framework", "Confidence", "Level", "Composite", "Scored"]);
        for framework in &report.frameworks {
            let composite = report
                .framework_composites
                .iter()
                .find(|c| c.framework_id == framework.framework_id);
            frameworks.push_record([
                framework.framework_id.to_string(),
                format!("{:.2}", framework.confidence),
                framework.level().as_str().to_string(),
                composite
                    .and_then(|c| c.composite)
                    .map_or_else(|| "-".to_string(), |v| format!("{:.2}", v)),
                composite.map_or_else(String::new, |c| {
                    format!("{}/{}", c.scored_dimensions, c.total_dimensions)
                }),
            ]);
        }
        out.push(table(frameworks));

        let mut dimensions = Builder::default();
        dimensions.push_record(["Framework", "Dimension", "Weight", "Score", "Confidence", "Articles", "Conflict"]);
        for record in &report.records {
            let score = match record.score {
                DimensionScore::Scored { value } => format!("{:.2}", value),
                DimensionScore::InsufficientEvidence => "insufficient evidence".to_string(),
            };
            dimensions.push_record([
                record.framework_id.to_string(),
                record.dimension_name.clone(),
                format!("{:.3}", record.resolved_weight),
                score,
                format!("{:.2}", record.confidence),
                format!("{}/{}", record.matched_articles, record.required_articles),
                if record.conflict { "yes" } else { "" }.to_string(),
            ]);
        }
        out.push(table(dimensions));

        let mut clauses = Builder::default();
        clauses.push_record(["Clause", "Article", "Similarity", "Kind", "Note"]);
        for clause_match in &report.clause_matches {
            let degraded = report.degraded_clauses.contains(clause_match.clause_id());
            match clause_match {
                ClauseMatch::Matched { clause_id, evidence } => {
                    for (i, e) in evidence.iter().enumerate() {
                        let mut note = Vec::new();
                        if let Some(precedent) = &e.precedent {
                            note.push(format!("via {}", precedent));
                        }
                        if e.degraded {
                            note.push("keywords only".to_string());
                        }
                        clauses.push_record([
                            if i == 0 { clause_id.to_string() } else { String::new() },
                            e.article_id.to_string(),
                            format!("{:.3}", e.similarity),
                            e.kind.as_str().to_string(),
                            note.join(", "),
                        ]);
                    }
                }
                ClauseMatch::Unmatched(u) => {
                    let best = match (&u.best_article, u.best_score) {
                        (Some(article), Some(score)) => format!("best {} at {:.3}", article, score),
                        _ => "no candidates".to_string(),
                    };
                    clauses.push_record([
                        u.clause_id.to_string(),
                        "-".to_string(),
                        "-".to_string(),
                        "unmatched".to_string(),
                        if degraded { format!("{}, keywords only", best) } else { best },
                    ]);
                }
            }
        }
        out.push(table(clauses));

        for conflict in &report.conflicts {
            out.push(self.warning(&format!(
                "Clause {} matches conflicting Articles {} and {}",
                conflict.clause_id, conflict.first, conflict.second
            )));
        }
        if !report.degraded_clauses.is_empty() {
            let ids: Vec<String> = report.degraded_clauses.iter().map(|c| c.to_string()).collect();
            out.push(self.warning(&format!("Embedding unavailable for: {}", ids.join(", "))));
        }

        if explain {
            out.push(String::new());
            let mut contributions = Builder::default();
            contributions.push_record(["Framework", "Dimension", "Weight", "Score", "Share"]);
            for c in report.contributions() {
                contributions.push_record([
                    c.framework_id.to_string(),
                    c.dimension_id.to_string(),
                    format!("{:.3}", c.weight),
                    format!("{:.3}", c.score),
                    format!("{:.1}%", c.share * 100.0),
                ]);
            }
            out.push(table(contributions));
        }

        out.join("\n")
    }

    fn overall_line(&self, report: &AnalysisReport) -> String {
        match (report.overall, report.compliance_level(), report.risk_level()) {
            (Some(overall), Some(level), Some(risk)) => {
                let text = format!(
                    "Overall {:.2}: {} compliance, {} risk",
                    overall,
                    level.as_str().replace('_', " "),
                    risk.as_str().replace('_', " ")
                );
                let color = match level {
                    ComplianceLevel::Excellent | ComplianceLevel::Good => "green",
                    ComplianceLevel::Satisfactory => "cyan",
                    ComplianceLevel::NeedsImprovement => "yellow",
                    ComplianceLevel::Poor => "red",
                };
                self.colorize(&text, color)
            }
            _ => self.colorize("Overall: insufficient evidence", "yellow"),
        }
    }

    /// Format classifier output.
    pub fn format_classification(&self, matches: &[FrameworkMatch]) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(matches)?);
        }
        if matches.is_empty() {
            return Ok(self.colorize("No framework applies.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["Framework", "Confidence", "Level", "Indicators", "Keywords", "Citations"]);
        for m in matches {
            let s = &m.signals;
            builder.push_record([
                m.framework_id.to_string(),
                format!("{:.3}", m.confidence),
                m.level().as_str().to_string(),
                format!("{}/{}", s.indicator_hits, s.indicator_total),
                format!("{}/{}", s.keyword_hits, s.keyword_total),
                format!("{}/{}", s.citation_hits, s.citation_total),
            ]);
        }
        Ok(table(builder))
    }

    /// Format knowledge-base statistics.
    pub fn format_stats(&self, stats: &GraphStats) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(stats)?);
        }

        let mut builder = Builder::default();
        builder.push_record(["Item", "Count"]);
        for (item, count) in [
            ("Frameworks", stats.frameworks),
            ("Articles", stats.articles),
            ("Articles with vectors", stats.articles_with_vectors),
            ("Precedents", stats.precedents),
            ("Concepts", stats.concepts),
            ("references", stats.references),
            ("amends", stats.amends),
            ("conflicts_with", stats.conflicts),
        ] {
            builder.push_record([item.to_string(), count.to_string()]);
        }
        Ok(format!(
            "{}\n{}",
            self.success(&format!("Knowledge base v{} is valid", stats.version)),
            table(builder)
        ))
    }

    /// Format traversal results.
    pub fn format_neighbors(&self, neighbors: &[Neighbor<'_>]) -> Result<String> {
        if self.format == OutputFormat::Json {
            let values: Vec<serde_json::Value> = neighbors
                .iter()
                .map(|n| {
                    serde_json::json!({
                        "article": n.article.id,
                        "framework": n.article.framework,
                        "depth": n.depth,
                        "path": n.relation_path,
                    })
                })
                .collect();
            return Ok(serde_json::to_string_pretty(&values)?);
        }
        if neighbors.is_empty() {
            return Ok(self.colorize("No related Articles.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["Article", "Depth", "Path", "Title"]);
        for n in neighbors {
            let path: Vec<&str> = n.relation_path.iter().map(|r| r.as_str()).collect();
            builder.push_record([
                n.article.id.to_string(),
                n.depth.to_string(),
                path.join(" > "),
                n.article.title.clone(),
            ]);
        }
        Ok(table(builder))
    }

    /// Format search results; `score` is present for similarity search.
    pub fn format_articles(&self, articles: &[(&Article, Option<f64>)]) -> Result<String> {
        if self.format == OutputFormat::Json {
            let values: Vec<serde_json::Value> = articles
                .iter()
                .map(|(a, score)| {
                    serde_json::json!({
                        "article": a.id,
                        "framework": a.framework,
                        "reference": a.reference,
                        "title": a.title,
                        "score": score,
                    })
                })
                .collect();
            return Ok(serde_json::to_string_pretty(&values)?);
        }
        if articles.is_empty() {
            return Ok(self.colorize("No Articles found.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["Article", "Framework", "Reference", "Title", "Score"]);
        for (a, score) in articles {
            builder.push_record([
                a.id.to_string(),
                a.framework.to_string(),
                a.reference.clone(),
                a.title.clone(),
                score.map_or_else(String::new, |s| format!("{:.3}", s)),
            ]);
        }
        Ok(table(builder))
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn table(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nyaya_domain::{MatchEvidence, MatchKind, RelationType, RunId, ScoreRecord, UnmatchedClause};

    fn report() -> AnalysisReport {
        let evidence = MatchEvidence {
            clause_id: "c1".into(),
            article_id: "p1".into(),
            similarity: 0.86,
            keyword_overlap: 1.0,
            semantic: Some(0.77),
            kind: MatchKind::Semantic,
            precedent: None,
            precedent_strength: None,
            degraded: false,
            proximity: None,
        };
        AnalysisReport {
            run_id: RunId::new(),
            document_id: "policy".into(),
            knowledge_base_version: 1,
            provider: "lexical".to_string(),
            frameworks: vec![FrameworkMatch::new("privacy", 0.7)],
            records: vec![ScoreRecord {
                framework_id: "privacy".into(),
                dimension_id: "consent".into(),
                dimension_name: "Consent".to_string(),
                base_weight: 1.0,
                resolved_weight: 1.0,
                evidence: vec![evidence.clone()],
                score: DimensionScore::Scored { value: 0.86 },
                confidence: 1.0,
                matched_articles: 1,
                required_articles: 1,
                conflict: false,
            }],
            framework_composites: vec![],
            overall: Some(0.86),
            clause_matches: vec![
                ClauseMatch::Matched {
                    clause_id: "c1".into(),
                    evidence: vec![evidence],
                },
                ClauseMatch::Unmatched(UnmatchedClause {
                    clause_id: "c2".into(),
                    best_article: Some("p1".into()),
                    best_score: Some(0.12),
                }),
            ],
            degraded_clauses: vec!["c2".into()],
            conflicts: vec![],
            cached: false,
        }
    }

    #[test]
    fn test_report_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_report(&report(), true).unwrap();
        assert!(output.contains("Overall 0.86: good compliance, low risk"));
        assert!(output.contains("Consent"));
        assert!(output.contains("best p1 at 0.120, keywords only"));
        assert!(output.contains("Embedding unavailable for: c2"));
        assert!(output.contains("100.0%"));
    }

    #[test]
    fn test_report_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_report(&report(), false).unwrap();
        let parsed: AnalysisReport = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.overall, Some(0.86));
    }

    #[test]
    fn test_insufficient_evidence_overall() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let mut report = report();
        report.overall = None;
        let output = formatter.format_report(&report, false).unwrap();
        assert!(output.contains("Overall: insufficient evidence"));
    }

    #[test]
    fn test_neighbors_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let article = Article::new("article_14", "constitutional", "equality before law");
        let neighbors = vec![Neighbor {
            article: &article,
            depth: 1,
            relation_path: vec![RelationType::References],
        }];
        let output = formatter.format_neighbors(&neighbors).unwrap();
        assert!(output.contains("\"article_14\""));
        assert!(output.contains("\"references\""));
    }

    #[test]
    fn test_empty_results() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert!(formatter.format_articles(&[]).unwrap().contains("No Articles found"));
        assert!(formatter.format_classification(&[]).unwrap().contains("No framework applies"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.error("test"), "✗ test");
    }
}
