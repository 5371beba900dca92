use crate::core::{Instance, Severity};
use crate::runner::{DetectorRegistry, ScanReport};
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;

/// Instances of one detector, with the catalog text shown above them.
#[derive(Debug, Clone, Serialize)]
pub struct DetectorSection {
    pub id: String,
    pub title: String,
    pub description: String,
    pub instances: Vec<Instance>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TierSection {
    pub severity: Severity,
    pub detectors: Vec<DetectorSection>,
}

/// Severity tier -> detector -> instances. Only detectors with at least
/// one instance appear, and only tiers with at least one detector.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub tiers: Vec<TierSection>,
}

pub struct ReportGenerator;

impl ReportGenerator {
    pub fn build(scan: &ScanReport, registry: &DetectorRegistry) -> Report {
        let mut grouped: BTreeMap<&str, Vec<Instance>> = BTreeMap::new();
        for instance in scan.instances() {
            grouped
                .entry(instance.detector_id.as_str())
                .or_default()
                .push(instance.clone());
        }

        let mut tiers = Vec::new();
        for severity in Severity::DESCENDING {
            let detectors: Vec<DetectorSection> = grouped
                .iter()
                .filter(|(_, instances)| instances[0].severity == severity)
                .map(|(id, instances)| {
                    let definition = registry.get(id);
                    DetectorSection {
                        id: id.to_string(),
                        title: definition
                            .as_ref()
                            .map_or_else(|| id.to_string(), |d| d.title().to_string()),
                        description: definition
                            .as_ref()
                            .map(|d| d.description().to_string())
                            .unwrap_or_default(),
                        instances: instances.clone(),
                    }
                })
                .collect();

            if !detectors.is_empty() {
                tiers.push(TierSection {
                    severity,
                    detectors,
                });
            }
        }

        Report { tiers }
    }
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn instance_count(&self) -> usize {
        self.tiers
            .iter()
            .flat_map(|tier| &tier.detectors)
            .map(|detector| detector.instances.len())
            .sum()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render the report as Markdown: a summary table per tier, then one
    /// section per detector. The output depends only on the instances, so
    /// the same scan always renders the same bytes.
    pub fn render_markdown(&self) -> String {
        let mut md = String::from("# Report\n");
        if self.is_empty() {
            return md;
        }

        md.push_str("\n## Summary\n\n");
        for tier in &self.tiers {
            md.push_str(&format!("### {} {} Issues\n\n", tier.severity.emoji(), tier.severity));
            md.push_str("| |Issue|Instances|\n|-|:-|:-:|\n");
            for (index, detector) in tier.detectors.iter().enumerate() {
                let anchor = anchor(tier.severity, index);
                md.push_str(&format!(
                    "| [{}](#{}) | {} | {} |\n",
                    anchor,
                    anchor,
                    detector.title,
                    detector.instances.len()
                ));
            }
            md.push('\n');
        }

        for tier in &self.tiers {
            md.push_str(&format!("## {} Issues\n\n", tier.severity));
            for (index, detector) in tier.detectors.iter().enumerate() {
                let anchor = anchor(tier.severity, index);
                md.push_str(&format!(
                    "### <a name=\"{}\"></a>[{}] {}\n",
                    anchor, anchor, detector.title
                ));
                if !detector.description.is_empty() {
                    md.push_str(&detector.description);
                    md.push('\n');
                }
                md.push_str(&format!("\n*Instances ({})*:\n", detector.instances.len()));
                render_instances(&mut md, &detector.instances);
            }
        }

        md
    }
}

fn anchor(severity: Severity, index: usize) -> String {
    format!("{}-{}", severity.code(), index + 1)
}

/// Instances arrive sorted by path then offset, so files come out as
/// contiguous runs.
fn render_instances(md: &mut String, instances: &[Instance]) {
    md.push_str("```solidity\n");

    let mut current: Option<&str> = None;
    for instance in instances {
        let path = instance.position.path.as_str();
        if current != Some(path) {
            if current.is_some() {
                md.push('\n');
            }
            md.push_str(&format!("File: {}\n\n", path));
            current = Some(path);
        }

        let mut line = format!("{}:{}:", instance.position.line, instance.position.column);
        if let Some(snippet) = &instance.snippet {
            line.push(' ');
            line.push_str(snippet);
        }
        if let Some(message) = &instance.message {
            line.push_str(" // ");
            line.push_str(message);
        }
        md.push_str(line.trim_end());
        md.push('\n');
    }

    md.push_str("```\n\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DetectorDefinition, Hit, Position};
    use crate::representations::SourceFile;

    fn nothing(_: &SourceFile) -> anyhow::Result<Vec<Hit>> {
        Ok(Vec::new())
    }

    fn instance(id: &str, severity: Severity, path: &str, line: usize, offset: usize) -> Instance {
        Instance {
            detector_id: id.to_string(),
            severity,
            position: Position {
                path: path.to_string(),
                line,
                column: 5,
            },
            offset,
            length: 1,
            message: None,
            snippet: Some("x = y / z;".to_string()),
        }
    }

    fn registry() -> DetectorRegistry {
        DetectorRegistry::new(vec![
            DetectorDefinition::structural("med", "Medium thing", "Explains it.", Severity::Medium, nothing),
            DetectorDefinition::structural("low-a", "First low", "", Severity::Low, nothing),
            DetectorDefinition::structural("low-b", "Second low", "", Severity::Low, nothing),
            DetectorDefinition::structural("quiet", "Never fires", "", Severity::High, nothing),
        ])
        .unwrap()
    }

    #[test]
    fn test_grouping_and_silence() {
        let scan = ScanReport::new(
            vec![
                instance("low-b", Severity::Low, "a.sol", 3, 40),
                instance("med", Severity::Medium, "b.sol", 1, 0),
                instance("low-a", Severity::Low, "a.sol", 2, 20),
                instance("med", Severity::Medium, "a.sol", 9, 90),
            ],
            Vec::new(),
        );
        let report = ReportGenerator::build(&scan, &registry());

        let tiers: Vec<Severity> = report.tiers.iter().map(|t| t.severity).collect();
        assert_eq!(tiers, vec![Severity::Medium, Severity::Low]);
        assert_eq!(report.tiers[1].detectors[0].id, "low-a");
        assert_eq!(report.instance_count(), 4);

        let md = report.render_markdown();
        assert!(md.contains("| [M-1](#M-1) | Medium thing | 2 |"));
        assert!(md.contains("| [L-2](#L-2) | Second low | 1 |"));
        assert!(md.contains("### <a name=\"M-1\"></a>[M-1] Medium thing\nExplains it.\n"));
        assert!(!md.contains("Never fires"));

        let a = md.find("File: a.sol").unwrap();
        let b = md.find("File: b.sol").unwrap();
        assert!(a < b);
        assert!(md.contains("9:5: x = y / z;\n"));
    }

    #[test]
    fn test_empty_scan_renders_only_the_heading() {
        let report = ReportGenerator::build(&ScanReport::new(Vec::new(), Vec::new()), &registry());
        assert!(report.is_empty());
        assert_eq!(report.render_markdown(), "# Report\n");
    }
}
