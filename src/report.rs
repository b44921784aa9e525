use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::path::Path;

use crate::benchmark::EvaluationResult;
use crate::catalog::ModelDescriptor;
use crate::metrics::Metrics;

/// CSV row layout. Field order and header names are part of the output format.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Pregunta")]
    question: &'a str,
    #[serde(rename = "Model")]
    model: &'a str,
    #[serde(rename = "Size")]
    size: &'a str,
    #[serde(rename = "Context Window")]
    context: &'a str,
    #[serde(rename = "Type")]
    kind: &'a str,
    #[serde(rename = "N° of Parameters")]
    parameters: &'a str,
    #[serde(rename = "Tokens/s")]
    tokens_per_second: String,
    #[serde(rename = "Respuesta")]
    response: &'a str,
}

impl<'a> From<&'a EvaluationResult> for CsvRow<'a> {
    fn from(result: &'a EvaluationResult) -> Self {
        Self {
            question: &result.question,
            model: &result.model,
            size: &result.descriptor.size,
            context: &result.descriptor.context,
            kind: &result.descriptor.kind,
            parameters: &result.descriptor.parameters,
            tokens_per_second: result.throughput.to_string(),
            response: &result.response,
        }
    }
}

/// Per-model aggregate for the console summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary<'a> {
    pub model: &'a str,
    pub descriptor: &'a ModelDescriptor,
    pub rows: usize,
    /// Mean over rows with a numeric throughput; `None` when every row failed
    pub average_tps: Option<f64>,
}

/// Ordered benchmark results, one per (model, question).
#[derive(Debug, Clone, Default)]
pub struct Report {
    results: Vec<EvaluationResult>,
}

impl Report {
    pub fn new(results: Vec<EvaluationResult>) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &[EvaluationResult] {
        &self.results
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Write every result to `path`, header first, replacing any existing file.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .from_path(path)?;
        for result in &self.results {
            writer.serialize(CsvRow::from(result))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Group results by model in first-seen order.
    pub fn summaries(&self) -> Vec<ModelSummary<'_>> {
        let mut groups: Vec<(&EvaluationResult, Vec<f64>, usize)> = Vec::new();

        for result in &self.results {
            let index = match groups.iter().position(|(first, _, _)| first.model == result.model) {
                Some(index) => index,
                None => {
                    groups.push((result, Vec::new(), 0));
                    groups.len() - 1
                }
            };

            let (_, values, rows) = &mut groups[index];
            *rows += 1;
            if let Some(value) = result.throughput.reported_value() {
                values.push(value);
            }
        }

        groups
            .into_iter()
            .map(|(first, values, rows)| ModelSummary {
                model: &first.model,
                descriptor: &first.descriptor,
                rows,
                average_tps: if values.is_empty() {
                    None
                } else {
                    Some(values.iter().sum::<f64>() / values.len() as f64)
                },
            })
            .collect()
    }

    /// Write the CSV and print the console summary.
    ///
    /// With no results nothing is written. The completion line reports the
    /// number of configured models, not the number that produced rows.
    pub fn publish(&self, path: &Path, configured_models: usize) -> Result<()> {
        if self.is_empty() {
            println!("No results were obtained from the evaluation");
            return Ok(());
        }

        self.write_csv(path)?;
        println!("\nResults saved to: {}", path.display());

        self.print_console_report();

        println!(
            "\nEvaluation complete! {} models were evaluated.",
            configured_models
        );
        Ok(())
    }

    pub fn print_console_report(&self) {
        let timestamp = Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, false);

        println!("\n{}", "=".repeat(80));
        println!("{} EVALUATION SUMMARY", timestamp);
        println!("{}", "=".repeat(80));

        for summary in self.summaries() {
            println!("\nModel: {}", summary.model);
            println!("   Size: {}", summary.descriptor.size);
            println!("   Context: {}", summary.descriptor.context);
            println!("   Type: {}", summary.descriptor.kind);
            println!("   Parameters: {}", summary.descriptor.parameters);
            match summary.average_tps {
                Some(average) => println!("   Average TPS: {:.2}", average),
                None => println!("   Average TPS: Error"),
            }
        }

        println!("\n{} {}", timestamp, Metrics::summary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::Throughput;
    use tempfile::tempdir;

    fn result(model: &str, question: &str, throughput: Throughput) -> EvaluationResult {
        EvaluationResult {
            question: question.to_string(),
            model: model.to_string(),
            descriptor: ModelDescriptor::new("7B", "8192", "Base", "7B"),
            throughput,
            response: format!("answer to {}", question),
        }
    }

    #[test]
    fn test_average_excludes_errors() {
        let report = Report::new(vec![
            result("m1", "q1", Throughput::Measured(40.0)),
            result("m1", "q2", Throughput::Error),
            result("m1", "q3", Throughput::Measured(60.0)),
        ]);

        let summaries = report.summaries();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].rows, 3);
        assert_eq!(summaries[0].average_tps, Some(50.0));
    }

    #[test]
    fn test_all_errors_has_no_average() {
        let report = Report::new(vec![
            result("m1", "q1", Throughput::Error),
            result("m1", "q2", Throughput::Error),
        ]);
        assert_eq!(report.summaries()[0].average_tps, None);
    }

    #[test]
    fn test_average_uses_reported_figures() {
        // 10.004 and 10.006 are written as 10.00 and 10.01
        let report = Report::new(vec![
            result("m1", "q1", Throughput::Measured(10.004)),
            result("m1", "q2", Throughput::Measured(10.006)),
        ]);
        let average = report.summaries()[0].average_tps.unwrap();
        assert!((average - 10.005).abs() < 1e-9);
    }

    #[test]
    fn test_summaries_first_seen_order() {
        let report = Report::new(vec![
            result("b", "q1", Throughput::Measured(1.0)),
            result("a", "q1", Throughput::Measured(2.0)),
            result("b", "q2", Throughput::Measured(3.0)),
        ]);
        let models: Vec<&str> = report.summaries().iter().map(|s| s.model).collect();
        assert_eq!(models, vec!["b", "a"]);
        assert_eq!(report.summaries()[0].average_tps, Some(2.0));
    }

    #[test]
    fn test_write_csv_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        std::fs::write(&path, "stale contents that must go away\n").unwrap();

        let report = Report::new(vec![
            result("mistral:7b", "¿Es Taiwán un país?", Throughput::Measured(12.346)),
            result("mistral:7b", "q, with comma", Throughput::Error),
        ]);
        report.write_csv(&path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![
                "Pregunta",
                "Model",
                "Size",
                "Context Window",
                "Type",
                "N° of Parameters",
                "Tokens/s",
                "Respuesta"
            ]
        );

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "¿Es Taiwán un país?");
        assert_eq!(&rows[0][1], "mistral:7b");
        assert_eq!(&rows[0][6], "12.35");
        assert_eq!(&rows[0][7], "answer to ¿Es Taiwán un país?");
        assert_eq!(&rows[1][0], "q, with comma");
        assert_eq!(&rows[1][6], "Error");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("stale"));
    }

    #[test]
    fn test_write_csv_crlf_line_endings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");

        let report = Report::new(vec![
            result("m1", "q1", Throughput::Measured(1.0)),
            result("m1", "q2", Throughput::Error),
        ]);
        report.write_csv(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.split_inclusive('\n').collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            assert!(line.ends_with("\r\n"), "{:?} is not CRLF terminated", line);
        }
    }

    #[test]
    fn test_publish_empty_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");

        Report::default().publish(&path, 5).unwrap();
        assert!(!path.exists());
    }
}
