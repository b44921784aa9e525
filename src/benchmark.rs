use anyhow::Result;
use log::{debug, error, info, warn};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;

use crate::catalog::ModelDescriptor;
use crate::client::{ClientConfig, ClientError, GenerateResponse, OllamaClient};
use crate::config::Config;
use crate::confirm::Confirm;
use crate::metrics::{ErrorType, Metrics, RequestStatus};
use crate::report::Report;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Tokens per second for one generation.
///
/// The server-reported `eval_duration` (nanoseconds) is preferred. When it is
/// zero the wall-clock `elapsed` time of the whole request is used instead. A
/// zero duration from both sources yields 0.
pub fn tokens_per_second(eval_count: u64, eval_duration: u64, elapsed: Duration) -> f64 {
    let seconds = if eval_duration > 0 {
        eval_duration as f64 / NANOS_PER_SEC
    } else {
        elapsed.as_secs_f64()
    };

    if seconds > 0.0 {
        eval_count as f64 / seconds
    } else {
        0.0
    }
}

/// Outcome of a single (model, prompt) generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub success: bool,
    pub tokens_per_second: f64,
    /// Tokens generated, as reported by the server
    pub eval_count: u64,
    /// Generation time in nanoseconds, as reported by the server
    pub eval_duration: u64,
    pub response: String,
}

impl Measurement {
    pub fn failed() -> Self {
        Self {
            success: false,
            tokens_per_second: 0.0,
            eval_count: 0,
            eval_duration: 0,
            response: String::new(),
        }
    }

    /// A reply whose `response` was an explicit null is stored as empty text.
    pub fn from_response(response: GenerateResponse, elapsed: Duration) -> Self {
        Self {
            success: true,
            tokens_per_second: tokens_per_second(
                response.eval_count,
                response.eval_duration,
                elapsed,
            ),
            eval_count: response.eval_count,
            eval_duration: response.eval_duration,
            response: response.response.unwrap_or_default(),
        }
    }

    pub fn throughput(&self) -> Throughput {
        if self.success {
            Throughput::Measured(self.tokens_per_second)
        } else {
            Throughput::Error
        }
    }
}

/// Issue one generation request and measure its throughput.
///
/// Never fails: transport errors, timeouts, non-OK status and malformed
/// payloads all come back as [`Measurement::failed`].
pub async fn measure(client: &OllamaClient, model: &str, prompt: &str) -> Measurement {
    Metrics::record_request_sent();

    let start = Instant::now();
    let body = client.generate(model, prompt).await;
    let elapsed = start.elapsed();

    match body.and_then(|bytes| GenerateResponse::from_slice(&bytes)) {
        Ok(response) => {
            let measurement = Measurement::from_response(response, elapsed);
            Metrics::record_output_tokens(measurement.eval_count);
            Metrics::record_request_complete(RequestStatus::Success);
            debug!(
                "{}: {} tokens, eval_duration {}ns, wall {:.3}s, {:.2} tok/s",
                model,
                measurement.eval_count,
                measurement.eval_duration,
                elapsed.as_secs_f64(),
                measurement.tokens_per_second
            );
            measurement
        }
        Err(e) => {
            let error_type = match &e {
                ClientError::Connection(_) => ErrorType::Connection,
                ClientError::Timeout(_) => ErrorType::Timeout,
                ClientError::Http { .. } => ErrorType::Http,
                ClientError::Parse(_) => ErrorType::Parse,
                ClientError::Other(_) => ErrorType::Other,
            };
            Metrics::record_request_complete(RequestStatus::Failed(error_type));
            error!("Error with {}: {}", model, e);
            Measurement::failed()
        }
    }
}

/// The tokens-per-second field of a result row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Throughput {
    Measured(f64),
    Error,
}

impl Throughput {
    /// The figure as written to the report, parsed back as a number.
    ///
    /// Averages are taken over these two-decimal values so that the console
    /// summary agrees with the CSV.
    pub fn reported_value(&self) -> Option<f64> {
        self.to_string().parse().ok()
    }
}

impl fmt::Display for Throughput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Throughput::Measured(tps) => write!(f, "{:.2}", tps),
            Throughput::Error => write!(f, "Error"),
        }
    }
}

/// One row of the benchmark output.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub question: String,
    pub model: String,
    pub descriptor: ModelDescriptor,
    pub throughput: Throughput,
    pub response: String,
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// The server did not answer the availability check; nothing else was done.
    Unavailable,
    /// The operator declined to continue; nothing was written.
    Declined,
    Completed(Report),
}

/// Sequential benchmark over every configured model and question.
///
/// Models are visited in declaration order and, for each model with a
/// descriptor, questions in declaration order. Exactly one request is in
/// flight at any time.
///
/// # Examples
///
/// ```no_run
/// use llm_eval::{BenchmarkRunner, Config};
/// use llm_eval::confirm::StdinConfirm;
///
/// # fn example() -> anyhow::Result<()> {
/// let runtime = tokio::runtime::Builder::new_current_thread()
///     .enable_all()
///     .build()?;
/// let runner = BenchmarkRunner::new(Config::load(None)?)?;
/// runner.run(&runtime, &mut StdinConfirm)?;
/// # Ok(())
/// # }
/// ```
pub struct BenchmarkRunner {
    client: OllamaClient,
    config: Config,
}

impl BenchmarkRunner {
    pub fn new(config: Config) -> Result<Self> {
        let client = OllamaClient::new(ClientConfig {
            base_url: config.endpoint.base_url.clone(),
            timeout: Duration::from_secs(config.endpoint.timeout),
            health_check_timeout: Duration::from_secs(config.endpoint.health_check_timeout),
        })?;

        Ok(Self { client, config })
    }

    /// Check the server, confirm, evaluate and publish the report.
    ///
    /// Only a CSV write failure is returned as an error. An unreachable server
    /// or a declined confirmation end the run early without touching the
    /// output file. The confirmation is asked outside of `runtime`.
    pub fn run(&self, runtime: &Runtime, confirm: &mut dyn Confirm) -> Result<RunOutcome> {
        if !runtime.block_on(self.check_server()) {
            return Ok(RunOutcome::Unavailable);
        }

        if !self.confirm(confirm) {
            return Ok(RunOutcome::Declined);
        }

        let report = runtime.block_on(self.execute())?;
        Ok(RunOutcome::Completed(report))
    }

    /// Returns false, after telling the operator how to start the server,
    /// when the availability check fails.
    pub async fn check_server(&self) -> bool {
        if !self.client.is_available().await {
            println!(
                "Cannot reach the inference server at {}",
                self.client.base_url()
            );
            println!("   Make sure Ollama is running: ollama serve");
            return false;
        }
        println!("Inference server is up");
        true
    }

    /// Show the run's size and ask whether to go ahead.
    pub fn confirm(&self, confirm: &mut dyn Confirm) -> bool {
        println!("\nConfiguration:");
        println!("   Models to evaluate: {}", self.config.benchmark.models.len());
        println!("   Questions: {}", self.config.benchmark.questions.len());

        if !confirm.confirm("Continue with the evaluation?") {
            println!("Evaluation cancelled");
            return false;
        }
        true
    }

    /// Evaluate every pair and publish the report.
    pub async fn execute(&self) -> Result<Report> {
        println!("\nStarting evaluation...");
        println!("{}", "=".repeat(80));

        let report = Report::new(self.evaluate().await);
        report.publish(&self.config.output.file, self.config.benchmark.models.len())?;
        Ok(report)
    }

    /// Run every (model, question) pair and collect the results in order.
    ///
    /// Models without a descriptor are skipped entirely. Failed requests are
    /// kept as rows with [`Throughput::Error`].
    pub async fn evaluate(&self) -> Vec<EvaluationResult> {
        let models = &self.config.benchmark.models;
        let questions = &self.config.benchmark.questions;
        let mut results = Vec::with_capacity(models.len() * questions.len());

        for (i, model) in models.iter().enumerate() {
            println!("\nModel {}/{}: {}", i + 1, models.len(), model);

            let Some(descriptor) = self.config.descriptors.get(model) else {
                println!("  No descriptor available for {}, skipping", model);
                warn!("Model {} has no descriptor and was skipped", model);
                Metrics::record_model_skipped();
                continue;
            };

            for (j, question) in questions.iter().enumerate() {
                let preview: String = question.chars().take(50).collect();
                println!("  Question {}: {}...", j + 1, preview);

                let measurement = measure(&self.client, model, question).await;

                if measurement.success {
                    println!("    Success - TPS: {:.2}", measurement.tokens_per_second);
                } else {
                    println!("    Error");
                }

                results.push(EvaluationResult {
                    question: question.clone(),
                    model: model.clone(),
                    descriptor: descriptor.clone(),
                    throughput: measurement.throughput(),
                    response: measurement.response,
                });
            }
        }

        info!(
            "Collected {} results from {} configured models",
            results.len(),
            models.len()
        );

        results
    }
}
