use anyhow::Result;
use llm_eval::confirm::{AutoConfirm, Confirm, StdinConfirm};
use llm_eval::{BenchmarkRunner, Cli, Config, RunOutcome};
use log::{debug, info};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let config = Config::load(cli.config.as_deref())?;

    let _log_guard = llm_eval::logging::init(&config.log, config.output.trace_log.as_deref())?;

    if !config.output.quiet {
        println!("LLM Evaluation Tool");
        if let Some(ref path) = cli.config {
            println!("   Config: {}", path.display());
        }
        println!("   Target: {}", config.endpoint.base_url);
        println!("{}", "=".repeat(50));
    }

    // One request in flight at a time
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let mut confirm: Box<dyn Confirm> = if cli.yes {
        Box::new(AutoConfirm(true))
    } else {
        Box::new(StdinConfirm)
    };

    debug!("Initializing benchmark runner");
    let runner = BenchmarkRunner::new(config)?;
    let result = runner.run(&runtime, confirm.as_mut());

    match &result {
        Ok(RunOutcome::Completed(report)) => {
            info!("Run finished with {} results", report.results().len())
        }
        Ok(RunOutcome::Unavailable) => info!("Run aborted: server unavailable"),
        Ok(RunOutcome::Declined) => info!("Run aborted by operator"),
        Err(_) => {}
    }

    result.map(|_| ())
}
