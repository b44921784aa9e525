use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "llm-eval")]
#[command(author, version, about = "Measure tokens per second of locally hosted LLMs", long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file (built-in models and questions when omitted)
    pub config: Option<PathBuf>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments() {
        let cli = Cli::try_parse_from(["llm-eval"]).unwrap();
        assert!(cli.config.is_none());
        assert!(!cli.yes);
    }

    #[test]
    fn test_config_and_yes() {
        let cli = Cli::try_parse_from(["llm-eval", "bench.toml", "-y"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("bench.toml")));
        assert!(cli.yes);
    }
}
