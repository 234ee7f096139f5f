//! `corral config` — Print the effective configuration.

use clap::Args;
use corral_common::config::CorralConfig;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Print compact JSON on a single line.
    #[arg(long)]
    pub compact: bool,
}

/// Executes the `config` command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be serialized.
pub fn execute(args: &ConfigArgs, config: &CorralConfig) -> anyhow::Result<()> {
    println!("{}", render(args, config)?);
    Ok(())
}

fn render(args: &ConfigArgs, config: &CorralConfig) -> anyhow::Result<String> {
    let rendered = if args.compact {
        serde_json::to_string(config)?
    } else {
        serde_json::to_string_pretty(config)?
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_output_is_one_line() {
        let args = ConfigArgs { compact: true };
        let rendered = render(&args, &CorralConfig::default()).expect("json");
        assert!(!rendered.contains('\n'));
        let parsed: CorralConfig = serde_json::from_str(&rendered).expect("parse");
        assert_eq!(parsed, CorralConfig::default());
    }

    #[test]
    fn pretty_output_shows_overrides() {
        let mut config = CorralConfig::default();
        config.monitor.cycles = 9;
        let rendered = render(&ConfigArgs { compact: false }, &config).expect("json");

        assert!(rendered.lines().count() > 1);
        assert!(rendered.contains("\"cycles\": 9"), "{rendered}");
    }

    #[test]
    fn execute_prints_without_error() {
        let args = ConfigArgs { compact: true };
        assert!(execute(&args, &CorralConfig::default()).is_ok());
    }
}
