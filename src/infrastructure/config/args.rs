use super::app_config::LogLevel;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "headcord",
    version,
    about = "A headless Discord gateway client for the terminal",
    long_about = None
)]
pub struct CliArgs {
    /// Account token. Read from `DISCORD_TOKEN` when omitted.
    #[arg(value_name = "TOKEN", env = "DISCORD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Account token, as a flag. Takes precedence over the positional form.
    #[arg(long = "token", value_name = "TOKEN")]
    pub token_flag: Option<String>,

    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,
}

impl CliArgs {
    /// The credential from whichever source supplied it.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token_flag
            .as_deref()
            .or(self.token.as_deref())
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_token() {
        let args = CliArgs::try_parse_from(["headcord", "abc.def"]).unwrap();
        assert_eq!(args.token(), Some("abc.def"));
        assert!(args.config.is_none());
    }

    #[test]
    fn test_token_flag_and_options() {
        let args = CliArgs::try_parse_from([
            "headcord",
            "--token",
            " secret ",
            "--log-level",
            "debug",
            "-c",
            "/tmp/headcord.toml",
        ])
        .unwrap();

        assert_eq!(args.token(), Some("secret"));
        assert_eq!(args.log_level, Some(LogLevel::Debug));
        assert_eq!(args.config, Some(PathBuf::from("/tmp/headcord.toml")));
    }

    #[test]
    fn test_blank_token_is_absent() {
        let args = CliArgs::try_parse_from(["headcord", "--token", "  "]).unwrap();
        assert_eq!(args.token(), None);
    }
}
