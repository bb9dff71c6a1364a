//! Command-line interface definition.

use clap::Parser;
use parley::DEFAULT_URL;

/// terminal-chat - one-to-one chat from your terminal
#[derive(Debug, Parser)]
#[command(name = "terminal-chat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// WebSocket URL of the chat server
    #[arg(long, env = "PARLEY_URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// Display name to register with (random `anon-` name if omitted)
    #[arg(long, short, env = "PARLEY_NAME")]
    pub name: Option<String>,

    /// Ask the server to reuse this id from an earlier connection
    #[arg(long)]
    pub user_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["terminal-chat"]).unwrap();
        assert_eq!(cli.user_id, None);
        // PARLEY_URL may be set in the environment running the tests.
        if std::env::var_os("PARLEY_URL").is_none() {
            assert_eq!(cli.url, DEFAULT_URL);
        }
    }

    #[test]
    fn test_cli_all_flags() {
        let cli = Cli::try_parse_from([
            "terminal-chat",
            "--url",
            "ws://chat.example:9000/ws",
            "-n",
            "Ada",
            "--user-id",
            "u-7",
        ])
        .unwrap();
        assert_eq!(cli.url, "ws://chat.example:9000/ws");
        assert_eq!(cli.name.as_deref(), Some("Ada"));
        assert_eq!(cli.user_id.as_deref(), Some("u-7"));
    }
}
