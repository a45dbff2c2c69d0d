//! Command-line argument parsing
//!
//! Flags override nothing in the config file directly; they pick the identity
//! to log in with and what to do once a session exists.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Nakama client tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    ///
    /// TOML file with the server address and keys. A default one is written
    /// when the file does not exist.
    #[arg(short, long, default_value = "nakama.toml")]
    pub config: PathBuf,

    /// Device id to authenticate with. A random one is generated when omitted.
    #[arg(long)]
    pub device_id: Option<String>,

    /// Username to claim when the account is created
    #[arg(short, long)]
    pub username: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Open a realtime socket and join a chat room after logging in
    #[arg(short, long)]
    pub realtime: bool,

    /// Chat room joined with `--realtime`
    #[arg(long, default_value = "lobby")]
    pub room: String,

    /// Message written to the room once joined
    #[arg(short, long)]
    pub message: Option<String>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            config: PathBuf::from("nakama.toml"),
            device_id: None,
            username: None,
            debug: false,
            json_logs: false,
            realtime: false,
            room: "lobby".to_string(),
            message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_default() {
        let args = Args::default();
        assert_eq!(args.config, PathBuf::from("nakama.toml"));
        assert!(!args.debug);
        assert!(!args.realtime);
        assert!(args.device_id.is_none());
        assert_eq!(args.room, "lobby");
    }

    #[test]
    fn test_args_parse_realtime_flags() {
        let args = Args::parse_from(["nakama_cli", "--realtime", "--room", "general", "-m", "{\"text\":\"hi\"}"]);
        assert!(args.realtime);
        assert_eq!(args.room, "general");
        assert_eq!(args.message.as_deref(), Some("{\"text\":\"hi\"}"));
        assert_eq!(args.config, PathBuf::from("nakama.toml"));
    }
}
