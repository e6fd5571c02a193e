//! Special commands parser for the interactive diagnostic chat
//!
//! Commands are prefixed with `/` and are case-insensitive. Anything else
//! typed at the prompt is treated as an answer to the current prompt.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during the chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Display help information
    Help,

    /// Display session id, step and transcript size
    ShowStatus,

    /// Discard the conversation and start a new session
    Reset,

    /// Redo the conversation from a diagnostic turn
    Rewind(u32),

    /// Switch from the current choices to free text input
    FreeInput,

    /// List the service's reasoning providers
    ListProviders,

    /// Make a reasoning provider the active one
    UseProvider(String),

    /// Exit the interactive session
    Exit,

    /// Not a special command
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` for an unrecognised `/command`,
/// `CommandError::MissingArgument` when `/rewind` or `/provider` has no
/// argument, and `CommandError::UnsupportedArgument` when the `/rewind`
/// argument is not a turn number.
///
/// # Examples
///
/// ```
/// use diagchat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/rewind 2").unwrap(), SpecialCommand::Rewind(2));
/// assert_eq!(parse_special_command("ブレーキが鳴る").unwrap(), SpecialCommand::None);
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

    match (command.as_str(), arg) {
        ("/help" | "/?", _) => Ok(SpecialCommand::Help),
        ("/status", _) => Ok(SpecialCommand::ShowStatus),
        ("/reset" | "/new", _) => Ok(SpecialCommand::Reset),
        ("/free", _) => Ok(SpecialCommand::FreeInput),
        ("/providers", _) => Ok(SpecialCommand::ListProviders),
        ("exit" | "quit" | "/exit" | "/quit", _) => Ok(SpecialCommand::Exit),

        ("/rewind", None) => Err(CommandError::MissingArgument {
            command: "/rewind".to_string(),
            usage: "/rewind <turn>".to_string(),
        }),
        ("/rewind", Some(arg)) => {
            arg.parse()
                .map(SpecialCommand::Rewind)
                .map_err(|_| CommandError::UnsupportedArgument {
                    command: "/rewind".to_string(),
                    arg: arg.to_string(),
                })
        }

        ("/provider", None) => Err(CommandError::MissingArgument {
            command: "/provider".to_string(),
            usage: "/provider <name>".to_string(),
        }),
        ("/provider", Some(name)) => Ok(SpecialCommand::UseProvider(name.to_string())),

        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print help for the interactive chat
pub fn print_help() {
    println!(
        r#"
Diagnostic Chat Commands
========================

ANSWERING:
  <number>          - Pick the numbered choice shown under the prompt
  <text>            - Answer in your own words (vehicle search at the vehicle step)
  y / n             - Send anyway / rewrite when a short answer is held for confirmation
  /free             - Switch from the choices to free text input

SESSION:
  /status           - Show session id, current step and transcript size
  /rewind <turn>    - Redo the diagnosis from the given question number
  /reset, /new      - Discard this conversation and start over

REASONING PROVIDERS:
  /providers        - List providers known to the service
  /provider <name>  - Make a configured provider the active one

OTHER:
  /help, /?         - Show this help message
  /exit, exit       - Leave the chat
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_text_is_none() {
        assert_eq!(
            parse_special_command("エンジンがかからない").unwrap(),
            SpecialCommand::None
        );
        assert_eq!(parse_special_command("3").unwrap(), SpecialCommand::None);
    }

    #[test]
    fn test_parse_help() {
        assert_eq!(parse_special_command("/help").unwrap(), SpecialCommand::Help);
        assert_eq!(parse_special_command("/?").unwrap(), SpecialCommand::Help);
    }

    #[test]
    fn test_parse_status_and_reset() {
        assert_eq!(
            parse_special_command("/status").unwrap(),
            SpecialCommand::ShowStatus
        );
        assert_eq!(parse_special_command("/reset").unwrap(), SpecialCommand::Reset);
        assert_eq!(parse_special_command("/new").unwrap(), SpecialCommand::Reset);
    }

    #[test]
    fn test_parse_exit_variants() {
        for input in ["exit", "quit", "/exit", "/QUIT", "  Exit  "] {
            assert_eq!(parse_special_command(input).unwrap(), SpecialCommand::Exit);
        }
    }

    #[test]
    fn test_parse_rewind() {
        assert_eq!(
            parse_special_command("/rewind  3 ").unwrap(),
            SpecialCommand::Rewind(3)
        );
    }

    #[test]
    fn test_parse_rewind_missing_argument() {
        assert!(matches!(
            parse_special_command("/rewind"),
            Err(CommandError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_parse_rewind_bad_argument() {
        assert_eq!(
            parse_special_command("/rewind two"),
            Err(CommandError::UnsupportedArgument {
                command: "/rewind".to_string(),
                arg: "two".to_string(),
            })
        );
        assert!(parse_special_command("/rewind -1").is_err());
    }

    #[test]
    fn test_parse_free_and_providers() {
        assert_eq!(
            parse_special_command("/free").unwrap(),
            SpecialCommand::FreeInput
        );
        assert_eq!(
            parse_special_command("/providers").unwrap(),
            SpecialCommand::ListProviders
        );
        assert_eq!(
            parse_special_command("/provider Claude").unwrap(),
            SpecialCommand::UseProvider("Claude".to_string())
        );
        assert_eq!(
            parse_special_command("/PROVIDER gpt-4o-Mini").unwrap(),
            SpecialCommand::UseProvider("gpt-4o-Mini".to_string())
        );
        assert!(matches!(
            parse_special_command("/provider"),
            Err(CommandError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_parse_unknown_command() {
        let err = parse_special_command("/mode write").unwrap_err();
        assert_eq!(err, CommandError::UnknownCommand("/mode write".to_string()));
        assert!(err.to_string().contains("/help"));
    }
}
