//! Slash commands understood by the interactive chat.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Model(String),
    Stream(bool),
    Reset,
    Save(Option<String>),
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("not a slash command: {0:?}")]
    NotCommand(String),

    #[error("/{0} does not accept arguments")]
    UnexpectedArgs(&'static str),

    #[error("usage: /model <model-id>")]
    ModelUsage,

    #[error("usage: /stream on|off")]
    StreamUsage,

    #[error("unknown command {0:?}. Use /help")]
    Unknown(String),
}

impl SlashCommand {
    /// Parse one line of input starting with `/`.
    ///
    /// Command names are case-insensitive; arguments keep their case except
    /// for `on`/`off`.
    pub fn parse(input: &str) -> Result<Self, CommandError> {
        let trimmed = input.trim();
        if !trimmed.starts_with('/') {
            return Err(CommandError::NotCommand(input.to_string()));
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let raw_name = fields[0];
        let args = &fields[1..];
        let name = raw_name.trim_start_matches('/').to_lowercase();

        let no_args = |command: Self, label: &'static str| {
            if args.is_empty() {
                Ok(command)
            } else {
                Err(CommandError::UnexpectedArgs(label))
            }
        };

        match name.as_str() {
            "help" => no_args(Self::Help, "help"),
            "reset" => no_args(Self::Reset, "reset"),
            "exit" => no_args(Self::Exit, "exit"),
            "model" => {
                if args.is_empty() {
                    Err(CommandError::ModelUsage)
                } else {
                    Ok(Self::Model(args.join(" ")))
                }
            }
            "stream" => match args {
                [value] => match value.to_lowercase().as_str() {
                    "on" => Ok(Self::Stream(true)),
                    "off" => Ok(Self::Stream(false)),
                    _ => Err(CommandError::StreamUsage),
                },
                _ => Err(CommandError::StreamUsage),
            },
            "save" => {
                if args.is_empty() {
                    Ok(Self::Save(None))
                } else {
                    Ok(Self::Save(Some(args.join(" "))))
                }
            }
            _ => Err(CommandError::Unknown(raw_name.to_string())),
        }
    }
}

pub fn help_text() -> &'static str {
    "Commands:\n\
     \x20 /help                Show available commands\n\
     \x20 /model <model-id>    Change model for next requests\n\
     \x20 /stream on|off       Toggle streaming mode\n\
     \x20 /reset               Reset conversation history (keeps system prompt)\n\
     \x20 /save [path]         Save transcript to JSON\n\
     \x20 /exit                Exit chat"
}
