//! Line-oriented input for the terminal front end.

use parley_core::{Region, UiCommand};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("{0} needs an argument")]
    MissingArgument(&'static str),
    #[error("unknown command {0}, try /help")]
    Unknown(String),
}

pub const HELP: &str = "\
/peer <id>      open the conversation with <id>
/reload         fetch the thread again
/emoji <symbol> insert <symbol> into the draft
/picker         show or hide the emoji picker
/menu [<id>]    open the action menu for your message <id>, or close it
/delete         delete the message the menu is open for
/close          leave the conversation
/dismiss        hide the last error
/quit           exit
anything else is sent as a message";

/// Translate one input line into view commands.
///
/// Plain text counts as a click in the composer, so it also closes an open
/// emoji picker before being sent.
pub fn parse_line(line: &str) -> Result<Vec<UiCommand>, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(Vec::new());
    }

    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return Ok(vec![
            UiCommand::Interaction(Region::Composer),
            UiCommand::SetDraft(line.to_string()),
            UiCommand::Send,
        ]);
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let commands = match name {
        "peer" => vec![UiCommand::SelectPeer(required(arg, "/peer")?.into())],
        "reload" => vec![UiCommand::Reload],
        "emoji" => vec![
            UiCommand::Interaction(Region::EmojiPicker),
            UiCommand::InsertEmoji(required(arg, "/emoji")?.to_string()),
        ],
        "picker" => vec![UiCommand::TogglePicker],
        "menu" if arg.is_empty() => vec![UiCommand::CloseMenu],
        "menu" => vec![
            UiCommand::Interaction(Region::MessageList),
            UiCommand::OpenMenu(arg.into()),
        ],
        "delete" => vec![UiCommand::DeleteSelected],
        "close" => vec![UiCommand::Close],
        "dismiss" => vec![UiCommand::DismissNotice],
        "quit" | "exit" => vec![UiCommand::Shutdown],
        "help" => Vec::new(),
        other => return Err(ParseError::Unknown(format!("/{other}"))),
    };
    Ok(commands)
}

fn required<'a>(arg: &'a str, command: &'static str) -> Result<&'a str, ParseError> {
    if arg.is_empty() {
        Err(ParseError::MissingArgument(command))
    } else {
        Ok(arg)
    }
}
