//! Parses committed input lines into navigation commands or chat messages.

use std::num::IntErrorKind;

use super::style::{BOLD, CLIENT_COL, ITALICS, RESET, sanitize};
use crate::domain::entities::{Channel, ChannelId, ClientUser};
use crate::domain::errors::{IndexKind, ModelError};

const COMMAND_PREFIX: &str = "//";

pub const DEFAULT_HISTORY_LIMIT: u8 = 25;
pub const MAX_HISTORY_LIMIT: u8 = 100;

struct CommandHelp {
    names: &'static [&'static str],
    args: &'static [&'static str],
    text: &'static str,
}

const COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        names: &["help"],
        args: &[],
        text: "shows this list",
    },
    CommandHelp {
        names: &["lg", "list_g"],
        args: &[],
        text: "lists all known to user guilds",
    },
    CommandHelp {
        names: &["lc", "list_c"],
        args: &["guild"],
        text: "lists all channels in a guild",
    },
    CommandHelp {
        names: &["lpc", "list_pc"],
        args: &[],
        text: "lists all private channels (dms)",
    },
    CommandHelp {
        names: &["pc", "pick_c"],
        args: &["guild/channel", "channel"],
        text: "pick channel to focus on. Private channel is arg 1",
    },
    CommandHelp {
        names: &["h", "history"],
        args: &["count"],
        text: "loads recent messages of the focused channel",
    },
    CommandHelp {
        names: &["e", "exit"],
        args: &[],
        text: "close connection and exit",
    },
];

/// What the caller must do after a line is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Show a client notice.
    Log(String),
    SendChat { channel: ChannelId, text: String },
    FetchHistory { channel: ChannelId, limit: u8 },
    Exit,
}

/// Interprets one committed line. Navigation commands update the focus in
/// `client` directly; everything else is returned as an effect.
#[must_use]
pub fn interpret(line: &str, client: Option<&mut ClientUser>) -> Vec<Effect> {
    let line = line.trim_end();

    let Some(command) = line.strip_prefix(COMMAND_PREFIX) else {
        return chat(line, client.as_deref());
    };

    let mut words = command.split_whitespace();
    let Some(name) = words.next() else {
        return vec![unknown_command("")];
    };
    let args: Vec<&str> = words.collect();

    match name {
        "help" => help(),
        "e" | "exit" => vec![Effect::Exit],
        "lg" | "list_g" | "lc" | "list_c" | "lpc" | "list_pc" | "pc" | "pick_c" | "h"
        | "history" => {
            let Some(client) = client else {
                return log(ModelError::NotReady.to_string());
            };
            match name {
                "lg" | "list_g" => list_guilds(client),
                "lc" | "list_c" => list_channels(client, &args),
                "lpc" | "list_pc" => list_private_channels(client),
                "pc" | "pick_c" => pick_channel(client, &args),
                _ => history(client, &args),
            }
        }
        other => vec![unknown_command(other)],
    }
}

fn log(text: impl Into<String>) -> Vec<Effect> {
    vec![Effect::Log(text.into())]
}

fn help_hint() -> String {
    format!("{}//help{}", CLIENT_COL[3], CLIENT_COL[2])
}

fn unknown_command(name: &str) -> Effect {
    Effect::Log(format!(
        "unknown command '{name}'. Use {} to see all commands",
        help_hint()
    ))
}

fn chat(line: &str, client: Option<&ClientUser>) -> Vec<Effect> {
    if line.trim().is_empty() {
        return Vec::new();
    }
    let Some(client) = client else {
        return log(ModelError::NotReady.to_string());
    };
    match client.focus() {
        Some(channel) => vec![Effect::SendChat {
            channel,
            text: line.to_string(),
        }],
        None => log(format!(
            "please pick a channel first. Use {} to see all commands",
            help_hint()
        )),
    }
}

fn help() -> Vec<Effect> {
    let mut out = vec![Effect::Log("list of commands".to_string())];
    for command in COMMANDS {
        let aliases = command
            .names
            .join(&format!(" {}or{} ", CLIENT_COL[2], CLIENT_COL[3]));
        let args = if command.args.is_empty() {
            String::new()
        } else {
            format!(" {ITALICS}{}{RESET}", command.args.join(" "))
        };
        out.push(Effect::Log(format!(
            "\t{}{aliases}{}{args}{} - {}",
            CLIENT_COL[3], CLIENT_COL[2], CLIENT_COL[2], command.text
        )));
    }
    out
}

fn parse_index(arg: &str, kind: IndexKind) -> Result<usize, ModelError> {
    arg.parse::<usize>().map_err(|_| ModelError::index(kind))
}

fn list_guilds(client: &ClientUser) -> Vec<Effect> {
    let mut out = vec![Effect::Log("list of guilds".to_string())];
    out.extend(
        client
            .guilds()
            .iter()
            .enumerate()
            .map(|(idx, guild)| Effect::Log(format!("\t[{idx}] {}", sanitize(guild.name())))),
    );
    out
}

fn list_channels(client: &ClientUser, args: &[&str]) -> Vec<Effect> {
    let Some(arg) = args.first() else {
        return log(format!("please enter the {BOLD}guild{RESET} field"));
    };

    let guild = match parse_index(arg, IndexKind::Guild).and_then(|idx| client.guild_at(idx)) {
        Ok(guild) => guild,
        Err(e) => return log(e.to_string()),
    };

    let mut out = vec![Effect::Log(format!("list of channels for [{arg}]"))];
    let mut count = 0usize;
    for channel in guild.channels() {
        if channel.kind().is_category() {
            out.push(Effect::Log(format!("\t[+] {}", sanitize(&channel.label()))));
        } else {
            out.push(Effect::Log(format!("\t[{count}] {}", sanitize(&channel.label()))));
            count += 1;
        }
    }
    out
}

fn private_channel_name(channel: &Channel) -> String {
    let name = channel
        .first_recipient_name()
        .map_or_else(|| channel.label(), str::to_string);
    sanitize(&name).into_owned()
}

fn list_private_channels(client: &ClientUser) -> Vec<Effect> {
    let mut out = vec![Effect::Log("list of private channels".to_string())];
    out.extend(
        client
            .private_channels()
            .iter()
            .enumerate()
            .map(|(idx, channel)| Effect::Log(format!("\t[{idx}] {}", private_channel_name(channel)))),
    );
    out
}

fn pick_channel(client: &mut ClientUser, args: &[&str]) -> Vec<Effect> {
    match args {
        [] => log(format!("use {BOLD}//help{RESET} to check command syntax")),
        [channel] => match pick_private(client, channel) {
            Ok(channel) => log(format!("now chatting with {}", private_channel_name(channel))),
            Err(e) => log(e.to_string()),
        },
        [guild, channel, ..] => match pick_guild_channel(client, guild, channel) {
            Ok(channel) => log(format!("now focused on {}", sanitize(&channel.label()))),
            Err(e) => log(e.to_string()),
        },
    }
}

fn pick_private<'a>(client: &'a mut ClientUser, channel: &str) -> Result<&'a Channel, ModelError> {
    let index = parse_index(channel, IndexKind::PrivateChannel)?;
    client.focus_private_channel(index)
}

fn pick_guild_channel<'a>(
    client: &'a mut ClientUser,
    guild: &str,
    channel: &str,
) -> Result<&'a Channel, ModelError> {
    let guild = parse_index(guild, IndexKind::Guild)?;
    client.guild_at(guild)?;
    let channel = parse_index(channel, IndexKind::Channel)?;
    client.focus_guild_channel(guild, channel)
}

fn history(client: &ClientUser, args: &[&str]) -> Vec<Effect> {
    let Some(channel) = client.focus() else {
        return log(format!(
            "please pick a channel first. Use {} to see all commands",
            help_hint()
        ));
    };

    let limit = match args.first() {
        None => DEFAULT_HISTORY_LIMIT,
        Some(arg) => match arg.parse::<u64>() {
            Ok(0) => return log("incorrect history count"),
            Ok(count) => {
                u8::try_from(count).map_or(MAX_HISTORY_LIMIT, |c| c.min(MAX_HISTORY_LIMIT))
            }
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => MAX_HISTORY_LIMIT,
            Err(_) => return log("incorrect history count"),
        },
    };

    vec![Effect::FetchHistory { channel, limit }]
}
