//! Interactive command parsing for `barreplay play`.

use std::str::FromStr;

/// Order size as typed by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Volume {
    /// Current default volume.
    Default,
    Shares(u64),
    /// Everything possible: max affordable on a buy, all holdings on a sell.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayCommand {
    Buy(Volume),
    Sell(Volume),
    Next,
    SetVolume(u64),
    Info,
    Help,
    Settle,
}

impl FromStr for PlayCommand {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut tokens = input.split_whitespace();
        let verb = tokens
            .next()
            .ok_or_else(|| "empty command".to_string())?
            .to_ascii_lowercase();
        let arg = tokens.next();
        if tokens.next().is_some() {
            return Err(format!("too many arguments to '{verb}'"));
        }

        let no_arg = |cmd: PlayCommand| match arg {
            None => Ok(cmd),
            Some(_) => Err(format!("'{verb}' takes no argument")),
        };

        match verb.as_str() {
            "b" | "buy" => Ok(PlayCommand::Buy(parse_volume(arg)?)),
            "s" | "sell" => Ok(PlayCommand::Sell(parse_volume(arg)?)),
            "n" | "next" => no_arg(PlayCommand::Next),
            "v" | "volume" => match arg {
                Some(raw) => parse_shares(raw).map(PlayCommand::SetVolume),
                None => Err("'v' needs a share volume".into()),
            },
            "i" | "info" => no_arg(PlayCommand::Info),
            "h" | "help" | "?" => no_arg(PlayCommand::Help),
            "q" | "quit" | "settle" => no_arg(PlayCommand::Settle),
            other => Err(format!("unknown command '{other}' (type 'help')")),
        }
    }
}

fn parse_volume(arg: Option<&str>) -> Result<Volume, String> {
    match arg {
        None => Ok(Volume::Default),
        Some(raw) if raw.eq_ignore_ascii_case("all") || raw.eq_ignore_ascii_case("max") => {
            Ok(Volume::All)
        }
        Some(raw) => parse_shares(raw).map(Volume::Shares),
    }
}

fn parse_shares(raw: &str) -> Result<u64, String> {
    raw.replace('_', "")
        .parse::<u64>()
        .map_err(|_| format!("'{raw}' is not a share volume"))
}

pub const HELP: &str = "\
Commands:
  b, buy [n|max]     buy n shares at today's close (default volume if omitted)
  s, sell [n|all]    sell n shares at today's close
  n, next            observe, move to the next day
  v <n>              set the default volume
  info               show the status panel
  settle, q          end the game and show the settlement report
One order per day; an executed order moves to the next day.";
