//! # Operator Commands
//!
//! One command per input line, e.g. `start`, `name Ethiopia Guji`, `post 128.5`.

use std::str::FromStr;

use crate::error::{Result, RoastLoggerError};

/// Usage text printed by `help`
pub const HELP: &str = "\
start [confirm]   begin a new batch (confirm discards an undropped roast)
resume            continue a reloaded roast that was charged but not dropped
stop              stop logging before charge
charge            mark the start of the roast
drop              mark the end of the roast
save              save the current roast
load <key>        load a stored roast
list              list recent roasts
pin               use the loaded roast as the reference overlay
unpin             remove the reference overlay
name <text>       set the coffee name
mass <grams>      set the green coffee mass
post <grams>      set the roasted coffee mass
status            show state, duration and latest readings
quit              exit";

/// A parsed operator command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start { confirm: bool },
    Resume,
    Stop,
    Charge,
    Drop,
    Save,
    Load(String),
    List,
    Pin,
    Unpin,
    Name(String),
    InputMass(f64),
    OutputMass(f64),
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = RoastLoggerError;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(word, rest)| (word, rest.trim()));

        let command = match (word.to_ascii_lowercase().as_str(), rest) {
            ("start", "") => Command::Start { confirm: false },
            ("start", "confirm") => Command::Start { confirm: true },
            ("resume", "") => Command::Resume,
            ("stop", "") => Command::Stop,
            ("charge", "") => Command::Charge,
            ("drop", "") => Command::Drop,
            ("save", "") => Command::Save,
            ("load", key) if !key.is_empty() => Command::Load(key.to_string()),
            ("list", "") => Command::List,
            ("pin", "") => Command::Pin,
            ("unpin", "") => Command::Unpin,
            ("name", name) if !name.is_empty() => Command::Name(name.to_string()),
            ("mass", grams) => Command::InputMass(parse_grams(grams)?),
            ("post", grams) => Command::OutputMass(parse_grams(grams)?),
            ("status", "") => Command::Status,
            ("help", "") | ("?", "") => Command::Help,
            ("quit", "") | ("exit", "") => Command::Quit,
            _ => return Err(RoastLoggerError::InvalidCommand(line.to_string())),
        };
        Ok(command)
    }
}

fn parse_grams(text: &str) -> Result<f64> {
    match text.parse::<f64>() {
        Ok(grams) if grams > 0.0 && grams.is_finite() => Ok(grams),
        _ => Err(RoastLoggerError::InvalidCommand(format!(
            "'{}' is not a positive mass in grams",
            text
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!("start".parse::<Command>().unwrap(), Command::Start { confirm: false });
        assert_eq!("start confirm".parse::<Command>().unwrap(), Command::Start { confirm: true });
        assert_eq!("  CHARGE ".parse::<Command>().unwrap(), Command::Charge);
        assert_eq!("drop".parse::<Command>().unwrap(), Command::Drop);
        assert_eq!("exit".parse::<Command>().unwrap(), Command::Quit);
        assert_eq!("?".parse::<Command>().unwrap(), Command::Help);
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(
            "name  Ethiopia Guji ".parse::<Command>().unwrap(),
            Command::Name("Ethiopia Guji".to_string())
        );
        assert_eq!(
            "load roast_20240301T090000000Z".parse::<Command>().unwrap(),
            Command::Load("roast_20240301T090000000Z".to_string())
        );
        assert_eq!("mass 180".parse::<Command>().unwrap(), Command::InputMass(180.0));
        assert_eq!("post 152.5".parse::<Command>().unwrap(), Command::OutputMass(152.5));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for line in ["", "roast", "start now", "load", "name", "mass", "mass -5", "post abc", "charge 3"] {
            assert!(
                matches!(line.parse::<Command>(), Err(RoastLoggerError::InvalidCommand(_))),
                "line {:?}",
                line
            );
        }
    }
}
