//! # Replay Scripts
//!
//! A line-oriented description of what a user does in the browser, used to
//! drive the simulated host from a file or stdin.
//!
//! ```text
//! # comments and blank lines are ignored
//! open 3 1        # tab 3 opens in the background of window 1
//! activate 2 1    # user clicks tab 2 in window 1
//! focus 2         # user focuses window 2
//! blur            # focus leaves the browser
//! close 3         # user closes tab 3
//! vanish 4        # tab 4 disappears without an event
//! press           # the switch-tab shortcut
//! command NAME    # any named command
//! wait 350        # pause, in milliseconds
//! ```

use std::fmt;
use std::time::Duration;

use crate::command::SWITCH_TAB_COMMAND;
use crate::core::item::{ContainerId, ItemId, ItemRef};

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Open(ItemRef),
    Activate(ItemRef),
    Focus(ContainerId),
    Blur,
    Close(ItemId),
    Vanish(ItemId),
    Command(String),
    Wait(Duration),
}

#[derive(Debug, PartialEq)]
pub struct ScriptError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ScriptError {}

/// Parses one script line. Returns `Ok(None)` for blank lines and comments.
///
/// `line_number` is 1-based and only used for error messages.
pub fn parse_line(line_number: usize, line: &str) -> Result<Option<Step>, ScriptError> {
    let content = line.split('#').next().unwrap_or("").trim();
    if content.is_empty() {
        return Ok(None);
    }

    let fail = |message: String| ScriptError {
        line: line_number,
        message,
    };

    let mut words = content.split_whitespace();
    let verb = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    let expect_args = |count: usize| {
        if args.len() == count {
            Ok(())
        } else {
            Err(fail(format!(
                "`{verb}` takes {count} argument(s), got {}",
                args.len()
            )))
        }
    };
    let number = |text: &str| {
        text.parse::<u64>()
            .map_err(|_| fail(format!("`{text}` is not a number")))
    };

    let step = match verb {
        "open" | "activate" => {
            expect_args(2)?;
            let item = ItemRef::new(number(args[0])?, number(args[1])?);
            if verb == "open" {
                Step::Open(item)
            } else {
                Step::Activate(item)
            }
        }
        "focus" => {
            expect_args(1)?;
            Step::Focus(ContainerId(number(args[0])?))
        }
        "blur" => {
            expect_args(0)?;
            Step::Blur
        }
        "close" => {
            expect_args(1)?;
            Step::Close(ItemId(number(args[0])?))
        }
        "vanish" => {
            expect_args(1)?;
            Step::Vanish(ItemId(number(args[0])?))
        }
        "press" => {
            expect_args(0)?;
            Step::Command(SWITCH_TAB_COMMAND.to_string())
        }
        "command" => {
            expect_args(1)?;
            Step::Command(args[0].to_string())
        }
        "wait" => {
            expect_args(1)?;
            Step::Wait(Duration::from_millis(number(args[0])?))
        }
        other => return Err(fail(format!("unknown step `{other}`"))),
    };
    Ok(Some(step))
}
