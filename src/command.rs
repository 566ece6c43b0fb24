//! Named keyboard commands the host can deliver.

/// The shortcut that flips between recent tabs.
pub const SWITCH_TAB_COMMAND: &str = "switch-to-last-tab";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Raw trigger for the press disambiguator.
    SwitchTab,
}

impl Command {
    /// Maps a command name to a known command. Unknown names (including
    /// commands handled elsewhere, like closing inactive tabs) yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            SWITCH_TAB_COMMAND => Some(Command::SwitchTab),
            _ => None,
        }
    }
}
