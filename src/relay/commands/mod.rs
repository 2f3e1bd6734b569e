//! Local commands answered by the relay without contacting the provider.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleMode {
    Flip,
    Set(bool),
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Toggle(ToggleMode),
    Clear,
    /// `None` when the command was not given exactly one tag.
    Player(Option<String>),
    Unknown(String),
}

impl Command {
    /// Parse `text` as a command. Returns `None` for ordinary chat text.
    ///
    /// Names are case-insensitive; extra whitespace between arguments is ignored.
    pub fn parse(text: &str, prefix: &str) -> Option<Self> {
        let rest = text.trim().strip_prefix(prefix)?;
        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = parts.collect();

        let cmd = match name.as_str() {
            "help" => Self::Help,
            "clear" => Self::Clear,
            "toggle" => Self::Toggle(match args.as_slice() {
                [] => ToggleMode::Flip,
                [arg] => match arg.to_lowercase().as_str() {
                    "on" => ToggleMode::Set(true),
                    "off" => ToggleMode::Set(false),
                    other => ToggleMode::Invalid(other.to_string()),
                },
                _ => ToggleMode::Invalid(args.join(" ")),
            }),
            "player" => Self::Player(match args.as_slice() {
                [tag] => Some((*tag).to_string()),
                _ => None,
            }),
            _ => Self::Unknown(name),
        };
        Some(cmd)
    }
}

pub fn help_text(prefix: &str) -> String {
    format!(
        "👋 Welcome! Send any message to chat.\n\
         Commands:\n\
         {p}help - show this message\n\
         {p}toggle [on|off] - turn replies in this chat on or off\n\
         {p}clear - forget this conversation\n\
         {p}player #TAG - look up a Clash of Clans player",
        p = prefix
    )
}

pub fn unknown_text(prefix: &str, name: &str) -> String {
    format!(
        "Unknown command '{}{}'. Try {}help",
        prefix, name, prefix
    )
}

pub fn toggle_usage(prefix: &str) -> String {
    format!("Usage: {}toggle [on|off]", prefix)
}

pub fn player_usage(prefix: &str) -> String {
    format!("Usage: {}player #TAG", prefix)
}
