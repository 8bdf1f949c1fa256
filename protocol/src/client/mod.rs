use crate::ParseError;

/// Commands that clients can send to the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// @join NAME
    Join(String),

    /// @quit
    Quit,

    /// @list
    List,

    /// @pokedex NAME_OR_ID
    Pokedex(String),

    /// @battle OPPONENT
    Battle(String),

    /// @accept OPPONENT
    Accept(String),

    /// @deny OPPONENT
    Deny(String),

    /// @pick ID1 ID2 ID3
    Pick([String; 3]),

    /// @attack
    Attack,

    /// @change ID
    Change(String),

    /// @surrender
    Surrender,
}

impl ClientCommand {
    /// Parse a single command line such as `@pick 0001 0004 0007`
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().ok_or(ParseError::EmptyMessage)?;
        let args: Vec<&str> = parts.collect();

        if !verb.starts_with('@') {
            return Err(ParseError::InvalidFormat(format!(
                "commands start with '@', got '{}'",
                verb
            )));
        }

        match verb {
            "@join" => single(verb, &args, "player name").map(Self::Join),
            "@quit" => no_args(verb, &args).map(|_| Self::Quit),
            "@list" => no_args(verb, &args).map(|_| Self::List),
            "@pokedex" => single(verb, &args, "pokemon name or id").map(Self::Pokedex),
            "@battle" => single(verb, &args, "opponent name").map(Self::Battle),
            "@accept" => single(verb, &args, "opponent name").map(Self::Accept),
            "@deny" => single(verb, &args, "opponent name").map(Self::Deny),
            "@pick" => match args.as_slice() {
                [first, second, third] => Ok(Self::Pick([
                    first.to_string(),
                    second.to_string(),
                    third.to_string(),
                ])),
                _ => Err(ParseError::InvalidFormat(format!(
                    "@pick expects 3 pokemon ids, got {}",
                    args.len()
                ))),
            },
            "@attack" => no_args(verb, &args).map(|_| Self::Attack),
            "@change" => single(verb, &args, "pokemon id").map(Self::Change),
            "@surrender" => no_args(verb, &args).map(|_| Self::Surrender),
            other => Err(ParseError::UnknownCommand(other.to_string())),
        }
    }

    /// Short verb used in logs
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Join(_) => "join",
            Self::Quit => "quit",
            Self::List => "list",
            Self::Pokedex(_) => "pokedex",
            Self::Battle(_) => "battle",
            Self::Accept(_) => "accept",
            Self::Deny(_) => "deny",
            Self::Pick(_) => "pick",
            Self::Attack => "attack",
            Self::Change(_) => "change",
            Self::Surrender => "surrender",
        }
    }
}

/// Client message with an optional session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMessage {
    pub token: Option<String>,
    pub command: ClientCommand,
}

/// Parse one inbound datagram into a structured message
pub fn parse_client_message(datagram: &str) -> Result<ClientMessage, ParseError> {
    let text = datagram.trim();

    if text.is_empty() {
        return Err(ParseError::EmptyMessage);
    }

    let (token, line) = match text.strip_prefix('~') {
        Some(rest) => {
            let (token, line) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| ParseError::MissingField("command after session token".to_string()))?;
            if token.is_empty() {
                return Err(ParseError::InvalidFormat("session token cannot be empty".to_string()));
            }
            (Some(token.to_string()), line)
        }
        None => (None, text),
    };

    let command = ClientCommand::parse(line)?;
    Ok(ClientMessage { token, command })
}

fn single(verb: &str, args: &[&str], field: &str) -> Result<String, ParseError> {
    match args {
        [value] => Ok(value.to_string()),
        [] => Err(ParseError::MissingField(field.to_string())),
        _ => Err(ParseError::InvalidFormat(format!(
            "{} takes exactly one argument",
            verb
        ))),
    }
}

fn no_args(verb: &str, args: &[&str]) -> Result<(), ParseError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(ParseError::InvalidFormat(format!("{} takes no arguments", verb)))
    }
}
