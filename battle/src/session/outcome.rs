//! What a session operation produced

use pokeduel_protocol::ServerMessage;

/// A message for one participant, addressed by player name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub to: String,
    pub message: ServerMessage,
}

impl Notice {
    pub fn new(to: impl Into<String>, message: ServerMessage) -> Self {
        Self {
            to: to.into(),
            message,
        }
    }
}

/// Experience owed to the winner's persistent records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpAward {
    pub recipient: String,
    pub pokemon_ids: Vec<String>,
    pub share: u32,
}

/// How a session finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ending {
    Victory {
        winner: String,
        loser: String,
        award: Option<ExpAward>,
    },
    /// Surrendered or quit before both squads were picked
    Abandoned { by: String },
}

impl Ending {
    pub fn winner(&self) -> Option<&str> {
        match self {
            Ending::Victory { winner, .. } => Some(winner),
            Ending::Abandoned { .. } => None,
        }
    }

    pub fn award(&self) -> Option<&ExpAward> {
        match self {
            Ending::Victory { award, .. } => award.as_ref(),
            Ending::Abandoned { .. } => None,
        }
    }
}

/// Notices to deliver, plus the ending if the operation finished the session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub notices: Vec<Notice>,
    pub ending: Option<Ending>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&mut self, to: impl Into<String>, message: ServerMessage) {
        self.notices.push(Notice::new(to, message));
    }

    /// Messages addressed to `name`, in order
    pub fn messages_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ServerMessage> {
        self.notices
            .iter()
            .filter(move |notice| notice.to == name)
            .map(|notice| &notice.message)
    }

    pub fn is_finished(&self) -> bool {
        self.ending.is_some()
    }
}
