//! One player's committed squad inside a battle

use super::pokemon::SquadMember;

/// The three pokemon a player brought to a battle, plus which one is active
#[derive(Debug, Clone, PartialEq)]
pub struct Squad {
    members: Vec<SquadMember>,
    active_index: usize,
}

impl Squad {
    /// Number of members every squad has
    pub const SIZE: usize = 3;

    /// Create a squad with the first member active
    pub fn new(members: Vec<SquadMember>) -> Self {
        Self {
            members,
            active_index: 0,
        }
    }

    pub fn members(&self) -> &[SquadMember] {
        &self.members
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// Get the active combatant
    pub fn active(&self) -> Option<&SquadMember> {
        self.members.get(self.active_index)
    }

    /// Get the active combatant mutably
    pub fn active_mut(&mut self) -> Option<&mut SquadMember> {
        self.members.get_mut(self.active_index)
    }

    /// Make another member the active combatant
    pub fn set_active(&mut self, index: usize) {
        if index < self.members.len() {
            self.active_index = index;
        }
    }

    /// Find a member by its pokemon id
    pub fn find(&self, id: &str) -> Option<usize> {
        self.members.iter().position(|m| m.id == id)
    }

    /// Count non-fainted members
    pub fn alive_count(&self) -> usize {
        self.members.iter().filter(|m| !m.is_fainted()).count()
    }

    /// Sum of the members' experience
    pub fn total_exp(&self) -> u32 {
        self.members.iter().map(|m| m.exp).sum()
    }

    /// Pokemon ids in squad order
    pub fn ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }
}
