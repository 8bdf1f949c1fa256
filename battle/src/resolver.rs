//! Damage calculation for a single attack

use std::fmt;

use rand::Rng;

use crate::types::SquadMember;

/// Which damage formula an attack uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackKind {
    Physical,
    Special,
}

impl fmt::Display for AttackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttackKind::Physical => write!(f, "physical"),
            AttackKind::Special => write!(f, "special"),
        }
    }
}

/// Source of the physical/special coin flip
pub trait DamageRoller {
    fn roll(&mut self) -> AttackKind;
}

/// Always picks the same branch
#[derive(Debug, Clone, Copy)]
pub struct FixedRoller(pub AttackKind);

impl DamageRoller for FixedRoller {
    fn roll(&mut self) -> AttackKind {
        self.0
    }
}

/// Fair coin over any `rand` generator
#[derive(Debug, Clone)]
pub struct RandomRoller<R> {
    rng: R,
}

impl<R: Rng> RandomRoller<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> DamageRoller for RandomRoller<R> {
    fn roll(&mut self) -> AttackKind {
        if self.rng.gen_bool(0.5) {
            AttackKind::Physical
        } else {
            AttackKind::Special
        }
    }
}

/// Result of resolving one attack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Damage {
    pub kind: AttackKind,
    pub amount: u32,
}

/// Stateless combat math
pub struct TurnResolver;

impl TurnResolver {
    /// Roll a branch and compute the damage `attacker` deals to `defender`
    pub fn resolve_attack(
        attacker: &SquadMember,
        defender: &SquadMember,
        roller: &mut dyn DamageRoller,
    ) -> Damage {
        let kind = roller.roll();
        let amount = match kind {
            AttackKind::Physical => Self::physical_damage(attacker, defender),
            AttackKind::Special => Self::special_damage(attacker, defender),
        };
        Damage { kind, amount }
    }

    /// `max(0, atk - def)`
    pub fn physical_damage(attacker: &SquadMember, defender: &SquadMember) -> u32 {
        attacker.atk.saturating_sub(defender.def)
    }

    /// `max(0, round(sp_atk * best multiplier - sp_def))`
    pub fn special_damage(attacker: &SquadMember, defender: &SquadMember) -> u32 {
        let multiplier = defender.type_defenses.best_against(&attacker.types);
        let raw = (attacker.sp_atk as f32 * multiplier - defender.sp_def as f32).round();
        if raw <= 0.0 { 0 } else { raw as u32 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ElementType, OwnedPokemon, Stats, TypeDefenses};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn member(atk: u32, def: u32, sp_atk: u32, sp_def: u32, types: Vec<ElementType>) -> SquadMember {
        let owned =
            OwnedPokemon::new("0000", "Test", Stats::new(100, atk, def, sp_atk, sp_def, 50))
                .with_types(types.clone());
        SquadMember::from_owned(&owned, TypeDefenses::from_chart(&types))
    }

    #[test]
    fn test_physical_damage() {
        let attacker = member(50, 10, 10, 10, vec![ElementType::Normal]);
        let defender = member(10, 30, 10, 10, vec![ElementType::Normal]);

        let damage = TurnResolver::resolve_attack(
            &attacker,
            &defender,
            &mut FixedRoller(AttackKind::Physical),
        );
        assert_eq!(damage.kind, AttackKind::Physical);
        assert_eq!(damage.amount, 20);
    }

    #[test]
    fn test_physical_damage_floors_at_zero() {
        let attacker = member(20, 10, 10, 10, vec![]);
        let defender = member(10, 90, 10, 10, vec![]);
        assert_eq!(TurnResolver::physical_damage(&attacker, &defender), 0);
    }

    #[test]
    fn test_special_damage_uses_best_multiplier() {
        // Water/Grass attacker against Fire: Water is 2.0, Grass is 0.5
        let attacker = member(10, 10, 60, 10, vec![ElementType::Water, ElementType::Grass]);
        let defender = member(10, 10, 10, 50, vec![ElementType::Fire]);

        let damage = TurnResolver::resolve_attack(
            &attacker,
            &defender,
            &mut FixedRoller(AttackKind::Special),
        );
        assert_eq!(damage.kind, AttackKind::Special);
        assert_eq!(damage.amount, 70);
    }

    #[test]
    fn test_special_damage_rounds() {
        let attacker = member(10, 10, 45, 10, vec![ElementType::Fire]);
        let mut defender = member(10, 10, 10, 10, vec![]);
        defender.type_defenses = TypeDefenses::new();
        defender.type_defenses.insert(ElementType::Fire, 0.5);

        // 45 * 0.5 - 10 = 12.5
        assert_eq!(TurnResolver::special_damage(&attacker, &defender), 13);
    }

    #[test]
    fn test_special_damage_immune_or_unlisted() {
        // Ghost cannot touch Normal
        let attacker = member(10, 10, 100, 10, vec![ElementType::Ghost]);
        let defender = member(10, 10, 10, 5, vec![ElementType::Normal]);
        assert_eq!(TurnResolver::special_damage(&attacker, &defender), 0);

        // No listed multiplier at all
        let mut bare = member(10, 10, 10, 5, vec![]);
        bare.type_defenses = TypeDefenses::new();
        assert_eq!(TurnResolver::special_damage(&attacker, &bare), 0);
    }

    #[test]
    fn test_random_roller_hits_both_branches() {
        let mut roller = RandomRoller::new(StdRng::seed_from_u64(7));
        let rolls: Vec<_> = (0..64).map(|_| roller.roll()).collect();
        assert!(rolls.contains(&AttackKind::Physical));
        assert!(rolls.contains(&AttackKind::Special));
    }

    #[test]
    fn test_seeded_roller_is_reproducible() {
        let mut a = RandomRoller::new(StdRng::seed_from_u64(42));
        let mut b = RandomRoller::new(StdRng::seed_from_u64(42));
        for _ in 0..16 {
            assert_eq!(a.roll(), b.roll());
        }
    }
}
