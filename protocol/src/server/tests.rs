#[cfg(test)]
mod tests {
    use crate::{PokedexSummary, ServerMessage};

    #[test]
    fn test_battle_tokens_are_prefixes() {
        let tokens = [
            (ServerMessage::BattleStart { you_first: true }, "@pokemon_start_battle"),
            (ServerMessage::Picked, "@pokemon_picked"),
            (ServerMessage::PokemonDied { name: "Pikachu".into() }, "@pokemon_died"),
            (ServerMessage::Changed { name: "Onix".into() }, "@changed"),
            (ServerMessage::Win, "@win"),
            (ServerMessage::Lose, "@lose"),
        ];

        for (message, token) in tokens {
            assert!(
                message.to_wire_format().starts_with(token),
                "{:?} should start with {}",
                message,
                token
            );
        }
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(
            ServerMessage::ActivePokemon {
                name: "Bulbasaur".into(),
                hp: 45
            }
            .to_wire_format(),
            "Active Pokemon: Bulbasaur (HP: 45)"
        );
        assert_eq!(
            ServerMessage::Error("Not your turn!".into()).to_wire_format(),
            "Not your turn!"
        );
    }

    #[test]
    fn test_joined_carries_token() {
        let message = ServerMessage::Joined {
            name: "Ash".into(),
            token: "00ff00ff00ff00ff".into(),
        };
        assert_eq!(
            message.to_wire_format(),
            "@joined 00ff00ff00ff00ff Welcome 'Ash'!"
        );
    }

    #[test]
    fn test_pokedex_entry() {
        let message = ServerMessage::Pokedex(PokedexSummary {
            id: "0001".into(),
            name: "Bulbasaur".into(),
            types: vec!["Grass".into(), "Poison".into()],
            hp: 45,
            atk: 49,
            def: 49,
            sp_atk: 65,
            sp_def: 65,
            speed: 45,
        });

        assert_eq!(
            message.to_wire_format(),
            "@pokedex ID: 0001, Name: Bulbasaur, Types: [Grass, Poison], Base Stats: HP: 45, ATK: 49, DEF: 49, Sp.Atk: 65, Sp.Def: 65, Speed: 45"
        );
    }
}
