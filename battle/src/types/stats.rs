//! Base stat block shared by roster entries and owned pokemon

use serde::Deserialize;

/// The six stats, keyed the way the data files name them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Stats {
    #[serde(rename = "HP")]
    pub hp: u32,

    #[serde(rename = "ATK")]
    pub atk: u32,

    #[serde(rename = "DEF")]
    pub def: u32,

    #[serde(rename = "Sp.Atk")]
    pub sp_atk: u32,

    #[serde(rename = "Sp.Def")]
    pub sp_def: u32,

    #[serde(rename = "Speed")]
    pub speed: u32,
}

impl Stats {
    pub fn new(hp: u32, atk: u32, def: u32, sp_atk: u32, sp_def: u32, speed: u32) -> Self {
        Self {
            hp,
            atk,
            def,
            sp_atk,
            sp_def,
            speed,
        }
    }
}
