use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

/// The board is a single 20-space loop walked forward only.
pub const BOARD_SPACES: u8 = 20;

/// Deed scarcity cap per city; the value ladder has entries for 0..=5 deeds.
pub const MAX_DEEDS_PER_CITY: u8 = 5;

/// The nine cities. Wire order is load-bearing: the backend serializes these
/// as the integer enum indices below.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
    Serialize,
    Deserialize,
)]
#[rkyv(derive(Debug))]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum City {
    Calgary,
    Edmonton,
    Montreal,
    Regina,
    Saskatoon,
    Sudbury,
    Toronto,
    Vancouver,
    Winnipeg,
}

impl City {
    pub fn name(self) -> &'static str {
        match self {
            City::Calgary => "Calgary",
            City::Edmonton => "Edmonton",
            City::Montreal => "Montreal",
            City::Regina => "Regina",
            City::Saskatoon => "Saskatoon",
            City::Sudbury => "Sudbury",
            City::Toronto => "Toronto",
            City::Vancouver => "Vancouver",
            City::Winnipeg => "Winnipeg",
        }
    }

    /// Deed value ladder, indexed by how many deeds one player holds here.
    pub fn deed_values(self) -> [i64; 6] {
        match self {
            City::Calgary => [0, 5_000, 12_000, 22_000, 35_000, 50_000],
            City::Edmonton => [0, 6_000, 15_000, 27_000, 42_000, 60_000],
            City::Montreal => [0, 10_000, 25_000, 45_000, 70_000, 100_000],
            City::Regina => [0, 7_000, 17_000, 32_000, 50_000, 70_000],
            City::Saskatoon => [0, 8_000, 20_000, 36_000, 56_000, 80_000],
            City::Sudbury => [0, 5_000, 12_000, 22_000, 35_000, 50_000],
            City::Toronto => [0, 6_000, 15_000, 27_000, 42_000, 60_000],
            City::Vancouver => [0, 9_000, 22_000, 40_000, 63_000, 90_000],
            City::Winnipeg => [0, 4_000, 10_000, 18_000, 28_000, 40_000],
        }
    }
}

impl From<City> for u8 {
    fn from(city: City) -> u8 {
        city as u8
    }
}

impl TryFrom<u8> for City {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(City::Calgary),
            1 => Ok(City::Edmonton),
            2 => Ok(City::Montreal),
            3 => Ok(City::Regina),
            4 => Ok(City::Saskatoon),
            5 => Ok(City::Sudbury),
            6 => Ok(City::Toronto),
            7 => Ok(City::Vancouver),
            8 => Ok(City::Winnipeg),
            other => Err(format!("invalid city {other}")),
        }
    }
}

/// An unordered city pair: `{A,B}` and `{B,A}` name the same route. The
/// constructor normalizes, so derived equality is direction-independent.
/// Serialized as a two-element city array (the backend's `cityPair` shape).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
    Serialize,
    Deserialize,
)]
#[rkyv(derive(Debug))]
#[serde(try_from = "Vec<City>", into = "Vec<City>")]
pub struct CityPair(City, City);

impl CityPair {
    pub const fn new(a: City, b: City) -> Self {
        if (a as u8) <= (b as u8) {
            CityPair(a, b)
        } else {
            CityPair(b, a)
        }
    }

    pub fn first(self) -> City {
        self.0
    }

    pub fn second(self) -> City {
        self.1
    }
}

impl From<CityPair> for Vec<City> {
    fn from(pair: CityPair) -> Vec<City> {
        vec![pair.0, pair.1]
    }
}

impl TryFrom<Vec<City>> for CityPair {
    type Error = String;

    fn try_from(cities: Vec<City>) -> Result<Self, Self::Error> {
        match cities.as_slice() {
            [a, b] => Ok(CityPair::new(*a, *b)),
            other => Err(format!("city pair needs 2 cities, got {}", other.len())),
        }
    }
}

/// The twelve buildable routes.
pub const VALID_CITY_PAIRS: [CityPair; 12] = [
    CityPair::new(City::Montreal, City::Toronto),
    CityPair::new(City::Montreal, City::Sudbury),
    CityPair::new(City::Toronto, City::Winnipeg),
    CityPair::new(City::Toronto, City::Regina),
    CityPair::new(City::Sudbury, City::Saskatoon),
    CityPair::new(City::Sudbury, City::Winnipeg),
    CityPair::new(City::Winnipeg, City::Calgary),
    CityPair::new(City::Winnipeg, City::Edmonton),
    CityPair::new(City::Regina, City::Calgary),
    CityPair::new(City::Saskatoon, City::Edmonton),
    CityPair::new(City::Calgary, City::Vancouver),
    CityPair::new(City::Edmonton, City::Vancouver),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceType {
    CprSubsidy,
    Track,
    SettlerRents,
    Land,
    RoadbedCosts,
    Rebellion,
    EndOfTrack,
    LandClaims,
    SurveyFees,
    Scandal,
}

impl SpaceType {
    pub fn label(self) -> &'static str {
        match self {
            SpaceType::CprSubsidy => "CPR Subsidy",
            SpaceType::Track => "Track",
            SpaceType::SettlerRents => "Settler Rents",
            SpaceType::Land => "Land",
            SpaceType::RoadbedCosts => "Roadbed Costs",
            SpaceType::Rebellion => "Rebellion",
            SpaceType::EndOfTrack => "End of Track",
            SpaceType::LandClaims => "Land Claims",
            SpaceType::SurveyFees => "Survey Fees",
            SpaceType::Scandal => "Scandal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceDef {
    pub space_type: SpaceType,
    pub cost: i64,
}

const fn space(space_type: SpaceType, cost: i64) -> SpaceDef {
    SpaceDef { space_type, cost }
}

pub const SPACES: [SpaceDef; BOARD_SPACES as usize] = [
    space(SpaceType::CprSubsidy, 0),
    space(SpaceType::Track, 1_000),
    space(SpaceType::SettlerRents, 1_000),
    space(SpaceType::Land, 1_000),
    space(SpaceType::RoadbedCosts, 1_000),
    space(SpaceType::Track, 2_000),
    space(SpaceType::Rebellion, 0),
    space(SpaceType::Land, 3_000),
    space(SpaceType::Track, 4_000),
    space(SpaceType::Land, 5_000),
    space(SpaceType::EndOfTrack, 0),
    space(SpaceType::Track, 6_000),
    space(SpaceType::LandClaims, 1_000),
    space(SpaceType::Land, 7_000),
    space(SpaceType::SurveyFees, 3_000),
    space(SpaceType::Track, 8_000),
    space(SpaceType::Scandal, 10_000),
    space(SpaceType::Land, 9_000),
    space(SpaceType::Track, 10_000),
    space(SpaceType::Land, 12_000),
];

/// Ordered spaces from `from` to `to` walking forward around the loop,
/// endpoints included. A "backward" destination wraps past space 19: the
/// path for 5 → 2 passes 19 and 0, never 4 and 3.
pub fn forward_path(from: u8, to: u8) -> Vec<u8> {
    let from = from % BOARD_SPACES;
    let to = to % BOARD_SPACES;
    let steps = (to + BOARD_SPACES - from) % BOARD_SPACES;
    (0..=steps)
        .map(|offset| (from + offset) % BOARD_SPACES)
        .collect()
}
