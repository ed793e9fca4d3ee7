use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Rarity tier of a trait asset, controlling its selection weight.
///
/// Rarity is encoded in the asset filename as the last `_`-separated token of
/// the stem (e.g. `laser_eyes_legendary.png`). It is resolved once at catalog
/// load; selection never re-parses filenames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

impl Rarity {
    /// Fixed selection weight for this tier.
    pub const fn weight(self) -> u32 {
        match self {
            Rarity::Common => 60,
            Rarity::Uncommon => 25,
            Rarity::Rare => 12,
            Rarity::Legendary => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Legendary => "legendary",
        }
    }

    /// Resolve the rarity of an asset from its filename.
    ///
    /// Strips the extension, splits the stem on `_`, and interprets the last
    /// token as a rarity key. An unrecognized or missing key defaults to
    /// `Common`.
    pub fn for_filename(filename: &str) -> Rarity {
        let stem = filename.rsplit_once('.').map_or(filename, |(s, _)| s);
        stem.rsplit('_')
            .next()
            .and_then(|token| token.parse().ok())
            .unwrap_or(Rarity::Common)
    }
}

impl FromStr for Rarity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "common" => Ok(Rarity::Common),
            "uncommon" => Ok(Rarity::Uncommon),
            "rare" => Ok(Rarity::Rare),
            "legendary" => Ok(Rarity::Legendary),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
