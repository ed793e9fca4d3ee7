use std::io::Cursor;
use std::path::PathBuf;

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::catalog::{Category, TraitCatalog};
use crate::error::EngineError;
use crate::select::weighted_choice;

/// Side length of the flattened avatar in logical pixels.
pub const AVATAR_SIZE: u32 = 256;

/// The chosen trait filename per category for one avatar.
///
/// Background, base and eyes are always present. Optional categories are
/// omitted from JSON entirely when no trait was rolled (omit, not null).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TraitSet {
    pub background: String,
    pub base: String,
    pub eyes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hair: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eyewear: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headwear: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessories: Option<String>,
}

impl TraitSet {
    /// The chosen filename for `category`, if any.
    pub fn get(&self, category: Category) -> Option<&str> {
        match category {
            Category::Background => Some(&self.background),
            Category::Base => Some(&self.base),
            Category::Eyes => Some(&self.eyes),
            Category::Mouth => self.mouth.as_deref(),
            Category::Hair => self.hair.as_deref(),
            Category::Eyewear => self.eyewear.as_deref(),
            Category::Headwear => self.headwear.as_deref(),
            Category::Accessories => self.accessories.as_deref(),
        }
    }
}

/// Result of one generation: the written file plus its trait selections.
#[derive(Clone, Debug)]
pub struct GeneratedAvatar {
    pub id: Uuid,
    /// Filename under the compositor's output directory, `avatar_<uuid>.png`.
    pub filename: String,
    pub traits: TraitSet,
}

/// Roll one trait per category against the catalog.
///
/// Background, base and eyes use no none-chance and must be resolvable; an
/// empty required category is an error. All other categories roll their
/// configured none-chance independently.
pub fn roll_traits<R: Rng + ?Sized>(
    catalog: &TraitCatalog,
    rng: &mut R,
) -> Result<TraitSet, EngineError> {
    let mut required = |category: Category| -> Result<String, EngineError> {
        weighted_choice(catalog.traits(category), 0.0, rng)
            .map(|t| t.filename.clone())
            .ok_or(EngineError::EmptyCategory(category))
    };
    let background = required(Category::Background)?;
    let base = required(Category::Base)?;
    let eyes = required(Category::Eyes)?;

    let mut optional = |category: Category| -> Option<String> {
        weighted_choice(catalog.traits(category), category.none_chance(), rng)
            .map(|t| t.filename.clone())
    };
    Ok(TraitSet {
        background,
        base,
        eyes,
        mouth: optional(Category::Mouth),
        hair: optional(Category::Hair),
        eyewear: optional(Category::Eyewear),
        headwear: optional(Category::Headwear),
        accessories: optional(Category::Accessories),
    })
}

/// Stacks rolled trait layers into one flattened 256×256 PNG.
///
/// Holds only the output directory; the catalog is passed per call so the
/// server can share one catalog across requests.
#[derive(Clone, Debug)]
pub struct Compositor {
    output_dir: PathBuf,
}

impl Compositor {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Compositor {
            output_dir: output_dir.into(),
        }
    }

    /// Roll traits, composite the layers, and write the flattened PNG.
    ///
    /// A missing or undecodable overlay layer is skipped with a warning; the
    /// avatar is still produced. Background problems and encode/write
    /// failures are fatal, and no partial file is left behind on failure:
    /// the PNG is encoded fully in memory before a single write.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        catalog: &TraitCatalog,
        rng: &mut R,
    ) -> Result<GeneratedAvatar, EngineError> {
        let traits = roll_traits(catalog, rng)?;
        let canvas = flatten(catalog, &traits)?;

        let id = Uuid::new_v4();
        let filename = format!("avatar_{id}.png");

        let mut encoded = Vec::new();
        canvas
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
            .map_err(EngineError::Encode)?;

        std::fs::create_dir_all(&self.output_dir).map_err(|e| EngineError::Write {
            path: self.output_dir.clone(),
            source: e,
        })?;
        let path = self.output_dir.join(&filename);
        std::fs::write(&path, &encoded)
            .map_err(|e| EngineError::Write { path, source: e })?;

        Ok(GeneratedAvatar { id, filename, traits })
    }
}

/// Flatten a trait set against the catalog's asset files.
pub fn flatten(catalog: &TraitCatalog, traits: &TraitSet) -> Result<RgbaImage, EngineError> {
    let background_path = catalog.asset_path(Category::Background, &traits.background);
    let background = image::open(&background_path).map_err(|e| EngineError::Background {
        filename: traits.background.clone(),
        source: e,
    })?;
    let mut canvas = background
        .resize_exact(AVATAR_SIZE, AVATAR_SIZE, FilterType::Nearest)
        .to_rgba8();

    for category in Category::COMPOSITE_ORDER {
        let Some(filename) = traits.get(category) else {
            continue;
        };
        let path = catalog.asset_path(category, filename);
        let layer = match image::open(&path) {
            Ok(img) => img,
            Err(e) => {
                warn!(%category, filename, error = %e, "skipping unreadable trait layer");
                continue;
            }
        };
        let layer = if layer.width() != AVATAR_SIZE || layer.height() != AVATAR_SIZE {
            layer.resize_exact(AVATAR_SIZE, AVATAR_SIZE, FilterType::Nearest)
        } else {
            layer
        };
        imageops::overlay(&mut canvas, &layer.to_rgba8(), 0, 0);
    }

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn trait_set_omits_absent_categories() {
        let traits = TraitSet {
            background: "solid_cream_common.png".into(),
            base: "orange.png".into(),
            eyes: "round.png".into(),
            mouth: Some("grin.png".into()),
            hair: None,
            eyewear: None,
            headwear: None,
            accessories: None,
        };
        let json = serde_json::to_value(&traits).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert!(obj.contains_key("mouth"));
        assert!(!obj.contains_key("hair"));
        assert!(!obj.contains_key("eyewear"));
    }

    #[test]
    fn trait_set_round_trips_through_json() {
        let traits = TraitSet {
            background: "gradient_dusk_rare.png".into(),
            base: "teal.png".into(),
            eyes: "laser_legendary.png".into(),
            mouth: None,
            hair: Some("mohawk_rare.png".into()),
            eyewear: None,
            headwear: Some("beanie_uncommon.png".into()),
            accessories: None,
        };
        let json = serde_json::to_value(&traits).unwrap();
        let back: TraitSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, traits);
    }

    #[test]
    fn roll_traits_fails_on_empty_required_category() {
        let tmp = tempfile::tempdir().unwrap();
        // Only optional categories populated; background/base/eyes missing.
        let hair = tmp.path().join("hair");
        std::fs::create_dir(&hair).unwrap();
        std::fs::write(hair.join("mohawk_rare.png"), b"").unwrap();

        let catalog = TraitCatalog::load(tmp.path()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let err = roll_traits(&catalog, &mut rng).unwrap_err();
        assert!(matches!(err, EngineError::EmptyCategory(Category::Background)));
    }

    #[test]
    fn roll_traits_is_reproducible_for_a_fixed_seed() {
        let tmp = tempfile::tempdir().unwrap();
        for dir in ["backgrounds", "base", "eyes", "mouth", "hair"] {
            let d = tmp.path().join(dir);
            std::fs::create_dir(&d).unwrap();
            for name in ["one_common.png", "two_rare.png", "three_legendary.png"] {
                std::fs::write(d.join(name), b"").unwrap();
            }
        }
        let catalog = TraitCatalog::load(tmp.path()).unwrap();

        let a = roll_traits(&catalog, &mut StdRng::seed_from_u64(8)).unwrap();
        let b = roll_traits(&catalog, &mut StdRng::seed_from_u64(8)).unwrap();
        assert_eq!(a, b);
    }
}
