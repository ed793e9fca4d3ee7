use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::rarity::Rarity;

/// One selectable visual asset within a category.
///
/// Derived from the catalog directory at load time, never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TraitAsset {
    /// Asset filename within the category directory, e.g. `mohawk_rare.png`.
    pub filename: String,
    pub rarity: Rarity,
    /// Selection weight, fixed per rarity tier.
    pub weight: u32,
}

impl TraitAsset {
    fn from_filename(filename: String) -> Self {
        let rarity = Rarity::for_filename(&filename);
        TraitAsset {
            filename,
            rarity,
            weight: rarity.weight(),
        }
    }
}

/// A named layer slot in the avatar composition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Background,
    Base,
    Eyes,
    Mouth,
    Hair,
    Eyewear,
    Headwear,
    Accessories,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Background,
        Category::Base,
        Category::Eyes,
        Category::Mouth,
        Category::Hair,
        Category::Eyewear,
        Category::Headwear,
        Category::Accessories,
    ];

    /// Fixed z-order of overlay layers stacked on top of the background.
    pub const COMPOSITE_ORDER: [Category; 7] = [
        Category::Base,
        Category::Eyes,
        Category::Mouth,
        Category::Accessories,
        Category::Hair,
        Category::Eyewear,
        Category::Headwear,
    ];

    /// Asset directory name for this category. The deployed asset layout uses
    /// the plural `backgrounds`; every other directory matches the key.
    pub const fn dir_name(self) -> &'static str {
        match self {
            Category::Background => "backgrounds",
            Category::Base => "base",
            Category::Eyes => "eyes",
            Category::Mouth => "mouth",
            Category::Hair => "hair",
            Category::Eyewear => "eyewear",
            Category::Headwear => "headwear",
            Category::Accessories => "accessories",
        }
    }

    /// Serialization key used in trait maps and API responses.
    pub const fn key(self) -> &'static str {
        match self {
            Category::Background => "background",
            other => other.dir_name(),
        }
    }

    /// Inverse of [`Category::dir_name`], for resolving asset routes.
    pub fn from_dir_name(dir: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.dir_name() == dir)
    }

    /// Probability in percent that this category rolls no trait at all.
    /// Background, base and eyes are always present.
    pub const fn none_chance(self) -> f64 {
        match self {
            Category::Background | Category::Base | Category::Eyes => 0.0,
            Category::Mouth => 20.0,
            Category::Hair => 10.0,
            Category::Eyewear => 70.0,
            Category::Headwear => 60.0,
            Category::Accessories => 50.0,
        }
    }

    const fn index(self) -> usize {
        match self {
            Category::Background => 0,
            Category::Base => 1,
            Category::Eyes => 2,
            Category::Mouth => 3,
            Category::Hair => 4,
            Category::Eyewear => 5,
            Category::Headwear => 6,
            Category::Accessories => 7,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// In-memory view of the trait asset directory tree.
///
/// Loaded once at startup and shared by reference with the compositor;
/// [`TraitCatalog::reload`] re-scans the filesystem on demand. Nothing here
/// touches the disk per generation call.
#[derive(Debug)]
pub struct TraitCatalog {
    root: PathBuf,
    categories: [Vec<TraitAsset>; Category::ALL.len()],
}

impl TraitCatalog {
    /// Scan `root` and build the catalog.
    ///
    /// A missing category directory means "category has no possible value"
    /// and yields an empty list; any other I/O failure is an error.
    pub fn load(root: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let root = root.into();
        let mut categories: [Vec<TraitAsset>; Category::ALL.len()] = Default::default();
        for category in Category::ALL {
            categories[category.index()] = load_category(&root.join(category.dir_name()))?;
        }
        Ok(TraitCatalog { root, categories })
    }

    /// Re-scan the asset tree, replacing the in-memory lists.
    pub fn reload(&mut self) -> Result<(), EngineError> {
        *self = TraitCatalog::load(self.root.clone())?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All known assets for `category`, sorted by filename.
    pub fn traits(&self, category: Category) -> &[TraitAsset] {
        &self.categories[category.index()]
    }

    /// Absolute path of one asset file.
    pub fn asset_path(&self, category: Category, filename: &str) -> PathBuf {
        self.root.join(category.dir_name()).join(filename)
    }

    /// Total number of assets across all categories.
    pub fn len(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn load_category(dir: &Path) -> Result<Vec<TraitAsset>, EngineError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(EngineError::Catalog {
                dir: dir.to_path_buf(),
                source: e,
            });
        }
    };

    let mut traits = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| EngineError::Catalog {
            dir: dir.to_path_buf(),
            source: e,
        })?;
        let Ok(filename) = entry.file_name().into_string() else {
            continue;
        };
        if filename.ends_with(".png") {
            traits.push(TraitAsset::from_filename(filename));
        }
    }

    // read_dir order is platform-dependent; sort for deterministic walks.
    traits.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(traits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn missing_directory_yields_empty_category() {
        let tmp = tempfile::tempdir().unwrap();
        let catalog = TraitCatalog::load(tmp.path()).unwrap();
        for category in Category::ALL {
            assert!(catalog.traits(category).is_empty());
        }
        assert!(catalog.is_empty());
    }

    #[test]
    fn load_keeps_only_png_and_tags_rarity() {
        let tmp = tempfile::tempdir().unwrap();
        let hair = tmp.path().join("hair");
        std::fs::create_dir(&hair).unwrap();
        touch(&hair.join("mohawk_rare.png"));
        touch(&hair.join("bowl_cut.png"));
        touch(&hair.join("notes.txt"));
        touch(&hair.join("swatch.jpg"));

        let catalog = TraitCatalog::load(tmp.path()).unwrap();
        let traits = catalog.traits(Category::Hair);
        assert_eq!(traits.len(), 2);
        assert_eq!(traits[0].filename, "bowl_cut.png");
        assert_eq!(traits[0].rarity, Rarity::Common);
        assert_eq!(traits[0].weight, 60);
        assert_eq!(traits[1].filename, "mohawk_rare.png");
        assert_eq!(traits[1].rarity, Rarity::Rare);
        assert_eq!(traits[1].weight, 12);
    }

    #[test]
    fn reload_picks_up_new_assets() {
        let tmp = tempfile::tempdir().unwrap();
        let eyes = tmp.path().join("eyes");
        std::fs::create_dir(&eyes).unwrap();
        touch(&eyes.join("round.png"));

        let mut catalog = TraitCatalog::load(tmp.path()).unwrap();
        assert_eq!(catalog.traits(Category::Eyes).len(), 1);

        touch(&eyes.join("laser_legendary.png"));
        catalog.reload().unwrap();
        assert_eq!(catalog.traits(Category::Eyes).len(), 2);
    }

    #[test]
    fn dir_name_round_trips() {
        for category in Category::ALL {
            assert_eq!(Category::from_dir_name(category.dir_name()), Some(category));
        }
        assert_eq!(Category::from_dir_name("background"), None);
        assert_eq!(Category::from_dir_name("bogus"), None);
    }

    #[test]
    fn none_chances_match_design_table() {
        assert_eq!(Category::Background.none_chance(), 0.0);
        assert_eq!(Category::Base.none_chance(), 0.0);
        assert_eq!(Category::Eyes.none_chance(), 0.0);
        assert_eq!(Category::Mouth.none_chance(), 20.0);
        assert_eq!(Category::Hair.none_chance(), 10.0);
        assert_eq!(Category::Eyewear.none_chance(), 70.0);
        assert_eq!(Category::Headwear.none_chance(), 60.0);
        assert_eq!(Category::Accessories.none_chance(), 50.0);
    }
}
