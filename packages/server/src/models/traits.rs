use engine::{Category, Rarity, TraitCatalog};
use serde::Serialize;

/// One catalog entry with its serving path, for front-end display.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TraitInfo {
    #[schema(example = "mohawk_rare.png")]
    pub filename: String,
    pub rarity: Rarity,
    #[schema(example = "/assets/hair/mohawk_rare.png")]
    pub image_url: String,
}

/// Read-only trait catalog metadata, keyed by asset directory name.
///
/// Purely informational; minting never consults this response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TraitCatalogResponse {
    pub backgrounds: Vec<TraitInfo>,
    pub base: Vec<TraitInfo>,
    pub eyes: Vec<TraitInfo>,
    pub mouth: Vec<TraitInfo>,
    pub hair: Vec<TraitInfo>,
    pub eyewear: Vec<TraitInfo>,
    pub headwear: Vec<TraitInfo>,
    pub accessories: Vec<TraitInfo>,
}

impl TraitCatalogResponse {
    pub fn from_catalog(catalog: &TraitCatalog) -> Self {
        let list = |category: Category| -> Vec<TraitInfo> {
            catalog
                .traits(category)
                .iter()
                .map(|t| TraitInfo {
                    filename: t.filename.clone(),
                    rarity: t.rarity,
                    image_url: format!("/assets/{}/{}", category.dir_name(), t.filename),
                })
                .collect()
        };
        TraitCatalogResponse {
            backgrounds: list(Category::Background),
            base: list(Category::Base),
            eyes: list(Category::Eyes),
            mouth: list(Category::Mouth),
            hair: list(Category::Hair),
            eyewear: list(Category::Eyewear),
            headwear: list(Category::Headwear),
            accessories: list(Category::Accessories),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_response_carries_rarity_and_urls() {
        let tmp = tempfile::tempdir().unwrap();
        let hair = tmp.path().join("hair");
        std::fs::create_dir(&hair).unwrap();
        std::fs::write(hair.join("mohawk_rare.png"), b"").unwrap();

        let catalog = TraitCatalog::load(tmp.path()).unwrap();
        let resp = TraitCatalogResponse::from_catalog(&catalog);

        assert!(resp.backgrounds.is_empty());
        assert_eq!(resp.hair.len(), 1);
        assert_eq!(resp.hair[0].rarity, Rarity::Rare);
        assert_eq!(resp.hair[0].image_url, "/assets/hair/mohawk_rare.png");
    }
}
