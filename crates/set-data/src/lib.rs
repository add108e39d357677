use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use set_state::CardColor;
use std::collections::HashMap;
use std::path::Path;

/// A reference color and the card color it votes for, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedColor {
    pub name: String,
    pub rgb: [u8; 3],
    #[serde(default)]
    pub family: Option<CardColor>,
}

/// Raw color table file format
#[derive(Debug, Deserialize)]
struct ColorTableFile {
    #[allow(dead_code)]
    version: String,
    colors: Vec<NamedColor>,
}

/// Curated reference colors (CSS3 values) grouped into card color families.
/// Neutrals have no family; they absorb card background and shading.
const BUILTIN_COLORS: &[(&str, [u8; 3], Option<CardColor>)] = &[
    ("white", [255, 255, 255], None),
    ("whitesmoke", [245, 245, 245], None),
    ("gainsboro", [220, 220, 220], None),
    ("lightgray", [211, 211, 211], None),
    ("silver", [192, 192, 192], None),
    ("darkgray", [169, 169, 169], None),
    ("gray", [128, 128, 128], None),
    ("dimgray", [105, 105, 105], None),
    ("black", [0, 0, 0], None),
    ("yellow", [255, 255, 0], None),
    ("orange", [255, 165, 0], None),
    ("blue", [0, 0, 255], None),
    ("navy", [0, 0, 128], None),
    ("green", [0, 128, 0], Some(CardColor::Green)),
    ("darkgreen", [0, 100, 0], Some(CardColor::Green)),
    ("forestgreen", [34, 139, 34], Some(CardColor::Green)),
    ("seagreen", [46, 139, 87], Some(CardColor::Green)),
    ("mediumseagreen", [60, 179, 113], Some(CardColor::Green)),
    ("limegreen", [50, 205, 50], Some(CardColor::Green)),
    ("lime", [0, 255, 0], Some(CardColor::Green)),
    ("lightgreen", [144, 238, 144], Some(CardColor::Green)),
    ("red", [255, 0, 0], Some(CardColor::Red)),
    ("darkred", [139, 0, 0], Some(CardColor::Red)),
    ("firebrick", [178, 34, 34], Some(CardColor::Red)),
    ("crimson", [220, 20, 60], Some(CardColor::Red)),
    ("tomato", [255, 99, 71], Some(CardColor::Red)),
    ("indianred", [205, 92, 92], Some(CardColor::Red)),
    ("lightcoral", [240, 128, 128], Some(CardColor::Red)),
    ("purple", [128, 0, 128], Some(CardColor::Purple)),
    ("darkmagenta", [139, 0, 139], Some(CardColor::Purple)),
    ("magenta", [255, 0, 255], Some(CardColor::Purple)),
    ("darkviolet", [148, 0, 211], Some(CardColor::Purple)),
    ("darkorchid", [153, 50, 204], Some(CardColor::Purple)),
    ("mediumorchid", [186, 85, 211], Some(CardColor::Purple)),
    ("indigo", [75, 0, 130], Some(CardColor::Purple)),
    ("orchid", [218, 112, 214], Some(CardColor::Purple)),
];

/// Reference color registry.
///
/// Entries are kept sorted by name, so any scan over `entries()` visits
/// equally distant candidates in lexicographic order.
#[derive(Debug, Clone)]
pub struct ColorTable {
    entries: Vec<NamedColor>,
    by_rgb: HashMap<[u8; 3], usize>,
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ColorTable {
    pub fn builtin() -> Self {
        Self::from_entries(
            BUILTIN_COLORS
                .iter()
                .map(|&(name, rgb, family)| NamedColor {
                    name: name.to_string(),
                    rgb,
                    family,
                })
                .collect(),
        )
    }

    pub fn from_entries(mut entries: Vec<NamedColor>) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        let mut by_rgb = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            // Duplicate values resolve to the lexicographically first name.
            by_rgb.entry(entry.rgb).or_insert(i);
        }
        Self { entries, by_rgb }
    }

    /// Load a color table from `path`, falling back to the built-in table
    /// when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(
                "No color table at {}, using {} built-in colors",
                path.display(),
                BUILTIN_COLORS.len()
            );
            return Ok(Self::builtin());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file: ColorTableFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        if file.colors.is_empty() {
            anyhow::bail!("Color table {} has no entries", path.display());
        }

        tracing::info!("Loaded {} reference colors", file.colors.len());
        Ok(Self::from_entries(file.colors))
    }

    pub fn entries(&self) -> &[NamedColor] {
        &self.entries
    }

    /// Entry whose value is exactly `rgb`.
    pub fn exact(&self, rgb: [u8; 3]) -> Option<&NamedColor> {
        self.by_rgb.get(&rgb).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
