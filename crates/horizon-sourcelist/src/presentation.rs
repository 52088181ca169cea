//! Presentation of list items.
//!
//! The engine never draws anything. It derives an [`ItemPresentation`] for
//! each item and hands it to the [`RenderingSurface`](crate::source::RenderingSurface).

use horizon_sourcelist_core::Color;

use crate::catalog::{ColorSpec, TypeDefinition};
use crate::error::Result;
use crate::model::ListItem;

/// The color scheme presentation is derived for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Detects the system color scheme.
    ///
    /// Falls back to [`Theme::Light`] when the platform reports no
    /// preference.
    #[cfg(feature = "system-theme")]
    pub fn detect() -> Self {
        match dark_light::detect() {
            dark_light::Mode::Dark => Theme::Dark,
            dark_light::Mode::Light | dark_light::Mode::Default => Theme::Light,
        }
    }

    #[cfg(not(feature = "system-theme"))]
    pub fn detect() -> Self {
        Theme::Light
    }

    /// Returns true for the dark scheme.
    pub fn is_dark(self) -> bool {
        matches!(self, Theme::Dark)
    }

    /// Adjusts a `#rrggbb` color so it stands out against this theme's
    /// background. Strings that are not hex colors pass through unchanged.
    pub fn ensure_contrast(self, color: &str) -> String {
        let Some(parsed) = Color::from_hex(color) else {
            return color.to_string();
        };
        let lightness = parsed.lightness();
        let target = match self {
            Theme::Dark if lightness < DARK_MIN_LIGHTNESS => DARK_MIN_LIGHTNESS,
            Theme::Light if lightness > LIGHT_MAX_LIGHTNESS => LIGHT_MAX_LIGHTNESS,
            _ => return color.to_string(),
        };
        parsed.with_lightness(target).to_hex()
    }
}

/// Darkest icon color drawn on a dark background.
const DARK_MIN_LIGHTNESS: f32 = 0.35;
/// Lightest icon color drawn on a light background.
const LIGHT_MAX_LIGHTNESS: f32 = 0.65;

/// Everything a rendering surface needs to draw one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPresentation {
    /// Type label shown in front of the field key, e.g. `"Robot/Blue:"`.
    pub type_name: String,
    pub log_key: String,
    /// Path of the type icon, relative to the asset root.
    pub symbol_path: String,
    /// Icon color as a `#rrggbb` string.
    pub color: String,
    /// Path of the visibility toggle icon.
    pub hide_icon_path: String,
    pub visible: bool,
    pub is_child: bool,
    /// Set when the item's source kind is deprecated for its type.
    pub deprecation_warning: bool,
}

impl ItemPresentation {
    /// Derives the presentation of `item` as an item of `definition`.
    pub fn build(
        definition: &TypeDefinition,
        item: &ListItem,
        is_child: bool,
        theme: Theme,
    ) -> Self {
        let color = match definition.color_spec() {
            ColorSpec::Literal { light, dark } => match (theme, dark) {
                (Theme::Dark, Some(dark)) => dark.to_string(),
                _ => light.to_string(),
            },
            ColorSpec::Option(key) => item.options.get(key).cloned().unwrap_or_default(),
        };
        let color = theme.ensure_contrast(&color);

        let hide_icon = if item.visible { "eye.slash" } else { "eye" };

        Self {
            type_name: type_name(definition, item),
            log_key: item.log_key.clone(),
            symbol_path: format!("symbols/sourceList/{}.svg", definition.symbol),
            color,
            hide_icon_path: format!("symbols/{hide_icon}.svg"),
            visible: item.visible,
            is_child,
            deprecation_warning: is_deprecated(definition, item),
        }
    }

    /// Derives a presentation after looking the item's type up in `catalog`.
    pub fn for_item(
        catalog: &crate::catalog::TypeCatalog,
        item: &ListItem,
        is_child: bool,
        theme: Theme,
    ) -> Result<Self> {
        let definition = catalog.require(&item.type_key)?;
        Ok(Self::build(definition, item, is_child, theme))
    }
}

/// Builds the `/`-joined type label, terminated by `:`.
pub fn type_name(definition: &TypeDefinition, item: &ListItem) -> String {
    let mut components: Vec<&str> = Vec::new();
    if definition.show_in_type_name {
        components.push(&definition.display);
    }
    for option in definition.options.iter().filter(|o| o.show_in_type_name) {
        let selected = item
            .options
            .get(&option.key)
            .and_then(|value| option.value(value));
        if let Some(value) = selected {
            components.push(&value.display);
        }
    }
    format!("{}:", components.join("/"))
}

/// Returns true when the item uses a source kind deprecated for its type.
pub fn is_deprecated(definition: &TypeDefinition, item: &ListItem) -> bool {
    definition.deprecated_for_source_kind.as_deref() == Some(item.log_type.as_str())
}

/// Emitted when an item uses a deprecated source kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeprecationWarning {
    pub log_key: String,
    pub type_key: String,
    pub source_kind: String,
    /// Set when the user asked for the warning explicitly.
    pub forced: bool,
}
