//! Layout option types.
//!
//! All enums deserialize from kebab-case strings. A string that does not
//! name a known value becomes `Unknown`, which maps to no presentation
//! value at all: the attribute is left to inherited/default behavior.

use serde::Deserialize;
use serde_json::Value;

use crate::engine::ComponentRef;

// =============================================================================
// Flex
// =============================================================================

/// Main axis of a flex arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlexDirection {
    #[default]
    #[serde(alias = "horizontal")]
    Row,
    #[serde(alias = "vertical")]
    Column,
    RowReverse,
    ColumnReverse,
    #[serde(other)]
    Unknown,
}

impl FlexDirection {
    pub fn css(self) -> Option<&'static str> {
        match self {
            Self::Row => Some("row"),
            Self::Column => Some("column"),
            Self::RowReverse => Some("row-reverse"),
            Self::ColumnReverse => Some("column-reverse"),
            Self::Unknown => None,
        }
    }
}

/// Flex wrap behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlexWrap {
    #[default]
    #[serde(alias = "nowrap")]
    NoWrap,
    Wrap,
    WrapReverse,
    #[serde(other)]
    Unknown,
}

impl FlexWrap {
    pub fn css(self) -> Option<&'static str> {
        match self {
            Self::NoWrap => Some("nowrap"),
            Self::Wrap => Some("wrap"),
            Self::WrapReverse => Some("wrap-reverse"),
            Self::Unknown => None,
        }
    }
}

/// Main axis distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JustifyContent {
    #[serde(alias = "flex-start")]
    Start,
    Center,
    #[serde(alias = "flex-end")]
    End,
    #[serde(alias = "space-between")]
    Between,
    #[serde(alias = "space-around")]
    Around,
    #[serde(alias = "space-evenly")]
    Evenly,
    #[serde(other)]
    Unknown,
}

impl JustifyContent {
    pub fn css(self) -> Option<&'static str> {
        match self {
            Self::Start => Some("flex-start"),
            Self::Center => Some("center"),
            Self::End => Some("flex-end"),
            Self::Between => Some("space-between"),
            Self::Around => Some("space-around"),
            Self::Evenly => Some("space-evenly"),
            Self::Unknown => None,
        }
    }
}

/// Cross axis alignment, shared by flex and grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlignItems {
    Stretch,
    #[serde(alias = "flex-start")]
    Start,
    Center,
    #[serde(alias = "flex-end")]
    End,
    Baseline,
    #[serde(other)]
    Unknown,
}

impl AlignItems {
    /// Value for `align-items` / `align-self` in a flex container.
    pub fn flex_css(self) -> Option<&'static str> {
        match self {
            Self::Stretch => Some("stretch"),
            Self::Start => Some("flex-start"),
            Self::Center => Some("center"),
            Self::End => Some("flex-end"),
            Self::Baseline => Some("baseline"),
            Self::Unknown => None,
        }
    }

    /// Value for `align-items` / `justify-items` in a grid container.
    pub fn grid_css(self) -> Option<&'static str> {
        match self {
            Self::Stretch => Some("stretch"),
            Self::Start => Some("start"),
            Self::Center => Some("center"),
            Self::End => Some("end"),
            Self::Baseline => Some("baseline"),
            Self::Unknown => None,
        }
    }
}

// =============================================================================
// Grid
// =============================================================================

/// Grid auto-placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GridAutoFlow {
    Row,
    Column,
    Dense,
    RowDense,
    ColumnDense,
    #[serde(other)]
    Unknown,
}

impl GridAutoFlow {
    pub fn css(self) -> Option<&'static str> {
        match self {
            Self::Row => Some("row"),
            Self::Column => Some("column"),
            Self::Dense => Some("dense"),
            Self::RowDense => Some("row dense"),
            Self::ColumnDense => Some("column dense"),
            Self::Unknown => None,
        }
    }
}

/// Grid track definition: an equal-track count or a raw template.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Tracks {
    Count(u32),
    Template(String),
}

impl Tracks {
    pub fn css(&self) -> Option<String> {
        match self {
            Self::Count(0) => None,
            Self::Count(n) => Some(format!("repeat({n}, minmax(0, 1fr))")),
            Self::Template(t) if t.trim().is_empty() => None,
            Self::Template(t) => Some(t.trim().to_string()),
        }
    }
}

// =============================================================================
// Joined
// =============================================================================

/// Direction in which joined children are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    #[default]
    #[serde(alias = "row")]
    Horizontal,
    #[serde(alias = "column")]
    Vertical,
    #[serde(other)]
    Unknown,
}

impl Orientation {
    /// Class token naming the orientation.
    pub fn token(self) -> Option<&'static str> {
        match self {
            Self::Horizontal => Some("horizontal"),
            Self::Vertical => Some("vertical"),
            Self::Unknown => None,
        }
    }

    pub fn flex_direction(self) -> Option<&'static str> {
        match self {
            Self::Horizontal => Some("row"),
            Self::Vertical => Some("column"),
            Self::Unknown => None,
        }
    }
}

// =============================================================================
// Shared values
// =============================================================================

/// A length: bare numbers are pixels, strings pass through.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Length {
    Px(f64),
    Raw(String),
}

impl Length {
    pub fn css(&self) -> Option<String> {
        match self {
            Self::Px(px) if px.is_finite() => Some(format!("{}px", trim_number(*px))),
            Self::Px(_) => None,
            Self::Raw(raw) if raw.trim().is_empty() => None,
            Self::Raw(raw) => Some(raw.trim().to_string()),
        }
    }
}

/// Render a number without a trailing `.0`.
pub(crate) fn trim_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

// =============================================================================
// Per-child overrides
// =============================================================================

/// Per-child layout overrides, read from the child's `props.layout` object.
///
/// This is the only override channel: a value here takes precedence over the
/// layout-wide default for that child. Malformed objects are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ItemOverrides {
    pub grow: Option<f64>,
    pub shrink: Option<f64>,
    pub basis: Option<Length>,
    pub align: Option<AlignItems>,
    pub order: Option<i64>,
    pub column_span: Option<u32>,
    pub row_span: Option<u32>,
    pub column: Option<String>,
    pub row: Option<String>,
}

impl ItemOverrides {
    /// Overrides declared by `child`, or defaults.
    pub fn of(child: &ComponentRef) -> Self {
        match child.props().get("layout") {
            Some(value @ Value::Object(_)) => {
                serde_json::from_value(value.clone()).unwrap_or_default()
            }
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("row", FlexDirection::Row)]
    #[case("horizontal", FlexDirection::Row)]
    #[case("column-reverse", FlexDirection::ColumnReverse)]
    #[case("diagonal", FlexDirection::Unknown)]
    fn test_direction_parsing(#[case] raw: &str, #[case] expected: FlexDirection) {
        let parsed: FlexDirection = serde_json::from_value(json!(raw)).unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_unknown_maps_to_nothing() {
        assert_eq!(FlexDirection::Unknown.css(), None);
        assert_eq!(AlignItems::Unknown.flex_css(), None);
        assert_eq!(Orientation::Unknown.token(), None);
    }

    #[rstest]
    #[case(json!(8), Some("8px"))]
    #[case(json!(0.5), Some("0.5px"))]
    #[case(json!("1rem"), Some("1rem"))]
    #[case(json!("  "), None)]
    fn test_length_css(#[case] raw: Value, #[case] expected: Option<&str>) {
        let length: Length = serde_json::from_value(raw).unwrap();
        assert_eq!(length.css().as_deref(), expected);
    }

    #[test]
    fn test_tracks_css() {
        assert_eq!(Tracks::Count(3).css().as_deref(), Some("repeat(3, minmax(0, 1fr))"));
        assert_eq!(Tracks::Count(0).css(), None);
        assert_eq!(Tracks::Template("100px 1fr".into()).css().as_deref(), Some("100px 1fr"));
    }
}
