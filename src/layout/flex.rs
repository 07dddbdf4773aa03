//! Flex layout: children along one axis.

use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;

use super::applied::{AppliedAttributes, NodeAttributes};
use super::types::{trim_number, AlignItems, FlexDirection, FlexWrap, ItemOverrides, JustifyContent, Length};
use super::{Layout, LayoutContext};

/// Class token on the flex container.
pub const FLEX_CLASS: &str = "layout-flex";
/// Class token on every flex child.
pub const FLEX_ITEM_CLASS: &str = "layout-flex-item";

/// Flex configuration. `grow` and `shrink` are per-item defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FlexOptions {
    pub direction: FlexDirection,
    pub gap: Option<Length>,
    pub align: Option<AlignItems>,
    pub justify: Option<JustifyContent>,
    pub wrap: Option<FlexWrap>,
    pub grow: Option<f64>,
    pub shrink: Option<f64>,
    pub inline: bool,
}

#[derive(Debug, Default)]
pub struct FlexLayout {
    options: FlexOptions,
    applied: AppliedAttributes,
}

impl FlexLayout {
    pub fn new(options: FlexOptions) -> Self {
        Self { options, applied: AppliedAttributes::new() }
    }

    pub fn row() -> Self {
        Self::new(FlexOptions { direction: FlexDirection::Row, ..FlexOptions::default() })
    }

    pub fn column() -> Self {
        Self::new(FlexOptions { direction: FlexDirection::Column, ..FlexOptions::default() })
    }

    pub fn from_config(config: &Value) -> Result<Self> {
        Ok(Self::new(FlexOptions::deserialize(config)?))
    }

    pub fn options(&self) -> &FlexOptions {
        &self.options
    }

    fn container_attributes(&self) -> NodeAttributes {
        let options = &self.options;
        NodeAttributes::new()
            .class(FLEX_CLASS)
            .style("display", if options.inline { "inline-flex" } else { "flex" })
            .style_opt("flex-direction", options.direction.css())
            .style_opt("gap", options.gap.as_ref().and_then(Length::css))
            .style_opt("align-items", options.align.and_then(AlignItems::flex_css))
            .style_opt("justify-content", options.justify.and_then(JustifyContent::css))
            .style_opt("flex-wrap", options.wrap.and_then(FlexWrap::css))
    }

    fn item_attributes(&self, overrides: &ItemOverrides) -> NodeAttributes {
        let grow = overrides.grow.or(self.options.grow);
        let shrink = overrides.shrink.or(self.options.shrink);
        NodeAttributes::new()
            .class(FLEX_ITEM_CLASS)
            .style_opt("flex-grow", grow.map(trim_number))
            .style_opt("flex-shrink", shrink.map(trim_number))
            .style_opt("flex-basis", overrides.basis.as_ref().and_then(Length::css))
            .style_opt("align-self", overrides.align.and_then(AlignItems::flex_css))
            .style_opt("order", overrides.order.map(|order| order.to_string()))
    }
}

impl Layout for FlexLayout {
    fn name(&self) -> &str {
        "flex"
    }

    fn apply(&mut self, cx: &LayoutContext<'_>) -> Result<()> {
        let mut desired = vec![(cx.host.clone(), self.container_attributes())];
        for (child, host) in cx.child_hosts() {
            desired.push((host, self.item_attributes(&ItemOverrides::of(child))));
        }
        self.applied.reconcile(desired);
        Ok(())
    }

    fn dispose(&mut self, _cx: &LayoutContext<'_>) {
        self.applied.revert_all();
    }
}
