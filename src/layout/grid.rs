//! Grid layout: children placed on column/row tracks.

use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;

use super::applied::{AppliedAttributes, NodeAttributes};
use super::types::{AlignItems, GridAutoFlow, ItemOverrides, Length, Tracks};
use super::{Layout, LayoutContext};

pub const GRID_CLASS: &str = "layout-grid";
pub const GRID_ITEM_CLASS: &str = "layout-grid-item";

/// Grid configuration. `gap` sets both axes; `column_gap` and `row_gap`
/// override one axis each.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    pub columns: Option<Tracks>,
    pub rows: Option<Tracks>,
    pub gap: Option<Length>,
    pub column_gap: Option<Length>,
    pub row_gap: Option<Length>,
    pub auto_flow: Option<GridAutoFlow>,
    pub align: Option<AlignItems>,
    pub justify: Option<AlignItems>,
}

#[derive(Debug, Default)]
pub struct GridLayout {
    options: GridOptions,
    applied: AppliedAttributes,
}

impl GridLayout {
    pub fn new(options: GridOptions) -> Self {
        Self { options, applied: AppliedAttributes::new() }
    }

    /// `count` equal columns.
    pub fn columns(count: u32) -> Self {
        Self::new(GridOptions { columns: Some(Tracks::Count(count)), ..GridOptions::default() })
    }

    pub fn from_config(config: &Value) -> Result<Self> {
        Ok(Self::new(GridOptions::deserialize(config)?))
    }

    fn container_attributes(&self) -> NodeAttributes {
        let options = &self.options;
        NodeAttributes::new()
            .class(GRID_CLASS)
            .style("display", "grid")
            .style_opt("grid-template-columns", options.columns.as_ref().and_then(Tracks::css))
            .style_opt("grid-template-rows", options.rows.as_ref().and_then(Tracks::css))
            .style_opt("gap", options.gap.as_ref().and_then(Length::css))
            .style_opt("column-gap", options.column_gap.as_ref().and_then(Length::css))
            .style_opt("row-gap", options.row_gap.as_ref().and_then(Length::css))
            .style_opt("grid-auto-flow", options.auto_flow.and_then(GridAutoFlow::css))
            .style_opt("align-items", options.align.and_then(AlignItems::grid_css))
            .style_opt("justify-items", options.justify.and_then(AlignItems::grid_css))
    }
}

/// Explicit placement wins over a span.
fn placement(explicit: Option<&str>, span: Option<u32>) -> Option<String> {
    match (explicit.map(str::trim), span) {
        (Some(line), _) if !line.is_empty() => Some(line.to_string()),
        (_, Some(span)) if span > 0 => Some(format!("span {span}")),
        _ => None,
    }
}

fn item_attributes(overrides: &ItemOverrides) -> NodeAttributes {
    NodeAttributes::new()
        .class(GRID_ITEM_CLASS)
        .style_opt("grid-column", placement(overrides.column.as_deref(), overrides.column_span))
        .style_opt("grid-row", placement(overrides.row.as_deref(), overrides.row_span))
        .style_opt("align-self", overrides.align.and_then(AlignItems::grid_css))
        .style_opt("order", overrides.order.map(|order| order.to_string()))
}

impl Layout for GridLayout {
    fn name(&self) -> &str {
        "grid"
    }

    fn apply(&mut self, cx: &LayoutContext<'_>) -> Result<()> {
        let mut desired = vec![(cx.host.clone(), self.container_attributes())];
        desired.extend(
            cx.child_hosts()
                .into_iter()
                .map(|(child, host)| (host, item_attributes(&ItemOverrides::of(child)))),
        );
        self.applied.reconcile(desired);
        Ok(())
    }

    fn dispose(&mut self, _cx: &LayoutContext<'_>) {
        self.applied.revert_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ComponentRef;
    use crate::primitives::Element;
    use crate::renderer::HostNode;
    use crate::state::StateStore;
    use crate::types::Props;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(None, None, None)]
    #[case(None, Some(2), Some("span 2"))]
    #[case(None, Some(0), None)]
    #[case(Some("1 / 3"), Some(2), Some("1 / 3"))]
    #[case(Some(" "), Some(3), Some("span 3"))]
    fn test_placement(#[case] explicit: Option<&str>, #[case] span: Option<u32>, #[case] expected: Option<&str>) {
        assert_eq!(placement(explicit, span).as_deref(), expected);
    }

    #[test]
    fn test_grid_tracks_and_spans() {
        let host = HostNode::new("div");
        let wide = Element::new(Props::new().with("layout", json!({"column_span": 2})));
        let plain = Element::new(Props::new());
        for child in [&wide, &plain] {
            child.mount(&HostNode::offscreen(), None).unwrap();
        }
        let children: Vec<ComponentRef> = vec![wide.clone(), plain.clone()];

        let config = json!({"type": "grid", "columns": 3, "gap": "1rem", "justify": "center"});
        let mut layout = GridLayout::from_config(&config).unwrap();
        let state = StateStore::new();
        let props = Props::new();
        layout
            .apply(&LayoutContext { host: &host, children: &children, state: &state, props: &props })
            .unwrap();

        assert_eq!(host.style("display").as_deref(), Some("grid"));
        assert_eq!(
            host.style("grid-template-columns").as_deref(),
            Some("repeat(3, minmax(0, 1fr))")
        );
        assert_eq!(host.style("gap").as_deref(), Some("1rem"));
        assert_eq!(host.style("justify-items").as_deref(), Some("center"));
        assert_eq!(wide.host().unwrap().style("grid-column").as_deref(), Some("span 2"));
        assert_eq!(plain.host().unwrap().style("grid-column"), None);
        assert!(plain.host().unwrap().has_class(GRID_ITEM_CLASS));
    }

    #[test]
    fn test_equal_columns() {
        let host = HostNode::new("div");
        let mut layout = GridLayout::columns(2);
        let state = StateStore::new();
        let props = Props::new();
        layout
            .apply(&LayoutContext { host: &host, children: &[], state: &state, props: &props })
            .unwrap();
        assert_eq!(
            host.style("grid-template-columns").as_deref(),
            Some("repeat(2, minmax(0, 1fr))")
        );
        assert_eq!(host.style("grid-template-rows"), None);
    }

    #[test]
    fn test_template_columns() {
        let host = HostNode::new("div");
        let mut layout = GridLayout::from_config(&json!({"columns": "200px 1fr"})).unwrap();
        let state = StateStore::new();
        let props = Props::new();
        layout
            .apply(&LayoutContext { host: &host, children: &[], state: &state, props: &props })
            .unwrap();
        assert_eq!(host.style("grid-template-columns").as_deref(), Some("200px 1fr"));
    }
}
