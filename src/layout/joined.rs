//! Joined layout: adjacent children merged into one visual group.
//!
//! The host carries `group` plus exactly one orientation token; each child
//! carries `group-item` plus its position (`first`, `middle`, `last`). A
//! lone child is both first and last.

use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;

use super::applied::{AppliedAttributes, NodeAttributes};
use super::types::Orientation;
use super::{Layout, LayoutContext};

pub const GROUP_CLASS: &str = "group";
pub const GROUP_ITEM_CLASS: &str = "group-item";
pub const GROUP_ITEM_FIRST_CLASS: &str = "group-item-first";
pub const GROUP_ITEM_MIDDLE_CLASS: &str = "group-item-middle";
pub const GROUP_ITEM_LAST_CLASS: &str = "group-item-last";

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct JoinedOptions {
    pub orientation: Orientation,
}

#[derive(Debug, Default)]
pub struct JoinedLayout {
    options: JoinedOptions,
    applied: AppliedAttributes,
}

impl JoinedLayout {
    pub fn new(orientation: Orientation) -> Self {
        Self { options: JoinedOptions { orientation }, applied: AppliedAttributes::new() }
    }

    pub fn from_config(config: &Value) -> Result<Self> {
        let options = JoinedOptions::deserialize(config)?;
        Ok(Self::new(options.orientation))
    }

    pub fn orientation(&self) -> Orientation {
        self.options.orientation
    }
}

fn position_tokens(index: usize, len: usize) -> Vec<&'static str> {
    let mut tokens = Vec::with_capacity(2);
    if index == 0 {
        tokens.push(GROUP_ITEM_FIRST_CLASS);
    }
    if index + 1 == len {
        tokens.push(GROUP_ITEM_LAST_CLASS);
    }
    if tokens.is_empty() {
        tokens.push(GROUP_ITEM_MIDDLE_CLASS);
    }
    tokens
}

impl Layout for JoinedLayout {
    fn name(&self) -> &str {
        "joined"
    }

    fn apply(&mut self, cx: &LayoutContext<'_>) -> Result<()> {
        let orientation = self.options.orientation;
        let container = NodeAttributes::new()
            .class(GROUP_CLASS)
            .class_opt(orientation.token())
            .style("display", "inline-flex")
            .style_opt("flex-direction", orientation.flex_direction());

        let hosts = cx.child_hosts();
        let len = hosts.len();
        let mut desired = vec![(cx.host.clone(), container)];
        for (index, (_, host)) in hosts.into_iter().enumerate() {
            let attributes = position_tokens(index, len)
                .into_iter()
                .fold(NodeAttributes::new().class(GROUP_ITEM_CLASS), |attributes, token| {
                    attributes.class(token)
                });
            desired.push((host, attributes));
        }
        self.applied.reconcile(desired);
        Ok(())
    }

    fn dispose(&mut self, _cx: &LayoutContext<'_>) {
        self.applied.revert_all();
    }
}
