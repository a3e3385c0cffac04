//! Presentation hints for parameter editors

use serde::Serialize;

use super::model::{Catalog, ParamDecl};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    NumericInput,
    CheckBox,
    ColorPicker,
    ComboBox,
}

impl ControlKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlKind::NumericInput => "numeric_input",
            ControlKind::CheckBox => "check_box",
            ControlKind::ColorPicker => "color_picker",
            ControlKind::ComboBox => "combo_box",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlHint {
    pub kind: ControlKind,
    pub enabled: bool,
}

impl Catalog {
    /// Editor for `param` given how many candidates survived resolution.
    ///
    /// Counts expanded values, so a single color placeholder still gets a
    /// color picker.
    pub fn control_hint(&self, param: &ParamDecl, candidates: usize) -> ControlHint {
        let declared = self.expanded_values(param).len();
        let kind = if declared <= 1 {
            ControlKind::NumericInput
        } else if param.is_bool() {
            ControlKind::CheckBox
        } else if param.is_color() {
            ControlKind::ColorPicker
        } else {
            ControlKind::ComboBox
        };
        let enabled = match kind {
            ControlKind::NumericInput => true,
            ControlKind::CheckBox => candidates > 1,
            ControlKind::ColorPicker | ControlKind::ComboBox => candidates > 0,
        };
        ControlHint { kind, enabled }
    }
}
