use pagebuilder_model::Breakpoint;
use serde::{Deserialize, Serialize};

/// Rendering options shared by the editor canvas and the live site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    /// Upper bound of the tablet tier in px
    pub tablet_max_width: u32,

    /// Upper bound of the mobile tier in px
    pub mobile_max_width: u32,

    /// Unit appended to bare numbers on length properties
    pub default_unit: String,

    /// Prefix of the per-node class name
    pub class_prefix: String,

    /// Prefix of the element id each node's stylesheet fragment is injected under
    pub fragment_id_prefix: String,

    /// Mark responsive declarations `!important` so they beat inline styles
    pub important: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tablet_max_width: 768,
            mobile_max_width: 480,
            default_unit: "px".to_string(),
            class_prefix: "node-".to_string(),
            fragment_id_prefix: "responsive-styles-".to_string(),
            important: true,
        }
    }
}

impl RenderConfig {
    /// Media query carrying a breakpoint's overrides; desktop has none
    pub fn media_query(&self, breakpoint: Breakpoint) -> Option<String> {
        match breakpoint {
            Breakpoint::Desktop => None,
            Breakpoint::Tablet => Some(format!("@media (max-width: {}px)", self.tablet_max_width)),
            Breakpoint::Mobile => Some(format!("@media (max-width: {}px)", self.mobile_max_width)),
        }
    }

    /// Media query matching exactly one tier, used for visibility flags
    pub fn exclusive_media_query(&self, breakpoint: Breakpoint) -> String {
        match breakpoint {
            Breakpoint::Desktop => {
                format!("@media (min-width: {}px)", self.tablet_max_width.saturating_add(1))
            }
            Breakpoint::Tablet => format!(
                "@media (min-width: {}px) and (max-width: {}px)",
                self.mobile_max_width.saturating_add(1),
                self.tablet_max_width
            ),
            Breakpoint::Mobile => format!("@media (max-width: {}px)", self.mobile_max_width),
        }
    }
}
