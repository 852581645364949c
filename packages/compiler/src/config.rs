//! Compiler Configuration

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Options shared by the parsers and the Lua serializer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Prefix of the per-nesting-level builder variables (`__builder0`, `__builder1`, ...)
    pub builder_prefix: String,
    /// Emit `self:setParameters(p)` on the generated object
    pub emit_parameter_setter: bool,
    /// Close HTML void elements (`br`, `img`, `input`, ...) right after their start tag
    pub auto_close_void_elements: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            builder_prefix: "__builder".to_string(),
            emit_parameter_setter: true,
            auto_close_void_elements: true,
        }
    }
}

impl CompileOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
