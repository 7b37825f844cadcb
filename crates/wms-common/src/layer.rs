//! Layer and dimension configuration.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DataType;

/// Identifies which axis a dimension describes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DimensionKind {
    Time,
    Elevation,
    Custom(String),
}

impl DimensionKind {
    /// Name used to look the dimension up in backing stores.
    pub fn name(&self) -> &str {
        match self {
            DimensionKind::Time => "time",
            DimensionKind::Elevation => "elevation",
            DimensionKind::Custom(name) => name,
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            DimensionKind::Time => DataType::Temporal,
            DimensionKind::Elevation => DataType::Numeric,
            DimensionKind::Custom(_) => DataType::Custom,
        }
    }
}

impl fmt::Display for DimensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a domain is reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DimensionPresentation {
    #[default]
    List,
    ContinuousInterval,
    DiscreteInterval,
}

/// Policy for picking the default value of a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefaultValueStrategy {
    Minimum,
    Maximum,
    Nearest,
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultValueSetting {
    pub strategy: DefaultValueStrategy,
    /// Reference for NEAREST, the value itself for FIXED
    #[serde(default)]
    pub reference_value: Option<String>,
}

impl DefaultValueSetting {
    pub fn new(strategy: DefaultValueStrategy) -> Self {
        Self {
            strategy,
            reference_value: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference_value = Some(reference.into());
        self
    }
}

fn enabled_by_default() -> bool {
    true
}

/// Configuration of one dimension on a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionConfig {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,

    #[serde(default)]
    pub presentation: DimensionPresentation,

    /// Step for interval presentation (numeric or ISO-8601 duration)
    #[serde(default)]
    pub resolution: Option<String>,

    #[serde(default)]
    pub default_value: Option<DefaultValueSetting>,

    /// Start attribute, only used by vector sources
    #[serde(default)]
    pub attribute: Option<String>,

    /// End attribute, only used by vector sources
    #[serde(default)]
    pub end_attribute: Option<String>,

    #[serde(default)]
    pub units: Option<String>,
}

impl Default for DimensionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            presentation: DimensionPresentation::List,
            resolution: None,
            default_value: None,
            attribute: None,
            end_attribute: None,
            units: None,
        }
    }
}

impl DimensionConfig {
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn with_end_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.end_attribute = Some(attribute.into());
        self
    }

    pub fn with_presentation(mut self, presentation: DimensionPresentation) -> Self {
        self.presentation = presentation;
        self
    }

    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = Some(resolution.into());
        self
    }

    pub fn with_default_value(mut self, setting: DefaultValueSetting) -> Self {
        self.default_value = Some(setting);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// A published layer and the dimensions configured on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDefinition {
    pub name: String,

    #[serde(default)]
    pub time: Option<DimensionConfig>,

    #[serde(default)]
    pub elevation: Option<DimensionConfig>,

    /// Custom dimensions by name
    #[serde(default)]
    pub custom: BTreeMap<String, DimensionConfig>,
}

impl LayerDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time: None,
            elevation: None,
            custom: BTreeMap::new(),
        }
    }

    pub fn with_time(mut self, config: DimensionConfig) -> Self {
        self.time = Some(config);
        self
    }

    pub fn with_elevation(mut self, config: DimensionConfig) -> Self {
        self.elevation = Some(config);
        self
    }

    pub fn with_custom(mut self, name: impl Into<String>, config: DimensionConfig) -> Self {
        self.custom.insert(name.into(), config);
        self
    }

    /// Every configured dimension, enabled or not: time, elevation, then
    /// custom dimensions by name.
    pub fn configured_dimensions(&self) -> Vec<(DimensionKind, &DimensionConfig)> {
        let mut out = Vec::new();
        if let Some(time) = &self.time {
            out.push((DimensionKind::Time, time));
        }
        if let Some(elevation) = &self.elevation {
            out.push((DimensionKind::Elevation, elevation));
        }
        for (name, config) in &self.custom {
            out.push((DimensionKind::Custom(name.clone()), config));
        }
        out
    }
}
