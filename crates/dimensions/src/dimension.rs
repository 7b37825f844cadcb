//! Dimensions of a layer and the operations served for each of them.

use tracing::{debug, instrument};

use wms_common::{
    BoundingBox, DataType, DefaultValueSetting, DimensionConfig, DimensionKind,
    DimensionPresentation, DomainValue, Filter, LayerDefinition, WmsResult,
};

use crate::config::DimensionsConfig;
use crate::defaults::{implicit_setting, resolve_default};
use crate::extract::{DomainComparator, DomainResult, NaturalOrder};
use crate::histogram::{build_histogram, Histogram};
use crate::reader::DimensionReader;
use crate::store::BackingStore;

/// One enabled dimension of a layer, bound to the reader for its store.
#[derive(Debug, Clone)]
pub struct Dimension {
    layer_name: String,
    kind: DimensionKind,
    config: DimensionConfig,
    reader: DimensionReader,
    settings: DimensionsConfig,
}

impl Dimension {
    pub fn new(
        layer_name: impl Into<String>,
        kind: DimensionKind,
        config: DimensionConfig,
        store: &BackingStore,
        settings: DimensionsConfig,
    ) -> Self {
        let reader = DimensionReader::from_store(store, &config);
        Self {
            layer_name: layer_name.into(),
            kind,
            config,
            reader,
            settings,
        }
    }

    pub fn name(&self) -> &str {
        self.kind.name()
    }

    pub fn kind(&self) -> &DimensionKind {
        &self.kind
    }

    pub fn layer_name(&self) -> &str {
        &self.layer_name
    }

    pub fn data_type(&self) -> DataType {
        self.kind.data_type()
    }

    pub fn config(&self) -> &DimensionConfig {
        &self.config
    }

    pub fn reader(&self) -> &DimensionReader {
        &self.reader
    }

    pub fn read_with_duplicates(
        &self,
        filter: &Filter,
        comparator: &dyn DomainComparator,
    ) -> WmsResult<DomainResult> {
        self.reader
            .read_with_duplicates(self.name(), filter, self.data_type(), comparator)
    }

    pub fn read_without_duplicates(
        &self,
        filter: &Filter,
        comparator: &dyn DomainComparator,
    ) -> WmsResult<DomainResult> {
        self.reader
            .read_without_duplicates(self.name(), filter, self.data_type(), comparator)
    }

    /// Distinct values in ascending order.
    pub fn domain_values(&self, filter: &Filter) -> WmsResult<Vec<DomainValue>> {
        Ok(self.read_without_duplicates(filter, &NaturalOrder)?.values)
    }

    /// Count the matching values into buckets of width `resolution`.
    #[instrument(skip(self, filter), fields(layer = %self.layer_name, dimension = %self.kind))]
    pub fn histogram(&self, filter: &Filter, resolution: &str) -> WmsResult<Histogram> {
        let domain = self.read_with_duplicates(filter, &NaturalOrder)?;
        build_histogram(&domain.values, resolution, self.settings.max_histogram_buckets)
    }

    /// Default value under the configured strategy, or the implicit one.
    pub fn default_value(&self) -> WmsResult<Option<DomainValue>> {
        let setting = self
            .config
            .default_value
            .clone()
            .unwrap_or_else(|| implicit_setting(&self.kind));
        self.default_value_with(&setting)
    }

    pub fn default_value_with(&self, setting: &DefaultValueSetting) -> WmsResult<Option<DomainValue>> {
        let domain = self.read_with_duplicates(&Filter::Include, &NaturalOrder)?;
        let value = resolve_default(&domain.values, setting, self.data_type(), &NaturalOrder)?;
        debug!(
            layer = %self.layer_name,
            dimension = %self.kind,
            strategy = ?setting.strategy,
            found = value.is_some(),
            "Resolved default value"
        );
        Ok(value)
    }

    /// Domain as advertised to clients, following the presentation mode.
    pub fn domain_representation(&self, filter: &Filter) -> WmsResult<Vec<String>> {
        let values = self.domain_values(filter)?;
        let (Some(first), Some(last)) = (values.first(), values.last()) else {
            return Ok(Vec::new());
        };

        Ok(match self.config.presentation {
            DimensionPresentation::List => values.iter().map(DomainValue::to_string).collect(),
            DimensionPresentation::ContinuousInterval => vec![self.interval(first, last)],
            DimensionPresentation::DiscreteInterval => {
                let interval = self.interval(first, last);
                match &self.config.resolution {
                    Some(resolution) => vec![format!("{}/{}", interval, resolution)],
                    None => vec![interval],
                }
            }
        })
    }

    fn interval(&self, first: &DomainValue, last: &DomainValue) -> String {
        format!(
            "{}{}{}",
            first.lower(),
            self.settings.interval_separator,
            last.upper()
        )
    }

    /// Filter restricting rows to `bbox`, or `Include` when the store cannot
    /// filter spatially.
    pub fn spatial_filter(&self, bbox: BoundingBox) -> WmsResult<Filter> {
        Ok(match self.reader.geometry_attribute_name()? {
            Some(geometry) => Filter::bbox(geometry, bbox),
            None => Filter::Include,
        })
    }
}

/// Enabled dimensions of `layer`: time, elevation, then custom ones by name.
pub fn extract_dimensions(
    layer: &LayerDefinition,
    store: &BackingStore,
    settings: &DimensionsConfig,
) -> Vec<Dimension> {
    let dimensions: Vec<Dimension> = layer
        .configured_dimensions()
        .into_iter()
        .filter(|(_, config)| config.enabled)
        .map(|(kind, config)| {
            Dimension::new(&layer.name, kind, config.clone(), store, settings.clone())
        })
        .collect();

    debug!(
        layer = %layer.name,
        store = store.variant_name(),
        count = dimensions.len(),
        "Extracted dimensions"
    );
    dimensions
}
