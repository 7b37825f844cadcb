//! Fixed-width histograms over extracted domains.
//!
//! Buckets are half-open `[lower, lower + step)` except the last one, which is
//! closed on the right so the domain maximum lands in it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use wms_common::{format_number, format_timestamp, DomainValue, IsoDuration, WmsError, WmsResult};

// absorbs representation error when a value sits exactly on a bucket edge
const EDGE_TOLERANCE: f64 = 1e-9;

/// Header `"<min>/<max>/<step>"` plus one count per bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Histogram {
    pub domain: String,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn empty() -> Self {
        Self {
            domain: String::new(),
            counts: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Count `values` into buckets of width `resolution`.
///
/// Ranges count towards the bucket of their lower bound; the histogram spans
/// from the smallest lower bound to the largest upper bound.
pub fn build_histogram(
    values: &[DomainValue],
    resolution: &str,
    max_buckets: usize,
) -> WmsResult<Histogram> {
    let Some(first) = values.first() else {
        return Ok(Histogram::empty());
    };
    let resolution = resolution.trim();

    let histogram = match first {
        DomainValue::Number(_) | DomainValue::NumberRange(..) => {
            numeric_histogram(values, resolution, max_buckets)?
        }
        DomainValue::Time(_) | DomainValue::TimeRange(..) => {
            temporal_histogram(values, resolution, max_buckets)?
        }
        DomainValue::Text(_) | DomainValue::TextRange(..) => {
            return Err(WmsError::invalid_parameter(
                "resolution",
                "histograms are not supported on string domains",
            ))
        }
    };

    debug!(
        domain = %histogram.domain,
        buckets = histogram.counts.len(),
        values = values.len(),
        "Built histogram"
    );
    Ok(histogram)
}

fn numeric_bounds(value: &DomainValue) -> WmsResult<(f64, f64)> {
    match value {
        DomainValue::Number(v) => Ok((*v, *v)),
        DomainValue::NumberRange(lo, hi) => Ok((*lo, *hi)),
        other => Err(mixed_kinds(other)),
    }
}

fn temporal_bounds(value: &DomainValue) -> WmsResult<(DateTime<Utc>, DateTime<Utc>)> {
    match value {
        DomainValue::Time(t) => Ok((*t, *t)),
        DomainValue::TimeRange(lo, hi) => Ok((*lo, *hi)),
        other => Err(mixed_kinds(other)),
    }
}

fn mixed_kinds(value: &DomainValue) -> WmsError {
    WmsError::UnsupportedSort(format!("{} value '{}' in histogram domain", value.kind(), value))
}

fn numeric_histogram(values: &[DomainValue], resolution: &str, max_buckets: usize) -> WmsResult<Histogram> {
    let step: f64 = resolution
        .parse()
        .map_err(|_| WmsError::invalid_parameter("resolution", format!("'{}' is not a number", resolution)))?;
    if !step.is_finite() || step <= 0.0 {
        return Err(WmsError::invalid_parameter(
            "resolution",
            format!("step must be positive, got '{}'", resolution),
        ));
    }

    let mut lowers = Vec::with_capacity(values.len());
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for value in values {
        let (lo, hi) = numeric_bounds(value)?;
        min = min.min(lo);
        max = max.max(hi);
        lowers.push(lo);
    }

    let raw = (max - min) / step;
    let buckets = ((raw - EDGE_TOLERANCE).ceil() as usize).max(1);
    check_bucket_limit(buckets, max_buckets)?;

    let mut counts = vec![0usize; buckets];
    for v in lowers {
        if !(min..=max).contains(&v) {
            return Err(out_of_range(&format_number(v)));
        }
        let idx = ((v - min) / step + EDGE_TOLERANCE).floor() as usize;
        counts[idx.min(buckets - 1)] += 1;
    }

    Ok(Histogram {
        domain: format!("{}/{}/{}", format_number(min), format_number(max), resolution),
        counts,
    })
}

fn temporal_histogram(values: &[DomainValue], resolution: &str, max_buckets: usize) -> WmsResult<Histogram> {
    let step = IsoDuration::parse(resolution)
        .map_err(|e| WmsError::invalid_parameter("resolution", e.to_string()))?;

    let mut lowers = Vec::with_capacity(values.len());
    let mut bounds: Option<(DateTime<Utc>, DateTime<Utc>)> = None;
    for value in values {
        let (lo, hi) = temporal_bounds(value)?;
        bounds = Some(match bounds {
            Some((min, max)) => (min.min(lo), max.max(hi)),
            None => (lo, hi),
        });
        lowers.push(lo);
    }
    let Some((min, max)) = bounds else {
        return Ok(Histogram::empty());
    };

    // bucket edges: min, min + step, ... up to the first edge at or past max
    let mut edges = vec![min];
    let mut edge = min;
    while edge < max {
        check_bucket_limit(edges.len(), max_buckets)?;
        edge = step.add_to(edge).ok_or_else(|| {
            WmsError::invalid_parameter("resolution", "bucket edge overflows the calendar")
        })?;
        edges.push(edge);
    }
    let buckets = edges.len().saturating_sub(1).max(1);
    check_bucket_limit(buckets, max_buckets)?;

    let mut counts = vec![0usize; buckets];
    for t in lowers {
        if t < min || t > max {
            return Err(out_of_range(&format_timestamp(&t)));
        }
        let idx = edges.partition_point(|e| *e <= t).saturating_sub(1);
        counts[idx.min(buckets - 1)] += 1;
    }

    Ok(Histogram {
        domain: format!("{}/{}/{}", format_timestamp(&min), format_timestamp(&max), resolution),
        counts,
    })
}

fn check_bucket_limit(buckets: usize, max_buckets: usize) -> WmsResult<()> {
    if buckets > max_buckets {
        return Err(WmsError::invalid_parameter(
            "resolution",
            format!("{} buckets exceed the limit of {}", buckets, max_buckets),
        ));
    }
    Ok(())
}

fn out_of_range(token: &str) -> WmsError {
    WmsError::InternalError(format!("histogram value {} lies outside the domain bounds", token))
}
