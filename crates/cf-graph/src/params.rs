//! Per-kind operating parameters.
//!
//! Each node kind recognizes a fixed parameter set; `dropout_rate` is shared by
//! every kind. Keys outside the recognized set are kept verbatim in `extra` so
//! they survive a round trip to the simulation service, but nothing here
//! interprets them.

use std::collections::BTreeMap;

use cf_core::{Real, clamp_fraction, clamp_non_negative, clamp_percent};

use crate::graph::NodeKind;

pub const BASE_FLOW: &str = "base_flow";
pub const EFFICIENCY: &str = "efficiency";
pub const BASE_LEAKAGE: &str = "base_leakage";
pub const BASE_PRESSURE: &str = "base_pressure";
pub const CONVERSION_RATE: &str = "conversion_rate";
pub const DROPOUT_RATE: &str = "dropout_rate";

/// Admissible range of a recognized parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bounds {
    /// `>= 0`
    NonNegative,
    /// `[0, 100]`
    Percent,
    /// `[0, 1]`
    Fraction,
}

impl Bounds {
    pub fn contains(self, value: Real) -> bool {
        match self {
            Bounds::NonNegative => value.is_finite() && value >= 0.0,
            Bounds::Percent => (0.0..=100.0).contains(&value),
            Bounds::Fraction => (0.0..=1.0).contains(&value),
        }
    }

    pub fn clamp(self, value: Real) -> Real {
        match self {
            Bounds::NonNegative => clamp_non_negative(value),
            Bounds::Percent => clamp_percent(value),
            Bounds::Fraction => clamp_fraction(value),
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Bounds::NonNegative => ">= 0",
            Bounds::Percent => "0..=100",
            Bounds::Fraction => "0..=1",
        }
    }
}

/// Schema entry for one recognized parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    pub bounds: Bounds,
}

pub const DROPOUT_RATE_SPEC: ParamSpec = ParamSpec {
    key: DROPOUT_RATE,
    label: "Dropout rate",
    unit: "fraction",
    bounds: Bounds::Fraction,
};

const CAPTURE_SPECS: [ParamSpec; 3] = [
    ParamSpec {
        key: BASE_FLOW,
        label: "Base flow",
        unit: "kg/hr",
        bounds: Bounds::NonNegative,
    },
    ParamSpec {
        key: EFFICIENCY,
        label: "Capture efficiency",
        unit: "%",
        bounds: Bounds::Percent,
    },
    DROPOUT_RATE_SPEC,
];

const TRANSPORT_SPECS: [ParamSpec; 2] = [
    ParamSpec {
        key: BASE_LEAKAGE,
        label: "Base leakage",
        unit: "kg/hr",
        bounds: Bounds::NonNegative,
    },
    DROPOUT_RATE_SPEC,
];

// Pressure is informational only; the service reports it but no flow depends on it.
const STORAGE_SPECS: [ParamSpec; 2] = [
    ParamSpec {
        key: BASE_PRESSURE,
        label: "Base pressure",
        unit: "bar",
        bounds: Bounds::NonNegative,
    },
    DROPOUT_RATE_SPEC,
];

const UTILIZATION_SPECS: [ParamSpec; 2] = [
    ParamSpec {
        key: CONVERSION_RATE,
        label: "Conversion rate",
        unit: "%",
        bounds: Bounds::Percent,
    },
    DROPOUT_RATE_SPEC,
];

/// Recognized parameters for a node kind, `dropout_rate` last.
pub fn specs_for(kind: NodeKind) -> &'static [ParamSpec] {
    match kind {
        NodeKind::Capture => &CAPTURE_SPECS,
        NodeKind::Transport => &TRANSPORT_SPECS,
        NodeKind::Storage => &STORAGE_SPECS,
        NodeKind::Utilization => &UTILIZATION_SPECS,
    }
}

pub fn spec_for(kind: NodeKind, key: &str) -> Option<&'static ParamSpec> {
    specs_for(kind).iter().find(|spec| spec.key == key)
}

/// Kind-specific recognized values. `None` means "not set", in which case the
/// simulation service falls back to its own default.
#[derive(Debug, Clone, PartialEq)]
pub enum KindParams {
    Capture {
        base_flow: Option<Real>,
        efficiency: Option<Real>,
    },
    Transport {
        base_leakage: Option<Real>,
    },
    Storage {
        base_pressure: Option<Real>,
    },
    Utilization {
        conversion_rate: Option<Real>,
    },
}

impl KindParams {
    pub fn kind(&self) -> NodeKind {
        match self {
            KindParams::Capture { .. } => NodeKind::Capture,
            KindParams::Transport { .. } => NodeKind::Transport,
            KindParams::Storage { .. } => NodeKind::Storage,
            KindParams::Utilization { .. } => NodeKind::Utilization,
        }
    }

    fn unset(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Capture => KindParams::Capture {
                base_flow: None,
                efficiency: None,
            },
            NodeKind::Transport => KindParams::Transport { base_leakage: None },
            NodeKind::Storage => KindParams::Storage {
                base_pressure: None,
            },
            NodeKind::Utilization => KindParams::Utilization {
                conversion_rate: None,
            },
        }
    }
}

/// Where a `set` landed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamSlot {
    Recognized(&'static ParamSpec),
    /// Preserved for the wire, not interpreted.
    Unrecognized,
}

/// Full parameter bag of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeParams {
    pub values: KindParams,
    pub dropout_rate: Option<Real>,
    pub extra: BTreeMap<String, Real>,
}

impl NodeParams {
    /// No value set; every recognized key falls back to the service default.
    pub fn empty(kind: NodeKind) -> Self {
        Self {
            values: KindParams::unset(kind),
            dropout_rate: None,
            extra: BTreeMap::new(),
        }
    }

    /// Defaults applied to a freshly added node.
    pub fn defaults(kind: NodeKind) -> Self {
        let (values, dropout) = match kind {
            NodeKind::Capture => (
                KindParams::Capture {
                    base_flow: Some(100.0),
                    efficiency: Some(90.0),
                },
                0.05,
            ),
            NodeKind::Transport => (
                KindParams::Transport {
                    base_leakage: Some(2.0),
                },
                0.02,
            ),
            NodeKind::Storage => (
                KindParams::Storage {
                    base_pressure: Some(50.0),
                },
                0.01,
            ),
            NodeKind::Utilization => (
                KindParams::Utilization {
                    conversion_rate: Some(95.0),
                },
                0.01,
            ),
        };
        Self {
            values,
            dropout_rate: Some(dropout),
            extra: BTreeMap::new(),
        }
    }

    /// Rebuild from a flat key/value map, routing each key to its slot.
    pub fn from_flat<'a, I>(kind: NodeKind, entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Real)>,
    {
        let mut params = Self::empty(kind);
        for (key, value) in entries {
            params.set(key, value);
        }
        params
    }

    pub fn kind(&self) -> NodeKind {
        self.values.kind()
    }

    pub fn specs(&self) -> &'static [ParamSpec] {
        specs_for(self.kind())
    }

    fn slot(&self, key: &str) -> Option<&Option<Real>> {
        if key == DROPOUT_RATE {
            return Some(&self.dropout_rate);
        }
        match (&self.values, key) {
            (KindParams::Capture { base_flow, .. }, BASE_FLOW) => Some(base_flow),
            (KindParams::Capture { efficiency, .. }, EFFICIENCY) => Some(efficiency),
            (KindParams::Transport { base_leakage }, BASE_LEAKAGE) => Some(base_leakage),
            (KindParams::Storage { base_pressure }, BASE_PRESSURE) => Some(base_pressure),
            (KindParams::Utilization { conversion_rate }, CONVERSION_RATE) => {
                Some(conversion_rate)
            }
            _ => None,
        }
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut Option<Real>> {
        if key == DROPOUT_RATE {
            return Some(&mut self.dropout_rate);
        }
        match (&mut self.values, key) {
            (KindParams::Capture { base_flow, .. }, BASE_FLOW) => Some(base_flow),
            (KindParams::Capture { efficiency, .. }, EFFICIENCY) => Some(efficiency),
            (KindParams::Transport { base_leakage }, BASE_LEAKAGE) => Some(base_leakage),
            (KindParams::Storage { base_pressure }, BASE_PRESSURE) => Some(base_pressure),
            (KindParams::Utilization { conversion_rate }, CONVERSION_RATE) => {
                Some(conversion_rate)
            }
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<Real> {
        match self.slot(key) {
            Some(slot) => *slot,
            None => self.extra.get(key).copied(),
        }
    }

    /// Store `value` as given. Out-of-range values are accepted; use
    /// [`NodeParams::clamped`] before display-critical use.
    pub fn set(&mut self, key: &str, value: Real) -> ParamSlot {
        let kind = self.kind();
        match self.slot_mut(key) {
            Some(slot) => {
                *slot = Some(value);
                match spec_for(kind, key) {
                    Some(spec) => ParamSlot::Recognized(spec),
                    None => ParamSlot::Unrecognized,
                }
            }
            None => {
                self.extra.insert(key.to_string(), value);
                ParamSlot::Unrecognized
            }
        }
    }

    /// Value clamped to its schema bounds; unrecognized keys pass through.
    pub fn clamped(&self, key: &str) -> Option<Real> {
        let value = self.get(key)?;
        match spec_for(self.kind(), key) {
            Some(spec) => Some(spec.bounds.clamp(value)),
            None => Some(value),
        }
    }

    /// Recognized values currently outside their bounds.
    pub fn out_of_bounds(&self) -> Vec<(&'static ParamSpec, Real)> {
        self.specs()
            .iter()
            .filter_map(|spec| {
                let value = self.get(spec.key)?;
                (!spec.bounds.contains(value)).then_some((spec, value))
            })
            .collect()
    }

    /// Flat key/value view: recognized values that are set, then extras.
    pub fn to_flat(&self) -> BTreeMap<String, Real> {
        let mut flat = self.extra.clone();
        for spec in self.specs() {
            if let Some(value) = self.get(spec.key) {
                flat.insert(spec.key.to_string(), value);
            }
        }
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_per_kind() {
        let capture = NodeParams::defaults(NodeKind::Capture);
        assert_eq!(capture.get(BASE_FLOW), Some(100.0));
        assert_eq!(capture.get(EFFICIENCY), Some(90.0));
        assert_eq!(capture.get(DROPOUT_RATE), Some(0.05));

        let transport = NodeParams::defaults(NodeKind::Transport);
        assert_eq!(transport.get(BASE_LEAKAGE), Some(2.0));
        assert_eq!(transport.get(BASE_FLOW), None);

        let storage = NodeParams::defaults(NodeKind::Storage);
        assert_eq!(storage.get(BASE_PRESSURE), Some(50.0));

        let utilization = NodeParams::defaults(NodeKind::Utilization);
        assert_eq!(utilization.get(CONVERSION_RATE), Some(95.0));
        assert_eq!(utilization.get(DROPOUT_RATE), Some(0.01));
    }

    #[test]
    fn foreign_keys_are_preserved_not_interpreted() {
        let mut params = NodeParams::defaults(NodeKind::Storage);
        // base_flow belongs to capture nodes
        assert_eq!(params.set(BASE_FLOW, 12.0), ParamSlot::Unrecognized);
        assert_eq!(params.set("tier_level", 2.0), ParamSlot::Unrecognized);
        assert_eq!(params.get(BASE_FLOW), Some(12.0));
        assert!(params.out_of_bounds().is_empty());

        let flat = params.to_flat();
        assert_eq!(flat.get("tier_level"), Some(&2.0));
        assert_eq!(flat.get(BASE_PRESSURE), Some(&50.0));
    }

    #[test]
    fn out_of_range_is_stored_but_clamped_on_read() {
        let mut params = NodeParams::defaults(NodeKind::Capture);
        let slot = params.set(EFFICIENCY, 130.0);
        assert!(matches!(slot, ParamSlot::Recognized(spec) if spec.bounds == Bounds::Percent));
        params.set(DROPOUT_RATE, 1.4);

        assert_eq!(params.get(EFFICIENCY), Some(130.0));
        assert_eq!(params.clamped(EFFICIENCY), Some(100.0));
        assert_eq!(params.clamped(DROPOUT_RATE), Some(1.0));

        let violations: Vec<&str> = params
            .out_of_bounds()
            .iter()
            .map(|(spec, _)| spec.key)
            .collect();
        assert_eq!(violations, vec![EFFICIENCY, DROPOUT_RATE]);
    }

    #[test]
    fn from_flat_routes_keys() {
        let params = NodeParams::from_flat(
            NodeKind::Transport,
            [(BASE_LEAKAGE, 1.2), (DROPOUT_RATE, 0.02), ("note", 7.0)],
        );
        assert_eq!(
            params.values,
            KindParams::Transport {
                base_leakage: Some(1.2)
            }
        );
        assert_eq!(params.dropout_rate, Some(0.02));
        assert_eq!(params.extra.get("note"), Some(&7.0));
    }

    #[test]
    fn empty_params_project_to_empty_map() {
        let params = NodeParams::empty(NodeKind::Utilization);
        assert!(params.to_flat().is_empty());
    }
}
