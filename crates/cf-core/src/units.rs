// cf-core/src/units.rs

use uom::si::f64::{Mass as UomMass, MassRate as UomMassRate, Time as UomTime};

// Public canonical unit types (SI, f64)
pub type Mass = UomMass;
pub type MassRate = UomMassRate;
pub type Time = UomTime;

#[inline]
pub fn kgps(v: f64) -> MassRate {
    use uom::si::mass_rate::kilogram_per_second;
    MassRate::new::<kilogram_per_second>(v)
}

/// Flow rate given in kg/min, the unit the simulation service reports.
#[inline]
pub fn kg_per_min(v: f64) -> MassRate {
    kgps(v / 60.0)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn kg(v: f64) -> Mass {
    use uom::si::mass::kilogram;
    Mass::new::<kilogram>(v)
}

#[inline]
pub fn to_kg(m: Mass) -> f64 {
    use uom::si::mass::kilogram;
    m.get::<kilogram>()
}

/// Metric tonnes (1 t = 1 Mg).
#[inline]
pub fn to_tonnes(m: Mass) -> f64 {
    use uom::si::mass::megagram;
    m.get::<megagram>()
}

/// Mass moved by a constant rate over one sampling interval.
#[inline]
pub fn mass_over(rate: MassRate, dt: Time) -> Mass {
    rate * dt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_over_interval_in_kg() {
        // 180 kg/min for 5 s is 15 kg
        let m = mass_over(kg_per_min(180.0), s(5.0));
        assert!((to_kg(m) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn kg_to_tonnes() {
        assert!((to_tonnes(kg(2_500.0)) - 2.5).abs() < 1e-12);
    }
}
