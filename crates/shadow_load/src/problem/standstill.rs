use std::fmt;

use serde::Serialize;

use super::{stop::StopIdx, vehicle::VehicleIdx};

/// Something a stop can follow in a chain: either a vehicle (the chain
/// anchor, standing at its depot) or another stop.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Standstill {
    Vehicle(VehicleIdx),
    Stop(StopIdx),
}

impl From<StopIdx> for Standstill {
    fn from(stop_id: StopIdx) -> Self {
        Standstill::Stop(stop_id)
    }
}

impl From<VehicleIdx> for Standstill {
    fn from(vehicle_id: VehicleIdx) -> Self {
        Standstill::Vehicle(vehicle_id)
    }
}

impl fmt::Display for Standstill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Standstill::Vehicle(vehicle_id) => write!(f, "{vehicle_id}"),
            Standstill::Stop(stop_id) => write!(f, "{stop_id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{s, v};

    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Standstill::from(s(1)).to_string(), "Stop#1");
        assert_eq!(Standstill::from(v(0)).to_string(), "Vehicle#0");
    }
}
