use serde::Serialize;

use crate::define_index_newtype;

use super::{depot::DepotIdx, stop::Demand};

define_index_newtype!(VehicleIdx, Vehicle);

#[derive(Serialize, Debug, Clone)]
pub struct Vehicle {
    external_id: u64,
    capacity: Demand,
    depot_id: DepotIdx,
}

impl Vehicle {
    pub fn external_id(&self) -> u64 {
        self.external_id
    }

    pub fn capacity(&self) -> Demand {
        self.capacity
    }

    pub fn depot_id(&self) -> DepotIdx {
        self.depot_id
    }

    /// Demand above capacity, zero when the load fits.
    pub fn overload(&self, current_demand: Demand) -> Demand {
        (current_demand - self.capacity).max(0)
    }
}

#[derive(Default)]
pub struct VehicleBuilder {
    external_id: Option<u64>,
    capacity: Option<Demand>,
    depot_id: Option<usize>,
}

impl VehicleBuilder {
    pub fn set_external_id(&mut self, external_id: u64) -> &mut VehicleBuilder {
        self.external_id = Some(external_id);
        self
    }

    pub fn set_capacity(&mut self, capacity: Demand) -> &mut VehicleBuilder {
        self.capacity = Some(capacity);
        self
    }

    pub fn set_depot_id(&mut self, depot_id: usize) -> &mut VehicleBuilder {
        self.depot_id = Some(depot_id);
        self
    }

    pub fn build(self) -> Vehicle {
        Vehicle {
            external_id: self.external_id.unwrap_or_default(),
            capacity: self.capacity.unwrap_or_default(),
            depot_id: self.depot_id.unwrap_or_default().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let mut builder = VehicleBuilder::default();
        builder.set_external_id(7).set_capacity(200).set_depot_id(1);
        let vehicle = builder.build();

        assert_eq!(vehicle.external_id(), 7);
        assert_eq!(vehicle.capacity(), 200);
        assert_eq!(vehicle.depot_id(), DepotIdx::new(1));
    }

    #[test]
    fn test_overload() {
        let mut builder = VehicleBuilder::default();
        builder.set_capacity(10);
        let vehicle = builder.build();

        assert_eq!(vehicle.overload(4), 0);
        assert_eq!(vehicle.overload(10), 0);
        assert_eq!(vehicle.overload(13), 3);
    }
}
