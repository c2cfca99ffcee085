use std::path::Path;

use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use super::error::ImportError;

pub trait DatasetParser {
    fn parse_str(&self, content: &str) -> Result<VehicleRoutingProblem, ImportError>;

    fn parse<P: AsRef<Path>>(&self, file: P) -> Result<VehicleRoutingProblem, ImportError> {
        let content = std::fs::read_to_string(file)?;
        self.parse_str(&content)
    }
}
