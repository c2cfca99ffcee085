use std::{
    iter::{Enumerate, Peekable},
    str::{FromStr, Lines},
};

use jiff::SignedDuration;
use tracing::{Level, debug, instrument, warn};

use crate::{
    parsers::{error::ImportError, parser::DatasetParser},
    problem::{
        depot::Depot,
        location::{Location, LocationIdx},
        stop::{Demand, StopBuilder},
        time_window::TimeWindow,
        vehicle::VehicleBuilder,
        vehicle_routing_problem::{
            DueTimeWarning, VehicleRoutingProblem, VehicleRoutingProblemBuilder,
        },
    },
    timer_debug,
};

const COLUMN_HEADER: &str = "CUST NO. XCOORD. YCOORD. DEMAND READY TIME DUE DATE SERVICE TIME";
const RECORD_TOKENS: usize = 7;

/// Reads the time-windowed Solomon text format. The first customer record is
/// the depot; customers without demand are not part of the problem.
pub struct SolomonParser;

impl DatasetParser for SolomonParser {
    #[instrument(skip_all, level = Level::DEBUG)]
    fn parse_str(&self, content: &str) -> Result<VehicleRoutingProblem, ImportError> {
        let instance = timer_debug!("Parsed Solomon instance", parse(content))?;
        instance.into_problem()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleGroup {
    pub count: usize,
    pub capacity: Demand,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub demand: Demand,
    pub ready: SignedDuration,
    pub due: SignedDuration,
    pub service_duration: SignedDuration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolomonInstance {
    pub name: String,
    pub vehicle_groups: Vec<VehicleGroup>,
    pub records: Vec<CustomerRecord>,
}

impl SolomonInstance {
    pub fn into_problem(self) -> Result<VehicleRoutingProblem, ImportError> {
        let (depot_record, customer_records) = self
            .records
            .split_first()
            .ok_or(ImportError::MissingDepot)?;

        if depot_record.demand != 0 {
            return Err(ImportError::DepotDemand {
                depot_id: depot_record.id,
                demand: depot_record.demand,
            });
        }
        if !depot_record.service_duration.is_zero() {
            return Err(ImportError::DepotServiceDuration {
                depot_id: depot_record.id,
                duration: depot_record.service_duration,
            });
        }

        let locations = self
            .records
            .iter()
            .map(|record| Location::from_cartesian(record.id, record.x, record.y))
            .collect::<Vec<_>>();

        let depots = vec![Depot::new(
            depot_record.id,
            LocationIdx::new(0),
            TimeWindow::new(depot_record.ready, depot_record.due),
        )];
        let depot = &depots[0];
        let depot_location = &locations[depot.location_id()];
        let depot_due = depot.time_window().due();

        let mut builder = VehicleRoutingProblemBuilder::default();
        let mut stops = Vec::with_capacity(customer_records.len());

        for (index, record) in customer_records.iter().enumerate() {
            let location_id = index + 1;

            if record.demand < 0 {
                return Err(ImportError::NegativeDemand {
                    customer_id: record.id,
                    demand: record.demand,
                });
            }
            if record.demand == 0 {
                debug!(customer = record.id, "Skipping customer without demand");
                continue;
            }

            // Serving the customer must still allow reaching the depot before it closes
            let distance = locations[location_id].distance_millis(depot_location);
            let maximum_due =
                depot_due - record.service_duration - SignedDuration::from_millis(distance);

            let mut time_window = TimeWindow::new(record.ready, record.due);
            if let Some(correction) = time_window.clamp_due(maximum_due) {
                warn!(
                    customer = record.id,
                    due = ?correction.original,
                    maximum_due = ?correction.corrected,
                    depot_due = ?depot_due,
                    "Customer due time reduced because of the depot's due time"
                );
                builder.add_warning(DueTimeWarning {
                    stop_external_id: record.id,
                    correction,
                });
            }

            let mut stop_builder = StopBuilder::default();
            stop_builder
                .set_external_id(record.id)
                .set_location_id(location_id)
                .set_demand(record.demand)
                .set_time_window(time_window)
                .set_service_duration(record.service_duration);
            stops.push(stop_builder.build());
        }

        let vehicles = self
            .vehicle_groups
            .iter()
            .flat_map(|group| std::iter::repeat_n(group.capacity, group.count))
            .enumerate()
            .map(|(index, capacity)| {
                let mut vehicle_builder = VehicleBuilder::default();
                vehicle_builder
                    .set_external_id(index as u64)
                    .set_capacity(capacity)
                    .set_depot_id(index % depots.len());
                vehicle_builder.build()
            })
            .collect::<Vec<_>>();

        if vehicles.is_empty() {
            return Err(ImportError::MissingVehicles);
        }

        builder
            .set_name(self.name)
            .set_locations(locations)
            .set_depots(depots)
            .set_vehicles(vehicles)
            .set_stops(stops);

        Ok(builder.build())
    }
}

pub fn parse(text: &str) -> Result<SolomonInstance, ImportError> {
    let mut reader = LineReader::new(text);

    let (_, name) = reader.next_non_blank("instance name")?;

    reader.expect_header("VEHICLE")?;
    reader.expect_header("NUMBER CAPACITY")?;

    let mut vehicle_groups = Vec::new();
    while let Some((line, content)) = reader.next_in_block() {
        let [count, capacity] = split_record::<2>(line, content)?;
        vehicle_groups.push(VehicleGroup {
            count: parse_number(line, count)?,
            capacity: parse_number(line, capacity)?,
        });
    }

    if vehicle_groups.is_empty() {
        return Err(ImportError::MissingVehicles);
    }

    reader.expect_header("CUSTOMER")?;
    reader.expect_header(COLUMN_HEADER)?;
    reader.skip_blank();

    let mut records = Vec::new();
    while let Some((line, content)) = reader.next_in_block() {
        let [id, x, y, demand, ready, due, service_duration] =
            split_record::<RECORD_TOKENS>(line, content)?;

        records.push(CustomerRecord {
            id: parse_number(line, id)?,
            x: parse_number(line, x)?,
            y: parse_number(line, y)?,
            demand: parse_number(line, demand)?,
            ready: parse_time(line, ready)?,
            due: parse_time(line, due)?,
            service_duration: parse_time(line, service_duration)?,
        });
    }

    Ok(SolomonInstance {
        name: name.to_owned(),
        vehicle_groups,
        records,
    })
}

/// Trimmed lines with their 1-based line number.
struct LineReader<'a> {
    lines: Peekable<Enumerate<Lines<'a>>>,
}

impl<'a> LineReader<'a> {
    fn new(text: &'a str) -> Self {
        LineReader {
            lines: text.lines().enumerate().peekable(),
        }
    }

    fn skip_blank(&mut self) {
        while self
            .lines
            .next_if(|(_, content)| content.trim().is_empty())
            .is_some()
        {}
    }

    fn next_non_blank(&mut self, expected: &'static str) -> Result<(usize, &'a str), ImportError> {
        self.skip_blank();
        self.lines
            .next()
            .map(|(index, content)| (index + 1, content.trim()))
            .ok_or(ImportError::UnexpectedEof { expected })
    }

    /// Next line of the current block, `None` on a blank line or at the end.
    fn next_in_block(&mut self) -> Option<(usize, &'a str)> {
        self.lines
            .next_if(|(_, content)| !content.trim().is_empty())
            .map(|(index, content)| (index + 1, content.trim()))
    }

    /// Whitespace between words is not significant.
    fn expect_header(&mut self, expected: &'static str) -> Result<(), ImportError> {
        let (line, content) = self.next_non_blank(expected)?;

        if content.split_whitespace().eq(expected.split_whitespace()) {
            Ok(())
        } else {
            Err(ImportError::UnexpectedLine {
                line,
                expected,
                found: content.to_owned(),
            })
        }
    }
}

fn split_record<const N: usize>(line: usize, content: &str) -> Result<[&str; N], ImportError> {
    let tokens = content.split_whitespace().collect::<Vec<_>>();

    <[&str; N]>::try_from(tokens.as_slice()).map_err(|_| ImportError::MalformedRecord {
        line,
        expected: N,
        found: tokens.len(),
    })
}

fn parse_number<T: FromStr>(line: usize, token: &str) -> Result<T, ImportError> {
    token.parse().map_err(|_| ImportError::InvalidNumber {
        line,
        token: token.to_owned(),
    })
}

/// Time units are read as integers and stored in milli-units.
fn parse_time(line: usize, token: &str) -> Result<SignedDuration, ImportError> {
    let units: i64 = parse_number(line, token)?;

    units
        .checked_mul(1000)
        .map(SignedDuration::from_millis)
        .ok_or_else(|| ImportError::InvalidNumber {
            line,
            token: token.to_owned(),
        })
}
