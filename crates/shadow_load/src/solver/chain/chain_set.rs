use crate::problem::{standstill::Standstill, stop::StopIdx, vehicle::VehicleIdx};

use super::error::ChainError;

/// Singly anchored stop chains, one per vehicle.
///
/// `previous` is the planning variable: it decides the order and, by walking
/// back to the anchor, the owning vehicle. `next` and `first` are derived
/// back-references kept in sync by the mutation primitives; they are plain
/// indices into the stop arena so re-linking never fights ownership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSet {
    previous: Vec<Option<Standstill>>,
    next: Vec<Option<StopIdx>>,
    first: Vec<Option<StopIdx>>,
}

impl ChainSet {
    pub fn new(num_stops: usize, num_vehicles: usize) -> Self {
        Self {
            previous: vec![None; num_stops],
            next: vec![None; num_stops],
            first: vec![None; num_vehicles],
        }
    }

    #[inline]
    pub fn num_stops(&self) -> usize {
        self.previous.len()
    }

    #[inline]
    pub fn next(&self, stop: StopIdx) -> Option<StopIdx> {
        self.next[stop.get()]
    }

    #[inline]
    pub fn previous(&self, stop: StopIdx) -> Option<Standstill> {
        self.previous[stop.get()]
    }

    #[inline]
    pub fn first_stop(&self, vehicle: VehicleIdx) -> Option<StopIdx> {
        self.first[vehicle.get()]
    }

    #[inline]
    pub fn is_assigned(&self, stop: StopIdx) -> bool {
        self.previous[stop.get()].is_some()
    }

    /// The stop right after `standstill`, whatever kind of standstill it is.
    #[inline]
    pub fn next_of(&self, standstill: Standstill) -> Option<StopIdx> {
        match standstill {
            Standstill::Vehicle(vehicle) => self.first_stop(vehicle),
            Standstill::Stop(stop) => self.next(stop),
        }
    }

    /// Resolves the vehicle anchoring `stop` by following `previous` links.
    ///
    /// The walk is bounded by the number of stops, so a cycle is reported
    /// instead of looping.
    pub fn owner(&self, stop: StopIdx) -> Result<VehicleIdx, ChainError> {
        let mut current = stop;
        for _ in 0..=self.num_stops() {
            match self.previous(current) {
                Some(Standstill::Vehicle(vehicle)) => return Ok(vehicle),
                Some(Standstill::Stop(previous)) => current = previous,
                None => return Err(ChainError::StopNotInChain(stop)),
            }
        }

        Err(ChainError::CycleDetected {
            stop,
            steps: self.num_stops() + 1,
        })
    }

    /// Vehicle owning `standstill`: the anchor itself or the owner of a stop.
    pub fn owner_of(&self, standstill: Standstill) -> Result<VehicleIdx, ChainError> {
        match standstill {
            Standstill::Vehicle(vehicle) => Ok(vehicle),
            Standstill::Stop(stop) => self.owner(stop),
        }
    }

    /// Iterates the chain of `vehicle` in order. Iteration stops after
    /// `num_stops` elements even if the chain is corrupted.
    pub fn stops(&self, vehicle: VehicleIdx) -> ChainIter<'_> {
        ChainIter {
            chains: self,
            current: self.first_stop(vehicle),
            remaining: self.num_stops(),
        }
    }

    pub fn chain_len(&self, vehicle: VehicleIdx) -> usize {
        self.stops(vehicle).count()
    }

    /// Links the unassigned `stop` right after `anchor`.
    ///
    /// Returns the stop that used to follow `anchor`; its predecessor is now
    /// `stop`.
    pub fn insert_after(
        &mut self,
        stop: StopIdx,
        anchor: Standstill,
    ) -> Result<Option<StopIdx>, ChainError> {
        if let Some(previous) = self.previous(stop) {
            return Err(ChainError::StopAlreadyAssigned { stop, previous });
        }
        if anchor == Standstill::Stop(stop) {
            return Err(ChainError::SelfLink(stop));
        }
        if let Standstill::Stop(anchor_stop) = anchor
            && !self.is_assigned(anchor_stop)
        {
            return Err(ChainError::StopNotInChain(anchor_stop));
        }

        let successor = self.next_of(anchor);
        self.set_next_of(anchor, Some(stop));
        self.previous[stop.get()] = Some(anchor);
        self.next[stop.get()] = successor;
        if let Some(successor) = successor {
            self.previous[successor.get()] = Some(Standstill::Stop(stop));
        }

        Ok(successor)
    }

    /// Unlinks `stop` and re-links its successor to its predecessor.
    ///
    /// Returns the successor whose predecessor changed.
    pub fn detach(&mut self, stop: StopIdx) -> Result<Option<StopIdx>, ChainError> {
        let previous = self
            .previous(stop)
            .ok_or(ChainError::StopNotInChain(stop))?;
        let successor = self.next(stop);

        self.set_next_of(previous, successor);
        if let Some(successor) = successor {
            self.previous[successor.get()] = Some(previous);
        }
        self.previous[stop.get()] = None;
        self.next[stop.get()] = None;

        Ok(successor)
    }

    /// Exchanges everything after `a` with everything after `b`.
    ///
    /// Both standstills must sit in different chains. Returns the new heads
    /// following `a` and `b` respectively.
    pub fn swap_tails(
        &mut self,
        a: Standstill,
        b: Standstill,
    ) -> Result<(Option<StopIdx>, Option<StopIdx>), ChainError> {
        let owner_a = self.owner_of(a)?;
        let owner_b = self.owner_of(b)?;
        if owner_a == owner_b {
            return Err(ChainError::SameVehicle(owner_a));
        }

        let tail_a = self.next_of(a);
        let tail_b = self.next_of(b);

        self.set_next_of(a, tail_b);
        if let Some(head) = tail_b {
            self.previous[head.get()] = Some(a);
        }
        self.set_next_of(b, tail_a);
        if let Some(head) = tail_a {
            self.previous[head.get()] = Some(b);
        }

        Ok((tail_b, tail_a))
    }

    fn set_next_of(&mut self, standstill: Standstill, next: Option<StopIdx>) {
        match standstill {
            Standstill::Vehicle(vehicle) => self.first[vehicle.get()] = next,
            Standstill::Stop(stop) => self.next[stop.get()] = next,
        }
    }

    /// Overwrites the links of `stop` without keeping the back-references in
    /// sync. Only used to build malformed chains in tests.
    #[cfg(test)]
    pub(crate) fn set_links_unchecked(
        &mut self,
        stop: StopIdx,
        previous: Option<Standstill>,
        next: Option<StopIdx>,
    ) {
        self.previous[stop.get()] = previous;
        self.next[stop.get()] = next;
    }
}

pub struct ChainIter<'a> {
    chains: &'a ChainSet,
    current: Option<StopIdx>,
    remaining: usize,
}

impl Iterator for ChainIter<'_> {
    type Item = StopIdx;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let stop = self.current?;
        self.remaining -= 1;
        self.current = self.chains.next(stop);

        Some(stop)
    }
}
