//! `FernSim` event queue and scheduler (spec §4.7).
//!
//! Ties on `deliver_at_ms` are broken by reservoir sampling over the PRNG
//! rather than insertion order, so that two simulations seeded identically
//! produce an identical event sequence regardless of the order callers
//! happened to call `schedule` in.

use crate::sim::clock::VirtualClock;
use crate::sim::rng::XorShiftRng;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub actor_id: u64,
    pub deliver_at_ms: u64,
    pub sequence: u64,
}

pub struct FernSim {
    clock: VirtualClock,
    rng: XorShiftRng,
    events: Vec<Event>,
    next_sequence: u64,
}

impl FernSim {
    pub fn new(seed: u64) -> Self {
        FernSim {
            clock: VirtualClock::new(),
            rng: XorShiftRng::new(seed),
            events: Vec::new(),
            next_sequence: 0,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn advance_ms(&mut self, delta: u64) {
        self.clock.advance_ms(delta);
    }

    /// Queue an event for `actor` to fire `delay_ms` from the current
    /// virtual time.
    pub fn schedule(&mut self, actor_id: u64, delay_ms: u64) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.events.push(Event {
            actor_id,
            deliver_at_ms: self.clock.now_ms() + delay_ms,
            sequence,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Select and remove the event with the smallest `deliver_at_ms`. Ties
    /// are broken with reservoir sampling: walk the tied candidates in
    /// queue order, keeping a running winner; the k-th tying candidate
    /// replaces the current winner with probability `1/k` (spec §4.7).
    /// Advances the virtual clock to the winner's deadline if it lies in
    /// the future. Removal is swap-with-last, so queue order is not
    /// preserved across calls.
    pub fn step(&mut self) -> Option<Event> {
        if self.events.is_empty() {
            return None;
        }

        let min_deadline = self.events.iter().map(|e| e.deliver_at_ms).min()?;

        let mut winner_idx = None;
        let mut tie_count: u64 = 0;
        for (idx, event) in self.events.iter().enumerate() {
            if event.deliver_at_ms != min_deadline {
                continue;
            }
            tie_count += 1;
            if winner_idx.is_none() || self.rng.next_below(tie_count) == 0 {
                winner_idx = Some(idx);
            }
        }

        let idx = winner_idx?;
        let winner = self.events.swap_remove(idx);
        self.clock.advance_to(winner.deliver_at_ms);
        Some(winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_orders_by_smallest_deadline_first() {
        let mut sim = FernSim::new(0xDEADBEEF);
        sim.schedule(10, 12);
        sim.schedule(20, 3);
        sim.schedule(30, 7);

        let first = sim.step().unwrap();
        let second = sim.step().unwrap();
        let third = sim.step().unwrap();

        assert_eq!((first.actor_id, first.deliver_at_ms), (20, 3));
        assert_eq!((second.actor_id, second.deliver_at_ms), (30, 7));
        assert_eq!((third.actor_id, third.deliver_at_ms), (10, 12));
        assert!(sim.is_empty());
    }

    #[test]
    fn same_seed_and_schedule_produce_identical_sequences() {
        let run = |seed: u64| {
            let mut sim = FernSim::new(seed);
            sim.schedule(10, 12);
            sim.schedule(20, 3);
            sim.schedule(30, 7);
            let mut order = Vec::new();
            while let Some(event) = sim.step() {
                order.push(event.actor_id);
            }
            order
        };
        assert_eq!(run(0xDEADBEEF), run(0xDEADBEEF));
    }

    #[test]
    fn clock_advances_to_each_stepped_deadline() {
        let mut sim = FernSim::new(1);
        sim.schedule(1, 5);
        assert_eq!(sim.now_ms(), 0);
        sim.step();
        assert_eq!(sim.now_ms(), 5);
    }

    #[test]
    fn tie_breaking_is_deterministic_per_seed() {
        let run = || {
            let mut sim = FernSim::new(777);
            sim.schedule(1, 10);
            sim.schedule(2, 10);
            sim.schedule(3, 10);
            let mut order = Vec::new();
            while let Some(event) = sim.step() {
                order.push(event.actor_id);
            }
            order
        };
        assert_eq!(run(), run());
    }
}
