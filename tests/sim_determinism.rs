//! `FernSim` determinism (spec §8 concrete scenario 6, spec §4.7).

use ferncore::sim::FernSim;

#[test]
fn scenario_6_distinct_deadlines_step_in_deadline_order() {
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
    assert!(sim.step().is_none());
}

#[test]
fn same_seed_reproduces_the_same_event_sequence() {
    let run = |seed: u64| {
        let mut sim = FernSim::new(seed);
        sim.schedule(1, 50);
        sim.schedule(2, 10);
        sim.schedule(3, 10);
        sim.schedule(4, 30);
        let mut order = Vec::new();
        while let Some(event) = sim.step() {
            order.push((event.actor_id, event.deliver_at_ms));
        }
        order
    };
    assert_eq!(run(42), run(42));
}

#[test]
fn different_seeds_can_break_ties_differently() {
    let run = |seed: u64| {
        let mut sim = FernSim::new(seed);
        sim.schedule(1, 10);
        sim.schedule(2, 10);
        sim.schedule(3, 10);
        sim.schedule(4, 10);
        sim.schedule(5, 10);
        let mut order = Vec::new();
        while let Some(event) = sim.step() {
            order.push(event.actor_id);
        }
        order
    };
    let orders: Vec<Vec<u64>> = (0..20).map(run).collect();
    assert!(
        orders.windows(2).any(|w| w[0] != w[1]),
        "expected at least one differing tie-break order across 20 seeds"
    );
}

#[test]
fn zero_seed_is_normalized_to_a_nonzero_generator_state() {
    let mut sim = FernSim::new(0);
    sim.schedule(1, 5);
    sim.schedule(2, 5);
    let first = sim.step().unwrap();
    assert!(first.actor_id == 1 || first.actor_id == 2);
}

#[test]
fn virtual_clock_only_advances_through_step() {
    let mut sim = FernSim::new(9);
    sim.schedule(1, 100);
    assert_eq!(sim.now_ms(), 0);
    sim.advance_ms(40);
    assert_eq!(sim.now_ms(), 40);
    sim.step();
    assert_eq!(sim.now_ms(), 100);
}
