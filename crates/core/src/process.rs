//! Compartment process state machine.

use crate::ProcessError;
use epinet_sampling::{EventScheduler, IndexedSet};
use epinet_types::{Compartment, EdgeRule, Event, Network, NodeId, Rate, RateTables};
use indexmap::{IndexMap, IndexSet};
use rand::Rng;
use tracing::{debug, info};

/// A continuous-time Markov process over the compartments of a network.
///
/// Holds the compartment of every node and the set of live events implied
/// by the rate tables and the current global state. Each transition
/// invalidates the events of the changed node and registers the ones its
/// new compartment implies, so the scheduler always holds exactly the
/// events the rules prescribe.
///
/// # Event bookkeeping
///
/// Every node keeps an index of the live events it participates in, as
/// actor or target. Edge events are listed under both endpoints; dropping
/// one through either endpoint drops it from the other as well, so each
/// index is exactly the set of scheduled events that reference its node.
pub struct CompartmentProcess<N> {
    network: N,
    rates: RateTables,
    default: Compartment,
    /// All compartments the process can reach, default first.
    alphabet: IndexSet<Compartment>,
    scheduler: EventScheduler<Event>,
    /// Per-node index of live events, indexed by `NodeId`.
    node_events: Vec<IndexedSet<Event>>,
    /// Current compartment of every node, indexed by `NodeId`.
    node_compartment: Vec<Compartment>,
    /// Number of nodes in each compartment of the alphabet.
    counts: IndexMap<Compartment, usize>,
    time: f64,
    steps: u64,
}

impl<N: Network> CompartmentProcess<N> {
    /// Build a process and reset it to the all-default state.
    ///
    /// Constant rates are validated here; weight-dependent rates are
    /// validated each time they are resolved.
    pub fn new(
        rates: RateTables,
        default: impl Into<Compartment>,
        network: N,
    ) -> Result<Self, ProcessError> {
        rates.validate()?;
        let default = default.into();
        let alphabet = rates.alphabet(&default);

        let mut process = Self {
            network,
            rates,
            default,
            alphabet,
            scheduler: EventScheduler::new(),
            node_events: Vec::new(),
            node_compartment: Vec::new(),
            counts: IndexMap::new(),
            time: 0.0,
            steps: 0,
        };
        process.reset()?;

        info!(
            nodes = process.node_count(),
            compartments = process.alphabet.len(),
            default = %process.default,
            "Created compartment process"
        );
        Ok(process)
    }

    /// Put every node back into the default compartment and rewind time.
    ///
    /// Events implied by the all-default state (the default compartment's
    /// node rule and the `(default, default)` edge rule) are registered.
    pub fn reset(&mut self) -> Result<(), ProcessError> {
        let node_count = self.network.node_count();

        self.scheduler.clear();
        self.node_events = (0..node_count).map(|_| IndexedSet::new()).collect();
        self.node_compartment = vec![self.default.clone(); node_count];
        self.counts = self.alphabet.iter().map(|c| (c.clone(), 0)).collect();
        self.counts.insert(self.default.clone(), node_count);
        self.time = 0.0;
        self.steps = 0;

        // Visit each ordered pair once, from its actor's side
        let nodes: Vec<NodeId> = self.network.nodes().collect();
        for node in nodes {
            let events = self.implied_events(node, &self.default, false)?;
            for event in events {
                self.register(event)?;
            }
        }

        debug!(
            live_events = self.scheduler.len(),
            "Reset compartment process"
        );
        Ok(())
    }

    /// Move `node` into `compartment`.
    ///
    /// Every event the node participates in is dropped, counts and the
    /// node mapping are updated, and the events implied by the new
    /// compartment are registered: the node rule of `compartment`, and for
    /// every neighbor the edge rules keyed by `(compartment, neighbor's)`
    /// and `(neighbor's, compartment)`.
    ///
    /// All new rates are resolved before anything is mutated, so an error
    /// leaves the process unchanged.
    pub fn change_node_compartment(
        &mut self,
        node: NodeId,
        compartment: Compartment,
    ) -> Result<(), ProcessError> {
        if !self.network.contains(node) {
            return Err(ProcessError::UnknownNode(node));
        }
        if !self.alphabet.contains(&compartment) {
            return Err(ProcessError::UnknownCompartment(compartment));
        }

        let events = self.implied_events(node, &compartment, true)?;

        self.invalidate(node);

        let previous = std::mem::replace(
            &mut self.node_compartment[node.index()],
            compartment.clone(),
        );
        if let Some(count) = self.counts.get_mut(&previous) {
            *count -= 1;
        }
        if let Some(count) = self.counts.get_mut(&compartment) {
            *count += 1;
        }

        let added = events.len();
        for event in events {
            self.register(event)?;
        }

        debug!(
            node = %node,
            from = %previous,
            to = %compartment,
            added,
            live_events = self.scheduler.len(),
            "Node changed compartment"
        );
        Ok(())
    }

    /// Fire the next event.
    ///
    /// Samples the next event and its waiting time, applies the transition
    /// to the event's target and advances the clock. Returns `None` once no
    /// events remain.
    ///
    /// If the transition fails, the event is put back and neither the
    /// clock nor the step count moves.
    pub fn next<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<Option<(Event, f64)>, ProcessError> {
        let Some((event, dt)) = self.scheduler.next(rng)? else {
            return Ok(None);
        };

        if let Err(e) = self.change_node_compartment(event.target, event.compartment.clone()) {
            // Nothing was applied; put the popped event back
            self.scheduler.insert(event.clone(), event.rate)?;
            return Err(e);
        }

        self.time += dt;
        self.steps += 1;
        Ok(Some((event, dt)))
    }

    /// Events the rules prescribe for `node` given the current state.
    ///
    /// Includes the node's own rule and edge events in both directions with
    /// each neighbor. After any transition this equals the node's event
    /// index.
    pub fn prescribed_events(&self, node: NodeId) -> Result<Vec<Event>, ProcessError> {
        let compartment = self
            .compartment(node)
            .ok_or(ProcessError::UnknownNode(node))?;
        self.implied_events(node, compartment, true)
    }

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of events fired since the last reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Whether any transition can still occur.
    pub fn unfinished(&self) -> bool {
        self.scheduler.unfinished()
    }

    /// Number of live events.
    pub fn live_events(&self) -> usize {
        self.scheduler.len()
    }

    /// The event scheduler.
    pub fn scheduler(&self) -> &EventScheduler<Event> {
        &self.scheduler
    }

    /// Node counts for every compartment of the alphabet.
    pub fn counts(&self) -> &IndexMap<Compartment, usize> {
        &self.counts
    }

    /// Number of nodes in `compartment` (0 for unknown names).
    pub fn count(&self, compartment: &str) -> usize {
        self.counts.get(compartment).copied().unwrap_or(0)
    }

    /// Current compartment of `node`.
    pub fn compartment(&self, node: NodeId) -> Option<&Compartment> {
        self.node_compartment.get(node.index())
    }

    /// Live events `node` participates in.
    pub fn node_events(&self, node: NodeId) -> impl Iterator<Item = &Event> {
        self.node_events.get(node.index()).into_iter().flat_map(|set| set.iter())
    }

    /// Every compartment the process knows, default first.
    pub fn alphabet(&self) -> &IndexSet<Compartment> {
        &self.alphabet
    }

    /// The compartment nodes start in after a reset.
    pub fn default_compartment(&self) -> &Compartment {
        &self.default
    }

    /// Number of nodes in the network.
    pub fn node_count(&self) -> usize {
        self.node_compartment.len()
    }

    /// The network the process runs on.
    pub fn network(&self) -> &N {
        &self.network
    }

    /// The rate tables.
    pub fn rates(&self) -> &RateTables {
        &self.rates
    }

    /// Events implied by `node` being in `compartment`, with neighbors in
    /// their current compartments.
    ///
    /// With `incoming` false only events where `node` is the actor (plus
    /// its node rule) are produced.
    fn implied_events(
        &self,
        node: NodeId,
        compartment: &Compartment,
        incoming: bool,
    ) -> Result<Vec<Event>, ProcessError> {
        let mut events = Vec::new();

        if let Some(rule) = self.rates.node_rule(compartment) {
            let rate = Rate::new(rule.rate).map_err(|source| ProcessError::InvalidRate {
                compartment: rule.target.clone(),
                source,
            })?;
            events.push(Event::intrinsic(node, rule.target.clone(), rate));
        }

        for neighbor in self.network.neighbors(node) {
            // A node cannot drive itself across an edge
            if neighbor == node {
                continue;
            }
            let Some(theirs) = self.node_compartment.get(neighbor.index()) else {
                return Err(ProcessError::UnknownNode(neighbor));
            };

            if let Some(rule) = self.rates.edge_rule(compartment, theirs) {
                let rate = self.resolve_edge_rate(node, neighbor, rule)?;
                events.push(Event::edge(node, neighbor, rule.target.clone(), rate));
            }
            if incoming {
                if let Some(rule) = self.rates.edge_rule(theirs, compartment) {
                    let rate = self.resolve_edge_rate(node, neighbor, rule)?;
                    events.push(Event::edge(neighbor, node, rule.target.clone(), rate));
                }
            }
        }

        Ok(events)
    }

    fn resolve_edge_rate(
        &self,
        a: NodeId,
        b: NodeId,
        rule: &EdgeRule,
    ) -> Result<Rate, ProcessError> {
        let weight = if rule.rate.needs_weight() {
            self.network
                .edge_weight(a, b)
                .ok_or(ProcessError::MissingEdgeWeight(a, b))?
        } else {
            // Ignored by constant rates
            1.0
        };
        rule.rate
            .resolve(weight)
            .map_err(|source| ProcessError::InvalidRate {
                compartment: rule.target.clone(),
                source,
            })
    }

    /// Schedule `event` and list it under both participants.
    fn register(&mut self, event: Event) -> Result<(), ProcessError> {
        self.scheduler.insert(event.clone(), event.rate)?;
        let partner = event.partner_of(event.actor);
        for node in std::iter::once(event.actor).chain(partner) {
            self.node_events[node.index()]
                .insert(event.clone())
                .map_err(|source| ProcessError::EventIndex { node, source })?;
        }
        Ok(())
    }

    /// Drop every live event `node` participates in.
    fn invalidate(&mut self, node: NodeId) {
        let events = self.node_events[node.index()].drain();
        for event in events {
            self.scheduler.remove(&event, event.rate);
            if let Some(partner) = event.partner_of(node) {
                self.node_events[partner.index()].try_remove(&event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epinet_sampling::SchedulerError;
    use epinet_test_helpers::networks;
    use epinet_test_helpers::stats::ks_exponential_passes;
    use epinet_types::{EdgeRate, StaticNetwork};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;
    use tracing_test::traced_test;

    fn sis() -> RateTables {
        RateTables::new().with_edge_rule("I", "S", "I", 1.0)
    }

    fn sir() -> RateTables {
        RateTables::new()
            .with_node_rule("I", "R", 0.5)
            .with_edge_rule("I", "S", "I", 1.0)
    }

    fn rate(value: f64) -> Rate {
        Rate::new(value).unwrap()
    }

    /// Check every bookkeeping invariant of the process.
    fn assert_consistent<N: Network>(process: &CompartmentProcess<N>) {
        let total: usize = process.counts().values().sum();
        assert_eq!(total, process.node_count(), "counts must cover every node");

        let mut referenced = HashSet::new();
        for node in process.network().nodes() {
            let indexed: HashSet<Event> = process.node_events(node).cloned().collect();
            let prescribed: HashSet<Event> =
                process.prescribed_events(node).unwrap().into_iter().collect();
            assert_eq!(indexed, prescribed, "event index of {node} is stale");
            for event in &indexed {
                assert!(process.scheduler().contains(event, event.rate));
            }
            referenced.extend(indexed);
        }
        assert_eq!(referenced.len(), process.live_events());
    }

    #[test]
    #[traced_test]
    fn test_two_node_sis() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut process = CompartmentProcess::new(sis(), "S", networks::pair(1.0)).unwrap();
        assert_eq!(process.live_events(), 0);

        process
            .change_node_compartment(NodeId(0), "I".into())
            .unwrap();
        assert!(logs_contain("Node changed compartment"));

        let live: Vec<&Event> = process.scheduler().events().map(|(e, _)| e).collect();
        assert_eq!(
            live,
            vec![&Event::edge(NodeId(0), NodeId(1), "I".into(), rate(1.0))]
        );
        assert_consistent(&process);

        let (event, dt) = process.next(&mut rng).unwrap().unwrap();
        assert_eq!(event.target, NodeId(1));
        assert!(dt > 0.0);
        assert_eq!(process.time(), dt);
        assert_eq!(process.compartment(NodeId(1)).unwrap().as_str(), "I");
        assert_eq!(process.count("S"), 0);
        assert_eq!(process.count("I"), 2);
        assert!(!process.unfinished());
        assert!(process.next(&mut rng).unwrap().is_none());
        assert_consistent(&process);
    }

    #[test]
    fn test_spontaneous_recovery() {
        let tables = RateTables::new().with_node_rule("I", "R", 0.5);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let network = StaticNetwork::new(1).unwrap();
        let mut process = CompartmentProcess::new(tables, "S", network).unwrap();

        let mut waits = Vec::new();
        for _ in 0..3_000 {
            process.reset().unwrap();
            process
                .change_node_compartment(NodeId(0), "I".into())
                .unwrap();
            assert_eq!(process.live_events(), 1);

            let (event, dt) = process.next(&mut rng).unwrap().unwrap();
            assert!(event.is_intrinsic());
            assert_eq!(event.compartment.as_str(), "R");
            assert_eq!(process.compartment(NodeId(0)).unwrap().as_str(), "R");
            assert!(!process.unfinished());
            waits.push(dt);
        }

        assert!(ks_exponential_passes(&waits, 0.5));
    }

    #[test]
    fn test_counts_and_events_stay_consistent() {
        let mut rng = ChaCha8Rng::seed_from_u64(2718);
        let tables = sir().with_node_rule("R", "S", 0.2);
        let mut process = CompartmentProcess::new(tables, "S", networks::complete(8)).unwrap();
        process
            .change_node_compartment(NodeId(3), "I".into())
            .unwrap();

        let mut fired = 0;
        while fired < 300 {
            let Some((event, _)) = process.next(&mut rng).unwrap() else {
                break;
            };
            assert!(!process.scheduler().contains(&event, event.rate));
            assert_consistent(&process);
            fired += 1;
        }
        assert_eq!(process.steps(), fired);
    }

    #[test]
    fn test_transition_drops_old_events() {
        let mut process = CompartmentProcess::new(sir(), "S", networks::star(3)).unwrap();
        process
            .change_node_compartment(NodeId(0), "I".into())
            .unwrap();
        // Hub infects each leaf, and recovers on its own
        assert_eq!(process.live_events(), 4);

        process
            .change_node_compartment(NodeId(0), "R".into())
            .unwrap();
        assert_eq!(process.live_events(), 0);
        for leaf in 1..=3 {
            assert_eq!(process.node_events(NodeId(leaf)).count(), 0);
        }
        assert_consistent(&process);
    }

    #[test]
    fn test_incoming_edge_events() {
        let mut process = CompartmentProcess::new(sir(), "S", networks::path(3)).unwrap();
        process
            .change_node_compartment(NodeId(0), "I".into())
            .unwrap();
        process
            .change_node_compartment(NodeId(2), "I".into())
            .unwrap();

        // Node 1 is driven from both sides
        let mut actors: Vec<NodeId> = process
            .node_events(NodeId(1))
            .map(|event| event.actor)
            .collect();
        actors.sort();
        assert_eq!(actors, vec![NodeId(0), NodeId(2)]);

        // Moving the middle node re-keys its edges from the other direction
        process
            .change_node_compartment(NodeId(1), "I".into())
            .unwrap();
        assert_eq!(process.node_events(NodeId(1)).count(), 1);
        assert_consistent(&process);
    }

    #[test]
    fn test_weight_dependent_rates() {
        let tables = RateTables::new().with_edge_rule("I", "S", "I", EdgeRate::of_weight(|w| 3.0 * w));
        let mut process = CompartmentProcess::new(tables, "S", networks::pair(2.0)).unwrap();
        process
            .change_node_compartment(NodeId(1), "I".into())
            .unwrap();

        let events: Vec<&Event> = process.node_events(NodeId(0)).collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].rate.get(), 6.0);
        assert_eq!(events[0].actor, NodeId(1));
    }

    #[test]
    fn test_failed_transition_changes_nothing() {
        // Rate function yields zero on light edges
        let tables = RateTables::new()
            .with_node_rule("I", "R", 1.0)
            .with_edge_rule("I", "S", "I", EdgeRate::of_weight(|w| if w < 1.0 { 0.0 } else { w }));
        let network = StaticNetwork::from_weighted_edges(3, [(0, 1, 2.0), (0, 2, 0.5)]).unwrap();
        let mut process = CompartmentProcess::new(tables, "S", network).unwrap();

        let err = process
            .change_node_compartment(NodeId(0), "I".into())
            .unwrap_err();
        assert!(matches!(err, ProcessError::InvalidRate { .. }));
        assert_eq!(process.compartment(NodeId(0)).unwrap().as_str(), "S");
        assert_eq!(process.count("S"), 3);
        assert_eq!(process.live_events(), 0);
        assert_consistent(&process);
    }

    #[test]
    fn test_failed_event_is_rescheduled() {
        // Infecting node 1 would put a zero rate on its light edge to node 2
        let tables = RateTables::new()
            .with_edge_rule("I", "S", "I", EdgeRate::of_weight(|w| if w < 1.0 { 0.0 } else { w }));
        let network = StaticNetwork::from_weighted_edges(3, [(0, 1, 2.0), (1, 2, 0.5)]).unwrap();
        let mut process = CompartmentProcess::new(tables, "S", network).unwrap();
        process
            .change_node_compartment(NodeId(0), "I".into())
            .unwrap();

        let pending = Event::edge(NodeId(0), NodeId(1), "I".into(), rate(2.0));
        assert_eq!(process.live_events(), 1);
        assert!(process.scheduler().contains(&pending, pending.rate));

        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let err = process.next(&mut rng).unwrap_err();
        assert!(matches!(err, ProcessError::InvalidRate { .. }));

        assert_eq!(process.live_events(), 1);
        assert!(process.scheduler().contains(&pending, pending.rate));
        assert_eq!(process.time(), 0.0);
        assert_eq!(process.steps(), 0);
        assert_eq!(process.compartment(NodeId(1)).unwrap().as_str(), "S");
        assert_consistent(&process);
    }

    #[test]
    fn test_overflowing_activity_stops_next() {
        let tables = RateTables::new().with_node_rule("I", "R", f64::MAX);
        let network = StaticNetwork::new(2).unwrap();
        let mut process = CompartmentProcess::new(tables, "S", network).unwrap();
        process
            .change_node_compartment(NodeId(0), "I".into())
            .unwrap();
        process
            .change_node_compartment(NodeId(1), "I".into())
            .unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(4);
        assert!(matches!(
            process.next(&mut rng),
            Err(ProcessError::Scheduler(SchedulerError::ActivityOverflow(_)))
        ));
        assert_eq!(process.live_events(), 2);
        assert_eq!(process.steps(), 0);
        assert_consistent(&process);
    }

    /// Network whose edges carry no weights.
    struct Unweighted(StaticNetwork);

    impl Network for Unweighted {
        fn node_count(&self) -> usize {
            self.0.node_count()
        }

        fn neighbors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
            self.0.neighbors(node)
        }

        fn edge_weight(&self, _a: NodeId, _b: NodeId) -> Option<f64> {
            None
        }
    }

    #[test]
    fn test_missing_edge_weight() {
        let tables = RateTables::new().with_edge_rule("I", "S", "I", EdgeRate::of_weight(|w| w));
        let mut process =
            CompartmentProcess::new(tables, "S", Unweighted(networks::pair(1.0))).unwrap();
        assert_eq!(
            process.change_node_compartment(NodeId(0), "I".into()),
            Err(ProcessError::MissingEdgeWeight(NodeId(0), NodeId(1)))
        );

        // Constant rates never look the weight up
        let mut constant =
            CompartmentProcess::new(sis(), "S", Unweighted(networks::pair(1.0))).unwrap();
        constant
            .change_node_compartment(NodeId(0), "I".into())
            .unwrap();
        assert_eq!(constant.live_events(), 1);
    }

    #[test]
    fn test_rejects_unknown_inputs() {
        let mut process = CompartmentProcess::new(sir(), "S", networks::pair(1.0)).unwrap();
        assert_eq!(
            process.change_node_compartment(NodeId(2), "I".into()),
            Err(ProcessError::UnknownNode(NodeId(2)))
        );
        assert_eq!(
            process.change_node_compartment(NodeId(0), "Q".into()),
            Err(ProcessError::UnknownCompartment("Q".into()))
        );

        let bad = RateTables::new().with_node_rule("I", "R", -1.0);
        assert!(matches!(
            CompartmentProcess::new(bad, "S", networks::pair(1.0)),
            Err(ProcessError::InvalidRateTable(_))
        ));
    }

    #[test]
    fn test_reset_registers_default_events() {
        // Susceptible nodes catch the infection spontaneously, and
        // susceptible pairs drive each other into a vaccinated state
        let tables = sir()
            .with_node_rule("S", "I", 0.1)
            .with_edge_rule("S", "S", "V", 0.3);
        let mut process = CompartmentProcess::new(tables, "S", networks::path(3)).unwrap();

        // Three node rules plus two directions on each of two edges
        assert_eq!(process.live_events(), 7);
        assert_consistent(&process);

        process
            .change_node_compartment(NodeId(1), "I".into())
            .unwrap();
        process.reset().unwrap();
        assert_eq!(process.live_events(), 7);
        assert_eq!(process.count("S"), 3);
        assert_eq!(process.time(), 0.0);
        assert_consistent(&process);
    }

    #[test]
    fn test_self_loops_are_ignored() {
        let tables = RateTables::new().with_edge_rule("S", "S", "I", 1.0);
        let network = StaticNetwork::from_edges(2, [(0, 0), (0, 1)]).unwrap();
        let process = CompartmentProcess::new(tables, "S", network).unwrap();
        // Only the real edge, in both directions
        assert_eq!(process.live_events(), 2);
        assert_consistent(&process);
    }

    #[test]
    fn test_same_seed_same_trajectory() {
        let run = |seed: u64| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut process = CompartmentProcess::new(sir(), "S", networks::ring(30)).unwrap();
            process
                .change_node_compartment(NodeId(0), "I".into())
                .unwrap();
            let mut history = Vec::new();
            while let Some((event, dt)) = process.next(&mut rng).unwrap() {
                history.push((event, dt));
            }
            history
        };
        assert_eq!(run(9), run(9));
    }
}
