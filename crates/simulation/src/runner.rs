//! Simulation driver.

use crate::{InitialCondition, SimulationConfig, SimulationError, Trajectory};
use epinet_core::CompartmentProcess;
use epinet_sampling::choose_weighted;
use epinet_types::{Compartment, Event, Network, NodeId};
use indexmap::IndexMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

/// Drives a [`CompartmentProcess`] with a seeded random stream.
///
/// Handles initial placement of nodes, stepping, and recording of count
/// trajectories. All randomness comes from one `ChaCha8Rng` seeded from
/// [`SimulationConfig::seed`], so a seed reproduces a run exactly.
pub struct CompartmentSimulation<N> {
    process: CompartmentProcess<N>,
    rng: ChaCha8Rng,
    config: SimulationConfig,
    /// Highest post-step count of each compartment while recording.
    maxima: IndexMap<Compartment, usize>,
}

impl<N: Network> CompartmentSimulation<N> {
    /// Wrap `process`, validating `config` and seeding the generator.
    pub fn new(
        process: CompartmentProcess<N>,
        config: SimulationConfig,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);

        info!(seed = config.seed, "Created simulation");
        Ok(Self {
            process,
            rng,
            config,
            maxima: IndexMap::new(),
        })
    }

    /// Reset the process and place every node per `initial`.
    pub fn reset(&mut self, initial: &InitialCondition) -> Result<(), SimulationError> {
        self.process.reset()?;

        let fallback = initial
            .default
            .clone()
            .unwrap_or_else(|| self.process.default_compartment().clone());
        let nodes: Vec<NodeId> = self.process.network().nodes().collect();

        for node in nodes {
            let compartment = if let Some(compartment) = initial.explicit.get(&node) {
                compartment.clone()
            } else if !initial.distribution.is_empty() {
                choose_weighted(initial.distribution.iter().cloned(), &mut self.rng)?
            } else {
                fallback.clone()
            };
            self.set_node(node, compartment)?;
        }

        self.maxima.clear();
        info!(
            live_events = self.process.live_events(),
            "Reset simulation"
        );
        Ok(())
    }

    /// Move `node` into `compartment` unless it is already there.
    ///
    /// Returns whether a transition was applied.
    pub fn set_node(
        &mut self,
        node: NodeId,
        compartment: impl Into<Compartment>,
    ) -> Result<bool, SimulationError> {
        let compartment = compartment.into();
        if self.process.compartment(node) == Some(&compartment) {
            return Ok(false);
        }
        self.process.change_node_compartment(node, compartment)?;
        Ok(true)
    }

    /// Fire the next event. Returns `None` once no events remain.
    pub fn step(&mut self) -> Result<Option<(Event, f64)>, SimulationError> {
        Ok(self.process.next(&mut self.rng)?)
    }

    /// Fire up to `n` events, returning how many fired.
    pub fn nsteps(&mut self, n: usize) -> Result<usize, SimulationError> {
        for fired in 0..n {
            if self.step()?.is_none() {
                return Ok(fired);
            }
        }
        Ok(n)
    }

    /// Iterate over fired events until none remain.
    ///
    /// Stops after the first error.
    pub fn events(&mut self) -> Events<'_, N> {
        Events {
            simulation: self,
            done: false,
        }
    }

    /// Run until no events remain or a bound in the record configuration
    /// is hit, sampling counts along the way.
    pub fn record(&mut self) -> Result<Trajectory, SimulationError> {
        let (trajectory, ()) = self.record_with((), |(), _| ())?;
        Ok(trajectory)
    }

    /// Like [`record`](Self::record), also folding `fold` over the counts
    /// after every step.
    pub fn record_with<A, F>(
        &mut self,
        init: A,
        mut fold: F,
    ) -> Result<(Trajectory, A), SimulationError>
    where
        F: FnMut(A, &IndexMap<Compartment, usize>) -> A,
    {
        let record = self.config.record;
        let mut trajectory = Trajectory::new(self.process.alphabet());
        let mut acc = init;
        let mut iterations: u64 = 0;

        info!(
            time = self.process.time(),
            live_events = self.process.live_events(),
            "Recording started"
        );

        while self.process.unfinished() && record.within_bounds(self.process.time(), iterations) {
            if self.step()?.is_none() {
                break;
            }
            iterations += 1;

            let counts = self.process.counts();
            if iterations % record.trim as u64 == 0 {
                trajectory.push(self.process.time(), counts);
            }
            if record.track_maxima {
                for (compartment, &count) in counts {
                    let max = self.maxima.entry(compartment.clone()).or_insert(0);
                    *max = (*max).max(count);
                }
            }
            acc = fold(acc, counts);
        }

        if self.process.unfinished() && record.max_iterations == Some(iterations) {
            warn!(
                iterations,
                live_events = self.process.live_events(),
                "Recording stopped on max_iterations with events still live"
            );
        } else {
            debug!(iterations, "Recording loop exited");
        }
        info!(
            iterations,
            samples = trajectory.len(),
            time = self.process.time(),
            "Recording finished"
        );
        Ok((trajectory, acc))
    }

    /// Highest count each compartment reached after a recorded step since
    /// the last reset.
    ///
    /// The initial state is not a recorded step, so this stays empty until
    /// a [`record`](Self::record) run takes a step with maxima tracking on.
    pub fn maxima(&self) -> &IndexMap<Compartment, usize> {
        &self.maxima
    }

    /// The underlying process.
    pub fn process(&self) -> &CompartmentProcess<N> {
        &self.process
    }

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.process.time()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}

/// Iterator over fired events, from [`CompartmentSimulation::events`].
pub struct Events<'a, N> {
    simulation: &'a mut CompartmentSimulation<N>,
    done: bool,
}

impl<N: Network> Iterator for Events<'_, N> {
    type Item = Result<(Event, f64), SimulationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.simulation.step() {
            Ok(Some(fired)) => Some(Ok(fired)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
