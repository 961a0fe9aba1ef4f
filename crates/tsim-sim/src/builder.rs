//! Fluent builder for constructing a [`Sim`].

use tracing::debug;

use tsim_agent::{AgentArena, AgentError, AgentRngs, PopulationBuilder};
use tsim_control::ControlReceiver;
use tsim_core::SimConfig;
use tsim_signal::SignalTable;
use tsim_spatial::{RoadGraph, Router};

use crate::{Sim, SimError, SimResult};

/// Fluent builder for [`Sim<R>`].
///
/// # Required inputs
///
/// - [`SimConfig`]: duration, seed, thresholds, …
/// - [`RoadGraph`]: from [`tsim_spatial::RoadGraphBuilder`]
/// - `R: Router`: the path search (e.g. [`tsim_spatial::ShortestPath`])
///
/// # Optional inputs (have defaults)
///
/// | Method                 | Default                                          |
/// |------------------------|--------------------------------------------------|
/// | `.signals(t)`          | One signal per tagged node, per `config.signals` |
/// | `.population(a, r)`    | `PopulationBuilder::from_config(&config)`        |
/// | `.control(rx)`         | No control channel                               |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config, graph, ShortestPath::hops())
///     .control(rx)
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder<R: Router> {
    config:     SimConfig,
    graph:      RoadGraph,
    router:     R,
    signals:    Option<SignalTable>,
    population: Option<(AgentArena, AgentRngs)>,
    control:    Option<ControlReceiver>,
}

impl<R: Router> SimBuilder<R> {
    pub fn new(config: SimConfig, graph: RoadGraph, router: R) -> Self {
        Self {
            config,
            graph,
            router,
            signals:    None,
            population: None,
            control:    None,
        }
    }

    /// Use an explicit signal table instead of the graph's tagged nodes.
    pub fn signals(mut self, table: SignalTable) -> Self {
        self.signals = Some(table);
        self
    }

    /// Use a prebuilt population.  `rngs` must have one entry per agent.
    pub fn population(mut self, agents: AgentArena, rngs: AgentRngs) -> Self {
        self.population = Some((agents, rngs));
        self
    }

    pub fn control(mut self, receiver: ControlReceiver) -> Self {
        self.control = Some(receiver);
        self
    }

    /// Validate inputs and return a ready-to-run [`Sim`].
    pub fn build(self) -> SimResult<Sim<R>> {
        self.config.validate()?;

        let signals = match self.signals {
            Some(table) => table,
            None => SignalTable::from_tagged_nodes(&self.graph, &self.config.signals)?,
        };

        let (agents, rngs) = match self.population {
            Some(pop) => pop,
            None => PopulationBuilder::from_config(&self.config).build(&self.graph, &self.router)?,
        };
        if rngs.len() != agents.len() {
            return Err(SimError::AgentCountMismatch {
                expected: agents.len(),
                got:      rngs.len(),
                what:     "agent RNGs",
            });
        }
        if let Some(agent) = agents.iter().find(|a| !self.graph.contains_node(a.current)) {
            return Err(AgentError::NodeNotFound(agent.current).into());
        }

        #[cfg(feature = "parallel")]
        let pool = match self.config.num_threads {
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| SimError::ThreadPool(e.to_string()))?,
            ),
            None => None,
        };

        debug!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            agents = agents.len(),
            signals = signals.len(),
            scope = ?signals.scope(),
            driver = ?signals.driver(),
            "simulation built"
        );

        Ok(Sim::assemble(
            self.config,
            self.graph,
            self.router,
            signals,
            agents,
            rngs,
            self.control,
            #[cfg(feature = "parallel")]
            pool,
        ))
    }
}
