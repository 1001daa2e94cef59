//! The simulation runner: dependency-ordered step loop over the engines
//! and the agent roster.
//!
//! Step order is fixed: risk, FX, metals, SDR, agents, snapshot commit.
//! A single seeded RNG is drawn in that order, and agents are visited in
//! roster order, so identical `(config, seed)` pairs produce
//! bit-identical results.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use agents::CentralBankAgent;
use engines::{FxEngine, MetalsEngine, RiskEngine, SdrEngine};
use types::{
    AssetClass, MarketState, Regime, SimResult, SimulationResult, StepSnapshot, Tick,
};

use crate::config::ScenarioConfig;

// =============================================================================
// SimulationClock
// =============================================================================

/// Step counter plus the step length in years.
#[derive(Debug, Clone, Copy)]
pub struct SimulationClock {
    tick: Tick,
    dt: f64,
}

impl SimulationClock {
    pub fn new(dt: f64) -> Self {
        Self { tick: 0, dt }
    }

    /// Last completed step (0 before the first step).
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Step length in years.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Elapsed simulated time in years.
    pub fn elapsed_years(&self) -> f64 {
        self.tick as f64 * self.dt
    }

    fn advance(&mut self) -> Tick {
        self.tick += 1;
        self.tick
    }
}

// =============================================================================
// SimulationStats
// =============================================================================

/// Running totals across the whole run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulationStats {
    pub interventions: u64,
    pub rebalances: u64,
    pub jump_events: u64,
    pub crisis_steps: u64,
}

// =============================================================================
// Simulation
// =============================================================================

/// The coupled simulation: four engines, an agent roster, and the
/// append-only result history.
pub struct Simulation {
    config: ScenarioConfig,
    clock: SimulationClock,
    rng: StdRng,
    risk: RiskEngine,
    fx: FxEngine,
    metals: MetalsEngine,
    sdr: SdrEngine,
    agents: Vec<CentralBankAgent>,
    market: MarketState,
    result: SimulationResult,
    stats: SimulationStats,
    stop: Arc<AtomicBool>,
}

impl Simulation {
    /// Validate the configuration and build all engines and agents.
    pub fn new(config: ScenarioConfig, seed: u64) -> SimResult<Self> {
        config.validate()?;
        let dt = config.dt();

        let risk = RiskEngine::new(config.risk.clone(), dt);
        let fx = FxEngine::new(config.fx.clone(), dt);
        let metals = MetalsEngine::new(config.metals.clone(), dt);
        let sdr = SdrEngine::new(config.sdr.clone());

        let market = MarketState {
            tick: 0,
            rates: fx.rates().clone(),
            regime: Regime::Calm,
            risk_index: risk.index(),
            event_occurred: false,
            gold_price: metals.gold_price(),
            silver_price: metals.silver_price(),
            sdr_value: sdr.value(fx.rates()),
        };

        let agents = config
            .roster
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                CentralBankAgent::new(
                    i as u32,
                    spec.name.clone(),
                    spec.domestic_currency,
                    spec.initial_reserves_usd,
                    spec.risk_tolerance,
                    spec.quota_share,
                    &config.policy,
                    market.rates.get(spec.domestic_currency),
                )
            })
            .collect();

        Ok(Self {
            clock: SimulationClock::new(dt),
            rng: StdRng::seed_from_u64(seed),
            risk,
            fx,
            metals,
            sdr,
            agents,
            market,
            result: SimulationResult::new(seed),
            stats: SimulationStats::default(),
            stop: Arc::new(AtomicBool::new(false)),
            config,
        })
    }

    pub fn market(&self) -> &MarketState {
        &self.market
    }

    pub fn agents(&self) -> &[CentralBankAgent] {
        &self.agents
    }

    pub fn result(&self) -> &SimulationResult {
        &self.result
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Cooperative stop flag, checked once per step boundary. Cloning the
    /// handle lets another thread end a long run cleanly.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Advance the whole simulation by one step.
    pub fn step(&mut self) -> SimResult<()> {
        let tick = self.clock.advance();
        let dt = self.clock.dt();

        let risk_out = self.risk.advance(tick, &mut self.rng)?;
        let rates =
            self.fx
                .advance(tick, risk_out.regime, risk_out.index, &mut self.rng)?;

        // Central-bank demand rises with geopolitical risk.
        let purchase_flow =
            self.config.gold_purchases_tonnes_per_year * (1.0 + 2.0 * risk_out.index);
        let (gold_price, silver_price) = self.metals.advance(
            tick,
            risk_out.regime,
            risk_out.index,
            purchase_flow,
            &mut self.rng,
        )?;

        let sdr_out = self.sdr.advance(tick, &rates)?;

        let market = MarketState {
            tick,
            rates,
            regime: risk_out.regime,
            risk_index: risk_out.index,
            event_occurred: risk_out.event_occurred,
            gold_price,
            silver_price,
            sdr_value: sdr_out.value,
        };

        // Agents: revalue and drift first, then credit any allocation,
        // then decide. Decisions draw the RNG in roster order.
        for agent in &mut self.agents {
            agent.revalue(&self.market, &market, &self.config.policy, dt);
            agent.drift_mandate(&self.config.policy, dt, self.config.mandate_drift_scale);
        }
        if let Some(amount) = sdr_out.allocation_usd {
            info!(step = tick, amount_usd = amount, "SDR allocation released");
            for agent in &mut self.agents {
                agent.receive_sdr_allocation(amount * agent.quota_share);
            }
        }

        let mut interventions = 0u32;
        let mut rebalances = 0u32;
        for agent in &mut self.agents {
            let decision = agent.decide(&market, &self.config.policy, &mut self.rng);
            if decision.rebalanced {
                rebalances += 1;
            }
            if let Some(intervention) = decision.intervention {
                self.fx.submit_intervention(intervention);
                interventions += 1;
            }
        }

        self.stats.interventions += u64::from(interventions);
        self.stats.rebalances += u64::from(rebalances);
        if risk_out.event_occurred {
            self.stats.jump_events += 1;
        }
        if risk_out.regime.is_crisis() {
            self.stats.crisis_steps += 1;
        }

        self.result.push(self.snapshot(&market, interventions, rebalances));
        self.market = market;
        Ok(())
    }

    /// Run `steps` steps, honoring the stop flag at each step boundary.
    pub fn run(&mut self, steps: u64) -> SimResult<()> {
        for _ in 0..steps {
            if self.stop.load(Ordering::Relaxed) {
                info!(step = self.clock.tick(), "stop requested, ending run");
                break;
            }
            self.step()?;
        }
        Ok(())
    }

    fn snapshot(&self, market: &MarketState, interventions: u32, rebalances: u32) -> StepSnapshot {
        let mut holdings_usd = [0.0; AssetClass::ALL.len()];
        for agent in &self.agents {
            for (i, &asset) in AssetClass::ALL.iter().enumerate() {
                holdings_usd[i] += agent.holding_usd(asset);
            }
        }
        let total_reserves_usd: f64 = holdings_usd.iter().sum();
        let share = |asset: AssetClass| {
            if total_reserves_usd > 0.0 {
                holdings_usd[asset as usize] / total_reserves_usd
            } else {
                0.0
            }
        };

        StepSnapshot {
            market: market.clone(),
            total_reserves_usd,
            holdings_usd,
            gold_share: share(AssetClass::Gold),
            usd_share: share(AssetClass::Usd),
            interventions,
            rebalances,
        }
    }
}

/// Run a complete simulation: validate, build, loop, hand back the result.
pub fn run(config: ScenarioConfig, steps: u64, seed: u64) -> SimResult<SimulationResult> {
    let mut sim = Simulation::new(config, seed)?;
    info!(steps, seed, "starting simulation run");
    sim.run(steps)?;
    info!(
        steps = sim.result().len(),
        interventions = sim.stats().interventions,
        rebalances = sim.stats().rebalances,
        "simulation run complete"
    );
    Ok(sim.result)
}

// =============================================================================
// Tests
// =============================================================================
