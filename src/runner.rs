//! Episode driver shared by the binary and the integration tests.

use rand::Rng;
use tracing::info;

use crate::error::Result;
use crate::sim::controller::Policy;
use crate::sim::engine::MicrogridSimulator;
use crate::sim::kpi::EpisodeSummary;
use crate::sim::recorder::EpisodeRecorder;
use crate::sim::types::DaySelection;

/// Resets `sim` on `selection` and steps it with `policy` until the
/// terminal step, recording every settled hour.
///
/// `recorder` is cleared first, so on return it holds exactly this episode.
///
/// # Errors
///
/// Propagates any error from `reset` or `step`.
pub fn run_episode<R: Rng, P: Policy>(
    sim: &mut MicrogridSimulator<R>,
    selection: DaySelection,
    policy: &mut P,
    recorder: &mut EpisodeRecorder,
) -> Result<EpisodeSummary> {
    recorder.clear();
    let mut observation = sim.reset(selection)?;
    loop {
        let outcome = sim.step(policy.act(&observation))?;
        if let Some(record) = sim.last_record() {
            recorder.record(record);
        }
        observation = outcome.observation;
        if outcome.terminal {
            break;
        }
    }

    let summary = EpisodeSummary::from_records(recorder.records());
    info!(
        day = sim.day(),
        steps = summary.steps,
        total_reward = summary.total_reward,
        "episode finished"
    );
    Ok(summary)
}
