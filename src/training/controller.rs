use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::ai::{DqnAgent, DqnConfig, TrainingInfo};
use crate::error::{ControlError, TrainingError};
use crate::game::{Game, GameSnapshot};
use crate::training::messages::{ControlMessage, ControlReply, StartOutcome, TrainingUpdate};
use crate::training::metrics::{EpisodeMetrics, EpisodeResult};

/// Training loop configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Pause between ticks, in milliseconds.
    pub tick_interval_ms: u64,
    /// Log an episode summary every N finished episodes.
    pub log_interval: usize,
    /// Number of recent episodes the summary averages over.
    pub metrics_window: usize,
    /// Updates buffered per subscriber before the oldest are dropped.
    pub channel_capacity: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            tick_interval_ms: 100,
            log_interval: 10,
            metrics_window: 100,
            channel_capacity: 256,
        }
    }
}

impl TrainerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Clonable stop flag shared between the controller and one loop run.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The game being played and the agent learning from it. Always accessed
/// under one lock so ticks and control commands never interleave.
pub struct TrainingSession {
    pub game: Game,
    pub agent: DqnAgent,
}

impl TrainingSession {
    pub fn new(game: Game, agent: DqnAgent) -> Self {
        TrainingSession { game, agent }
    }
}

struct ActiveRun {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl ActiveRun {
    fn is_live(&self) -> bool {
        !self.token.is_cancelled() && !self.handle.is_finished()
    }
}

/// Owns a training session and the background thread that advances it.
///
/// Every tick produces a [`TrainingUpdate::Game`] followed by a
/// [`TrainingUpdate::Training`] on the broadcast channel. Sends never block;
/// subscribers that fall behind lose the oldest updates.
pub struct TrainingController {
    session: Arc<Mutex<TrainingSession>>,
    updates: broadcast::Sender<TrainingUpdate>,
    run: Mutex<Option<ActiveRun>>,
    config: TrainerConfig,
}

impl TrainingController {
    pub fn new(session: TrainingSession, config: TrainerConfig) -> Self {
        let (updates, _) = broadcast::channel(config.channel_capacity.max(1));
        TrainingController {
            session: Arc::new(Mutex::new(session)),
            updates,
            run: Mutex::new(None),
            config,
        }
    }

    /// Convenience constructor: a fresh game of the given size and an agent
    /// sized to match.
    pub fn with_game(
        width: usize,
        height: usize,
        game_seed: Option<u64>,
        dqn: DqnConfig,
        config: TrainerConfig,
    ) -> Self {
        let game = match game_seed {
            Some(seed) => Game::with_seed(width, height, seed),
            None => Game::new(width, height),
        };
        let agent = DqnAgent::new(dqn, width * height);
        Self::new(TrainingSession::new(game, agent), config)
    }

    /// Reset game and agent, then launch the training thread.
    pub fn start(&self) -> Result<StartOutcome, TrainingError> {
        let mut run = self.active_run();
        if run.as_ref().is_some_and(ActiveRun::is_live) {
            return Ok(StartOutcome::AlreadyRunning);
        }
        if let Some(previous) = run.take() {
            previous.token.cancel();
            join_run(previous);
        }

        {
            // Poisoned only by a panicked tick. The reset restores a consistent session.
            let mut session = self.session.lock().unwrap_or_else(|poisoned| {
                warn!("recovering training session after a panicked tick");
                poisoned.into_inner()
            });
            session.game.reset();
            session.agent.reset();
        }
        self.session.clear_poison();

        let token = CancellationToken::new();
        let handle = thread::Builder::new()
            .name("tetris-training".into())
            .spawn({
                let session = Arc::clone(&self.session);
                let updates = self.updates.clone();
                let token = token.clone();
                let config = self.config.clone();
                move || run_loop(&session, &updates, &token, &config)
            })
            .map_err(TrainingError::Spawn)?;

        *run = Some(ActiveRun { token, handle });
        info!("training started");
        Ok(StartOutcome::Started)
    }

    /// Ask the running loop to exit after its current tick. Calling this
    /// with nothing running is a no-op.
    pub fn stop(&self) {
        if let Some(active) = self.active_run().as_ref() {
            if !active.token.is_cancelled() {
                active.token.cancel();
                info!("training stop requested");
            }
        }
    }

    /// Stop and wait for the loop thread to exit.
    pub fn shutdown(&self) {
        let previous = self.active_run().take();
        if let Some(previous) = previous {
            previous.token.cancel();
            join_run(previous);
        }
    }

    pub fn is_running(&self) -> bool {
        self.active_run().as_ref().is_some_and(ActiveRun::is_live)
    }

    pub fn reset_game(&self) -> Result<(), TrainingError> {
        let snapshot = {
            let mut session = self.lock_session()?;
            session.game.reset();
            session.game.snapshot()
        };
        let _ = self.updates.send(TrainingUpdate::Game(snapshot));
        info!("game reset");
        Ok(())
    }

    pub fn reset_agent(&self) -> Result<(), TrainingError> {
        let info = {
            let mut session = self.lock_session()?;
            session.agent.reset();
            session.agent.training_info()
        };
        let _ = self.updates.send(TrainingUpdate::Training(info));
        info!("agent reset");
        Ok(())
    }

    pub fn set_hyperparameters(
        &self,
        learning_rate: f64,
        batch_size: usize,
        max_epochs: usize,
    ) -> Result<(), ControlError> {
        let mut session = self.lock_session()?;
        session
            .agent
            .set_hyperparameters(learning_rate, batch_size, max_epochs)?;
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrainingUpdate> {
        self.updates.subscribe()
    }

    /// Current game state and training progress, taken under one lock.
    pub fn snapshot(&self) -> Result<(GameSnapshot, TrainingInfo), TrainingError> {
        let session = self.lock_session()?;
        Ok((session.game.snapshot(), session.agent.training_info()))
    }

    /// Apply a control message and build the reply for the sender.
    pub fn handle(&self, message: ControlMessage) -> Result<ControlReply, ControlError> {
        debug!(?message, "control message");
        let reply = match message {
            ControlMessage::StartTraining => {
                let outcome = self.start()?;
                ControlReply::new("training_started", outcome.message())
            }
            ControlMessage::StopTraining => {
                self.stop();
                ControlReply::new("training_stopped", "Training stopped")
            }
            ControlMessage::ResetGame => {
                self.reset_game()?;
                ControlReply::new("game_reset", "Game reset")
            }
            ControlMessage::ResetAgent => {
                self.reset_agent()?;
                ControlReply::new("agent_reset", "Agent reset")
            }
            ControlMessage::SetHyperparameters {
                learning_rate,
                batch_size,
                max_epochs,
            } => {
                self.set_hyperparameters(learning_rate, batch_size, max_epochs)?;
                ControlReply::new(
                    "hyperparameters_updated",
                    "Hyperparameters updated successfully",
                )
            }
        };
        Ok(reply)
    }

    fn lock_session(&self) -> Result<MutexGuard<'_, TrainingSession>, TrainingError> {
        self.session
            .lock()
            .map_err(|_| TrainingError::SessionPoisoned)
    }

    fn active_run(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        self.run.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TrainingController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn join_run(run: ActiveRun) {
    if run.handle.join().is_err() {
        warn!("training thread panicked");
    }
}

struct Tick {
    /// Length of the episode this tick finished, if any.
    finished_episode: Option<usize>,
    /// Loss of the gradient step taken this tick, if one ran.
    loss: Option<f32>,
    game: GameSnapshot,
    info: TrainingInfo,
}

fn run_tick(session: &Mutex<TrainingSession>) -> Result<Tick, TrainingError> {
    let mut guard = session.lock().map_err(|_| TrainingError::SessionPoisoned)?;
    let TrainingSession { game, agent } = &mut *guard;
    let steps_before = game.steps();
    let updates_before = agent.update_count();

    let done = agent.train_step(game)?;

    let info = agent.training_info();
    Ok(Tick {
        finished_episode: done.then_some(steps_before + 1),
        loss: if agent.update_count() > updates_before {
            info.loss
        } else {
            None
        },
        game: game.snapshot(),
        info,
    })
}

/// Run one tick, turning a panic inside it into an error.
fn guarded_tick(session: &Mutex<TrainingSession>) -> Result<Tick, TrainingError> {
    panic::catch_unwind(AssertUnwindSafe(|| run_tick(session))).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(TrainingError::TickPanicked(message))
    })
}

fn run_loop(
    session: &Mutex<TrainingSession>,
    updates: &broadcast::Sender<TrainingUpdate>,
    token: &CancellationToken,
    config: &TrainerConfig,
) {
    let mut metrics = EpisodeMetrics::with_capacity(config.metrics_window);
    let log_interval = config.log_interval.max(1);

    while !token.is_cancelled() {
        let tick = match guarded_tick(session) {
            Ok(tick) => tick,
            Err(e) => {
                error!(error = %e, "training tick failed");
                token.cancel();
                let _ = updates.send(TrainingUpdate::Stopped {
                    reason: e.to_string(),
                });
                break;
            }
        };

        if let Some(loss) = tick.loss {
            metrics.record_update(loss);
        }
        if let Some(length) = tick.finished_episode {
            metrics.record_episode(EpisodeResult {
                score: tick.info.score,
                length,
            });

            if metrics.total_episodes() % log_interval == 0 {
                let window = config.metrics_window;
                info!(
                    episode = tick.info.episode,
                    epoch = tick.info.epoch,
                    epsilon = format_args!("{:.3}", tick.info.epsilon),
                    avg_loss = format_args!("{:.4}", metrics.average_loss(window)),
                    avg_score = format_args!("{:.1}", metrics.average_score(window)),
                    avg_len = format_args!("{:.1}", metrics.average_length(window)),
                    best_score = metrics.best_score(),
                    "episode summary"
                );
            }
        }

        let (epoch, max_epochs) = (tick.info.epoch, tick.info.max_epochs);
        let _ = updates.send(TrainingUpdate::Game(tick.game));
        let _ = updates.send(TrainingUpdate::Training(tick.info));

        if epoch >= max_epochs {
            info!(epoch, "reached max epochs, training finished");
            token.cancel();
            let _ = updates.send(TrainingUpdate::Finished { epoch });
            break;
        }

        thread::sleep(config.tick_interval());
    }

    info!("training loop exited");
}
