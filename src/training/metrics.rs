use std::collections::VecDeque;

/// Result of a single finished episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeResult {
    pub score: u32,
    /// Ticks played before the game ended.
    pub length: usize,
}

/// Episode metrics tracker with rolling window computations.
pub struct EpisodeMetrics {
    episode_results: VecDeque<EpisodeResult>,
    update_losses: VecDeque<f32>,
    capacity: usize,
    total_episodes: usize, // lifetime count, never capped
    best_score: u32,
}

impl EpisodeMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        EpisodeMetrics {
            episode_results: VecDeque::with_capacity(capacity),
            update_losses: VecDeque::with_capacity(capacity),
            capacity,
            total_episodes: 0,
            best_score: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn record_episode(&mut self, result: EpisodeResult) {
        self.total_episodes += 1;
        self.best_score = self.best_score.max(result.score);
        self.episode_results.push_back(result);
        if self.episode_results.len() > self.capacity {
            self.episode_results.pop_front();
        }
    }

    pub fn record_update(&mut self, loss: f32) {
        self.update_losses.push_back(loss);
        if self.update_losses.len() > self.capacity {
            self.update_losses.pop_front();
        }
    }

    /// Average score over the last N episodes.
    pub fn average_score(&self, last_n: usize) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let total: u64 = self
            .episode_results
            .iter()
            .rev()
            .take(n)
            .map(|r| r.score as u64)
            .sum();
        total as f32 / n as f32
    }

    /// Average episode length (ticks) over the last N episodes.
    pub fn average_length(&self, last_n: usize) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let total: usize = self
            .episode_results
            .iter()
            .rev()
            .take(n)
            .map(|r| r.length)
            .sum();
        total as f32 / n as f32
    }

    /// Average loss over the last N updates.
    pub fn average_loss(&self, last_n: usize) -> f32 {
        let n = self.update_losses.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let sum: f32 = self.update_losses.iter().rev().take(n).sum();
        sum / n as f32
    }

    /// Highest score seen since the tracker was created.
    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }
}

impl Default for EpisodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(score: u32, length: usize) -> EpisodeResult {
        EpisodeResult { score, length }
    }

    #[test]
    fn test_empty_metrics() {
        let m = EpisodeMetrics::new();
        assert_eq!(m.average_score(10), 0.0);
        assert_eq!(m.average_length(10), 0.0);
        assert_eq!(m.average_loss(10), 0.0);
        assert_eq!(m.best_score(), 0);
        assert_eq!(m.total_episodes(), 0);
    }

    #[test]
    fn test_average_score_uses_last_n() {
        let mut m = EpisodeMetrics::new();
        m.record_episode(episode(0, 10));
        m.record_episode(episode(100, 20));
        m.record_episode(episode(400, 30));

        assert!((m.average_score(2) - 250.0).abs() < 1e-6);
        assert!((m.average_score(100) - 500.0 / 3.0).abs() < 1e-4);
        assert!((m.average_length(2) - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_window_evicts_but_total_keeps_counting() {
        let mut m = EpisodeMetrics::with_capacity(3);
        for i in 0..5 {
            m.record_episode(episode(i * 100, 1));
        }
        assert_eq!(m.total_episodes(), 5);
        // Only 200, 300, 400 remain in the window
        assert!((m.average_score(10) - 300.0).abs() < 1e-6);
        assert_eq!(m.best_score(), 400);
    }

    #[test]
    fn test_best_score_survives_eviction() {
        let mut m = EpisodeMetrics::with_capacity(1);
        m.record_episode(episode(900, 1));
        m.record_episode(episode(0, 1));
        assert_eq!(m.average_score(10), 0.0);
        assert_eq!(m.best_score(), 900);
    }

    #[test]
    fn test_average_loss() {
        let mut m = EpisodeMetrics::with_capacity(2);
        m.record_update(1.0);
        m.record_update(2.0);
        m.record_update(4.0);
        assert!((m.average_loss(10) - 3.0).abs() < 1e-6);
        assert!((m.average_loss(1) - 4.0).abs() < 1e-6);
    }
}
