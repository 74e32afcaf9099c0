use tetris_dqn::ai::DqnConfig;
use tetris_dqn::error::ControlError;
use tetris_dqn::training::{
    ControlMessage, StartOutcome, TrainerConfig, TrainingController, TrainingUpdate,
};

fn controller(max_epochs: usize) -> TrainingController {
    TrainingController::with_game(
        6,
        10,
        Some(3),
        DqnConfig {
            batch_size: 4,
            replay_capacity: 64,
            max_epochs,
            seed: Some(4),
            ..Default::default()
        },
        TrainerConfig {
            tick_interval_ms: 1,
            channel_capacity: 4096,
            ..Default::default()
        },
    )
}

#[test]
fn start_is_rejected_while_running_and_stop_is_idempotent() {
    let c = controller(100_000);
    assert_eq!(c.start().unwrap(), StartOutcome::Started);
    assert!(c.is_running());
    assert_eq!(c.start().unwrap(), StartOutcome::AlreadyRunning);

    c.stop();
    c.stop();
    assert!(!c.is_running());

    // A stopped run can be restarted; the old thread is joined first.
    assert_eq!(c.start().unwrap(), StartOutcome::Started);
    c.shutdown();
    assert!(!c.is_running());
    c.stop();
}

#[test]
fn stop_without_run_is_noop() {
    let c = controller(10);
    c.stop();
    c.shutdown();
    assert!(!c.is_running());
}

#[test]
fn every_tick_broadcasts_game_then_training() {
    let c = controller(100_000);
    let mut rx = c.subscribe();
    c.start().unwrap();

    for epoch in 1..=3 {
        match rx.blocking_recv().unwrap() {
            TrainingUpdate::Game(snapshot) => {
                assert_eq!(snapshot.board.len(), 10);
                assert!(snapshot.board.iter().all(|row| row.len() == 6));
            }
            other => panic!("expected game update, got {other:?}"),
        }
        match rx.blocking_recv().unwrap() {
            TrainingUpdate::Training(info) => {
                assert_eq!(info.epoch, epoch);
                assert_eq!(info.max_epochs, 100_000);
            }
            other => panic!("expected training update, got {other:?}"),
        }
    }
    c.shutdown();
}

#[test]
fn run_finishes_at_max_epochs() {
    let c = controller(5);
    let mut rx = c.subscribe();
    c.start().unwrap();

    let mut training_updates = 0;
    loop {
        match rx.blocking_recv().unwrap() {
            TrainingUpdate::Training(_) => training_updates += 1,
            TrainingUpdate::Finished { epoch } => {
                assert_eq!(epoch, 5);
                break;
            }
            TrainingUpdate::Stopped { reason } => panic!("run failed: {reason}"),
            TrainingUpdate::Game(_) => {}
        }
    }
    assert_eq!(training_updates, 5);
    assert!(!c.is_running());

    let (_, info) = c.snapshot().unwrap();
    assert_eq!(info.epoch, 5);
}

#[test]
fn start_resets_counters() {
    let c = controller(3);
    let mut rx = c.subscribe();

    for _ in 0..2 {
        assert_eq!(c.start().unwrap(), StartOutcome::Started);
        while !matches!(rx.blocking_recv().unwrap(), TrainingUpdate::Finished { .. }) {}
        assert_eq!(c.snapshot().unwrap().1.epoch, 3);
    }
}

#[test]
fn control_messages_produce_replies() {
    let c = controller(100_000);

    let reply = c.handle(ControlMessage::StartTraining).unwrap();
    assert_eq!(reply.event, "training_started");
    assert_eq!(reply.message, "Training started");

    let reply = c.handle(ControlMessage::StartTraining).unwrap();
    assert_eq!(reply.event, "training_started");
    assert_eq!(reply.message, "Training already in progress");

    let reply = c
        .handle(ControlMessage::SetHyperparameters {
            learning_rate: 0.0005,
            batch_size: 8,
            max_epochs: 50_000,
        })
        .unwrap();
    assert_eq!(reply.event, "hyperparameters_updated");
    let (_, info) = c.snapshot().unwrap();
    assert_eq!(info.learning_rate, 0.0005);
    assert_eq!(info.max_epochs, 50_000);

    let reply = c.handle(ControlMessage::StopTraining).unwrap();
    assert_eq!(reply.event, "training_stopped");
    assert_eq!(reply.message, "Training stopped");
    c.shutdown();

    let reply = c.handle(ControlMessage::ResetAgent).unwrap();
    assert_eq!(reply.event, "agent_reset");
    assert_eq!(c.snapshot().unwrap().1.epoch, 0);

    let reply = c.handle(ControlMessage::ResetGame).unwrap();
    assert_eq!(reply.event, "game_reset");
    assert_eq!(c.snapshot().unwrap().0.score, 0);
}

#[test]
fn invalid_hyperparameters_are_rejected_without_side_effects() {
    let c = controller(1_000);
    for (lr, batch, epochs) in [(0.0, 4, 10), (0.001, 0, 10), (0.001, 4, 0)] {
        let err = c
            .handle(ControlMessage::SetHyperparameters {
                learning_rate: lr,
                batch_size: batch,
                max_epochs: epochs,
            })
            .unwrap_err();
        assert!(matches!(err, ControlError::Config(_)), "{err}");
    }
    let (_, info) = c.snapshot().unwrap();
    assert_eq!(info.max_epochs, 1_000);
    assert!((info.learning_rate - 0.001).abs() < 1e-12);
}

#[test]
fn parsed_messages_drive_the_controller() {
    let c = controller(100_000);
    let msg = ControlMessage::parse(
        r#"{"type":"set_hyperparameters","learning_rate":"0.002","batch_size":"16","max_epochs":"77"}"#,
    )
    .unwrap();
    c.handle(msg).unwrap();
    let (_, info) = c.snapshot().unwrap();
    assert_eq!(info.max_epochs, 77);
    assert!((info.learning_rate - 0.002).abs() < 1e-12);
}

#[test]
fn resets_broadcast_fresh_snapshots() {
    let c = controller(10);
    let mut rx = c.subscribe();

    c.reset_game().unwrap();
    match rx.blocking_recv().unwrap() {
        TrainingUpdate::Game(snapshot) => {
            assert_eq!(snapshot.score, 0);
            assert!(!snapshot.game_over);
        }
        other => panic!("expected game update, got {other:?}"),
    }

    c.reset_agent().unwrap();
    match rx.blocking_recv().unwrap() {
        TrainingUpdate::Training(info) => {
            assert_eq!(info.episode, 0);
            assert_eq!(info.loss, None);
        }
        other => panic!("expected training update, got {other:?}"),
    }
}
