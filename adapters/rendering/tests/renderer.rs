use std::{thread, time::Duration};

use anyhow::Result;
use cops_and_robbers_coordination::Coordinator;
use cops_and_robbers_core::{CellCoord, MatchOutcome};
use cops_and_robbers_rendering::{run, Frame, FrameSink};
use cops_and_robbers_world::{GameState, Grid};

#[derive(Default)]
struct RecordingSink {
    frames: Vec<Frame>,
}

impl FrameSink for RecordingSink {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }
}

struct FailingSink;

impl FrameSink for FailingSink {
    fn present(&mut self, _frame: &Frame) -> Result<()> {
        anyhow::bail!("terminal went away")
    }
}

fn coordinator() -> Coordinator {
    let grid = Grid::new(15).expect("grid");
    let mut state = GameState::new(grid, CellCoord::new(7, 7)).expect("robber");
    state.add_money(CellCoord::new(1, 1)).expect("money");
    Coordinator::new(state)
}

#[test]
fn renderer_draws_until_shutdown_then_once_more() {
    let coordinator = coordinator();
    let mut sink = RecordingSink::default();

    thread::scope(|scope| {
        let renderer = scope.spawn(|| run(&coordinator, &mut sink, Duration::from_millis(2)));
        thread::sleep(Duration::from_millis(30));
        assert!(coordinator.conclude(MatchOutcome::Escaped));
        renderer
            .join()
            .expect("renderer thread")
            .expect("renderer result");
    });

    assert!(sink.frames.len() >= 2);
    let last = sink.frames.last().expect("final frame");
    assert_eq!(last.outcome(), Some(MatchOutcome::Escaped));
    assert!(sink.frames[..sink.frames.len() - 1]
        .iter()
        .all(|frame| frame.outcome().is_none()));
}

#[test]
fn renderer_started_after_shutdown_draws_initial_and_final_frame() {
    let coordinator = coordinator();
    let _ = coordinator.signal_shutdown();
    let mut sink = RecordingSink::default();

    run(&coordinator, &mut sink, Duration::from_secs(60)).expect("renderer");

    assert_eq!(sink.frames.len(), 2);
    assert_eq!(sink.frames[1].outcome(), None);
    assert_eq!(sink.frames[1].money_remaining(), 1);
}

#[test]
fn sink_errors_are_propagated() {
    let coordinator = coordinator();
    let error = run(&coordinator, &mut FailingSink, Duration::from_millis(1))
        .expect_err("sink failure must surface");
    assert!(error.to_string().contains("terminal went away"));
}
