use std::{thread, time::Duration};

use cops_and_robbers_coordination::Coordinator;
use cops_and_robbers_core::{Cell, CellCoord, CopId, MatchOutcome, PursuitStep};
use cops_and_robbers_system_map_generation::WallPattern;
use cops_and_robbers_system_pursuit::{chase_step, Pursuer};
use cops_and_robbers_world::{query, GameState, Grid};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const THRESHOLD: u32 = 5;

fn bordered_state(robber: CellCoord) -> GameState {
    let mut grid = Grid::new(15).expect("grid");
    WallPattern::Border.paint(&mut grid);
    GameState::new(grid, robber).expect("robber placement")
}

fn pursuer(cop: CopId, seed: u64) -> Pursuer {
    Pursuer::new(cop, THRESHOLD, ChaCha8Rng::seed_from_u64(seed))
}

#[test]
fn adjacent_cop_captures_on_first_tick() {
    for offset in [(6, 6), (6, 7), (6, 8), (7, 6), (7, 8), (8, 6), (8, 7), (8, 8)] {
        let mut state = bordered_state(CellCoord::new(7, 7));
        let cop = state
            .add_cop(CellCoord::new(offset.0, offset.1))
            .expect("cop placement");
        let before = state.clone();

        let step = pursuer(cop, 1).tick(&mut state);

        assert_eq!(step, PursuitStep::Captured, "cop at {offset:?}");
        assert_eq!(state, before, "capture must not move anything");
    }
}

#[test]
fn first_pursuer_tick_through_coordinator_ends_match() {
    let mut state = bordered_state(CellCoord::new(7, 7));
    let cop = state.add_cop(CellCoord::new(8, 8)).expect("cop placement");
    let coordinator = Coordinator::new(state);

    thread::scope(|scope| {
        let _ = scope.spawn(|| pursuer(cop, 2).run(&coordinator, Duration::from_millis(5)));
    });

    assert!(!coordinator.is_running());
    assert_eq!(coordinator.outcome(), Some(MatchOutcome::Captured));
}

#[test]
fn chasing_cop_strictly_closes_distance() {
    let mut state = bordered_state(CellCoord::new(7, 7));
    let cop = state.add_cop(CellCoord::new(7, 10)).expect("cop placement");

    let step = pursuer(cop, 3).tick(&mut state);

    assert_eq!(
        step,
        PursuitStep::Advanced {
            from: CellCoord::new(7, 10),
            to: CellCoord::new(7, 9),
        }
    );
    assert!(state.grid().is_free(CellCoord::new(7, 10)));
    assert!(query::positions_consistent(&state));
}

#[test]
fn chasing_cop_holds_when_blocked() {
    let mut state = bordered_state(CellCoord::new(7, 7));
    state.add_money(CellCoord::new(7, 9)).expect("money");
    let cop = state.add_cop(CellCoord::new(7, 10)).expect("cop placement");
    let _other = state.add_cop(CellCoord::new(6, 10)).expect("cop placement");
    let _third = state.add_cop(CellCoord::new(8, 10)).expect("cop placement");
    let before = state.clone();

    let step = pursuer(cop, 4).tick(&mut state);

    assert_eq!(step, PursuitStep::Held);
    assert_eq!(state, before);
}

#[test]
fn cop_at_threshold_distance_wanders() {
    for seed in 0..16 {
        let mut state = bordered_state(CellCoord::new(7, 7));
        state.add_money(CellCoord::new(7, 11)).expect("money");
        let cop = state.add_cop(CellCoord::new(7, 12)).expect("cop placement");

        let step = pursuer(cop, seed).tick(&mut state);

        let PursuitStep::Advanced { from, to } = step else {
            panic!("seed {seed}: expected a wander step, got {step:?}");
        };
        assert_eq!(from, CellCoord::new(7, 12));
        assert!(
            [(6, 12), (8, 12), (7, 13)]
                .into_iter()
                .any(|(row, column)| to == CellCoord::new(row, column)),
            "seed {seed}: wandered to {to:?}"
        );
        assert!(query::positions_consistent(&state));
    }
}

#[test]
fn cop_just_inside_threshold_chases() {
    for seed in 0..16 {
        let mut state = bordered_state(CellCoord::new(7, 7));
        state.add_money(CellCoord::new(7, 10)).expect("money");
        let cop = state.add_cop(CellCoord::new(7, 11)).expect("cop placement");
        let before = state.clone();

        let step = pursuer(cop, seed).tick(&mut state);

        assert_eq!(step, PursuitStep::Held, "seed {seed}");
        assert_eq!(state, before);
    }

    let mut state = bordered_state(CellCoord::new(7, 7));
    let cop = state.add_cop(CellCoord::new(7, 11)).expect("cop placement");
    assert_eq!(
        pursuer(cop, 0).tick(&mut state),
        PursuitStep::Advanced {
            from: CellCoord::new(7, 11),
            to: CellCoord::new(7, 10),
        }
    );
}

#[test]
fn chase_step_never_picks_money_wall_or_cop() {
    let mut grid = Grid::new(15).expect("grid");
    WallPattern::Border.paint(&mut grid);
    let from = CellCoord::new(5, 5);
    let target = CellCoord::new(5, 9);
    let _ = grid.set(CellCoord::new(5, 6), Cell::Money);
    let _ = grid.set(CellCoord::new(4, 5), Cell::Cop);

    assert_eq!(chase_step(&grid, from, target), None);

    let _ = grid.set(CellCoord::new(5, 6), Cell::Empty);
    assert_eq!(chase_step(&grid, from, target), Some(CellCoord::new(5, 6)));
}

#[test]
fn wandering_cops_only_enter_empty_cells() {
    let mut state = bordered_state(CellCoord::new(1, 1));
    for cell in [(1, 2), (2, 1), (2, 2)] {
        state.add_money(CellCoord::new(cell.0, cell.1)).expect("money");
    }
    for column in 4..10 {
        state.add_money(CellCoord::new(10, column)).expect("money");
    }
    let walls = query::wall_cells(&state);
    let first = state.add_cop(CellCoord::new(11, 6)).expect("cop placement");
    let second = state.add_cop(CellCoord::new(12, 6)).expect("cop placement");
    let mut agents = [pursuer(first, 10), pursuer(second, 11)];

    for _ in 0..500 {
        for agent in &mut agents {
            let step = agent.tick(&mut state);
            assert_ne!(step, PursuitStep::Captured);
        }
        assert!(query::positions_consistent(&state));
        assert_eq!(state.grid().count(Cell::Money), 9);
        assert_eq!(query::wall_cells(&state), walls);
    }
}

#[test]
fn neighbouring_cops_trade_cells_without_overlap() {
    let mut state = bordered_state(CellCoord::new(3, 4));
    let leader = state.add_cop(CellCoord::new(3, 7)).expect("cop placement");
    let follower = state.add_cop(CellCoord::new(3, 8)).expect("cop placement");
    let mut leader_agent = pursuer(leader, 20);
    let mut follower_agent = pursuer(follower, 21);

    let leader_step = leader_agent.tick(&mut state);
    assert_eq!(
        leader_step,
        PursuitStep::Advanced {
            from: CellCoord::new(3, 7),
            to: CellCoord::new(3, 6),
        }
    );
    assert!(query::positions_consistent(&state));

    let follower_step = follower_agent.tick(&mut state);
    assert_eq!(
        follower_step,
        PursuitStep::Advanced {
            from: CellCoord::new(3, 8),
            to: CellCoord::new(3, 7),
        }
    );
    assert_eq!(state.grid().count(Cell::Cop), 2);
    assert!(query::positions_consistent(&state));
}

#[test]
fn concurrent_pursuers_preserve_board_invariants() {
    let mut state = bordered_state(CellCoord::new(2, 2));
    for column in 3..12 {
        state.add_money(CellCoord::new(6, column)).expect("money");
    }
    let cops: Vec<CopId> = [(12, 3), (12, 6), (12, 9), (9, 12)]
        .into_iter()
        .map(|(row, column)| state.add_cop(CellCoord::new(row, column)).expect("cop"))
        .collect();
    let walls = query::wall_cells(&state);
    let coordinator = Coordinator::new(state);

    thread::scope(|scope| {
        for (index, cop) in cops.iter().enumerate() {
            let coordinator = &coordinator;
            let agent = pursuer(*cop, 100 + index as u64);
            let _ = scope.spawn(move || agent.run(coordinator, Duration::from_millis(1)));
        }

        for _ in 0..50 {
            thread::sleep(Duration::from_millis(2));
            let consistent = coordinator.read_exclusive(query::positions_consistent);
            assert!(consistent);
        }
        let _ = coordinator.signal_shutdown();
    });

    let (state, _) = coordinator.into_parts();
    assert!(query::positions_consistent(&state));
    assert_eq!(state.grid().count(Cell::Cop), 4);
    assert_eq!(state.grid().count(Cell::Money), 9);
    assert_eq!(query::wall_cells(&state), walls);
}
