//! Property-based tests for the board state machine.
//!
//! Uses proptest to verify, over random interleavings of moves, store
//! verdicts and reloads:
//! 1. Every task sits in exactly one column, the one matching its status,
//!    and no task is gained or lost.
//! 2. Rejecting every move, in any order, restores the loaded board exactly.
//! 3. Once all moves are confirmed each task ends where its last move put it.
//! 4. A load shows the fetched tasks in fetched order with only the
//!    unconfirmed moves applied on top, whatever was confirmed before it.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use proptest::sample::Index;

use taskzenith::board::{Board, MoveId};
use taskzenith::board::columns::Columns;
use taskzenith::board::state::{MoveStart, PendingMove};
use taskzenith_proto::task::{Priority, Task, TaskId, TaskStatus};

const MAX_TASKS: usize = 6;

#[derive(Debug, Clone)]
enum Op {
    Move(Index, TaskStatus),
    Commit(Index),
    Fail(Index),
    Reload,
}

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop::sample::select(TaskStatus::ALL.to_vec())
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any::<Index>(), arb_status()).prop_map(|(i, s)| Op::Move(i, s)),
        2 => any::<Index>().prop_map(Op::Commit),
        2 => any::<Index>().prop_map(Op::Fail),
        1 => Just(Op::Reload),
    ]
}

fn arb_tasks() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec(arb_status(), 1..=MAX_TASKS).prop_map(|statuses| {
        statuses
            .into_iter()
            .enumerate()
            .map(|(i, status)| make_task(i, status))
            .collect()
    })
}

fn make_task(i: usize, status: TaskStatus) -> Task {
    let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    Task {
        id: TaskId::new(format!("t{i}")),
        title: format!("Task {i}"),
        description: None,
        status: status.into(),
        priority: Priority::Medium,
        assignees: Vec::new(),
        project_id: "p1".to_string(),
        due_date: None,
        created_at: ts,
        updated_at: ts,
        comments: Vec::new(),
    }
}

fn loaded(tasks: &[Task]) -> Board {
    let mut board = Board::new();
    let ticket = board.begin_load("p1");
    board.finish_load(ticket, Ok(tasks.to_vec())).unwrap();
    board
}

fn id_set(columns: &Columns) -> BTreeSet<TaskId> {
    columns.task_ids().into_iter().collect()
}

fn record_for(tasks: &[Task], pending: &PendingMove) -> Task {
    let mut record = tasks
        .iter()
        .find(|t| t.id == pending.task_id)
        .cloned()
        .unwrap();
    record.status = pending.target.into();
    record
}

/// Issues a move, recording it as in flight if it was dispatched.
fn start(board: &mut Board, in_flight: &mut Vec<PendingMove>, task_id: &TaskId, target: TaskStatus) {
    match board.begin_move(task_id, target) {
        MoveStart::Dispatch(pending) => in_flight.push(pending),
        MoveStart::Queued(_) => {}
        MoveStart::NotFound => panic!("task {task_id} vanished from the board"),
    }
}

proptest! {
    #[test]
    fn partition_holds_under_any_interleaving(
        tasks in arb_tasks(),
        ops in prop::collection::vec(arb_op(), 0..64),
    ) {
        let mut board = loaded(&tasks);
        let ids = id_set(board.columns());
        let mut in_flight: Vec<PendingMove> = Vec::new();

        for op in ops {
            match op {
                Op::Move(i, target) => {
                    let task_id = tasks[i.index(tasks.len())].id.clone();
                    start(&mut board, &mut in_flight, &task_id, target);
                }
                Op::Commit(i) if !in_flight.is_empty() => {
                    let pending = in_flight.remove(i.index(in_flight.len()));
                    let record = record_for(&tasks, &pending);
                    if let Some(next) = board.commit_move(pending.move_id, record) {
                        in_flight.push(next);
                    }
                }
                Op::Fail(i) if !in_flight.is_empty() => {
                    let pending = in_flight.remove(i.index(in_flight.len()));
                    let resolution = board.fail_move(pending.move_id).unwrap();
                    prop_assert_eq!(&resolution.task_id, &pending.task_id);
                    if let Some(next) = resolution.next {
                        in_flight.push(next);
                    }
                }
                Op::Reload => {
                    let ticket = board.begin_load("p1");
                    board.finish_load(ticket, Ok(tasks.clone())).unwrap();
                }
                Op::Commit(_) | Op::Fail(_) => {}
            }
            prop_assert!(board.columns().is_consistent());
            prop_assert_eq!(id_set(board.columns()), ids.clone());
            prop_assert!(board.pending_moves() >= in_flight.len());
        }
    }

    #[test]
    fn rejecting_every_move_restores_loaded_board(
        tasks in arb_tasks(),
        moves in prop::collection::vec((any::<Index>(), arb_status()), 1..24),
        order in prop::collection::vec(any::<Index>(), 24),
    ) {
        let mut board = loaded(&tasks);
        let initial = board.columns().clone();
        let mut in_flight: Vec<PendingMove> = Vec::new();

        for (i, target) in moves {
            let task_id = tasks[i.index(tasks.len())].id.clone();
            start(&mut board, &mut in_flight, &task_id, target);
        }

        let mut picks = order.into_iter().cycle();
        while !in_flight.is_empty() {
            let pick = picks.next().unwrap().index(in_flight.len());
            let pending = in_flight.remove(pick);
            if let Some(next) = board.fail_move(pending.move_id).unwrap().next {
                in_flight.push(next);
            }
        }

        prop_assert_eq!(board.pending_moves(), 0);
        prop_assert_eq!(board.columns(), &initial);
    }

    #[test]
    fn confirmed_moves_land_on_last_target(
        tasks in arb_tasks(),
        moves in prop::collection::vec((any::<Index>(), arb_status()), 1..24),
        order in prop::collection::vec(any::<Index>(), 24),
    ) {
        let mut board = loaded(&tasks);
        let mut in_flight: Vec<PendingMove> = Vec::new();
        let mut last_target: HashMap<TaskId, TaskStatus> = HashMap::new();

        for (i, target) in moves {
            let task_id = tasks[i.index(tasks.len())].id.clone();
            last_target.insert(task_id.clone(), target);
            start(&mut board, &mut in_flight, &task_id, target);
        }
        let optimistic = board.columns().clone();

        let mut picks = order.into_iter().cycle();
        while !in_flight.is_empty() {
            let pick = picks.next().unwrap().index(in_flight.len());
            let pending = in_flight.remove(pick);
            let record = record_for(&tasks, &pending);
            if let Some(next) = board.commit_move(pending.move_id, record) {
                in_flight.push(next);
            }
        }

        prop_assert_eq!(board.pending_moves(), 0);
        prop_assert!(board.columns().is_consistent());
        for (task_id, target) in &last_target {
            let (status, _) = board.columns().position(task_id).unwrap();
            prop_assert_eq!(status, *target);
            prop_assert_eq!(optimistic.position(task_id).map(|(s, _)| s), Some(*target));
        }
    }

    #[test]
    fn reload_shows_fetched_order_plus_unconfirmed_moves(
        tasks in arb_tasks(),
        moves in prop::collection::vec((any::<Index>(), arb_status()), 1..24),
        verdicts in prop::collection::vec((any::<Index>(), any::<bool>()), 0..24),
        fetched in prop::collection::vec(arb_status(), MAX_TASKS),
    ) {
        let mut board = loaded(&tasks);
        let mut in_flight: Vec<PendingMove> = Vec::new();
        let mut issued: Vec<(MoveId, TaskId, TaskStatus)> = Vec::new();
        for (i, target) in moves {
            let task_id = tasks[i.index(tasks.len())].id.clone();
            let move_id = match board.begin_move(&task_id, target) {
                MoveStart::Dispatch(pending) => {
                    let move_id = pending.move_id;
                    in_flight.push(pending);
                    move_id
                }
                MoveStart::Queued(move_id) => move_id,
                MoveStart::NotFound => panic!("task {task_id} vanished from the board"),
            };
            issued.push((move_id, task_id, target));
        }

        // Settle some moves in random order, committing or rejecting each.
        let mut settled: HashSet<MoveId> = HashSet::new();
        for (pick, commit) in verdicts {
            if in_flight.is_empty() {
                break;
            }
            let pending = in_flight.remove(pick.index(in_flight.len()));
            settled.insert(pending.move_id);
            let next = if commit {
                let record = record_for(&tasks, &pending);
                board.commit_move(pending.move_id, record)
            } else {
                board.fail_move(pending.move_id).unwrap().next
            };
            in_flight.extend(next);
        }

        // The server lists the tasks in reverse with statuses of its own.
        let snapshot: Vec<Task> = tasks
            .iter()
            .rev()
            .zip(fetched)
            .map(|(task, status)| {
                let mut task = task.clone();
                task.status = status.into();
                task
            })
            .collect();
        let ticket = board.begin_load("p1");
        board.finish_load(ticket, Ok(snapshot.clone())).unwrap();

        let (fresh, _) = Columns::partition(snapshot);
        let mut expected = fresh.clone();
        for (move_id, task_id, target) in &issued {
            if !settled.contains(move_id) {
                expected.move_task(task_id, *target);
            }
        }
        prop_assert_eq!(board.columns(), &expected);

        // Once the rest is rejected the board is exactly the fetched one.
        while !in_flight.is_empty() {
            let pending = in_flight.remove(0);
            in_flight.extend(board.fail_move(pending.move_id).unwrap().next);
        }
        prop_assert_eq!(board.pending_moves(), 0);
        prop_assert_eq!(board.columns(), &fresh);
    }
}
