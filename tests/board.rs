mod support;

use joinboard::board::{self, load_board, move_task, set_subtask_checked};
use joinboard::model::{tables, Category, Subtask, SubtaskLink, TaskState};
use joinboard::store::MemoryStore;

use support::{create_task, new_task};

#[tokio::test]
async fn subtasks_come_back_in_position_order() {
    let store = MemoryStore::new();
    let task = new_task("Out of order");
    store.seed(tables::TASKS, &task.id, &task).expect("seed task");
    for (id, position) in [("s-late", 9), ("s-first", 0), ("s-mid", 4)] {
        let subtask = Subtask {
            id: id.to_string(),
            title: id.to_string(),
            task_checked: false,
            position,
        };
        store.seed(tables::SUBTASKS, id, &subtask).expect("seed subtask");
        let link = SubtaskLink::new(&task.id, id);
        store
            .seed(tables::SUBTASK_LINKS, &link.id, &link)
            .expect("seed link");
    }

    let details = board::require_task(&store, &task.id).await.expect("load");
    let order: Vec<&str> = details.subtasks.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(order, vec!["s-first", "s-mid", "s-late"]);
}

#[tokio::test]
async fn board_groups_by_column_and_follows_moves() {
    let store = MemoryStore::new();
    let first = create_task(&store, "Write docs", &["outline"], &[]).await;
    let second = create_task(&store, "Fix login", &[], &[]).await;

    move_task(&store, &second.task.id, TaskState::InProgress)
        .await
        .expect("move");
    let board = load_board(&store).await.expect("board");

    let states: Vec<TaskState> = board.columns.iter().map(|c| c.state).collect();
    assert_eq!(states, TaskState::ALL.to_vec());
    assert_eq!(board.column(TaskState::Todo).len(), 1);
    assert_eq!(board.column(TaskState::InProgress).len(), 1);
    assert!(board.column(TaskState::Done).is_empty());
    assert_eq!(
        board.column(TaskState::InProgress)[0].task.id,
        second.task.id
    );
    assert_eq!(board.find(&first.task.id).map(|d| d.subtasks.len()), Some(1));

    let hits = board.search("LOGIN");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].task.id, second.task.id);
    assert_eq!(board.search("").len(), 2);
}

#[tokio::test]
async fn toggling_a_subtask_updates_progress() {
    let store = MemoryStore::new();
    let details = create_task(&store, "Progress", &["a", "b"], &[]).await;
    let subtask = set_subtask_checked(&store, &details.subtasks[1].id, true)
        .await
        .expect("check");
    assert!(subtask.task_checked);

    let reloaded = board::require_task(&store, &details.task.id)
        .await
        .expect("reload");
    assert_eq!(reloaded.progress(), (1, 2));
}

#[tokio::test]
async fn categories_are_sorted_by_name() {
    let store = MemoryStore::new();
    for (id, name) in [("2", "User Story"), ("1", "Technical Task")] {
        let category = Category {
            id: id.to_string(),
            name: name.to_string(),
            color_tag: String::new(),
        };
        store
            .seed(tables::CATEGORIES, id, &category)
            .expect("seed category");
    }
    let names: Vec<String> = board::list_categories(&store)
        .await
        .expect("categories")
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Technical Task", "User Story"]);
}
