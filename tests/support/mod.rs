#![allow(dead_code)]

use joinboard::board::{self, TaskDetails};
use joinboard::create::plan_creation;
use joinboard::model::{tables, Contact, NewTask, Priority, Task, TaskState};
use joinboard::store::MemoryStore;

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn new_task(title: &str) -> Task {
    Task::new(NewTask {
        title: title.to_string(),
        description: format!("{title} description"),
        due_date: "15/06/2030".to_string(),
        priority: Priority::Medium,
        category_id: "cat-tech".to_string(),
        state: TaskState::Todo,
    })
    .expect("valid task")
}

pub fn seed_contacts(store: &MemoryStore, ids: &[&str]) {
    for id in ids {
        let contact = Contact {
            id: id.to_string(),
            firstname: format!("First{id}"),
            lastname: format!("Last{id}"),
            email: format!("{id}@join.test"),
            phone: String::new(),
            initials: "FL".to_string(),
            color_tag: "#FF7A00".to_string(),
        };
        store
            .seed(tables::CONTACTS, id, &contact)
            .expect("seed contact");
    }
}

/// Create a task through the normal creation flow and reload it.
pub async fn create_task(
    store: &MemoryStore,
    title: &str,
    subtasks: &[&str],
    contacts: &[&str],
) -> TaskDetails {
    let plan = plan_creation(new_task(title), &strings(subtasks), &strings(contacts), None);
    plan.persist(store).await.expect("persist");
    board::require_task(store, &plan.task.id)
        .await
        .expect("reload task")
}
