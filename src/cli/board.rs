//! jb board and category commands.

use serde::Serialize;

use crate::board::{self, Board, TaskDetails};
use crate::error::Result;
use crate::model::{Category, TaskState};
use crate::output::{emit_success, HumanOutput};

use super::{Context, Globals};

pub struct BoardOptions {
    pub search: Option<String>,
    pub globals: Globals,
}

#[derive(Serialize)]
struct ColumnOutput<'a> {
    state: TaskState,
    label: &'static str,
    tasks: Vec<&'a TaskDetails>,
}

#[derive(Serialize)]
struct BoardOutput<'a> {
    total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
    columns: Vec<ColumnOutput<'a>>,
}

#[derive(Serialize)]
struct CategoryListOutput<'a> {
    total: usize,
    categories: &'a [Category],
}

pub async fn run_board(options: BoardOptions) -> Result<()> {
    let ctx = Context::open(&options.globals)?;
    let board = board::load_board(&ctx.store).await?;
    let output = board_output(&board, options.search.as_deref());

    let mut human = HumanOutput::new("Board");
    human.push_summary("Tasks", output.total.to_string());
    if let Some(search) = output.search {
        human.push_summary("Search", search);
    }
    for column in &output.columns {
        human.push_detail(format!("{} ({})", column.label, column.tasks.len()));
        for details in &column.tasks {
            let (done, total) = details.progress();
            human.push_detail(format!(
                "  {}  {}  due {}  {}  [{done}/{total}]",
                details.task.id,
                details.task.title,
                details.task.due_date,
                details.task.priority
            ));
        }
    }

    emit_success(ctx.output, "board", &output, Some(&human))
}

fn board_output<'a>(board: &'a Board, search: Option<&'a str>) -> BoardOutput<'a> {
    let matches: Option<Vec<&str>> = search.map(|query| {
        board
            .search(query)
            .into_iter()
            .map(|details| details.task.id.as_str())
            .collect()
    });
    let columns: Vec<ColumnOutput<'a>> = board
        .columns
        .iter()
        .map(|column| ColumnOutput {
            state: column.state,
            label: column.state.label(),
            tasks: column
                .tasks
                .iter()
                .filter(|details| {
                    matches
                        .as_ref()
                        .map_or(true, |ids| ids.contains(&details.task.id.as_str()))
                })
                .collect(),
        })
        .collect();
    BoardOutput {
        total: columns.iter().map(|column| column.tasks.len()).sum(),
        search,
        columns,
    }
}

pub async fn run_categories(globals: Globals) -> Result<()> {
    let ctx = Context::open(&globals)?;
    let categories = board::list_categories(&ctx.store).await?;

    let mut human = HumanOutput::new("Categories");
    human.push_summary("Total", categories.len().to_string());
    for category in &categories {
        human.push_detail(format!("{}  {}", category.id, category.name));
    }

    let output = CategoryListOutput {
        total: categories.len(),
        categories: &categories,
    };
    emit_success(ctx.output, "category ls", &output, Some(&human))
}
