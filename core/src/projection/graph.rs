use serde::Serialize;

use super::style::{status_icon, status_tone, Tone};
use crate::model::{StepId, StepStatus};
use crate::state::TaskView;

pub const COLUMN_WIDTH: i32 = 200;
pub const ROW_HEIGHT: i32 = 100;
const GRID_COLUMNS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Three columns, filled in plan order.
    #[default]
    Grid,
    /// One column per topological stage.
    Layered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: StepId,
    pub label: String,
    pub status: StepStatus,
    pub tone: Tone,
    pub icon: &'static str,
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeView {
    pub id: String,
    pub source: StepId,
    pub target: StepId,
    /// The dependent step is running.
    pub animated: bool,
}

pub fn grid_position(index: usize) -> Position {
    Position {
        x: (index % GRID_COLUMNS) as i32 * COLUMN_WIDTH,
        y: (index / GRID_COLUMNS) as i32 * ROW_HEIGHT,
    }
}

pub fn nodes(view: &TaskView, layout: Layout) -> Vec<NodeView> {
    let graph = view.graph();
    let positions: Vec<Position> = match layout {
        Layout::Grid => (0..graph.len()).map(grid_position).collect(),
        Layout::Layered => {
            let mut by_id = std::collections::HashMap::new();
            for (column, stage) in graph.stages().iter().enumerate() {
                for (row, id) in stage.iter().enumerate() {
                    by_id.insert(
                        *id,
                        Position {
                            x: column as i32 * COLUMN_WIDTH,
                            y: row as i32 * ROW_HEIGHT,
                        },
                    );
                }
            }
            graph
                .steps()
                .iter()
                .enumerate()
                .map(|(i, s)| by_id.get(&s.step_id).copied().unwrap_or_else(|| grid_position(i)))
                .collect()
        }
    };

    graph
        .steps()
        .iter()
        .zip(positions)
        .map(|(step, position)| NodeView {
            id: step.step_id,
            label: format!("{}. {}", step.step_id, step.name),
            status: step.status,
            tone: status_tone(step.status),
            icon: status_icon(step.status),
            position,
            agent: step.agent.clone(),
            tool: step.tool_name.clone(),
        })
        .collect()
}

pub fn edges(view: &TaskView) -> Vec<EdgeView> {
    let graph = view.graph();
    graph
        .to_edges()
        .into_iter()
        .map(|edge| EdgeView {
            id: format!("{}-{}", edge.source, edge.target),
            source: edge.source,
            target: edge.target,
            animated: graph
                .get(edge.target)
                .is_some_and(|s| s.status == StepStatus::Running),
        })
        .collect()
}
