use serde_json::json;

use crate::db::models::{NewTask, Task};
use crate::db::{from_rows, to_row, Gateway, Query, Row};
use crate::error::AppError;

pub const TASKS: &str = "tasks";

pub struct TaskRepository;

impl TaskRepository {
    pub async fn list(gateway: &dyn Gateway, wedding_id: &str) -> Result<Vec<Task>, AppError> {
        from_rows(
            gateway
                .select(TASKS, &Query::new().eq("wedding_id", wedding_id).order("title"))
                .await?,
        )
    }

    pub async fn insert(gateway: &dyn Gateway, task: &NewTask) -> Result<(), AppError> {
        gateway.insert(TASKS, vec![to_row(task)?]).await?;
        Ok(())
    }

    pub async fn set_completed(
        gateway: &dyn Gateway,
        wedding_id: &str,
        task_id: &str,
        completed: bool,
    ) -> Result<(), AppError> {
        let mut values = Row::new();
        values.insert("completed".to_string(), json!(completed));
        gateway
            .update(
                TASKS,
                values,
                &Query::new().eq("id", task_id).eq("wedding_id", wedding_id),
            )
            .await?;
        Ok(())
    }
}
