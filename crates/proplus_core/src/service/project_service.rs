//! Project and task use-case service.
//!
//! # Responsibility
//! - Create, edit, archive and delete projects.
//! - Add, toggle and delete tasks inside a project.
//!
//! # Invariants
//! - Editing a project keeps its id, status and tasks.
//! - Archive is a reversible status change, never a deletion.

use crate::model::dates::parse_civil_date;
use crate::model::project::{Project, ProjectStatus, Task, DEFAULT_TASK_PRIORITY};
use crate::model::record::ProductivityRecord;
use crate::service::mutation_error::{require_text, MutationError, MutationResult};
use chrono::NaiveDate;
use log::info;

/// Form input for creating or editing a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDraft {
    pub name: String,
    pub description: String,
    /// `YYYY-MM-DD`, or empty for no deadline.
    pub deadline: String,
}

impl ProjectDraft {
    fn validate(&self) -> MutationResult<(String, Option<NaiveDate>)> {
        let name = require_text(&self.name, "name")?;
        let deadline = match self.deadline.trim() {
            "" => None,
            value => Some(
                parse_civil_date(value)
                    .ok_or_else(|| MutationError::InvalidDate(value.to_string()))?,
            ),
        };
        Ok((name, deadline))
    }
}

/// Project mutations over one borrowed record.
pub struct ProjectService<'a> {
    record: &'a mut ProductivityRecord,
}

impl<'a> ProjectService<'a> {
    pub fn new(record: &'a mut ProductivityRecord) -> Self {
        Self { record }
    }

    /// Appends an active project and returns its id.
    pub fn create_project(&mut self, draft: &ProjectDraft) -> MutationResult<String> {
        let (name, deadline) = draft.validate()?;
        let project = Project::new(name, draft.description.trim(), deadline);
        let id = project.id.clone();
        self.record.projects.push(project);
        info!("event=project_create module=service status=ok project_id={id}");
        Ok(id)
    }

    /// Replaces name, description and deadline of an existing project.
    pub fn update_project(&mut self, project_id: &str, draft: &ProjectDraft) -> MutationResult<()> {
        let (name, deadline) = draft.validate()?;
        let project = self.find_mut(project_id)?;
        project.name = name;
        project.description = draft.description.trim().to_string();
        project.deadline = deadline;
        Ok(())
    }

    pub fn delete_project(&mut self, project_id: &str) -> MutationResult<()> {
        let before = self.record.projects.len();
        self.record
            .projects
            .retain(|project| project.id != project_id);
        if self.record.projects.len() == before {
            return Err(MutationError::ProjectNotFound(project_id.to_string()));
        }
        info!("event=project_delete module=service status=ok project_id={project_id}");
        Ok(())
    }

    pub fn archive_project(&mut self, project_id: &str) -> MutationResult<()> {
        self.find_mut(project_id)?.status = ProjectStatus::Archived;
        Ok(())
    }

    pub fn unarchive_project(&mut self, project_id: &str) -> MutationResult<()> {
        self.find_mut(project_id)?.status = ProjectStatus::Active;
        Ok(())
    }

    /// Appends an open task and returns its id.
    pub fn add_task(
        &mut self,
        project_id: &str,
        text: &str,
        priority: Option<i32>,
    ) -> MutationResult<String> {
        let text = require_text(text, "task text")?;
        let project = self.find_mut(project_id)?;
        let task = Task::new(text, priority.unwrap_or(DEFAULT_TASK_PRIORITY));
        let id = task.id.clone();
        project.tasks.push(task);
        Ok(id)
    }

    /// Adds a task to the project whose name matches `project_name`
    /// case-insensitively. Returns `(project_id, task_id)`.
    pub fn add_task_by_project_name(
        &mut self,
        project_name: &str,
        text: &str,
    ) -> MutationResult<(String, String)> {
        let wanted = require_text(project_name, "project name")?.to_lowercase();
        let project_id = self
            .record
            .projects
            .iter()
            .find(|project| project.name.to_lowercase() == wanted)
            .map(|project| project.id.clone())
            .ok_or_else(|| MutationError::ProjectNotFound(project_name.trim().to_string()))?;
        let task_id = self.add_task(&project_id, text, None)?;
        Ok((project_id, task_id))
    }

    /// Flips a task's done flag and returns the new value.
    pub fn toggle_task(&mut self, project_id: &str, task_id: &str) -> MutationResult<bool> {
        let task = self.find_task_mut(project_id, task_id)?;
        task.done = !task.done;
        Ok(task.done)
    }

    pub fn delete_task(&mut self, project_id: &str, task_id: &str) -> MutationResult<()> {
        let project = self.find_mut(project_id)?;
        let before = project.tasks.len();
        project.tasks.retain(|task| task.id != task_id);
        if project.tasks.len() == before {
            return Err(MutationError::TaskNotFound {
                project_id: project_id.to_string(),
                task_id: task_id.to_string(),
            });
        }
        Ok(())
    }

    fn find_mut(&mut self, project_id: &str) -> MutationResult<&mut Project> {
        self.record
            .project_mut(project_id)
            .ok_or_else(|| MutationError::ProjectNotFound(project_id.to_string()))
    }

    fn find_task_mut(&mut self, project_id: &str, task_id: &str) -> MutationResult<&mut Task> {
        self.find_mut(project_id)?
            .tasks
            .iter_mut()
            .find(|task| task.id == task_id)
            .ok_or_else(|| MutationError::TaskNotFound {
                project_id: project_id.to_string(),
                task_id: task_id.to_string(),
            })
    }
}
