//! Final scene summaries.

use meshbool::CommandStatus;
use meshbool_scene::Scene;
use serde::Serialize;

use crate::script::StepResult;

#[derive(Debug, Serialize)]
pub struct Report {
    pub steps: Vec<StepReport>,
    pub entities: Vec<EntityReport>,
    pub groups: Vec<GroupReport>,
}

#[derive(Debug, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub command: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EntityReport {
    pub name: String,
    pub kind: String,
    pub display: String,
    pub hidden: bool,
    pub vertices: usize,
    pub faces: usize,
    pub baked: Vec<String>,
    pub stack: Vec<OperationReport>,
    pub groups: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct OperationReport {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GroupReport {
    pub name: String,
    pub purpose: String,
    pub hidden: bool,
    pub entities: Vec<String>,
}

impl Report {
    pub fn new(scene: &Scene, results: &[StepResult]) -> Self {
        let name_of = |id| {
            scene
                .entity(id)
                .map(|e| e.name.clone())
                .unwrap_or_else(|| "<missing>".to_string())
        };

        let steps = results
            .iter()
            .map(|r| {
                let (status, message) = match &r.status {
                    CommandStatus::Finished => ("finished", None),
                    CommandStatus::Cancelled => ("cancelled", None),
                    CommandStatus::Warning(msg) => ("warning", Some(msg.clone())),
                };
                StepReport {
                    index: r.index,
                    command: format!("{:?}", r.command),
                    status: status.to_string(),
                    message,
                }
            })
            .collect();

        let mut entities: Vec<EntityReport> = scene
            .entities()
            .map(|(_, e)| EntityReport {
                name: e.name.clone(),
                kind: format!("{:?}", e.kind).to_lowercase(),
                display: format!("{:?}", e.display).to_lowercase(),
                hidden: e.hide_viewport,
                vertices: e.mesh.vertex_count(),
                faces: e.mesh.face_count(),
                baked: e.mesh.history.iter().map(|b| b.label.clone()).collect(),
                stack: e
                    .stack
                    .iter()
                    .map(|op| OperationReport {
                        name: op.name.clone(),
                        kind: op.kind.type_name().to_string(),
                        source: op.kind.referenced_entity().map(name_of),
                    })
                    .collect(),
                groups: e
                    .groups
                    .iter()
                    .filter_map(|g| scene.group(*g).map(|g| g.name.clone()))
                    .collect(),
            })
            .collect();
        entities.sort_by(|a, b| a.name.cmp(&b.name));

        let mut groups: Vec<GroupReport> = scene
            .groups()
            .map(|(_, g)| GroupReport {
                name: g.name.clone(),
                purpose: format!("{:?}", g.purpose).to_lowercase(),
                hidden: g.hide_viewport,
                entities: g.entities.iter().map(|id| name_of(*id)).collect(),
            })
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            steps,
            entities,
            groups,
        }
    }

    pub fn print(&self) {
        if !self.steps.is_empty() {
            println!("Steps:");
            for step in &self.steps {
                match &step.message {
                    Some(msg) => println!("  {}: {} ({}: {})", step.index, step.command, step.status, msg),
                    None => println!("  {}: {} ({})", step.index, step.command, step.status),
                }
            }
        }

        println!("\nEntities: {}", self.entities.len());
        for entity in &self.entities {
            let hidden = if entity.hidden { ", hidden" } else { "" };
            println!(
                "  {} [{}, {}{}] {} verts, {} faces",
                entity.name, entity.kind, entity.display, hidden, entity.vertices, entity.faces
            );
            for op in &entity.stack {
                match &op.source {
                    Some(source) => println!("    - {} ({} <- {})", op.name, op.kind, source),
                    None => println!("    - {} ({})", op.name, op.kind),
                }
            }
            if !entity.baked.is_empty() {
                println!("    baked: {}", entity.baked.join(", "));
            }
        }

        println!("\nGroups: {}", self.groups.len());
        for group in &self.groups {
            let hidden = if group.hidden { ", hidden" } else { "" };
            println!(
                "  {} [{}{}]: {}",
                group.name,
                group.purpose,
                hidden,
                group.entities.join(", ")
            );
        }
    }
}
