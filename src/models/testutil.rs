use chrono::{TimeZone, Utc};

use crate::models::member::TeamMember;
use crate::models::stage::{Impact, Priority, Stage};
use crate::models::task::Task;

/// A medium-priority task created and last touched on 2024-01-01 08:00 UTC.
pub fn task(id: i64, status: Stage, owner_id: Option<i64>) -> Task {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    Task {
        id,
        op_number: format!("OP-{id:04}"),
        title: format!("Cliente {id}"),
        summary: String::new(),
        status,
        priority: Priority::Media,
        owner_id,
        owner_name: owner_id.map(|o| format!("Miembro {o}")),
        created_by: "admin".to_string(),
        tags: Vec::new(),
        materials: Vec::new(),
        sector: status.sector().to_string(),
        photo_url: None,
        progress: 0,
        impact: Impact::Medio,
        due_date: None,
        created_at: at,
        updated_at: at,
    }
}

pub fn member(id: i64, name: &str) -> TeamMember {
    TeamMember {
        id,
        username: name.to_lowercase(),
        display_name: name.to_string(),
        role_label: "Operario".to_string(),
        productivity: 1.0,
        is_admin: false,
    }
}
