//! Demo dataset: loaded into the mock store at startup, and into an empty
//! Postgres database on first run.

use chrono::{DateTime, Duration, Utc};

use crate::auth::password;
use crate::db::Store;
use crate::errors::AppError;
use crate::models::member::{self, NewMember};
use crate::models::stage::{Impact, Priority, Stage};
use crate::models::task::{self, NewTask};

struct SeedMember {
    username: &'static str,
    display_name: &'static str,
    role_label: &'static str,
    productivity: f64,
    is_admin: bool,
}

const MEMBERS: &[SeedMember] = &[
    SeedMember { username: "admin", display_name: "Administración", role_label: "Administración", productivity: 1.0, is_admin: true },
    SeedMember { username: "ana", display_name: "Ana Pérez", role_label: "Diseño", productivity: 0.92, is_admin: false },
    SeedMember { username: "beto", display_name: "Beto Gómez", role_label: "Impresión", productivity: 0.85, is_admin: false },
    SeedMember { username: "carla", display_name: "Carla Ruiz", role_label: "Taller", productivity: 0.78, is_admin: false },
    SeedMember { username: "diego", display_name: "Diego Sosa", role_label: "Herrería", productivity: 0.81, is_admin: false },
    SeedMember { username: "eli", display_name: "Eli Martínez", role_label: "Instalación", productivity: 0.88, is_admin: false },
];

struct SeedTask {
    op_number: &'static str,
    client: &'static str,
    summary: &'static str,
    status: Stage,
    priority: Priority,
    owner: Option<&'static str>,
    tags: &'static [&'static str],
    materials: &'static [&'static str],
    impact: Impact,
    due_in_days: Option<i64>,
    /// Hours since the OP was last touched.
    idle_hours: i64,
}

const TASKS: &[SeedTask] = &[
    SeedTask { op_number: "OP-2401", client: "Panadería La Espiga", summary: "Cartel frontal luminoso 3x1 m", status: Stage::Diseno, priority: Priority::Alta, owner: Some("ana"), tags: &["luminoso", "frente"], materials: &["acrílico", "LED"], impact: Impact::Alto, due_in_days: Some(5), idle_hours: 6 },
    SeedTask { op_number: "OP-2402", client: "Farmacia Central", summary: "Vinilos de vidriera y horarios", status: Stage::Impresion, priority: Priority::Media, owner: Some("beto"), tags: &["vinilo"], materials: &["vinilo de corte"], impact: Impact::Medio, due_in_days: Some(2), idle_hours: 20 },
    SeedTask { op_number: "OP-2403", client: "Club Atlético Norte", summary: "Lona 6x2 para tribuna", status: Stage::Impresion, priority: Priority::Alta, owner: Some("beto"), tags: &["lona", "evento"], materials: &["lona front", "ojales"], impact: Impact::Alto, due_in_days: Some(1), idle_hours: 60 },
    SeedTask { op_number: "OP-2404", client: "Estudio Ferreyra", summary: "Placa de bronce para entrada", status: Stage::Aprobacion, priority: Priority::Baja, owner: Some("ana"), tags: &["placa"], materials: &["bronce"], impact: Impact::Bajo, due_in_days: Some(14), idle_hours: 110 },
    SeedTask { op_number: "OP-2405", client: "Supermercado Don José", summary: "Estructura metálica para marquesina", status: Stage::Herreria, priority: Priority::Alta, owner: Some("diego"), tags: &["estructura", "marquesina"], materials: &["caño 40x40", "chapa"], impact: Impact::Alto, due_in_days: Some(7), idle_hours: 30 },
    SeedTask { op_number: "OP-2406", client: "Heladería Polo", summary: "Corpóreos de PVC pintados", status: Stage::Pintura, priority: Priority::Media, owner: Some("carla"), tags: &["corpóreo"], materials: &["PVC 10 mm", "esmalte"], impact: Impact::Medio, due_in_days: Some(4), idle_hours: 12 },
    SeedTask { op_number: "OP-2407", client: "Municipalidad", summary: "Señalética para plaza", status: Stage::Taller, priority: Priority::Media, owner: Some("carla"), tags: &["señalética"], materials: &["aluminio compuesto"], impact: Impact::Alto, due_in_days: Some(20), idle_hours: 40 },
    SeedTask { op_number: "OP-2408", client: "Gimnasio Impulso", summary: "Ploteo de pared interior", status: Stage::Instalacion, priority: Priority::Media, owner: Some("eli"), tags: &["ploteo", "interior"], materials: &["vinilo impreso", "laminado mate"], impact: Impact::Medio, due_in_days: Some(1), idle_hours: 3 },
    SeedTask { op_number: "OP-2409", client: "Inmobiliaria Sur", summary: "20 carteles de venta", status: Stage::Corte, priority: Priority::Baja, owner: Some("beto"), tags: &["serie"], materials: &["alto impacto"], impact: Impact::Bajo, due_in_days: None, idle_hours: 8 },
    SeedTask { op_number: "OP-2410", client: "Bodega Los Álamos", summary: "Tótem para feria", status: Stage::Pendiente, priority: Priority::Alta, owner: None, tags: &["tótem", "feria"], materials: &[], impact: Impact::Alto, due_in_days: Some(10), idle_hours: 2 },
    SeedTask { op_number: "OP-2411", client: "Taller Mecánico Rueda", summary: "Chapa pintada con logo", status: Stage::Entrega, priority: Priority::Media, owner: Some("eli"), tags: &["chapa"], materials: &["chapa galvanizada"], impact: Impact::Bajo, due_in_days: Some(-2), idle_hours: 70 },
    SeedTask { op_number: "OP-2412", client: "Colegio San Martín", summary: "Banderas institucionales", status: Stage::Entrega, priority: Priority::Baja, owner: Some("beto"), tags: &["banderas"], materials: &["tela"], impact: Impact::Medio, due_in_days: Some(-5), idle_hours: 130 },
];

/// Load the demo members and OPs. `admin_password_hash` is used for every
/// demo account.
pub async fn seed_demo(store: &Store, admin_password_hash: &str, now: DateTime<Utc>) -> Result<(), AppError> {
    let mut ids = Vec::with_capacity(MEMBERS.len());
    for m in MEMBERS {
        let id = member::create(
            store,
            &NewMember {
                username: m.username.to_string(),
                password: admin_password_hash.to_string(),
                display_name: m.display_name.to_string(),
                role_label: m.role_label.to_string(),
                productivity: m.productivity,
                is_admin: m.is_admin,
            },
        )
        .await?;
        ids.push((m.username, id));
    }

    for t in TASKS {
        let owner_id = t
            .owner
            .and_then(|u| ids.iter().find(|(name, _)| *name == u).map(|(_, id)| *id));
        let touched = now - Duration::hours(t.idle_hours);
        let new = NewTask {
            op_number: t.op_number.to_string(),
            title: t.client.to_string(),
            summary: t.summary.to_string(),
            status: Some(t.status),
            priority: Some(t.priority),
            owner_id,
            created_by: "admin".to_string(),
            tags: t.tags.iter().map(|s| s.to_string()).collect(),
            materials: t.materials.iter().map(|s| s.to_string()).collect(),
            impact: Some(t.impact),
            due_date: t.due_in_days.map(|d| (now + Duration::days(d)).date_naive()),
        };
        task::create(store, &new, touched).await?;
    }

    log::info!("Demo seed complete: {} members, {} OPs", MEMBERS.len(), TASKS.len());
    Ok(())
}

/// Seed only when the store has no members yet.
pub async fn seed_if_empty(store: &Store, admin_password: &str, now: DateTime<Utc>) -> Result<(), AppError> {
    let count = member::count(store).await?;
    if count > 0 {
        log::info!("Store already seeded ({count} members), skipping demo seed");
        return Ok(());
    }
    let hash = password::hash_password(admin_password)?;
    seed_demo(store, &hash, now).await
}

pub fn demo_member_count() -> usize {
    MEMBERS.len()
}

pub fn demo_task_count() -> usize {
    TASKS.len()
}
