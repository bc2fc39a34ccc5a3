use serde::{Deserialize, Serialize};

/// One of the ten fixed production stages an OP moves through.
///
/// The declaration order is the board's column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Pendiente,
    Diseno,
    Aprobacion,
    Impresion,
    Corte,
    Taller,
    Herreria,
    Pintura,
    Instalacion,
    Entrega,
}

/// Static description of a board column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnConfig {
    pub stage: Stage,
    pub label: &'static str,
    pub description: &'static str,
    pub color: &'static str,
    pub sector: &'static str,
}

pub const COLUMNS: [ColumnConfig; 10] = [
    ColumnConfig {
        stage: Stage::Pendiente,
        label: "Pendiente",
        description: "OP recibida, sin iniciar",
        color: "#94a3b8",
        sector: "Recepción",
    },
    ColumnConfig {
        stage: Stage::Diseno,
        label: "Diseño",
        description: "Armado de archivos y bocetos",
        color: "#a855f7",
        sector: "Diseño",
    },
    ColumnConfig {
        stage: Stage::Aprobacion,
        label: "Aprobación cliente",
        description: "Esperando conformidad del cliente",
        color: "#f59e0b",
        sector: "Comercial",
    },
    ColumnConfig {
        stage: Stage::Impresion,
        label: "Impresión",
        description: "En cola o en máquina",
        color: "#3b82f6",
        sector: "Impresión",
    },
    ColumnConfig {
        stage: Stage::Corte,
        label: "Corte y laminado",
        description: "Plotter de corte, laminado y acabados",
        color: "#06b6d4",
        sector: "Acabados",
    },
    ColumnConfig {
        stage: Stage::Taller,
        label: "Taller",
        description: "Armado de piezas y estructuras livianas",
        color: "#14b8a6",
        sector: "Taller",
    },
    ColumnConfig {
        stage: Stage::Herreria,
        label: "Herrería",
        description: "Estructuras metálicas y soldadura",
        color: "#64748b",
        sector: "Herrería",
    },
    ColumnConfig {
        stage: Stage::Pintura,
        label: "Pintura",
        description: "Pintura y secado",
        color: "#ec4899",
        sector: "Pintura",
    },
    ColumnConfig {
        stage: Stage::Instalacion,
        label: "Instalación",
        description: "Colocación en obra o local del cliente",
        color: "#f97316",
        sector: "Instalación",
    },
    ColumnConfig {
        stage: Stage::Entrega,
        label: "Entrega",
        description: "Entregada o lista para retirar",
        color: "#22c55e",
        sector: "Despacho",
    },
];

impl Stage {
    pub const ALL: [Stage; 10] = [
        Stage::Pendiente,
        Stage::Diseno,
        Stage::Aprobacion,
        Stage::Impresion,
        Stage::Corte,
        Stage::Taller,
        Stage::Herreria,
        Stage::Pintura,
        Stage::Instalacion,
        Stage::Entrega,
    ];

    /// Identifier stored in the `orders.status` column and used in URLs.
    pub fn id(self) -> &'static str {
        match self {
            Stage::Pendiente => "pendiente",
            Stage::Diseno => "diseno",
            Stage::Aprobacion => "aprobacion",
            Stage::Impresion => "impresion",
            Stage::Corte => "corte",
            Stage::Taller => "taller",
            Stage::Herreria => "herreria",
            Stage::Pintura => "pintura",
            Stage::Instalacion => "instalacion",
            Stage::Entrega => "entrega",
        }
    }

    pub fn from_id(id: &str) -> Option<Stage> {
        Stage::ALL.into_iter().find(|s| s.id() == id.trim())
    }

    pub fn column(self) -> &'static ColumnConfig {
        &COLUMNS[self.position()]
    }

    pub fn label(self) -> &'static str {
        self.column().label
    }

    /// Reverse lookup from a display label (case-insensitive).
    pub fn from_label(label: &str) -> Option<Stage> {
        let label = label.trim();
        COLUMNS
            .iter()
            .find(|c| c.label.eq_ignore_ascii_case(label))
            .map(|c| c.stage)
    }

    pub fn sector(self) -> &'static str {
        self.column().sector
    }

    pub fn color(self) -> &'static str {
        self.column().color
    }

    /// Zero-based column index.
    pub fn position(self) -> usize {
        self as usize
    }

    pub fn is_terminal(self) -> bool {
        self == Stage::Entrega
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Alta,
    Media,
    Baja,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Alta, Priority::Media, Priority::Baja];

    pub fn id(self) -> &'static str {
        match self {
            Priority::Alta => "alta",
            Priority::Media => "media",
            Priority::Baja => "baja",
        }
    }

    pub fn from_id(id: &str) -> Option<Priority> {
        Priority::ALL.into_iter().find(|p| p.id() == id.trim())
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Alta => "Alta",
            Priority::Media => "Media",
            Priority::Baja => "Baja",
        }
    }

    /// Stored representation (`orders.priority SMALLINT`). Lower sorts first.
    pub fn to_level(self) -> i16 {
        match self {
            Priority::Alta => 1,
            Priority::Media => 2,
            Priority::Baja => 3,
        }
    }

    pub fn from_level(level: i16) -> Option<Priority> {
        match level {
            1 => Some(Priority::Alta),
            2 => Some(Priority::Media),
            3 => Some(Priority::Baja),
            _ => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Business impact of an OP, displayed as a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Alto,
    Medio,
    Bajo,
}

impl Impact {
    pub const ALL: [Impact; 3] = [Impact::Alto, Impact::Medio, Impact::Bajo];

    pub fn id(self) -> &'static str {
        match self {
            Impact::Alto => "alto",
            Impact::Medio => "medio",
            Impact::Bajo => "bajo",
        }
    }

    pub fn from_id(id: &str) -> Option<Impact> {
        Impact::ALL.into_iter().find(|i| i.id() == id.trim())
    }
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}
