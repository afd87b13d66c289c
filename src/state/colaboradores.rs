use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

/// A single employee record.
///
/// `data_criacao` is set once when the record is created;
/// `data_atualizacao` is refreshed on every successful mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Colaborador {
    pub id: String,
    pub nome: String,
    pub cargo: String,
    pub departamento: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_admissao: Option<String>,
    pub ativo: bool,
    pub data_criacao: DateTime<Utc>,
    pub data_atualizacao: DateTime<Utc>,
}

/// Creation payload as received. Every field is optional here so that
/// validation can report all missing fields at once.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NovoColaborador {
    pub nome: Option<String>,
    pub cargo: Option<String>,
    pub departamento: Option<String>,
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub data_admissao: Option<String>,
}

/// Fields needed to create a record, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct DadosColaborador {
    pub nome: String,
    pub cargo: String,
    pub departamento: String,
    pub email: String,
    pub telefone: Option<String>,
    pub data_admissao: Option<String>,
}

/// Partial update. Absent fields keep their current value; identifier and
/// timestamps are not accepted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtualizacaoColaborador {
    pub nome: Option<String>,
    pub cargo: Option<String>,
    pub departamento: Option<String>,
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub data_admissao: Option<String>,
    pub ativo: Option<bool>,
}

/// Shared handle to the in-memory collection. Cloning shares the same
/// records; each `ColaboradorStore::new()` is an independent store.
#[derive(Clone, Debug)]
pub struct ColaboradorStore {
    records: Arc<RwLock<Vec<Colaborador>>>,
}

impl ColaboradorStore {
    /// A store seeded with the fixture records.
    pub fn new() -> Self {
        Self::with_records(fixtures())
    }

    pub fn empty() -> Self {
        Self::with_records(Vec::new())
    }

    fn with_records(records: Vec<Colaborador>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Colaborador>>, StoreError> {
        self.records.read().map_err(|_| StoreError::Poisoned)
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Colaborador>>, StoreError> {
        self.records.write().map_err(|_| StoreError::Poisoned)
    }
}

impl Default for ColaboradorStore {
    fn default() -> Self {
        Self::new()
    }
}

/// The records a fresh process (or a reset) starts with.
pub fn fixtures() -> Vec<Colaborador> {
    let now = Utc::now();

    vec![
        Colaborador {
            id: "1".to_string(),
            nome: "João Silva".to_string(),
            cargo: "Desenvolvedor Backend".to_string(),
            departamento: "Tecnologia".to_string(),
            email: "joao.silva@empresa.com".to_string(),
            telefone: Some("(11) 99999-9999".to_string()),
            data_admissao: Some("2023-01-15".to_string()),
            ativo: true,
            data_criacao: now,
            data_atualizacao: now,
        },
        Colaborador {
            id: "2".to_string(),
            nome: "Maria Santos".to_string(),
            cargo: "Desenvolvedor Frontend".to_string(),
            departamento: "Tecnologia".to_string(),
            email: "maria.santos@empresa.com".to_string(),
            telefone: Some("(11) 88888-8888".to_string()),
            data_admissao: Some("2023-03-20".to_string()),
            ativo: true,
            data_criacao: now,
            data_atualizacao: now,
        },
    ]
}
