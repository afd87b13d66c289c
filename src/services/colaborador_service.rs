use chrono::Utc;
use uuid::Uuid;

use crate::errors::StoreError;
use crate::state::colaboradores::{
    fixtures, AtualizacaoColaborador, Colaborador, ColaboradorStore, DadosColaborador,
};

/// All records, in insertion order.
pub fn list_all(store: &ColaboradorStore) -> Result<Vec<Colaborador>, StoreError> {
    Ok(store.read()?.clone())
}

/// Look a record up by identifier.
pub fn find_by_id(store: &ColaboradorStore, id: &str) -> Result<Option<Colaborador>, StoreError> {
    let records = store.read()?;
    Ok(records.iter().find(|c| c.id == id).cloned())
}

/// Append a new record with a fresh identifier.
///
/// The caller validates `dados`; nothing is re-checked here.
pub fn create(store: &ColaboradorStore, dados: DadosColaborador) -> Result<Colaborador, StoreError> {
    let now = Utc::now();

    let colaborador = Colaborador {
        id: Uuid::new_v4().to_string(),
        nome: dados.nome,
        cargo: dados.cargo,
        departamento: dados.departamento,
        email: dados.email,
        telefone: dados.telefone,
        data_admissao: dados.data_admissao,
        ativo: true,
        data_criacao: now,
        data_atualizacao: now,
    };

    store.write()?.push(colaborador.clone());

    tracing::debug!(id = %colaborador.id, "Colaborador created");
    Ok(colaborador)
}

/// Merge `changes` over the record with `id`. Returns `None` if no such
/// record exists.
pub fn update(
    store: &ColaboradorStore,
    id: &str,
    changes: AtualizacaoColaborador,
) -> Result<Option<Colaborador>, StoreError> {
    let mut records = store.write()?;

    let Some(existing) = records.iter_mut().find(|c| c.id == id) else {
        return Ok(None);
    };

    if let Some(nome) = changes.nome {
        existing.nome = nome;
    }
    if let Some(cargo) = changes.cargo {
        existing.cargo = cargo;
    }
    if let Some(departamento) = changes.departamento {
        existing.departamento = departamento;
    }
    if let Some(email) = changes.email {
        existing.email = email;
    }
    if let Some(telefone) = changes.telefone {
        existing.telefone = Some(telefone);
    }
    if let Some(data_admissao) = changes.data_admissao {
        existing.data_admissao = Some(data_admissao);
    }
    if let Some(ativo) = changes.ativo {
        existing.ativo = ativo;
    }

    existing.data_atualizacao = Utc::now();

    Ok(Some(existing.clone()))
}

/// Remove the record with `id`. `false` if it did not exist.
pub fn delete(store: &ColaboradorStore, id: &str) -> Result<bool, StoreError> {
    let mut records = store.write()?;

    match records.iter().position(|c| c.id == id) {
        Some(index) => {
            records.remove(index);
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Records whose department equals `departamento`, ignoring case.
pub fn find_by_department(
    store: &ColaboradorStore,
    departamento: &str,
) -> Result<Vec<Colaborador>, StoreError> {
    let wanted = departamento.to_lowercase();
    let records = store.read()?;

    Ok(records
        .iter()
        .filter(|c| c.departamento.to_lowercase() == wanted)
        .cloned()
        .collect())
}

/// Restore the fixture records, dropping everything else. Test support.
pub fn reset(store: &ColaboradorStore) -> Result<(), StoreError> {
    *store.write()? = fixtures();
    Ok(())
}

/// Number of stored records.
pub fn count(store: &ColaboradorStore) -> Result<usize, StoreError> {
    Ok(store.read()?.len())
}
