use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::config::ValidationConfig;
use crate::errors::ApiError;
use crate::state::colaboradores::{AtualizacaoColaborador, DadosColaborador, NovoColaborador};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^\(?\d{2}\)?\s?\d{4,5}-?\d{4}$").unwrap();
    static ref DATE_RE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

const MIN_TEXT_LENGTH: usize = 2;

/// Check a creation payload. All violations are collected in one pass;
/// on success the trimmed, ready-to-store fields are returned.
pub fn validate_colaborador(
    payload: NovoColaborador,
    rules: &ValidationConfig,
) -> Result<DadosColaborador, Vec<String>> {
    let mut errors = Vec::new();

    let nome = required_text(payload.nome, "Nome", rules.max_name_length, rules, &mut errors);
    let cargo = required_text(payload.cargo, "Cargo", rules.max_position_length, rules, &mut errors);
    let departamento = required_text(
        payload.departamento,
        "Departamento",
        rules.max_department_length,
        rules,
        &mut errors,
    );

    let email = payload.email.map(|e| e.trim().to_string()).unwrap_or_default();
    check_email(&email, rules, &mut errors);

    let telefone = non_empty(payload.telefone);
    if let Some(telefone) = &telefone {
        check_phone(telefone, rules, &mut errors);
    }

    let data_admissao = non_empty(payload.data_admissao);
    if let Some(data) = &data_admissao {
        check_admission_date(data, rules, &mut errors);
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(DadosColaborador {
        nome,
        cargo,
        departamento,
        email,
        telefone,
        data_admissao,
    })
}

/// Check only the fields an update actually carries, with the same rules
/// as creation. Empty optional fields count as absent, exactly as on
/// creation; the normalised changes are returned.
pub fn validate_atualizacao(
    changes: AtualizacaoColaborador,
    rules: &ValidationConfig,
) -> Result<AtualizacaoColaborador, Vec<String>> {
    let mut errors = Vec::new();

    let changes = AtualizacaoColaborador {
        nome: changes.nome.map(|v| v.trim().to_string()),
        cargo: changes.cargo.map(|v| v.trim().to_string()),
        departamento: changes.departamento.map(|v| v.trim().to_string()),
        email: changes.email.map(|v| v.trim().to_string()),
        telefone: non_empty(changes.telefone),
        data_admissao: non_empty(changes.data_admissao),
        ativo: changes.ativo,
    };

    if let Some(nome) = &changes.nome {
        check_text(nome, "Nome", rules.max_name_length, rules, &mut errors);
    }
    if let Some(cargo) = &changes.cargo {
        check_text(cargo, "Cargo", rules.max_position_length, rules, &mut errors);
    }
    if let Some(departamento) = &changes.departamento {
        check_text(departamento, "Departamento", rules.max_department_length, rules, &mut errors);
    }
    if let Some(email) = &changes.email {
        check_email(email, rules, &mut errors);
    }
    if let Some(telefone) = &changes.telefone {
        check_phone(telefone, rules, &mut errors);
    }
    if let Some(data) = &changes.data_admissao {
        check_admission_date(data, rules, &mut errors);
    }

    if errors.is_empty() {
        Ok(changes)
    } else {
        Err(errors)
    }
}

/// Path identifiers must not be empty or whitespace only.
pub fn validate_id(id: &str) -> Result<(), ApiError> {
    if id.trim().is_empty() {
        return Err(ApiError::MissingId);
    }
    Ok(())
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn required_text(
    value: Option<String>,
    field: &str,
    max_len: usize,
    rules: &ValidationConfig,
    errors: &mut Vec<String>,
) -> String {
    let value = value.map(|v| v.trim().to_string()).unwrap_or_default();
    check_text(&value, field, max_len, rules, errors);
    value
}

fn check_text(value: &str, field: &str, max_len: usize, rules: &ValidationConfig, errors: &mut Vec<String>) {
    let len = value.trim().chars().count();

    if len < MIN_TEXT_LENGTH {
        errors.push(format!(
            "{} é obrigatório e deve ter pelo menos {} caracteres",
            field, MIN_TEXT_LENGTH
        ));
    } else if rules.strict && len > max_len {
        errors.push(format!("{} deve ter no máximo {} caracteres", field, max_len));
    }
}

fn check_email(email: &str, rules: &ValidationConfig, errors: &mut Vec<String>) {
    if email.is_empty() || !is_valid_email(email) {
        errors.push("Email é obrigatório e deve ser válido".to_string());
    } else if rules.strict && email.chars().count() > rules.max_email_length {
        errors.push(format!(
            "Email deve ter no máximo {} caracteres",
            rules.max_email_length
        ));
    }
}

fn check_phone(telefone: &str, rules: &ValidationConfig, errors: &mut Vec<String>) {
    if rules.strict && !PHONE_RE.is_match(telefone) {
        errors.push("Telefone inválido. Use o formato (11) 99999-9999".to_string());
    }
}

fn check_admission_date(data: &str, rules: &ValidationConfig, errors: &mut Vec<String>) {
    if !rules.strict {
        return;
    }

    if !DATE_RE.is_match(data) {
        errors.push("Data de admissão deve estar no formato YYYY-MM-DD".to_string());
    } else if NaiveDate::parse_from_str(data, "%Y-%m-%d").is_err() {
        errors.push("Data de admissão inválida".to_string());
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
