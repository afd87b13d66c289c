pub mod colaborador_service;
pub mod validation_service;
