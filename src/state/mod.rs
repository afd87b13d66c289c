pub mod app;
pub mod colaboradores;

pub use app::AppState;
pub use colaboradores::{
    AtualizacaoColaborador, Colaborador, ColaboradorStore, DadosColaborador, NovoColaborador,
};
