pub mod consulta_store;
pub mod database;

pub use consulta_store::{CampoFiltro, ConsultaStore};
pub use database::Database;
