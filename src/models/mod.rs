pub mod consulta;
pub mod resultado;

pub use consulta::{Consulta, StatusConsulta};
pub use resultado::{CampaignStatus, DadosCadastrais, Resultado};
