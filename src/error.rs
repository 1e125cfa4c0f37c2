use std::time::Duration;

use thiserror::Error;

/// Erros da sessão de navegador e da navegação pelo portal
///
/// O fluxo de cada IE decide o desfecho pela fase em que a falha ocorreu,
/// por isso estas categorias são tipadas; o restante do aplicativo usa
/// `anyhow` nas bordas.
#[derive(Error, Debug)]
pub enum PortalError {
    /// O navegador não pôde ser iniciado ou a página inicial não abriu
    #[error("não foi possível iniciar a sessão do navegador: {causa}")]
    Sessao { causa: String },

    /// Um elemento esperado do formulário nunca apareceu
    #[error("elemento '{seletor}' não apareceu em {limite:?}")]
    ElementoAusente { seletor: String, limite: Duration },

    /// A URL da página de resultado não chegou dentro do prazo
    #[error("página de resultado não carregou (última URL: '{url}')")]
    ResultadoNaoCarregou { url: String },

    /// Um texto esperado não apareceu na página dentro do prazo
    #[error("texto '{texto}' não apareceu na página em {limite:?}")]
    TextoAusente { texto: String, limite: Duration },

    /// Falha do protocolo DevTools
    #[error("falha de comunicação com o navegador: {0}")]
    Navegador(#[from] chromiumoxide::error::CdpError),

    /// O navegador devolveu um valor que não era do tipo esperado
    #[error("resposta inesperada do navegador: {0}")]
    Resposta(#[from] serde_json::Error),
}

/// Erros ao interpretar o HTML da página de resultado
#[derive(Error, Debug)]
pub enum ParseError {
    /// A página carregou mas não é a consulta básica do cadastro
    #[error("página de resultado sem o cabeçalho '{0}'")]
    CabecalhoAusente(String),
}
