//! Inicialização do logger global.

use tracing_subscriber::EnvFilter;

/// Instala o subscriber de `tracing` no stdout.
///
/// O nível padrão é `info`; a variável `RUST_LOG` sobrepõe.
pub fn init() {
    let filtro = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filtro).init();
}
