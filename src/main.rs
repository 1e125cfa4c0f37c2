use std::path::PathBuf;

use anyhow::Result;
use consulta_sefaz::{App, Config, Reprocesso};

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializa o log
    consulta_sefaz::logger::init();

    // Carrega a configuração
    let config = Config::from_env();

    let mut args = std::env::args().skip(1);
    let comando = args.next();

    let app = App::initialize(config).await?;

    match comando.as_deref() {
        // consulta-sefaz reprocessar <id-do-lote>
        Some("reprocessar") => {
            let lote = match args.next() {
                Some(lote) => lote,
                None => anyhow::bail!("Uso: consulta-sefaz reprocessar <id-do-lote>"),
            };
            match app.reprocess_batch(&lote).await? {
                Reprocesso::Iniciado => acompanhar(&app, &lote).await?,
                Reprocesso::NaoEncontrado => anyhow::bail!("Processo não encontrado"),
                Reprocesso::EmAndamento => {
                    anyhow::bail!("O lote {} ainda está em processamento", lote)
                }
            }
        }
        // consulta-sefaz <arquivo.pdf>
        Some(caminho) => {
            let pdf = PathBuf::from(caminho);
            let nome = pdf
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(caminho)
                .to_string();
            let lote = app.start_batch(pdf, &nome).await?;
            println!("Lote {lote} criado");
            acompanhar(&app, &lote).await?;
        }
        None => {
            anyhow::bail!(
                "Uso: consulta-sefaz <arquivo.pdf> | consulta-sefaz reprocessar <id-do-lote>"
            )
        }
    }

    Ok(())
}

/// Imprime cada quadro de progresso até o lote terminar.
async fn acompanhar(app: &App, lote: &str) -> Result<()> {
    let mut eventos = app.stream_progress(lote);
    while let Some(evento) = eventos.recv().await {
        println!("{}", evento.como_json());
    }
    app.wait_batch(lote).await
}
