use std::path::Path;

use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::config::Config;

/// Inicia o navegador sem interface e abre o formulário de consulta do portal
pub async fn launch_portal_browser(config: &Config) -> Result<(Browser, Page)> {
    info!("🚀 Iniciando navegador sem interface...");
    debug!("URL do portal: {}", config.portal_url);

    let mut builder = BrowserConfig::builder().new_headless_mode().args(vec![
        "--no-sandbox",              // evita travas de permissão em contêiner
        "--disable-dev-shm-usage",   // /dev/shm pequeno derruba o Chrome
        "--disable-gpu",
        "--window-size=1920,1080",
        "--disable-extensions",
    ]);
    if !config.chrome_executable.is_empty() {
        builder = builder.chrome_executable(Path::new(&config.chrome_executable));
    }
    let browser_config = builder.build().map_err(|e| {
        error!("Falha ao configurar o navegador: {}", e);
        anyhow::anyhow!("Falha ao configurar o navegador: {}", e)
    })?;

    let (mut browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("Falha ao iniciar o navegador: {}", e);
        anyhow::anyhow!("Falha ao iniciar o navegador: {}", e)
    })?;
    debug!("Navegador iniciado");

    // Processa os eventos do navegador em segundo plano.
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // Pequena pausa para o estado do navegador sincronizar.
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = match browser.new_page(config.portal_url.as_str()).await {
        Ok(page) => page,
        Err(e) => {
            error!("Falha ao abrir a página do portal: {}", e);
            let _ = browser.close().await;
            let _ = browser.wait().await;
            return Err(anyhow::anyhow!("Falha ao abrir a página do portal: {}", e));
        }
    };

    info!("✅ Navegador aberto em: {}", config.portal_url);
    Ok((browser, page))
}
