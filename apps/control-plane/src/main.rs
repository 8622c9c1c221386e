// [apps/control-plane/src/main.rs]
/*!
 * =================================================================
 * APARATO: CONTROL PLANE MAIN ENTRY POINT (V12.0)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L1-APP)
 * RESPONSABILIDAD: CLI DE OPERACIONES E IGNICIÓN SEGURA
 *
 * Subcomandos:
 *   serve            — nodo de larga vida del plano de control
 *   migrate          — nivelación idempotente del esquema
 *   verify-provider  — sonda one-shot de conectividad de un IdP
 *
 * Código de salida 0 en éxito; distinto de cero ante un error de
 * configuración (el mensaje nombra la clave ofensora).
 * =================================================================
 */

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

use cerberus_control_plane::prelude::*;
use cerberus_control_plane::services::sync_engine::DirectorySyncEngine;
use cerberus_infra_db::repositories::load_config_overrides;
use cerberus_infra_db::schema::apply_control_plane_schema;
use cerberus_shared_config::ConfigResolver;
use cerberus_shared_heimdall::init_tracing;

#[derive(Parser)]
#[command(
    name = "cerberus-control-plane",
    version,
    about = "Zero-trust access control plane: directory sync, recurrent jobs and the replication event bus."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Corre el nodo de larga vida con todos sus daemons.
    Serve,
    /// Aplica los estratos del esquema de forma idempotente.
    Migrate,
    /// Sonda de conectividad one-shot contra el directorio de un proveedor.
    VerifyProvider {
        /// Identificador del proveedor a sondear.
        #[arg(long)]
        id: Uuid,
    },
}

fn main() -> anyhow::Result<()> {
    // 1. CARGA DE ENTORNO OPERATIVO
    dotenv().ok();
    init_tracing("cerberus_control_plane");

    let cli_arguments = Cli::parse();

    // 2. RESOLUCIÓN TIPADA DE CONFIGURACIÓN (env > db > default)
    // Un valor inválido aborta aquí con la clave ofensora en el
    // diagnóstico y código de salida distinto de cero.
    let resolver = ConfigResolver::from_process_environment();
    let settings = match Settings::resolve(&resolver) {
        Ok(settings) => settings,
        Err(config_fault) => {
            error!("❌ [CONFIG]: {}", config_fault);
            eprintln!("{config_fault}");
            std::process::exit(1);
        }
    };

    // 3. RUNTIME SOBERANO
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async move {
        match cli_arguments.command {
            Commands::Serve => {
                info!("🛰️  [COMMAND_CENTER]: Global ignition sequence starting...");
                let kernel = ControlPlaneKernel::ignite(settings)?;

                // Con el pool vivo, los overrides persistidos entran a
                // la precedencia (env > db > default) y refinan las
                // claves no-bootstrap antes de lanzar los daemons.
                let database_overrides =
                    load_config_overrides(&kernel.application_state.database_client)
                        .await
                        .unwrap_or_default();
                let refined_settings = Settings::resolve(
                    &ConfigResolver::from_process_environment()
                        .with_database_overrides(database_overrides),
                )?;

                let kernel = ControlPlaneKernel {
                    settings: refined_settings,
                    application_state: kernel.application_state,
                };
                kernel.launch_control_plane_operations().await
            }

            Commands::Migrate => {
                info!("🏗️  [MIGRATOR]: Initiating structural audit of the cluster...");
                let kernel = ControlPlaneKernel::ignite(settings)?;
                let connection = kernel.application_state.database_client.get_connection().await?;
                apply_control_plane_schema(&**connection).await?;
                info!("✅ [MIGRATOR]: Schema leveled. Exiting.");
                Ok(())
            }

            Commands::VerifyProvider { id } => {
                let kernel = ControlPlaneKernel::ignite(settings)?;
                let provider = kernel.application_state.provider_repository.get_provider(id).await?;
                let engine = DirectorySyncEngine::new(kernel.application_state.clone());

                match engine.probe_provider(&provider).await {
                    Ok(remote_user_count) => {
                        println!(
                            "OK: provider {} answered with {} users",
                            provider.id, remote_user_count
                        );
                        Ok(())
                    }
                    Err(classified_message) => {
                        eprintln!("FAILED: {classified_message}");
                        std::process::exit(2);
                    }
                }
            }
        }
    })
}
// FIN DEL ARCHIVO [apps/control-plane/src/main.rs]
