use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger as ActixLogger, web, App, HttpServer};
use log::{error, info, trace, warn};
use std::{
    env as stdenv,
    path::Path,
    process::{exit, id as process_id, Command},
};

use subtrack::{
    config::ServerConfig,
    env::load_env_file,
    logger::setup_logger,
    relay::{self, AppState},
    DESCRIPTION, NAME, VERSION,
};

mod cors;
use crate::cors::*;

fn lsof_available() -> bool {
    Command::new("sh")
        .arg("-c")
        .arg("which lsof")
        .output()
        .map(|output| !output.stdout.is_empty())
        .unwrap_or(false)
}

/// Logs whoever holds `port`, when `lsof` can tell.
fn report_port_owner(port: u16) {
    if !lsof_available() {
        info!("`lsof` is not available. Please install `lsof` for more detailed diagnostics.");
        return;
    }
    let output = Command::new("sh")
        .arg("-c")
        .arg(format!("lsof -i :{} -t -sTCP:LISTEN", port))
        .output();

    match output {
        Ok(output) if !output.stdout.is_empty() => {
            let pid = String::from_utf8_lossy(&output.stdout).trim().to_string();
            info!("PID using port {}: {}", port, pid);

            let cmd = format!("ps -o user= -o comm= -p {}", pid);
            if let Ok(output) = Command::new("sh").arg("-c").arg(cmd).output() {
                info!(
                    "Process details: {}",
                    String::from_utf8_lossy(&output.stdout)
                );
            }
        }
        _ => error!("Could not determine the process using port {}", port),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let this_script_relative_path = stdenv::args().next().unwrap_or_default();
    let this_script_name = Path::new(&this_script_relative_path)
        .file_name()
        .unwrap_or_default()
        .to_str()
        .unwrap_or_default()
        .to_owned();

    setup_logger();

    // .env and .env_cors are both optional; say where they were expected.
    load_env_file();
    check_env_cors();

    info!("{} {}: {}", NAME, VERSION, DESCRIPTION);
    info!(
        "\x1b[01;35m # THIS SCRIPT NAME\x1b[38;5;93m:\x1b[38;5;1m {}",
        this_script_name
    );
    info!(
        "\x1b[01;35m # THIS SCRIPT RELATIVE PATH\x1b[38;5;93m:\x1b[38;5;1m {}",
        this_script_relative_path
    );
    if let Ok(absolute) = stdenv::current_exe() {
        info!(
            "\x1b[01;35m # THIS SCRIPT ABSOLUTE PATH\x1b[38;5;93m:\x1b[38;5;1m {:?}",
            absolute
        );
    }
    info!("PID: {}", process_id());

    let server_config = ServerConfig::from_env().unwrap_or_else(|e| {
        error!("{}", e);
        exit(1);
    });
    let state = AppState::from_env(&server_config).unwrap_or_else(|e| {
        error!("{}", e);
        exit(1);
    });
    if state.supabase_webhook_secret.is_none() {
        warn!("SUPABASE_WEBHOOK_SECRET is not set; /webhooks/supabase accepts unsigned calls");
    }
    let target_server = server_config.bind_address();

    let cors_origins = allowed_origins(CORS_FILE, &server_config.client_url).unwrap_or_else(|e| {
        error!("Failed to load or validate all CORS origins: {}", e);
        exit(1);
    });
    info!("Allowed cors_origins: {:?}", cors_origins);

    if std::net::TcpListener::bind(&target_server).is_err() {
        error!("Port {} is already in use.", server_config.port);
        report_port_owner(server_config.port);
        exit(52);
    }

    let state = web::Data::new(state);
    let server = HttpServer::new(move || {
        let cors = cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
            ])
            .supports_credentials()
            .max_age(3600);
        trace!("cors: {:?}", cors);

        App::new()
            .app_data(state.clone())
            .wrap(ActixLogger::default())
            .wrap(cors)
            .configure(relay::configure)
    })
    .bind(&target_server)?
    .run();

    info!("Server running at http://{}", target_server);
    info!("Server starting with PID: {}", process_id());

    let execution = server.await;
    info!("Worker stopped with PID: {}", process_id());

    if let Err(e) = execution {
        error!("Failed to start the server: {:?}", e);
        return Err(e);
    }
    Ok(())
}
