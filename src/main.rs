use clap::Parser;
use sessionward::cli::{
    ACCESS_SECRET_ENV, Args, REFRESH_SECRET_ENV, build_config, build_session_config,
    handle_create_user, init_logging, load_secret, open_database,
};
use sessionward::{init_cleanup, run_server};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(access_secret) =
        load_secret(ACCESS_SECRET_ENV, args.access_token_secret_file.as_deref())
    else {
        std::process::exit(1);
    };

    let Some(refresh_secret) =
        load_secret(REFRESH_SECRET_ENV, args.refresh_token_secret_file.as_deref())
    else {
        std::process::exit(1);
    };

    let Some(session) = build_session_config(&args, access_secret, refresh_secret) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    if let Some(username) = args.create_user.as_deref() {
        if !handle_create_user(&db, username).await {
            std::process::exit(1);
        }
    }

    init_cleanup(&db).await;

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let local_addr = listener.local_addr().unwrap_or_else(|e| {
        error!(error = %e, "Failed to read local address");
        std::process::exit(1);
    });

    let config = build_config(&args, db, session);

    info!(
        address = %local_addr,
        access_ttl = config.session.access_token_ttl,
        refresh_ttl = config.session.refresh_token_ttl,
        ip_header = ?args.ip_header,
        "Listening"
    );

    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
