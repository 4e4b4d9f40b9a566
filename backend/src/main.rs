use kidvid_backend::config::{
    create_app_state, create_cors, init_logger, is_missing_credentials, load_environment, Config,
};
use log::{error, info};

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    load_environment();
    init_logger();

    let config = Config::from_env();
    let state = create_app_state(&config).inspect_err(|e| {
        if is_missing_credentials(e) {
            error!("Refusing to start: {e}");
        }
    })?;
    let cors = create_cors(&config)?;

    let figment = rocket::Config::figment()
        .merge(("address", "0.0.0.0"))
        .merge(("port", config.port));
    info!("KidVid server listening on {}", config.port);

    kidvid_backend::mount(rocket::custom(figment), state)
        .attach(cors)
        .launch()
        .await?;

    Ok(())
}
