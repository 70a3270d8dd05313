mod state;
mod telemetry;

use tracing::info;

use outdoorsy_media::RequestOrigin;
use outdoorsy_util::{load_env_file, AppConfig};

/// Image shown on the about and error pages.
const HERO_IMAGE: &str = "hero.jpg";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;

    let state = state::AppState::build(&config).await?;

    let origin = RequestOrigin::new("http", "localhost:5000");
    let hero_url = state.images().image_url(HERO_IMAGE, &origin);
    info!(stage = "app", %hero_url, "generated hero image URL");

    let approved = state.reviews().get_approved_reviews().await.len();
    info!(
        stage = "app",
        env = %config.environment.as_str(),
        backend = state.backend(),
        images = state.images().kind(),
        approved,
        "review services ready"
    );

    Ok(())
}
