use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repquest::config::Config;
use repquest::db;
use repquest::handlers::{achievements, exercises, progression, workouts};
use repquest::lifecycle::WorkoutLifecycle;
use repquest::migrations::run_migrations;
use repquest::notify::{LogNotifier, SharedNotifier};
use repquest::progression::{GrantCalculator, LevelCurve};
use repquest::repositories::{
    AchievementRepository, ExerciseRepository, ExperienceRepository, UserRepository,
    WorkoutRepository,
};
use repquest::routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "repquest=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Connecting to database: {}", config.database_url);

    // Create database pool
    let pool = db::create_pool(&config.database_url)?;

    // Run migrations
    run_migrations(&pool)?;

    // Create repositories
    let user_repo = UserRepository::new(pool.clone());
    let exercise_repo = ExerciseRepository::new(pool.clone());
    let workout_repo = WorkoutRepository::new(pool.clone());
    let achievement_repo = AchievementRepository::new(pool.clone());
    let experience_repo = ExperienceRepository::new(pool.clone());

    // Wire the progression engine
    let notifier: SharedNotifier = Arc::new(LogNotifier);
    let grants = GrantCalculator::new(
        user_repo.clone(),
        experience_repo.clone(),
        config.progression,
        notifier.clone(),
    );
    let lifecycle = WorkoutLifecycle::new(
        workout_repo.clone(),
        achievement_repo.clone(),
        grants,
        notifier,
        config.timezone(),
        config.progression.stale_after_hours,
    );

    // Periodic sweeps: the skip sweep catches workouts whose day has
    // elapsed, the stale sweep force-finishes abandoned sessions.
    let skip_sweep = lifecycle.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60 * 60));
        loop {
            interval.tick().await;
            if let Err(e) = skip_sweep.skip_elapsed().await {
                tracing::error!(error = %e, "skip sweep failed");
            }
        }
    });
    let stale_sweep = lifecycle.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(10 * 60));
        loop {
            interval.tick().await;
            if let Err(e) = stale_sweep.finish_stale().await {
                tracing::error!(error = %e, "stale-finish sweep failed");
            }
        }
    });

    // Create handler states
    let workouts_state = workouts::WorkoutsState {
        workout_repo: workout_repo.clone(),
        exercise_repo: exercise_repo.clone(),
        lifecycle,
    };
    let exercises_state = exercises::ExercisesState {
        exercise_repo: exercise_repo.clone(),
    };
    let progression_state = progression::ProgressionState {
        user_repo: user_repo.clone(),
        experience_repo: experience_repo.clone(),
        curve: LevelCurve::from_config(&config.progression),
    };
    let achievements_state = achievements::AchievementsState {
        achievement_repo: achievement_repo.clone(),
    };

    // Build router
    let app = routes::create_router(
        workouts_state,
        exercises_state,
        progression_state,
        achievements_state,
    );

    // Start server
    let addr = config.server_addr();
    tracing::info!("Starting server at http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
