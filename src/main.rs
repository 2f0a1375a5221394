// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! FitClub command-line client
//!
//! Restores the session and last location fix, then prints today's diet log,
//! the user's profile and the gyms around them.

use fitclub_client::{
    config::Config,
    db::DeviceStore,
    models::Coordinates,
    services::{Auth0CredentialsManager, FeedStatus, FixedLocationProvider},
    time_utils::today,
    FitClub,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(api = %config.api_base_url, "Starting FitClub client");

    let store = DeviceStore::open(&config.store_path).await?;
    tracing::info!(path = %config.store_path.display(), "Device store opened");

    let identity = Arc::new(Auth0CredentialsManager::from_config(&config));

    // No platform location service on the desktop; take it from the env.
    let position = match (
        std::env::var("FITCLUB_LATITUDE").ok().and_then(|v| v.parse().ok()),
        std::env::var("FITCLUB_LONGITUDE").ok().and_then(|v| v.parse().ok()),
    ) {
        (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
        _ => None,
    };
    let location_provider = Arc::new(FixedLocationProvider::new(position));

    let app = FitClub::new(config, identity, location_provider, store)?;

    if !app.session.is_authenticated().await {
        if let Err(e) = app.login().await {
            tracing::warn!(error = %e, "Login failed, continuing unauthenticated");
        }
    }

    let profile = app.profile().fetch().await;
    match &profile.data {
        Some(user) if profile.success => println!("Hello, {} ({})", user.name, user.email),
        Some(user) => println!("Hello, {} (offline: {})", user.name, profile.message),
        None => println!("Profile unavailable: {}", profile.message),
    }

    let diet = app.diet_log();
    let day = today();
    let loaded = diet.load(day).await;
    if !loaded.success {
        println!("Diet log may be out of date: {}", loaded.message);
    }
    for entry in diet.entries().await {
        let meal = &entry.value;
        let notice = entry.notice().map(|n| format!("  [{}]", n)).unwrap_or_default();
        println!(
            "  {:<10} {:<24} {:>6.0} kcal{}",
            meal.meal_type, meal.meal_name, meal.calories, notice
        );
    }
    let stats = diet.stats().await;
    println!(
        "Today ({}): {:.0} kcal, {:.0} g protein, {} meals",
        day, stats.total_calories, stats.total_protein, stats.meal_count
    );

    app.location.restore().await;
    let feed = app.gym_feed();
    match feed.refresh().await {
        FeedStatus::Ready => {
            for listing in feed.listings().await {
                println!("  {:>5.1} km  {}", listing.distance_km, listing.gym.name);
            }
            if feed.has_more_gyms().await {
                println!("  ...");
            }
        }
        _ => {
            if let Some(empty) = feed.empty_state().await {
                println!("{}: {}", empty.title, empty.message);
            }
        }
    }

    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fitclub_client=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
