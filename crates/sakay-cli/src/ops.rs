//! One-shot `status` and `cancel` commands.

use sakay_api::BookingClient;
use sakay_core::AppConfig;
use sakay_session::SessionStore;

fn build_client(config: &AppConfig) -> anyhow::Result<BookingClient> {
    Ok(BookingClient::new(
        &config.api_base_url,
        config.request_timeout_secs,
        &config.user_agent,
    )?)
}

pub async fn status(config: &AppConfig, booking_id: i64) -> anyhow::Result<()> {
    let client = build_client(config)?;
    let snapshot = client.booking_status(booking_id).await?;
    match snapshot.driver {
        Some(driver) => println!(
            "Booking {booking_id}: {} (driver {}, plate {})",
            snapshot.status,
            driver.name,
            driver.plate_number.as_deref().unwrap_or("unknown"),
        ),
        None => println!("Booking {booking_id}: {}", snapshot.status),
    }
    Ok(())
}

pub async fn cancel(config: &AppConfig, booking_id: i64) -> anyhow::Result<()> {
    let client = build_client(config)?;
    client.cancel_booking(booking_id).await?;

    let store = SessionStore::new(config.session_path.clone());
    store.clear().await?;
    println!("Booking {booking_id} cancelled.");
    Ok(())
}
