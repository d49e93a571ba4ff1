//! The `ride` and `resume` commands: drive the lifecycle controller from
//! submission (or recovery) to a stopping point, printing progress.

use clap::Args;
use uuid::Uuid;

use sakay_api::BookingClient;
use sakay_booking::{
    BookingConfig, EventKind, LifecycleController, LifecycleState, PollOutcome, TraceSurface,
};
use sakay_core::booking::{BookingRequest, Contact, RideKind, Stop};
use sakay_core::{AppConfig, LatLng};
use sakay_routing::RouteResolver;
use sakay_session::SessionStore;

#[derive(Debug, Args)]
pub struct RideArgs {
    #[arg(long)]
    pickup_lat: f64,
    #[arg(long)]
    pickup_lng: f64,
    #[arg(long)]
    pickup_address: String,
    #[arg(long)]
    pickup_area: Option<String>,
    #[arg(long)]
    dest_lat: f64,
    #[arg(long)]
    dest_lng: f64,
    #[arg(long)]
    dest_address: String,
    /// standard, premium, or shared.
    #[arg(long, default_value = "standard", value_parser = parse_ride_kind)]
    kind: RideKind,
    #[arg(long, default_value_t = 1)]
    passengers: u8,
    /// Display fare as computed upstream, e.g. "₱125.50".
    #[arg(long)]
    fare: String,
    #[arg(long)]
    distance_km: String,
    #[arg(long)]
    duration_min: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    emergency_name: Option<String>,
    #[arg(long)]
    emergency_phone: Option<String>,
}

fn parse_ride_kind(raw: &str) -> Result<RideKind, String> {
    match raw {
        "standard" => Ok(RideKind::Standard),
        "premium" => Ok(RideKind::Premium),
        "shared" => Ok(RideKind::Shared),
        other => Err(format!("unknown ride kind: {other}")),
    }
}

impl RideArgs {
    fn into_request(self) -> BookingRequest {
        let emergency_contact = match (self.emergency_name, self.emergency_phone) {
            (Some(name), Some(phone)) => Some(Contact { name, phone }),
            _ => None,
        };
        BookingRequest {
            request_id: Uuid::new_v4(),
            ride_kind: self.kind,
            passenger_count: self.passengers,
            pickup: Stop {
                position: LatLng::new(self.pickup_lat, self.pickup_lng),
                address: self.pickup_address,
                area: self.pickup_area,
            },
            destination: Stop {
                position: LatLng::new(self.dest_lat, self.dest_lng),
                address: self.dest_address,
                area: None,
            },
            fare: self.fare,
            distance_km: self.distance_km,
            duration_min: self.duration_min,
            passenger_name: self.name,
            passenger_phone: self.phone,
            emergency_contact,
        }
    }
}

fn build_controller_parts(
    config: &AppConfig,
) -> anyhow::Result<(BookingClient, RouteResolver, SessionStore)> {
    let client = BookingClient::new(
        &config.api_base_url,
        config.request_timeout_secs,
        &config.user_agent,
    )?;
    let resolver = RouteResolver::new(
        &config.routing_base_url,
        config.request_timeout_secs,
        &config.user_agent,
    )?;
    let store = SessionStore::new(config.session_path.clone());
    Ok((client, resolver, store))
}

pub async fn run(config: &AppConfig, args: RideArgs) -> anyhow::Result<()> {
    let (client, resolver, store) = build_controller_parts(config)?;
    let mut controller = LifecycleController::bootstrap(
        client,
        resolver,
        store,
        BookingConfig::from_app_config(config),
    )
    .await;

    if !matches!(controller.state(), LifecycleState::Pending) {
        println!(
            "A booking is already in flight ({}). Use `sakay resume` or `sakay cancel`.",
            controller.state()
        );
        return Ok(());
    }

    let request = args.into_request();
    let scene = Some((request.pickup.position, request.destination.position));
    controller.confirm(&request).await?;
    println!("Booking submitted; waiting for a driver...");

    follow(&mut controller, scene).await;
    Ok(())
}

pub async fn resume(config: &AppConfig) -> anyhow::Result<()> {
    let (client, resolver, store) = build_controller_parts(config)?;
    let mut controller = LifecycleController::bootstrap(
        client,
        resolver,
        store,
        BookingConfig::from_app_config(config),
    )
    .await;

    match controller.state() {
        LifecycleState::Pending => {
            println!("No booking to resume.");
            return Ok(());
        }
        state => println!("Resumed booking in state: {state}"),
    }

    // Positions are not recoverable from the server snapshot, so the
    // resumed session follows without a tracking surface.
    follow(&mut controller, None).await;
    Ok(())
}

/// Pumps lifecycle events until the ride starts, ends, or stalls.
async fn follow(controller: &mut LifecycleController, scene: Option<(LatLng, LatLng)>) {
    // A recovered acceptance has no poller to wait on; without a surface
    // there is nothing further to follow.
    if let LifecycleState::Accepted { booking_id, driver } = controller.state() {
        println!("Driver {} is on the way (booking {booking_id}).", driver.name);
        let Some((pickup, destination)) = scene else { return };
        controller.attach_surface(TraceSurface::default(), pickup, destination);
    }

    while let Some(event) = controller.recv_event().await {
        let stalled = matches!(
            event.kind,
            EventKind::PollResolved(PollOutcome::StillWaiting) | EventKind::ActiveRefetched(None)
        );
        controller.handle_event(event).await;

        match controller.state() {
            LifecycleState::Accepted { booking_id, driver } => {
                println!("Driver {} accepted booking {booking_id}.", driver.name);
                if let Some((pickup, destination)) = scene {
                    controller.attach_surface(TraceSurface::default(), pickup, destination);
                } else {
                    return;
                }
            }
            LifecycleState::InProgress { driver, .. } => {
                println!("Driver {} has arrived; ride started.", driver.name);
                return;
            }
            LifecycleState::Cancelled => {
                println!("Booking was cancelled.");
                return;
            }
            LifecycleState::Completed => return,
            _ => {}
        }

        if stalled {
            println!("No driver yet; the booking is still waiting. Run `sakay resume` later.");
            return;
        }
    }
}
