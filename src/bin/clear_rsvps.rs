#[cfg(feature = "ssr")]
use wedding_rsvp::{clear_rsvps, config::AppConfig, establish_connection};

#[cfg(feature = "ssr")]
fn main() {
    let config = AppConfig::from_env().expect("Invalid configuration");
    let mut conn =
        establish_connection(&config.database_url).expect("Failed to connect to the database");
    let cleared = clear_rsvps(&mut conn).expect("Failed to clear RSVPs");
    println!("{} RSVPs cleared. Every guest is pending again.", cleared);
}

#[cfg(not(feature = "ssr"))]
fn main() {
    println!("This binary requires the 'ssr' feature to be enabled.");
}
