use pulsewatch::{loopback, ConnectFlags, Connection, ConnectionConfig};
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let config = ConnectionConfig::new("pulsewatch-refused")?
        .with_server("unix:/run/pulse/nowhere")?
        .with_flags(ConnectFlags::NOAUTOSPAWN);
    let conn = Connection::new(config);
    conn.connect()?;

    // Stand in for the audio daemon: refuse the connection. The loop keeps
    // polling after the failure; only Ctrl+C ends it.
    let feed = conn.mainloop().feed();
    let token = conn.token().ok_or("context was not created")?;
    loopback::stage_refused_handshake(&feed, token)?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || handler_stop.store(true, Ordering::Relaxed))?;

    println!("Polling connection state; press Ctrl+C to stop");
    conn.run(&stop);
    println!("Stopped; last state: {}", conn.state());

    Ok(())
}
