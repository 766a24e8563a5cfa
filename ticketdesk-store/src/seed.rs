use std::path::Path;
use ticketdesk_core::{Route, StoreError};

/// Reads a JSON array of routes for seeding a fresh store.
pub fn load_routes(path: impl AsRef<Path>) -> Result<Vec<Route>, StoreError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read seed file {}: {}", path.display(), e))?;
    let routes: Vec<Route> = serde_json::from_str(&raw)?;

    for route in &routes {
        if route.available_seats < 0 || route.available_seats > route.capacity {
            return Err(format!(
                "seed route {} has {} seats available out of {}",
                route.id, route.available_seats, route.capacity
            )
            .into());
        }
    }

    Ok(routes)
}
